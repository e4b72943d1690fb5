//! Page render/composite pipeline.
//!
//! Rendering a page is the one suspending operation in the editor: the
//! rasterizer may take arbitrarily long, and navigating to another page
//! routinely supersedes an in-flight render. The [`RenderGate`] makes the
//! stale write impossible: beginning a new pass cancels the previous
//! pass's token, and commit is only allowed while a pass is still the
//! latest and uncancelled.

use crate::annotation::Annotation;
use crate::history::{EffectKind, PageHistory};
use crate::session::DocumentSession;
use log::{debug, warn};
use pagemark_engine::{CancellationToken, EngineError, PageRasterizer};
use pagemark_raster::{box_blur, Canvas, PixelRect, Rgba};

/// Label ink for annotation text.
const LABEL_COLOR: Rgba<u8> = Rgba([33, 33, 33, 255]);

/// Errors from the render pipeline.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("page {page} out of range (page_count={page_count})")]
    PageOutOfRange { page: u32, page_count: u32 },
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// How a render pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// The page is on the canvas at its rasterized dimensions.
    Rendered { width: u32, height: u32 },
    /// A newer render superseded this one; the canvas was not touched.
    Cancelled,
}

/// Generation-counted gate over the active render pass.
#[derive(Debug)]
pub struct RenderGate {
    generation: u64,
    token: CancellationToken,
}

impl RenderGate {
    pub(crate) fn new() -> Self {
        Self {
            generation: 0,
            token: CancellationToken::new(),
        }
    }

    /// Start a new pass, cancelling whatever was in flight.
    pub(crate) fn begin(&mut self) -> RenderPass {
        self.token.cancel();
        self.token = CancellationToken::new();
        self.generation += 1;
        RenderPass {
            generation: self.generation,
            token: self.token.clone(),
        }
    }

    /// Whether `pass` is still the latest and uncancelled.
    pub(crate) fn is_current(&self, pass: &RenderPass) -> bool {
        self.generation == pass.generation && !pass.token.is_cancelled()
    }

    /// Cancel the active pass without starting a new one (teardown path).
    pub(crate) fn cancel_active(&self) {
        self.token.cancel();
    }
}

/// Ticket for one render attempt.
#[derive(Debug)]
pub(crate) struct RenderPass {
    generation: u64,
    token: CancellationToken,
}

impl RenderPass {
    pub(crate) fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl DocumentSession {
    /// Rasterize and composite `page` (1-based) onto the canvas.
    ///
    /// On commit the canvas takes the page's native rasterized size, the
    /// base raster is drawn, and the page's effect list then annotation
    /// list replay in insertion order, reproducing exactly the state the
    /// user last saw there. A cancelled pass returns
    /// [`RenderOutcome::Cancelled`] and mutates nothing; a rasterizer
    /// failure is logged and propagated with the canvas unchanged.
    pub fn render_page<R: PageRasterizer>(
        &mut self,
        rasterizer: &R,
        page: u32,
    ) -> Result<RenderOutcome, RenderError> {
        if page == 0 || page > self.page_count {
            return Err(RenderError::PageOutOfRange {
                page,
                page_count: self.page_count,
            });
        }

        let pass = self.gate.begin();
        let raster = match rasterizer.rasterize(
            self.handle,
            page - 1,
            self.config.render_scale,
            pass.token(),
        ) {
            Ok(Some(raster)) => raster,
            Ok(None) => {
                debug!("render of page {page} cancelled by backend");
                return Ok(RenderOutcome::Cancelled);
            }
            Err(err) => {
                warn!("rasterizer failed on page {page}: {err}");
                return Err(err.into());
            }
        };

        if !self.gate.is_current(&pass) {
            debug!("render of page {page} superseded before commit");
            return Ok(RenderOutcome::Cancelled);
        }

        let mut canvas = Canvas::from_image(raster);
        if let Some(history) = self.pages.get(&page) {
            replay_page(&mut canvas, history);
        }

        let (width, height) = canvas.dimensions();
        self.canvas = Some(canvas);
        self.current_page = page;

        debug!("rendered page {page} at {width}x{height}");
        Ok(RenderOutcome::Rendered { width, height })
    }

    /// Cancel any in-flight render (the navigation-away/teardown path).
    pub fn cancel_render(&self) {
        self.gate.cancel_active();
    }
}

/// Replay a page's history onto a freshly rasterized canvas: effects in
/// insertion order, then annotations in insertion order.
pub(crate) fn replay_page(canvas: &mut Canvas, history: &PageHistory) {
    for op in history.effects() {
        apply_effect_pixels(canvas, op.kind, op.rect);
    }
    for annotation in history.annotations() {
        apply_annotation_pixels(canvas, annotation);
    }
}

/// The one implementation of the destructive effects, shared by live
/// edits and replay so the two can never drift apart.
pub(crate) fn apply_effect_pixels(canvas: &mut Canvas, kind: EffectKind, rect: PixelRect) {
    match kind {
        EffectKind::Blur => {
            if let Some(region) = canvas.sub_image(rect) {
                let blurred = box_blur(&region);
                canvas.put_sub_image(rect.x, rect.y, &blurred);
            }
        }
        EffectKind::Erase => canvas.clear_rect(rect),
    }
}

/// Draw an annotation: blended fill, then the left-anchored label.
pub(crate) fn apply_annotation_pixels(canvas: &mut Canvas, annotation: &Annotation) {
    canvas.fill_rect_blend(annotation.rect, annotation.color.to_rgba());
    canvas.draw_label(annotation.rect, &annotation.text, LABEL_COLOR);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_invalidates_previous_pass() {
        let mut gate = RenderGate::new();
        let first = gate.begin();
        assert!(gate.is_current(&first));

        let second = gate.begin();
        assert!(!gate.is_current(&first));
        assert!(first.token().is_cancelled());
        assert!(gate.is_current(&second));
    }

    #[test]
    fn gate_cancel_active_kills_current_pass() {
        let mut gate = RenderGate::new();
        let pass = gate.begin();
        gate.cancel_active();
        assert!(!gate.is_current(&pass));
    }
}
