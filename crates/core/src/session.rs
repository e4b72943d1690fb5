//! Document session: the owner of all mutable editing state.

use crate::annotation::{Annotation, Color};
use crate::config::SessionConfig;
use crate::history::{EffectKind, EffectOp, PageHistory};
use crate::loader::LoadedFile;
use crate::render::{self, RenderGate};
use crate::selection::SelectionTracker;
use log::debug;
use pagemark_engine::{DocumentHandle, EngineError, PageRasterizer, RasterSource};
use pagemark_raster::{Canvas, PixelRect};
use std::collections::HashMap;

/// Errors from session setup and capture.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("document has no pages")]
    EmptyDocument,
    #[error("no page is currently rendered")]
    NoPage,
    #[error("failed to encode capture: {0}")]
    Capture(#[from] image::ImageError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// All in-memory state of one loaded document.
///
/// Created on upload, discarded on navigation away; nothing persists.
/// Editing operations follow disabled-button semantics: when the canvas
/// is missing, the session is busy exporting, or the target rectangle is
/// empty, they return `false` instead of failing.
pub struct DocumentSession {
    pub(crate) config: SessionConfig,
    pub(crate) handle: DocumentHandle,
    file_name: String,
    pub(crate) page_count: u32,
    pub(crate) current_page: u32,
    pub(crate) canvas: Option<Canvas>,
    selection: SelectionTracker,
    pub(crate) pages: HashMap<u32, PageHistory>,
    pub(crate) busy: bool,
    pub(crate) gate: RenderGate,
}

impl DocumentSession {
    /// Open a validated upload through the rasterizer collaborator.
    ///
    /// The session starts on page 1 with no canvas; call
    /// [`render_page`](Self::render_page) to bring the first page up.
    pub fn open<R: PageRasterizer>(
        rasterizer: &mut R,
        file: LoadedFile,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        let LoadedFile { name, bytes } = file;
        let handle = rasterizer.open(RasterSource::Bytes(bytes))?;
        let page_count = rasterizer.page_count(handle)?;
        if page_count == 0 {
            return Err(SessionError::EmptyDocument);
        }

        debug!("opened '{name}': {page_count} pages");

        Ok(Self {
            config,
            handle,
            file_name: name,
            page_count,
            current_page: 1,
            canvas: None,
            selection: SelectionTracker::new(),
            pages: HashMap::new(),
            busy: false,
            gate: RenderGate::new(),
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Currently shown page, 1-based.
    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    /// The live canvas, present once a page has rendered.
    pub fn canvas(&self) -> Option<&Canvas> {
        self.canvas.as_ref()
    }

    /// Whether an export is in progress (conflicting operations disable).
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn selection(&self) -> &SelectionTracker {
        &self.selection
    }

    /// Pointer events feed the tracker through this.
    pub fn selection_mut(&mut self) -> &mut SelectionTracker {
        &mut self.selection
    }

    /// Page the "next" button would move to (clamped).
    pub fn next_page(&self) -> u32 {
        (self.current_page + 1).min(self.page_count)
    }

    /// Page the "previous" button would move to (clamped).
    pub fn previous_page(&self) -> u32 {
        self.current_page.saturating_sub(1).max(1)
    }

    /// A page's annotations in application order, for listing in the UI.
    pub fn annotations(&self, page: u32) -> &[Annotation] {
        self.pages
            .get(&page)
            .map(PageHistory::annotations)
            .unwrap_or(&[])
    }

    /// A page's effect history in application order.
    pub fn effects(&self, page: u32) -> &[EffectOp] {
        self.pages
            .get(&page)
            .map(PageHistory::effects)
            .unwrap_or(&[])
    }

    /// Apply a blur or erase to `rect` on the current page.
    ///
    /// Returns whether the effect was applied. The snapshot, the replay
    /// list append, and the pixel mutation happen together; a rejected
    /// call changes nothing.
    pub fn apply_effect(&mut self, kind: EffectKind, rect: PixelRect) -> bool {
        if self.busy {
            return false;
        }
        let Some(canvas) = self.canvas.as_mut() else {
            return false;
        };
        let rect = rect.clamped(canvas.width(), canvas.height());
        if rect.is_empty() {
            return false;
        }

        let snapshot = canvas.snapshot();
        render::apply_effect_pixels(canvas, kind, rect);
        self.pages
            .entry(self.current_page)
            .or_default()
            .record_effect(EffectOp { kind, rect }, snapshot, self.config.max_undo_depth);

        debug!(
            "applied {kind:?} at {rect:?} on page {}",
            self.current_page
        );
        true
    }

    /// Apply a text annotation to `rect` on the current page.
    ///
    /// Same disabled semantics as [`apply_effect`](Self::apply_effect),
    /// plus empty text is rejected.
    pub fn apply_annotation(&mut self, rect: PixelRect, text: &str, color: Color) -> bool {
        if self.busy || text.is_empty() {
            return false;
        }
        let Some(canvas) = self.canvas.as_mut() else {
            return false;
        };
        let rect = rect.clamped(canvas.width(), canvas.height());
        if rect.is_empty() {
            return false;
        }

        let annotation = Annotation {
            rect,
            text: text.to_owned(),
            color,
        };

        let snapshot = canvas.snapshot();
        render::apply_annotation_pixels(canvas, &annotation);
        self.pages
            .entry(self.current_page)
            .or_default()
            .record_annotation(annotation, snapshot, self.config.max_undo_depth);

        debug!("annotated {rect:?} on page {}", self.current_page);
        true
    }

    /// Apply an effect to the current selection (the toolbar button path).
    pub fn apply_to_selection(&mut self, kind: EffectKind) -> bool {
        match self.selection.rect().and_then(|rect| rect.to_pixel_rect()) {
            Some(rect) => self.apply_effect(kind, rect),
            None => false,
        }
    }

    /// Annotate the current selection with a fresh light color.
    pub fn annotate_selection(&mut self, text: &str, color: Color) -> bool {
        match self.selection.rect().and_then(|rect| rect.to_pixel_rect()) {
            Some(rect) => self.apply_annotation(rect, text, color),
            None => false,
        }
    }

    /// Undo the most recent edit on the current page.
    ///
    /// Restores the canvas to the pre-operation snapshot and removes the
    /// operation from its replay list, so the next render of this page
    /// reproduces exactly what is on screen now. No-op (returns `false`)
    /// when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        if self.busy {
            return false;
        }
        let Some(canvas) = self.canvas.as_mut() else {
            return false;
        };
        let Some(history) = self.pages.get_mut(&self.current_page) else {
            return false;
        };
        match history.undo() {
            Some(snapshot) => {
                canvas.restore(&snapshot);
                debug!("undid last edit on page {}", self.current_page);
                true
            }
            None => false,
        }
    }

    /// Encode the current canvas as PNG (the single-page download path).
    pub fn capture_page_png(&self) -> Result<Vec<u8>, SessionError> {
        let canvas = self.canvas.as_ref().ok_or(SessionError::NoPage)?;
        Ok(canvas.to_png()?)
    }
}
