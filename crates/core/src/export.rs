//! Export pipeline: every page, composited, into one output document.

use crate::render::{RenderError, RenderOutcome};
use crate::session::DocumentSession;
use log::{debug, info};
use pagemark_engine::{EngineError, PageRasterizer, PageSink};

/// Errors from a whole-document export.
///
/// One failed page fails the export: a document silently missing pages is
/// worse than no document.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("an export is already in progress")]
    Busy,
    #[error("render of page {page} was cancelled during export")]
    Interrupted { page: u32 },
    #[error("page {page} failed to render: {source}")]
    Render { page: u32, source: RenderError },
    #[error("failed to write output document: {0}")]
    Write(#[from] EngineError),
}

impl DocumentSession {
    /// Render every page in order, push each composited canvas into
    /// `sink`, and return the serialized document.
    ///
    /// The busy flag is held for the whole run, from the first page
    /// switch to the final byte, so edit operations disable meanwhile;
    /// it is released on every exit path. The session is left showing the
    /// last page it rendered.
    pub fn export_document<R, S>(
        &mut self,
        rasterizer: &R,
        sink: &mut S,
    ) -> Result<Vec<u8>, ExportError>
    where
        R: PageRasterizer,
        S: PageSink,
    {
        if self.busy {
            return Err(ExportError::Busy);
        }

        self.busy = true;
        let result = self.export_pages(rasterizer, sink);
        self.busy = false;
        result
    }

    fn export_pages<R, S>(&mut self, rasterizer: &R, sink: &mut S) -> Result<Vec<u8>, ExportError>
    where
        R: PageRasterizer,
        S: PageSink,
    {
        for page in 1..=self.page_count {
            match self.render_page(rasterizer, page) {
                Ok(RenderOutcome::Rendered { .. }) => {}
                Ok(RenderOutcome::Cancelled) => {
                    return Err(ExportError::Interrupted { page });
                }
                Err(source) => {
                    return Err(ExportError::Render { page, source });
                }
            }

            let Some(canvas) = self.canvas.as_ref() else {
                return Err(ExportError::Interrupted { page });
            };
            sink.push_page(canvas.image())?;
            debug!("embedded page {page}/{}", self.page_count);
        }

        let bytes = sink.finish()?;
        info!(
            "export of '{}' complete: {} pages, {} bytes",
            self.file_name(),
            self.page_count,
            bytes.len()
        );
        Ok(bytes)
    }
}
