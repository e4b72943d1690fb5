//! PDFium-backed rasterizer.
//!
//! Real page rendering behind the same [`PageRasterizer`] trait as the
//! default backend. Requires a PDFium dynamic library on the system; the
//! crate feature `pdfium` gates the dependency.

use crate::cancel::CancellationToken;
use crate::rasterizer::{DocumentHandle, PageRasterizer, PageSizePt, RasterSource};
use crate::{EngineError, EngineResult};
use image::RgbaImage;
use pdfium_render::prelude::*;
use std::collections::HashMap;
use std::fs;

/// Rasterizer rendering through `pdfium-render`.
///
/// Document bytes are retained per handle and re-opened per call; PDFium
/// documents borrow the library binding, so holding them across calls
/// would tie the struct to its own lifetime for no measurable gain at
/// this page cadence.
pub struct PdfiumRasterizer {
    pdfium: Pdfium,
    next_handle: u64,
    docs: HashMap<DocumentHandle, Vec<u8>>,
}

impl PdfiumRasterizer {
    /// Bind the system PDFium library.
    pub fn from_system_library() -> EngineResult<Self> {
        let bindings = Pdfium::bind_to_system_library().map_err(|err| {
            EngineError::Backend(format!("failed to bind pdfium system library: {err}"))
        })?;

        Ok(Self {
            pdfium: Pdfium::new(bindings),
            next_handle: 0,
            docs: HashMap::new(),
        })
    }

    fn bytes(&self, handle: DocumentHandle) -> EngineResult<&[u8]> {
        self.docs
            .get(&handle)
            .map(Vec::as_slice)
            .ok_or(EngineError::UnknownHandle(handle.raw()))
    }

    fn load(&self, handle: DocumentHandle) -> EngineResult<PdfDocument<'_>> {
        let bytes = self.bytes(handle)?;
        self.pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|err| EngineError::Backend(format!("failed to load PDF: {err}")))
    }
}

impl PageRasterizer for PdfiumRasterizer {
    fn open(&mut self, source: RasterSource) -> EngineResult<DocumentHandle> {
        let bytes = match source {
            RasterSource::Path(path) => fs::read(path)?,
            RasterSource::Bytes(bytes) => bytes,
        };

        // Validate up front so `open` fails rather than the first render.
        self.pdfium
            .load_pdf_from_byte_slice(&bytes, None)
            .map_err(|err| EngineError::Backend(format!("failed to load PDF: {err}")))?;

        self.next_handle += 1;
        let handle = DocumentHandle::from_raw(self.next_handle);
        self.docs.insert(handle, bytes);

        Ok(handle)
    }

    fn page_count(&self, handle: DocumentHandle) -> EngineResult<u32> {
        let document = self.load(handle)?;
        Ok(u32::from(document.pages().len()))
    }

    fn page_size(&self, handle: DocumentHandle, page_index: u32) -> EngineResult<PageSizePt> {
        let document = self.load(handle)?;
        let page_count = u32::from(document.pages().len());
        let page = document
            .pages()
            .get(page_index as u16)
            .map_err(|_| EngineError::PageOutOfRange {
                page: page_index,
                page_count,
            })?;

        Ok(PageSizePt {
            width: page.width().value,
            height: page.height().value,
        })
    }

    fn rasterize(
        &self,
        handle: DocumentHandle,
        page_index: u32,
        scale: f32,
        cancel: &CancellationToken,
    ) -> EngineResult<Option<RgbaImage>> {
        if cancel.is_cancelled() {
            return Ok(None);
        }

        let document = self.load(handle)?;
        let page_count = u32::from(document.pages().len());
        let page = document
            .pages()
            .get(page_index as u16)
            .map_err(|_| EngineError::PageOutOfRange {
                page: page_index,
                page_count,
            })?;

        let scale = if scale <= 0.0 { 1.0 } else { scale };
        let target_width = (page.width().value * scale).round().max(1.0) as i32;
        let target_height = (page.height().value * scale).round().max(1.0) as i32;

        let config = PdfRenderConfig::new()
            .set_target_width(target_width)
            .set_target_height(target_height);

        let bitmap = page
            .render_with_config(&config)
            .map_err(|err| EngineError::Backend(format!("render failed: {err}")))?;

        let image = bitmap
            .as_image()
            .as_rgba8()
            .ok_or_else(|| EngineError::Backend("bitmap is not RGBA".to_owned()))?
            .clone();

        if cancel.is_cancelled() {
            return Ok(None);
        }

        Ok(Some(image))
    }

    fn close(&mut self, handle: DocumentHandle) -> EngineResult<()> {
        self.docs
            .remove(&handle)
            .map(|_| ())
            .ok_or(EngineError::UnknownHandle(handle.raw()))
    }
}
