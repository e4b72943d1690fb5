//! Page rasterization collaborators.

use crate::cancel::CancellationToken;
use crate::{EngineError, EngineResult};
use image::{Rgba, RgbaImage};
use lopdf::{Document, Object};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Opaque handle to an opened document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentHandle(u64);

impl DocumentHandle {
    /// Mint a handle from a raw id; rasterizer implementations own the
    /// id space behind the handles they give out.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Page dimensions in PDF points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSizePt {
    pub width: f32,
    pub height: f32,
}

/// Where document bytes come from.
#[derive(Debug, Clone)]
pub enum RasterSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl From<PathBuf> for RasterSource {
    fn from(value: PathBuf) -> Self {
        Self::Path(value)
    }
}

impl From<&Path> for RasterSource {
    fn from(value: &Path) -> Self {
        Self::Path(value.to_path_buf())
    }
}

impl From<Vec<u8>> for RasterSource {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

/// External rasterizer collaborator: page index in, pixels out.
///
/// `rasterize` accepts a [`CancellationToken`] because page rendering may
/// take arbitrarily long and is routinely superseded by navigation. A
/// backend that observes cancellation mid-render returns `Ok(None)`; that
/// is not a failure.
pub trait PageRasterizer {
    /// Open a document and return a handle for subsequent calls.
    fn open(&mut self, source: RasterSource) -> EngineResult<DocumentHandle>;

    /// Number of pages in the document.
    fn page_count(&self, handle: DocumentHandle) -> EngineResult<u32>;

    /// Size of a page (0-based index) in points.
    fn page_size(&self, handle: DocumentHandle, page_index: u32) -> EngineResult<PageSizePt>;

    /// Rasterize a page (0-based index) at `scale` pixels per point.
    ///
    /// Returns `Ok(None)` when the render was cancelled.
    fn rasterize(
        &self,
        handle: DocumentHandle,
        page_index: u32,
        scale: f32,
        cancel: &CancellationToken,
    ) -> EngineResult<Option<RgbaImage>>;

    /// Release a document.
    fn close(&mut self, handle: DocumentHandle) -> EngineResult<()>;
}

/// US Letter, the fallback when a page has no usable MediaBox.
const FALLBACK_PAGE_SIZE: PageSizePt = PageSizePt {
    width: 612.0,
    height: 792.0,
};

#[derive(Debug, Clone)]
struct ParsedDocument {
    page_sizes: Vec<PageSizePt>,
}

/// Default rasterizer backend.
///
/// Parses page geometry with `lopdf` and rasterizes deterministic
/// placeholder pages (white with a gray border) at the requested scale.
/// It exists so the whole pipeline (compositing, undo, export) runs and
/// tests without a native PDFium library present; swap in
/// [`PdfiumRasterizer`](crate::pdfium::PdfiumRasterizer) for real page
/// content.
#[derive(Debug, Default)]
pub struct LopdfRasterizer {
    next_handle: u64,
    docs: HashMap<DocumentHandle, ParsedDocument>,
}

impl LopdfRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    fn parse_sizes(bytes: &[u8]) -> EngineResult<Vec<PageSizePt>> {
        if bytes
            .windows("/Encrypt".len())
            .any(|window| window == b"/Encrypt")
        {
            return Err(EngineError::Encrypted);
        }

        let doc = Document::load_mem(bytes)?;
        let pages = doc.get_pages();
        let mut sizes = Vec::with_capacity(pages.len());

        for (_, object_id) in pages {
            let dict = doc.get_dictionary(object_id)?;
            let size = dict
                .get(b"MediaBox")
                .ok()
                .and_then(|obj| obj.as_array().ok())
                .and_then(|array| {
                    if array.len() != 4 {
                        return None;
                    }
                    let x0 = number(&array[0])?;
                    let y0 = number(&array[1])?;
                    let x1 = number(&array[2])?;
                    let y1 = number(&array[3])?;
                    Some(PageSizePt {
                        width: (x1 - x0).abs(),
                        height: (y1 - y0).abs(),
                    })
                })
                .unwrap_or(FALLBACK_PAGE_SIZE);

            sizes.push(size);
        }

        if sizes.is_empty() {
            return Err(EngineError::Backend("document has no pages".to_owned()));
        }

        Ok(sizes)
    }

    fn record(&self, handle: DocumentHandle) -> EngineResult<&ParsedDocument> {
        self.docs
            .get(&handle)
            .ok_or(EngineError::UnknownHandle(handle.raw()))
    }
}

/// Numeric MediaBox entries appear as both integers and reals in the wild.
fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value),
        _ => None,
    }
}

impl PageRasterizer for LopdfRasterizer {
    fn open(&mut self, source: RasterSource) -> EngineResult<DocumentHandle> {
        let bytes = match source {
            RasterSource::Path(path) => fs::read(path)?,
            RasterSource::Bytes(bytes) => bytes,
        };

        let page_sizes = Self::parse_sizes(&bytes)?;

        self.next_handle += 1;
        let handle = DocumentHandle(self.next_handle);
        self.docs.insert(handle, ParsedDocument { page_sizes });

        Ok(handle)
    }

    fn page_count(&self, handle: DocumentHandle) -> EngineResult<u32> {
        Ok(self.record(handle)?.page_sizes.len() as u32)
    }

    fn page_size(&self, handle: DocumentHandle, page_index: u32) -> EngineResult<PageSizePt> {
        let record = self.record(handle)?;
        record
            .page_sizes
            .get(page_index as usize)
            .copied()
            .ok_or(EngineError::PageOutOfRange {
                page: page_index,
                page_count: record.page_sizes.len() as u32,
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

        let size = self.page_size(handle, page_index)?;
        let scale = if scale <= 0.0 { 1.0 } else { scale };

        let width = (size.width * scale).round().max(1.0) as u32;
        let height = (size.height * scale).round().max(1.0) as u32;

        let mut image = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));

        let border = Rgba([220, 220, 220, 255]);
        if width >= 4 && height >= 4 {
            for x in 0..width {
                image.put_pixel(x, 0, border);
                image.put_pixel(x, height - 1, border);
            }
            for y in 0..height {
                image.put_pixel(0, y, border);
                image.put_pixel(width - 1, y, border);
            }
        }

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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::{PageSink, RasterPdfBuilder};

    /// Two-page fixture built with the crate's own writer.
    fn sample_pdf_bytes() -> Vec<u8> {
        let mut builder = RasterPdfBuilder::new();
        let first = RgbaImage::from_pixel(200, 100, Rgba([255, 255, 255, 255]));
        let second = RgbaImage::from_pixel(120, 150, Rgba([10, 20, 30, 255]));
        builder.push_page(&first).expect("embed first page");
        builder.push_page(&second).expect("embed second page");
        builder.finish().expect("serialize fixture")
    }

    #[test]
    fn open_reads_page_count() {
        let mut rasterizer = LopdfRasterizer::new();
        let handle = rasterizer
            .open(RasterSource::Bytes(sample_pdf_bytes()))
            .expect("open should succeed");

        assert_eq!(rasterizer.page_count(handle).expect("count"), 2);
    }

    #[test]
    fn page_size_reads_media_box() {
        let mut rasterizer = LopdfRasterizer::new();
        let handle = rasterizer
            .open(RasterSource::Bytes(sample_pdf_bytes()))
            .expect("open should succeed");

        let size = rasterizer.page_size(handle, 0).expect("size");
        assert_eq!(size.width, 200.0);
        assert_eq!(size.height, 100.0);

        let size = rasterizer.page_size(handle, 1).expect("size");
        assert_eq!(size.width, 120.0);
        assert_eq!(size.height, 150.0);
    }

    #[test]
    fn rasterize_scales_page_dimensions() {
        let mut rasterizer = LopdfRasterizer::new();
        let handle = rasterizer
            .open(RasterSource::Bytes(sample_pdf_bytes()))
            .expect("open should succeed");

        let token = CancellationToken::new();
        let image = rasterizer
            .rasterize(handle, 0, 1.5, &token)
            .expect("rasterize")
            .expect("not cancelled");

        assert_eq!(image.dimensions(), (300, 150));
        assert_eq!(*image.get_pixel(10, 10), Rgba([255, 255, 255, 255]));
        assert_eq!(*image.get_pixel(0, 0), Rgba([220, 220, 220, 255]));
    }

    #[test]
    fn rasterize_honors_cancellation() {
        let mut rasterizer = LopdfRasterizer::new();
        let handle = rasterizer
            .open(RasterSource::Bytes(sample_pdf_bytes()))
            .expect("open should succeed");

        let token = CancellationToken::new();
        token.cancel();

        let outcome = rasterizer
            .rasterize(handle, 0, 1.5, &token)
            .expect("rasterize");
        assert!(outcome.is_none());
    }

    #[test]
    fn encrypted_marker_is_rejected() {
        let mut bytes = sample_pdf_bytes();
        bytes.extend_from_slice(b"/Encrypt");

        let mut rasterizer = LopdfRasterizer::new();
        let err = rasterizer
            .open(RasterSource::Bytes(bytes))
            .expect_err("must reject encrypted marker");
        assert!(matches!(err, EngineError::Encrypted));
    }

    #[test]
    fn unknown_handle_is_an_error() {
        let rasterizer = LopdfRasterizer::new();
        let err = rasterizer
            .page_count(DocumentHandle(99))
            .expect_err("unknown handle");
        assert!(matches!(err, EngineError::UnknownHandle(99)));
    }

    #[test]
    fn page_index_out_of_range_is_an_error() {
        let mut rasterizer = LopdfRasterizer::new();
        let handle = rasterizer
            .open(RasterSource::Bytes(sample_pdf_bytes()))
            .expect("open should succeed");

        let err = rasterizer.page_size(handle, 7).expect_err("out of range");
        assert!(matches!(
            err,
            EngineError::PageOutOfRange {
                page: 7,
                page_count: 2
            }
        ));
    }

    #[test]
    fn close_releases_the_handle() {
        let mut rasterizer = LopdfRasterizer::new();
        let handle = rasterizer
            .open(RasterSource::Bytes(sample_pdf_bytes()))
            .expect("open should succeed");

        rasterizer.close(handle).expect("close");
        assert!(rasterizer.page_count(handle).is_err());
    }
}
