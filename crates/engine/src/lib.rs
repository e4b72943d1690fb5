//! PDF collaborator boundary.
//!
//! The editing pipeline never parses or serializes PDFs itself; it talks to
//! two collaborators defined here: a [`PageRasterizer`] that turns a page
//! number into pixels, and a [`PageSink`] that turns composited pages back
//! into a document. The default rasterizer is a pure-Rust `lopdf` backend
//! that renders deterministic placeholder pages; the `pdfium` feature adds
//! a real renderer on top of the same trait.

pub mod cancel;
pub mod rasterizer;
pub mod writer;

#[cfg(feature = "pdfium")]
pub mod pdfium;

pub use cancel::CancellationToken;
pub use rasterizer::{
    DocumentHandle, LopdfRasterizer, PageRasterizer, PageSizePt, RasterSource,
};
pub use writer::{ImageRef, PageSink, RasterPdfBuilder};

#[cfg(feature = "pdfium")]
pub use pdfium::PdfiumRasterizer;

/// Errors crossing the collaborator boundary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF parse error: {0}")]
    Parse(#[from] lopdf::Error),
    #[error("unknown document handle {0}")]
    UnknownHandle(u64),
    #[error("page index {page} out of range (page_count={page_count})")]
    PageOutOfRange { page: u32, page_count: u32 },
    #[error("encrypted PDFs are not supported")]
    Encrypted,
    #[error("image encode error: {0}")]
    Encode(#[from] image::ImageError),
    #[error("backend error: {0}")]
    Backend(String),
}

/// Result type for collaborator operations.
pub type EngineResult<T> = Result<T, EngineError>;
