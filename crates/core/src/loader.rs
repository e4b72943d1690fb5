//! Upload validation for incoming PDF files.
//!
//! The file source collaborator delivers a single PDF up to a configured
//! size limit. Validation happens here, before any bytes reach the
//! rasterizer: size cap and `%PDF` magic, with the display name carried
//! alongside the bytes.

use crate::config::SessionConfig;
use std::fs;
use std::path::Path;

/// A validated upload: display name plus raw bytes.
#[derive(Debug, Clone)]
pub struct LoadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("file is {size} bytes, over the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },
    #[error("not a PDF file (missing %PDF header)")]
    NotAPdf,
}

/// Validate in-memory bytes as an acceptable upload.
pub fn load_pdf_bytes(
    name: &str,
    bytes: Vec<u8>,
    config: &SessionConfig,
) -> Result<LoadedFile, LoaderError> {
    let size = bytes.len() as u64;
    if size > config.max_file_bytes {
        return Err(LoaderError::TooLarge {
            size,
            limit: config.max_file_bytes,
        });
    }

    if !bytes.starts_with(b"%PDF-") {
        return Err(LoaderError::NotAPdf);
    }

    Ok(LoadedFile {
        name: name.to_owned(),
        bytes,
    })
}

/// Read and validate a PDF from disk.
///
/// The size limit is checked against file metadata before reading, so an
/// oversized file is rejected without loading it.
pub fn load_pdf_file(path: &Path, config: &SessionConfig) -> Result<LoadedFile, LoaderError> {
    let size = fs::metadata(path)?.len();
    if size > config.max_file_bytes {
        return Err(LoaderError::TooLarge {
            size,
            limit: config.max_file_bytes,
        });
    }

    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".to_owned());

    load_pdf_bytes(&name, fs::read(path)?, config)
}
