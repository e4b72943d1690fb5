//! Document session and raster editing pipeline.
//!
//! The session owns everything a loaded document accumulates in memory:
//! the live page canvas, the in-progress selection, per-page effect and
//! annotation history with bounded undo, and the busy state of a running
//! export. Rasterization and PDF output are delegated to the collaborator
//! traits in `pagemark-engine`; pixels are mutated through
//! `pagemark-raster`.

pub mod annotation;
pub mod config;
pub mod export;
pub mod history;
pub mod loader;
pub mod render;
pub mod selection;
pub mod session;

pub use annotation::{Annotation, Color};
pub use config::SessionConfig;
pub use export::ExportError;
pub use history::{EffectKind, EffectOp, PageHistory};
pub use loader::{load_pdf_bytes, load_pdf_file, LoadedFile, LoaderError};
pub use render::{RenderError, RenderOutcome};
pub use selection::{SelectionRect, SelectionTracker};
pub use session::{DocumentSession, SessionError};

// The geometry and canvas types the session API speaks.
pub use pagemark_raster::{Canvas, PixelRect};
