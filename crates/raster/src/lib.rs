//! Raster editing primitives for page canvases.
//!
//! Pixel layer of the annotation pipeline: the mutable page [`Canvas`],
//! rectangular pixel regions, the fixed-radius box-blur filter, and a small
//! built-in bitmap font for single-line labels.

pub mod blur;
pub mod canvas;
pub mod font;
pub mod rect;

pub use blur::{box_blur, BLUR_RADIUS};
pub use canvas::Canvas;
pub use rect::PixelRect;

// The pixel currency of the whole workspace.
pub use image::{Rgba, RgbaImage};
