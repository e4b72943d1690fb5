//! Mutable RGBA canvas backing the page editor.
//!
//! The canvas is the single shared pixel surface the editing pipeline
//! mutates. It offers the handful of primitives the pipeline needs:
//! sub-rectangle read/write, transparent clear, alpha-blended fill, label
//! drawing, whole-surface snapshot/restore, and PNG capture.

use crate::font;
use crate::rect::PixelRect;
use image::{imageops, ImageFormat, Pixel, Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use std::io::Cursor;

/// Scale factor applied to the built-in 5x7 label font.
const LABEL_SCALE: u32 = 2;

/// Left padding between a label rectangle and its text, in pixels.
const LABEL_PADDING: u32 = 4;

/// An owned RGBA pixel surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    /// Create a fully transparent canvas.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    /// Wrap an existing raster, e.g. a freshly rasterized page.
    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Borrow the backing raster.
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Consume the canvas, yielding the backing raster.
    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Full copy of the current pixel state, for later [`restore`].
    ///
    /// [`restore`]: Canvas::restore
    pub fn snapshot(&self) -> Canvas {
        self.clone()
    }

    /// Overwrite the whole surface with a previously taken snapshot.
    pub fn restore(&mut self, snapshot: &Canvas) {
        self.image = snapshot.image.clone();
    }

    /// Copy out the pixels under `rect`, clipped to the canvas.
    ///
    /// Returns `None` when the clipped rectangle is empty.
    pub fn sub_image(&self, rect: PixelRect) -> Option<RgbaImage> {
        let rect = rect.clamped(self.width(), self.height());
        if rect.is_empty() {
            return None;
        }
        Some(imageops::crop_imm(&self.image, rect.x, rect.y, rect.width, rect.height).to_image())
    }

    /// Write `patch` back with its top-left corner at `(x, y)`.
    pub fn put_sub_image(&mut self, x: u32, y: u32, patch: &RgbaImage) {
        imageops::replace(&mut self.image, patch, i64::from(x), i64::from(y));
    }

    /// Overwrite `rect` with fully transparent pixels.
    pub fn clear_rect(&mut self, rect: PixelRect) {
        let rect = rect.clamped(self.width(), self.height());
        if rect.is_empty() {
            return;
        }
        draw_filled_rect_mut(
            &mut self.image,
            Rect::at(rect.x as i32, rect.y as i32).of_size(rect.width, rect.height),
            Rgba([0, 0, 0, 0]),
        );
    }

    /// Composite `color` over `rect` with source-over alpha blending.
    pub fn fill_rect_blend(&mut self, rect: PixelRect, color: Rgba<u8>) {
        let rect = rect.clamped(self.width(), self.height());
        if rect.is_empty() {
            return;
        }
        for y in rect.y..rect.bottom() {
            for x in rect.x..rect.right() {
                let mut px = *self.image.get_pixel(x, y);
                px.blend(&color);
                self.image.put_pixel(x, y, px);
            }
        }
    }

    /// Draw a single-line label anchored at the left edge of `rect`,
    /// vertically centered. Text wider than the canvas is clipped.
    pub fn draw_label(&mut self, rect: PixelRect, text: &str, color: Rgba<u8>) {
        let rect = rect.clamped(self.width(), self.height());
        if rect.is_empty() || text.is_empty() {
            return;
        }
        let line_height = font::text_height(LABEL_SCALE);
        let x = i64::from(rect.x + LABEL_PADDING.min(rect.width.saturating_sub(1)));
        let y = i64::from(rect.y) + i64::from(rect.height.saturating_sub(line_height)) / 2;
        font::draw_text(&mut self.image, x, y, text, LABEL_SCALE, color);
    }

    /// Encode the canvas as PNG.
    pub fn to_png(&self) -> Result<Vec<u8>, image::ImageError> {
        let mut bytes = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }
}
