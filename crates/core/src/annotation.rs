//! Annotation model and colors.

use pagemark_raster::{PixelRect, Rgba};
use rand::Rng;

/// RGBA color, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Random light pastel at ~30% opacity, the default annotation fill.
    /// Light enough that the labeled content stays readable underneath.
    pub fn random_light() -> Self {
        let mut rng = rand::thread_rng();
        Self {
            r: rng.gen_range(127..=255),
            g: rng.gen_range(127..=255),
            b: rng.gen_range(127..=255),
            a: 77,
        }
    }

    pub fn to_rgba(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, self.a])
    }
}

/// A labeled region on a page.
///
/// Annotations live in the page's replay list: they are redrawn whenever
/// the page is re-rendered, independent of the pixel snapshots the undo
/// stack keeps.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub rect: PixelRect,
    pub text: String,
    pub color: Color,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_light_stays_in_pastel_range() {
        for _ in 0..64 {
            let color = Color::random_light();
            assert!(color.r >= 127);
            assert!(color.g >= 127);
            assert!(color.b >= 127);
            assert_eq!(color.a, 77);
        }
    }

    #[test]
    fn rgb_is_opaque() {
        assert_eq!(Color::rgb(1, 2, 3).a, 255);
    }
}
