//! Fixed-radius box blur over RGBA buffers.
//!
//! Each interior pixel becomes the unweighted per-channel average of the
//! square window around it, sampled from the input buffer. Pixels within
//! the radius of any edge are copied through untouched; the sampling window
//! is never clamped. The hard edge this leaves at region borders matches
//! the editor's historical output and is covered by tests.

use image::{Rgba, RgbaImage};

/// Blur window radius. The averaging window is `(2 * BLUR_RADIUS + 1)²`.
pub const BLUR_RADIUS: u32 = 3;

/// Blur a buffer with the fixed [`BLUR_RADIUS`].
///
/// Pure: the input is left untouched and a fresh buffer is returned.
/// Buffers smaller than the blur window on either axis have no interior
/// pixels and come back as an unmodified copy.
pub fn box_blur(src: &RgbaImage) -> RgbaImage {
    box_blur_with_radius(src, BLUR_RADIUS)
}

fn box_blur_with_radius(src: &RgbaImage, radius: u32) -> RgbaImage {
    let (width, height) = src.dimensions();
    let mut out = src.clone();

    let span = 2 * radius + 1;
    if width < span || height < span {
        return out;
    }

    let window = span * span;

    for y in radius..height - radius {
        for x in radius..width - radius {
            let mut sum = [0u32; 4];
            for dy in 0..span {
                for dx in 0..span {
                    let px = src.get_pixel(x + dx - radius, y + dy - radius);
                    sum[0] += u32::from(px[0]);
                    sum[1] += u32::from(px[1]);
                    sum[2] += u32::from(px[2]);
                    sum[3] += u32::from(px[3]);
                }
            }
            out.put_pixel(
                x,
                y,
                Rgba([
                    (sum[0] / window) as u8,
                    (sum[1] / window) as u8,
                    (sum[2] / window) as u8,
                    (sum[3] / window) as u8,
                ]),
            );
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([
                (x * 7 % 256) as u8,
                (y * 13 % 256) as u8,
                ((x + y) * 5 % 256) as u8,
                255,
            ])
        })
    }

    #[test]
    fn uniform_buffer_is_unchanged() {
        let src = RgbaImage::from_pixel(20, 15, Rgba([120, 40, 200, 255]));
        assert_eq!(box_blur(&src), src);
    }

    #[test]
    fn buffer_smaller_than_window_is_unchanged() {
        // 7x7 is the smallest buffer with an interior pixel; anything
        // narrower on either axis must come back identical.
        let src = gradient(4, 4);
        assert_eq!(box_blur(&src), src);

        let src = gradient(6, 40);
        assert_eq!(box_blur(&src), src);

        let src = gradient(40, 6);
        assert_eq!(box_blur(&src), src);
    }

    #[test]
    fn edges_are_untouched_and_interior_changes() {
        let src = gradient(24, 24);
        let blurred = box_blur(&src);

        for x in 0..24 {
            for y in 0..24 {
                let interior = (BLUR_RADIUS..24 - BLUR_RADIUS).contains(&x)
                    && (BLUR_RADIUS..24 - BLUR_RADIUS).contains(&y);
                if !interior {
                    assert_eq!(blurred.get_pixel(x, y), src.get_pixel(x, y));
                }
            }
        }

        assert_ne!(blurred, src);
    }

    #[test]
    fn input_is_not_mutated() {
        let src = gradient(16, 16);
        let copy = src.clone();
        let _ = box_blur(&src);
        assert_eq!(src, copy);
    }

    #[test]
    fn interior_pixel_is_window_average() {
        // A single white pixel in a black field spreads 255/49 across the
        // windows that contain it.
        let mut src = RgbaImage::from_pixel(15, 15, Rgba([0, 0, 0, 255]));
        src.put_pixel(7, 7, Rgba([255, 255, 255, 255]));

        let blurred = box_blur(&src);
        let expected = 255 / 49;
        assert_eq!(blurred.get_pixel(7, 7)[0], expected as u8);
        assert_eq!(blurred.get_pixel(4, 4)[0], expected as u8);
        // Outside the window the white pixel contributes nothing.
        assert_eq!(blurred.get_pixel(3, 7)[0], 0);
    }
}
