//! 8-bit RGB <-> HSV conversion.
//!
//! Hue is stored in half-degree units (0..=179) so it fits in a byte;
//! saturation and value span 0..=255. All foliage thresholds in
//! [`crate::coverage`] are expressed in these units.

use image::{ImageBuffer, Rgb, RgbImage};
use rayon::prelude::*;

/// Convert one RGB pixel to 8-bit HSV.
#[inline]
pub fn rgb_to_hsv(rgb: [u8; 3]) -> [u8; 3] {
    let r = rgb[0] as f32;
    let g = rgb[1] as f32;
    let b = rgb[2] as f32;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let hue_degrees = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    let hue_degrees = if hue_degrees < 0.0 {
        hue_degrees + 360.0
    } else {
        hue_degrees
    };

    // 359.5° rounds up to 180 half-degrees, which is red again
    let mut hue = (hue_degrees / 2.0).round() as u32;
    if hue >= 180 {
        hue -= 180;
    }

    let saturation = if max == 0.0 {
        0.0
    } else {
        (255.0 * delta / max).round()
    };

    [hue as u8, saturation as u8, max as u8]
}

/// Convert one 8-bit HSV pixel back to RGB.
#[inline]
pub fn hsv_to_rgb(hsv: [u8; 3]) -> [u8; 3] {
    let hue_degrees = (hsv[0] as f32 * 2.0) % 360.0;
    let s = hsv[1] as f32 / 255.0;
    let v = hsv[2] as f32 / 255.0;

    let chroma = v * s;
    let sector = hue_degrees / 60.0;
    let x = chroma * (1.0 - ((sector % 2.0) - 1.0).abs());
    let m = v - chroma;

    let (r, g, b) = match sector as u32 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };

    let to_byte = |c: f32| ((c + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    [to_byte(r), to_byte(g), to_byte(b)]
}

/// An image whose three channels are hue, saturation and value.
///
/// Kept as a distinct type so an HSV buffer can never be mistaken for RGB.
#[derive(Debug, Clone, PartialEq)]
pub struct HsvImage(ImageBuffer<Rgb<u8>, Vec<u8>>);

impl HsvImage {
    pub fn from_rgb(rgb: &RgbImage) -> Self {
        let (width, height) = rgb.dimensions();
        let mut hsv: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::new(width, height);
        hsv.par_chunks_exact_mut(3)
            .zip(rgb.par_chunks_exact(3))
            .for_each(|(dst, src)| {
                dst.copy_from_slice(&rgb_to_hsv([src[0], src[1], src[2]]));
            });
        Self(hsv)
    }

    /// Build an HSV image directly from per-pixel `[h, s, v]` values.
    pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> [u8; 3]) -> Self {
        Self(ImageBuffer::from_fn(width, height, |x, y| Rgb(f(x, y))))
    }

    pub fn to_rgb(&self) -> RgbImage {
        let (width, height) = self.0.dimensions();
        let mut rgb = RgbImage::new(width, height);
        rgb.par_chunks_exact_mut(3)
            .zip(self.0.par_chunks_exact(3))
            .for_each(|(dst, src)| {
                dst.copy_from_slice(&hsv_to_rgb([src[0], src[1], src[2]]));
            });
        rgb
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }

    /// Hue channel of every pixel, row-major.
    pub fn hues(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.chunks_exact(3).map(|px| px[0])
    }

    /// Scale saturation by `factor`, clipping to 0..=255.
    pub fn scale_saturation(&self, factor: f32) -> Self {
        let mut out = self.0.clone();
        out.par_chunks_exact_mut(3).for_each(|px| {
            px[1] = (px[1] as f32 * factor).round().clamp(0.0, 255.0) as u8;
        });
        Self(out)
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.0.get_pixel(x, y).0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_hues() {
        assert_eq!(rgb_to_hsv([255, 0, 0]), [0, 255, 255]);
        assert_eq!(rgb_to_hsv([0, 255, 0]), [60, 255, 255]);
        assert_eq!(rgb_to_hsv([0, 0, 255]), [120, 255, 255]);
        // magenta sits in the purple foliage band
        assert_eq!(rgb_to_hsv([255, 0, 255]), [150, 255, 255]);
    }

    #[test]
    fn test_gray_has_zero_hue_and_saturation() {
        assert_eq!(rgb_to_hsv([0, 0, 0]), [0, 0, 0]);
        assert_eq!(rgb_to_hsv([128, 128, 128]), [0, 0, 128]);
    }

    #[test]
    fn test_pure_colors_survive_conversion() {
        for rgb in [[255, 0, 0], [0, 255, 0], [0, 0, 255], [255, 0, 255], [255, 255, 255]] {
            assert_eq!(hsv_to_rgb(rgb_to_hsv(rgb)), rgb);
        }
    }

    #[test]
    fn test_desaturate_to_gray() {
        let img = HsvImage::from_rgb(&RgbImage::from_pixel(2, 2, Rgb([40, 200, 40])));
        let gray = img.scale_saturation(0.0).to_rgb();
        let px = gray.get_pixel(0, 0);
        assert_eq!(px[0], px[1]);
        assert_eq!(px[1], px[2]);
        assert_eq!(px[0], 200);
    }

    #[test]
    fn test_saturation_clips_instead_of_wrapping() {
        let img = HsvImage::from_fn(1, 1, |_, _| [60, 200, 200]);
        assert_eq!(img.scale_saturation(5.0).get_pixel(0, 0), [60, 255, 200]);
    }
}
