//! Hue-only foliage classification.
//!
//! A pixel counts as foliage when its hue lies in the green or purple band,
//! whatever its saturation or value. Near-gray pixels that happen to fall in
//! range are counted too; that trade-off buys tolerance to lighting changes.

use image::RgbImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::color::HsvImage;

/// Inclusive hue interval in 8-bit half-degree units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HueRange {
    pub min: u8,
    pub max: u8,
}

impl HueRange {
    pub const fn new(min: u8, max: u8) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn contains(&self, hue: u8) -> bool {
        hue >= self.min && hue <= self.max
    }
}

pub const GREEN_HUE: HueRange = HueRange::new(35, 85);
pub const PURPLE_HUE: HueRange = HueRange::new(125, 155);
pub const FOLIAGE_HUE_RANGES: [HueRange; 2] = [GREEN_HUE, PURPLE_HUE];

#[inline]
pub fn is_foliage_hue(hue: u8) -> bool {
    FOLIAGE_HUE_RANGES.iter().any(|range| range.contains(hue))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoverageResult {
    pub foliage_pixel_count: u64,
    pub total_pixel_count: u64,
    pub percentage: f64,
}

impl CoverageResult {
    pub fn new(foliage_pixel_count: u64, total_pixel_count: u64) -> Self {
        debug_assert!(foliage_pixel_count <= total_pixel_count);
        let percentage = if total_pixel_count == 0 {
            0.0
        } else {
            100.0 * foliage_pixel_count as f64 / total_pixel_count as f64
        };
        Self {
            foliage_pixel_count,
            total_pixel_count,
            percentage,
        }
    }
}

/// Measures foliage coverage of a working image.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoverageAnalyzer;

impl CoverageAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn measure(&self, image: &RgbImage) -> CoverageResult {
        self.measure_hsv(&HsvImage::from_rgb(image))
    }

    pub fn measure_hsv(&self, image: &HsvImage) -> CoverageResult {
        let (width, height) = image.dimensions();
        let total = width as u64 * height as u64;
        let foliage = image.hues().filter(|&hue| is_foliage_hue(hue)).count() as u64;

        let result = CoverageResult::new(foliage, total);
        debug!(
            "Coverage: {}/{} foliage pixels ({:.2}%)",
            foliage, total, result.percentage
        );
        result
    }
}
