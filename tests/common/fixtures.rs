use image::{Rgb, RgbImage};
use plant_growth::{AnalysisConfig, BoundingBox, FixedDetector, PlantAnalyzer};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Color constants for tests
pub const GREEN: Rgb<u8> = Rgb([0, 255, 0]);
/// Hue 135 in half-degree units, inside the purple foliage band
pub const PURPLE: Rgb<u8> = Rgb([128, 0, 255]);
pub const GRAY: Rgb<u8> = Rgb([128, 128, 128]);

/// Saves `image` as PNG under `dir` and returns its path.
pub fn save_png(dir: &Path, name: &str, image: &RgbImage) -> PathBuf {
    let path = dir.join(name);
    image
        .save_with_format(&path, image::ImageFormat::Png)
        .expect("Failed to save test image");
    path
}

/// 10x10 gray image whose first `foliage` pixels (row-major) are green.
pub fn coverage_image(foliage: u32) -> RgbImage {
    RgbImage::from_fn(10, 10, |x, y| if y * 10 + x < foliage { GREEN } else { GRAY })
}

/// 400x200 gray photograph with two plant panels:
/// a 60x100 green one at x=300 and an 80x120 purple one at x=50.
pub fn two_panel_image() -> (RgbImage, Vec<BoundingBox>) {
    let mut image = RgbImage::from_pixel(400, 200, GRAY);
    for y in 10..110 {
        for x in 300..360 {
            image.put_pixel(x, y, GREEN);
        }
    }
    for y in 20..140 {
        for x in 50..130 {
            image.put_pixel(x, y, PURPLE);
        }
    }
    let boxes = vec![
        BoundingBox::new(300, 10, 60, 100, 0.91),
        BoundingBox::new(50, 20, 80, 120, 0.87),
    ];
    (image, boxes)
}

/// Analyzer using a stub detector that always reports `boxes`.
pub fn analyzer_with(boxes: Vec<BoundingBox>, config: AnalysisConfig) -> PlantAnalyzer {
    PlantAnalyzer::new(Arc::new(FixedDetector::new(boxes)), config)
        .expect("Failed to build analyzer")
}
