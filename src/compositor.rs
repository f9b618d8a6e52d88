//! Turns detector output into a single working image.
//!
//! Boxes are clamped to the source first and empty ones dropped; what is
//! left decides the layout:
//! - none: the source image is measured as-is
//! - one: the panel is cropped out
//! - several: panels are ordered left-to-right, brought to the height of the
//!   shortest one and stitched side by side

use image::imageops::{self, FilterType};
use image::RgbImage;
use tracing::{debug, info, warn};

use crate::models::{BoundingBox, CropRect, DetectionResult, PanelSummary};

/// Valid panels grouped by how many there are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelSelection {
    None,
    Single(CropRect),
    /// Sorted by `x`, ties in detection order
    Multiple(Vec<CropRect>),
}

impl PanelSelection {
    pub fn from_detections(detections: &DetectionResult, width: u32, height: u32) -> Self {
        let mut panels: Vec<(i32, CropRect)> = detections
            .iter()
            .filter_map(|bbox| clamp_logged(bbox, width, height).map(|rect| (bbox.x, rect)))
            .collect();

        match panels.len() {
            0 => PanelSelection::None,
            1 => PanelSelection::Single(panels[0].1),
            _ => {
                // sort_by_key is stable
                panels.sort_by_key(|(x, _)| *x);
                PanelSelection::Multiple(panels.into_iter().map(|(_, rect)| rect).collect())
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            PanelSelection::None => 0,
            PanelSelection::Single(_) => 1,
            PanelSelection::Multiple(rects) => rects.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, PanelSelection::None)
    }
}

fn clamp_logged(bbox: &BoundingBox, width: u32, height: u32) -> Option<CropRect> {
    let rect = bbox.clamp_to(width, height);
    if rect.is_none() {
        debug!(
            "Dropping box at ({}, {}) {}x{}: no area inside {}x{} image",
            bbox.x, bbox.y, bbox.width, bbox.height, width, height
        );
    }
    rect
}

/// Working image plus the layout it was built from.
#[derive(Debug, Clone)]
pub struct Composite {
    pub image: RgbImage,
    pub selection: PanelSelection,
    /// Common height of stitched panels
    pub target_height: Option<u32>,
}

impl Composite {
    pub fn summary(&self) -> PanelSummary {
        match &self.selection {
            PanelSelection::None => PanelSummary::WholeImage,
            PanelSelection::Single(rect) => PanelSummary::SinglePanel { rect: *rect },
            PanelSelection::Multiple(rects) => PanelSummary::Stitched {
                count: rects.len(),
                height: self.target_height.unwrap_or(self.image.height()),
            },
        }
    }
}

/// Build the working image for `source` from its detections.
pub fn compose(source: &RgbImage, detections: &DetectionResult) -> Composite {
    let (width, height) = source.dimensions();
    let selection = PanelSelection::from_detections(detections, width, height);

    match selection {
        PanelSelection::None => {
            if detections.is_empty() {
                warn!("No panel detected, measuring the whole image");
            } else {
                warn!(
                    "All {} detections fall outside the image, measuring the whole image",
                    detections.len()
                );
            }
            Composite {
                image: source.clone(),
                selection,
                target_height: None,
            }
        }
        PanelSelection::Single(rect) => {
            debug!(
                "Cropping single panel at ({}, {}) {}x{}",
                rect.x, rect.y, rect.width, rect.height
            );
            Composite {
                image: crop(source, &rect),
                selection,
                target_height: None,
            }
        }
        PanelSelection::Multiple(ref rects) => {
            let (image, target_height) = stitch(source, rects);
            info!(
                "Merged {} detected panels into one {}x{} image",
                rects.len(),
                image.width(),
                image.height()
            );
            Composite {
                image,
                selection,
                target_height: Some(target_height),
            }
        }
    }
}

fn crop(source: &RgbImage, rect: &CropRect) -> RgbImage {
    imageops::crop_imm(source, rect.x, rect.y, rect.width, rect.height).to_image()
}

/// Width of a `width x height` region scaled to `target_height`, keeping
/// aspect ratio. Never less than one pixel.
pub fn scaled_width(width: u32, height: u32, target_height: u32) -> u32 {
    let scaled = (width as u64 * target_height as u64) / height as u64;
    scaled.max(1) as u32
}

/// Resize every region to the shortest region's height and concatenate them
/// left to right. `rects` must be non-empty.
fn stitch(source: &RgbImage, rects: &[CropRect]) -> (RgbImage, u32) {
    let target_height = rects.iter().map(|r| r.height).min().unwrap_or(0);

    let regions: Vec<RgbImage> = rects
        .iter()
        .map(|rect| {
            let region = crop(source, rect);
            if rect.height == target_height {
                region
            } else {
                let new_width = scaled_width(rect.width, rect.height, target_height);
                imageops::resize(&region, new_width, target_height, FilterType::Triangle)
            }
        })
        .collect();

    let total_width: u32 = regions.iter().map(|r| r.width()).sum();
    let mut canvas = RgbImage::new(total_width, target_height);

    let mut offset_x = 0i64;
    for region in &regions {
        imageops::replace(&mut canvas, region, offset_x, 0);
        offset_x += region.width() as i64;
    }

    (canvas, target_height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn bbox(x: i32, y: i32, w: u32, h: u32) -> BoundingBox {
        BoundingBox::new(x, y, w, h, 0.9)
    }

    fn rect(x: u32, y: u32, width: u32, height: u32) -> CropRect {
        CropRect { x, y, width, height }
    }

    #[test]
    fn test_selection_cardinality() {
        let none = PanelSelection::from_detections(&DetectionResult::empty(), 100, 100);
        assert_eq!(none, PanelSelection::None);

        let single =
            PanelSelection::from_detections(&DetectionResult::from_vec(vec![bbox(10, 10, 20, 20)]), 100, 100);
        assert_eq!(single, PanelSelection::Single(rect(10, 10, 20, 20)));
    }

    #[test]
    fn test_out_of_bounds_box_is_excluded_before_stitching() {
        let detections = DetectionResult::from_vec(vec![
            bbox(10, 10, 20, 20),
            bbox(500, 10, 20, 20),
        ]);
        let selection = PanelSelection::from_detections(&detections, 100, 100);
        assert_eq!(selection, PanelSelection::Single(rect(10, 10, 20, 20)));
    }

    #[test]
    fn test_stable_sort_on_equal_x() {
        let detections = DetectionResult::from_vec(vec![
            bbox(40, 0, 10, 10),
            bbox(5, 50, 10, 10),
            bbox(5, 0, 10, 10),
            bbox(5, 25, 10, 10),
        ]);
        let selection = PanelSelection::from_detections(&detections, 100, 100);
        assert_eq!(
            selection,
            PanelSelection::Multiple(vec![
                rect(5, 50, 10, 10),
                rect(5, 0, 10, 10),
                rect(5, 25, 10, 10),
                rect(40, 0, 10, 10),
            ])
        );
    }

    #[test]
    fn test_sort_uses_original_x_for_clamped_boxes() {
        // both clamp to x = 0; the one further left in the source comes first
        let detections = DetectionResult::from_vec(vec![
            bbox(-5, 0, 20, 10),
            bbox(-20, 40, 30, 10),
        ]);
        let selection = PanelSelection::from_detections(&detections, 100, 100);
        assert_eq!(
            selection,
            PanelSelection::Multiple(vec![rect(0, 40, 10, 10), rect(0, 0, 15, 10)])
        );
    }

    #[test]
    fn test_single_box_is_exact_crop() {
        let source = RgbImage::from_fn(30, 20, |x, y| Rgb([x as u8 * 8, y as u8 * 12, (x + y) as u8]));
        let detections = DetectionResult::from_vec(vec![bbox(7, 4, 11, 9)]);
        let composite = compose(&source, &detections);
        let expected = imageops::crop_imm(&source, 7, 4, 11, 9).to_image();
        assert_eq!(composite.image, expected);
        assert_eq!(composite.summary(), PanelSummary::SinglePanel { rect: rect(7, 4, 11, 9) });
    }

    #[test]
    fn test_all_outside_falls_back_to_source() {
        let source = RgbImage::from_pixel(8, 8, Rgb([1, 2, 3]));
        let detections = DetectionResult::from_vec(vec![bbox(50, 50, 5, 5)]);
        let composite = compose(&source, &detections);
        assert_eq!(composite.image, source);
        assert_eq!(composite.summary(), PanelSummary::WholeImage);
    }

    #[test]
    fn test_scaled_width_keeps_aspect() {
        assert_eq!(scaled_width(60, 120, 100), 50);
        assert_eq!(scaled_width(1, 120, 100), 1);
        assert_eq!(scaled_width(33, 100, 100), 33);
    }

    #[test]
    fn test_stitch_equal_heights_is_plain_concatenation() {
        let source = RgbImage::from_fn(40, 10, |x, _| {
            if x < 20 { Rgb([255, 0, 0]) } else { Rgb([0, 0, 255]) }
        });
        let detections = DetectionResult::from_vec(vec![
            bbox(20, 0, 10, 10),
            bbox(0, 0, 10, 10),
        ]);
        let composite = compose(&source, &detections);
        assert_eq!(composite.image.dimensions(), (20, 10));
        assert_eq!(composite.image.get_pixel(0, 0), &Rgb([255, 0, 0]));
        assert_eq!(composite.image.get_pixel(19, 9), &Rgb([0, 0, 255]));
        assert_eq!(composite.summary(), PanelSummary::Stitched { count: 2, height: 10 });
    }
}
