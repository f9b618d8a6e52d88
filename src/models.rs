use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::coverage::CoverageResult;
use crate::growth::GrowthReport;

/// Axis-aligned detection in source-image pixel coordinates.
///
/// Coordinates may extend past the image; clamping happens when the box is
/// turned into a [`CropRect`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub confidence: f32,
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, width: u32, height: u32, confidence: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            confidence,
        }
    }

    /// Build from corner coordinates, truncating to whole pixels.
    /// Returns `None` when the corners do not span a positive area.
    pub fn from_corners(x1: f32, y1: f32, x2: f32, y2: f32, confidence: f32) -> Option<Self> {
        let (x1, y1, x2, y2) = (x1 as i32, y1 as i32, x2 as i32, y2 as i32);
        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some(Self::new(
            x1,
            y1,
            (x2 - x1) as u32,
            (y2 - y1) as u32,
            confidence.clamp(0.0, 1.0),
        ))
    }

    pub fn right(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    pub fn bottom(&self) -> i64 {
        self.y as i64 + self.height as i64
    }

    pub fn area(&self) -> f32 {
        self.width as f32 * self.height as f32
    }

    /// Intersection over union with another box
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let x1 = (self.x as i64).max(other.x as i64);
        let y1 = (self.y as i64).max(other.y as i64);
        let x2 = self.right().min(other.right());
        let y2 = self.bottom().min(other.bottom());

        if x2 <= x1 || y2 <= y1 {
            return 0.0;
        }

        let intersection = ((x2 - x1) * (y2 - y1)) as f32;
        let union = self.area() + other.area() - intersection;
        if union > 0.0 { intersection / union } else { 0.0 }
    }

    /// Clamp to a `width x height` image. `None` if nothing of the box is left.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<CropRect> {
        let x1 = (self.x as i64).max(0);
        let y1 = (self.y as i64).max(0);
        let x2 = self.right().min(width as i64);
        let y2 = self.bottom().min(height as i64);

        if x2 <= x1 || y2 <= y1 {
            return None;
        }

        Some(CropRect {
            x: x1 as u32,
            y: y1 as u32,
            width: (x2 - x1) as u32,
            height: (y2 - y1) as u32,
        })
    }
}

/// Non-empty rectangle lying fully inside an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Boxes returned by a detector, in detection order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    boxes: Vec<BoundingBox>,
}

impl DetectionResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_vec(boxes: Vec<BoundingBox>) -> Self {
        Self { boxes }
    }

    pub fn as_slice(&self) -> &[BoundingBox] {
        &self.boxes
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BoundingBox> {
        self.boxes.iter()
    }

    /// Keep boxes whose confidence is at least `threshold`
    pub fn filter_by_confidence(mut self, threshold: f32) -> Self {
        self.boxes.retain(|bbox| bbox.confidence >= threshold);
        self
    }

    /// Greedy non-maximum suppression. Survivors come back in descending
    /// confidence order.
    pub fn apply_nms(mut self, iou_threshold: f32) -> Self {
        self.boxes.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        let mut keep: Vec<BoundingBox> = Vec::with_capacity(self.boxes.len());
        for candidate in self.boxes {
            if keep.iter().all(|kept| kept.iou(&candidate) <= iou_threshold) {
                keep.push(candidate);
            }
        }

        Self::from_vec(keep)
    }
}

impl IntoIterator for DetectionResult {
    type Item = BoundingBox;
    type IntoIter = std::vec::IntoIter<BoundingBox>;

    fn into_iter(self) -> Self::IntoIter {
        self.boxes.into_iter()
    }
}

impl FromIterator<BoundingBox> for DetectionResult {
    fn from_iter<T: IntoIterator<Item = BoundingBox>>(iter: T) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

/// How the working image was derived from the source photograph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PanelSummary {
    /// Nothing usable was detected (or cropping was disabled); the whole
    /// photograph was measured.
    WholeImage,
    SinglePanel { rect: CropRect },
    Stitched { count: usize, height: u32 },
}

impl PanelSummary {
    pub fn is_fallback(&self) -> bool {
        matches!(self, PanelSummary::WholeImage)
    }
}

/// Coverage of one photograph together with how its working image was built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageAnalysis {
    pub source: PathBuf,
    pub coverage: CoverageResult,
    pub panels: PanelSummary,
}

/// Before/after analyses and the growth derived from them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthComparison {
    pub before: ImageAnalysis,
    pub after: ImageAnalysis,
    pub growth: GrowthReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_iou() {
        let a = BoundingBox::new(0, 0, 10, 10, 0.9);
        let b = BoundingBox::new(5, 5, 10, 10, 0.8);
        let iou = a.iou(&b);
        assert!(iou > 0.0 && iou < 1.0);
        assert_eq!(a.iou(&BoundingBox::new(20, 20, 5, 5, 0.5)), 0.0);
    }

    #[test]
    fn test_clamp_partially_outside() {
        let bbox = BoundingBox::new(-10, 90, 30, 30, 0.9);
        let rect = bbox.clamp_to(100, 100).unwrap();
        assert_eq!(rect, CropRect { x: 0, y: 90, width: 20, height: 10 });
    }

    #[test]
    fn test_clamp_fully_outside_is_none() {
        assert!(BoundingBox::new(150, 10, 20, 20, 0.9).clamp_to(100, 100).is_none());
        assert!(BoundingBox::new(-40, 10, 20, 20, 0.9).clamp_to(100, 100).is_none());
    }

    #[test]
    fn test_from_corners_rejects_degenerate() {
        assert!(BoundingBox::from_corners(10.0, 10.0, 10.4, 30.0, 0.5).is_none());
        let bbox = BoundingBox::from_corners(10.7, 5.2, 40.9, 25.0, 0.5).unwrap();
        assert_eq!((bbox.x, bbox.y, bbox.width, bbox.height), (10, 5, 30, 20));
    }

    #[test]
    fn test_filter_by_confidence_keeps_threshold() {
        let result = DetectionResult::from_vec(vec![
            BoundingBox::new(0, 0, 5, 5, 0.25),
            BoundingBox::new(0, 0, 5, 5, 0.24),
        ])
        .filter_by_confidence(0.25);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_nms_suppresses_overlap() {
        let result = DetectionResult::from_vec(vec![
            BoundingBox::new(2, 2, 10, 10, 0.8),
            BoundingBox::new(0, 0, 10, 10, 0.9),
            BoundingBox::new(50, 50, 10, 10, 0.7),
        ])
        .apply_nms(0.45);
        assert_eq!(result.len(), 2);
        assert_eq!(result.as_slice()[0].confidence, 0.9);
    }
}
