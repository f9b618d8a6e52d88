//! Panel detection.
//!
//! The rest of the crate only sees [`PanelDetector`]; the model-backed
//! [`RtenPanelDetector`] and the deterministic [`FixedDetector`] are
//! interchangeable behind it.

pub mod yolo;

use image::RgbImage;

use crate::config::DEFAULT_CONFIDENCE_THRESHOLD;
use crate::error::Result;
use crate::models::{BoundingBox, DetectionResult};

pub use yolo::RtenPanelDetector;

/// Finds plant panels in an image.
///
/// Implementations apply their own confidence threshold. Finding nothing is
/// a normal outcome and must come back as an empty [`DetectionResult`].
pub trait PanelDetector: Send + Sync {
    fn detect(&self, image: &RgbImage) -> Result<DetectionResult>;

    /// Human-readable backend name (used in log output)
    fn name(&self) -> &str;
}

/// Returns the same boxes for every image.
#[derive(Debug, Clone)]
pub struct FixedDetector {
    boxes: Vec<BoundingBox>,
    confidence_threshold: f32,
}

impl FixedDetector {
    pub fn new(boxes: Vec<BoundingBox>) -> Self {
        Self {
            boxes,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }

    /// A detector that never finds anything
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn with_threshold(mut self, confidence_threshold: f32) -> Self {
        self.confidence_threshold = confidence_threshold;
        self
    }
}

impl PanelDetector for FixedDetector {
    fn detect(&self, _image: &RgbImage) -> Result<DetectionResult> {
        Ok(DetectionResult::from_vec(self.boxes.clone())
            .filter_by_confidence(self.confidence_threshold))
    }

    fn name(&self) -> &str {
        "Fixed Boxes"
    }
}
