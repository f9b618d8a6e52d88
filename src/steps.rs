use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use std::sync::Arc;
use tracing::debug;

use crate::compositor::compose;
use crate::detection::PanelDetector;
use crate::enhance::ImageEnhancer;
use crate::error::Result;
use crate::models::DetectionResult;
use crate::pipeline::{PipelineContext, PipelineData, PipelineStep};

const BOX_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Detect plant panels and replace the working image with the cropped (or
/// stitched) panel area.
pub struct PanelCropStep {
    pub detector: Arc<dyn PanelDetector>,
    /// Detections below this confidence are ignored
    pub confidence_threshold: f32,
}

impl PanelCropStep {
    pub fn new(detector: Arc<dyn PanelDetector>, confidence_threshold: f32) -> Self {
        Self {
            detector,
            confidence_threshold,
        }
    }
}

impl PipelineStep for PanelCropStep {
    fn process(&self, data: PipelineData, context: &PipelineContext) -> Result<PipelineData> {
        let detections = self
            .detector
            .detect(&data.image)?
            .filter_by_confidence(self.confidence_threshold);
        debug!(
            "{} found {} panel(s) in {}",
            self.detector.name(),
            detections.len(),
            data.label
        );

        if let Some(debug_config) = &context.debug {
            let overlay = draw_detections(&data.image, &detections);
            context.save_debug_image(
                &debug_config.output_dir,
                &format!("detections_{}.png", data.label),
                &overlay,
            );
        }

        let composite = compose(&data.image, &detections);
        Ok(PipelineData {
            panels: composite.summary(),
            image: composite.image,
            ..data
        })
    }

    fn name(&self) -> &str {
        "Panel Crop"
    }
}

/// Copy of `image` with every detection outlined.
fn draw_detections(image: &RgbImage, detections: &DetectionResult) -> RgbImage {
    let mut canvas = image.clone();
    for bbox in detections.iter() {
        if bbox.width == 0 || bbox.height == 0 {
            continue;
        }
        let rect = Rect::at(bbox.x, bbox.y).of_size(bbox.width, bbox.height);
        draw_hollow_rect_mut(&mut canvas, rect, BOX_COLOR);
    }
    canvas
}

/// Brightness/contrast/saturation adjustment
pub struct EnhanceStep {
    pub enhancer: ImageEnhancer,
}

impl PipelineStep for EnhanceStep {
    fn process(&self, mut data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        data.image = self.enhancer.apply(&data.image);
        Ok(data)
    }

    fn name(&self) -> &str {
        "Enhancement"
    }
}
