//! YOLO-style panel detector running on the `rten` inference engine.
//!
//! Expects a single-input model taking a `[1, 3, 640, 640]` RGB tensor in
//! 0..1 and producing `[1, 4 + classes, anchors]`, each anchor being
//! `cx, cy, w, h` followed by per-class scores.

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use rten::Model;
use rten_tensor::NdTensor;
use rten_tensor::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::PanelDetector;
use crate::config::validate_unit;
use crate::error::{PlantError, Result};
use crate::models::{BoundingBox, DetectionResult};

pub const INPUT_SIZE: u32 = 640;
const PAD_VALUE: u8 = 114;

/// Scale and padding that map source pixels onto the square model input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub scale: f32,
    /// Size of the resized source inside the padded square
    pub scaled_width: u32,
    pub scaled_height: u32,
    /// Offset of the resized source inside the square, in whole pixels
    pub pad_x: u32,
    pub pad_y: u32,
}

impl Letterbox {
    pub fn fit(width: u32, height: u32, target: u32) -> Self {
        let scale = (target as f32 / width as f32).min(target as f32 / height as f32);
        let scaled_w = ((width as f32 * scale) as u32).clamp(1, target);
        let scaled_h = ((height as f32 * scale) as u32).clamp(1, target);
        Self {
            scale,
            scaled_width: scaled_w,
            scaled_height: scaled_h,
            pad_x: (target - scaled_w) / 2,
            pad_y: (target - scaled_h) / 2,
        }
    }

    /// Map a model-space coordinate back to source pixels.
    pub fn unmap(&self, x: f32, y: f32) -> (f32, f32) {
        (
            (x - self.pad_x as f32) / self.scale,
            (y - self.pad_y as f32) / self.scale,
        )
    }
}

/// Panel detector backed by a YOLO model loaded once at construction.
pub struct RtenPanelDetector {
    model: Model,
    path: PathBuf,
    confidence_threshold: f32,
    iou_threshold: f32,
}

impl std::fmt::Debug for RtenPanelDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RtenPanelDetector")
            .field("path", &self.path)
            .field("confidence_threshold", &self.confidence_threshold)
            .field("iou_threshold", &self.iou_threshold)
            .finish()
    }
}

impl RtenPanelDetector {
    /// Load weights from `path`. Fails immediately if they are missing or
    /// unreadable rather than on first use.
    pub fn load(
        path: impl AsRef<Path>,
        confidence_threshold: f32,
        iou_threshold: f32,
    ) -> Result<Self> {
        validate_unit("confidence_threshold", confidence_threshold)?;
        validate_unit("iou_threshold", iou_threshold)?;

        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(PlantError::ModelLoad {
                path,
                reason: "weights file not found".to_string(),
            });
        }

        info!("Loading panel detection model from {}", path.display());
        let model = Model::load_file(&path).map_err(|e| PlantError::ModelLoad {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        info!("Panel detection model loaded");

        Ok(Self {
            model,
            path,
            confidence_threshold,
            iou_threshold,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn preprocess(&self, image: &RgbImage) -> (NdTensor<f32, 4>, Letterbox) {
        let (width, height) = image.dimensions();
        let letterbox = Letterbox::fit(width, height, INPUT_SIZE);
        let resized = imageops::resize(
            image,
            letterbox.scaled_width,
            letterbox.scaled_height,
            FilterType::Triangle,
        );
        let mut canvas = RgbImage::from_pixel(INPUT_SIZE, INPUT_SIZE, Rgb([PAD_VALUE; 3]));
        imageops::replace(
            &mut canvas,
            &resized,
            letterbox.pad_x as i64,
            letterbox.pad_y as i64,
        );

        // HWC u8 -> CHW f32 in 0..1
        let size = INPUT_SIZE as usize;
        let mut data = vec![0.0f32; 3 * size * size];
        for (x, y, pixel) in canvas.enumerate_pixels() {
            let offset = y as usize * size + x as usize;
            for c in 0..3 {
                data[c * size * size + offset] = pixel[c] as f32 / 255.0;
            }
        }

        (NdTensor::from_data([1, 3, size, size], data), letterbox)
    }

    fn infer(&self, input: NdTensor<f32, 4>) -> Result<NdTensor<f32, 3>> {
        let output = self
            .model
            .run_one(input.view().into(), None)
            .map_err(|e| PlantError::Inference(e.to_string()))?;
        let tensor: std::result::Result<NdTensor<f32, 3>, _> = output.try_into();
        tensor.map_err(|e| PlantError::Inference(e.to_string()))
    }

    fn postprocess(&self, output: &NdTensor<f32, 3>, letterbox: &Letterbox) -> DetectionResult {
        // Some exports put anchors first: [1, anchors, 4 + classes]
        let anchors_first = output.size(1) > output.size(2);
        let (rows, anchors) = if anchors_first {
            (output.size(2), output.size(1))
        } else {
            (output.size(1), output.size(2))
        };
        let value = |row: usize, anchor: usize| {
            if anchors_first {
                output[[0, anchor, row]]
            } else {
                output[[0, row, anchor]]
            }
        };

        if rows <= 4 {
            return DetectionResult::empty();
        }

        let mut boxes = Vec::new();
        for i in 0..anchors {
            let confidence = (4..rows).map(|row| value(row, i)).fold(0.0f32, f32::max);
            if confidence < self.confidence_threshold {
                continue;
            }

            let (cx, cy, w, h) = (value(0, i), value(1, i), value(2, i), value(3, i));
            let (x1, y1) = letterbox.unmap(cx - w / 2.0, cy - h / 2.0);
            let (x2, y2) = letterbox.unmap(cx + w / 2.0, cy + h / 2.0);

            // clamping to the image is left to the compositor
            if let Some(bbox) = BoundingBox::from_corners(x1, y1, x2, y2, confidence) {
                boxes.push(bbox);
            }
        }

        let candidates = boxes.len();
        let result = DetectionResult::from_vec(boxes).apply_nms(self.iou_threshold);
        debug!(
            "{} candidate boxes above {:.2}, {} after NMS",
            candidates,
            self.confidence_threshold,
            result.len()
        );
        result
    }
}

impl PanelDetector for RtenPanelDetector {
    fn detect(&self, image: &RgbImage) -> Result<DetectionResult> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Ok(DetectionResult::empty());
        }

        let (input, letterbox) = self.preprocess(image);
        let output = self.infer(input)?;
        let result = self.postprocess(&output, &letterbox);

        for bbox in result.iter() {
            debug!(
                "Panel at ({}, {}) {}x{} confidence {:.2}",
                bbox.x, bbox.y, bbox.width, bbox.height, bbox.confidence
            );
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        "YOLO Panel Detector"
    }
}
