//! Brightness, contrast and saturation adjustment ahead of measurement.

use image::RgbImage;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::color::HsvImage;
use crate::error::{PlantError, Result};

/// Enhancement factors. Fields left out of a config file take their
/// identity values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhancementConfig {
    /// Additive offset applied to every channel, -255..=255
    pub brightness: f32,
    /// Channel multiplier, 0..=10
    pub contrast: f32,
    /// Saturation multiplier in HSV space, 0..=10
    pub saturation: f32,
}

impl Default for EnhancementConfig {
    fn default() -> Self {
        Self {
            brightness: 0.0,
            contrast: 1.0,
            saturation: 1.0,
        }
    }
}

impl EnhancementConfig {
    pub fn validate(&self) -> Result<()> {
        check_range("brightness", self.brightness, -255.0, 255.0)?;
        check_range("contrast", self.contrast, 0.0, 10.0)?;
        check_range("saturation", self.saturation, 0.0, 10.0)?;
        Ok(())
    }

    pub fn is_identity(&self) -> bool {
        self.is_linear_identity() && self.saturation == 1.0
    }

    fn is_linear_identity(&self) -> bool {
        self.brightness == 0.0 && self.contrast == 1.0
    }
}

fn check_range(name: &str, value: f32, min: f32, max: f32) -> Result<()> {
    if !value.is_finite() || value < min || value > max {
        return Err(PlantError::InvalidConfig(format!(
            "{name} must be within [{min}, {max}], got {value}"
        )));
    }
    Ok(())
}

/// Applies an [`EnhancementConfig`] to working images.
#[derive(Debug, Clone, Copy)]
pub struct ImageEnhancer {
    config: EnhancementConfig,
}

impl ImageEnhancer {
    pub fn new(config: EnhancementConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EnhancementConfig {
        &self.config
    }

    /// Brightness/contrast first, then saturation on the adjusted pixels.
    /// Identity steps are skipped so an identity config returns an exact copy.
    pub fn apply(&self, image: &RgbImage) -> RgbImage {
        let mut out = image.clone();

        if !self.config.is_linear_identity() {
            let EnhancementConfig {
                brightness,
                contrast,
                ..
            } = self.config;
            let channels: &mut [u8] = &mut out;
            channels.par_iter_mut().for_each(|channel| {
                *channel = (contrast * *channel as f32 + brightness)
                    .round()
                    .clamp(0.0, 255.0) as u8;
            });
        }

        if self.config.saturation != 1.0 {
            out = HsvImage::from_rgb(&out)
                .scale_saturation(self.config.saturation)
                .to_rgb();
        }

        debug!(
            "Enhanced {}x{} image (brightness={}, contrast={}, saturation={})",
            out.width(),
            out.height(),
            self.config.brightness,
            self.config.contrast,
            self.config.saturation
        );
        out
    }
}
