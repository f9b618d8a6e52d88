//! Analysis configuration.
//!
//! Every field has a documented default, so a JSON config file only needs
//! the values it changes:
//!
//! ```json
//! { "model_path": "Model/panels.rten", "enhancement": { "saturation": 1.2 } }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::coverage::{FOLIAGE_HUE_RANGES, HueRange};
use crate::enhance::EnhancementConfig;
use crate::error::{PlantError, Result};

pub const DEFAULT_MODEL_PATH: &str = "Model/weights.rten";
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.25;
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.45;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Panel detector weights
    pub model_path: PathBuf,
    /// Detections below this confidence are discarded, 0..=1
    pub confidence_threshold: f32,
    /// Overlap above which the weaker of two detections is suppressed, 0..=1
    pub iou_threshold: f32,
    /// Crop to detected panels; when false the whole photograph is measured
    pub crop: bool,
    pub enhancement: Option<EnhancementConfig>,
    /// Directory for intermediate images; must be empty or absent
    pub debug_dir: Option<PathBuf>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            crop: true,
            enhancement: None,
            debug_dir: None,
        }
    }
}

impl AnalysisConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            PlantError::InvalidConfig(format!("cannot read {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&contents).map_err(|e| {
            PlantError::InvalidConfig(format!("cannot parse {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validate_unit("confidence_threshold", self.confidence_threshold)?;
        validate_unit("iou_threshold", self.iou_threshold)?;
        if let Some(enhancement) = &self.enhancement {
            enhancement.validate()?;
        }
        Ok(())
    }

    /// Foliage hue bands. Fixed at compile time; reported here so results can
    /// state which thresholds produced them.
    pub fn hue_ranges(&self) -> [HueRange; 2] {
        FOLIAGE_HUE_RANGES
    }
}

pub(crate) fn validate_unit(name: &str, value: f32) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(PlantError::InvalidConfig(format!(
            "{name} must be within [0, 1], got {value}"
        )));
    }
    Ok(())
}
