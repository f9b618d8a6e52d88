use image::RgbImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{PlantError, Result};
use crate::models::PanelSummary;

/// Data that flows through the pipeline: the current working image plus
/// enough context to name debug output and report how it was derived.
#[derive(Clone, Debug)]
pub struct PipelineData {
    /// Current working image
    pub image: RgbImage,

    /// Untouched source photograph (shared via Arc)
    pub original: Arc<RgbImage>,

    /// Name used for debug artifacts, e.g. the file stem
    pub label: String,

    /// How `image` relates to `original`
    pub panels: PanelSummary,
}

impl PipelineData {
    pub fn from_image(image: RgbImage, label: impl Into<String>) -> Self {
        let original = Arc::new(image.clone());
        Self {
            image,
            original,
            label: label.into(),
            panels: PanelSummary::WholeImage,
        }
    }
}

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: PathBuf,
}

impl DebugConfig {
    /// Directory for one step's artifacts, e.g. `02_enhancement`
    pub fn step_dir(&self, index: usize, step_name: &str) -> PathBuf {
        self.output_dir.join(format!(
            "{:02}_{}",
            index,
            step_name.to_lowercase().replace(' ', "_")
        ))
    }
}

/// Context available to all pipeline steps
#[derive(Clone, Debug, Default)]
pub struct PipelineContext {
    pub debug: Option<DebugConfig>,
}

impl PipelineContext {
    /// Write a debug image if debug mode is on. Failures are logged and
    /// otherwise ignored; debug output never changes a result.
    pub fn save_debug_image(&self, dir: &Path, file_name: &str, image: &RgbImage) {
        if self.debug.is_none() {
            return;
        }
        let output_path = dir.join(file_name);
        let saved = std::fs::create_dir_all(dir)
            .map_err(|e| e.to_string())
            .and_then(|_| image.save(&output_path).map_err(|e| e.to_string()));
        match saved {
            Ok(()) => debug!("Debug: saved {}", output_path.display()),
            Err(e) => warn!("Failed to save debug image {}: {}", output_path.display(), e),
        }
    }
}

/// One stage of the analysis. Each step consumes the working image and
/// produces a new one.
pub trait PipelineStep: Send + Sync {
    fn process(&self, data: PipelineData, context: &PipelineContext) -> Result<PipelineData>;

    /// Human-readable name for this step (used in logs and debug directory names)
    fn name(&self) -> &str;
}

/// Ordered list of steps run to completion one after another.
#[derive(Clone, Default)]
pub struct Pipeline {
    steps: Vec<Arc<dyn PipelineStep>>,
    context: PipelineContext,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable debug mode with output directory.
    /// The directory must be empty or non-existent
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            if std::fs::read_dir(&output_dir)?.next().is_some() {
                return Err(PlantError::InvalidConfig(format!(
                    "debug directory is not empty: {}",
                    output_dir.display()
                )));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        self.context.debug = Some(DebugConfig { output_dir });
        Ok(self)
    }

    pub fn add_step(mut self, step: Arc<dyn PipelineStep>) -> Self {
        self.steps.push(step);
        self
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|step| step.name()).collect()
    }

    pub fn context(&self) -> &PipelineContext {
        &self.context
    }

    /// Run every step in order on `data`
    pub fn run(&self, mut data: PipelineData) -> Result<PipelineData> {
        if let Some(debug_config) = &self.context.debug {
            let input_dir = debug_config.output_dir.join("00_input");
            self.context
                .save_debug_image(&input_dir, &format!("{}.png", data.label), &data.image);
        }

        for (step_idx, step) in self.steps.iter().enumerate() {
            debug!(
                "Running step: {} on {} ({}x{})",
                step.name(),
                data.label,
                data.image.width(),
                data.image.height()
            );

            data = step.process(data, &self.context)?;

            if let Some(debug_config) = &self.context.debug {
                let step_dir = debug_config.step_dir(step_idx + 1, step.name());
                self.context
                    .save_debug_image(&step_dir, &format!("{}.png", data.label), &data.image);
            }
        }

        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    struct InvertStep;

    impl PipelineStep for InvertStep {
        fn process(&self, mut data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
            image::imageops::invert(&mut data.image);
            Ok(data)
        }

        fn name(&self) -> &str {
            "Invert Colors"
        }
    }

    #[test]
    fn test_steps_run_in_order() -> anyhow::Result<()> {
        let pipeline = Pipeline::new()
            .add_step(Arc::new(InvertStep))
            .add_step(Arc::new(InvertStep));
        let data = PipelineData::from_image(RgbImage::from_pixel(2, 2, Rgb([10, 20, 30])), "img");
        let out = pipeline.run(data)?;
        assert_eq!(out.image.get_pixel(0, 0), &Rgb([10, 20, 30]));
        assert_eq!(pipeline.step_names(), vec!["Invert Colors", "Invert Colors"]);
        Ok(())
    }

    #[test]
    fn test_debug_dir_layout() -> anyhow::Result<()> {
        let dir = tempfile::TempDir::new()?;
        let pipeline = Pipeline::new()
            .add_step(Arc::new(InvertStep))
            .with_debug(dir.path().to_path_buf())?;
        pipeline.run(PipelineData::from_image(RgbImage::new(3, 3), "leaf"))?;

        assert!(dir.path().join("00_input/leaf.png").is_file());
        assert!(dir.path().join("01_invert_colors/leaf.png").is_file());
        Ok(())
    }

    #[test]
    fn test_debug_dir_must_be_empty() -> anyhow::Result<()> {
        let dir = tempfile::TempDir::new()?;
        std::fs::write(dir.path().join("stale.txt"), "x")?;
        let result = Pipeline::new().with_debug(dir.path().to_path_buf());
        assert!(matches!(result, Err(PlantError::InvalidConfig(_))));
        Ok(())
    }
}
