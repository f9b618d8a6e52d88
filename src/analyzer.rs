//! Caller-facing entry point: load a photograph, run it through the
//! pipeline and measure foliage coverage.

use image::{ImageError, ImageReader, RgbImage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::config::AnalysisConfig;
use crate::coverage::{CoverageAnalyzer, CoverageResult};
use crate::detection::{FixedDetector, PanelDetector, RtenPanelDetector};
use crate::enhance::ImageEnhancer;
use crate::error::{PlantError, Result};
use crate::growth::compare_growth;
use crate::models::{GrowthComparison, ImageAnalysis};
use crate::pipeline::{Pipeline, PipelineData};
use crate::steps::{EnhanceStep, PanelCropStep};

/// Runs panel cropping, optional enhancement and coverage measurement.
///
/// Holds no per-image state, so one analyzer can serve any number of
/// images, including concurrently.
#[derive(Clone)]
pub struct PlantAnalyzer {
    pipeline: Pipeline,
    coverage: CoverageAnalyzer,
    config: AnalysisConfig,
}

impl PlantAnalyzer {
    /// Build an analyzer around an already constructed detector.
    ///
    /// Detections below `config.confidence_threshold` are dropped on top of
    /// whatever filtering the detector does itself. The IoU threshold only
    /// applies to detectors built by [`PlantAnalyzer::from_config`].
    pub fn new(detector: Arc<dyn PanelDetector>, config: AnalysisConfig) -> Result<Self> {
        config.validate()?;

        let mut pipeline = Pipeline::new();
        if config.crop {
            pipeline = pipeline.add_step(Arc::new(PanelCropStep::new(
                detector,
                config.confidence_threshold,
            )));
        }
        if let Some(enhancement) = config.enhancement {
            let enhancer = ImageEnhancer::new(enhancement)?;
            pipeline = pipeline.add_step(Arc::new(EnhanceStep { enhancer }));
        }
        if let Some(dir) = &config.debug_dir {
            pipeline = pipeline.with_debug(dir.clone())?;
        }

        Ok(Self {
            pipeline,
            coverage: CoverageAnalyzer::new(),
            config,
        })
    }

    /// Load the detector named by `config.model_path` and build an analyzer
    /// around it. With cropping disabled no model is needed and none is loaded.
    pub fn from_config(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        if !config.crop {
            return Self::new(Arc::new(FixedDetector::empty()), config);
        }
        let detector = RtenPanelDetector::load(
            &config.model_path,
            config.confidence_threshold,
            config.iou_threshold,
        )?;
        Self::new(Arc::new(detector), config)
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn analyze(&self, path: impl AsRef<Path>) -> Result<CoverageResult> {
        Ok(self.analyze_detailed(path)?.coverage)
    }

    pub fn analyze_detailed(&self, path: impl AsRef<Path>) -> Result<ImageAnalysis> {
        let path = path.as_ref();
        let image = load_image(path)?;
        self.run(image, file_label(path), path.to_path_buf())
    }

    /// Analyze an image that is already in memory. `label` names the debug
    /// artifacts and is reported as the analysis source.
    pub fn analyze_image(&self, label: &str, image: RgbImage) -> Result<ImageAnalysis> {
        self.run(image, label.to_string(), PathBuf::from(label))
    }

    /// Analyze both photographs independently and compare their coverage.
    pub fn compare_images(
        &self,
        before: impl AsRef<Path>,
        after: impl AsRef<Path>,
    ) -> Result<GrowthComparison> {
        let (before, after) = (before.as_ref(), after.as_ref());
        let (mut before_label, mut after_label) = (file_label(before), file_label(after));
        if before_label == after_label {
            before_label = format!("before_{before_label}");
            after_label = format!("after_{after_label}");
        }

        let (before_analysis, after_analysis) = rayon::join(
            || {
                load_image(before)
                    .and_then(|image| self.run(image, before_label, before.to_path_buf()))
            },
            || {
                load_image(after)
                    .and_then(|image| self.run(image, after_label, after.to_path_buf()))
            },
        );
        let (before_analysis, after_analysis) = (before_analysis?, after_analysis?);

        let growth = compare_growth(&before_analysis.coverage, &after_analysis.coverage);
        info!(
            "Growth: {:.2}% -> {:.2}% ({:+.2} points, {})",
            growth.before_percentage,
            growth.after_percentage,
            growth.absolute_growth,
            growth.relative_growth
        );

        Ok(GrowthComparison {
            before: before_analysis,
            after: after_analysis,
            growth,
        })
    }

    fn run(&self, image: RgbImage, label: String, source: PathBuf) -> Result<ImageAnalysis> {
        info!(
            "Analyzing {} ({}x{})",
            source.display(),
            image.width(),
            image.height()
        );
        let data = self.pipeline.run(PipelineData::from_image(image, label))?;
        let coverage = self.coverage.measure(&data.image);
        info!(
            "{}: {:.2}% foliage coverage",
            source.display(),
            coverage.percentage
        );

        Ok(ImageAnalysis {
            source,
            coverage,
            panels: data.panels,
        })
    }
}

/// Read and decode an image file, guessing the format from its contents.
pub fn load_image(path: &Path) -> Result<RgbImage> {
    let reader = ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| PlantError::decode(path, ImageError::IoError(e)))?;
    let image = reader.decode().map_err(|e| PlantError::decode(path, e))?;
    Ok(image.to_rgb8())
}

/// Decode an in-memory image buffer.
pub fn load_image_bytes(bytes: &[u8]) -> Result<RgbImage> {
    image::load_from_memory(bytes)
        .map(|image| image.to_rgb8())
        .map_err(|e| PlantError::decode("<memory>", e))
}

fn file_label(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string())
}
