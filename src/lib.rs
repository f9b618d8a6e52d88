pub mod analyzer;
pub mod color;
pub mod compositor;
pub mod config;
pub mod coverage;
pub mod detection;
pub mod enhance;
pub mod error;
pub mod growth;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod steps;

pub use analyzer::{PlantAnalyzer, load_image, load_image_bytes};
pub use compositor::{Composite, PanelSelection, compose};
pub use config::AnalysisConfig;
pub use coverage::{CoverageAnalyzer, CoverageResult, HueRange};
pub use detection::{FixedDetector, PanelDetector, RtenPanelDetector};
pub use enhance::{EnhancementConfig, ImageEnhancer};
pub use error::{PlantError, Result};
pub use growth::{GrowthAssessment, GrowthReport, GrowthStatus, RelativeGrowth, compare_growth};
pub use models::{BoundingBox, CropRect, DetectionResult, GrowthComparison, ImageAnalysis, PanelSummary};
pub use pipeline::{DebugConfig, Pipeline, PipelineContext, PipelineData, PipelineStep};
pub use report::render_text;
