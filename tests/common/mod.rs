mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from plant_growth for tests
pub use plant_growth::{
    AnalysisConfig, BoundingBox, EnhancementConfig, FixedDetector, PanelSummary, PlantAnalyzer,
    PlantError,
};
