use std::path::PathBuf;

/// Errors surfaced by the analysis library.
///
/// An empty detection is not an error: the compositor falls back to the
/// whole image and the caller sees [`crate::PanelSummary::WholeImage`].
#[derive(Debug, thiserror::Error)]
pub enum PlantError {
    /// Detector weights are missing or could not be parsed.
    #[error("failed to load detection model {path}: {reason}")]
    ModelLoad { path: PathBuf, reason: String },

    /// Input image could not be read or decoded.
    #[error("failed to decode image {path}: {source}")]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// A threshold, factor or config file is outside its documented range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The detection runtime failed while running the model.
    #[error("inference failed: {0}")]
    Inference(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PlantError {
    pub(crate) fn decode(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        Self::ImageDecode {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PlantError>;
