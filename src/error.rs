//! Error types for tracking and map warping.
//!
//! Tracking loss is not an error: it is reported as
//! [`TrackingState::Lost`](crate::tracking::TrackingState::Lost).

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Settings or engine configuration cannot be used (unset EPSG, bad
    /// camera intrinsics, missing vocabulary, projection-less dataset).
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Input has a shape the engine does not handle (e.g. multi-layer maps).
    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),

    /// EPSG code with no known projection definition.
    #[error("Unsupported coordinate reference system EPSG:{0}")]
    UnsupportedCrs(u32),

    /// Building or running a coordinate transformation failed.
    #[error("Projection error: {0}")]
    Projection(String),

    /// Output grid could not be derived from the source raster.
    #[error("Warp output estimation failed: {0}")]
    WarpEstimationFailed(String),

    /// Resampling the destination raster failed.
    #[error("Warp failed: {0}")]
    WarpFailed(String),

    /// The tracking library reported a failure.
    #[error("Tracking backend error: {0}")]
    Backend(String),

    #[error("OpenCV error: {0}")]
    OpenCv(#[from] opencv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
