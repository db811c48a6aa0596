//! Interface to the underlying visual SLAM library.
//!
//! The library owns the map, its keyframes and landmarks; the adapter only
//! holds shared snapshots handed out through [`VslamBackend::keyframes`].
//! Implementations synchronize internally, so every method takes `&self`.

use std::fmt;
use std::sync::Arc;

use nalgebra::Vector3;
use opencv::core::Mat;

use crate::error::Result;
use crate::geometry::WorldToCameraPose;

/// Identifier of a keyframe inside the tracking library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyframeId(pub u64);

impl fmt::Display for KeyframeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KF{}", self.0)
    }
}

/// Identifier of a landmark inside the tracking library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LandmarkId(pub u64);

impl fmt::Display for LandmarkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LM{}", self.0)
    }
}

/// Triangulated 3D point.
#[derive(Debug, Clone, PartialEq)]
pub struct Landmark {
    pub id: LandmarkId,
    /// Position in world coordinates.
    pub position: Vector3<f64>,
}

/// Immutable snapshot of a keyframe and the landmarks it observes.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyframe {
    pub id: KeyframeId,
    /// Acquisition time in seconds.
    pub timestamp_s: f64,
    pub landmarks: Vec<Landmark>,
}

/// Monocular visual SLAM engine.
pub trait VslamBackend: Send + Sync {
    /// Start the engine's worker threads.
    fn startup(&self) -> Result<()>;

    /// Stop the engine; further frames are not processed.
    fn shutdown(&self);

    /// Ask the engine to clear its map. Takes effect asynchronously.
    fn request_reset(&self);

    /// Track one image.
    ///
    /// Returns the world-to-camera pose, or `None` when tracking failed.
    /// `prior` is an optional pose guess the engine may use as a seed.
    fn feed_monocular_frame(
        &self,
        image: &Mat,
        timestamp_s: f64,
        prior: Option<&WorldToCameraPose>,
    ) -> Result<Option<WorldToCameraPose>>;

    /// All keyframes currently in the map, oldest first.
    fn keyframes(&self) -> Vec<Arc<Keyframe>>;

    /// Last processed image annotated with the tracked features.
    /// May be empty before the first frame.
    fn draw_frame(&self) -> Result<Mat>;
}
