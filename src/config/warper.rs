//! Map warping settings.

use serde::{Deserialize, Serialize};

use crate::ortho::ReadbackDepth;
use crate::raster::ResamplingMethod;

fn default_multithreaded() -> bool {
    true
}

fn default_memory_limit_mb() -> usize {
    64
}

/// Settings for [`MapWarper`](crate::ortho::MapWarper).
///
/// `target_epsg` of 0 means "not configured"; warping then fails with
/// [`Error::InvalidConfiguration`](crate::Error::InvalidConfiguration).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarperSettings {
    #[serde(default)]
    pub target_epsg: u32,
    #[serde(default)]
    pub readback: ReadbackDepth,
    #[serde(default)]
    pub resampling: ResamplingMethod,
    #[serde(default = "default_multithreaded")]
    pub multithreaded: bool,
    /// Working memory per warp chunk, in megabytes.
    #[serde(default = "default_memory_limit_mb")]
    pub memory_limit_mb: usize,
}

impl WarperSettings {
    pub fn new(target_epsg: u32) -> Self {
        Self {
            target_epsg,
            ..Self::default()
        }
    }
}

impl Default for WarperSettings {
    fn default() -> Self {
        Self {
            target_epsg: 0,
            readback: ReadbackDepth::default(),
            resampling: ResamplingMethod::default(),
            multithreaded: default_multithreaded(),
            memory_limit_mb: default_memory_limit_mb(),
        }
    }
}
