//! Feature-tracking settings and the parameter map handed to the tracking library.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use super::camera::CameraSettings;
use crate::error::{Error, Result};

fn default_resizing() -> f64 {
    1.0
}

/// Visual SLAM settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VslamSettings {
    /// Maximum number of keypoints extracted per frame.
    pub nrof_features: u32,
    /// Scale factor between ORB pyramid levels.
    pub scale_factor: f64,
    /// Initial FAST threshold.
    #[serde(rename = "ini_th_FAST")]
    pub ini_th_fast: u32,
    /// Fallback FAST threshold when too few corners are found.
    #[serde(rename = "min_th_FAST")]
    pub min_th_fast: u32,
    /// Path to the bag-of-words vocabulary file.
    pub path_vocabulary: PathBuf,
    /// Image resize factor applied before tracking, in (0, 1].
    #[serde(default = "default_resizing")]
    pub resizing: f64,
}

impl VslamSettings {
    pub fn validate(&self) -> Result<()> {
        if !self.resizing.is_finite() || self.resizing <= 0.0 || self.resizing > 1.0 {
            return Err(Error::InvalidConfiguration(format!(
                "resizing must lie in (0, 1], got {}",
                self.resizing
            )));
        }
        if !self.scale_factor.is_finite() || self.scale_factor <= 1.0 {
            return Err(Error::InvalidConfiguration(format!(
                "scale_factor must be greater than 1, got {}",
                self.scale_factor
            )));
        }
        if self.nrof_features == 0 {
            return Err(Error::InvalidConfiguration(
                "nrof_features must be positive".into(),
            ));
        }
        if self.min_th_fast > self.ini_th_fast {
            return Err(Error::InvalidConfiguration(format!(
                "min_th_FAST ({}) exceeds ini_th_FAST ({})",
                self.min_th_fast, self.ini_th_fast
            )));
        }
        if !self.path_vocabulary.is_file() {
            return Err(Error::InvalidConfiguration(format!(
                "vocabulary file not found: {}",
                self.path_vocabulary.display()
            )));
        }
        Ok(())
    }
}

/// Flat parameter map in the naming scheme the tracking library reads.
///
/// Only monocular perspective cameras are produced.
pub fn backend_parameters(camera: &CameraSettings, vslam: &VslamSettings) -> Mapping {
    let mut params = Mapping::new();
    let mut set = |key: &str, value: Value| {
        params.insert(Value::from(key), value);
    };

    set("Camera.name", Value::from("cam"));
    set("Camera.setup", Value::from("monocular"));
    set("Camera.model", Value::from("perspective"));
    set("Camera.fx", Value::from(camera.fx));
    set("Camera.fy", Value::from(camera.fy));
    set("Camera.cx", Value::from(camera.cx));
    set("Camera.cy", Value::from(camera.cy));
    set("Camera.k1", Value::from(camera.k1));
    set("Camera.k2", Value::from(camera.k2));
    set("Camera.p1", Value::from(camera.p1));
    set("Camera.p2", Value::from(camera.p2));
    set("Camera.k3", Value::from(camera.k3));
    set("Camera.fps", Value::from(camera.fps));
    set("Camera.cols", Value::from(camera.width));
    set("Camera.rows", Value::from(camera.height));
    set("Feature.max_num_keypoints", Value::from(vslam.nrof_features));
    set("Feature.scale_factor", Value::from(vslam.scale_factor));
    set("Feature.ini_fast_threshold", Value::from(vslam.ini_th_fast));
    set("Feature.min_fast_threshold", Value::from(vslam.min_th_fast));

    params
}
