//! Pinhole camera intrinsics consumed by the tracking library.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Camera intrinsics with radial-tangential distortion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraSettings {
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
    #[serde(default)]
    pub k1: f64,
    #[serde(default)]
    pub k2: f64,
    #[serde(default)]
    pub p1: f64,
    #[serde(default)]
    pub p2: f64,
    #[serde(default)]
    pub k3: f64,
    pub fps: f64,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
}

impl CameraSettings {
    /// Check that the intrinsics describe a usable camera.
    pub fn validate(&self) -> Result<()> {
        let values = [
            self.fx, self.fy, self.cx, self.cy, self.k1, self.k2, self.p1, self.p2, self.k3,
            self.fps,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidConfiguration(
                "camera settings contain non-finite values".into(),
            ));
        }
        if self.fx <= 0.0 || self.fy <= 0.0 {
            return Err(Error::InvalidConfiguration(format!(
                "focal lengths must be positive (fx={}, fy={})",
                self.fx, self.fy
            )));
        }
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidConfiguration(format!(
                "image size must be positive ({}x{})",
                self.width, self.height
            )));
        }
        if self.fps <= 0.0 {
            return Err(Error::InvalidConfiguration(format!(
                "frame rate must be positive (fps={})",
                self.fps
            )));
        }
        Ok(())
    }
}
