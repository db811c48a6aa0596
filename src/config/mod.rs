//! Settings for the tracking adapter and the map warper.
//!
//! All settings live in a single YAML document:
//!
//! ```yaml
//! camera:
//!   fx: 1200.0
//!   fy: 1200.0
//!   cx: 640.0
//!   cy: 360.0
//!   fps: 10.0
//!   width: 1280
//!   height: 720
//! vslam:
//!   nrof_features: 2000
//!   scale_factor: 1.2
//!   ini_th_FAST: 20
//!   min_th_FAST: 7
//!   path_vocabulary: data/orb_vocab.fbow
//!   resizing: 0.5
//! warper:
//!   target_epsg: 32632
//! ```

pub mod camera;
pub mod vslam;
pub mod warper;

use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};

pub use camera::CameraSettings;
pub use vslam::{VslamSettings, backend_parameters};
pub use warper::WarperSettings;

/// Complete settings document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub camera: CameraSettings,
    pub vslam: VslamSettings,
    #[serde(default)]
    pub warper: WarperSettings,
}

impl Settings {
    /// Load settings from a YAML file.
    ///
    /// Only the document structure is checked here; call
    /// [`CameraSettings::validate`] and [`VslamSettings::validate`] before use.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            Error::InvalidConfiguration(format!("cannot open {}: {}", path.display(), e))
        })?;
        let settings: Settings = serde_yaml::from_reader(file)?;
        info!("Loaded settings from {}", path.display());
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::ortho::ReadbackDepth;
    use crate::raster::ResamplingMethod;

    const DOCUMENT: &str = r#"
camera:
  fx: 1200.0
  fy: 1210.0
  cx: 640.0
  cy: 360.0
  k1: -0.12
  fps: 10.0
  width: 1280
  height: 720
vslam:
  nrof_features: 2000
  scale_factor: 1.2
  ini_th_FAST: 20
  min_th_FAST: 7
  path_vocabulary: data/orb_vocab.fbow
warper:
  target_epsg: 32632
  readback: byte
  resampling: bilinear
"#;

    #[test]
    fn test_load_settings() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DOCUMENT.as_bytes()).unwrap();

        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.camera.fy, 1210.0);
        assert_eq!(settings.camera.k2, 0.0);
        assert_eq!(settings.vslam.ini_th_fast, 20);
        assert_eq!(settings.vslam.resizing, 1.0);
        assert_eq!(settings.warper.target_epsg, 32632);
        assert_eq!(settings.warper.readback, ReadbackDepth::Byte);
        assert_eq!(settings.warper.resampling, ResamplingMethod::Bilinear);
        assert!(settings.warper.multithreaded);
        assert_eq!(settings.warper.memory_limit_mb, 64);
    }

    #[test]
    fn test_missing_warper_section_defaults_to_unset_epsg() {
        let document = DOCUMENT.split("warper:").next().unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(document.as_bytes()).unwrap();

        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.warper.target_epsg, 0);
        assert_eq!(settings.warper.readback, ReadbackDepth::MatchSource);
    }

    #[test]
    fn test_missing_file() {
        let err = Settings::load("/nonexistent/settings.yaml").unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(_)));
    }

    #[test]
    fn test_malformed_document() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"camera: [1, 2").unwrap();
        assert!(matches!(
            Settings::load(file.path()),
            Err(Error::Yaml(_))
        ));
    }
}
