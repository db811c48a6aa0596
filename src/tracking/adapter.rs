//! Adapter turning camera frames into poses, landmarks and a tracking state.

use nalgebra::MatrixXx3;
use opencv::core::Mat;
use opencv::prelude::*;
use tracing::{debug, info, warn};

use crate::config::{CameraSettings, VslamSettings, backend_parameters};
use crate::error::{Error, Result};
use crate::geometry::CameraToWorldPose;
use crate::tracking::backend::VslamBackend;
use crate::tracking::frame::Frame;
use crate::tracking::shared_state::SharedState;
use crate::tracking::state::TrackingState;

const RIGIDITY_TOLERANCE: f64 = 1e-6;

/// Visual SLAM as seen by the mapping pipeline.
pub trait VisualSlam: Send + Sync {
    /// Track a frame. On success the frame receives its camera-to-world pose
    /// and the current surface points; on [`TrackingState::Lost`] it is left
    /// untouched apart from its resize factor.
    ///
    /// `prior` is a camera-to-world pose guess forwarded to the engine.
    fn track(&self, frame: &mut Frame, prior: Option<&CameraToWorldPose>) -> Result<TrackingState>;

    /// Shut the engine down. Idempotent.
    fn close(&self);

    /// Request a map reset inside the engine.
    fn reset(&self);

    /// Last annotated frame, `None` while nothing has been drawn.
    fn draw_tracked_image(&self) -> Result<Option<Mat>>;

    /// Independent copy of the last annotated frame (possibly empty).
    fn last_drawn_frame(&self) -> Result<Mat>;

    /// Landmark positions of the last keyframe, one row per landmark.
    fn tracked_map_points(&self) -> MatrixXx3<f64>;
}

/// [`VisualSlam`] on top of a [`VslamBackend`].
pub struct VslamAdapter<B: VslamBackend> {
    backend: B,
    resizing: f64,
    shared: SharedState,
}

impl<B: VslamBackend> VslamAdapter<B> {
    /// Validate the settings and start the engine.
    pub fn new(backend: B, camera: &CameraSettings, settings: &VslamSettings) -> Result<Self> {
        camera.validate()?;
        settings.validate()?;
        print_settings_to_log(camera, settings);

        backend.startup()?;
        info!(
            "Visual SLAM started (vocabulary {}, resizing {})",
            settings.path_vocabulary.display(),
            settings.resizing
        );

        Ok(Self {
            backend,
            resizing: settings.resizing,
            shared: SharedState::new(),
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn shared_state(&self) -> &SharedState {
        &self.shared
    }
}

impl<B: VslamBackend> VisualSlam for VslamAdapter<B> {
    fn track(
        &self,
        frame: &mut Frame,
        prior: Option<&CameraToWorldPose>,
    ) -> Result<TrackingState> {
        if self.shared.is_closed() {
            return Err(Error::Backend("tracking engine was closed".into()));
        }

        frame.set_image_resize_factor(self.resizing)?;
        let image = frame.resized_image()?;

        // The engine works in world-to-camera poses.
        let prior_w2c = prior.map(CameraToWorldPose::invert);
        let pose_w2c = self.backend.feed_monocular_frame(
            &image,
            frame.timestamp_s(),
            prior_w2c.as_ref(),
        )?;

        match self.backend.draw_frame() {
            Ok(drawn) => self.shared.publish_drawn_frame(drawn),
            Err(e) => warn!("Frame {}: could not draw tracked image: {}", frame.frame_id(), e),
        }

        let Some(pose_w2c) = pose_w2c else {
            let state = self.shared.observe_keyframe_count(None);
            warn!("Frame {} ({}): tracking lost", frame.frame_id(), frame.camera_id());
            return Ok(state);
        };
        if !pose_w2c.is_rigid(RIGIDITY_TOLERANCE) {
            warn!("Frame {}: engine returned a non-rigid pose", frame.frame_id());
        }

        let pose_c2w = pose_w2c.invert();
        frame.set_visual_pose(&pose_c2w);

        let keyframes = self.backend.keyframes();
        let current_nrof_keyframes = keyframes.len();
        self.shared.set_last_keyframe(keyframes.last().cloned());
        frame.set_surface_points(self.tracked_map_points());

        let state = self
            .shared
            .observe_keyframe_count(Some(current_nrof_keyframes));
        debug!(
            "Frame {}: {} ({} keyframes, {} surface points)",
            frame.frame_id(),
            state,
            current_nrof_keyframes,
            frame.surface_points().nrows()
        );
        Ok(state)
    }

    fn close(&self) {
        if self.shared.mark_closed() {
            self.backend.shutdown();
            info!("Visual SLAM shut down");
        }
    }

    fn reset(&self) {
        info!("Requesting visual SLAM map reset");
        self.backend.request_reset();
    }

    fn draw_tracked_image(&self) -> Result<Option<Mat>> {
        let image = self.shared.last_drawn_frame()?;
        Ok(if image.empty() { None } else { Some(image) })
    }

    fn last_drawn_frame(&self) -> Result<Mat> {
        self.shared.last_drawn_frame()
    }

    fn tracked_map_points(&self) -> MatrixXx3<f64> {
        let Some(keyframe) = self.shared.last_keyframe() else {
            return MatrixXx3::zeros(0);
        };
        let landmarks = &keyframe.landmarks;
        MatrixXx3::from_fn(landmarks.len(), |r, c| landmarks[r].position[c])
    }
}

impl<B: VslamBackend> Drop for VslamAdapter<B> {
    fn drop(&mut self) {
        self.close();
    }
}

fn print_settings_to_log(camera: &CameraSettings, settings: &VslamSettings) {
    let params = backend_parameters(camera, settings);
    info!("Visual SLAM settings ({} entries):", params.len());
    for (key, value) in &params {
        let key = key.as_str().unwrap_or_default();
        match serde_yaml::to_string(value) {
            Ok(v) => info!("  {}: {}", key, v.trim_end()),
            Err(_) => info!("  {}: {:?}", key, value),
        }
    }
}
