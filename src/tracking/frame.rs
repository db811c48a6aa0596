//! Camera frame handed to the tracker.
//!
//! The caller owns the frame; a successful tracking call attaches the
//! camera-to-world pose and the surface points of the most recent keyframe.

use nalgebra::{Matrix3x4, MatrixXx3};
use opencv::core::{Mat, Size};
use opencv::imgproc;
use opencv::prelude::*;

use crate::error::{Error, Result};
use crate::geometry::CameraToWorldPose;

/// A single camera image with its tracking results.
pub struct Frame {
    camera_id: String,
    frame_id: u32,
    /// Acquisition time in nanoseconds.
    timestamp_ns: u64,
    image: Mat,
    resize_factor: f64,
    /// Camera-to-world pose without the homogeneous row.
    visual_pose: Option<Matrix3x4<f64>>,
    /// Landmark positions in world coordinates, one per row.
    surface_points: MatrixXx3<f64>,
}

impl Frame {
    pub fn new(camera_id: impl Into<String>, frame_id: u32, timestamp_ns: u64, image: Mat) -> Self {
        Self {
            camera_id: camera_id.into(),
            frame_id,
            timestamp_ns,
            image,
            resize_factor: 1.0,
            visual_pose: None,
            surface_points: MatrixXx3::zeros(0),
        }
    }

    pub fn camera_id(&self) -> &str {
        &self.camera_id
    }

    pub fn frame_id(&self) -> u32 {
        self.frame_id
    }

    pub fn timestamp_ns(&self) -> u64 {
        self.timestamp_ns
    }

    /// Timestamp in seconds, the unit of the tracking library.
    pub fn timestamp_s(&self) -> f64 {
        self.timestamp_ns as f64 * 1e-9
    }

    pub fn image(&self) -> &Mat {
        &self.image
    }

    pub fn resize_factor(&self) -> f64 {
        self.resize_factor
    }

    pub fn set_image_resize_factor(&mut self, factor: f64) -> Result<()> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(Error::InvalidConfiguration(format!(
                "image resize factor must be positive, got {factor}"
            )));
        }
        self.resize_factor = factor;
        Ok(())
    }

    /// Image scaled by the resize factor (area interpolation when shrinking).
    pub fn resized_image(&self) -> Result<Mat> {
        if (self.resize_factor - 1.0).abs() < f64::EPSILON || self.image.empty() {
            return Ok(self.image.try_clone()?);
        }
        let mut resized = Mat::default();
        imgproc::resize(
            &self.image,
            &mut resized,
            Size::new(0, 0),
            self.resize_factor,
            self.resize_factor,
            imgproc::INTER_AREA,
        )?;
        Ok(resized)
    }

    pub fn visual_pose(&self) -> Option<&Matrix3x4<f64>> {
        self.visual_pose.as_ref()
    }

    pub fn has_visual_pose(&self) -> bool {
        self.visual_pose.is_some()
    }

    pub fn set_visual_pose(&mut self, pose: &CameraToWorldPose) {
        self.visual_pose = Some(pose.to_3x4());
    }

    pub fn surface_points(&self) -> &MatrixXx3<f64> {
        &self.surface_points
    }

    pub fn set_surface_points(&mut self, points: MatrixXx3<f64>) {
        self.surface_points = points;
    }
}
