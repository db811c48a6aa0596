//! Geometry utilities: tagged rigid poses and matrix conversions.

pub mod convert;
pub mod pose;

pub use convert::{mat_to_matrix4, matrix4_to_mat};
pub use pose::{
    CameraToWorld, CameraToWorldPose, Convention, Pose, WorldToCamera, WorldToCameraPose,
    invert_pose,
};
