//! Visual tracking: frames in, camera poses and a tracking state out.
//!
//! The SLAM engine itself sits behind [`VslamBackend`]; [`VslamAdapter`]
//! converts poses, derives the [`TrackingState`] from keyframe counts and
//! publishes the last drawn frame and keyframe for other threads.

pub mod adapter;
pub mod backend;
pub mod frame;
pub mod shared_state;
pub mod state;

pub use adapter::{VisualSlam, VslamAdapter};
pub use backend::{Keyframe, KeyframeId, Landmark, LandmarkId, VslamBackend};
pub use frame::Frame;
pub use shared_state::SharedState;
pub use state::{KeyframeCounter, TrackingState};
