//! Tracking state machine derived from keyframe-count changes.

use std::fmt;

/// Public state reported after each tracked frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingState {
    /// No pose for this frame; the frame was left untouched.
    Lost,
    /// First keyframes appeared in the map.
    Initialized,
    /// Pose found and the keyframe count changed.
    KeyframeInsert,
    /// Pose found, keyframe count unchanged.
    FrameInsert,
}

impl fmt::Display for TrackingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Lost => "LOST",
            Self::Initialized => "INITIALIZED",
            Self::KeyframeInsert => "KEYFRAME_INSERT",
            Self::FrameInsert => "FRAME_INSERT",
        };
        f.write_str(name)
    }
}

/// Keyframe counter driving [`TrackingState`].
///
/// The counter starts at zero and compares against the library's live
/// keyframe count, so a map reset inside the library resynchronizes it on
/// the next successful frame.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct KeyframeCounter {
    count: usize,
}

impl KeyframeCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Advance with the library's keyframe count, `None` if tracking failed.
    pub fn observe(&mut self, current: Option<usize>) -> TrackingState {
        let Some(current) = current else {
            return TrackingState::Lost;
        };

        if self.count == 0 && current > 0 {
            self.count = current;
            TrackingState::Initialized
        } else if current != self.count {
            self.count = current;
            TrackingState::KeyframeInsert
        } else {
            TrackingState::FrameInsert
        }
    }
}
