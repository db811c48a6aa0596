//! State shared between the tracking thread and readers on other threads.
//!
//! Each field has its own lock, held only for a swap or a copy and never
//! across a call into the tracking library.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use opencv::core::Mat;
use opencv::prelude::*;
use parking_lot::{Mutex, RwLock};

use crate::error::Result;
use crate::tracking::backend::Keyframe;
use crate::tracking::state::{KeyframeCounter, TrackingState};

pub struct SharedState {
    /// Annotated image from the most recent tracking call.
    /// Replaced wholesale by the tracker, deep-copied by readers.
    last_drawn_frame: Mutex<Mat>,

    /// Snapshot of the newest keyframe seen on a successful frame.
    last_keyframe: RwLock<Option<Arc<Keyframe>>>,

    keyframe_counter: Mutex<KeyframeCounter>,

    closed: AtomicBool,
}

impl SharedState {
    pub fn new() -> Self {
        Self {
            last_drawn_frame: Mutex::new(Mat::default()),
            last_keyframe: RwLock::new(None),
            keyframe_counter: Mutex::new(KeyframeCounter::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Swap in a new drawn frame. The previous one is released outside the lock.
    pub fn publish_drawn_frame(&self, frame: Mat) {
        let previous = std::mem::replace(&mut *self.last_drawn_frame.lock(), frame);
        drop(previous);
    }

    /// Independent copy of the last drawn frame (empty before the first frame).
    pub fn last_drawn_frame(&self) -> Result<Mat> {
        Ok(self.last_drawn_frame.lock().try_clone()?)
    }

    pub fn set_last_keyframe(&self, keyframe: Option<Arc<Keyframe>>) {
        *self.last_keyframe.write() = keyframe;
    }

    pub fn last_keyframe(&self) -> Option<Arc<Keyframe>> {
        self.last_keyframe.read().clone()
    }

    /// Feed the library's keyframe count (`None` on tracking failure)
    /// into the state machine.
    pub fn observe_keyframe_count(&self, count: Option<usize>) -> TrackingState {
        self.keyframe_counter.lock().observe(count)
    }

    pub fn keyframe_count(&self) -> usize {
        self.keyframe_counter.lock().count()
    }

    pub fn mark_closed(&self) -> bool {
        !self.closed.swap(true, Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}
