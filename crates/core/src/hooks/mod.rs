//! Per-entity behaviour invoked by the time-stepping state machine.
//!
//! A leaf tween implements the value hooks and keeps the composite defaults; a
//! nested timeline overrides the child-related methods as well.

use std::any::Any;

/// An iteration index together with its playback direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IterationInfo {
    pub index: i32,
    /// True when yoyo repetition plays this iteration backwards.
    pub reversed: bool,
}

/// Everything a hook needs to produce interpolated values for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComputeFrame {
    pub iteration: IterationInfo,
    /// Iteration index at the start of the `update` call that produced this frame.
    pub last_iteration: i32,
    pub delta_millis: i32,
    /// Local time inside the iteration window, always within `[0, duration_millis]`.
    pub local_millis: i32,
    pub duration_millis: i32,
}

impl ComputeFrame {
    /// Normalised position inside the window, already mirrored for reversed
    /// iterations. A zero-length window reports `1.0`.
    pub fn progress(&self) -> f32 {
        let raw = if self.duration_millis <= 0 {
            1.0
        } else {
            self.local_millis as f32 / self.duration_millis as f32
        };
        if self.iteration.reversed {
            1.0 - raw
        } else {
            raw
        }
    }
}

pub trait TimedHooks {
    /// Called once, when the initial delay has fully elapsed.
    fn initialize(&mut self) {}

    /// Produces output values. This is the only place interpolation happens.
    fn compute_values(&mut self, frame: &ComputeFrame);

    /// Snaps output to the start state of `iteration`.
    fn force_start_values(&mut self, iteration: IterationInfo);

    /// Snaps output to the end state of `iteration`.
    fn force_end_values(&mut self, iteration: IterationInfo);

    fn children_count(&self) -> usize {
        0
    }

    fn kill_target(&mut self, _target: &dyn Any, _tween_type: Option<i32>) {}

    fn contains_target(&self, _target: &dyn Any, _tween_type: Option<i32>) -> bool {
        false
    }
}
