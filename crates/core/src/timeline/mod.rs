//! The time-stepping state machine shared by tweens and timelines.
//!
//! An entity alternates between *compute windows* (even iteration indices,
//! local time in `[0, duration]`) and *gaps* (odd indices, local time in
//! `[0, repeat_delay]`). With a finite repeat count the valid indices are
//! `0..=repeat_count * 2`; `-1` means "before the first window" and
//! `repeat_count * 2 + 1` means "past the last one".

use std::{any::Any, fmt};

use serde::{Deserialize, Serialize};

use crate::{
    CallbackHandle, CallbackKind, CallbackRegistry, ComputeFrame, EngineConfig, IterationInfo,
    Result, TimedHooks, TimingConfig,
};

/// Read-only view of the progress state, mostly useful for inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub iteration: i32,
    pub elapsed_millis: i32,
    pub in_compute_window: bool,
    pub initialized: bool,
    pub finished: bool,
}

/// A tween or timeline, as far as timing is concerned.
///
/// `H` supplies the value computations; the entity decides when they run.
pub struct TimedEntity<H> {
    hooks: H,
    pooled: bool,

    yoyo: bool,
    in_compute_window: bool,
    iteration: i32,
    repeat_count: i32,

    delay_millis: i32,
    duration_millis: i32,
    repeat_delay_millis: i32,
    elapsed_millis: i32,
    started: bool,
    initialized: bool,
    finished: bool,
    killed: bool,

    callbacks: CallbackRegistry,
    user_data: Option<Box<dyn Any + Send + Sync>>,
}

impl<H: TimedHooks> TimedEntity<H> {
    /// Creates an unstarted, unconfigured entity.
    pub fn new(hooks: H, engine: &EngineConfig) -> Self {
        Self {
            hooks,
            pooled: engine.pooling,
            yoyo: false,
            in_compute_window: false,
            iteration: 0,
            repeat_count: 0,
            delay_millis: 0,
            duration_millis: 0,
            repeat_delay_millis: 0,
            elapsed_millis: 0,
            started: false,
            initialized: false,
            finished: false,
            killed: false,
            callbacks: CallbackRegistry::new(),
            user_data: None,
        }
    }

    /// Creates an entity and applies a validated timing configuration.
    pub fn with_config(hooks: H, timing: &TimingConfig, engine: &EngineConfig) -> Result<Self> {
        timing.validate()?;
        let mut entity = Self::new(hooks, engine);
        entity.apply_config(timing);
        Ok(entity)
    }

    pub fn apply_config(&mut self, timing: &TimingConfig) -> &mut Self {
        self.set_delay(timing.delay_millis).set_duration(timing.duration_millis);
        match timing.repeat {
            Some(repeat) if repeat.yoyo => self.repeat_yoyo(repeat.count, repeat.delay_millis),
            Some(repeat) => self.repeat(repeat.count, repeat.delay_millis),
            None => self.repeat(0, 0),
        }
    }

    /// Returns the entity to its pristine state so it can be recycled.
    ///
    /// Timing, callbacks and user data are all cleared. The hooks are kept.
    pub fn reset(&mut self, engine: &EngineConfig) {
        self.pooled = engine.pooling;

        self.yoyo = false;
        self.in_compute_window = false;
        self.iteration = 0;
        self.repeat_count = 0;

        self.delay_millis = 0;
        self.duration_millis = 0;
        self.repeat_delay_millis = 0;
        self.elapsed_millis = 0;
        self.started = false;
        self.initialized = false;
        self.finished = false;
        self.killed = false;

        self.callbacks.clear();
        self.user_data = None;
    }

    // ---------------------------------------------------------------------
    // Configuration
    // ---------------------------------------------------------------------

    pub fn set_delay(&mut self, millis: i32) -> &mut Self {
        self.delay_millis = millis;
        self
    }

    pub fn set_duration(&mut self, millis: i32) -> &mut Self {
        self.duration_millis = millis;
        self
    }

    /// Repeats `count` more times (negative for forever), waiting
    /// `delay_millis` before each repetition.
    pub fn repeat(&mut self, count: i32, delay_millis: i32) -> &mut Self {
        self.repeat_count = count;
        self.repeat_delay_millis = delay_millis.max(0);
        self.yoyo = false;
        self
    }

    /// Like [`repeat`](Self::repeat), but every other repetition plays backwards.
    pub fn repeat_yoyo(&mut self, count: i32, delay_millis: i32) -> &mut Self {
        self.repeat_count = count;
        self.repeat_delay_millis = delay_millis.max(0);
        self.yoyo = true;
        self
    }

    pub fn add_callback(&mut self, kind: CallbackKind, callback: CallbackHandle) -> &mut Self {
        self.callbacks.add(kind, callback);
        self
    }

    /// Registers a closure for `kind`.
    pub fn on<F>(&mut self, kind: CallbackKind, callback: F) -> &mut Self
    where
        F: Fn(CallbackKind) + Send + Sync + 'static,
    {
        self.add_callback(kind, std::sync::Arc::new(callback))
    }

    /// Attaches caller-owned data. The engine never looks at it.
    pub fn set_user_data<T: Any + Send + Sync>(&mut self, data: T) -> &mut Self {
        self.user_data = Some(Box::new(data));
        self
    }

    // ---------------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------------

    pub fn start(&mut self) -> &mut Self {
        self.started = true;
        self
    }

    /// Terminates the entity. Further updates are ignored until [`reset`](Self::reset).
    pub fn kill(&mut self) {
        tracing::debug!(iteration = self.iteration, "entity killed");
        self.killed = true;
        self.finished = true;
    }

    /// Jumps to the very beginning, before the initial delay.
    ///
    /// A killed entity stays finished, and an entity that has not played yet
    /// is not reported as finished.
    pub fn force_to_start(&mut self) {
        self.elapsed_millis = -self.delay_millis;
        self.iteration = -1;
        self.in_compute_window = false;
        self.finished = self.killed || (self.initialized && self.is_out_of_range(self.iteration));
        tracing::debug!("forced to start");
        self.hooks.force_start_values(self.iteration_info(0));
    }

    /// Jumps past the last iteration, as if `total_millis` had been played.
    ///
    /// Infinitely repeating entities have no end; the call is ignored for them.
    pub fn force_to_end(&mut self, total_millis: i32) {
        let Some(full_duration) = self.full_duration() else {
            tracing::warn!(
                repeat_count = self.repeat_count,
                "cannot force an endless entity to its end"
            );
            return;
        };

        let top = self.top_iteration();
        let Some(past_end) = top.checked_add(1) else {
            tracing::warn!(
                repeat_count = self.repeat_count,
                "repeat count too large to force to its end"
            );
            return;
        };
        self.elapsed_millis = total_millis.saturating_sub(full_duration);
        self.iteration = past_end;
        self.in_compute_window = false;
        self.finished = true;
        tracing::debug!(elapsed = self.elapsed_millis, "forced to end");
        self.hooks.force_end_values(self.iteration_info(top));
    }

    // ---------------------------------------------------------------------
    // Update engine
    // ---------------------------------------------------------------------

    /// Advances the entity by `delta_millis`, which may be negative for
    /// backwards play and arbitrarily large.
    pub fn update(&mut self, delta_millis: i32) {
        if !self.started || self.killed {
            return;
        }

        let last_iteration = self.iteration;
        self.elapsed_millis = self.elapsed_millis.saturating_add(delta_millis);

        self.try_initialize();
        if !self.initialized {
            return;
        }

        self.test_relaunch();
        if self.is_degenerate_cycle() {
            self.elapsed_millis = 0;
        }
        self.cross_boundaries();
        self.snap_skipped_iterations(last_iteration);
        self.test_limit_transition(last_iteration);
        self.finished = self.is_out_of_range(self.iteration);

        if self.in_compute_window {
            self.compute(last_iteration, delta_millis);
        }
    }

    fn try_initialize(&mut self) {
        if self.initialized || self.elapsed_millis < self.delay_millis {
            return;
        }

        self.hooks.initialize();
        self.initialized = true;
        self.in_compute_window = true;
        self.iteration = self.iteration.max(0);
        self.elapsed_millis -= self.delay_millis;
        self.fire(CallbackKind::Begin);
        self.fire(CallbackKind::Start);
    }

    /// Re-admits an entity that sits just outside the valid range when time
    /// moves back towards it.
    fn test_relaunch(&mut self) {
        if self.repeat_count < 0 {
            return;
        }

        let top = self.top_iteration();
        if self.iteration > top && self.elapsed_millis <= 0 {
            debug_assert_eq!(self.iteration, top + 1);
            tracing::debug!(iteration = top, "relaunched from the end");
            self.in_compute_window = true;
            self.elapsed_millis += self.duration_millis;
            self.iteration = top;
            self.fire(CallbackKind::BackStart);
        } else if self.iteration < 0 && self.elapsed_millis >= 0 {
            debug_assert_eq!(self.iteration, -1);
            tracing::debug!("relaunched from the start");
            self.in_compute_window = true;
            self.iteration = 0;
            self.fire(CallbackKind::Start);
        }
    }

    /// Consumes overshoot and undershoot one boundary at a time.
    fn cross_boundaries(&mut self) {
        while self.is_valid(self.iteration) {
            let kind = if !self.in_compute_window && self.elapsed_millis <= 0 {
                self.in_compute_window = true;
                self.elapsed_millis += self.duration_millis;
                self.iteration -= 1;
                CallbackKind::BackStart
            } else if !self.in_compute_window && self.elapsed_millis >= self.repeat_delay_millis {
                self.in_compute_window = true;
                self.elapsed_millis -= self.repeat_delay_millis;
                self.iteration += 1;
                CallbackKind::Start
            } else if self.in_compute_window && self.elapsed_millis < 0 {
                self.in_compute_window = false;
                if self.is_valid(self.iteration - 1) {
                    self.elapsed_millis += self.repeat_delay_millis;
                }
                self.iteration -= 1;
                CallbackKind::BackEnd
            } else if self.in_compute_window && self.elapsed_millis > self.duration_millis {
                self.in_compute_window = false;
                self.elapsed_millis -= self.duration_millis;
                self.iteration += 1;
                CallbackKind::End
            } else {
                break;
            };

            self.fire(kind);
        }
    }

    /// Windows crossed without a compute call still get their boundary values.
    fn snap_skipped_iterations(&mut self, last_iteration: i32) {
        if self.in_compute_window || self.iteration == last_iteration {
            return;
        }

        if self.iteration > last_iteration {
            for index in last_iteration..self.iteration {
                if self.is_window(index) {
                    let info = self.iteration_info(index);
                    self.hooks.force_end_values(info);
                }
            }
        } else {
            for index in (self.iteration + 1..=last_iteration).rev() {
                if self.is_window(index) {
                    let info = self.iteration_info(index);
                    self.hooks.force_start_values(info);
                }
            }
        }
    }

    fn test_limit_transition(&mut self, last_iteration: i32) {
        if self.repeat_count < 0 || self.iteration == last_iteration {
            return;
        }

        if self.iteration > self.top_iteration() {
            self.fire(CallbackKind::Complete);
        } else if self.iteration < 0 {
            self.fire(CallbackKind::BackComplete);
        }
    }

    fn compute(&mut self, last_iteration: i32, delta_millis: i32) {
        debug_assert!(self.elapsed_millis >= 0);
        debug_assert!(self.elapsed_millis <= self.duration_millis);
        debug_assert!(self.initialized);
        debug_assert!(!self.finished);
        debug_assert!(self.is_valid(self.iteration));

        let frame = ComputeFrame {
            iteration: self.iteration_info(self.iteration),
            last_iteration,
            delta_millis,
            local_millis: self.elapsed_millis,
            duration_millis: self.duration_millis,
        };
        self.hooks.compute_values(&frame);
    }

    fn fire(&self, kind: CallbackKind) {
        tracing::trace!(?kind, iteration = self.iteration, "timeline event");
        self.callbacks.fire(kind);
    }

    // ---------------------------------------------------------------------
    // Iteration arithmetic
    // ---------------------------------------------------------------------

    fn top_iteration(&self) -> i32 {
        self.repeat_count.saturating_mul(2)
    }

    fn is_valid(&self, iteration: i32) -> bool {
        self.repeat_count < 0 || (0..=self.top_iteration()).contains(&iteration)
    }

    fn is_out_of_range(&self, iteration: i32) -> bool {
        !self.is_valid(iteration)
    }

    fn is_window(&self, iteration: i32) -> bool {
        iteration.rem_euclid(2) == 0 && self.is_valid(iteration)
    }

    /// An endless cycle of zero length can never consume time.
    fn is_degenerate_cycle(&self) -> bool {
        self.repeat_count < 0 && self.duration_millis + self.repeat_delay_millis == 0
    }

    fn iteration_info(&self, index: i32) -> IterationInfo {
        IterationInfo {
            index,
            reversed: self.is_iteration_yoyo(index),
        }
    }

    /// True when `iteration` plays backwards because of yoyo repetition.
    pub fn is_iteration_yoyo(&self, iteration: i32) -> bool {
        self.yoyo && (iteration % 4).abs() == 2
    }

    // ---------------------------------------------------------------------
    // Getters
    // ---------------------------------------------------------------------

    pub fn delay(&self) -> i32 {
        self.delay_millis
    }

    pub fn duration(&self) -> i32 {
        self.duration_millis
    }

    pub fn repeat_count(&self) -> i32 {
        self.repeat_count
    }

    pub fn repeat_delay(&self) -> i32 {
        self.repeat_delay_millis
    }

    /// `delay + duration + (repeat_delay + duration) * repeat_count`.
    ///
    /// `None` for endless repetition, or when the sum does not fit in an `i32`.
    pub fn full_duration(&self) -> Option<i32> {
        if self.repeat_count < 0 {
            return None;
        }
        self.repeat_delay_millis
            .checked_add(self.duration_millis)?
            .checked_mul(self.repeat_count)?
            .checked_add(self.duration_millis)?
            .checked_add(self.delay_millis)
    }

    pub fn is_yoyo(&self) -> bool {
        self.yoyo
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// True once every repetition has played (in either direction) or the
    /// entity has been killed.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_killed(&self) -> bool {
        self.killed
    }

    pub fn is_pooled(&self) -> bool {
        self.pooled
    }

    pub fn iteration(&self) -> i32 {
        self.iteration
    }

    pub fn elapsed_in_window(&self) -> i32 {
        self.elapsed_millis
    }

    pub fn in_compute_window(&self) -> bool {
        self.in_compute_window
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            iteration: self.iteration,
            elapsed_millis: self.elapsed_millis,
            in_compute_window: self.in_compute_window,
            initialized: self.initialized,
            finished: self.finished,
        }
    }

    pub fn user_data<T: Any>(&self) -> Option<&T> {
        self.user_data
            .as_deref()
            .and_then(|data| data.downcast_ref::<T>())
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }

    pub fn children_count(&self) -> usize {
        self.hooks.children_count()
    }

    pub fn kill_target(&mut self, target: &dyn Any, tween_type: Option<i32>) {
        self.hooks.kill_target(target, tween_type);
    }

    pub fn contains_target(&self, target: &dyn Any, tween_type: Option<i32>) -> bool {
        self.hooks.contains_target(target, tween_type)
    }
}

impl<H> fmt::Debug for TimedEntity<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimedEntity")
            .field("delay_millis", &self.delay_millis)
            .field("duration_millis", &self.duration_millis)
            .field("repeat_count", &self.repeat_count)
            .field("repeat_delay_millis", &self.repeat_delay_millis)
            .field("yoyo", &self.yoyo)
            .field("iteration", &self.iteration)
            .field("elapsed_millis", &self.elapsed_millis)
            .field("in_compute_window", &self.in_compute_window)
            .field("started", &self.started)
            .field("initialized", &self.initialized)
            .field("finished", &self.finished)
            .field("killed", &self.killed)
            .field("pooled", &self.pooled)
            .field("callbacks", &self.callbacks)
            .field("user_data", &self.user_data.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TraceEntry, TraceRecorder};

    use CallbackKind::*;

    /// Timeline-like hooks holding `(target, tween_type)` children.
    struct Composite {
        children: Vec<(&'static str, i32)>,
    }

    impl Composite {
        fn matches(
            child: &(&'static str, i32),
            target: &dyn Any,
            tween_type: Option<i32>,
        ) -> bool {
            target.downcast_ref::<&'static str>() == Some(&child.0)
                && tween_type.map_or(true, |ty| ty == child.1)
        }
    }

    impl TimedHooks for Composite {
        fn compute_values(&mut self, _frame: &ComputeFrame) {}

        fn force_start_values(&mut self, _iteration: IterationInfo) {}

        fn force_end_values(&mut self, _iteration: IterationInfo) {}

        fn children_count(&self) -> usize {
            self.children.len()
        }

        fn kill_target(&mut self, target: &dyn Any, tween_type: Option<i32>) {
            self.children.retain(|child| !Self::matches(child, target, tween_type));
        }

        fn contains_target(&self, target: &dyn Any, tween_type: Option<i32>) -> bool {
            self.children
                .iter()
                .any(|child| Self::matches(child, target, tween_type))
        }
    }

    fn build(timing: TimingConfig) -> (TimedEntity<TraceRecorder>, TraceRecorder) {
        let recorder = TraceRecorder::new();
        let mut entity =
            TimedEntity::with_config(recorder.clone(), &timing, &EngineConfig::default()).unwrap();
        recorder.attach(&mut entity);
        entity.start();
        (entity, recorder)
    }

    fn compute(iteration: i32, last_iteration: i32, local_millis: i32) -> TraceEntry {
        TraceEntry::Compute {
            iteration,
            last_iteration,
            local_millis,
            reversed: false,
        }
    }

    fn event(kind: CallbackKind) -> TraceEntry {
        TraceEntry::Event { kind }
    }

    fn force_end(iteration: i32) -> TraceEntry {
        TraceEntry::ForceEnd {
            iteration,
            reversed: false,
        }
    }

    fn force_start(iteration: i32) -> TraceEntry {
        TraceEntry::ForceStart {
            iteration,
            reversed: false,
        }
    }

    #[test]
    fn ignores_updates_until_started() {
        let recorder = TraceRecorder::new();
        let mut entity = TimedEntity::new(recorder.clone(), &EngineConfig::default());
        entity.set_duration(100);
        recorder.attach(&mut entity);

        entity.update(500);

        assert!(recorder.entries().is_empty());
        assert_eq!(entity.elapsed_in_window(), 0);
        assert!(!entity.is_initialized());
    }

    #[test]
    fn exact_duration_renders_final_frame_before_completing() {
        let (mut entity, recorder) = build(TimingConfig::new(0, 1000));

        entity.update(500);
        assert_eq!(
            recorder.take(),
            vec![
                TraceEntry::Initialize,
                event(Begin),
                event(Start),
                compute(0, 0, 500),
            ]
        );
        assert!(!entity.is_finished());

        // END needs local time strictly past the duration: deltas summing to
        // exactly the full duration render the final frame and stop there.
        entity.update(500);
        assert_eq!(recorder.take(), vec![compute(0, 0, 1000)]);
        assert!(!entity.is_finished());

        // One more millisecond crosses the boundary.
        entity.update(1);
        assert_eq!(
            recorder.take(),
            vec![event(End), force_end(0), event(Complete)]
        );
        assert!(entity.is_finished());
        assert_eq!(entity.iteration(), 1);
        assert_eq!(entity.elapsed_in_window(), 1);
    }

    #[test]
    fn waits_out_the_initial_delay() {
        let (mut entity, recorder) = build(TimingConfig::new(100, 500));

        entity.update(50);
        assert!(recorder.entries().is_empty());
        assert!(!entity.is_initialized());

        entity.update(60);
        assert_eq!(
            recorder.take(),
            vec![
                TraceEntry::Initialize,
                event(Begin),
                event(Start),
                compute(0, 0, 10),
            ]
        );
    }

    #[test]
    fn large_step_crosses_every_repetition() {
        let (mut entity, recorder) = build(TimingConfig::new(100, 500).with_repeat(2, 50));
        assert_eq!(entity.full_duration(), Some(1700));

        entity.update(100);
        assert_eq!(recorder.events(), vec![Begin, Start]);
        recorder.clear();

        entity.update(2000);
        assert_eq!(
            recorder.take(),
            vec![
                event(End),
                event(Start),
                event(End),
                event(Start),
                event(End),
                force_end(0),
                force_end(2),
                force_end(4),
                event(Complete),
            ]
        );
        assert!(entity.is_finished());
        assert_eq!(entity.iteration(), 5);
        assert_eq!(entity.elapsed_in_window(), 400);
    }

    #[test]
    fn small_step_through_repeat_delay() {
        let (mut entity, recorder) = build(TimingConfig::new(0, 100).with_repeat(1, 50));

        entity.update(120);
        assert_eq!(
            recorder.take(),
            vec![
                TraceEntry::Initialize,
                event(Begin),
                event(Start),
                event(End),
                force_end(0),
            ]
        );
        assert!(!entity.in_compute_window());
        assert_eq!(entity.iteration(), 1);

        entity.update(40);
        assert_eq!(recorder.take(), vec![event(Start), compute(2, 1, 10)]);
    }

    #[test]
    fn full_duration_formula() {
        for (delay, duration, count, repeat_delay) in
            [(0, 0, 0, 0), (10, 100, 0, 5), (100, 500, 2, 50), (7, 33, 9, 0)]
        {
            let (entity, _) =
                build(TimingConfig::new(delay, duration).with_repeat(count, repeat_delay));
            assert_eq!(
                entity.full_duration(),
                Some(delay + duration + (repeat_delay + duration) * count)
            );
        }

        let (entity, _) = build(TimingConfig::new(0, 100).with_repeat(-1, 0));
        assert_eq!(entity.full_duration(), None);
    }

    #[test]
    fn repeat_count_matches_start_end_pairs() {
        for count in 0..6 {
            let (mut entity, recorder) = build(TimingConfig::new(20, 80).with_repeat(count, 15));
            let full = entity.full_duration().unwrap();

            entity.update(full + 1);

            let plays = (count + 1) as usize;
            assert_eq!(recorder.count(Start), plays, "count = {count}");
            assert_eq!(recorder.count(End), plays, "count = {count}");
            assert_eq!(recorder.count(Begin), 1);
            assert_eq!(recorder.count(Complete), 1);
            assert!(entity.is_finished());
        }
    }

    #[test]
    fn one_large_step_equals_many_small_steps() {
        let timing = TimingConfig::new(30, 100).with_repeat_yoyo(3, 20);
        let (mut single, single_trace) = build(timing);
        let (mut stepped, stepped_trace) = build(timing);
        let total = single.full_duration().unwrap() + 5;

        single.update(total);
        let mut remaining = total;
        while remaining > 0 {
            let step = remaining.min(7);
            stepped.update(step);
            remaining -= step;
        }

        assert_eq!(single.snapshot(), stepped.snapshot());
        assert_eq!(single_trace.events(), stepped_trace.events());
        assert!(single.is_finished());

        let entries = single_trace.entries();
        assert!(!entries
            .iter()
            .any(|entry| matches!(entry, TraceEntry::Compute { .. })));
        let forced: Vec<_> = entries
            .iter()
            .filter_map(|entry| match entry {
                TraceEntry::ForceEnd {
                    iteration,
                    reversed,
                } => Some((*iteration, *reversed)),
                _ => None,
            })
            .collect();
        assert_eq!(forced, vec![(0, false), (2, true), (4, false), (6, true)]);
    }

    #[test]
    fn reverse_playback_mirrors_forward_playback() {
        let (mut entity, recorder) = build(TimingConfig::new(0, 100).with_repeat(2, 10));
        let forward = [50, 120, 151];

        for delta in forward {
            entity.update(delta);
        }
        assert!(entity.is_finished());
        let forward_events = recorder.events();
        assert_eq!(
            forward_events,
            vec![Begin, Start, End, Start, End, Start, End, Complete]
        );
        recorder.clear();

        for delta in forward.iter().rev() {
            entity.update(-delta);
        }
        // The forward run landed 1ms past the end; going back the same amount
        // stops exactly on the first frame.
        assert!(!entity.is_finished());
        assert_eq!(entity.iteration(), 0);
        assert_eq!(entity.elapsed_in_window(), 0);

        entity.update(-1);
        let backward_events = recorder.events();
        assert_eq!(
            backward_events,
            vec![BackStart, BackEnd, BackStart, BackEnd, BackStart, BackEnd, BackComplete]
        );
        assert_eq!(recorder.count(BackStart), 3);
        assert_eq!(recorder.count(BackEnd), 3);
        assert!(entity.is_finished());
        assert_eq!(entity.iteration(), -1);
        assert_eq!(recorder.entries().last(), Some(&event(BackComplete)));
    }

    #[test]
    fn backward_step_snaps_start_values() {
        let (mut entity, recorder) = build(TimingConfig::new(0, 100).with_repeat(1, 10));
        entity.update(211);
        assert!(entity.is_finished());
        recorder.clear();

        entity.update(-1000);
        assert_eq!(
            recorder.take(),
            vec![
                event(BackStart),
                event(BackEnd),
                event(BackStart),
                event(BackEnd),
                force_start(2),
                force_start(0),
                event(BackComplete),
            ]
        );
        assert_eq!(entity.iteration(), -1);
        assert!(entity.is_finished());
    }

    #[test]
    fn relaunches_forward_after_back_complete() {
        let (mut entity, recorder) = build(TimingConfig::new(0, 100));
        entity.update(50);
        entity.update(-60);
        assert!(entity.is_finished());
        assert_eq!(recorder.count(BackComplete), 1);
        recorder.clear();

        entity.update(30);
        assert_eq!(recorder.take(), vec![event(Start), compute(0, -1, 20)]);
        assert!(!entity.is_finished());
    }

    #[test]
    fn endless_yoyo_alternates_direction() {
        let (mut entity, recorder) = build(TimingConfig::new(0, 100).with_repeat_yoyo(-1, 0));

        for _ in 0..40 {
            entity.update(30);
            assert!(!entity.is_finished());
        }

        let computes: Vec<_> = recorder
            .entries()
            .into_iter()
            .filter_map(|entry| match entry {
                TraceEntry::Compute {
                    iteration,
                    reversed,
                    ..
                } => Some((iteration, reversed)),
                _ => None,
            })
            .collect();
        assert!(computes.iter().any(|(iteration, _)| *iteration >= 10));
        for (iteration, reversed) in computes {
            assert_eq!(iteration % 2, 0);
            assert_eq!(reversed, iteration % 4 == 2, "iteration {iteration}");
        }
        assert_eq!(recorder.count(Complete), 0);
    }

    #[test]
    fn yoyo_direction_depends_only_on_index() {
        let (entity, _) = build(TimingConfig::new(0, 100).with_repeat_yoyo(-1, 0));
        assert!(!entity.is_iteration_yoyo(0));
        assert!(entity.is_iteration_yoyo(2));
        assert!(!entity.is_iteration_yoyo(4));
        assert!(entity.is_iteration_yoyo(-2));
        assert!(!entity.is_iteration_yoyo(-4));

        let (plain, _) = build(TimingConfig::new(0, 100).with_repeat(-1, 0));
        assert!(!plain.is_iteration_yoyo(2));
    }

    #[test]
    fn zero_duration_repeats_complete_in_one_step() {
        let (mut entity, recorder) = build(TimingConfig::new(0, 0).with_repeat(1, 0));

        entity.update(1);

        assert_eq!(
            recorder.events(),
            vec![Begin, Start, End, Start, End, Complete]
        );
        assert!(entity.is_finished());
    }

    #[test]
    fn zero_length_endless_cycle_is_pinned() {
        let (mut entity, recorder) = build(TimingConfig::new(0, 0).with_repeat(-1, 0));

        entity.update(10);
        entity.update(10);

        assert_eq!(recorder.events(), vec![Begin, Start]);
        assert_eq!(entity.elapsed_in_window(), 0);
        assert!(!entity.is_finished());
    }

    #[test]
    fn kill_stops_updates_until_reset() {
        let (mut entity, recorder) = build(TimingConfig::new(0, 100));
        entity.update(10);
        entity.kill();
        recorder.clear();

        entity.update(10);
        assert!(recorder.entries().is_empty());
        assert!(entity.is_finished());
        assert!(entity.is_killed());

        entity.reset(&EngineConfig::default());
        assert!(!entity.is_finished());
        assert!(!entity.is_killed());
    }

    #[test]
    fn reset_clears_everything_but_hooks() {
        let (mut entity, recorder) = build(TimingConfig::new(10, 100).with_repeat_yoyo(3, 5));
        entity.set_user_data(42_u32);
        entity.update(50);
        recorder.clear();

        entity.reset(&EngineConfig::pooled());

        assert!(entity.is_pooled());
        assert!(!entity.is_started());
        assert!(!entity.is_yoyo());
        assert_eq!(
            entity.snapshot(),
            ProgressSnapshot {
                iteration: 0,
                elapsed_millis: 0,
                in_compute_window: false,
                initialized: false,
                finished: false,
            }
        );
        assert_eq!(entity.user_data::<u32>(), None);
        assert_eq!(
            (entity.delay(), entity.duration(), entity.repeat_count(), entity.repeat_delay()),
            (0, 0, 0, 0)
        );

        entity.set_duration(100).start();
        entity.update(10);
        assert_eq!(recorder.events(), Vec::<CallbackKind>::new());
    }

    #[test]
    fn force_to_start_and_end() {
        let (mut entity, recorder) = build(TimingConfig::new(20, 100).with_repeat(2, 10));
        entity.update(70);
        recorder.clear();

        entity.force_to_end(entity.full_duration().unwrap() + 15);
        assert_eq!(recorder.take(), vec![force_end(4)]);
        assert_eq!(entity.iteration(), 5);
        assert_eq!(entity.elapsed_in_window(), 15);
        assert!(entity.is_finished());

        entity.force_to_start();
        assert_eq!(recorder.take(), vec![force_start(0)]);
        assert_eq!(entity.iteration(), -1);
        assert_eq!(entity.elapsed_in_window(), -20);
        assert!(!entity.in_compute_window());

        entity.update(25);
        assert_eq!(recorder.take(), vec![event(Start), compute(0, -1, 5)]);
    }

    #[test]
    fn force_to_end_ignores_endless_entities() {
        let (mut entity, recorder) = build(TimingConfig::new(0, 100).with_repeat(-1, 0));
        entity.force_to_end(1000);
        assert!(recorder.entries().is_empty());
        assert!(!entity.is_finished());
    }

    #[test]
    fn force_to_end_ignores_unrepresentable_repeat_counts() {
        let (mut entity, recorder) = build(TimingConfig::new(0, 0).with_repeat(i32::MAX, 0));
        assert_eq!(entity.full_duration(), Some(0));

        entity.force_to_end(0);

        assert!(recorder.entries().is_empty());
        assert!(!entity.is_finished());
        assert_eq!(entity.iteration(), 0);
    }

    #[test]
    fn force_to_start_keeps_killed_entities_finished() {
        let (mut entity, recorder) = build(TimingConfig::new(0, 100).with_repeat(-1, 0));
        entity.update(10);
        entity.kill();

        entity.force_to_start();

        assert!(entity.is_killed());
        assert!(entity.is_finished());
        assert_eq!(recorder.entries().last(), Some(&force_start(0)));
    }

    #[test]
    fn force_to_start_before_playing_is_not_finished() {
        let (mut entity, recorder) = build(TimingConfig::new(100, 500));

        entity.force_to_start();
        assert!(!entity.is_finished());
        assert_eq!(entity.iteration(), -1);

        entity.update(150);
        assert!(!entity.is_finished());
        assert!(!entity.is_initialized());
        assert!(recorder.events().is_empty());

        entity.update(50);
        assert!(entity.is_initialized());
        assert_eq!(recorder.events(), vec![Begin, Start]);
        assert!(!entity.is_finished());
    }

    #[test]
    fn forwards_target_queries_to_hooks() {
        let mut entity = TimedEntity::new(
            Composite {
                children: vec![("alpha", 1), ("alpha", 2), ("beta", 1)],
            },
            &EngineConfig::default(),
        );
        assert_eq!(entity.children_count(), 3);

        assert!(entity.contains_target(&"alpha", None));
        assert!(entity.contains_target(&"alpha", Some(2)));
        assert!(!entity.contains_target(&"beta", Some(2)));
        assert!(!entity.contains_target(&"gamma", None));
        assert!(!entity.contains_target(&7_u32, None));

        entity.kill_target(&"alpha", Some(1));
        assert_eq!(entity.hooks().children, vec![("alpha", 2), ("beta", 1)]);

        entity.kill_target(&"beta", None);
        assert_eq!(entity.hooks().children, vec![("alpha", 2)]);
        assert_eq!(entity.children_count(), 1);
        assert!(!entity.contains_target(&"beta", None));
    }

    #[test]
    fn leaf_hooks_report_no_children() {
        let (mut entity, _) = build(TimingConfig::new(0, 100));
        assert_eq!(entity.children_count(), 0);
        assert!(!entity.contains_target(&"alpha", None));
        entity.kill_target(&"alpha", Some(1));
    }

    #[test]
    fn negative_repeat_delay_is_clamped() {
        let (mut entity, _) = build(TimingConfig::new(0, 100));
        entity.repeat(3, -20);
        assert_eq!(entity.repeat_delay(), 0);
        entity.repeat_yoyo(3, -1);
        assert_eq!(entity.repeat_delay(), 0);
        assert!(entity.is_yoyo());
    }

    #[test]
    fn user_data_is_typed() {
        let (mut entity, _) = build(TimingConfig::new(0, 100));
        entity.set_user_data(String::from("sprite-7"));
        assert_eq!(entity.user_data::<String>().map(String::as_str), Some("sprite-7"));
        assert_eq!(entity.user_data::<u32>(), None);
    }

    #[test]
    fn closures_fire_in_registration_order() {
        use std::sync::{Arc, Mutex};

        let order = Arc::new(Mutex::new(Vec::new()));
        let (mut entity, _) = build(TimingConfig::new(0, 100));
        for id in 0..3 {
            let order = order.clone();
            entity.on(Begin, move |_| order.lock().unwrap().push(id));
        }

        entity.update(1);
        entity.update(1);

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn rejects_invalid_config() {
        let result = TimedEntity::with_config(
            TraceRecorder::new(),
            &TimingConfig::new(-1, 100),
            &EngineConfig::default(),
        );
        assert!(result.is_err());
    }
}
