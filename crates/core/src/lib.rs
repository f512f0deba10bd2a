//! Timing core of the tween engine.
//!
//! Every animatable entity, whether a single interpolation or a nested
//! timeline, is a [`TimedEntity`]. The caller feeds it signed millisecond
//! deltas; the entity turns them into an ordered stream of lifecycle events
//! and tells its [`TimedHooks`] when to compute values and when to snap to
//! boundary values.

pub mod callback;
pub mod clock;
pub mod config;
pub mod error;
pub mod hooks;
pub mod record;
pub mod timeline;

pub use callback::{CallbackHandle, CallbackKind, CallbackRegistry, TweenCallback};
pub use clock::PlaybackClock;
pub use config::{EngineConfig, RepeatConfig, TimingConfig};
pub use error::{Result, TweenError};
pub use hooks::{ComputeFrame, IterationInfo, TimedHooks};
pub use record::{TraceEntry, TraceRecorder};
pub use timeline::{ProgressSnapshot, TimedEntity};
