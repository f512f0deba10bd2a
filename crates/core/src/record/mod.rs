use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::{
    CallbackHandle, CallbackKind, ComputeFrame, IterationInfo, TimedEntity, TimedHooks,
};

/// One observable side effect of an `update` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TraceEntry {
    Event {
        kind: CallbackKind,
    },
    Initialize,
    Compute {
        iteration: i32,
        last_iteration: i32,
        local_millis: i32,
        reversed: bool,
    },
    ForceStart {
        iteration: i32,
        reversed: bool,
    },
    ForceEnd {
        iteration: i32,
        reversed: bool,
    },
}

/// Hook implementation and callback sink that log everything into one shared,
/// ordered trace. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct TraceRecorder {
    entries: Arc<Mutex<Vec<TraceEntry>>>,
}

impl TraceRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a callback handle that appends `Event` entries to this trace.
    pub fn callback(&self) -> CallbackHandle {
        let recorder = self.clone();
        Arc::new(move |kind: CallbackKind| recorder.push(TraceEntry::Event { kind }))
    }

    /// Registers this recorder for every callback kind on `entity`.
    pub fn attach<H: TimedHooks>(&self, entity: &mut TimedEntity<H>) {
        let callback = self.callback();
        for kind in CallbackKind::ALL {
            entity.add_callback(kind, callback.clone());
        }
    }

    pub fn entries(&self) -> Vec<TraceEntry> {
        self.lock().clone()
    }

    /// Only the callback events, in firing order.
    pub fn events(&self) -> Vec<CallbackKind> {
        self.lock()
            .iter()
            .filter_map(|entry| match entry {
                TraceEntry::Event { kind } => Some(*kind),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, kind: CallbackKind) -> usize {
        self.events().into_iter().filter(|k| *k == kind).count()
    }

    /// Returns the recorded entries and empties the log.
    pub fn take(&self) -> Vec<TraceEntry> {
        std::mem::take(&mut *self.lock())
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn push(&self, entry: TraceEntry) {
        self.lock().push(entry);
    }

    fn lock(&self) -> MutexGuard<'_, Vec<TraceEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TimedHooks for TraceRecorder {
    fn initialize(&mut self) {
        self.push(TraceEntry::Initialize);
    }

    fn compute_values(&mut self, frame: &ComputeFrame) {
        self.push(TraceEntry::Compute {
            iteration: frame.iteration.index,
            last_iteration: frame.last_iteration,
            local_millis: frame.local_millis,
            reversed: frame.iteration.reversed,
        });
    }

    fn force_start_values(&mut self, iteration: IterationInfo) {
        self.push(TraceEntry::ForceStart {
            iteration: iteration.index,
            reversed: iteration.reversed,
        });
    }

    fn force_end_values(&mut self, iteration: IterationInfo) {
        self.push(TraceEntry::ForceEnd {
            iteration: iteration.index,
            reversed: iteration.reversed,
        });
    }
}
