use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

/// Lifecycle events emitted by a timed entity.
///
/// ```text
/// forwards :         BEGIN                                   COMPLETE
/// forwards :         START    END      START    END      START    END
/// |------------------[XXXXXXXXXX]------[XXXXXXXXXX]------[XXXXXXXXXX]
/// backwards:         bEND  bSTART      bEND  bSTART      bEND  bSTART
/// backwards:         bCOMPLETE
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallbackKind {
    /// First START, right after the initial delay. Fires once per lifetime.
    Begin,
    /// Beginning of every forward iteration.
    Start,
    /// End of every forward iteration, before the repeat delay.
    End,
    /// Last END.
    Complete,
    /// Beginning of every backward iteration (its end edge in local time).
    BackStart,
    /// End of every backward iteration.
    BackEnd,
    /// Last BACK_END.
    BackComplete,
}

impl CallbackKind {
    pub const ALL: [CallbackKind; 7] = [
        CallbackKind::Begin,
        CallbackKind::Start,
        CallbackKind::End,
        CallbackKind::Complete,
        CallbackKind::BackStart,
        CallbackKind::BackEnd,
        CallbackKind::BackComplete,
    ];

    fn slot(self) -> usize {
        self as usize
    }
}

/// Receiver of lifecycle events.
pub trait TweenCallback: Send + Sync {
    fn on_event(&self, kind: CallbackKind);
}

impl<F> TweenCallback for F
where
    F: Fn(CallbackKind) + Send + Sync,
{
    fn on_event(&self, kind: CallbackKind) {
        self(kind)
    }
}

/// Shared handle to a callback. The same handle may be registered several
/// times and then fires once per registration.
pub type CallbackHandle = Arc<dyn TweenCallback>;

/// Ordered callback lists, one per [`CallbackKind`].
#[derive(Default, Clone)]
pub struct CallbackRegistry {
    slots: [Vec<CallbackHandle>; 7],
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, kind: CallbackKind, callback: CallbackHandle) {
        self.slots[kind.slot()].push(callback);
    }

    /// Invokes every callback registered for `kind` in insertion order.
    pub fn fire(&self, kind: CallbackKind) {
        for callback in &self.slots[kind.slot()] {
            callback.on_event(kind);
        }
    }

    pub fn len(&self, kind: CallbackKind) -> usize {
        self.slots[kind.slot()].len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Vec::is_empty)
    }

    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            slot.clear();
        }
    }
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for kind in CallbackKind::ALL {
            map.entry(&kind, &self.len(kind));
        }
        map.finish()
    }
}
