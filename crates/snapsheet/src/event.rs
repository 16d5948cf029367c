#![forbid(unsafe_code)]

//! Lifecycle notifications and per-sample outcomes.
//!
//! Events are delivered two ways: synchronously to an optional observer
//! closure, and queued for [`SheetEvents::drain`]. Hosts may use either.
//!
//! # Invariants
//!
//! 1. `WillMove` precedes the first frame of the settle it announces.
//! 2. `DidMove` follows the last frame and fires at most once per distinct
//!    committed target.
//! 3. Draining clears the queue; events are not replayed.

use crate::snap_point::SnapPoint;

/// A lifecycle notification carrying the snap point it concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SheetEvent {
    /// A settle toward this point is about to start.
    WillMove(SnapPoint),
    /// The sheet came to rest on this point.
    DidMove(SnapPoint),
}

impl SheetEvent {
    /// The snap point the event concerns.
    #[must_use]
    pub fn snap_point(&self) -> SnapPoint {
        match *self {
            Self::WillMove(p) | Self::DidMove(p) => p,
        }
    }
}

/// What a gesture sample did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOutcome {
    /// Swallowed: inside the deadzone, before layout, or out of sequence.
    Ignored,
    /// The sheet consumed the sample.
    SheetMoved,
    /// The embedded scrollable consumed the sample; the sheet held still.
    ScrollableMoved,
    /// The gesture ended and a settle was committed.
    Released,
}

/// Observer closure receiving events as they happen.
pub type SheetObserver = Box<dyn FnMut(&SheetEvent)>;

/// Event fan-out: observer plus drainable queue.
#[derive(Default)]
pub(crate) struct SheetEvents {
    observer: Option<SheetObserver>,
    queue: Vec<SheetEvent>,
}

impl std::fmt::Debug for SheetEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetEvents")
            .field("has_observer", &self.observer.is_some())
            .field("queued", &self.queue.len())
            .finish()
    }
}

impl SheetEvents {
    pub(crate) fn set_observer(&mut self, observer: SheetObserver) {
        self.observer = Some(observer);
    }

    pub(crate) fn emit(&mut self, event: SheetEvent) {
        if let Some(observer) = self.observer.as_mut() {
            observer(&event);
        }
        self.queue.push(event);
    }

    pub(crate) fn drain(&mut self) -> Vec<SheetEvent> {
        std::mem::take(&mut self.queue)
    }

    pub(crate) fn pending(&self) -> usize {
        self.queue.len()
    }
}
