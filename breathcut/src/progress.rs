//! Progress reporting for long-running operations
//!
//! Pipeline functions take any [`ProgressSink`]; closures work directly.
//! Sessions hand workers a [`ProgressReporter`] that forwards onto the
//! session's EventBus.

use breathcut_common::events::{EventBus, Operation, SessionEvent};
use chrono::Utc;
use uuid::Uuid;

/// Receiver of percent-complete updates (0.0 - 100.0)
pub trait ProgressSink {
    fn report(&mut self, percent: f32);
}

impl<F> ProgressSink for F
where
    F: FnMut(f32),
{
    fn report(&mut self, percent: f32) {
        self(percent)
    }
}

/// Sink that discards every update
pub fn ignore_progress(_percent: f32) {}

/// Forwards progress of one operation to an EventBus
///
/// Clamps to [0, 100], never reports a lower value than it already has, and
/// only emits when the whole-number percent changes. Create one per
/// operation; progress starts over with the next operation.
pub struct ProgressReporter {
    bus: EventBus,
    session_id: Uuid,
    operation: Operation,
    last_percent: Option<u8>,
}

impl ProgressReporter {
    pub fn new(bus: EventBus, session_id: Uuid, operation: Operation) -> Self {
        Self {
            bus,
            session_id,
            operation,
            last_percent: None,
        }
    }

    /// Last whole percent emitted, if any
    pub fn last_percent(&self) -> Option<u8> {
        self.last_percent
    }
}

impl ProgressSink for ProgressReporter {
    fn report(&mut self, percent: f32) {
        if percent.is_nan() {
            return;
        }
        let percent = percent.clamp(0.0, 100.0) as u8;
        if let Some(last) = self.last_percent {
            if percent <= last {
                return;
            }
        }
        self.last_percent = Some(percent);
        self.bus.emit_lossy(SessionEvent::Progress {
            session_id: self.session_id,
            operation: self.operation,
            percent,
            timestamp: Utc::now(),
        });
    }
}

/// Emits a linear `start..end` progress range over `total` steps
///
/// Reports roughly every 5% of the steps plus the final one, so tight loops
/// don't pay for a sink call per element.
pub(crate) struct StagedProgress {
    start: f32,
    end: f32,
    total: usize,
    stride: usize,
}

impl StagedProgress {
    pub(crate) fn new(start: f32, end: f32, total: usize) -> Self {
        Self {
            start,
            end,
            total,
            stride: (total / 20).max(1),
        }
    }

    /// Report completion of `done` steps out of `total`
    pub(crate) fn step<P: ProgressSink + ?Sized>(&self, sink: &mut P, done: usize) {
        if self.total == 0 || (done % self.stride != 0 && done != self.total) {
            return;
        }
        let fraction = done.min(self.total) as f32 / self.total as f32;
        sink.report(self.start + (self.end - self.start) * fraction);
    }
}
