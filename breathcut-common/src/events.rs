//! Event types for session progress reporting
//!
//! Provides the SessionEvent enum and the EventBus that carries it from
//! background workers back to whoever drives a processing session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Long-running operations a session performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Container bytes to sample buffer
    Decode,
    /// Energy analysis and breath detection
    Analyze,
    /// Breath excision and buffer reconstruction
    Remove,
    /// Sample buffer to WAV bytes
    Encode,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Decode => "decode",
            Operation::Analyze => "analyze",
            Operation::Remove => "remove",
            Operation::Encode => "encode",
        };
        f.write_str(name)
    }
}

/// Session event types
///
/// Events are broadcast via EventBus and can be serialized for any
/// outer surface (terminal, IPC, web).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    /// An operation was handed to a background worker
    OperationStarted {
        session_id: Uuid,
        operation: Operation,
        timestamp: DateTime<Utc>,
    },

    /// Operation progress in percent (0-100)
    ///
    /// Non-decreasing within one operation; starts over with the next one.
    Progress {
        session_id: Uuid,
        operation: Operation,
        percent: u8,
        timestamp: DateTime<Utc>,
    },

    /// Operation finished successfully
    OperationCompleted {
        session_id: Uuid,
        operation: Operation,
        /// Wall-clock time spent in the operation
        elapsed_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// Operation failed; session state is unchanged
    OperationFailed {
        session_id: Uuid,
        operation: Operation,
        message: String,
        timestamp: DateTime<Utc>,
    },
}

impl SessionEvent {
    /// Session that produced this event
    pub fn session_id(&self) -> Uuid {
        match self {
            SessionEvent::OperationStarted { session_id, .. }
            | SessionEvent::Progress { session_id, .. }
            | SessionEvent::OperationCompleted { session_id, .. }
            | SessionEvent::OperationFailed { session_id, .. } => *session_id,
        }
    }

    /// Operation this event belongs to
    pub fn operation(&self) -> Operation {
        match self {
            SessionEvent::OperationStarted { operation, .. }
            | SessionEvent::Progress { operation, .. }
            | SessionEvent::OperationCompleted { operation, .. }
            | SessionEvent::OperationFailed { operation, .. } => *operation,
        }
    }
}

/// Broadcast bus for session events
///
/// Cheap to clone; clones share the same channel, so a background worker can
/// hold one while the session keeps its own.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SessionEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before slow receivers start lagging
    ///
    /// # Examples
    ///
    /// ```
    /// use breathcut_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(256);
    /// assert_eq!(event_bus.capacity(), 256);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: SessionEvent,
    ) -> Result<usize, broadcast::error::SendError<SessionEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: SessionEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(percent: u8) -> SessionEvent {
        SessionEvent::Progress {
            session_id: Uuid::nil(),
            operation: Operation::Analyze,
            percent,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_emit_without_subscribers_fails() {
        let bus = EventBus::new(8);
        assert!(bus.emit(progress(10)).is_err());
        // Lossy variant never fails
        bus.emit_lossy(progress(10));
    }

    #[tokio::test]
    async fn test_subscriber_receives_events_in_order() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        bus.emit(progress(10)).unwrap();
        bus.emit(progress(40)).unwrap();

        match rx.recv().await.unwrap() {
            SessionEvent::Progress { percent, .. } => assert_eq!(percent, 10),
            other => panic!("unexpected event {:?}", other),
        }
        match rx.recv().await.unwrap() {
            SessionEvent::Progress { percent, .. } => assert_eq!(percent, 40),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let json = serde_json::to_value(progress(55)).unwrap();
        assert_eq!(json["type"], "Progress");
        assert_eq!(json["operation"], "analyze");
        assert_eq!(json["percent"], 55);
    }

    #[test]
    fn test_accessors() {
        let event = SessionEvent::OperationFailed {
            session_id: Uuid::nil(),
            operation: Operation::Remove,
            message: "no buffer".to_string(),
            timestamp: Utc::now(),
        };
        assert_eq!(event.session_id(), Uuid::nil());
        assert_eq!(event.operation(), Operation::Remove);
        assert_eq!(Operation::Remove.to_string(), "remove");
    }
}
