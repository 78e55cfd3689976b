//! # Lifecycle events emitted by routines and channels.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Routine events**: a spawned unit of work starting, exiting or panicking
//! - **Channel events**: a channel entering its closing state
//! - **Telemetry events**: a recorder that could not be created
//!
//! The [`Event`] struct carries additional metadata such as timestamps, routine lineage,
//! errors and durations.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use funcy::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::RoutineExiting)
//!     .with_routine("worker")
//!     .with_parent("root")
//!     .with_error("boom")
//!     .with_duration(Duration::from_millis(20));
//!
//! assert_eq!(ev.kind, EventKind::RoutineExiting);
//! assert_eq!(ev.routine.as_deref(), Some("worker"));
//! assert_eq!(ev.duration_ms, Some(20));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Routine events ===
    /// A routine was spawned and is about to run its unit of work.
    ///
    /// Sets:
    /// - `routine`: assigned routine name
    /// - `parent`: spawning routine name
    /// - `trace_id`: when a tracer is configured
    RoutineStarting,

    /// A routine's unit of work returned.
    ///
    /// Sets:
    /// - `routine`, `parent`, `trace_id`
    /// - `duration_ms`: wall-clock run time
    /// - `error`: the returned error, if any
    RoutineExiting,

    /// A routine's unit of work panicked.
    ///
    /// Sets:
    /// - `routine`, `parent`, `trace_id`
    /// - `duration_ms`: wall-clock run time until the panic
    /// - `error`: panic message
    RoutinePanicked,

    // === Channel events ===
    /// A channel transitioned to closing (first [`close`](crate::Channel::close) only).
    ///
    /// Sets:
    /// - `routine`: channel name, if one was configured
    ChannelClosed,

    // === Telemetry events ===
    /// A recorder could not be created and was left unset.
    ///
    /// Sets:
    /// - `routine`: owning routine or channel name
    /// - `error`: failure message
    TelemetryInitFailed,
}

/// Lifecycle event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Routine (or channel) name.
    pub routine: Option<Arc<str>>,
    /// Parent routine name.
    pub parent: Option<Arc<str>>,
    /// Error or panic message.
    pub error: Option<Arc<str>>,
    /// Elapsed run time in milliseconds (compact).
    pub duration_ms: Option<u32>,
    /// Trace correlation id of the routine span.
    pub trace_id: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            routine: None,
            parent: None,
            error: None,
            duration_ms: None,
            trace_id: None,
        }
    }

    /// Attaches a routine name.
    #[inline]
    pub fn with_routine(mut self, name: impl Into<Arc<str>>) -> Self {
        self.routine = Some(name.into());
        self
    }

    /// Attaches a parent routine name.
    #[inline]
    pub fn with_parent(mut self, name: impl Into<Arc<str>>) -> Self {
        self.parent = Some(name.into());
        self
    }

    /// Attaches an error message.
    #[inline]
    pub fn with_error(mut self, error: impl Into<Arc<str>>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Attaches a duration (stored as milliseconds).
    #[inline]
    pub fn with_duration(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.duration_ms = Some(ms);
        self
    }

    /// Attaches a trace correlation id.
    #[inline]
    pub fn with_trace_id(mut self, id: impl Into<Arc<str>>) -> Self {
        self.trace_id = Some(id.into());
        self
    }

    /// Creates a telemetry init failure event.
    #[inline]
    pub fn telemetry_init_failed(owner: &str, error: &crate::TelemetryError) -> Self {
        Event::new(EventKind::TelemetryInitFailed)
            .with_routine(owner)
            .with_error(format!("{}: {error}", error.as_label()))
    }

    #[inline]
    pub fn is_routine_exit(&self) -> bool {
        matches!(
            self.kind,
            EventKind::RoutineExiting | EventKind::RoutinePanicked
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TelemetryError;

    #[test]
    fn test_sequence_is_monotonic() {
        let a = Event::new(EventKind::RoutineStarting);
        let b = Event::new(EventKind::RoutineExiting);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_duration_saturates() {
        let ev = Event::new(EventKind::RoutineExiting).with_duration(Duration::MAX);
        assert_eq!(ev.duration_ms, Some(u32::MAX));
    }

    #[test]
    fn test_telemetry_failure_carries_label() {
        let err = TelemetryError::Unsupported {
            name: "funcy.routine.running".into(),
        };
        let ev = Event::telemetry_init_failed("worker", &err);
        assert_eq!(ev.kind, EventKind::TelemetryInitFailed);
        assert_eq!(ev.routine.as_deref(), Some("worker"));
        assert!(ev.error.as_deref().unwrap().starts_with("telemetry_unsupported"));
        assert!(!ev.is_routine_exit());
    }
}
