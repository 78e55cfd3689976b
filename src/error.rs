//! Error types raised by the channel and telemetry layers.
//!
//! This module defines three enums:
//!
//! - [`ChannelError`]: the only error a [`Channel`](crate::Channel) ever reports to callers.
//! - [`TelemetryError`]: a recorder could not be created; always contained and logged,
//!   never propagated into the data path.
//! - [`RoutineError`]: a routine ended without returning (panic, or dropped by its runtime);
//!   reported by [`RoutineHandle::join`](crate::RoutineHandle::join).
//!
//! Errors returned by a routine's own unit of work are *not* wrapped here: they reach the
//! [`RoutineHandle`](crate::RoutineHandle) verbatim.

use std::sync::Arc;

use thiserror::Error;

/// # Errors produced by an instrumented channel.
///
/// Returned synchronously by [`Channel::send`](crate::Channel::send) and never retried internally.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelError {
    /// Send attempted after, or concurrently with, [`Channel::close`](crate::Channel::close).
    #[error("channel closed")]
    Closed,
}

impl ChannelError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use funcy::ChannelError;
    ///
    /// assert_eq!(ChannelError::Closed.as_label(), "channel_closed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ChannelError::Closed => "channel_closed",
        }
    }
}

/// # Errors produced while creating telemetry recorders.
///
/// A failing [`Meter`](crate::telemetry::Meter) degrades that one recorder to "unset";
/// the routine or channel keeps working without it.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TelemetryError {
    /// The meter does not provide this kind of instrument.
    #[error("instrument {name:?} is not supported by this meter")]
    Unsupported {
        /// Requested instrument name.
        name: String,
    },

    /// The meter refused to create the instrument.
    #[error("instrument {name:?} rejected: {reason}")]
    Rejected {
        /// Requested instrument name.
        name: String,
        /// Backend-provided reason.
        reason: String,
    },
}

impl TelemetryError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TelemetryError::Unsupported { .. } => "telemetry_unsupported",
            TelemetryError::Rejected { .. } => "telemetry_rejected",
        }
    }

    /// Returns the instrument name this error refers to.
    pub fn instrument(&self) -> &str {
        match self {
            TelemetryError::Unsupported { name } | TelemetryError::Rejected { name, .. } => name,
        }
    }
}

/// # Abnormal routine endings.
///
/// Returned by [`RoutineHandle::join`](crate::RoutineHandle::join) when the unit of work
/// produced no result of its own.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoutineError {
    /// The unit of work panicked.
    #[error("routine {name} panicked: {message}")]
    Panicked {
        /// Routine name.
        name: Arc<str>,
        /// Panic message (`"unknown panic"` for non-string payloads).
        message: String,
    },

    /// The runtime dropped the routine before it finished (e.g. runtime shutdown).
    #[error("routine {name} was dropped before reporting")]
    Dropped {
        /// Routine name.
        name: Arc<str>,
    },
}

impl RoutineError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RoutineError::Panicked { .. } => "routine_panicked",
            RoutineError::Dropped { .. } => "routine_dropped",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_stable() {
        assert_eq!(ChannelError::Closed.as_label(), "channel_closed");
        let err = TelemetryError::Rejected {
            name: "funcy.routine.count".into(),
            reason: "quota".into(),
        };
        assert_eq!(err.as_label(), "telemetry_rejected");
        assert_eq!(err.instrument(), "funcy.routine.count");
    }

    #[test]
    fn test_display_mentions_instrument() {
        let err = TelemetryError::Unsupported {
            name: "funcy.routine.running".into(),
        };
        assert!(err.to_string().contains("funcy.routine.running"));
        assert_eq!(ChannelError::Closed.to_string(), "channel closed");
    }

    #[test]
    fn test_routine_error_display() {
        let err = RoutineError::Dropped {
            name: Arc::from("worker"),
        };
        assert_eq!(err.to_string(), "routine worker was dropped before reporting");
        assert_eq!(err.as_label(), "routine_dropped");
    }
}
