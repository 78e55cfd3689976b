//! # Telemetry sink contract.
//!
//! Routines and channels never talk to a metrics or tracing backend directly. They consume
//! these capability traits, injected as `Arc<dyn _>` through their options:
//!
//! ```text
//! Meter ──► Counter        (channel sends, routine totals)
//!       ──► UpDownCounter  (running routines)
//!       ──► Histogram      (send / run duration, ms)
//! Tracer ─► Span ──► add_event / trace_id / end
//! ```
//!
//! ## Provided implementations
//! - [`NoopMeter`], [`NoopTracer`]: absence of a sink, silently discard
//! - [`TracingTracer`]: bridges spans into `tracing`
//! - [`InMemoryMeter`], [`RecordingTracer`]: keep everything for assertions
//!
//! ## Rules
//! - Instrument creation failure is **never fatal**: it is logged, reported as
//!   [`EventKind::TelemetryInitFailed`](crate::EventKind::TelemetryInitFailed), and that one
//!   instrument stays unset.
//! - Implementations must be safe for concurrent use; instruments are created once and then
//!   shared by every run.

mod attribute;
mod memory;
mod meter;
mod tracer;

pub use attribute::{AttrValue, KeyValue, find};
pub use memory::{InMemoryMeter, Measurement, RecordingTracer, SpanRecord};
pub use meter::{Counter, Histogram, Meter, NoopInstrument, NoopMeter, UpDownCounter};
pub use tracer::{NoopTracer, Span, Tracer, TracingTracer};

pub(crate) use attribute::render;

use crate::error::TelemetryError;
use crate::events::{Bus, Event};

/// Unwraps an instrument creation result, degrading failures to `None`.
pub(crate) fn init_or_degrade<T>(
    owner: &str,
    bus: Option<&Bus>,
    created: Result<T, TelemetryError>,
) -> Option<T> {
    match created {
        Ok(instrument) => Some(instrument),
        Err(err) => {
            tracing::error!(
                owner = %owner,
                instrument = %err.instrument(),
                error = %err,
                "failed to initialize telemetry instrument"
            );
            if let Some(bus) = bus {
                bus.publish(Event::telemetry_init_failed(owner, &err));
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[test]
    fn test_failure_degrades_and_reports() {
        let bus = Bus::default();
        let mut rx = bus.subscribe();

        let meter = InMemoryMeter::failing();
        let counter = init_or_degrade("worker", Some(&bus), meter.counter("c", ""));
        assert!(counter.is_none());

        let ev = rx.try_recv().unwrap();
        assert_eq!(ev.kind, EventKind::TelemetryInitFailed);
        assert_eq!(ev.routine.as_deref(), Some("worker"));
    }

    #[test]
    fn test_success_passes_through() {
        let meter = NoopMeter;
        assert!(init_or_degrade("worker", None, meter.histogram("h", "")).is_some());
    }
}
