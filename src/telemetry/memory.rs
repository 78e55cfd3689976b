//! # In-memory recorders.
//!
//! [`InMemoryMeter`] and [`RecordingTracer`] keep everything they receive so tests and
//! debugging sessions can assert on exact metric values and span contents.
//!
//! ```
//! use std::sync::Arc;
//! use funcy::telemetry::{InMemoryMeter, Meter};
//!
//! let meter = InMemoryMeter::new();
//! let counter = meter.counter("hits", "").unwrap();
//! counter.add(2, &[]);
//! counter.add(3, &[]);
//! assert_eq!(meter.counter_total("hits"), 5);
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;

use super::attribute::KeyValue;
use super::meter::{Counter, Histogram, Meter, UpDownCounter};
use super::tracer::{Span, Tracer};
use crate::error::TelemetryError;

/// One recorded measurement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Measurement<V> {
    pub value: V,
    pub attrs: Vec<KeyValue>,
}

#[derive(Default)]
struct MeterState {
    counters: HashMap<String, Vec<Measurement<u64>>>,
    up_down: HashMap<String, Vec<Measurement<i64>>>,
    histograms: HashMap<String, Vec<Measurement<u64>>>,
}

/// Meter that stores every measurement, grouped by instrument name.
///
/// Clones share the same storage.
#[derive(Clone, Default)]
pub struct InMemoryMeter {
    state: Arc<Mutex<MeterState>>,
    rejected: Arc<HashSet<String>>,
    reject_all: bool,
}

impl InMemoryMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A meter that refuses to create any instrument.
    pub fn failing() -> Self {
        Self {
            reject_all: true,
            ..Self::default()
        }
    }

    /// A meter that refuses to create the named instruments only.
    pub fn rejecting<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rejected: Arc::new(names.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Sum of all increments of counter `name`.
    pub fn counter_total(&self, name: &str) -> u64 {
        self.state
            .lock()
            .counters
            .get(name)
            .map(|ms| ms.iter().map(|m| m.value).sum())
            .unwrap_or(0)
    }

    /// Current value of up-down counter `name`.
    pub fn up_down_value(&self, name: &str) -> i64 {
        self.state
            .lock()
            .up_down
            .get(name)
            .map(|ms| ms.iter().map(|m| m.value).sum())
            .unwrap_or(0)
    }

    /// All measurements of up-down counter `name`, in arrival order.
    pub fn up_down_measurements(&self, name: &str) -> Vec<Measurement<i64>> {
        self.state.lock().up_down.get(name).cloned().unwrap_or_default()
    }

    /// All measurements of counter `name`, in arrival order.
    pub fn counter_measurements(&self, name: &str) -> Vec<Measurement<u64>> {
        self.state.lock().counters.get(name).cloned().unwrap_or_default()
    }

    /// All records of histogram `name`, in arrival order.
    pub fn histogram_records(&self, name: &str) -> Vec<Measurement<u64>> {
        self.state
            .lock()
            .histograms
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    fn admit(&self, name: &str) -> Result<(), TelemetryError> {
        if self.reject_all || self.rejected.contains(name) {
            return Err(TelemetryError::Rejected {
                name: name.to_string(),
                reason: "rejected by in-memory meter".to_string(),
            });
        }
        Ok(())
    }
}

struct MemoryInstrument {
    name: String,
    state: Arc<Mutex<MeterState>>,
}

impl Counter for MemoryInstrument {
    fn add(&self, value: u64, attrs: &[KeyValue]) {
        self.state
            .lock()
            .counters
            .entry(self.name.clone())
            .or_default()
            .push(Measurement {
                value,
                attrs: attrs.to_vec(),
            });
    }
}

impl UpDownCounter for MemoryInstrument {
    fn add(&self, value: i64, attrs: &[KeyValue]) {
        self.state
            .lock()
            .up_down
            .entry(self.name.clone())
            .or_default()
            .push(Measurement {
                value,
                attrs: attrs.to_vec(),
            });
    }
}

impl Histogram for MemoryInstrument {
    fn record(&self, value: u64, attrs: &[KeyValue]) {
        self.state
            .lock()
            .histograms
            .entry(self.name.clone())
            .or_default()
            .push(Measurement {
                value,
                attrs: attrs.to_vec(),
            });
    }
}

impl InMemoryMeter {
    fn instrument(&self, name: &str) -> Result<Arc<MemoryInstrument>, TelemetryError> {
        self.admit(name)?;
        Ok(Arc::new(MemoryInstrument {
            name: name.to_string(),
            state: Arc::clone(&self.state),
        }))
    }
}

impl Meter for InMemoryMeter {
    fn counter(&self, name: &str, _description: &str) -> Result<Arc<dyn Counter>, TelemetryError> {
        Ok(self.instrument(name)?)
    }

    fn up_down_counter(
        &self,
        name: &str,
        _description: &str,
    ) -> Result<Arc<dyn UpDownCounter>, TelemetryError> {
        Ok(self.instrument(name)?)
    }

    fn histogram(
        &self,
        name: &str,
        _description: &str,
    ) -> Result<Arc<dyn Histogram>, TelemetryError> {
        Ok(self.instrument(name)?)
    }
}

/// A finished (or still open) span captured by [`RecordingTracer`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpanRecord {
    pub name: String,
    pub attrs: Vec<KeyValue>,
    pub events: Vec<(String, Vec<KeyValue>)>,
    pub trace_id: String,
    pub ended: bool,
}

/// Tracer that keeps every span it starts.
///
/// Trace ids are sequential (`"0000000000000001"`, ...). Clones share the same storage.
#[derive(Clone, Default)]
pub struct RecordingTracer {
    spans: Arc<Mutex<Vec<SpanRecord>>>,
}

impl RecordingTracer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all spans in start order.
    pub fn spans(&self) -> Vec<SpanRecord> {
        self.spans.lock().clone()
    }

    /// Spans named `name`, in start order.
    pub fn spans_named(&self, name: &str) -> Vec<SpanRecord> {
        self.spans
            .lock()
            .iter()
            .filter(|s| s.name == name)
            .cloned()
            .collect()
    }
}

struct RecordedSpan {
    index: usize,
    trace_id: String,
    spans: Arc<Mutex<Vec<SpanRecord>>>,
}

impl Span for RecordedSpan {
    fn add_event(&mut self, name: &str, attrs: &[KeyValue]) {
        if let Some(record) = self.spans.lock().get_mut(self.index) {
            record.events.push((name.to_string(), attrs.to_vec()));
        }
    }

    fn trace_id(&self) -> Option<String> {
        Some(self.trace_id.clone())
    }

    fn end(self: Box<Self>) {
        if let Some(record) = self.spans.lock().get_mut(self.index) {
            record.ended = true;
        }
    }
}

impl Tracer for RecordingTracer {
    fn start(&self, name: &str, attrs: &[KeyValue]) -> Box<dyn Span> {
        let mut spans = self.spans.lock();
        let index = spans.len();
        let trace_id = format!("{:016x}", index + 1);
        spans.push(SpanRecord {
            name: name.to_string(),
            attrs: attrs.to_vec(),
            events: Vec::new(),
            trace_id: trace_id.clone(),
            ended: false,
        });
        Box::new(RecordedSpan {
            index,
            trace_id,
            spans: Arc::clone(&self.spans),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_up_down_counter_nets_out() {
        let meter = InMemoryMeter::new();
        let running = meter.up_down_counter("running", "").unwrap();
        running.add(1, &[]);
        running.add(1, &[]);
        running.add(-1, &[]);
        assert_eq!(meter.up_down_value("running"), 1);
        assert_eq!(meter.up_down_measurements("running").len(), 3);
    }

    #[test]
    fn test_rejecting_meter_only_rejects_named() {
        let meter = InMemoryMeter::rejecting(["bad"]);
        assert!(meter.histogram("bad", "").is_err());
        assert!(meter.histogram("good", "").is_ok());
        assert!(InMemoryMeter::failing().counter("any", "").is_err());
    }

    #[test]
    fn test_recording_tracer_keeps_events() {
        let tracer = RecordingTracer::new();
        let mut span = tracer.start("send", &[KeyValue::int("num", 2)]);
        span.add_event("value", &[]);
        span.add_event("value", &[]);
        assert_eq!(span.trace_id().as_deref(), Some("0000000000000001"));
        span.end();

        let spans = tracer.spans_named("send");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].events.len(), 2);
        assert!(spans[0].ended);
    }
}
