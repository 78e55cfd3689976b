//! # Metric instruments.
//!
//! A [`Meter`] creates instruments by name; creation may fail, in which case the caller
//! logs the [`TelemetryError`] and runs without that instrument.
//!
//! All instruments are shared across concurrently running routines and must be safe for
//! concurrent use.

use std::sync::Arc;

use super::attribute::KeyValue;
use crate::error::TelemetryError;

/// Monotonic counter.
pub trait Counter: Send + Sync + 'static {
    fn add(&self, value: u64, attrs: &[KeyValue]);
}

/// Counter that can go up and down (e.g. currently running routines).
pub trait UpDownCounter: Send + Sync + 'static {
    fn add(&self, value: i64, attrs: &[KeyValue]);
}

/// Distribution of recorded values.
pub trait Histogram: Send + Sync + 'static {
    fn record(&self, value: u64, attrs: &[KeyValue]);
}

/// Factory for metric instruments.
pub trait Meter: Send + Sync + 'static {
    fn counter(&self, name: &str, description: &str) -> Result<Arc<dyn Counter>, TelemetryError>;

    fn up_down_counter(
        &self,
        name: &str,
        description: &str,
    ) -> Result<Arc<dyn UpDownCounter>, TelemetryError>;

    fn histogram(
        &self,
        name: &str,
        description: &str,
    ) -> Result<Arc<dyn Histogram>, TelemetryError>;
}

/// Meter whose instruments discard everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopMeter;

/// Instrument that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopInstrument;

impl Counter for NoopInstrument {
    fn add(&self, _value: u64, _attrs: &[KeyValue]) {}
}

impl UpDownCounter for NoopInstrument {
    fn add(&self, _value: i64, _attrs: &[KeyValue]) {}
}

impl Histogram for NoopInstrument {
    fn record(&self, _value: u64, _attrs: &[KeyValue]) {}
}

impl Meter for NoopMeter {
    fn counter(&self, _name: &str, _description: &str) -> Result<Arc<dyn Counter>, TelemetryError> {
        Ok(Arc::new(NoopInstrument))
    }

    fn up_down_counter(
        &self,
        _name: &str,
        _description: &str,
    ) -> Result<Arc<dyn UpDownCounter>, TelemetryError> {
        Ok(Arc::new(NoopInstrument))
    }

    fn histogram(
        &self,
        _name: &str,
        _description: &str,
    ) -> Result<Arc<dyn Histogram>, TelemetryError> {
        Ok(Arc::new(NoopInstrument))
    }
}
