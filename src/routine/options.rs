//! # Routine configuration.
//!
//! [`GoOptions`] is a plain configuration bundle, built with a fluent API and consumed by
//! [`go_with`](crate::go_with). It is frozen the moment the routine is spawned.
//!
//! ## Defaults
//! | Option               | Default                                            |
//! |----------------------|----------------------------------------------------|
//! | `name`               | generated from the call site                       |
//! | `context`            | [`Context::background`]                            |
//! | `log_level`          | `DEBUG`                                            |
//! | `telemetry_enabled`  | `OTEL_ENABLED == "true"`                           |
//! | `meter`              | none (no-op when telemetry is enabled)             |
//! | `tracer`             | none ([`TracingTracer`] when telemetry is enabled) |
//! | total counter        | on, `funcy.routine.count`                          |
//! | running counter      | on, `funcy.routine.running`                        |
//! | duration histogram   | on, `funcy.routine.duration`                       |
//! | `bus`                | none                                               |
//!
//! Recorders are only created when telemetry is enabled **or** a meter/tracer was injected
//! explicitly.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use tracing::Level;

use crate::config::{
    Defaults, ROUTINE_COUNT_NAME, ROUTINE_DURATION_NAME, ROUTINE_RUNNING_NAME,
};
use crate::context::Context;
use crate::events::Bus;
use crate::telemetry::{Meter, NoopMeter, Tracer, TracingTracer};

/// Toggle and name of one routine instrument.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstrumentOptions {
    pub enabled: bool,
    pub name: Cow<'static, str>,
}

impl InstrumentOptions {
    fn on(name: &'static str) -> Self {
        Self {
            enabled: true,
            name: Cow::Borrowed(name),
        }
    }
}

/// Configuration for one spawned routine.
///
/// ## Example
/// ```
/// use funcy::{Context, GoOptions};
/// use tracing::Level;
///
/// let opts = GoOptions::new()
///     .with_name("producer")
///     .with_context(Context::root())
///     .with_log_level(Level::INFO)
///     .with_duration_histogram(false);
///
/// assert_eq!(opts.name(), Some("producer"));
/// ```
#[derive(Clone)]
pub struct GoOptions {
    pub(crate) name: Option<Cow<'static, str>>,
    pub(crate) context: Option<Context>,
    pub(crate) log_level: Level,
    pub(crate) telemetry_enabled: bool,
    pub(crate) meter: Option<Arc<dyn Meter>>,
    pub(crate) tracer: Option<Arc<dyn Tracer>>,
    pub(crate) total_counter: InstrumentOptions,
    pub(crate) running_counter: InstrumentOptions,
    pub(crate) duration_histogram: InstrumentOptions,
    pub(crate) bus: Option<Bus>,
}

impl GoOptions {
    /// Creates options seeded from the process environment.
    pub fn new() -> Self {
        Self::from_defaults(Defaults::from_env())
    }

    /// Creates options seeded from explicit defaults.
    pub fn from_defaults(defaults: Defaults) -> Self {
        Self {
            name: None,
            context: None,
            log_level: Level::DEBUG,
            telemetry_enabled: defaults.telemetry_enabled,
            meter: None,
            tracer: None,
            total_counter: InstrumentOptions::on(ROUTINE_COUNT_NAME),
            running_counter: InstrumentOptions::on(ROUTINE_RUNNING_NAME),
            duration_histogram: InstrumentOptions::on(ROUTINE_DURATION_NAME),
            bus: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Base context the routine's context is derived from.
    pub fn with_context(mut self, ctx: Context) -> Self {
        self.context = Some(ctx);
        self
    }

    /// Severity of the "starting" / "exiting" log lines.
    pub fn with_log_level(mut self, level: Level) -> Self {
        self.log_level = level;
        self
    }

    pub fn with_telemetry_enabled(mut self, enabled: bool) -> Self {
        self.telemetry_enabled = enabled;
        self
    }

    pub fn with_meter(mut self, meter: Arc<dyn Meter>) -> Self {
        self.meter = Some(meter);
        self
    }

    pub fn with_tracer(mut self, tracer: Arc<dyn Tracer>) -> Self {
        self.tracer = Some(tracer);
        self
    }

    pub fn with_total_counter(mut self, enabled: bool) -> Self {
        self.total_counter.enabled = enabled;
        self
    }

    pub fn with_total_counter_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.total_counter.name = name.into();
        self
    }

    pub fn with_running_counter(mut self, enabled: bool) -> Self {
        self.running_counter.enabled = enabled;
        self
    }

    pub fn with_running_counter_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.running_counter.name = name.into();
        self
    }

    pub fn with_duration_histogram(mut self, enabled: bool) -> Self {
        self.duration_histogram.enabled = enabled;
        self
    }

    pub fn with_duration_histogram_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.duration_histogram.name = name.into();
        self
    }

    /// Publishes lifecycle events to `bus`.
    pub fn with_bus(mut self, bus: Bus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Returns the explicit name, if one was set.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Meter used for this run: the injected one, or a no-op when telemetry is enabled.
    pub(crate) fn effective_meter(&self) -> Option<Arc<dyn Meter>> {
        match (&self.meter, self.telemetry_enabled) {
            (Some(meter), _) => Some(Arc::clone(meter)),
            (None, true) => Some(Arc::new(NoopMeter)),
            (None, false) => None,
        }
    }

    /// Tracer used for this run: the injected one, or `tracing` when telemetry is enabled.
    pub(crate) fn effective_tracer(&self) -> Option<Arc<dyn Tracer>> {
        match (&self.tracer, self.telemetry_enabled) {
            (Some(tracer), _) => Some(Arc::clone(tracer)),
            (None, true) => Some(Arc::new(TracingTracer)),
            (None, false) => None,
        }
    }
}

impl Default for GoOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GoOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoOptions")
            .field("name", &self.name)
            .field("context", &self.context)
            .field("log_level", &self.log_level)
            .field("telemetry_enabled", &self.telemetry_enabled)
            .field("meter", &self.meter.is_some())
            .field("tracer", &self.tracer.is_some())
            .field("total_counter", &self.total_counter)
            .field("running_counter", &self.running_counter)
            .field("duration_histogram", &self.duration_histogram)
            .field("bus", &self.bus.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::InMemoryMeter;

    #[test]
    fn test_defaults_without_telemetry() {
        let opts = GoOptions::from_defaults(Defaults::default());
        assert_eq!(opts.log_level, Level::DEBUG);
        assert!(opts.effective_meter().is_none());
        assert!(opts.effective_tracer().is_none());
        assert_eq!(opts.total_counter.name, ROUTINE_COUNT_NAME);
        assert_eq!(opts.running_counter.name, ROUTINE_RUNNING_NAME);
        assert_eq!(opts.duration_histogram.name, ROUTINE_DURATION_NAME);
    }

    #[test]
    fn test_enabled_telemetry_falls_back_to_defaults() {
        let opts = GoOptions::from_defaults(Defaults {
            telemetry_enabled: true,
            ..Defaults::default()
        });
        assert!(opts.effective_meter().is_some());
        assert!(opts.effective_tracer().is_some());
    }

    #[test]
    fn test_injected_meter_wins_even_when_disabled() {
        let opts = GoOptions::from_defaults(Defaults::default())
            .with_meter(Arc::new(InMemoryMeter::new()))
            .with_running_counter_name("jobs.running")
            .with_total_counter(false);
        assert!(opts.effective_meter().is_some());
        assert_eq!(opts.running_counter.name, "jobs.running");
        assert!(!opts.total_counter.enabled);
    }
}
