//! # Channel configuration.
//!
//! [`ChannelOptions`] is consumed by [`Channel::with_options`](crate::Channel::with_options);
//! instruments are created once at construction and never changed afterwards.
//!
//! ## Defaults
//! | Option                    | Default                                            |
//! |---------------------------|----------------------------------------------------|
//! | `capacity`                | `0` (rendezvous)                                   |
//! | `telemetry_enabled`       | `OTEL_ENABLED == "true"`                           |
//! | `meter` / `tracer`        | none (no-op / `tracing` when telemetry is enabled) |
//! | counter name              | `funcy.channel.sent.count`                         |
//! | histogram name            | `funcy.channel.sent.duration`                      |
//! | `value_events_enabled`    | `FUNCY_CHANNEL_VALUE_EVENTS_ENABLED == "true"`     |
//! | `value_attribute_enabled` | `FUNCY_CHANNEL_VALUE_ATTRIBUTE_ENABLED == "true"`  |
//!
//! The value attribute additionally needs an encoder: install one with
//! [`with_json_values`](ChannelOptions::with_json_values) (any `T: Serialize`) or
//! [`with_value_encoder`](ChannelOptions::with_value_encoder).

use std::borrow::Cow;
use std::sync::Arc;

use serde::Serialize;

use crate::config::{CHANNEL_SENT_COUNT_NAME, CHANNEL_SENT_DURATION_NAME, Defaults};
use crate::events::Bus;
use crate::telemetry::{Meter, NoopMeter, Tracer, TracingTracer};

/// Renders a value for the `value` span-event attribute; `None` skips the attribute.
pub type ValueEncoder<T> = fn(&T) -> Option<String>;

/// Configuration for one [`Channel`](crate::Channel).
///
/// ## Example
/// ```
/// use funcy::{Channel, ChannelOptions};
///
/// let ch: Channel<String> = Channel::with_options(
///     ChannelOptions::new()
///         .with_name("greetings")
///         .with_capacity(2)
///         .with_value_events_enabled(true)
///         .with_json_values(),
/// );
/// assert_eq!(ch.capacity(), 2);
/// ```
pub struct ChannelOptions<T> {
    pub(crate) name: Option<Cow<'static, str>>,
    pub(crate) capacity: usize,
    pub(crate) telemetry_enabled: bool,
    pub(crate) meter: Option<Arc<dyn Meter>>,
    pub(crate) tracer: Option<Arc<dyn Tracer>>,
    pub(crate) counter_name: Cow<'static, str>,
    pub(crate) histogram_name: Cow<'static, str>,
    pub(crate) value_events_enabled: bool,
    pub(crate) value_attribute_enabled: bool,
    pub(crate) encoder: Option<ValueEncoder<T>>,
    pub(crate) bus: Option<Bus>,
}

impl<T> ChannelOptions<T> {
    /// Creates options seeded from the process environment.
    pub fn new() -> Self {
        Self::from_defaults(Defaults::from_env())
    }

    /// Creates options seeded from explicit defaults.
    pub fn from_defaults(defaults: Defaults) -> Self {
        Self {
            name: None,
            capacity: 0,
            telemetry_enabled: defaults.telemetry_enabled,
            meter: None,
            tracer: None,
            counter_name: Cow::Borrowed(CHANNEL_SENT_COUNT_NAME),
            histogram_name: Cow::Borrowed(CHANNEL_SENT_DURATION_NAME),
            value_events_enabled: defaults.value_events_enabled,
            value_attribute_enabled: defaults.value_attribute_enabled,
            encoder: None,
            bus: None,
        }
    }

    /// Name used in logs and lifecycle events.
    pub fn with_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Buffer size; `0` makes every send a rendezvous with a receiver.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
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

    pub fn with_counter_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.counter_name = name.into();
        self
    }

    pub fn with_histogram_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.histogram_name = name.into();
        self
    }

    /// Adds one `value` event per sent value to the send span.
    pub fn with_value_events_enabled(mut self, enabled: bool) -> Self {
        self.value_events_enabled = enabled;
        self
    }

    /// Attaches the encoded value to each `value` event (requires an encoder).
    pub fn with_value_attribute_enabled(mut self, enabled: bool) -> Self {
        self.value_attribute_enabled = enabled;
        self
    }

    pub fn with_value_encoder(mut self, encoder: ValueEncoder<T>) -> Self {
        self.encoder = Some(encoder);
        self
    }

    /// Publishes [`ChannelClosed`](crate::EventKind::ChannelClosed) and telemetry failures to `bus`.
    pub fn with_bus(mut self, bus: Bus) -> Self {
        self.bus = Some(bus);
        self
    }

    pub(crate) fn effective_meter(&self) -> Option<Arc<dyn Meter>> {
        match (&self.meter, self.telemetry_enabled) {
            (Some(meter), _) => Some(Arc::clone(meter)),
            (None, true) => Some(Arc::new(NoopMeter)),
            (None, false) => None,
        }
    }

    pub(crate) fn effective_tracer(&self) -> Option<Arc<dyn Tracer>> {
        match (&self.tracer, self.telemetry_enabled) {
            (Some(tracer), _) => Some(Arc::clone(tracer)),
            (None, true) => Some(Arc::new(TracingTracer)),
            (None, false) => None,
        }
    }
}

impl<T: Serialize> ChannelOptions<T> {
    /// Encodes values as JSON for the `value` attribute.
    pub fn with_json_values(self) -> Self {
        self.with_value_encoder(encode_json::<T>)
    }
}

impl<T> Default for ChannelOptions<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn encode_json<T: Serialize>(value: &T) -> Option<String> {
    serde_json::to_string(value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Reading {
        sensor: &'static str,
        celsius: i32,
    }

    #[test]
    fn test_json_encoder() {
        let opts = ChannelOptions::<Reading>::from_defaults(Defaults::default()).with_json_values();
        let encode = opts.encoder.unwrap();
        assert_eq!(
            encode(&Reading {
                sensor: "a1",
                celsius: 21
            })
            .as_deref(),
            Some(r#"{"sensor":"a1","celsius":21}"#)
        );
    }

    #[test]
    fn test_env_toggles_seed_value_tracing() {
        let opts = ChannelOptions::<u8>::from_defaults(Defaults {
            telemetry_enabled: false,
            value_events_enabled: true,
            value_attribute_enabled: true,
        });
        assert!(opts.value_events_enabled);
        assert!(opts.value_attribute_enabled);
        assert!(opts.encoder.is_none());
        assert!(opts.effective_meter().is_none());
        assert_eq!(opts.capacity, 0);
    }
}
