//! # Process-wide defaults.
//!
//! Provides [`Defaults`] the feature toggles that seed [`GoOptions`](crate::GoOptions) and
//! [`ChannelOptions`](crate::ChannelOptions) when they are constructed.
//!
//! Defaults are read from the environment **once per construction**; every toggle can be
//! overridden explicitly on the options afterwards.
//!
//! | Variable                                  | Toggle                    |
//! |-------------------------------------------|---------------------------|
//! | `OTEL_ENABLED`                            | `telemetry_enabled`       |
//! | `FUNCY_CHANNEL_VALUE_EVENTS_ENABLED`      | `value_events_enabled`    |
//! | `FUNCY_CHANNEL_VALUE_ATTRIBUTE_ENABLED`   | `value_attribute_enabled` |
//!
//! A toggle is on only when the variable equals `"true"`.

/// Environment variable enabling metrics and tracing.
pub const ENV_TELEMETRY_ENABLED: &str = "OTEL_ENABLED";
/// Environment variable enabling one span event per channel value.
pub const ENV_VALUE_EVENTS_ENABLED: &str = "FUNCY_CHANNEL_VALUE_EVENTS_ENABLED";
/// Environment variable enabling the serialized value attribute on span events.
pub const ENV_VALUE_ATTRIBUTE_ENABLED: &str = "FUNCY_CHANNEL_VALUE_ATTRIBUTE_ENABLED";

/// Default name of the total routine counter.
pub const ROUTINE_COUNT_NAME: &str = "funcy.routine.count";
/// Default name of the running routine up-down counter.
pub const ROUTINE_RUNNING_NAME: &str = "funcy.routine.running";
/// Default name of the routine duration histogram (milliseconds).
pub const ROUTINE_DURATION_NAME: &str = "funcy.routine.duration";
/// Default name of the channel send counter.
pub const CHANNEL_SENT_COUNT_NAME: &str = "funcy.channel.sent.count";
/// Default name of the channel send duration histogram (milliseconds).
pub const CHANNEL_SENT_DURATION_NAME: &str = "funcy.channel.sent.duration";

/// Feature toggles shared by routines and channels.
///
/// ## Field semantics
/// - `telemetry_enabled`: create recorders (and fall back to default sinks) when `true`
/// - `value_events_enabled`: channel spans get one `value` event per sent value
/// - `value_attribute_enabled`: those events carry the JSON-serialized value
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Defaults {
    /// Whether telemetry recorders are created.
    pub telemetry_enabled: bool,
    /// Whether channel spans record an event per value.
    pub value_events_enabled: bool,
    /// Whether value events carry the serialized value.
    pub value_attribute_enabled: bool,
}

impl Defaults {
    /// Reads all toggles from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads all toggles through `lookup`; used by [`from_env`](Self::from_env) and tests.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let flag = |key: &str| lookup(key).is_some_and(|v| v == "true");
        Self {
            telemetry_enabled: flag(ENV_TELEMETRY_ENABLED),
            value_events_enabled: flag(ENV_VALUE_EVENTS_ENABLED),
            value_attribute_enabled: flag(ENV_VALUE_ATTRIBUTE_ENABLED),
        }
    }
}
