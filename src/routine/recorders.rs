//! Per-routine instruments, resolved once before the routine is spawned.

use std::sync::Arc;

use crate::events::Bus;
use crate::routine::options::GoOptions;
use crate::telemetry::{Counter, Histogram, KeyValue, Tracer, UpDownCounter, init_or_degrade};

/// Attribute key carrying the routine name on every measurement.
pub(crate) const ROUTINE_NAME_ATTR: &str = "routine.name";

/// Instruments of one routine run; any of them may be unset.
#[derive(Default)]
pub(crate) struct Recorders {
    pub total: Option<Arc<dyn Counter>>,
    pub running: Option<Arc<dyn UpDownCounter>>,
    pub duration: Option<Arc<dyn Histogram>>,
    pub tracer: Option<Arc<dyn Tracer>>,
}

impl Recorders {
    /// Creates the enabled instruments, degrading failures to unset.
    pub fn init(owner: &str, opts: &GoOptions) -> Self {
        let bus = opts.bus.as_ref();
        let mut recorders = Recorders {
            tracer: opts.effective_tracer(),
            ..Recorders::default()
        };
        let Some(meter) = opts.effective_meter() else {
            return recorders;
        };

        if opts.total_counter.enabled {
            recorders.total = init_or_degrade(
                owner,
                bus,
                meter.counter(&opts.total_counter.name, "funcy routine total counter"),
            );
        }
        if opts.running_counter.enabled {
            recorders.running = init_or_degrade(
                owner,
                bus,
                meter.up_down_counter(&opts.running_counter.name, "funcy running routine counter"),
            );
        }
        if opts.duration_histogram.enabled {
            recorders.duration = init_or_degrade(
                owner,
                bus,
                meter.histogram(
                    &opts.duration_histogram.name,
                    "funcy routine duration histogram (ms)",
                ),
            );
        }
        recorders
    }
}

/// Holds one unit of the running counter; releases it on drop, including during unwinding.
pub(crate) struct RunningGuard {
    counter: Arc<dyn UpDownCounter>,
    attrs: Vec<KeyValue>,
}

impl RunningGuard {
    pub fn enter(counter: Arc<dyn UpDownCounter>, attrs: Vec<KeyValue>) -> Self {
        counter.add(1, &attrs);
        Self { counter, attrs }
    }
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.counter.add(-1, &self.attrs);
    }
}

/// Returns the bus only when someone listens; avoids building events for nobody.
pub(crate) fn observed(bus: Option<&Bus>) -> Option<&Bus> {
    bus.filter(|b| b.observer_count() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Defaults, ROUTINE_DURATION_NAME, ROUTINE_RUNNING_NAME};
    use crate::telemetry::InMemoryMeter;

    #[test]
    fn test_guard_releases_on_drop() {
        let meter = InMemoryMeter::new();
        let counter = crate::telemetry::Meter::up_down_counter(&meter, "running", "").unwrap();
        {
            let _guard = RunningGuard::enter(counter, vec![]);
            assert_eq!(meter.up_down_value("running"), 1);
        }
        assert_eq!(meter.up_down_value("running"), 0);
    }

    #[test]
    fn test_guard_releases_on_unwind() {
        let meter = InMemoryMeter::new();
        let counter = crate::telemetry::Meter::up_down_counter(&meter, "running", "").unwrap();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = RunningGuard::enter(counter, vec![]);
            panic!("boom");
        }));
        assert!(result.is_err());
        assert_eq!(meter.up_down_value("running"), 0);
    }

    #[test]
    fn test_failed_instrument_is_left_unset() {
        let meter = InMemoryMeter::rejecting([ROUTINE_RUNNING_NAME]);
        let opts = GoOptions::from_defaults(Defaults::default()).with_meter(Arc::new(meter));
        let recorders = Recorders::init("worker", &opts);

        assert!(recorders.running.is_none());
        assert!(recorders.total.is_some());
        assert!(recorders.duration.is_some());
        assert!(recorders.tracer.is_none());
    }

    #[test]
    fn test_disabled_instruments_are_not_created() {
        let meter = InMemoryMeter::rejecting([ROUTINE_DURATION_NAME]);
        let bus = Bus::default();
        let mut rx = bus.subscribe();
        let opts = GoOptions::from_defaults(Defaults::default())
            .with_meter(Arc::new(meter))
            .with_duration_histogram(false)
            .with_bus(bus);
        let recorders = Recorders::init("worker", &opts);

        assert!(recorders.duration.is_none());
        // nothing was attempted, so nothing failed
        assert!(rx.try_recv().is_err());
    }
}
