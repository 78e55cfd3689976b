//! # Spawn one supervised routine.
//!
//! [`go_with`] launches a unit of work on the tokio runtime and returns immediately with a
//! [`RoutineHandle`]. The spawned task wraps the unit of work with identity derivation,
//! lifecycle logging and instrumentation.
//!
//! ## Run flow
//! ```text
//! go_with(f, opts)
//!   ├─► resolve name (explicit or call-site tag), create instruments
//!   └─► tokio::spawn ───► derive child Context (routine=name, parent=base.routine)
//!                         ├─► open span (tracer), log "starting routine", RoutineStarting
//!                         ├─► running +1 (guarded), total +1
//!                         ├─► f(ctx).await  (inside the span, panics caught)
//!                         ├─► duration histogram {routine.name, error}
//!                         ├─► running -1, log "exiting routine", RoutineExiting/Panicked
//!                         └─► close span, deliver outcome on the handle
//! ```
//!
//! ## Rules
//! - The unit of work's error is delivered **verbatim**, exactly once.
//! - The running counter is released on **every** exit path, panics included.
//! - Instrument failures never reach the caller: they are logged and the instrument is skipped.
//! - Routines share nothing but the injected sinks.

use std::fmt::Display;
use std::future::Future;
use std::panic::{AssertUnwindSafe, Location};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use futures::FutureExt;
use tokio::sync::oneshot;
use tracing::{Instrument, Level};

use crate::context::Context;
use crate::events::{Bus, Event, EventKind};
use crate::routine::handle::{Outcome, RoutineHandle, panic_message};
use crate::routine::name;
use crate::routine::options::GoOptions;
use crate::routine::recorders::{ROUTINE_NAME_ATTR, Recorders, RunningGuard, observed};
use crate::telemetry::KeyValue;

/// Emits a lifecycle log line at a level chosen at runtime.
macro_rules! lifecycle {
    ($level:expr, $($arg:tt)+) => {
        match $level {
            Level::ERROR => tracing::error!($($arg)+),
            Level::WARN => tracing::warn!($($arg)+),
            Level::INFO => tracing::info!($($arg)+),
            Level::DEBUG => tracing::debug!($($arg)+),
            _ => tracing::trace!($($arg)+),
        }
    };
}

/// Spawns `f` with options seeded from the environment.
///
/// Shorthand for `go_with(f, GoOptions::new())`; the routine is named after the call site.
#[track_caller]
pub fn go<F, Fut, E>(f: F) -> RoutineHandle<E>
where
    F: FnOnce(Context) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: Display + Send + 'static,
{
    go_with(f, GoOptions::new())
}

/// Spawns `f` as an independent routine configured by `opts`.
///
/// Must be called from within a tokio runtime.
///
/// ## Example
/// ```
/// use std::time::Duration;
/// use funcy::{go_with, Context, GoOptions};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let handle = go_with(
///     |_ctx: Context| async move {
///         tokio::time::sleep(Duration::from_millis(5)).await;
///         Err::<(), _>("boom")
///     },
///     GoOptions::new().with_name("sleeper"),
/// );
/// assert_eq!(handle.await, Err("boom"));
/// # }
/// ```
#[track_caller]
pub fn go_with<F, Fut, E>(f: F, opts: GoOptions) -> RoutineHandle<E>
where
    F: FnOnce(Context) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: Display + Send + 'static,
{
    let name: Arc<str> = match opts.name.as_deref() {
        Some(name) => Arc::from(name),
        None => Arc::from(name::for_location(Location::caller())),
    };
    let recorders = Recorders::init(&name, &opts);
    let finished = Arc::new(AtomicBool::new(false));
    let (tx, rx) = oneshot::channel();

    let run = Run {
        name: Arc::clone(&name),
        base: opts.context.unwrap_or_default(),
        level: opts.log_level,
        recorders,
        bus: opts.bus,
        finished: Arc::clone(&finished),
    };
    tokio::spawn(run.execute(f, tx));

    RoutineHandle::new(name, rx, finished)
}

/// Ephemeral run record of one routine; lives only inside the spawned task.
struct Run {
    name: Arc<str>,
    base: Context,
    level: Level,
    recorders: Recorders,
    bus: Option<Bus>,
    finished: Arc<AtomicBool>,
}

impl Run {
    async fn execute<F, Fut, E>(self, f: F, tx: oneshot::Sender<Outcome<E>>)
    where
        F: FnOnce(Context) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let ctx = self.base.derive_child(Arc::clone(&self.name));
        let parent: Arc<str> = Arc::from(ctx.parent_routine());
        let attrs = vec![KeyValue::string(ROUTINE_NAME_ATTR, Arc::clone(&self.name))];

        let span = self.recorders.tracer.as_ref().map(|tracer| {
            tracer.start(
                &self.name,
                &[KeyValue::string("routine.parent", Arc::clone(&parent))],
            )
        });
        let trace_id = span.as_ref().and_then(|s| s.trace_id());

        lifecycle!(
            self.level,
            name = %self.name,
            parent = %parent,
            trace_id = ?trace_id,
            "starting routine"
        );
        self.publish(EventKind::RoutineStarting, &parent, trace_id.as_deref(), |ev| ev);

        let start = Instant::now();
        let running = self
            .recorders
            .running
            .as_ref()
            .map(|counter| RunningGuard::enter(Arc::clone(counter), attrs.clone()));
        if let Some(total) = &self.recorders.total {
            total.add(1, &attrs);
        }

        let work = AssertUnwindSafe(async move { f(ctx).await }).catch_unwind();
        let outcome: Outcome<E> = match span.as_ref().and_then(|s| s.tracing_span()) {
            Some(entered) => work.instrument(entered).await,
            None => work.await,
        };

        let elapsed = start.elapsed();
        let failed = !matches!(outcome, Ok(Ok(())));
        if let Some(histogram) = &self.recorders.duration {
            let mut tagged = attrs.clone();
            tagged.push(KeyValue::bool("error", failed));
            histogram.record(millis(elapsed), &tagged);
        }
        drop(running);

        let duration = Duration::from_millis(millis(elapsed));
        match &outcome {
            Ok(Ok(())) => {
                lifecycle!(
                    self.level,
                    name = %self.name,
                    parent = %parent,
                    trace_id = ?trace_id,
                    duration = ?duration,
                    "exiting routine"
                );
                self.publish(EventKind::RoutineExiting, &parent, trace_id.as_deref(), |ev| {
                    ev.with_duration(elapsed)
                });
            }
            Ok(Err(err)) => {
                lifecycle!(
                    self.level,
                    name = %self.name,
                    parent = %parent,
                    trace_id = ?trace_id,
                    duration = ?duration,
                    error = %err,
                    "exiting routine"
                );
                self.publish(EventKind::RoutineExiting, &parent, trace_id.as_deref(), |ev| {
                    ev.with_duration(elapsed).with_error(err.to_string())
                });
            }
            Err(payload) => {
                let info = panic_message(payload.as_ref());
                tracing::error!(
                    name = %self.name,
                    parent = %parent,
                    trace_id = ?trace_id,
                    duration = ?duration,
                    panic = %info,
                    "routine panicked"
                );
                self.publish(EventKind::RoutinePanicked, &parent, trace_id.as_deref(), |ev| {
                    ev.with_duration(elapsed).with_error(info.clone())
                });
            }
        }

        if let Some(span) = span {
            span.end();
        }
        let _ = tx.send(outcome);
        self.finished.store(true, Ordering::Release);
    }

    fn publish(
        &self,
        kind: EventKind,
        parent: &Arc<str>,
        trace_id: Option<&str>,
        decorate: impl FnOnce(Event) -> Event,
    ) {
        let Some(bus) = observed(self.bus.as_ref()) else {
            return;
        };
        let mut ev = Event::new(kind)
            .with_routine(Arc::clone(&self.name))
            .with_parent(Arc::clone(parent));
        if let Some(id) = trace_id {
            ev = ev.with_trace_id(id);
        }
        bus.publish(decorate(ev));
    }
}

fn millis(d: Duration) -> u64 {
    d.as_millis().min(u128::from(u64::MAX)) as u64
}
