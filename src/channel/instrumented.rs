//! # Instrumented FIFO channel.
//!
//! [`Channel`] stamps every value with the sender's context, counts and times sends, and
//! supports an idempotent, race-free [`close`](Channel::close).
//!
//! ## Send flow
//! ```text
//! send(ctx, values)
//!   ├─► closed? ──yes──► Err(Closed)
//!   ├─► span "send" {num, chan_cap, chan_size}, stamp sender = ctx.routine
//!   ├─► for each value:
//!   │     ├─► closing fired? ──yes──► Err(Closed)   (earlier values stay delivered)
//!   │     ├─► reserve queue slot  ◄── races closing
//!   │     ├─► span event "value" {value?}, enqueue
//!   │     ├─► capacity 0: wait until taken  ◄── races closing (withdraw)
//!   │     │                                      (a dropped send withdraws too)
//!   │     └─► counter +1
//!   └─► histogram(ms of the whole call), end span
//! ```
//!
//! ## Rules
//! - Values are delivered in enqueue order, each to exactly one receiver.
//! - `close()` is idempotent; only the first call fires the closing signal.
//! - Blocked senders are released by `close()` with [`ChannelError::Closed`].
//! - Values enqueued before `close()` are still delivered; the stream ends after them.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::options::{ChannelOptions, ValueEncoder};
use super::receiver::Receiver;
use super::slot::{Handoff, PendingHandoff, Slot};
use super::value::Value;
use crate::context::Context;
use crate::error::ChannelError;
use crate::events::{Bus, Event, EventKind};
use crate::telemetry::{Counter, Histogram, KeyValue, Span, Tracer, init_or_degrade};

const DEFAULT_OWNER: &str = "channel";

/// Typed FIFO channel with sender stamping, instrumentation and idempotent close.
///
/// Clones share the same queue.
///
/// ## Example
/// ```
/// use funcy::{Channel, ChannelOptions, Context};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let ch = Channel::with_options(ChannelOptions::new().with_capacity(2));
/// let ctx = Context::root().derive_child("producer");
///
/// ch.send(&ctx, ["a", "b"]).await.unwrap();
/// ch.close();
///
/// let rx = ch.receive();
/// let first = rx.recv().await.unwrap();
/// assert_eq!(*first.data(), "a");
/// assert_eq!(first.sender(), "producer");
/// assert_eq!(rx.recv().await.unwrap().into_data(), "b");
/// assert!(rx.recv().await.is_none());
/// # }
/// ```
pub struct Channel<T> {
    inner: Arc<Inner<T>>,
}

struct Inner<T> {
    name: Option<Arc<str>>,
    capacity: usize,
    tx: Mutex<Option<mpsc::Sender<Slot<T>>>>,
    rx: Receiver<T>,
    depth: Arc<AtomicUsize>,
    closed: AtomicBool,
    closing: CancellationToken,
    counter: Option<Arc<dyn Counter>>,
    histogram: Option<Arc<dyn Histogram>>,
    tracer: Option<Arc<dyn Tracer>>,
    value_events: bool,
    value_attribute: bool,
    encoder: Option<ValueEncoder<T>>,
    bus: Option<Bus>,
}

impl<T> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Channel<T> {
    /// Creates a rendezvous channel configured from the environment.
    pub fn new() -> Self {
        Self::with_options(ChannelOptions::new())
    }

    /// Creates a channel; instruments that fail to initialize are logged and skipped.
    pub fn with_options(opts: ChannelOptions<T>) -> Self {
        let name: Option<Arc<str>> = opts.name.as_deref().map(Arc::from);
        let owner = name.as_deref().unwrap_or(DEFAULT_OWNER);
        let bus = opts.bus.as_ref();

        let (counter, histogram) = match opts.effective_meter() {
            Some(meter) => (
                init_or_degrade(
                    owner,
                    bus,
                    meter.counter(&opts.counter_name, "funcy channel sent counter"),
                ),
                init_or_degrade(
                    owner,
                    bus,
                    meter.histogram(&opts.histogram_name, "funcy channel send duration (ms)"),
                ),
            ),
            None => (None, None),
        };

        let (tx, rx) = mpsc::channel(opts.capacity.max(1));
        let depth = Arc::new(AtomicUsize::new(0));

        Self {
            inner: Arc::new(Inner {
                name,
                capacity: opts.capacity,
                tx: Mutex::new(Some(tx)),
                rx: Receiver::new(rx, Arc::clone(&depth)),
                depth,
                closed: AtomicBool::new(false),
                closing: CancellationToken::new(),
                counter,
                histogram,
                tracer: opts.effective_tracer(),
                value_events: opts.value_events_enabled,
                value_attribute: opts.value_attribute_enabled,
                encoder: opts.encoder,
                bus: opts.bus,
            }),
        }
    }

    /// Sends `values` in order, stamping each with `ctx`'s routine as sender.
    ///
    /// Suspends while the buffer is full (or, at capacity 0, until a receiver takes each value).
    /// Fails with [`ChannelError::Closed`] if the channel is closed before or during the call;
    /// values enqueued before the failure stay delivered.
    pub async fn send<I>(&self, ctx: &Context, values: I) -> Result<(), ChannelError>
    where
        I: IntoIterator<Item = T>,
    {
        if self.is_closed() {
            return Err(ChannelError::Closed);
        }
        let values: Vec<T> = values.into_iter().collect();
        let start = Instant::now();

        let mut span = self.inner.tracer.as_ref().map(|tracer| {
            tracer.start(
                "send",
                &[
                    KeyValue::int("num", len_i64(values.len())),
                    KeyValue::int("chan_cap", len_i64(self.inner.capacity)),
                    KeyValue::int("chan_size", len_i64(self.len())),
                ],
            )
        });

        let stamped = ctx.derive_sender(ctx.routine());
        let res = self.enqueue_all(&stamped, values, span.as_deref_mut()).await;

        if let Some(histogram) = &self.inner.histogram {
            let ms = start.elapsed().as_millis().min(u128::from(u64::MAX)) as u64;
            histogram.record(ms, &[]);
        }
        if let Some(span) = span {
            span.end();
        }
        res
    }

    /// Sends a single value; see [`send`](Self::send).
    pub async fn send_one(&self, ctx: &Context, value: T) -> Result<(), ChannelError> {
        self.send(ctx, [value]).await
    }

    async fn enqueue_all(
        &self,
        stamped: &Context,
        values: Vec<T>,
        mut span: Option<&mut (dyn Span + 'static)>,
    ) -> Result<(), ChannelError> {
        let inner = &self.inner;
        for data in values {
            if inner.closing.is_cancelled() {
                return Err(ChannelError::Closed);
            }
            let tx = inner.tx.lock().clone();
            let Some(tx) = tx else {
                return Err(ChannelError::Closed);
            };

            let permit = tokio::select! {
                biased;
                _ = inner.closing.cancelled() => return Err(ChannelError::Closed),
                permit = tx.reserve() => permit.map_err(|_| ChannelError::Closed)?,
            };

            if let Some(span) = span.as_deref_mut() {
                self.record_value(span, &data);
            }

            let handoff = (inner.capacity == 0).then(Handoff::new);
            inner.depth.fetch_add(1, Ordering::AcqRel);
            permit.send(Slot::new(
                Value::new(stamped.clone(), data),
                handoff.clone(),
            ));

            if let Some(handoff) = handoff {
                let pending = PendingHandoff::new(handoff);
                tokio::select! {
                    biased;
                    _ = pending.taken() => {}
                    _ = inner.closing.cancelled() => {
                        if pending.withdraw() {
                            return Err(ChannelError::Closed);
                        }
                    }
                }
            }

            if let Some(counter) = &inner.counter {
                counter.add(1, &[]);
            }
        }
        Ok(())
    }

    fn record_value(&self, span: &mut dyn Span, data: &T) {
        if !self.inner.value_events {
            return;
        }
        let encoded = match (self.inner.value_attribute, self.inner.encoder) {
            (true, Some(encode)) => encode(data),
            _ => None,
        };
        match encoded {
            Some(value) => span.add_event("value", &[KeyValue::string("value", value)]),
            None => span.add_event("value", &[]),
        }
    }

    /// Returns the receive side. Every call hands out a clone onto the same queue.
    pub fn receive(&self) -> Receiver<T> {
        self.inner.rx.clone()
    }

    /// Closes the channel.
    ///
    /// The first call fires the closing signal, releases blocked senders and lets receivers
    /// drain what is buffered. Later calls do nothing.
    pub fn close(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.inner.closing.cancel();
        drop(self.inner.tx.lock().take());

        tracing::debug!(
            channel = self.inner.name.as_deref().unwrap_or(DEFAULT_OWNER),
            buffered = self.len(),
            "channel closed"
        );
        if let Some(bus) = &self.inner.bus {
            let mut ev = Event::new(EventKind::ChannelClosed);
            if let Some(name) = &self.inner.name {
                ev = ev.with_routine(Arc::clone(name));
            }
            bus.publish(ev);
        }
    }

    /// Configured buffer size (`0` for rendezvous).
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Number of buffered values not yet received.
    pub fn len(&self) -> usize {
        self.inner
            .depth
            .load(Ordering::Acquire)
            .min(self.inner.capacity)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Resolves once [`close`](Self::close) has been called.
    pub async fn closed(&self) {
        self.inner.closing.cancelled().await;
    }
}

impl<T> Default for Channel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("name", &self.inner.name)
            .field("capacity", &self.inner.capacity)
            .field("len", &self.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

fn len_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::{CHANNEL_SENT_COUNT_NAME, CHANNEL_SENT_DURATION_NAME, Defaults};
    use crate::telemetry::{AttrValue, InMemoryMeter, RecordingTracer, find};

    fn buffered<T>(capacity: usize) -> Channel<T> {
        Channel::with_options(
            ChannelOptions::from_defaults(Defaults::default()).with_capacity(capacity),
        )
    }

    fn producer() -> Context {
        Context::root().derive_child("producer")
    }

    #[tokio::test]
    async fn test_fifo_and_sender_stamp() {
        let ch = buffered::<u32>(8);
        ch.send(&producer(), [1, 2, 3]).await.unwrap();
        assert_eq!(ch.len(), 3);

        let rx = ch.receive();
        for expected in 1..=3 {
            let v = rx.recv().await.unwrap();
            assert_eq!(*v.data(), expected);
            assert_eq!(v.sender(), "producer");
            assert_eq!(v.context().parent_routine(), "root");
        }
        assert!(ch.is_empty());
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let bus = Bus::default();
        let mut events = bus.subscribe();
        let ch: Channel<u8> = Channel::with_options(
            ChannelOptions::from_defaults(Defaults::default())
                .with_name("jobs")
                .with_bus(bus),
        );

        ch.close();
        ch.close();
        assert!(ch.is_closed());
        ch.closed().await;

        let ev = events.try_recv().unwrap();
        assert_eq!(ev.kind, EventKind::ChannelClosed);
        assert_eq!(ev.routine.as_deref(), Some("jobs"));
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_send_after_close_fails() {
        let ch = buffered::<u8>(4);
        ch.close();
        assert_eq!(
            ch.send_one(&producer(), 1).await,
            Err(ChannelError::Closed)
        );
        assert!(ch.receive().recv().await.is_none());
    }

    #[tokio::test]
    async fn test_buffered_values_drain_after_close() {
        let ch = buffered::<&str>(4);
        ch.send(&producer(), ["a", "b"]).await.unwrap();
        ch.close();

        let rx = ch.receive();
        assert_eq!(rx.recv().await.unwrap().into_data(), "a");
        assert_eq!(rx.try_recv().unwrap().into_data(), "b");
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_close_releases_blocked_sender() {
        let ch = buffered::<u8>(1);
        ch.send_one(&producer(), 1).await.unwrap();

        let blocked = {
            let ch = ch.clone();
            tokio::spawn(async move { ch.send(&producer(), [2, 3]).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!blocked.is_finished());

        ch.close();
        assert_eq!(blocked.await.unwrap(), Err(ChannelError::Closed));

        let rx = ch.receive();
        assert_eq!(rx.recv().await.unwrap().into_data(), 1);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_rendezvous_completes_after_receive() {
        let ch = buffered::<&str>(0);
        let mut send = {
            let ch = ch.clone();
            tokio::spawn(async move { ch.send_one(&producer(), "ping").await })
        };

        let pending = tokio::time::timeout(Duration::from_millis(20), &mut send).await;
        assert!(pending.is_err());
        assert_eq!(ch.len(), 0);

        let v = ch.receive().recv().await.unwrap();
        assert_eq!(v.into_data(), "ping");
        assert_eq!(send.await.unwrap(), Ok(()));
    }

    #[tokio::test]
    async fn test_rendezvous_withdrawn_on_close() {
        let ch = buffered::<&str>(0);
        let send = {
            let ch = ch.clone();
            tokio::spawn(async move { ch.send_one(&producer(), "lost").await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        ch.close();
        assert_eq!(send.await.unwrap(), Err(ChannelError::Closed));
        assert!(ch.receive().recv().await.is_none());
    }

    #[tokio::test]
    async fn test_rendezvous_withdrawn_when_send_cancelled() {
        let ch = buffered::<&str>(0);
        let timed_out =
            tokio::time::timeout(Duration::from_millis(10), ch.send_one(&producer(), "stale"))
                .await;
        assert!(timed_out.is_err());

        let resend = {
            let ch = ch.clone();
            tokio::spawn(async move { ch.send_one(&producer(), "fresh").await })
        };
        let rx = ch.receive();
        assert_eq!(rx.recv().await.unwrap().into_data(), "fresh");
        assert_eq!(resend.await.unwrap(), Ok(()));

        ch.close();
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_cancelled_rendezvous_not_delivered_after_close() {
        let ch = buffered::<&str>(0);
        let timed_out =
            tokio::time::timeout(Duration::from_millis(10), ch.send_one(&producer(), "stale"))
                .await;
        assert!(timed_out.is_err());

        ch.close();
        assert!(ch.receive().recv().await.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_send_and_close() {
        let ch = buffered::<usize>(1);
        let rx = ch.receive();
        let consumer = tokio::spawn(async move {
            let mut got = 0;
            while rx.recv().await.is_some() {
                got += 1;
            }
            got
        });

        let mut producers = Vec::new();
        for p in 0..8 {
            let ch = ch.clone();
            producers.push(tokio::spawn(async move {
                let ctx = Context::root().derive_child(format!("p{p}"));
                let mut ok = 0;
                for i in 0..50 {
                    match ch.send_one(&ctx, i).await {
                        Ok(()) => ok += 1,
                        Err(err) => {
                            assert_eq!(err, ChannelError::Closed);
                            break;
                        }
                    }
                }
                ok
            }));
        }

        tokio::time::sleep(Duration::from_millis(5)).await;
        ch.close();

        let mut sent = 0;
        for p in producers {
            sent += p.await.unwrap();
        }
        assert_eq!(consumer.await.unwrap(), sent);
    }

    #[tokio::test]
    async fn test_telemetry_counts_and_traces() {
        let meter = InMemoryMeter::new();
        let tracer = RecordingTracer::new();
        let ch: Channel<String> = Channel::with_options(
            ChannelOptions::from_defaults(Defaults::default())
                .with_capacity(4)
                .with_meter(Arc::new(meter.clone()))
                .with_tracer(Arc::new(tracer.clone()))
                .with_value_events_enabled(true)
                .with_value_attribute_enabled(true)
                .with_json_values(),
        );

        ch.send(&producer(), ["a".to_string(), "b".to_string()])
            .await
            .unwrap();

        assert_eq!(meter.counter_total(CHANNEL_SENT_COUNT_NAME), 2);
        assert_eq!(meter.histogram_records(CHANNEL_SENT_DURATION_NAME).len(), 1);

        let spans = tracer.spans_named("send");
        assert_eq!(spans.len(), 1);
        let span = &spans[0];
        assert!(span.ended);
        assert_eq!(find(&span.attrs, "num"), Some(&AttrValue::Int(2)));
        assert_eq!(find(&span.attrs, "chan_cap"), Some(&AttrValue::Int(4)));
        assert_eq!(find(&span.attrs, "chan_size"), Some(&AttrValue::Int(0)));

        assert_eq!(span.events.len(), 2);
        let (name, attrs) = &span.events[0];
        assert_eq!(name, "value");
        assert_eq!(
            find(attrs, "value"),
            Some(&AttrValue::Str(Arc::from("\"a\"")))
        );
    }

    #[tokio::test]
    async fn test_value_events_without_attribute() {
        let tracer = RecordingTracer::new();
        let ch: Channel<u8> = Channel::with_options(
            ChannelOptions::from_defaults(Defaults::default())
                .with_capacity(1)
                .with_tracer(Arc::new(tracer.clone()))
                .with_value_events_enabled(true)
                .with_json_values(),
        );
        ch.send_one(&producer(), 9).await.unwrap();

        let span = &tracer.spans_named("send")[0];
        assert_eq!(span.events.len(), 1);
        assert!(span.events[0].1.is_empty());
    }

    #[tokio::test]
    async fn test_failed_send_is_still_timed() {
        let meter = InMemoryMeter::new();
        let ch: Channel<u8> = Channel::with_options(
            ChannelOptions::from_defaults(Defaults::default())
                .with_capacity(1)
                .with_meter(Arc::new(meter.clone())),
        );
        ch.send_one(&producer(), 1).await.unwrap();

        let blocked = {
            let ch = ch.clone();
            tokio::spawn(async move { ch.send_one(&producer(), 2).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        ch.close();
        blocked.await.unwrap().unwrap_err();

        assert_eq!(meter.counter_total(CHANNEL_SENT_COUNT_NAME), 1);
        assert_eq!(meter.histogram_records(CHANNEL_SENT_DURATION_NAME).len(), 2);
    }
}
