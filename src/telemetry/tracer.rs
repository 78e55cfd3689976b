//! # Spans.
//!
//! A [`Tracer`] opens a [`Span`] around a routine run or a channel send. Spans collect named
//! events and are closed with [`Span::end`].
//!
//! Two tracers ship with the crate:
//! - [`NoopTracer`]: discards everything, never yields a trace id;
//! - [`TracingTracer`]: maps spans and span events onto the `tracing` ecosystem, so whatever
//!   subscriber the application installed (fmt, json, OpenTelemetry layer) receives them.

use super::attribute::{KeyValue, render};

/// An open span.
///
/// Spans are moved across `.await` points and therefore must be `Send`.
pub trait Span: Send + 'static {
    /// Adds a named event with attributes.
    fn add_event(&mut self, name: &str, attrs: &[KeyValue]);

    /// Returns a correlation id for log lines, if the backend assigns one.
    fn trace_id(&self) -> Option<String>;

    /// Closes the span.
    fn end(self: Box<Self>);

    /// The `tracing` span backing this span, if any.
    ///
    /// Routines enter it while their unit of work runs, so spans and log lines opened by the
    /// work (channel sends included) become its children.
    fn tracing_span(&self) -> Option<tracing::Span> {
        None
    }
}

/// Factory for spans.
pub trait Tracer: Send + Sync + 'static {
    fn start(&self, name: &str, attrs: &[KeyValue]) -> Box<dyn Span>;
}

/// Tracer whose spans discard everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopTracer;

struct NoopSpan;

impl Span for NoopSpan {
    fn add_event(&mut self, _name: &str, _attrs: &[KeyValue]) {}

    fn trace_id(&self) -> Option<String> {
        None
    }

    fn end(self: Box<Self>) {}
}

impl Tracer for NoopTracer {
    fn start(&self, _name: &str, _attrs: &[KeyValue]) -> Box<dyn Span> {
        Box::new(NoopSpan)
    }
}

/// Tracer backed by `tracing` spans at `INFO` level under the `funcy` target.
///
/// The trace id is the `tracing` span id rendered as 16 hex digits; it is only available
/// while a subscriber is installed.
///
/// Spans take the current `tracing` span as parent, so a channel `send` inside a routine
/// nests under that routine's span.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingTracer;

struct TracingSpan {
    span: tracing::Span,
}

impl Span for TracingSpan {
    fn add_event(&mut self, name: &str, attrs: &[KeyValue]) {
        self.span.in_scope(|| {
            tracing::debug!(target: "funcy", event = %name, attributes = %render(attrs), "span event");
        });
    }

    fn trace_id(&self) -> Option<String> {
        self.span.id().map(|id| format!("{:016x}", id.into_u64()))
    }

    fn end(self: Box<Self>) {}

    fn tracing_span(&self) -> Option<tracing::Span> {
        Some(self.span.clone())
    }
}

impl Tracer for TracingTracer {
    fn start(&self, name: &str, attrs: &[KeyValue]) -> Box<dyn Span> {
        let span = tracing::info_span!(
            target: "funcy",
            "funcy",
            otel.name = %name,
            attributes = %render(attrs),
        );
        Box::new(TracingSpan { span })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_span_has_no_trace_id() {
        let mut span = NoopTracer.start("send", &[KeyValue::int("num", 1)]);
        span.add_event("value", &[]);
        assert_eq!(span.trace_id(), None);
        span.end();
    }

    #[test]
    fn test_tracing_span_gets_id_under_subscriber() {
        let subscriber = tracing_subscriber::fmt().with_test_writer().finish();
        tracing::subscriber::with_default(subscriber, || {
            let mut span = TracingTracer.start("worker", &[]);
            span.add_event("value", &[KeyValue::string("value", "\"hello\"")]);
            let id = span.trace_id().expect("subscriber assigns span ids");
            assert_eq!(id.len(), 16);
            span.end();
        });
    }
}
