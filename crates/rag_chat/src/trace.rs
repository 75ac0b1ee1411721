use std::sync::atomic::{AtomicU64, Ordering};

/// Terminal status recorded when a span closes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpanStatus {
    Unset,
    Ok,
    Error(String),
}

/// Backend a span reports into. Implementations must tolerate being driven
/// from any thread; every method may be a no-op.
pub trait SpanSink: Send {
    fn set_attribute(&mut self, key: &str, value: &str);
    fn record_event(&mut self, name: &str, attributes: &[(&str, String)]);
    fn close(&mut self, status: &SpanStatus);
    fn trace_id(&self) -> Option<String> {
        None
    }
}

/// Scoped span handle. Closing is guaranteed on every exit path: dropping
/// the handle closes the span with whatever status was recorded, so early
/// returns and error paths cannot leak an open span.
pub struct Span {
    sink: Box<dyn SpanSink>,
    status: SpanStatus,
    closed: bool,
}

impl Span {
    pub fn new(sink: Box<dyn SpanSink>) -> Self {
        Self {
            sink,
            status: SpanStatus::Unset,
            closed: false,
        }
    }

    pub fn set_attribute(&mut self, key: &str, value: impl AsRef<str>) {
        self.sink.set_attribute(key, value.as_ref());
    }

    pub fn record_event(&mut self, name: &str, attributes: &[(&str, String)]) {
        self.sink.record_event(name, attributes);
    }

    pub fn trace_id(&self) -> Option<String> {
        self.sink.trace_id()
    }

    /// Close with success status.
    pub fn finish_ok(mut self) {
        self.status = SpanStatus::Ok;
    }

    /// Close with error status and detail.
    pub fn finish_error(mut self, detail: impl Into<String>) {
        self.status = SpanStatus::Error(detail.into());
    }
}

impl Drop for Span {
    fn drop(&mut self) {
        if !self.closed {
            self.closed = true;
            self.sink.close(&self.status);
        }
    }
}

/// Tracing collaborator. The pipeline functions identically whether spans go
/// nowhere or into a real exporter.
pub trait Trace: Send + Sync {
    fn open_span(&self, name: &str, attributes: &[(&str, String)]) -> Span;
}

/// Tracer that records nothing.
#[derive(Debug, Clone, Default)]
pub struct NoopTrace;

struct NoopSink;

impl SpanSink for NoopSink {
    fn set_attribute(&mut self, _key: &str, _value: &str) {}
    fn record_event(&mut self, _name: &str, _attributes: &[(&str, String)]) {}
    fn close(&mut self, _status: &SpanStatus) {}
}

impl Trace for NoopTrace {
    fn open_span(&self, _name: &str, _attributes: &[(&str, String)]) -> Span {
        Span::new(Box::new(NoopSink))
    }
}

/// Tracer that emits `tracing` events for span open, events, and close.
/// Span export plumbing stays external; this is diagnostics, not OTLP.
#[derive(Debug, Default)]
pub struct LogTrace {
    next_id: AtomicU64,
}

impl LogTrace {
    pub fn new() -> Self {
        Self::default()
    }
}

struct LogSink {
    name: String,
    span_id: String,
}

impl SpanSink for LogSink {
    fn set_attribute(&mut self, key: &str, value: &str) {
        tracing::debug!(span = %self.name, span_id = %self.span_id, key, value, "span attribute");
    }

    fn record_event(&mut self, name: &str, attributes: &[(&str, String)]) {
        tracing::info!(span = %self.name, span_id = %self.span_id, event = name, attributes = ?attributes, "span event");
    }

    fn close(&mut self, status: &SpanStatus) {
        match status {
            SpanStatus::Error(detail) => {
                tracing::error!(span = %self.name, span_id = %self.span_id, detail = %detail, "span closed with error");
            }
            _ => {
                tracing::info!(span = %self.name, span_id = %self.span_id, "span closed");
            }
        }
    }

    fn trace_id(&self) -> Option<String> {
        Some(self.span_id.clone())
    }
}

impl Trace for LogTrace {
    fn open_span(&self, name: &str, attributes: &[(&str, String)]) -> Span {
        let span_id = format!("{:016x}", self.next_id.fetch_add(1, Ordering::Relaxed));
        tracing::info!(span = name, span_id = %span_id, attributes = ?attributes, "span opened");
        Span::new(Box::new(LogSink {
            name: name.to_string(),
            span_id,
        }))
    }
}
