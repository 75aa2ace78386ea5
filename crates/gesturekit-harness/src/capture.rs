#![forbid(unsafe_code)]

//! In-memory `tracing` capture for asserting on gesturekit's logs.
//!
//! [`TraceCapture`] is a [`Layer`](tracing_subscriber::Layer) that records
//! every span it sees and every event, with the name of the span the event
//! was emitted in. Install it for the duration of a closure with
//! [`capture`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

#[derive(Debug, Clone)]
pub struct CapturedSpan {
    pub name: String,
    pub target: String,
    pub fields: HashMap<String, String>,
    pub parent: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub level: Level,
    pub target: String,
    pub message: String,
    pub fields: HashMap<String, String>,
    pub span: Option<String>,
}

impl CapturedEvent {
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

#[derive(Debug, Default)]
struct Records {
    spans: Vec<CapturedSpan>,
    events: Vec<CapturedEvent>,
}

/// Read side of a [`TraceCapture`].
#[derive(Debug, Clone, Default)]
pub struct CaptureHandle {
    records: Arc<Mutex<Records>>,
}

impl CaptureHandle {
    fn lock(&self) -> MutexGuard<'_, Records> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn spans(&self) -> Vec<CapturedSpan> {
        self.lock().spans.clone()
    }

    #[must_use]
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.lock().events.clone()
    }

    /// Events whose target is `target`.
    #[must_use]
    pub fn events_for(&self, target: &str) -> Vec<CapturedEvent> {
        self.lock()
            .events
            .iter()
            .filter(|e| e.target == target)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn has_span(&self, name: &str) -> bool {
        self.lock().spans.iter().any(|s| s.name == name)
    }
}

pub struct TraceCapture {
    handle: CaptureHandle,
}

impl TraceCapture {
    #[must_use]
    pub fn new() -> (Self, CaptureHandle) {
        let handle = CaptureHandle::default();
        (
            Self {
                handle: handle.clone(),
            },
            handle,
        )
    }
}

struct FieldVisitor {
    message: String,
    fields: HashMap<String, String>,
}

impl FieldVisitor {
    fn new() -> Self {
        Self {
            message: String::new(),
            fields: HashMap::new(),
        }
    }

    fn put(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.message = value;
        } else {
            self.fields.insert(field.name().to_string(), value);
        }
    }
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.put(field, format!("{value:?}"));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, value.to_string());
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.put(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, value.to_string());
    }
}

impl<S> Layer<S> for TraceCapture
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, _id: &Id, ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::new();
        attrs.record(&mut visitor);
        let parent = ctx.lookup_current().map(|span| span.name().to_string());
        let metadata = attrs.metadata();
        self.handle.lock().spans.push(CapturedSpan {
            name: metadata.name().to_string(),
            target: metadata.target().to_string(),
            fields: visitor.fields,
            parent,
        });
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::new();
        event.record(&mut visitor);
        let span = ctx.lookup_current().map(|span| span.name().to_string());
        let metadata = event.metadata();
        self.handle.lock().events.push(CapturedEvent {
            level: *metadata.level(),
            target: metadata.target().to_string(),
            message: visitor.message,
            fields: visitor.fields,
            span,
        });
    }
}

/// Run `f` with a capturing subscriber installed on this thread.
pub fn capture<R>(f: impl FnOnce() -> R) -> (R, CaptureHandle) {
    let (layer, handle) = TraceCapture::new();
    let subscriber = tracing_subscriber::registry().with(layer);
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_events_inside_spans() {
        let ((), handle) = capture(|| {
            let _span = tracing::info_span!(target: "probe", "outer", k = 1u64).entered();
            tracing::info!(target: "probe", count = 3u64, "hello");
        });
        assert!(handle.has_span("outer"));
        let events = handle.events_for("probe");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].message, "hello");
        assert_eq!(events[0].field("count"), Some("3"));
        assert_eq!(events[0].span.as_deref(), Some("outer"));
    }
}
