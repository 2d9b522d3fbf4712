#![allow(dead_code)]

use std::sync::{Arc, Mutex, PoisonError};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

/// Captures tracing events on the current thread for assertions.
///
/// Works with `#[tokio::test]`'s current-thread runtime; events from other
/// threads are not seen.
pub struct TestLogCapture {
    logs: Arc<Mutex<Vec<CapturedLog>>>,
    _guard: tracing::subscriber::DefaultGuard,
}

#[derive(Debug, Clone)]
pub struct CapturedLog {
    pub level: tracing::Level,
    pub message: String,
    pub fields: Vec<(String, String)>,
    /// `(span name, field, value)` for every enclosing span, innermost first.
    pub span_fields: Vec<(String, String, String)>,
}

impl CapturedLog {
    /// Value of `name`, if the event recorded it.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Value of `name` recorded on the enclosing span called `span`.
    #[must_use]
    pub fn span_field(&self, span: &str, name: &str) -> Option<&str> {
        self.span_fields
            .iter()
            .find(|(s, k, _)| s == span && k == name)
            .map(|(_, _, v)| v.as_str())
    }
}

impl TestLogCapture {
    /// Start capturing. Capture stops when the value is dropped.
    #[must_use]
    pub fn start() -> Self {
        let logs = Arc::new(Mutex::new(Vec::new()));
        let subscriber = tracing_subscriber::registry().with(CaptureLayer {
            logs: Arc::clone(&logs),
        });
        let guard = tracing::subscriber::set_default(subscriber);
        Self {
            logs,
            _guard: guard,
        }
    }

    /// All events whose message contains `needle`.
    #[must_use]
    pub fn matching(&self, needle: &str) -> Vec<CapturedLog> {
        self.logs()
            .into_iter()
            .filter(|l| l.message.contains(needle))
            .collect()
    }

    pub fn assert_logged(&self, needle: &str) {
        assert!(
            !self.matching(needle).is_empty(),
            "Expected log containing '{needle}'. Logged: {:#?}",
            self.logs().iter().map(|l| l.message.clone()).collect::<Vec<_>>()
        );
    }

    pub fn assert_no_errors(&self) {
        let errors: Vec<_> = self
            .logs()
            .into_iter()
            .filter(|l| l.level == tracing::Level::ERROR)
            .collect();
        assert!(errors.is_empty(), "Unexpected errors: {errors:#?}");
    }

    /// Assert no captured field value contains `secret`.
    pub fn assert_not_leaked(&self, secret: &str) {
        for log in self.logs() {
            assert!(
                !log.message.contains(secret) && log.fields.iter().all(|(_, v)| !v.contains(secret)),
                "Secret leaked in log: {log:#?}"
            );
        }
    }

    #[must_use]
    pub fn logs(&self) -> Vec<CapturedLog> {
        self.logs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

struct CaptureLayer {
    logs: Arc<Mutex<Vec<CapturedLog>>>,
}

struct SpanFields(Vec<(String, String)>);

impl<S> tracing_subscriber::Layer<S> for CaptureLayer
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        id: &tracing::span::Id,
        ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor::default();
        attrs.record(&mut visitor);
        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(SpanFields(visitor.fields));
        }
    }

    fn on_event(&self, event: &tracing::Event<'_>, ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        let mut span_fields = Vec::new();
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope {
                if let Some(SpanFields(fields)) = span.extensions().get::<SpanFields>() {
                    span_fields.extend(
                        fields
                            .iter()
                            .map(|(k, v)| (span.name().to_string(), k.clone(), v.clone())),
                    );
                }
            }
        }
        self.logs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(CapturedLog {
                level: *event.metadata().level(),
                message: visitor.message,
                fields: visitor.fields,
                span_fields,
            });
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: Vec<(String, String)>,
}

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.record_str(field, &format!("{value:?}"));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.record_str(field, &value.to_string());
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push((field.name().to_string(), value.to_string()));
        }
    }
}
