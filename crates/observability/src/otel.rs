//! [`TraceContextProvider`] over the `tracing` span bridged to OpenTelemetry.

use opentelemetry::trace::{Status, TraceContextExt};
use opentelemetry::{KeyValue, Value};
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::trace_correlator::{ActiveSpan, SpanValue, TraceContextProvider};

/// Resolves the current `tracing` span. A span whose OpenTelemetry context is
/// invalid (tracing disabled, or filtered out) counts as no span.
#[derive(Debug, Default, Clone, Copy)]
pub struct OtelTraceProvider;

impl TraceContextProvider for OtelTraceProvider {
    fn current_span(&self) -> Option<Box<dyn ActiveSpan>> {
        let span = tracing::Span::current();
        if span.is_disabled() {
            return None;
        }

        let trace_id = {
            let context = span.context();
            let span_context = context.span().span_context().clone();
            if !span_context.is_valid() {
                return None;
            }
            span_context.trace_id().to_string()
        };

        Some(Box::new(OtelActiveSpan { span, trace_id }))
    }
}

struct OtelActiveSpan {
    span: tracing::Span,
    trace_id: String,
}

fn to_otel(value: SpanValue) -> Value {
    match value {
        SpanValue::Str(value) => Value::from(value),
        SpanValue::I64(value) => Value::from(value),
        SpanValue::Bool(value) => Value::from(value),
    }
}

impl ActiveSpan for OtelActiveSpan {
    fn trace_id(&self) -> String {
        self.trace_id.clone()
    }

    fn set_attribute(&self, key: &'static str, value: SpanValue) {
        self.span.set_attribute(key, to_otel(value));
    }

    fn add_event(&self, name: &'static str, attributes: Vec<(&'static str, SpanValue)>) {
        let attributes = attributes
            .into_iter()
            .map(|(key, value)| KeyValue::new(key, to_otel(value)))
            .collect();
        self.span.add_event(name, attributes);
    }

    fn mark_error(&self, message: &str) {
        self.span.set_status(Status::error(message.to_string()));
    }
}
