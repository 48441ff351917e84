//! Reads the active span, exposes its trace id and annotates it on failure.
//!
//! The correlator never creates spans. A request without an active span is a
//! normal state and every operation then does nothing.

use std::sync::Arc;

use opentelemetry_semantic_conventions::attribute::{HTTP_REQUEST_METHOD, HTTP_ROUTE};

use crate::exception_classifier::{ErrorKind, ErrorRecord};
use crate::path_normalizer::{ExclusionSet, RequestDescriptor};

/// Response header carrying the active trace id.
pub const TRACE_ID_HEADER: &str = "x-trace-id";

#[derive(Debug, Clone, PartialEq)]
pub enum SpanValue {
    Str(String),
    I64(i64),
    Bool(bool),
}

impl From<&str> for SpanValue {
    fn from(value: &str) -> Self {
        SpanValue::Str(value.to_string())
    }
}

impl From<String> for SpanValue {
    fn from(value: String) -> Self {
        SpanValue::Str(value)
    }
}

impl From<i64> for SpanValue {
    fn from(value: i64) -> Self {
        SpanValue::I64(value)
    }
}

impl From<u16> for SpanValue {
    fn from(value: u16) -> Self {
        SpanValue::I64(i64::from(value))
    }
}

impl From<bool> for SpanValue {
    fn from(value: bool) -> Self {
        SpanValue::Bool(value)
    }
}

/// Handle on the span that is current for the request being served.
pub trait ActiveSpan: Send {
    /// Canonical hex form of the trace id.
    fn trace_id(&self) -> String;
    fn set_attribute(&self, key: &'static str, value: SpanValue);
    fn add_event(&self, name: &'static str, attributes: Vec<(&'static str, SpanValue)>);
    /// Sets the span status to error with the given description.
    fn mark_error(&self, message: &str);
}

pub trait TraceContextProvider: Send + Sync {
    fn current_span(&self) -> Option<Box<dyn ActiveSpan>>;
}

/// Provider for deployments with tracing disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTraceProvider;

impl TraceContextProvider for NoopTraceProvider {
    fn current_span(&self) -> Option<Box<dyn ActiveSpan>> {
        None
    }
}

#[derive(Clone)]
pub struct TraceCorrelator {
    provider: Arc<dyn TraceContextProvider>,
    exclusions: Arc<ExclusionSet>,
}

impl TraceCorrelator {
    pub fn new(provider: Arc<dyn TraceContextProvider>, exclusions: Arc<ExclusionSet>) -> Self {
        Self {
            provider,
            exclusions,
        }
    }

    fn monitored_span(&self, descriptor: &RequestDescriptor) -> Option<Box<dyn ActiveSpan>> {
        if self.exclusions.is_excluded(&descriptor.normalized_path) {
            return None;
        }
        self.provider.current_span()
    }

    /// Returns the trace id to expose as `X-Trace-ID`, tagging the span
    /// with the request route and method.
    pub fn on_request_success(&self, descriptor: &RequestDescriptor) -> Option<String> {
        let span = self.monitored_span(descriptor)?;
        span.set_attribute(HTTP_ROUTE, descriptor.normalized_path.as_str().into());
        span.set_attribute(HTTP_REQUEST_METHOD, descriptor.method.as_str().into());
        Some(span.trace_id())
    }

    /// Trace id for an error response. Annotation already happened in
    /// [`TraceCorrelator::on_request_error`].
    pub fn trace_id(&self, descriptor: &RequestDescriptor) -> Option<String> {
        self.monitored_span(descriptor).map(|span| span.trace_id())
    }

    /// Application faults mark the span as failed; expected HTTP errors are
    /// recorded as an `http.exception` event and leave the status untouched.
    pub fn on_request_error(&self, descriptor: &RequestDescriptor, record: &ErrorRecord) {
        let Some(span) = self.monitored_span(descriptor) else {
            return;
        };

        match record.kind {
            ErrorKind::ApplicationFault => {
                let message = record.message.joined();
                span.mark_error(&message);
                span.set_attribute("error", true.into());
                span.set_attribute("error.type", record.error_type.as_str().into());
                span.set_attribute("error.message", message.into());
                span.set_attribute("error.status_code", record.status_code.into());
                span.set_attribute("error.path", record.path.as_str().into());
                if let Some(stack) = &record.stack {
                    span.set_attribute("error.stack", stack.as_str().into());
                }
                if let Some(details) = &record.details {
                    span.set_attribute("error.details", details.to_string().into());
                }
            }
            ErrorKind::HttpExpected => {
                span.add_event(
                    "http.exception",
                    vec![
                        ("exception.type", record.error_type.as_str().into()),
                        ("exception.message", record.message.joined().into()),
                        ("exception.status_code", record.status_code.into()),
                        ("exception.path", record.path.as_str().into()),
                    ],
                );
                if let Some(details) = &record.details {
                    span.add_event(
                        "exception.details",
                        vec![("details", details.to_string().into())],
                    );
                }
            }
        }
    }
}
