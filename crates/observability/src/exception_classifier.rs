//! Error classification and the uniform JSON error body.
//!
//! Every failure on the request path ends here exactly once. The class is a
//! pure function of the declared status: a 4xx is an expected HTTP outcome,
//! anything else (5xx, out of range, or no status at all) is an application
//! fault rendered as a 500-class response.

use chrono::{DateTime, SecondsFormat, Utc};
use http::StatusCode;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::metrics_recorder::MetricsRecorder;
use crate::path_normalizer::RequestDescriptor;
use crate::trace_correlator::TraceCorrelator;

/// Public message for faults that carry none of their own.
pub const GENERIC_FAULT_MESSAGE: &str = "Internal server error";

/// Body used when the regular error body cannot be serialized.
pub const FALLBACK_BODY: &str = r#"{"statusCode":500,"message":"Internal error"}"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    HttpExpected,
    ApplicationFault,
}

pub fn classify(declared_status: Option<u16>) -> ErrorKind {
    match declared_status {
        Some(400..=499) => ErrorKind::HttpExpected,
        _ => ErrorKind::ApplicationFault,
    }
}

/// Status written to the response and to metrics. Anything that is not a
/// declared 4xx or 5xx becomes 500.
pub fn derive_status_code(declared_status: Option<u16>) -> u16 {
    match declared_status {
        Some(status @ 400..=599) => status,
        _ => 500,
    }
}

/// Reason phrase for a status, `"Error"` when it has none.
pub fn status_name(status_code: u16) -> &'static str {
    StatusCode::from_u16(status_code)
        .ok()
        .and_then(|status| status.canonical_reason())
        .unwrap_or("Error")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ErrorMessage {
    Single(String),
    Many(Vec<String>),
}

impl ErrorMessage {
    pub fn joined(&self) -> String {
        match self {
            ErrorMessage::Single(message) => message.clone(),
            ErrorMessage::Many(messages) => messages.join(", "),
        }
    }
}

impl From<&str> for ErrorMessage {
    fn from(message: &str) -> Self {
        ErrorMessage::Single(message.to_string())
    }
}

impl From<String> for ErrorMessage {
    fn from(message: String) -> Self {
        ErrorMessage::Single(message)
    }
}

impl From<Vec<String>> for ErrorMessage {
    fn from(messages: Vec<String>) -> Self {
        ErrorMessage::Many(messages)
    }
}

/// What a failing handler knows about its error, before classification.
///
/// Travels in the response extensions from the handler to the responder
/// middleware.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorReport {
    pub declared_status: Option<u16>,
    pub error_type: String,
    pub message: Option<ErrorMessage>,
    pub stack: Option<String>,
    pub details: Option<serde_json::Value>,
}

impl ErrorReport {
    pub fn http(status_code: u16, error_type: impl Into<String>, message: impl Into<ErrorMessage>) -> Self {
        Self {
            declared_status: Some(status_code),
            error_type: error_type.into(),
            message: Some(message.into()),
            stack: None,
            details: None,
        }
    }

    /// Error with no declared status.
    pub fn fault(message: impl Into<ErrorMessage>) -> Self {
        Self {
            declared_status: None,
            error_type: "InternalError".to_string(),
            message: Some(message.into()),
            stack: None,
            details: None,
        }
    }

    pub fn with_error_type(mut self, error_type: impl Into<String>) -> Self {
        self.error_type = error_type.into();
        self
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn without_message(mut self) -> Self {
        self.message = None;
        self
    }

    pub fn into_record(self, path: &str) -> ErrorRecord {
        let kind = classify(self.declared_status);
        let status_code = derive_status_code(self.declared_status);
        let message = self.message.unwrap_or_else(|| match kind {
            ErrorKind::HttpExpected => status_name(status_code).into(),
            ErrorKind::ApplicationFault => GENERIC_FAULT_MESSAGE.into(),
        });

        ErrorRecord {
            kind,
            status_code,
            error_type: self.error_type,
            message,
            stack: self.stack,
            details: self.details,
            path: path.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// A classified failure. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorRecord {
    pub kind: ErrorKind,
    pub status_code: u16,
    pub error_type: String,
    pub message: ErrorMessage,
    pub stack: Option<String>,
    pub details: Option<serde_json::Value>,
    pub path: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody<'a> {
    pub status_code: u16,
    pub timestamp: String,
    pub path: &'a str,
    pub message: &'a ErrorMessage,
    pub error: &'static str,
}

impl<'a> From<&'a ErrorRecord> for ErrorBody<'a> {
    fn from(record: &'a ErrorRecord) -> Self {
        Self {
            status_code: record.status_code,
            timestamp: record.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            path: &record.path,
            message: &record.message,
            error: status_name(record.status_code),
        }
    }
}

/// Response produced for a failed request.
#[derive(Debug, Clone)]
pub struct RenderedError {
    pub status_code: u16,
    pub body: String,
    pub record: ErrorRecord,
}

/// Logs, traces and renders every error that reaches the HTTP boundary.
#[derive(Clone)]
pub struct ExceptionResponder {
    correlator: TraceCorrelator,
    metrics: MetricsRecorder,
}

impl ExceptionResponder {
    pub fn new(correlator: TraceCorrelator, metrics: MetricsRecorder) -> Self {
        Self {
            correlator,
            metrics,
        }
    }

    /// `path` is the request path as received, query string included.
    pub fn respond(
        &self,
        descriptor: &RequestDescriptor,
        path: &str,
        report: ErrorReport,
    ) -> RenderedError {
        let record = report.into_record(path);

        log_error(descriptor, &record);
        self.correlator.on_request_error(descriptor, &record);
        if record.kind == ErrorKind::ApplicationFault && !self.metrics.is_excluded(descriptor) {
            self.metrics.record_error("http", &record.error_type);
        }

        match serde_json::to_string(&ErrorBody::from(&record)) {
            Ok(body) => RenderedError {
                status_code: record.status_code,
                body,
                record,
            },
            Err(err) => {
                error!(error = %err, "failed to serialize error body");
                RenderedError {
                    status_code: 500,
                    body: FALLBACK_BODY.to_string(),
                    record,
                }
            }
        }
    }
}

fn log_error(descriptor: &RequestDescriptor, record: &ErrorRecord) {
    let message = record.message.joined();
    let method = descriptor.method.as_str();
    let path = record.path.as_str();
    let status = record.status_code;
    let error_type = record.error_type.as_str();

    match record.kind {
        ErrorKind::ApplicationFault => error!(
            method,
            path,
            status,
            error.type = error_type,
            error.stack = record.stack.as_deref().unwrap_or_default(),
            "Application error: {method} {path} - {status}: {message}"
        ),
        ErrorKind::HttpExpected => match status {
            429 => warn!(method, path, status, error.type = error_type,
                "Rate limit exceeded: {method} {path} - {status}: {message}"),
            401 | 403 => warn!(method, path, status, error.type = error_type,
                "Access denied: {method} {path} - {status}: {message}"),
            404 => debug!(method, path, status, error.type = error_type,
                "Resource not found: {method} {path} - {status}: {message}"),
            _ => info!(method, path, status, error.type = error_type,
                "HTTP exception: {method} {path} - {status}: {message}"),
        },
    }
}
