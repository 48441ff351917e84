//! HTTP request counters and latency histograms.

use std::sync::Arc;
use std::time::Instant;

use tracing::warn;

use crate::exception_classifier::derive_status_code;
use crate::path_normalizer::{ExclusionSet, RequestDescriptor};

pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";
pub const APP_EVENTS_TOTAL: &str = "app_events_total";
pub const APP_ERRORS_TOTAL: &str = "app_errors_total";

/// Latency histogram bucket boundaries, in seconds.
pub const DURATION_BUCKETS: &[f64] = &[0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0];

pub type MetricLabels = [(&'static str, String)];

#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("invalid label {label}: {reason}")]
    InvalidLabel { label: &'static str, reason: String },
    #[error("metrics backend failure: {0}")]
    Backend(String),
}

/// Counter and histogram sink. Implementations must tolerate concurrent writers.
pub trait MetricsBackend: Send + Sync {
    fn increment_counter(&self, name: &'static str, labels: &MetricLabels) -> Result<(), MetricsError>;

    fn observe_histogram(
        &self,
        name: &'static str,
        labels: &MetricLabels,
        value: f64,
    ) -> Result<(), MetricsError>;
}

/// Monotonic timestamp taken when a request enters the pipeline.
#[derive(Debug, Clone, Copy)]
pub struct StartMarker(Instant);

impl StartMarker {
    pub fn now() -> Self {
        Self(Instant::now())
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.0.elapsed().as_secs_f64()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
    Success,
    Failure,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Success => "success",
            EventStatus::Failure => "failure",
        }
    }
}

/// Records one counter increment and one histogram observation per
/// monitored request. Never fails: backend errors are logged and dropped.
#[derive(Clone)]
pub struct MetricsRecorder {
    backend: Arc<dyn MetricsBackend>,
    exclusions: Arc<ExclusionSet>,
}

impl MetricsRecorder {
    pub fn new(backend: Arc<dyn MetricsBackend>, exclusions: Arc<ExclusionSet>) -> Self {
        Self {
            backend,
            exclusions,
        }
    }

    pub fn on_request_start(&self) -> StartMarker {
        StartMarker::now()
    }

    pub fn on_request_success(
        &self,
        descriptor: &RequestDescriptor,
        status_code: u16,
        start: StartMarker,
    ) {
        let elapsed = start.elapsed_seconds();
        self.record_request(descriptor, status_code, elapsed);
    }

    /// Same as a success, with the status derived from the error's declared
    /// status (500 when it has none).
    pub fn on_request_error(
        &self,
        descriptor: &RequestDescriptor,
        declared_status: Option<u16>,
        start: StartMarker,
    ) {
        let elapsed = start.elapsed_seconds();
        self.record_request(descriptor, derive_status_code(declared_status), elapsed);
    }

    pub fn record_event(&self, event: &str, status: EventStatus) {
        let labels = [
            ("event", event.to_string()),
            ("status", status.as_str().to_string()),
        ];
        if let Err(err) = self.backend.increment_counter(APP_EVENTS_TOTAL, &labels) {
            warn!(error = %err, metric = APP_EVENTS_TOTAL, "failed to record metric");
        }
    }

    pub fn record_error(&self, source: &str, error_type: &str) {
        let labels = [
            ("source", source.to_string()),
            ("errorType", error_type.to_string()),
        ];
        if let Err(err) = self.backend.increment_counter(APP_ERRORS_TOTAL, &labels) {
            warn!(error = %err, metric = APP_ERRORS_TOTAL, "failed to record metric");
        }
    }

    pub fn is_excluded(&self, descriptor: &RequestDescriptor) -> bool {
        self.exclusions.is_excluded(&descriptor.normalized_path)
    }

    fn record_request(&self, descriptor: &RequestDescriptor, status_code: u16, elapsed: f64) {
        if self.is_excluded(descriptor) {
            return;
        }

        if !(100..=599).contains(&status_code) {
            warn!(
                status_code,
                path = %descriptor.normalized_path,
                "status code outside 100-599, request not recorded"
            );
            return;
        }

        let labels = [
            ("method", descriptor.method.clone()),
            ("path", descriptor.normalized_path.clone()),
            ("statusCode", status_code.to_string()),
        ];

        if let Err(err) = self.backend.increment_counter(HTTP_REQUESTS_TOTAL, &labels) {
            warn!(error = %err, metric = HTTP_REQUESTS_TOTAL, "failed to record metric");
        }
        if let Err(err) =
            self.backend
                .observe_histogram(HTTP_REQUEST_DURATION_SECONDS, &labels, elapsed)
        {
            warn!(error = %err, metric = HTTP_REQUEST_DURATION_SECONDS, "failed to record metric");
        }
    }
}
