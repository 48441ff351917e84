//! Request observability for the users service.
//!
//! Each monitored request flows through the same four pieces: the path
//! normalizer labels it, the metrics recorder counts and times it, the trace
//! correlator exposes the trace id and annotates the span, and the exception
//! responder classifies and renders any failure.

pub mod exception_classifier;
pub mod metrics_recorder;
pub mod otel;
pub mod path_normalizer;
pub mod prometheus;
pub mod telemetry_setup;
pub mod trace_correlator;

use std::sync::Arc;

pub use exception_classifier::{
    classify, derive_status_code, status_name, ErrorBody, ErrorKind, ErrorMessage, ErrorRecord,
    ErrorReport, ExceptionResponder, RenderedError, FALLBACK_BODY, GENERIC_FAULT_MESSAGE,
};
pub use metrics_recorder::{
    EventStatus, MetricLabels, MetricsBackend, MetricsError, MetricsRecorder, StartMarker,
    APP_ERRORS_TOTAL, APP_EVENTS_TOTAL, DURATION_BUCKETS, HTTP_REQUESTS_TOTAL,
    HTTP_REQUEST_DURATION_SECONDS,
};
pub use otel::OtelTraceProvider;
pub use path_normalizer::{normalize_path, ExclusionSet, RequestDescriptor};
pub use prometheus::PrometheusMetrics;
pub use telemetry_setup::{init_telemetry, TelemetryGuard};
pub use trace_correlator::{
    ActiveSpan, NoopTraceProvider, SpanValue, TraceContextProvider, TraceCorrelator,
    TRACE_ID_HEADER,
};

/// The wired pipeline, built once at startup from its collaborators.
#[derive(Clone)]
pub struct ObservabilityPipeline {
    pub exclusions: Arc<ExclusionSet>,
    pub metrics: MetricsRecorder,
    pub correlator: TraceCorrelator,
    pub responder: ExceptionResponder,
}

impl ObservabilityPipeline {
    pub fn new(
        exclusions: ExclusionSet,
        metrics_backend: Arc<dyn MetricsBackend>,
        trace_provider: Arc<dyn TraceContextProvider>,
    ) -> Self {
        let exclusions = Arc::new(exclusions);
        let metrics = MetricsRecorder::new(metrics_backend, exclusions.clone());
        let correlator = TraceCorrelator::new(trace_provider, exclusions.clone());
        let responder = ExceptionResponder::new(correlator.clone(), metrics.clone());

        Self {
            exclusions,
            metrics,
            correlator,
            responder,
        }
    }
}
