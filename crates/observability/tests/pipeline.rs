use users_observability::{
    ErrorKind, ErrorReport, ExclusionSet, ObservabilityPipeline, RequestDescriptor,
    APP_ERRORS_TOTAL, HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION_SECONDS,
};
use users_testing_utils::{RecordingMetrics, RecordingTraceProvider, RECORDED_TRACE_ID};

fn pipeline() -> (
    ObservabilityPipeline,
    std::sync::Arc<RecordingMetrics>,
    std::sync::Arc<RecordingTraceProvider>,
) {
    let metrics = RecordingMetrics::new();
    let traces = RecordingTraceProvider::active();
    let pipeline = ObservabilityPipeline::new(
        ExclusionSet::new(["/health", "/metrics", "/api-docs"]),
        metrics.clone(),
        traces.clone(),
    );
    (pipeline, metrics, traces)
}

#[test]
fn excluded_paths_record_nothing_anywhere() {
    let (pipeline, metrics, traces) = pipeline();

    for path in ["/health", "/metrics", "/api-docs/index.html", "/health/"] {
        let descriptor = RequestDescriptor::new("GET", path, None);
        let start = pipeline.metrics.on_request_start();
        pipeline.metrics.on_request_success(&descriptor, 200, start);
        assert!(pipeline.correlator.on_request_success(&descriptor).is_none());

        let rendered = pipeline
            .responder
            .respond(&descriptor, path, ErrorReport::fault("boom"));
        assert_eq!(rendered.status_code, 500);
        pipeline
            .metrics
            .on_request_error(&descriptor, None, pipeline.metrics.on_request_start());
    }

    assert!(metrics.is_empty());
    assert!(traces.is_untouched());
}

#[test]
fn successful_request_records_exactly_one_sample() {
    let (pipeline, metrics, _traces) = pipeline();
    let descriptor = RequestDescriptor::new("GET", "/users/42", Some("/users/{id}"));

    let start = pipeline.metrics.on_request_start();
    pipeline.metrics.on_request_success(&descriptor, 200, start);
    let trace_id = pipeline.correlator.on_request_success(&descriptor);

    assert_eq!(trace_id.as_deref(), Some(RECORDED_TRACE_ID));

    let counters = metrics.counters(HTTP_REQUESTS_TOTAL);
    assert_eq!(counters.len(), 1);
    assert_eq!(counters[0].label("method"), Some("GET"));
    assert_eq!(counters[0].label("path"), Some("/users/:id"));
    assert_eq!(counters[0].label("statusCode"), Some("200"));
    assert_eq!(metrics.histograms(HTTP_REQUEST_DURATION_SECONDS).len(), 1);
}

#[test]
fn conflict_is_expected_and_annotated_as_event() {
    let (pipeline, metrics, traces) = pipeline();
    let descriptor = RequestDescriptor::new("POST", "/users", None);

    let rendered = pipeline.responder.respond(
        &descriptor,
        "/users",
        ErrorReport::http(409, "Conflict", "User with email 'a@b.io' already exists"),
    );

    assert_eq!(rendered.record.kind, ErrorKind::HttpExpected);
    let body: serde_json::Value = serde_json::from_str(&rendered.body).unwrap();
    assert_eq!(body["statusCode"], 409);
    assert_eq!(body["error"], "Conflict");
    assert_eq!(body["path"], "/users");
    assert_eq!(body["message"], "User with email 'a@b.io' already exists");

    let span = traces.span();
    assert!(span.error_status.is_none());
    assert_eq!(span.event_names(), vec!["http.exception"]);
    assert!(metrics.counters(APP_ERRORS_TOTAL).is_empty());
}

#[test]
fn undeclared_error_is_fault_with_500() {
    let (pipeline, metrics, traces) = pipeline();
    let descriptor = RequestDescriptor::new("GET", "/users", None);

    let rendered = pipeline.responder.respond(
        &descriptor,
        "/users",
        ErrorReport::fault("Internal server error").with_stack("pool timed out"),
    );
    pipeline
        .metrics
        .on_request_error(&descriptor, None, pipeline.metrics.on_request_start());

    assert_eq!(rendered.status_code, 500);
    let body: serde_json::Value = serde_json::from_str(&rendered.body).unwrap();
    assert_eq!(body["error"], "Internal Server Error");
    assert!(!rendered.body.contains("pool timed out"));

    let span = traces.span();
    assert_eq!(span.error_status.as_deref(), Some("Internal server error"));
    assert!(span.attribute("error.type").is_some());
    assert!(span.attribute("error.message").is_some());

    assert_eq!(
        metrics.counters(HTTP_REQUESTS_TOTAL)[0].label("statusCode"),
        Some("500")
    );
    assert_eq!(metrics.counters(APP_ERRORS_TOTAL).len(), 1);
}

#[test]
fn inactive_tracing_is_silent() {
    let metrics = RecordingMetrics::new();
    let pipeline = ObservabilityPipeline::new(
        ExclusionSet::default(),
        metrics.clone(),
        RecordingTraceProvider::inactive(),
    );
    let descriptor = RequestDescriptor::new("GET", "/users", None);

    assert!(pipeline.correlator.on_request_success(&descriptor).is_none());
    let rendered = pipeline
        .responder
        .respond(&descriptor, "/users", ErrorReport::fault("boom"));
    assert_eq!(rendered.status_code, 500);
}
