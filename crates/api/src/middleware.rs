//! Request pipeline middleware: span creation, panic capture, metrics and
//! trace correlation, and JSON error rendering.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::sync::Once;

use axum::{
    body::{to_bytes, Body},
    extract::{MatchedPath, Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use opentelemetry::{global, propagation::Extractor, trace::TraceContextExt};
use tower_http::{
    catch_panic::CatchPanicLayer,
    classify::{ServerErrorsAsFailures, SharedClassifier},
    cors::{self, CorsLayer},
    trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{field, info_span, Level, Span};
use tracing_opentelemetry::OpenTelemetrySpanExt;
use users_observability::{ErrorRecord, ErrorReport, RequestDescriptor, TRACE_ID_HEADER};

use crate::error::ApiError;
use crate::routes::AppState;

/// Largest framework rejection body read back to build an error message.
const REJECTION_BODY_LIMIT: usize = 64 * 1024;

pub type PanicHandler = fn(Box<dyn Any + Send + 'static>) -> Response;
pub type RequestSpanLayer = TraceLayer<
    SharedClassifier<ServerErrorsAsFailures>,
    fn(&Request) -> Span,
    DefaultOnRequest,
    DefaultOnResponse,
>;

pub fn describe_request(request: &Request) -> RequestDescriptor {
    let template = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str());
    RequestDescriptor::new(request.method().as_str(), request.uri().path(), template)
}

fn path_and_query(request: &Request) -> String {
    request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string())
}

/// Records metrics for every response and exposes the trace id as
/// `X-Trace-ID`. Errors are recognized by the [`ErrorRecord`] that
/// [`respond_errors`] leaves in the response extensions.
pub async fn observe_requests(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let pipeline = &state.pipeline;
    let descriptor = describe_request(&request);
    let start = pipeline.metrics.on_request_start();

    let mut response = next.run(request).await;

    let trace_id = match response.extensions().get::<ErrorRecord>() {
        Some(record) => {
            pipeline
                .metrics
                .on_request_error(&descriptor, Some(record.status_code), start);
            pipeline.correlator.trace_id(&descriptor)
        }
        None => {
            pipeline
                .metrics
                .on_request_success(&descriptor, response.status().as_u16(), start);
            pipeline.correlator.on_request_success(&descriptor)
        }
    };

    if let Some(value) = trace_id.and_then(|id| HeaderValue::from_str(&id).ok()) {
        response.headers_mut().insert(TRACE_ID_HEADER, value);
    }

    response
}

/// Turns every error response into the JSON error body.
///
/// Handler errors carry an [`ErrorReport`]. Anything else with a 4xx/5xx
/// status came from the framework (unknown method, bad path parameter) and
/// its plain-text body becomes the message.
pub async fn respond_errors(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let descriptor = describe_request(&request);
    let path = path_and_query(&request);

    let response = next.run(request).await;
    let (mut parts, body) = response.into_parts();

    let report = match parts.extensions.remove::<ErrorReport>() {
        Some(report) => report,
        None if parts.status.is_client_error() || parts.status.is_server_error() => {
            let text = match to_bytes(body, REJECTION_BODY_LIMIT).await {
                Ok(bytes) => String::from_utf8_lossy(&bytes).trim().to_string(),
                Err(_) => String::new(),
            };
            let report = ErrorReport::http(parts.status.as_u16(), "HttpRejection", text.as_str());
            if text.is_empty() {
                report.without_message()
            } else {
                report
            }
        }
        None => return Response::from_parts(parts, body),
    };

    let rendered = state.pipeline.responder.respond(&descriptor, &path, report);

    parts.status =
        StatusCode::from_u16(rendered.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    parts.extensions.insert(rendered.record);

    Response::from_parts(parts, Body::from(rendered.body))
}

thread_local! {
    static PANIC_BACKTRACE: RefCell<Option<String>> = const { RefCell::new(None) };
}

static BACKTRACE_HOOK: Once = Once::new();

/// Chains a panic hook that keeps the backtrace of the latest panic on the
/// panicking thread. `CatchPanic` calls the handler on that same thread.
fn install_backtrace_hook() {
    BACKTRACE_HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let backtrace = Backtrace::force_capture().to_string();
            PANIC_BACKTRACE.with(|slot| *slot.borrow_mut() = Some(backtrace));
            previous(info);
        }));
    });
}

fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    let backtrace = PANIC_BACKTRACE.with(|slot| slot.borrow_mut().take());
    ApiError::Panic { message, backtrace }.into_response()
}

pub fn catch_panic_layer() -> CatchPanicLayer<PanicHandler> {
    install_backtrace_hook();
    CatchPanicLayer::custom(panic_response as PanicHandler)
}

struct HeaderExtractor<'a>(&'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|value| value.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|key| key.as_str()).collect()
    }
}

/// Root span of a request, continuing any incoming `traceparent`.
fn make_request_span(request: &Request) -> Span {
    let descriptor = describe_request(request);
    let span = info_span!(
        "http_request",
        method = %descriptor.method,
        path = %descriptor.raw_path,
        route = %descriptor.normalized_path,
        trace_id = field::Empty,
        otel.name = %descriptor,
    );

    let parent = global::get_text_map_propagator(|propagator| {
        propagator.extract(&HeaderExtractor(request.headers()))
    });
    span.set_parent(parent);

    let span_context = span.context().span().span_context().clone();
    if span_context.is_valid() {
        span.record("trace_id", field::display(span_context.trace_id()));
    }

    span
}

pub fn trace_layer() -> RequestSpanLayer {
    TraceLayer::new_for_http()
        .make_span_with(make_request_span as fn(&Request) -> Span)
        .on_response(DefaultOnResponse::new().level(Level::INFO))
}

pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers(cors::Any)
}
