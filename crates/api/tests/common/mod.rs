#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::Value;
use tower::ServiceExt;
use users_api::{routes, with_observability, AppState};
use users_config::{AppConfig, DeploymentEnvironment};
use users_domain::{User, UserRepository, UserService};
use users_infrastructure::{BcryptPasswordHasher, InMemoryUserRepository};
use users_observability::{ExclusionSet, ObservabilityPipeline, PrometheusMetrics};
use users_testing_utils::{RecordingMetrics, RecordingTraceProvider};

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub metrics: Arc<RecordingMetrics>,
    pub traces: Arc<RecordingTraceProvider>,
}

pub struct TestAppBuilder {
    config: AppConfig,
    repository: Arc<dyn UserRepository>,
    traces: Arc<RecordingTraceProvider>,
    extra_routes: Option<Router<AppState>>,
}

impl TestAppBuilder {
    pub fn new() -> Self {
        let mut config = AppConfig::default();
        config.server.simulated_latency_ms = 20;
        config.metrics.username = Some("prometheus".to_string());
        config.metrics.password = Some("scrape".to_string());

        Self {
            config,
            repository: Arc::new(InMemoryUserRepository::new()),
            traces: RecordingTraceProvider::active(),
            extra_routes: None,
        }
    }

    pub fn production(mut self) -> Self {
        self.config.server.environment = DeploymentEnvironment::Production;
        self
    }

    pub fn without_metrics_credentials(mut self) -> Self {
        self.config.metrics.username = None;
        self.config.metrics.password = None;
        self
    }

    pub fn with_repository(mut self, repository: Arc<dyn UserRepository>) -> Self {
        self.repository = repository;
        self
    }

    pub fn without_tracing(mut self) -> Self {
        self.traces = RecordingTraceProvider::inactive();
        self
    }

    pub fn with_routes(mut self, routes: Router<AppState>) -> Self {
        self.extra_routes = Some(routes);
        self
    }

    pub fn build(self) -> TestApp {
        let metrics = RecordingMetrics::new();
        let pipeline = ObservabilityPipeline::new(
            ExclusionSet::new(&self.config.observability.excluded_paths),
            metrics.clone(),
            self.traces.clone(),
        );
        let users = UserService::new(
            self.repository,
            Arc::new(BcryptPasswordHasher::with_cost(4)),
        );
        let prometheus = Arc::new(PrometheusMetrics::new().expect("prometheus recorder"));
        let state = AppState::new(&self.config, users, pipeline, prometheus);

        let mut router = routes(&state);
        if let Some(extra) = self.extra_routes {
            router = router.merge(extra);
        }

        TestApp {
            router: with_observability(router, state.clone()),
            state,
            metrics,
            traces: self.traces,
        }
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response {
        self.send(request("GET", uri, token, None)).await
    }

    pub async fn post_json(&self, uri: &str, token: Option<&str>, body: Value) -> Response {
        self.send(request("POST", uri, token, Some(body))).await
    }

    pub async fn patch_json(&self, uri: &str, token: Option<&str>, body: Value) -> Response {
        self.send(request("PATCH", uri, token, Some(body))).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> Response {
        self.send(request("DELETE", uri, token, None)).await
    }

    /// Registers a user through the public endpoint and returns it.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Value {
        let response = self
            .post_json(
                "/users",
                None,
                serde_json::json!({ "name": name, "email": email, "password": password }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        json_body(response).await
    }

    /// Bearer token for an arbitrary user id, bypassing login.
    pub fn token_for(&self, user: &User) -> String {
        self.state.jwt.generate_token(user).unwrap().access_token
    }
}

pub fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn text_body(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
