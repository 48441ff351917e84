use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{Method, Uri},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use users_config::{AppConfig, DeploymentEnvironment, MetricsConfig};
use users_domain::UserService;
use users_observability::{ObservabilityPipeline, PrometheusMetrics};

use crate::{
    auth::{require_jwt, JwtService},
    error::ApiError,
    handlers::{
        auth::{login, profile},
        health::health_check,
        metrics::render_metrics,
        users::{create_user, delete_user, get_user, list_users, list_users_slowly, update_user},
    },
    metrics_guard::require_metrics_auth,
    middleware::{catch_panic_layer, cors_layer, observe_requests, respond_errors, trace_layer},
};

/// API应用状态
#[derive(Clone)]
pub struct AppState {
    pub users: UserService,
    pub jwt: Arc<JwtService>,
    pub pipeline: ObservabilityPipeline,
    pub prometheus: Arc<PrometheusMetrics>,
    pub metrics_auth: MetricsConfig,
    pub environment: DeploymentEnvironment,
    pub simulated_latency: Duration,
    pub cors_enabled: bool,
}

impl AppState {
    pub fn new(
        config: &AppConfig,
        users: UserService,
        pipeline: ObservabilityPipeline,
        prometheus: Arc<PrometheusMetrics>,
    ) -> Self {
        Self {
            users,
            jwt: Arc::new(JwtService::new(
                &config.auth.jwt_secret,
                &config.auth.jwt_expires_in,
            )),
            pipeline,
            prometheus,
            metrics_auth: config.metrics.clone(),
            environment: config.server.environment,
            simulated_latency: Duration::from_millis(config.server.simulated_latency_ms),
            cors_enabled: config.server.cors_enabled,
        }
    }
}

/// 路由表，不含可观测性中间件
pub fn routes(state: &AppState) -> Router<AppState> {
    let jwt = from_fn_with_state(state.clone(), require_jwt);
    let metrics_auth = from_fn_with_state(state.clone(), require_metrics_auth);

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(render_metrics).route_layer(metrics_auth))
        // POST /users is registration and stays public
        .route(
            "/users",
            get(list_users).route_layer(jwt.clone()).post(create_user),
        )
        .route(
            "/users/simulate-latency",
            get(list_users_slowly).route_layer(jwt.clone()),
        )
        .route(
            "/users/{id}",
            get(get_user)
                .patch(update_user)
                .delete(delete_user)
                .route_layer(jwt.clone()),
        )
        .route("/auth/login", post(login))
        .route("/auth/profile", get(profile).route_layer(jwt))
        .fallback(route_not_found)
}

/// Wraps every route, the fallback and 405 responses in the request pipeline.
/// Layers run outermost first: CORS, request span, metrics, error rendering,
/// panic capture.
pub fn with_observability(router: Router<AppState>, state: AppState) -> Router {
    let router = router
        .layer(catch_panic_layer())
        .layer(from_fn_with_state(state.clone(), respond_errors))
        .layer(from_fn_with_state(state.clone(), observe_requests))
        .layer(trace_layer());

    let router = if state.cors_enabled {
        router.layer(cors_layer())
    } else {
        router
    };

    router.with_state(state)
}

/// 创建API应用
pub fn create_app(state: AppState) -> Router {
    with_observability(routes(&state), state)
}

async fn route_not_found(method: Method, uri: Uri) -> ApiError {
    ApiError::NotFound(format!("Cannot {method} {}", uri.path()))
}
