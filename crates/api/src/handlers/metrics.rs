use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
};

use crate::routes::AppState;

pub const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

pub async fn render_metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
        state.prometheus.render(),
    )
}
