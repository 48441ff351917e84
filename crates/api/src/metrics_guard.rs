//! HTTP Basic guard for the Prometheus scrape endpoint.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use headers::{authorization::Basic, Authorization, HeaderMapExt};
use tracing::warn;
use users_config::MetricsConfig;

use crate::error::ApiError;
use crate::routes::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MetricsAuthError {
    #[error("Authentication configuration missing")]
    ConfigurationMissing,
    #[error("Authentication required")]
    MissingCredentials,
    #[error("Invalid authentication type")]
    InvalidScheme,
    #[error("Invalid credentials")]
    InvalidCredentials,
}

pub fn check_credentials(config: &MetricsConfig, headers: &HeaderMap) -> Result<(), MetricsAuthError> {
    let (username, password) = config
        .credentials()
        .ok_or(MetricsAuthError::ConfigurationMissing)?;

    if !headers.contains_key(AUTHORIZATION) {
        return Err(MetricsAuthError::MissingCredentials);
    }

    let basic = headers
        .typed_get::<Authorization<Basic>>()
        .ok_or(MetricsAuthError::InvalidScheme)?;

    if basic.username() == username && basic.password() == password {
        Ok(())
    } else {
        Err(MetricsAuthError::InvalidCredentials)
    }
}

/// Outside production a failed check is logged and the scrape proceeds.
pub async fn require_metrics_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Err(err) = check_credentials(&state.metrics_auth, request.headers()) {
        if state.environment.is_production() {
            warn!(reason = %err, "Metrics endpoint access denied");
            return Err(ApiError::unauthorized(err.to_string()));
        }
        warn!(reason = %err, "Metrics authentication failed, access allowed in development");
    }

    Ok(next.run(request).await)
}
