use axum::{extract::State, Json};
use serde::Serialize;
use tracing::info;
use users_domain::LoginRequest;

use super::record_outcome;
use crate::{
    auth::AuthenticatedUser,
    error::{ApiError, ApiResult},
    extract::ValidatedJson,
    routes::AppState,
};

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_at: i64,
    pub user_id: i64,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: i64,
    pub email: String,
    pub roles: Vec<String>,
}

pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let result = state
        .users
        .authenticate(&request.email, &request.password)
        .await;
    let user = record_outcome(&state, "auth.login", result)?;

    let token = state
        .jwt
        .generate_token(&user)
        .map_err(|err| ApiError::Internal(anyhow::anyhow!("failed to sign token: {err}")))?;

    info!(user_id = user.id, "User logged in");

    Ok(Json(LoginResponse {
        access_token: token.access_token,
        token_type: "Bearer",
        expires_at: token.expires_at,
        user_id: user.id,
    }))
}

pub async fn profile(user: AuthenticatedUser) -> Json<ProfileResponse> {
    Json(ProfileResponse {
        id: user.user_id,
        email: user.email,
        roles: user.roles,
    })
}
