use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use users_domain::{CreateUserRequest, UpdateUserRequest, User};

use super::record_outcome;
use crate::{error::ApiResult, extract::ValidatedJson, routes::AppState};

pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let result = state.users.register(request).await;
    let user = record_outcome(&state, "user.create", result)?;
    info!(user_id = user.id, "User registered");
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    let result = state.users.list().await;
    Ok(Json(record_outcome(&state, "user.list", result)?))
}

/// Lists users after the configured artificial delay.
pub async fn list_users_slowly(State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    tokio::time::sleep(state.simulated_latency).await;
    let result = state.users.list().await;
    Ok(Json(record_outcome(&state, "user.list_slow", result)?))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<User>> {
    let result = state.users.get(id).await;
    Ok(Json(record_outcome(&state, "user.get", result)?))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidatedJson(request): ValidatedJson<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    let result = state.users.update(id, request).await;
    let user = record_outcome(&state, "user.update", result)?;
    info!(user_id = user.id, "User updated");
    Ok(Json(user))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    let result = state.users.delete(id).await;
    record_outcome(&state, "user.delete", result)?;
    info!(user_id = id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}
