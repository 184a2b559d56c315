//! Login and session handlers

use axum::extract::State;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::error::{ApiError, ApiResult};
use super::extract::AppJson;
use crate::services::CurrentUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Exchange credentials for a session token
pub async fn login(State(state): State<AppState>, AppJson(req): AppJson<LoginRequest>) -> ApiResult<Json<Value>> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required."));
    }
    state.login_limiter.check(&req.email)?;

    let user = state
        .services
        .auth
        .authenticate(&req.email, &req.password)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;

    let current = CurrentUser::from(&user);
    let token = state.services.auth.issue_token(&current)?;
    info!(user_id = %user.id, "Login succeeded");

    Ok(Json(json!({
        "success": true,
        "user": current,
        "token": token,
    })))
}

pub async fn verify(Extension(user): Extension<CurrentUser>) -> Json<Value> {
    Json(json!({ "success": true, "user": user }))
}

/// Issue a fresh token for the current session
pub async fn refresh(State(state): State<AppState>, Extension(user): Extension<CurrentUser>) -> ApiResult<Json<Value>> {
    let token = state.services.auth.issue_token(&user)?;
    Ok(Json(json!({
        "success": true,
        "user": user,
        "token": token,
    })))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    AppJson(req): AppJson<ChangePasswordRequest>,
) -> ApiResult<Json<Value>> {
    state
        .services
        .auth
        .change_password(user.id, &req.current_password, &req.new_password)
        .await?;
    Ok(Json(json!({ "success": true, "message": "Password updated successfully" })))
}
