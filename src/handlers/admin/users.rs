//! Staff account management and maintenance actions

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde_json::{json, Value};

use crate::handlers::error::{ApiError, ApiResult};
use crate::handlers::extract::AppJson;
use crate::handlers::parse_id;
use crate::models::{CreateUserRequest, UpdateUserRequest};
use crate::services::CurrentUser;
use crate::state::AppState;
use crate::utils::logging::log_admin_action;

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let users = state.services.auth.list_users().await?;
    Ok(Json(json!({ "success": true, "users": users })))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(admin): Extension<CurrentUser>,
    AppJson(req): AppJson<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let user = state.services.auth.create_user(req).await?;
    log_admin_action(admin.id, "create_user", Some(&user.email), Some(user.role.as_str()));
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "user": user }))))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(admin): Extension<CurrentUser>,
    Path(user_id): Path<String>,
    AppJson(req): AppJson<UpdateUserRequest>,
) -> ApiResult<Json<Value>> {
    let user = state.services.auth.update_user(parse_id(&user_id, "user")?, req).await?;
    log_admin_action(admin.id, "update_user", Some(&user.email), None);
    Ok(Json(json!({ "success": true, "user": user })))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(admin): Extension<CurrentUser>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let user_id = parse_id(&user_id, "user")?;
    if user_id == admin.id {
        return Err(ApiError::bad_request("You cannot delete your own account."));
    }
    state.services.auth.delete_user(user_id).await?;
    log_admin_action(admin.id, "delete_user", Some(&user_id.to_string()), None);
    Ok(Json(json!({ "success": true })))
}

pub async fn normalize_emails(
    State(state): State<AppState>,
    Extension(admin): Extension<CurrentUser>,
) -> ApiResult<Json<Value>> {
    let report = state.services.participants.normalize_stored_emails().await?;
    log_admin_action(admin.id, "normalize_emails", None, Some(&format!("updated {}", report.updated)));
    Ok(Json(json!({
        "success": true,
        "updated": report.updated,
        "errors": report.errors,
    })))
}
