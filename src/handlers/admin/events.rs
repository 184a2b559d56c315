//! Event management

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::handlers::error::ApiResult;
use crate::handlers::extract::AppJson;
use crate::handlers::parse_id;
use crate::models::{EventDraft, EventView};
use crate::services::CurrentUser;
use crate::state::AppState;
use crate::utils::helpers::today;
use crate::utils::logging::log_admin_action;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffRequest {
    pub user_id: String,
}

pub async fn create(
    State(state): State<AppState>,
    Extension(admin): Extension<CurrentUser>,
    AppJson(draft): AppJson<EventDraft>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let event = state.services.events.create(draft).await?;
    log_admin_action(admin.id, "create_event", Some(&event.slug), None);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "event": EventView::new(event, today()) })),
    ))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(admin): Extension<CurrentUser>,
    Path(event_id): Path<String>,
    AppJson(draft): AppJson<EventDraft>,
) -> ApiResult<Json<Value>> {
    let event = state.services.events.update(parse_id(&event_id, "event")?, draft).await?;
    log_admin_action(admin.id, "update_event", Some(&event.slug), None);
    Ok(Json(json!({ "success": true, "event": EventView::new(event, today()) })))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(admin): Extension<CurrentUser>,
    Path(event_id): Path<String>,
) -> ApiResult<Json<Value>> {
    state.services.events.delete(parse_id(&event_id, "event")?).await?;
    log_admin_action(admin.id, "delete_event", Some(&event_id), None);
    Ok(Json(json!({ "success": true })))
}

pub async fn list_staff(State(state): State<AppState>, Path(event_id): Path<String>) -> ApiResult<Json<Value>> {
    let staff = state.services.events.assigned_staff(parse_id(&event_id, "event")?).await?;
    Ok(Json(json!({ "success": true, "staff": staff })))
}

pub async fn assign_staff(
    State(state): State<AppState>,
    Extension(admin): Extension<CurrentUser>,
    Path(event_id): Path<String>,
    AppJson(req): AppJson<StaffRequest>,
) -> ApiResult<Json<Value>> {
    let user_id = parse_id(&req.user_id, "user")?;
    state
        .services
        .events
        .assign_staff(parse_id(&event_id, "event")?, user_id)
        .await?;
    log_admin_action(admin.id, "assign_staff", Some(&event_id), Some(&req.user_id));
    Ok(Json(json!({ "success": true, "message": "Staff assigned successfully" })))
}

pub async fn unassign_staff(
    State(state): State<AppState>,
    Extension(admin): Extension<CurrentUser>,
    Path(event_id): Path<String>,
    AppJson(req): AppJson<StaffRequest>,
) -> ApiResult<Json<Value>> {
    let user_id = parse_id(&req.user_id, "user")?;
    state
        .services
        .events
        .unassign_staff(parse_id(&event_id, "event")?, user_id)
        .await?;
    log_admin_action(admin.id, "unassign_staff", Some(&event_id), Some(&req.user_id));
    Ok(Json(json!({ "success": true, "message": "Staff removed successfully" })))
}

pub async fn participants(State(state): State<AppState>, Path(event_id): Path<String>) -> ApiResult<Json<Value>> {
    let event = state.services.events.get_by_id(parse_id(&event_id, "event")?).await?;
    let participants = state.services.participants.list_by_event(event.id).await?;
    let stats = state.services.attendance.stats(event.id, None).await?;
    Ok(Json(json!({
        "success": true,
        "event": EventView::new(event, today()),
        "participants": participants,
        "stats": stats,
    })))
}

pub async fn all_participants(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let participants = state.services.participants.list_all().await?;
    Ok(Json(json!({ "success": true, "participants": participants })))
}

pub async fn daily_attendance(State(state): State<AppState>, Path(event_id): Path<String>) -> ApiResult<Json<Value>> {
    let days = state
        .services
        .attendance
        .daily_breakdown(parse_id(&event_id, "event")?)
        .await?;
    Ok(Json(json!({ "success": true, "days": days })))
}
