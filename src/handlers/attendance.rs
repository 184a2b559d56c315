//! Attendance marking and listing

use axum::extract::State;
use axum::{Extension, Json};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};

use super::error::{ApiError, ApiResult};
use super::extract::{AppJson, AppQuery};
use super::parse_id;
use crate::models::{AttendanceRecord, Event};
use crate::services::{can_mark_attendance, CurrentUser};
use crate::state::AppState;

/// Scan payload; `qrData` is preferred, `participantId` may carry a raw id or token data
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    pub qr_data: Option<String>,
    pub participant_id: Option<String>,
    pub event_id: String,
    pub attendance_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceQuery {
    pub event_id: String,
    pub attendance_date: Option<NaiveDate>,
}

pub async fn mark(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    AppJson(req): AppJson<ScanRequest>,
) -> ApiResult<Json<Value>> {
    let record = mark_from_scan(&state, &user, req).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Attendance marked successfully",
        "attendance": record,
    })))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    AppQuery(query): AppQuery<AttendanceQuery>,
) -> ApiResult<Json<Value>> {
    let event = scannable_event(&state, &user, &query.event_id).await?;
    let records = state.services.attendance.list(event.id, query.attendance_date).await?;
    let stats = state.services.attendance.stats(event.id, query.attendance_date).await?;

    Ok(Json(json!({
        "success": true,
        "attendance": records,
        "stats": stats,
    })))
}

/// Decode the scan, check the caller may mark this event, then record the check-in
pub(crate) async fn mark_from_scan(state: &AppState, user: &CurrentUser, req: ScanRequest) -> ApiResult<AttendanceRecord> {
    let raw = req
        .qr_data
        .filter(|value| !value.trim().is_empty())
        .or(req.participant_id.filter(|value| !value.trim().is_empty()))
        .ok_or_else(|| ApiError::bad_request("Either qrData or participantId is required"))?;
    let participant_id = state.services.codec.resolve_participant_id(&raw)?;

    let event = scannable_event(state, user, &req.event_id).await?;
    let record = state
        .services
        .attendance
        .mark_attendance(participant_id, event.id, req.attendance_date, Some(user.id))
        .await?;
    Ok(record)
}

/// Load an event the caller is allowed to take attendance for
pub(crate) async fn scannable_event(state: &AppState, user: &CurrentUser, event_id: &str) -> ApiResult<Event> {
    let event_id = parse_id(event_id, "event")?;
    let event = state.services.events.get_by_id(event_id).await?;
    if !can_mark_attendance(user, &event) {
        return Err(ApiError::forbidden("You are not assigned to this event"));
    }
    Ok(event)
}
