//! Scanner app endpoints

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde_json::{json, Value};

use super::attendance::{mark_from_scan, scannable_event, ScanRequest};
use super::error::{ApiError, ApiResult};
use super::extract::AppJson;
use crate::models::EventView;
use crate::services::{CurrentUser, OnboardRequest};
use crate::state::AppState;
use crate::utils::helpers::today;

/// Active events the caller may scan for
pub async fn events(State(state): State<AppState>, Extension(user): Extension<CurrentUser>) -> ApiResult<Json<Value>> {
    let today = today();
    let events: Vec<EventView> = state
        .services
        .events
        .list_for_scanner(&user, today)
        .await?
        .into_iter()
        .map(|event| EventView::new(event, today))
        .collect();

    Ok(Json(json!({ "success": true, "events": events })))
}

pub async fn participants(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(event_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let event = scannable_event(&state, &user, &event_id).await?;
    let participants: Vec<Value> = state
        .services
        .participants
        .list_by_event(event.id)
        .await?
        .into_iter()
        .map(|p| {
            json!({
                "id": p.id,
                "name": p.name,
                "organization": p.organization,
                "designation": p.designation,
                "department": p.department,
                "position": p.position,
                "contact": p.contact,
                "phone": p.phone,
                "eventId": p.event_id,
                "eventName": event.name,
            })
        })
        .collect();

    Ok(Json(json!({ "success": true, "participants": participants })))
}

pub async fn scan(
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

/// Register a walk-in participant and check them in for today
pub async fn onboard(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    AppJson(req): AppJson<OnboardRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    if req.first_name.trim().is_empty() || req.last_name.trim().is_empty() || req.phone.trim().is_empty() {
        return Err(ApiError::bad_request("Missing required fields"));
    }
    scannable_event(&state, &user, &req.event_id.to_string()).await?;

    let result = state.services.participants.onboard(&user, req).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "participantId": result.participant.id,
            "participant": result.participant,
            "attendance": result.attendance,
        })),
    ))
}
