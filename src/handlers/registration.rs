//! Public self-registration

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use super::error::ApiResult;
use super::extract::AppJson;
use crate::models::{ParticipantDraft, RegisterOptions};
use crate::state::AppState;

/// Register for the event behind `slug`; the event id in the body is ignored
pub async fn register(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    AppJson(mut draft): AppJson<ParticipantDraft>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let event = state.services.events.get_by_slug(&slug).await?;
    draft.event_id = event.id;

    let participant_id = state
        .services
        .participants
        .register(draft, RegisterOptions::default())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "participantId": participant_id })),
    ))
}
