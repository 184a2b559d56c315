//! Participant QR code and flyer images

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Extension;

use super::error::{ApiError, ApiResult};
use super::parse_id;
use crate::services::{can_mark_attendance, render_qr, CurrentUser};
use crate::state::AppState;
use crate::utils::errors::EventPassError;

const PNG: &str = "image/png";

pub async fn qr(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let participant = state.services.participants.get_by_id(parse_id(&id, "participant")?).await?;
    let event = state.services.events.get_by_id(participant.event_id).await?;
    if !can_mark_attendance(&user, &event) {
        return Err(ApiError::forbidden("You are not assigned to this event"));
    }

    let token = state.services.codec.encode(participant.id);
    let png = render_qr(&token, &state.services.qr_options)?;
    Ok(([(header::CONTENT_TYPE, PNG)], png))
}

pub async fn flyer(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let participant = state.services.participants.get_by_id(parse_id(&id, "participant")?).await?;
    let event = state.services.events.get_by_id(participant.event_id).await?;
    if !can_mark_attendance(&user, &event) {
        return Err(ApiError::forbidden("You are not assigned to this event"));
    }

    let token = state.services.codec.encode(participant.id);
    let disposition = format!("inline; filename=\"flyer-{}.png\"", participant.id);
    let flyer = state.services.flyer.clone();
    let png = tokio::task::spawn_blocking(move || flyer.render(&event, &participant, &token))
        .await
        .map_err(|e| EventPassError::Internal(format!("Flyer task failed: {}", e)))??;

    Ok((
        [(header::CONTENT_TYPE, PNG.to_string()), (header::CONTENT_DISPOSITION, disposition)],
        png,
    ))
}
