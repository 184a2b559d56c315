//! Bulk and follow-up emails, outbox inspection

use axum::extract::{Path, State};
use axum::{Extension, Json};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::handlers::error::{ApiError, ApiResult};
use crate::handlers::extract::AppJson;
use crate::handlers::parse_id;
use crate::services::{CurrentUser, EmailAttachment, FollowUpRequest};
use crate::state::AppState;
use crate::utils::helpers::sanitize_filename;
use crate::utils::logging::log_admin_action;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BulkQrRequest {
    pub only_unsent: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageUpload {
    pub filename: String,
    pub content_type: String,
    pub data_base64: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FollowUpBody {
    pub participant_ids: Option<Vec<Uuid>>,
    pub custom_message: Option<String>,
    pub survey_link: Option<String>,
    pub image: Option<ImageUpload>,
}

impl TryFrom<ImageUpload> for EmailAttachment {
    type Error = ApiError;

    fn try_from(upload: ImageUpload) -> Result<Self, Self::Error> {
        if !upload.content_type.starts_with("image/") {
            return Err(ApiError::bad_request("Attachment must be an image."));
        }
        let data = STANDARD
            .decode(upload.data_base64.trim())
            .map_err(|_| ApiError::bad_request("Attachment data is not valid base64."))?;
        if data.is_empty() {
            return Err(ApiError::bad_request("Attachment is empty."));
        }

        Ok(EmailAttachment {
            filename: sanitize_filename(&upload.filename),
            content_type: upload.content_type,
            data,
        })
    }
}

pub async fn send_qr(
    State(state): State<AppState>,
    Extension(admin): Extension<CurrentUser>,
    Path(event_id): Path<String>,
    body: Option<AppJson<BulkQrRequest>>,
) -> ApiResult<Json<Value>> {
    let req = body.map(|AppJson(req)| req).unwrap_or_default();
    let event_id = parse_id(&event_id, "event")?;
    log_admin_action(admin.id, "send_bulk_qr", Some(&event_id.to_string()), None);

    let report = state.services.notifications.send_bulk_qr(event_id, req.only_unsent).await?;
    Ok(Json(json!({ "success": true, "report": report })))
}

pub async fn send_follow_up(
    State(state): State<AppState>,
    Extension(admin): Extension<CurrentUser>,
    Path(event_id): Path<String>,
    AppJson(body): AppJson<FollowUpBody>,
) -> ApiResult<Json<Value>> {
    let event_id = parse_id(&event_id, "event")?;
    let request = FollowUpRequest {
        participant_ids: body.participant_ids,
        custom_message: body.custom_message,
        survey_link: body.survey_link,
        image: body.image.map(EmailAttachment::try_from).transpose()?,
    };
    log_admin_action(admin.id, "send_follow_up", Some(&event_id.to_string()), None);

    let report = state.services.notifications.send_follow_up(event_id, request).await?;
    Ok(Json(json!({ "success": true, "report": report })))
}

pub async fn failed(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let entries = state.services.notifications.failed_entries().await?;
    Ok(Json(json!({ "success": true, "entries": entries })))
}

pub async fn retry(State(state): State<AppState>, Extension(admin): Extension<CurrentUser>) -> ApiResult<Json<Value>> {
    log_admin_action(admin.id, "retry_notifications", None, None);
    let report = state.services.notifications.retry_failed().await?;
    Ok(Json(json!({ "success": true, "report": report })))
}
