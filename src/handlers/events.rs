//! Public event handlers

use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};

use super::error::ApiResult;
use crate::models::EventView;
use crate::state::AppState;
use crate::utils::helpers::today;

pub async fn list_events(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let today = today();
    let events: Vec<EventView> = state
        .services
        .events
        .list_all()
        .await?
        .into_iter()
        .map(|event| EventView::new(event, today))
        .collect();

    Ok(Json(json!({ "success": true, "events": events })))
}

pub async fn get_by_slug(State(state): State<AppState>, Path(slug): Path<String>) -> ApiResult<Json<Value>> {
    let event = state.services.events.get_by_slug(&slug).await?;
    Ok(Json(json!({ "success": true, "event": EventView::new(event, today()) })))
}
