//! HTTP handlers
//!
//! Routes are split into three groups:
//! - public: health, login, event listing and self-registration
//! - authenticated: scanner app, attendance, QR and flyer downloads
//! - admin: everything under `/admin`

pub mod admin;
pub mod attendance;
pub mod auth;
pub mod error;
pub mod events;
pub mod extract;
pub mod mobile;
pub mod participants;
pub mod registration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use uuid::Uuid;

pub use error::{ApiError, ApiResult};

use crate::middleware::{http_trace_layer, require_admin, require_auth};
use crate::state::AppState;

/// Parse a path or body identifier, rejecting malformed values with 400
pub(crate) fn parse_id(value: &str, what: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(value.trim()).map_err(|_| ApiError::bad_request(format!("Invalid {} id", what)))
}

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let status = state.services.health_check().await;
    let code = if status.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        code,
        Json(json!({
            "success": status.is_healthy(),
            "version": crate::VERSION,
            "issues": status.get_issues(),
        })),
    )
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/auth/login", post(auth::login))
        .route("/events", get(events::list_events))
        .route("/events/slug/{slug}", get(events::get_by_slug))
        .route("/register/{slug}", post(registration::register));

    let authenticated = Router::new()
        .route("/auth/verify", get(auth::verify))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/change-password", post(auth::change_password))
        .route("/attendance", post(attendance::mark).get(attendance::list))
        .route("/mobile/events", get(mobile::events))
        .route("/mobile/participants/{event_id}", get(mobile::participants))
        .route("/mobile/scan", post(mobile::scan))
        .route("/mobile/onboard", post(mobile::onboard))
        .route("/participants/{participant_id}/qr", get(participants::qr))
        .route("/participants/{participant_id}/flyer", get(participants::flyer))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    let admin = admin::router()
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public)
        .merge(authenticated)
        .nest("/admin", admin)
        .layer(http_trace_layer())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
