//! Admin routes
//!
//! Mounted under `/admin` behind `require_auth` and `require_admin`.

mod events;
mod notifications;
mod users;

use axum::routing::{get, post, put};
use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/events", post(events::create))
        .route("/events/{event_id}", put(events::update).delete(events::delete))
        .route(
            "/events/{event_id}/staff",
            get(events::list_staff).post(events::assign_staff).delete(events::unassign_staff),
        )
        .route("/events/{event_id}/participants", get(events::participants))
        .route("/events/{event_id}/attendance/daily", get(events::daily_attendance))
        .route("/events/{event_id}/notifications/qr", post(notifications::send_qr))
        .route("/events/{event_id}/notifications/follow-up", post(notifications::send_follow_up))
        .route("/participants", get(events::all_participants))
        .route("/notifications/failed", get(notifications::failed))
        .route("/notifications/retry", post(notifications::retry))
        .route("/users", get(users::list).post(users::create))
        .route("/users/{user_id}", put(users::update).delete(users::delete))
        .route("/maintenance/normalize-emails", post(users::normalize_emails))
}
