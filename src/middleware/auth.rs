//! Authentication middleware
//!
//! `require_auth` resolves the bearer token into a [`CurrentUser`] request
//! extension; `require_admin` is layered inside it on admin route groups.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use axum::Extension;
use tracing::debug;

use crate::handlers::error::ApiError;
use crate::services::auth::{extract_bearer, CurrentUser};
use crate::state::AppState;
use crate::utils::logging::log_security_event;

/// Reject requests without a valid session token
pub async fn require_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(extract_bearer);

    let Some(token) = token else {
        log_security_event("auth_missing", None, Some(req.uri().path()));
        return Err(ApiError::unauthorized("Authentication required"));
    };

    let user = state.services.auth.current_user(token).map_err(|e| {
        log_security_event("auth_failed", None, Some(&e.to_string()));
        ApiError::from(e)
    })?;

    debug!(user_id = %user.id, path = %req.uri().path(), "Request authenticated");
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Reject authenticated non-admin users
pub async fn require_admin(Extension(user): Extension<CurrentUser>, req: Request, next: Next) -> Result<Response, ApiError> {
    if !user.is_admin() {
        log_security_event("admin_denied", Some(&user.email), Some(req.uri().path()));
        return Err(ApiError::forbidden("Admin privileges required"));
    }
    Ok(next.run(req).await)
}
