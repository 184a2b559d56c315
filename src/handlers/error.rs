//! HTTP error responses
//!
//! Every failure leaves the API as `{success: false, error, code}`.
//! Infrastructure errors are logged here and reported with a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use tracing::error;

use crate::utils::errors::{CodecError, EventPassError};

#[derive(Debug)]
pub struct ApiError(pub EventPassError);

impl From<EventPassError> for ApiError {
    fn from(err: EventPassError) -> Self {
        ApiError(err)
    }
}

impl From<CodecError> for ApiError {
    fn from(err: CodecError) -> Self {
        ApiError(EventPassError::Codec(err))
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl ApiError {
    pub fn unauthorized(message: &str) -> Self {
        ApiError(EventPassError::Authentication(message.to_string()))
    }

    pub fn forbidden(message: &str) -> Self {
        ApiError(EventPassError::PermissionDenied(message.to_string()))
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError(EventPassError::Validation(message.into()))
    }

    /// Status, machine-readable code and client-facing message
    fn parts(&self) -> (StatusCode, &'static str, String) {
        use EventPassError::*;

        match &self.0 {
            Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            Codec(CodecError::InvalidFormat) => (StatusCode::BAD_REQUEST, "INVALID_QR_FORMAT", "Invalid QR code format".into()),
            Codec(CodecError::InvalidToken) => (StatusCode::BAD_REQUEST, "INVALID_QR", "Invalid QR code".into()),

            DuplicateSlug { .. } => (StatusCode::CONFLICT, "DUPLICATE_SLUG", self.0.to_string()),
            DuplicateEmail => (StatusCode::CONFLICT, "DUPLICATE_EMAIL", self.0.to_string()),
            DuplicatePhone => (StatusCode::CONFLICT, "DUPLICATE_PHONE", self.0.to_string()),
            DuplicateUserEmail => (StatusCode::CONFLICT, "DUPLICATE_USER_EMAIL", self.0.to_string()),
            AlreadyMarked { .. } => (StatusCode::CONFLICT, "ALREADY_MARKED", self.0.to_string()),
            StaffAlreadyAssigned => (StatusCode::CONFLICT, "STAFF_ALREADY_ASSIGNED", self.0.to_string()),

            EventNotFound { .. } => (StatusCode::NOT_FOUND, "EVENT_NOT_FOUND", "Event not found".into()),
            ParticipantNotFound { .. } => (StatusCode::NOT_FOUND, "PARTICIPANT_NOT_FOUND", "Participant not found for this event".into()),
            UserNotFound { .. } => (StatusCode::NOT_FOUND, "USER_NOT_FOUND", "User not found".into()),
            StaffNotAssigned => (StatusCode::NOT_FOUND, "STAFF_NOT_ASSIGNED", self.0.to_string()),

            Authentication(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
            Token(_) => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN", "Invalid token".into()),
            PermissionDenied(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
            RateLimitExceeded => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED", "Too many attempts, try again later".into()),

            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", "Internal server error".into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        if status.is_server_error() {
            error!(error = %self.0, severity = %self.0.severity(), "Request failed");
        }

        let mut body = json!({
            "success": false,
            "error": message,
            "code": code,
        });
        if let EventPassError::AlreadyMarked { existing } = &self.0 {
            body["attendance"] = serde_json::to_value(existing.as_ref()).unwrap_or(Value::Null);
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(err: EventPassError) -> StatusCode {
        ApiError(err).into_response().status()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status(EventPassError::Validation("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status(EventPassError::DuplicateEmail), StatusCode::CONFLICT);
        assert_eq!(status(EventPassError::EventNotFound { event_id: "x".into() }), StatusCode::NOT_FOUND);
        assert_eq!(status(EventPassError::Authentication("x".into())), StatusCode::UNAUTHORIZED);
        assert_eq!(status(EventPassError::PermissionDenied("x".into())), StatusCode::FORBIDDEN);
        assert_eq!(status(EventPassError::RateLimitExceeded), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(status(EventPassError::Mail("smtp down".into())), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(status(CodecError::InvalidToken.into()), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let (_, code, message) = ApiError(EventPassError::Internal("pool exhausted".into())).parts();
        assert_eq!(code, "INTERNAL_ERROR");
        assert!(!message.contains("pool"));
    }
}
