//! Error handling for EventPass
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy.

use thiserror::Error;
use uuid::Uuid;

use crate::models::AttendanceRecord;

/// Main error type for EventPass application
#[derive(Error, Debug)]
pub enum EventPassError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration load error: {0}")]
    ConfigLoad(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("An event with the URL slug '{slug}' already exists")]
    DuplicateSlug { slug: String },

    #[error("This email address is already registered for this event")]
    DuplicateEmail,

    #[error("This phone number is already registered for this event")]
    DuplicatePhone,

    #[error("A user with this email address already exists")]
    DuplicateUserEmail,

    #[error("Attendance already marked for {}", .existing.attendance_date)]
    AlreadyMarked { existing: Box<AttendanceRecord> },

    #[error("User is already assigned to this event")]
    StaffAlreadyAssigned,

    #[error("User is not assigned to this event")]
    StaffNotAssigned,

    #[error("Event not found: {event_id}")]
    EventNotFound { event_id: String },

    #[error("Participant not found for this event: {participant_id}")]
    ParticipantNotFound { participant_id: String },

    #[error("User not found: {user_id}")]
    UserNotFound { user_id: Uuid },

    #[error("QR code error: {0}")]
    Codec(#[from] CodecError),

    #[error("Render failure: {0}")]
    RenderFailure(String),

    #[error("Mail delivery error: {0}")]
    Mail(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// QR token codec errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Invalid QR code format")]
    InvalidFormat,

    #[error("Invalid QR code")]
    InvalidToken,
}

/// Result type alias for EventPass operations
pub type Result<T> = std::result::Result<T, EventPassError>;

/// Result type alias for codec operations
pub type CodecResult<T> = std::result::Result<T, CodecError>;

impl EventPassError {
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EventPassError::Database(_) => ErrorSeverity::Critical,
            EventPassError::Migration(_) => ErrorSeverity::Critical,
            EventPassError::Config(_) | EventPassError::ConfigLoad(_) => ErrorSeverity::Critical,
            EventPassError::PermissionDenied(_) => ErrorSeverity::Warning,
            EventPassError::Authentication(_) => ErrorSeverity::Warning,
            EventPassError::Token(_) => ErrorSeverity::Warning,
            EventPassError::RateLimitExceeded => ErrorSeverity::Warning,
            EventPassError::Validation(_)
            | EventPassError::Codec(_)
            | EventPassError::DuplicateSlug { .. }
            | EventPassError::DuplicateEmail
            | EventPassError::DuplicatePhone
            | EventPassError::DuplicateUserEmail
            | EventPassError::AlreadyMarked { .. }
            | EventPassError::StaffAlreadyAssigned
            | EventPassError::StaffNotAssigned
            | EventPassError::EventNotFound { .. }
            | EventPassError::ParticipantNotFound { .. }
            | EventPassError::UserNotFound { .. } => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }

    /// Whether the error reports a uniqueness conflict
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            EventPassError::DuplicateSlug { .. }
                | EventPassError::DuplicateEmail
                | EventPassError::DuplicatePhone
                | EventPassError::DuplicateUserEmail
                | EventPassError::AlreadyMarked { .. }
                | EventPassError::StaffAlreadyAssigned
        )
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        EventPassError::Validation(message.into())
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}
