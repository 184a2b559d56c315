//! Notification outbox model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Durable record of an email the service attempted to send
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OutboxEntry {
    pub id: Uuid,
    pub participant_id: Uuid,
    pub event_id: Uuid,
    #[sqlx(try_from = "String")]
    pub kind: NotificationKind,
    #[sqlx(try_from = "String")]
    pub status: OutboxStatus,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Registration,
    QrCode,
    FollowUp,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Registration => "registration",
            NotificationKind::QrCode => "qr_code",
            NotificationKind::FollowUp => "follow_up",
        }
    }
}

impl TryFrom<String> for NotificationKind {
    type Error = UnknownOutboxValue;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "registration" => Ok(NotificationKind::Registration),
            "qr_code" => Ok(NotificationKind::QrCode),
            "follow_up" => Ok(NotificationKind::FollowUp),
            _ => Err(UnknownOutboxValue(value)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutboxStatus {
    Pending,
    Sent,
    Failed,
    /// A failed attempt made moot by a later successful send
    Superseded,
}

impl OutboxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutboxStatus::Pending => "pending",
            OutboxStatus::Sent => "sent",
            OutboxStatus::Failed => "failed",
            OutboxStatus::Superseded => "superseded",
        }
    }
}

impl TryFrom<String> for OutboxStatus {
    type Error = UnknownOutboxValue;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "pending" => Ok(OutboxStatus::Pending),
            "sent" => Ok(OutboxStatus::Sent),
            "failed" => Ok(OutboxStatus::Failed),
            "superseded" => Ok(OutboxStatus::Superseded),
            _ => Err(UnknownOutboxValue(value)),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown outbox value: {0}")]
pub struct UnknownOutboxValue(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_column_text() {
        for status in [
            OutboxStatus::Pending,
            OutboxStatus::Sent,
            OutboxStatus::Failed,
            OutboxStatus::Superseded,
        ] {
            assert_eq!(OutboxStatus::try_from(status.as_str().to_string()).unwrap(), status);
        }
        assert!(NotificationKind::try_from("sms".to_string()).is_err());
    }
}
