//! Participant model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub organization: Option<String>,
    pub designation: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    /// Email address, trimmed and lowercased
    pub contact: String,
    pub phone: String,
    pub qr_email_sent: bool,
    pub onboarded_by: Option<Uuid>,
    pub onboarding_date: Option<DateTime<Utc>>,
    pub registered_at: DateTime<Utc>,
}

impl Participant {
    /// Position shown on attendance sheets, falling back to the designation
    pub fn display_position(&self) -> Option<String> {
        self.position
            .clone()
            .filter(|p| !p.is_empty())
            .or_else(|| self.designation.clone().filter(|d| !d.is_empty()))
    }
}

/// Registration form payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParticipantDraft {
    pub event_id: Uuid,
    pub name: String,
    pub organization: Option<String>,
    pub designation: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub contact: String,
    pub phone: String,
}

/// Options for `ParticipantService::register`
#[derive(Debug, Clone, Copy, Default)]
pub struct RegisterOptions {
    /// Allow re-registering under contact details already used in the event
    pub skip_duplicate_check: bool,
    /// Staff member performing an assisted registration
    pub onboarded_by: Option<Uuid>,
}

/// Fully validated participant ready for insertion
#[derive(Debug, Clone)]
pub struct NewParticipant {
    pub event_id: Uuid,
    pub name: String,
    pub organization: Option<String>,
    pub designation: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub contact: String,
    pub phone: String,
    pub onboarded_by: Option<Uuid>,
    pub onboarding_date: Option<DateTime<Utc>>,
}

/// Participant row joined with its event's name, for admin listings
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantView {
    #[serde(flatten)]
    pub participant: Participant,
    pub event_name: Option<String>,
}
