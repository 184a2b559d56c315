//! Event model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub location: String,
    pub description: String,
    /// Explicit override; `None` means derived from the date range
    pub is_active: Option<bool>,
    pub is_internal: bool,
    pub department: Option<String>,
    pub position: Option<String>,
    pub assigned_staff: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Whether the event counts as active on `date`
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.is_active
            .unwrap_or(self.start_date <= date && date <= self.end_date)
    }

    pub fn is_staff_assigned(&self, user_id: Uuid) -> bool {
        self.assigned_staff.contains(&user_id)
    }
}

/// Admin form payload for creating or editing an event
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventDraft {
    pub name: String,
    pub slug: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub location: String,
    pub description: String,
    pub is_active: Option<bool>,
    pub is_internal: bool,
    pub department: Option<String>,
    pub position: Option<String>,
}

/// Event as returned by the API, with the active flag resolved
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventView {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub location: String,
    pub description: String,
    pub is_active: bool,
    pub is_internal: bool,
    pub department: Option<String>,
    pub position: Option<String>,
    pub assigned_staff: Vec<Uuid>,
}

impl EventView {
    pub fn new(event: Event, today: NaiveDate) -> Self {
        let is_active = event.is_active_on(today);
        Self {
            id: event.id,
            name: event.name,
            slug: event.slug,
            start_date: event.start_date,
            end_date: event.end_date,
            location: event.location,
            description: event.description,
            is_active,
            is_internal: event.is_internal,
            department: event.department,
            position: event.position,
            assigned_staff: event.assigned_staff,
        }
    }
}
