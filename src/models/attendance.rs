//! Attendance models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Signature recorded for participants who registered themselves
pub const SELF_SIGNED: &str = "Self";

/// One check-in of a participant at an event on a calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub participant_id: Uuid,
    pub event_id: Uuid,
    pub checked_in_at: DateTime<Utc>,
    pub attendance_date: NaiveDate,
    pub participant_name: String,
    pub participant_organization: Option<String>,
    pub participant_position: Option<String>,
    /// Name of the onboarding staff member, or "Self"
    pub signed_by: String,
    pub checked_in_by: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct NewAttendance {
    pub participant_id: Uuid,
    pub event_id: Uuid,
    pub attendance_date: NaiveDate,
    pub checked_in_at: DateTime<Utc>,
    pub participant_name: String,
    pub participant_organization: Option<String>,
    pub participant_position: Option<String>,
    pub signed_by: String,
    pub checked_in_by: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceStats {
    pub total_participants: i64,
    pub checked_in: i64,
    pub not_checked_in: i64,
}

impl AttendanceStats {
    pub fn new(total_participants: i64, checked_in: i64) -> Self {
        Self {
            total_participants,
            checked_in,
            not_checked_in: (total_participants - checked_in).max(0),
        }
    }
}

/// Check-in count for one calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyAttendance {
    pub date: NaiveDate,
    pub checked_in: i64,
    /// False for stored dates outside the event's declared span
    pub within_event: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_complement() {
        let stats = AttendanceStats::new(10, 4);
        assert_eq!(stats.not_checked_in, 6);
    }

    #[test]
    fn test_stats_serialize_camel_case() {
        let json = serde_json::to_value(AttendanceStats::new(3, 1)).unwrap();
        assert_eq!(json["totalParticipants"], 3);
        assert_eq!(json["checkedIn"], 1);
        assert_eq!(json["notCheckedIn"], 2);
    }
}
