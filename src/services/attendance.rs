//! Attendance ledger service
//!
//! At most one check-in per participant, event and calendar day. Records are
//! denormalized at insert time so sheets survive later participant edits.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate, Utc};
use tracing::debug;
use uuid::Uuid;

use super::events::MAX_EVENT_DAYS;
use crate::database::DatabaseService;
use crate::models::{AttendanceRecord, AttendanceStats, DailyAttendance, NewAttendance, Participant, SELF_SIGNED};
use crate::utils::errors::{EventPassError, Result};
use crate::utils::helpers::{days_between, today};
use crate::utils::logging::log_attendance_scan;

#[derive(Clone)]
pub struct AttendanceService {
    db: DatabaseService,
}

impl AttendanceService {
    pub fn new(db: DatabaseService) -> Self {
        Self { db }
    }

    /// Record a check-in for `attendance_date`, or today when not given.
    ///
    /// A second check-in on the same day yields `AlreadyMarked` with the
    /// stored record.
    pub async fn mark_attendance(
        &self,
        participant_id: Uuid,
        event_id: Uuid,
        attendance_date: Option<NaiveDate>,
        scanned_by: Option<Uuid>,
    ) -> Result<AttendanceRecord> {
        let participant = self
            .db
            .participants
            .find_by_id(participant_id)
            .await?
            .filter(|p| p.event_id == event_id)
            .ok_or_else(|| EventPassError::ParticipantNotFound {
                participant_id: participant_id.to_string(),
            })?;

        let date = attendance_date.unwrap_or_else(today);

        if let Some(existing) = self.db.attendance.find(participant_id, event_id, date).await? {
            log_attendance_scan(participant_id, event_id, scanned_by, "already_marked");
            return Err(EventPassError::AlreadyMarked { existing: Box::new(existing) });
        }

        let record = NewAttendance {
            participant_id,
            event_id,
            attendance_date: date,
            checked_in_at: Utc::now(),
            participant_name: participant.name.clone(),
            participant_organization: participant.organization.clone(),
            participant_position: participant.display_position(),
            signed_by: self.signed_by(&participant).await?,
            checked_in_by: scanned_by,
        };

        let outcome = self.db.attendance.insert(&record).await;
        let label = match &outcome {
            Ok(_) => "checked_in",
            Err(EventPassError::AlreadyMarked { .. }) => "already_marked",
            Err(_) => "error",
        };
        log_attendance_scan(participant_id, event_id, scanned_by, label);
        outcome
    }

    /// Totals for an event, optionally restricted to one day
    pub async fn stats(&self, event_id: Uuid, date: Option<NaiveDate>) -> Result<AttendanceStats> {
        let total = self.db.participants.count_by_event(event_id).await?;
        let checked_in = self.db.attendance.count_checked_in(event_id, date).await?;
        Ok(AttendanceStats::new(total, checked_in))
    }

    /// One row per event day (zero-filled) plus any stored days outside the span.
    /// Zero-filling stops after `MAX_EVENT_DAYS` for events stored before the
    /// span limit existed.
    pub async fn daily_breakdown(&self, event_id: Uuid) -> Result<Vec<DailyAttendance>> {
        let event = self
            .db
            .events
            .find_by_id(event_id)
            .await?
            .ok_or_else(|| EventPassError::EventNotFound { event_id: event_id.to_string() })?;

        let fill_end = event
            .start_date
            .checked_add_days(Days::new(MAX_EVENT_DAYS as u64 - 1))
            .map_or(event.end_date, |cap| cap.min(event.end_date));
        let within_event = |date: NaiveDate| date >= event.start_date && date <= event.end_date;

        let mut days: BTreeMap<NaiveDate, DailyAttendance> = days_between(event.start_date, fill_end)
            .into_iter()
            .map(|date| {
                (
                    date,
                    DailyAttendance {
                        date,
                        checked_in: 0,
                        within_event: true,
                    },
                )
            })
            .collect();

        for (date, count) in self.db.attendance.daily_counts(event_id).await? {
            days.entry(date)
                .or_insert(DailyAttendance {
                    date,
                    checked_in: 0,
                    within_event: within_event(date),
                })
                .checked_in = count;
        }

        debug!(event_id = %event_id, days = days.len(), "Daily attendance computed");
        Ok(days.into_values().collect())
    }

    pub async fn list(&self, event_id: Uuid, date: Option<NaiveDate>) -> Result<Vec<AttendanceRecord>> {
        self.db.attendance.list_by_event(event_id, date).await
    }

    async fn signed_by(&self, participant: &Participant) -> Result<String> {
        let Some(staff_id) = participant.onboarded_by else {
            return Ok(SELF_SIGNED.to_string());
        };
        Ok(self
            .db
            .users
            .find_by_id(staff_id)
            .await?
            .map(|user| user.full_name)
            .unwrap_or_else(|| SELF_SIGNED.to_string()))
    }
}
