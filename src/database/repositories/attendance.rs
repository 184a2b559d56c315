//! Attendance repository implementation

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use super::{constraints, violated_unique_index, AttendanceRepository};
use crate::models::{AttendanceRecord, NewAttendance};
use crate::utils::errors::{EventPassError, Result};

const ATTENDANCE_COLUMNS: &str = "id, participant_id, event_id, checked_in_at, attendance_date, participant_name, \
     participant_organization, participant_position, signed_by, checked_in_by";

#[derive(Clone)]
pub struct PgAttendanceRepository {
    pool: PgPool,
}

impl PgAttendanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttendanceRepository for PgAttendanceRepository {
    /// Record a check-in
    async fn insert(&self, record: &NewAttendance) -> Result<AttendanceRecord> {
        let query = format!(
            r#"
            INSERT INTO attendance (id, participant_id, event_id, checked_in_at, attendance_date, participant_name,
                                    participant_organization, participant_position, signed_by, checked_in_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {ATTENDANCE_COLUMNS}
            "#
        );

        let inserted = sqlx::query_as::<_, AttendanceRecord>(&query)
            .bind(Uuid::new_v4())
            .bind(record.participant_id)
            .bind(record.event_id)
            .bind(record.checked_in_at)
            .bind(record.attendance_date)
            .bind(&record.participant_name)
            .bind(&record.participant_organization)
            .bind(&record.participant_position)
            .bind(&record.signed_by)
            .bind(record.checked_in_by)
            .fetch_one(&self.pool)
            .await;

        match inserted {
            Ok(record) => Ok(record),
            Err(e) if violated_unique_index(&e).as_deref() == Some(constraints::ATTENDANCE_DAY) => {
                // Lost a race with a concurrent scan; report the winner
                let existing = self
                    .find(record.participant_id, record.event_id, record.attendance_date)
                    .await?
                    .ok_or(EventPassError::Database(e))?;
                Err(EventPassError::AlreadyMarked { existing: Box::new(existing) })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find(
        &self,
        participant_id: Uuid,
        event_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>> {
        let record = sqlx::query_as::<_, AttendanceRecord>(&format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance \
             WHERE participant_id = $1 AND event_id = $2 AND attendance_date = $3"
        ))
        .bind(participant_id)
        .bind(event_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn list_by_event(&self, event_id: Uuid, date: Option<NaiveDate>) -> Result<Vec<AttendanceRecord>> {
        let records = sqlx::query_as::<_, AttendanceRecord>(&format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance \
             WHERE event_id = $1 AND ($2::date IS NULL OR attendance_date = $2) \
             ORDER BY checked_in_at DESC"
        ))
        .bind(event_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn count_checked_in(&self, event_id: Uuid, date: Option<NaiveDate>) -> Result<i64> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(DISTINCT participant_id) FROM attendance \
             WHERE event_id = $1 AND ($2::date IS NULL OR attendance_date = $2)",
        )
        .bind(event_id)
        .bind(date)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }

    async fn daily_counts(&self, event_id: Uuid) -> Result<Vec<(NaiveDate, i64)>> {
        let rows: Vec<(NaiveDate, i64)> = sqlx::query_as(
            "SELECT attendance_date, COUNT(DISTINCT participant_id) FROM attendance \
             WHERE event_id = $1 GROUP BY attendance_date ORDER BY attendance_date ASC",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
