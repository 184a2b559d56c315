//! Participant repository implementation

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use super::{constraints, violated_unique_index, ParticipantRepository};
use crate::models::{NewParticipant, Participant};
use crate::utils::errors::{EventPassError, Result};

const PARTICIPANT_COLUMNS: &str = "id, event_id, name, organization, designation, department, position, \
     contact, phone, qr_email_sent, onboarded_by, onboarding_date, registered_at";

#[derive(Clone)]
pub struct PgParticipantRepository {
    pool: PgPool,
}

impl PgParticipantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ParticipantRepository for PgParticipantRepository {
    /// Register a new participant
    async fn insert(&self, participant: &NewParticipant) -> Result<Participant> {
        let query = format!(
            r#"
            INSERT INTO participants (id, event_id, name, organization, designation, department, position,
                                      contact, phone, qr_email_sent, onboarded_by, onboarding_date, registered_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, FALSE, $10, $11, $12)
            RETURNING {PARTICIPANT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Participant>(&query)
            .bind(Uuid::new_v4())
            .bind(participant.event_id)
            .bind(&participant.name)
            .bind(&participant.organization)
            .bind(&participant.designation)
            .bind(&participant.department)
            .bind(&participant.position)
            .bind(&participant.contact)
            .bind(&participant.phone)
            .bind(participant.onboarded_by)
            .bind(participant.onboarding_date)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match violated_unique_index(&e).as_deref() {
                Some(constraints::PARTICIPANT_CONTACT) => EventPassError::DuplicateEmail,
                Some(constraints::PARTICIPANT_PHONE) => EventPassError::DuplicatePhone,
                _ => EventPassError::Database(e),
            })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Participant>> {
        let participant = sqlx::query_as::<_, Participant>(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(participant)
    }

    async fn find_by_contact(&self, event_id: Uuid, contact: &str) -> Result<Option<Participant>> {
        let participant = sqlx::query_as::<_, Participant>(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE event_id = $1 AND contact = $2 LIMIT 1"
        ))
        .bind(event_id)
        .bind(contact)
        .fetch_optional(&self.pool)
        .await?;

        Ok(participant)
    }

    async fn find_by_phone(&self, event_id: Uuid, phone: &str) -> Result<Option<Participant>> {
        let participant = sqlx::query_as::<_, Participant>(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE event_id = $1 AND phone = $2 LIMIT 1"
        ))
        .bind(event_id)
        .bind(phone)
        .fetch_optional(&self.pool)
        .await?;

        Ok(participant)
    }

    async fn list_by_event(&self, event_id: Uuid) -> Result<Vec<Participant>> {
        let participants = sqlx::query_as::<_, Participant>(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE event_id = $1 ORDER BY registered_at ASC"
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(participants)
    }

    async fn list_all(&self) -> Result<Vec<Participant>> {
        let participants = sqlx::query_as::<_, Participant>(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM participants ORDER BY registered_at ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(participants)
    }

    async fn count_by_event(&self, event_id: Uuid) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM participants WHERE event_id = $1")
            .bind(event_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }

    async fn set_qr_email_sent(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE participants SET qr_email_sent = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn update_contact(&self, id: Uuid, contact: &str) -> Result<()> {
        sqlx::query("UPDATE participants SET contact = $2 WHERE id = $1")
            .bind(id)
            .bind(contact)
            .execute(&self.pool)
            .await
            .map_err(|e| match violated_unique_index(&e).as_deref() {
                Some(constraints::PARTICIPANT_CONTACT) => EventPassError::DuplicateEmail,
                _ => EventPassError::Database(e),
            })?;

        Ok(())
    }
}
