//! Notification outbox repository implementation

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use super::OutboxRepository;
use crate::models::{NotificationKind, OutboxEntry, OutboxStatus};
use crate::utils::errors::Result;

const OUTBOX_COLUMNS: &str = "id, participant_id, event_id, kind, status, attempts, last_error, created_at, updated_at";

#[derive(Clone)]
pub struct PgOutboxRepository {
    pool: PgPool,
}

impl PgOutboxRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OutboxRepository for PgOutboxRepository {
    async fn insert(&self, participant_id: Uuid, event_id: Uuid, kind: NotificationKind) -> Result<OutboxEntry> {
        let now = Utc::now();
        let query = format!(
            r#"
            INSERT INTO notification_outbox (id, participant_id, event_id, kind, status, attempts, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, 0, $6, $7)
            RETURNING {OUTBOX_COLUMNS}
            "#
        );

        let entry = sqlx::query_as::<_, OutboxEntry>(&query)
            .bind(Uuid::new_v4())
            .bind(participant_id)
            .bind(event_id)
            .bind(kind.as_str())
            .bind(OutboxStatus::Pending.as_str())
            .bind(now)
            .bind(now)
            .fetch_one(&self.pool)
            .await?;

        Ok(entry)
    }

    async fn mark_sent(&self, id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE notification_outbox
            SET status = $2, attempts = attempts + 1, last_error = NULL, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(OutboxStatus::Sent.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, error: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE notification_outbox
            SET status = $2, attempts = attempts + 1, last_error = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(OutboxStatus::Failed.as_str())
        .bind(error)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn supersede_failed(&self, participant_id: Uuid, kind: NotificationKind, except: Uuid) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE notification_outbox
            SET status = $4, updated_at = NOW()
            WHERE participant_id = $1 AND kind = $2 AND id <> $3 AND status = $5
            "#,
        )
        .bind(participant_id)
        .bind(kind.as_str())
        .bind(except)
        .bind(OutboxStatus::Superseded.as_str())
        .bind(OutboxStatus::Failed.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<OutboxEntry>> {
        let entry = sqlx::query_as::<_, OutboxEntry>(&format!(
            "SELECT {OUTBOX_COLUMNS} FROM notification_outbox WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    async fn list_by_status(&self, status: OutboxStatus) -> Result<Vec<OutboxEntry>> {
        let entries = sqlx::query_as::<_, OutboxEntry>(&format!(
            "SELECT {OUTBOX_COLUMNS} FROM notification_outbox WHERE status = $1 ORDER BY created_at ASC"
        ))
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}
