//! Event repository implementation

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use super::{constraints, violated_unique_index, EventRepository};
use crate::models::Event;
use crate::utils::errors::{EventPassError, Result};

const EVENT_COLUMNS: &str = "id, name, slug, start_date, end_date, location, description, is_active, \
     is_internal, department, position, assigned_staff, created_at, updated_at";

#[derive(Clone)]
pub struct PgEventRepository {
    pool: PgPool,
}

impl PgEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_write_error(err: sqlx::Error, slug: &str) -> EventPassError {
        match violated_unique_index(&err).as_deref() {
            Some(constraints::EVENT_SLUG) => EventPassError::DuplicateSlug { slug: slug.to_string() },
            _ => EventPassError::Database(err),
        }
    }
}

#[async_trait]
impl EventRepository for PgEventRepository {
    /// Create a new event
    async fn insert(&self, event: &Event) -> Result<Event> {
        let query = format!(
            r#"
            INSERT INTO events (id, name, slug, start_date, end_date, location, description, is_active,
                                is_internal, department, position, assigned_staff, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {EVENT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Event>(&query)
            .bind(event.id)
            .bind(&event.name)
            .bind(&event.slug)
            .bind(event.start_date)
            .bind(event.end_date)
            .bind(&event.location)
            .bind(&event.description)
            .bind(event.is_active)
            .bind(event.is_internal)
            .bind(&event.department)
            .bind(&event.position)
            .bind(&event.assigned_staff)
            .bind(event.created_at)
            .bind(event.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Self::map_write_error(e, &event.slug))
    }

    /// Update event
    async fn update(&self, event: &Event) -> Result<Option<Event>> {
        let query = format!(
            r#"
            UPDATE events
            SET name = $2,
                slug = $3,
                start_date = $4,
                end_date = $5,
                location = $6,
                description = $7,
                is_active = $8,
                is_internal = $9,
                department = $10,
                position = $11,
                updated_at = $12
            WHERE id = $1
            RETURNING {EVENT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Event>(&query)
            .bind(event.id)
            .bind(&event.name)
            .bind(&event.slug)
            .bind(event.start_date)
            .bind(event.end_date)
            .bind(&event.location)
            .bind(&event.description)
            .bind(event.is_active)
            .bind(event.is_internal)
            .bind(&event.department)
            .bind(&event.position)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Self::map_write_error(e, &event.slug))
    }

    /// Delete event
    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Find event by ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(event)
    }

    /// Find event by its public slug
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE slug = $1"))
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;

        Ok(event)
    }

    async fn list(&self) -> Result<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events ORDER BY start_date DESC, name ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    async fn add_staff(&self, event_id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE events
            SET assigned_staff = array_append(assigned_staff, $2), updated_at = NOW()
            WHERE id = $1 AND NOT ($2 = ANY(assigned_staff))
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_staff(&self, event_id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE events
            SET assigned_staff = array_remove(assigned_staff, $2), updated_at = NOW()
            WHERE id = $1 AND $2 = ANY(assigned_staff)
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
