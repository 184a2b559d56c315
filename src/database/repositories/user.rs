//! User repository implementation

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use super::{constraints, violated_unique_index, UserRepository};
use crate::models::user::{NewUser, User};
use crate::utils::errors::{EventPassError, Result};

const USER_COLUMNS: &str = "id, full_name, email, password_hash, role, created_at, updated_at";

#[derive(Clone, Debug)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_write_error(err: sqlx::Error) -> EventPassError {
        match violated_unique_index(&err).as_deref() {
            Some(constraints::USER_EMAIL) => EventPassError::DuplicateUserEmail,
            _ => EventPassError::Database(err),
        }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    /// Create a new user
    async fn insert(&self, user: &NewUser) -> Result<User> {
        let now = Utc::now();
        let query = format!(
            r#"
            INSERT INTO users (id, full_name, email, password_hash, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, User>(&query)
            .bind(Uuid::new_v4())
            .bind(&user.full_name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .bind(now)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(Self::map_write_error)
    }

    /// Find user by ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Find user by (normalized) email
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn list(&self) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC"))
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    /// Update user
    async fn update(&self, user: &User) -> Result<Option<User>> {
        let query = format!(
            r#"
            UPDATE users
            SET full_name = $2,
                email = $3,
                password_hash = $4,
                role = $5,
                updated_at = $6
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, User>(&query)
            .bind(user.id)
            .bind(&user.full_name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await
            .map_err(Self::map_write_error)
    }

    /// Delete user
    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}
