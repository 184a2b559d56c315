//! Database service layer
//!
//! Bundles the repositories behind trait objects so services never depend on
//! the storage backend.

use std::sync::Arc;

use super::repositories::{
    AttendanceRepository, EventRepository, OutboxRepository, ParticipantRepository, PgAttendanceRepository,
    PgEventRepository, PgOutboxRepository, PgParticipantRepository, PgUserRepository, UserRepository,
};
use super::DatabasePool;
use crate::utils::errors::Result;

#[derive(Clone)]
pub struct DatabaseService {
    pub events: Arc<dyn EventRepository>,
    pub participants: Arc<dyn ParticipantRepository>,
    pub attendance: Arc<dyn AttendanceRepository>,
    pub users: Arc<dyn UserRepository>,
    pub outbox: Arc<dyn OutboxRepository>,
    pool: Option<DatabasePool>,
}

impl DatabaseService {
    /// Repositories backed by PostgreSQL
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            events: Arc::new(PgEventRepository::new(pool.clone())),
            participants: Arc::new(PgParticipantRepository::new(pool.clone())),
            attendance: Arc::new(PgAttendanceRepository::new(pool.clone())),
            users: Arc::new(PgUserRepository::new(pool.clone())),
            outbox: Arc::new(PgOutboxRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Repositories backed by a fresh in-memory store
    #[cfg(feature = "test-utils")]
    pub fn in_memory() -> Self {
        Self::with_memory_store(super::memory::MemoryStore::new())
    }

    /// Repositories backed by an existing in-memory store, so tests can seed it directly
    #[cfg(feature = "test-utils")]
    pub fn with_memory_store(store: super::memory::MemoryStore) -> Self {
        Self {
            events: Arc::new(store.clone()),
            participants: Arc::new(store.clone()),
            attendance: Arc::new(store.clone()),
            users: Arc::new(store.clone()),
            outbox: Arc::new(store),
            pool: None,
        }
    }

    /// Check the backing database, if any
    pub async fn health_check(&self) -> Result<()> {
        match &self.pool {
            Some(pool) => super::connection::health_check(pool).await,
            None => Ok(()),
        }
    }

    /// Close the connection pool on shutdown
    pub async fn close(&self) {
        if let Some(pool) = &self.pool {
            super::connection::close_pool(pool).await;
        }
    }
}

impl std::fmt::Debug for DatabaseService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseService")
            .field("backend", &if self.pool.is_some() { "postgres" } else { "memory" })
            .finish()
    }
}

#[cfg(all(test, feature = "test-utils"))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_service_is_healthy() {
        let service = DatabaseService::in_memory();
        assert!(service.health_check().await.is_ok());
        assert_eq!(service.users.count().await.unwrap(), 0);
        service.close().await;
    }
}
