//! Database module
//!
//! This module handles database connections and operations

pub mod connection;
#[cfg(feature = "test-utils")]
pub mod memory;
pub mod repositories;
pub mod service;

// Re-export commonly used database components
pub use connection::{close_pool, create_pool, health_check, run_migrations, DatabasePool, PoolConfig};
pub use repositories::{
    AttendanceRepository, EventRepository, OutboxRepository, ParticipantRepository, UserRepository,
};
pub use service::DatabaseService;
