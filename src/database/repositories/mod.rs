//! Database repositories module
//!
//! Each repository is a trait so the services can run against PostgreSQL in
//! production and against the in-memory store in tests.

pub mod attendance;
pub mod event;
pub mod outbox;
pub mod participant;
pub mod user;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::*;
use crate::utils::errors::Result;

// Re-export PostgreSQL implementations
pub use attendance::PgAttendanceRepository;
pub use event::PgEventRepository;
pub use outbox::PgOutboxRepository;
pub use participant::PgParticipantRepository;
pub use user::PgUserRepository;

/// Unique index names shared by the migrations and the in-memory store
pub mod constraints {
    pub const EVENT_SLUG: &str = "events_slug_key";
    pub const USER_EMAIL: &str = "users_email_key";
    pub const PARTICIPANT_CONTACT: &str = "participants_event_contact_key";
    pub const PARTICIPANT_PHONE: &str = "participants_event_phone_key";
    pub const ATTENDANCE_DAY: &str = "attendance_participant_event_date_key";
}

/// Event storage
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Insert a fully built event; `DuplicateSlug` on slug collision
    async fn insert(&self, event: &Event) -> Result<Event>;

    /// Replace the editable fields of an event; `None` if it does not exist
    async fn update(&self, event: &Event) -> Result<Option<Event>>;

    /// Delete an event; returns false if it did not exist
    async fn delete(&self, id: Uuid) -> Result<bool>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Event>>;

    /// All events, newest start date first
    async fn list(&self) -> Result<Vec<Event>>;

    /// Add a staff member; returns false if already assigned
    async fn add_staff(&self, event_id: Uuid, user_id: Uuid) -> Result<bool>;

    /// Remove a staff member; returns false if not assigned
    async fn remove_staff(&self, event_id: Uuid, user_id: Uuid) -> Result<bool>;
}

/// Participant storage
#[async_trait]
pub trait ParticipantRepository: Send + Sync {
    /// Insert a participant; `DuplicateEmail` or `DuplicatePhone` on index collision
    async fn insert(&self, participant: &NewParticipant) -> Result<Participant>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Participant>>;

    async fn find_by_contact(&self, event_id: Uuid, contact: &str) -> Result<Option<Participant>>;

    async fn find_by_phone(&self, event_id: Uuid, phone: &str) -> Result<Option<Participant>>;

    async fn list_by_event(&self, event_id: Uuid) -> Result<Vec<Participant>>;

    async fn list_all(&self) -> Result<Vec<Participant>>;

    async fn count_by_event(&self, event_id: Uuid) -> Result<i64>;

    async fn set_qr_email_sent(&self, id: Uuid) -> Result<()>;

    async fn update_contact(&self, id: Uuid, contact: &str) -> Result<()>;
}

/// Attendance ledger storage. Records are never updated or deleted.
#[async_trait]
pub trait AttendanceRepository: Send + Sync {
    /// Insert a check-in; `AlreadyMarked` carrying the stored record on collision
    async fn insert(&self, record: &NewAttendance) -> Result<AttendanceRecord>;

    async fn find(
        &self,
        participant_id: Uuid,
        event_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>>;

    /// Records for an event, optionally limited to one day, latest first
    async fn list_by_event(&self, event_id: Uuid, date: Option<NaiveDate>) -> Result<Vec<AttendanceRecord>>;

    /// Distinct participants with at least one record matching the filter
    async fn count_checked_in(&self, event_id: Uuid, date: Option<NaiveDate>) -> Result<i64>;

    /// Check-ins per stored attendance date
    async fn daily_counts(&self, event_id: Uuid) -> Result<Vec<(NaiveDate, i64)>>;
}

/// Staff account storage
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user; `DuplicateUserEmail` on email collision
    async fn insert(&self, user: &NewUser) -> Result<User>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn list(&self) -> Result<Vec<User>>;

    /// Persist name, email, role and password hash; `None` if missing
    async fn update(&self, user: &User) -> Result<Option<User>>;

    async fn delete(&self, id: Uuid) -> Result<bool>;

    async fn count(&self) -> Result<i64>;
}

/// Notification outbox storage
#[async_trait]
pub trait OutboxRepository: Send + Sync {
    async fn insert(&self, participant_id: Uuid, event_id: Uuid, kind: NotificationKind) -> Result<OutboxEntry>;

    async fn mark_sent(&self, id: Uuid) -> Result<()>;

    async fn mark_failed(&self, id: Uuid, error: &str) -> Result<()>;

    /// Mark every failed entry for the participant and kind, other than
    /// `except`, as superseded; returns how many changed
    async fn supersede_failed(&self, participant_id: Uuid, kind: NotificationKind, except: Uuid) -> Result<u64>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<OutboxEntry>>;

    async fn list_by_status(&self, status: OutboxStatus) -> Result<Vec<OutboxEntry>>;
}

/// Name of the unique index a database error violated, if any
pub(crate) fn violated_unique_index(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            Some(db_err.constraint().unwrap_or_default().to_string())
        }
        _ => None,
    }
}
