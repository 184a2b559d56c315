//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod attendance;
pub mod event;
pub mod outbox;
pub mod participant;
pub mod user;

// Re-export commonly used models
pub use attendance::{AttendanceRecord, AttendanceStats, DailyAttendance, NewAttendance, SELF_SIGNED};
pub use event::{Event, EventDraft, EventView};
pub use outbox::{NotificationKind, OutboxEntry, OutboxStatus};
pub use participant::{NewParticipant, Participant, ParticipantDraft, ParticipantView, RegisterOptions};
pub use user::{CreateUserRequest, NewUser, Role, UpdateUserRequest, User};
