//! Test helpers module
//!
//! Shared setup for the integration tests: an in-memory application with a
//! recording mailer, fake data builders, and an optional PostgreSQL database.

#![allow(dead_code)]

pub mod database_helper;
pub mod test_app;
pub mod test_data;

pub use database_helper::*;
pub use test_app::*;
pub use test_data::*;
