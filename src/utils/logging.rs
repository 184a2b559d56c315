//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the EventPass service.

use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};
use uuid::Uuid;

use crate::config::LoggingConfig;
use crate::utils::errors::{EventPassError, Result};

/// Initialize logging based on configuration.
///
/// The returned guard flushes the file writer when dropped, so `main` must
/// hold it for the lifetime of the process.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::try_new(&config.level)
        .map_err(|e| EventPassError::Config(format!("Invalid log filter: {}", e)))?;

    let stdout_layer = if config.json {
        tracing_subscriber::fmt::layer().json().with_writer(std::io::stdout).boxed()
    } else {
        tracing_subscriber::fmt::layer().with_writer(std::io::stdout).boxed()
    };

    let (file_layer, guard) = match config.directory.as_deref() {
        Some(directory) if !directory.is_empty() => {
            let file_appender = tracing_appender::rolling::daily(directory, "eventpass.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking)
                .boxed();
            (Some(layer), Some(guard))
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| EventPassError::Config(format!("Logging already initialized: {}", e)))?;

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log admin actions
pub fn log_admin_action(admin_id: Uuid, action: &str, target: Option<&str>, details: Option<&str>) {
    warn!(
        admin_id = %admin_id,
        action = action,
        target_id = target,
        details = details,
        "Admin action performed"
    );
}

/// Log a scan at the attendance desk
pub fn log_attendance_scan(participant_id: Uuid, event_id: Uuid, scanned_by: Option<Uuid>, outcome: &str) {
    info!(
        participant_id = %participant_id,
        event_id = %event_id,
        scanned_by = ?scanned_by,
        outcome = outcome,
        "Attendance scan processed"
    );
}

/// Log the outcome of a single email delivery
pub fn log_notification(recipient: &str, kind: &str, success: bool, error_message: Option<&str>) {
    if success {
        debug!(recipient = recipient, kind = kind, "Notification delivered");
    } else {
        error!(
            recipient = recipient,
            kind = kind,
            error = error_message,
            "Notification delivery failed"
        );
    }
}

/// Log authentication and authorization events
pub fn log_security_event(event: &str, subject: Option<&str>, details: Option<&str>) {
    warn!(
        event = event,
        subject = subject,
        details = details,
        "Security event"
    );
}
