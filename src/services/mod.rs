//! Services module
//!
//! This module contains business logic services

pub mod attendance;
pub mod auth;
pub mod codec;
pub mod events;
pub mod flyer;
pub mod mailer;
pub mod notification;
pub mod participants;
pub mod qr;

use std::sync::Arc;

// Re-export commonly used services
pub use attendance::AttendanceService;
pub use auth::{AuthService, Claims, CurrentUser};
pub use codec::QrCodec;
pub use events::{can_mark_attendance, EventService};
pub use flyer::FlyerRenderer;
pub use mailer::{EmailAttachment, LogMailer, Mailer, OutgoingEmail, SmtpMailer};
pub use notification::{BulkSendReport, FollowUpRequest, NotificationService};
pub use participants::{NormalizeReport, OnboardRequest, OnboardResult, ParticipantService};
pub use qr::{render_qr, ErrorCorrection, QrOptions};

use crate::config::Settings;
use crate::database::DatabaseService;
use crate::utils::errors::Result;

/// Service factory for creating and managing all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub events: EventService,
    pub participants: ParticipantService,
    pub attendance: AttendanceService,
    pub notifications: NotificationService,
    pub auth: AuthService,
    pub codec: QrCodec,
    pub qr_options: QrOptions,
    pub flyer: Arc<FlyerRenderer>,
    db: DatabaseService,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services initialized
    pub fn new(settings: &Settings, db: DatabaseService, mailer: Arc<dyn Mailer>) -> Result<Self> {
        let codec = QrCodec::from_config(&settings.qr)?;
        let qr_options = QrOptions::from_config(&settings.qr)?;
        let flyer = Arc::new(FlyerRenderer::new(&settings.flyer, qr_options)?);

        let attendance = AttendanceService::new(db.clone());
        let notifications = NotificationService::new(
            db.clone(),
            mailer,
            codec.clone(),
            qr_options,
            settings.notifications.clone(),
            settings.server.public_base_url.clone(),
        );
        let participants = ParticipantService::new(
            db.clone(),
            notifications.clone(),
            attendance.clone(),
            settings.notifications.send_on_register,
        );

        Ok(Self {
            events: EventService::new(db.clone()),
            participants,
            attendance,
            notifications,
            auth: AuthService::new(db.clone(), &settings.auth),
            codec,
            qr_options,
            flyer,
            db,
        })
    }

    /// Health check for all services
    pub async fn health_check(&self) -> ServiceHealthStatus {
        let database_healthy = match self.db.health_check().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Database health check failed");
                false
            }
        };

        ServiceHealthStatus { database_healthy }
    }
}

/// Health status for all services
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceHealthStatus {
    pub database_healthy: bool,
}

impl ServiceHealthStatus {
    /// Check if all critical services are healthy
    pub fn is_healthy(&self) -> bool {
        self.database_healthy
    }

    /// Get list of unhealthy services
    pub fn get_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if !self.database_healthy {
            issues.push("Database connection failed".to_string());
        }
        issues
    }
}
