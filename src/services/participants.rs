//! Participant registry service

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::attendance::AttendanceService;
use super::auth::CurrentUser;
use super::notification::NotificationService;
use crate::database::DatabaseService;
use crate::models::{
    AttendanceRecord, NewParticipant, Participant, ParticipantDraft, ParticipantView, RegisterOptions,
};
use crate::utils::errors::{EventPassError, Result};
use crate::utils::helpers::{has_min_chars, is_valid_email, is_valid_phone, non_empty, normalize_email};

/// Walk-in registration performed by staff at the venue
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OnboardRequest {
    pub event_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub organization: Option<String>,
    pub designation: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardResult {
    pub participant: Participant,
    /// Today's check-in; absent when auto-marking failed
    pub attendance: Option<AttendanceRecord>,
}

/// Outcome of the stored-email normalization pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizeReport {
    pub updated: usize,
    pub errors: Vec<String>,
}

#[derive(Clone)]
pub struct ParticipantService {
    db: DatabaseService,
    notifications: NotificationService,
    attendance: AttendanceService,
    send_on_register: bool,
}

impl ParticipantService {
    pub fn new(
        db: DatabaseService,
        notifications: NotificationService,
        attendance: AttendanceService,
        send_on_register: bool,
    ) -> Self {
        Self {
            db,
            notifications,
            attendance,
            send_on_register,
        }
    }

    /// Register a participant and queue their confirmation email
    pub async fn register(&self, draft: ParticipantDraft, options: RegisterOptions) -> Result<Uuid> {
        let participant = self.register_participant(draft, options).await?;
        Ok(participant.id)
    }

    async fn register_participant(&self, draft: ParticipantDraft, options: RegisterOptions) -> Result<Participant> {
        if !has_min_chars(&draft.name, 2) {
            return Err(EventPassError::validation("Name must be at least 2 characters."));
        }
        let contact = normalize_email(&draft.contact);
        if !is_valid_email(&contact) {
            return Err(EventPassError::validation("Please enter a valid email address."));
        }
        let phone = draft.phone.trim().to_string();
        if !is_valid_phone(&phone) {
            return Err(EventPassError::validation("Please enter a valid phone number."));
        }

        if self.db.events.find_by_id(draft.event_id).await?.is_none() {
            return Err(EventPassError::EventNotFound { event_id: draft.event_id.to_string() });
        }

        if !options.skip_duplicate_check {
            if self.db.participants.find_by_contact(draft.event_id, &contact).await?.is_some() {
                return Err(EventPassError::DuplicateEmail);
            }
            if self.db.participants.find_by_phone(draft.event_id, &phone).await?.is_some() {
                return Err(EventPassError::DuplicatePhone);
            }
        }

        let participant = self
            .db
            .participants
            .insert(&NewParticipant {
                event_id: draft.event_id,
                name: draft.name.trim().to_string(),
                organization: non_empty(draft.organization),
                designation: non_empty(draft.designation),
                department: non_empty(draft.department),
                position: non_empty(draft.position),
                contact,
                phone,
                onboarded_by: options.onboarded_by,
                onboarding_date: options.onboarded_by.map(|_| Utc::now()),
            })
            .await?;

        info!(
            participant_id = %participant.id,
            event_id = %participant.event_id,
            onboarded = participant.onboarded_by.is_some(),
            "Participant registered"
        );

        if self.send_on_register {
            if let Err(e) = self.notifications.queue_registration_email(&participant).await {
                warn!(participant_id = %participant.id, error = %e, "Could not queue registration email");
            }
        }

        Ok(participant)
    }

    /// Staff-assisted registration followed by today's check-in
    pub async fn onboard(&self, staff: &CurrentUser, request: OnboardRequest) -> Result<OnboardResult> {
        let name = format!("{} {}", request.first_name.trim(), request.last_name.trim())
            .trim()
            .to_string();
        let draft = ParticipantDraft {
            event_id: request.event_id,
            name,
            organization: request.organization,
            designation: request.designation,
            department: request.department,
            position: request.position,
            contact: request.email,
            phone: request.phone,
        };
        let options = RegisterOptions {
            skip_duplicate_check: true,
            onboarded_by: Some(staff.id),
        };

        let participant = self.register_participant(draft, options).await?;

        let attendance = match self
            .attendance
            .mark_attendance(participant.id, participant.event_id, None, Some(staff.id))
            .await
        {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(participant_id = %participant.id, error = %e, "Auto check-in after onboarding failed");
                None
            }
        };

        Ok(OnboardResult { participant, attendance })
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Participant> {
        self.db
            .participants
            .find_by_id(id)
            .await?
            .ok_or_else(|| EventPassError::ParticipantNotFound { participant_id: id.to_string() })
    }

    pub async fn list_by_event(&self, event_id: Uuid) -> Result<Vec<Participant>> {
        self.db.participants.list_by_event(event_id).await
    }

    /// Every participant with the name of their event attached
    pub async fn list_all(&self) -> Result<Vec<ParticipantView>> {
        let event_names: HashMap<Uuid, String> = self
            .db
            .events
            .list()
            .await?
            .into_iter()
            .map(|event| (event.id, event.name))
            .collect();

        Ok(self
            .db
            .participants
            .list_all()
            .await?
            .into_iter()
            .map(|participant| ParticipantView {
                event_name: event_names.get(&participant.event_id).cloned(),
                participant,
            })
            .collect())
    }

    /// Trim and lowercase stored contact emails left over from older data
    pub async fn normalize_stored_emails(&self) -> Result<NormalizeReport> {
        let mut report = NormalizeReport::default();

        for participant in self.db.participants.list_all().await? {
            let normalized = normalize_email(&participant.contact);
            if normalized == participant.contact {
                continue;
            }
            match self.db.participants.update_contact(participant.id, &normalized).await {
                Ok(()) => {
                    debug!(participant_id = %participant.id, "Contact email normalized");
                    report.updated += 1;
                }
                Err(e) => {
                    warn!(participant_id = %participant.id, error = %e, "Contact email normalization failed");
                    report.errors.push(format!("{}: {}", participant.id, e));
                }
            }
        }

        info!(updated = report.updated, errors = report.errors.len(), "Stored emails normalized");
        Ok(report)
    }
}
