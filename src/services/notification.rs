//! Notification service implementation
//!
//! Renders the participant emails from templates, embeds the QR code, and
//! records every registration and QR delivery in the outbox so failures can
//! be retried later.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use url::Url;
use uuid::Uuid;

use super::codec::QrCodec;
use super::mailer::{EmailAttachment, Mailer, OutgoingEmail, QR_CONTENT_ID};
use super::qr::{render_qr, QrOptions};
use crate::config::NotificationsConfig;
use crate::database::DatabaseService;
use crate::models::{Event, NotificationKind, OutboxEntry, OutboxStatus, Participant};
use crate::utils::errors::{EventPassError, Result};
use crate::utils::helpers::{escape_html, fill_placeholders, format_event_date};
use crate::utils::logging::log_notification;

/// Email template with `{placeholder}` parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailTemplate {
    pub key: String,
    pub subject: String,
    pub html: String,
}

/// Outcome of a multi-recipient send
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkSendReport {
    pub total_participants: usize,
    pub sent: usize,
    pub failed: usize,
    pub errors: Vec<String>,
    pub batches_processed: usize,
}

impl BulkSendReport {
    fn record(&mut self, recipient: &str, outcome: Result<()>) {
        match outcome {
            Ok(()) => self.sent += 1,
            Err(e) => {
                self.failed += 1;
                self.errors.push(format!("{}: {}", recipient, e));
            }
        }
    }
}

/// Follow-up message options
#[derive(Debug, Clone, Default)]
pub struct FollowUpRequest {
    /// Limit the send to these participants of the event
    pub participant_ids: Option<Vec<Uuid>>,
    pub custom_message: Option<String>,
    pub survey_link: Option<String>,
    pub image: Option<EmailAttachment>,
}

#[derive(Clone)]
pub struct NotificationService {
    db: DatabaseService,
    mailer: Arc<dyn Mailer>,
    codec: QrCodec,
    qr_options: QrOptions,
    config: NotificationsConfig,
    public_base_url: String,
    templates: HashMap<String, EmailTemplate>,
}

impl NotificationService {
    pub fn new(
        db: DatabaseService,
        mailer: Arc<dyn Mailer>,
        codec: QrCodec,
        qr_options: QrOptions,
        config: NotificationsConfig,
        public_base_url: String,
    ) -> Self {
        Self {
            db,
            mailer,
            codec,
            qr_options,
            config,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            templates: Self::load_default_templates(),
        }
    }

    /// Record an outbox entry and deliver the registration email in the background
    pub async fn queue_registration_email(&self, participant: &Participant) -> Result<OutboxEntry> {
        let entry = self
            .db
            .outbox
            .insert(participant.id, participant.event_id, NotificationKind::Registration)
            .await?;

        let service = self.clone();
        let queued = entry.clone();
        tokio::spawn(async move {
            if let Err(e) = service.deliver_entry(&queued).await {
                warn!(outbox_id = %queued.id, error = %e, "Registration email failed");
            }
        });

        debug!(outbox_id = %entry.id, participant_id = %participant.id, "Registration email queued");
        Ok(entry)
    }

    /// Send the QR email to one participant and flag it as sent
    pub async fn send_qr_email(&self, participant_id: Uuid) -> Result<()> {
        let participant = self
            .db
            .participants
            .find_by_id(participant_id)
            .await?
            .ok_or_else(|| EventPassError::ParticipantNotFound { participant_id: participant_id.to_string() })?;
        let event = self.event(participant.event_id).await?;
        self.send_tracked(&event, &participant, NotificationKind::QrCode).await
    }

    /// Send QR emails to an event's participants in paced batches
    pub async fn send_bulk_qr(&self, event_id: Uuid, only_unsent: bool) -> Result<BulkSendReport> {
        let event = self.event(event_id).await?;
        let participants: Vec<Participant> = self
            .db
            .participants
            .list_by_event(event_id)
            .await?
            .into_iter()
            .filter(|p| !only_unsent || !p.qr_email_sent)
            .collect();

        info!(event_id = %event_id, count = participants.len(), only_unsent, "Sending bulk QR emails");

        let mut report = BulkSendReport {
            total_participants: participants.len(),
            ..Default::default()
        };
        let batch_size = self.config.batch_size.max(1);

        for (index, batch) in participants.chunks(batch_size).enumerate() {
            if index > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.batch_delay_ms)).await;
            }
            for participant in batch {
                let outcome = self.send_tracked(&event, participant, NotificationKind::QrCode).await;
                report.record(&participant.contact, outcome);
            }
            report.batches_processed += 1;
            debug!(event_id = %event_id, batch = index + 1, "QR email batch processed");
        }

        info!(
            event_id = %event_id,
            sent = report.sent,
            failed = report.failed,
            batches = report.batches_processed,
            "Bulk QR send finished"
        );
        Ok(report)
    }

    /// Send a follow-up message to an event's participants, or a subset of them
    pub async fn send_follow_up(&self, event_id: Uuid, request: FollowUpRequest) -> Result<BulkSendReport> {
        let survey_link = match request.survey_link.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(link) => Some(
                Url::parse(link)
                    .map_err(|_| EventPassError::validation("Survey link must be a valid absolute URL."))?
                    .to_string(),
            ),
            None => None,
        };

        let event = self.event(event_id).await?;
        let all = self.db.participants.list_by_event(event_id).await?;

        let mut report = BulkSendReport::default();
        let recipients: Vec<Participant> = match &request.participant_ids {
            Some(ids) => {
                let mut selected = Vec::with_capacity(ids.len());
                for id in ids {
                    match all.iter().find(|p| p.id == *id) {
                        Some(p) => selected.push(p.clone()),
                        None => {
                            report.failed += 1;
                            report.errors.push(format!("{}: participant not found for this event", id));
                        }
                    }
                }
                selected
            }
            None => all,
        };
        report.total_participants = recipients.len() + report.failed;

        let mut params = self.event_params(&event);
        params.insert(
            "custom_message".to_string(),
            request
                .custom_message
                .as_deref()
                .filter(|m| !m.trim().is_empty())
                .map(|m| format!("<p>{}</p>", escape_html(m.trim()).replace('\n', "<br>")))
                .unwrap_or_default(),
        );
        params.insert(
            "survey_section".to_string(),
            survey_link
                .map(|link| {
                    let link = escape_html(&link);
                    format!("<p>We would love your feedback: <a href=\"{0}\">{0}</a></p>", link)
                })
                .unwrap_or_default(),
        );
        let attachments: Vec<EmailAttachment> = request.image.into_iter().collect();

        info!(event_id = %event_id, count = recipients.len(), "Sending follow-up emails");

        let batch_size = self.config.batch_size.max(1);
        for (index, batch) in recipients.chunks(batch_size).enumerate() {
            if index > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.batch_delay_ms)).await;
            }
            for participant in batch {
                params.insert("participant_name".to_string(), escape_html(&participant.name));
                let outcome = async {
                    let (subject, html) = self.format_message("follow_up", &params)?;
                    let email = OutgoingEmail {
                        to: participant.contact.clone(),
                        subject,
                        html,
                        inline_png: None,
                        attachments: attachments.clone(),
                    };
                    let entry = self
                        .db
                        .outbox
                        .insert(participant.id, participant.event_id, NotificationKind::FollowUp)
                        .await?;
                    self.deliver(&entry, &email).await
                }
                .await;
                report.record(&participant.contact, outcome);
            }
            report.batches_processed += 1;
        }

        Ok(report)
    }

    /// Deliver the email for an outbox entry and record the outcome on it
    pub async fn deliver_entry(&self, entry: &OutboxEntry) -> Result<()> {
        let participant = match self.db.participants.find_by_id(entry.participant_id).await? {
            Some(participant) => participant,
            None => {
                let message = "Participant no longer exists";
                self.db.outbox.mark_failed(entry.id, message).await?;
                return Err(EventPassError::ParticipantNotFound {
                    participant_id: entry.participant_id.to_string(),
                });
            }
        };
        let event = match self.event(entry.event_id).await {
            Ok(event) => event,
            Err(e) => {
                self.db.outbox.mark_failed(entry.id, &e.to_string()).await?;
                return Err(e);
            }
        };

        let email = match self.qr_email(&event, &participant, entry.kind) {
            Ok(email) => email,
            Err(e) => {
                self.db.outbox.mark_failed(entry.id, &e.to_string()).await?;
                return Err(e);
            }
        };
        self.deliver(entry, &email).await?;
        self.db.participants.set_qr_email_sent(participant.id).await?;
        Ok(())
    }

    /// Re-send failed registration and QR emails
    pub async fn retry_failed(&self) -> Result<BulkSendReport> {
        let entries: Vec<OutboxEntry> = self
            .failed_entries()
            .await?
            .into_iter()
            .filter(|entry| entry.kind != NotificationKind::FollowUp)
            .collect();

        info!(count = entries.len(), "Retrying failed notifications");
        let mut report = BulkSendReport {
            total_participants: entries.len(),
            ..Default::default()
        };
        let batch_size = self.config.batch_size.max(1);

        for (index, batch) in entries.chunks(batch_size).enumerate() {
            if index > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.batch_delay_ms)).await;
            }
            for entry in batch {
                // An earlier entry in this run may already have resolved this one
                let current = self.db.outbox.find_by_id(entry.id).await?;
                if current.map(|e| e.status) != Some(OutboxStatus::Failed) {
                    report.total_participants -= 1;
                    continue;
                }
                let outcome = self.deliver_entry(entry).await;
                report.record(&entry.participant_id.to_string(), outcome);
            }
            report.batches_processed += 1;
        }

        Ok(report)
    }

    pub async fn failed_entries(&self) -> Result<Vec<OutboxEntry>> {
        self.db.outbox.list_by_status(OutboxStatus::Failed).await
    }

    async fn send_tracked(&self, event: &Event, participant: &Participant, kind: NotificationKind) -> Result<()> {
        let entry = self.db.outbox.insert(participant.id, event.id, kind).await?;
        let email = self.qr_email(event, participant, kind)?;
        self.deliver(&entry, &email).await?;
        self.db.participants.set_qr_email_sent(participant.id).await
    }

    async fn deliver(&self, entry: &OutboxEntry, email: &OutgoingEmail) -> Result<()> {
        match self.mailer.send(email).await {
            Ok(()) => {
                self.db.outbox.mark_sent(entry.id).await?;
                let superseded = self
                    .db
                    .outbox
                    .supersede_failed(entry.participant_id, entry.kind, entry.id)
                    .await?;
                if superseded > 0 {
                    debug!(participant_id = %entry.participant_id, kind = entry.kind.as_str(), superseded, "Earlier failures superseded");
                }
                log_notification(&email.to, entry.kind.as_str(), true, None);
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                if let Err(db_err) = self.db.outbox.mark_failed(entry.id, &message).await {
                    error!(outbox_id = %entry.id, error = %db_err, "Failed to record notification failure");
                }
                log_notification(&email.to, entry.kind.as_str(), false, Some(&message));
                Err(e)
            }
        }
    }

    /// Build the QR-bearing email for a registration or QR notification
    fn qr_email(&self, event: &Event, participant: &Participant, kind: NotificationKind) -> Result<OutgoingEmail> {
        let template_key = match kind {
            NotificationKind::Registration => "registration",
            _ => "qr_code",
        };

        let token = self.codec.encode(participant.id);
        let png = render_qr(&token, &self.qr_options)?;

        let mut params = self.event_params(event);
        params.insert("participant_name".to_string(), escape_html(&participant.name));
        let (subject, html) = self.format_message(template_key, &params)?;

        Ok(OutgoingEmail {
            to: participant.contact.clone(),
            subject,
            html,
            inline_png: Some((QR_CONTENT_ID.to_string(), png)),
            attachments: Vec::new(),
        })
    }

    async fn event(&self, event_id: Uuid) -> Result<Event> {
        self.db
            .events
            .find_by_id(event_id)
            .await?
            .ok_or_else(|| EventPassError::EventNotFound { event_id: event_id.to_string() })
    }

    fn event_params(&self, event: &Event) -> HashMap<String, String> {
        let mut params = HashMap::new();
        params.insert("event_name".to_string(), escape_html(&event.name));
        params.insert("start_date".to_string(), format_event_date(event.start_date));
        params.insert("end_date".to_string(), format_event_date(event.end_date));
        params.insert("location".to_string(), escape_html(&event.location));
        params.insert(
            "description".to_string(),
            if event.description.trim().is_empty() {
                String::new()
            } else {
                format!("<p><strong>Description:</strong> {}</p>", escape_html(&event.description))
            },
        );
        params.insert(
            "event_url".to_string(),
            escape_html(&format!("{}/{}", self.public_base_url, event.slug)),
        );
        params
    }

    /// Fill a template's subject and body with `params`
    fn format_message(&self, template_key: &str, params: &HashMap<String, String>) -> Result<(String, String)> {
        let template = self
            .templates
            .get(template_key)
            .ok_or_else(|| EventPassError::Internal(format!("Template not found: {}", template_key)))?;

        Ok((
            fill_placeholders(&template.subject, params),
            fill_placeholders(&template.html, params),
        ))
    }

    fn load_default_templates() -> HashMap<String, EmailTemplate> {
        let mut templates = HashMap::new();

        templates.insert(
            "registration".to_string(),
            EmailTemplate {
                key: "registration".to_string(),
                subject: "Registration Confirmed: {event_name}".to_string(),
                html: wrap_html(
                    r#"<div class="header">
      <h1>Registration Confirmed!</h1>
      <p>Dear <strong>{participant_name}</strong>,</p>
      <p>Your registration for the event has been successfully confirmed.</p>
    </div>
    <div class="details">
      <h2>Event Details</h2>
      <p><strong>Event Name:</strong> {event_name}</p>
      <p><strong>Start Date:</strong> {start_date}</p>
      <p><strong>End Date:</strong> {end_date}</p>
      <p><strong>Location:</strong> {location}</p>
      {description}
    </div>
    <div class="qr">
      <h3>Your Attendance QR Code</h3>
      <p>Present this code at the venue to check in:</p>
      <img src="cid:qr-code" alt="Attendance QR Code" style="max-width: 200px;">
      <p><strong>Event page:</strong> <a href="{event_url}">{event_url}</a></p>
    </div>"#,
                ),
            },
        );

        templates.insert(
            "qr_code".to_string(),
            EmailTemplate {
                key: "qr_code".to_string(),
                subject: "Your QR Code for {event_name}".to_string(),
                html: wrap_html(
                    r#"<div class="header">
      <h1>{event_name}</h1>
      <p>Dear <strong>{participant_name}</strong>,</p>
      <p>Here is your attendance QR code for {start_date} to {end_date} at {location}.</p>
    </div>
    <div class="qr">
      <img src="cid:qr-code" alt="Attendance QR Code" style="max-width: 200px;">
      <p>Present this code at the venue each day to check in.</p>
    </div>"#,
                ),
            },
        );

        templates.insert(
            "follow_up".to_string(),
            EmailTemplate {
                key: "follow_up".to_string(),
                subject: "Thank you for attending {event_name}".to_string(),
                html: wrap_html(
                    r#"<div class="header">
      <h1>Thank you!</h1>
      <p>Dear <strong>{participant_name}</strong>,</p>
      <p>Thank you for attending {event_name} at {location}.</p>
    </div>
    <div class="details">
      {custom_message}
      {survey_section}
    </div>"#,
                ),
            },
        );

        templates
    }
}

fn wrap_html(body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <style>
    body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px; }}
    .header, .qr {{ text-align: center; background-color: #f8f9fa; padding: 20px; border-radius: 8px; margin-bottom: 20px; }}
    .details {{ border: 1px solid #e9ecef; border-radius: 8px; padding: 20px; margin-bottom: 20px; }}
    h1 {{ color: #22c55e; }}
  </style>
</head>
<body>
    {}
</body>
</html>"#,
        body
    )
}
