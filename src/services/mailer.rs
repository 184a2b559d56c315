//! Outgoing mail transports

use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, info};

use crate::config::MailConfig;
use crate::utils::errors::{EventPassError, Result};

/// Content id the email templates reference for the embedded QR code
pub const QR_CONTENT_ID: &str = "qr-code";

/// File attached to an outgoing email
#[derive(Debug, Clone, PartialEq)]
pub struct EmailAttachment {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
    /// PNG shown inline under `cid:<id>`
    pub inline_png: Option<(String, Vec<u8>)>,
    pub attachments: Vec<EmailAttachment>,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<()>;
}

/// Pick the transport for the configuration: SMTP when enabled, log otherwise
pub fn mailer_from_config(config: &MailConfig) -> Result<Arc<dyn Mailer>> {
    if config.enabled {
        info!(host = %config.smtp_host, port = config.smtp_port, "Using SMTP mail transport");
        Ok(Arc::new(SmtpMailer::new(config)?))
    } else {
        info!("Mail disabled, messages will be logged only");
        Ok(Arc::new(LogMailer))
    }
}

/// SMTP delivery through lettre
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> Result<Self> {
        // Port 465 speaks TLS from the first byte, everything else upgrades
        let builder = if config.smtp_port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
        }
        .map_err(|e| EventPassError::Config(format!("SMTP relay error: {}", e)))?
        .port(config.smtp_port);

        let builder = if config.username.is_empty() {
            builder
        } else {
            builder.credentials(Credentials::new(config.username.clone(), config.password.clone()))
        };

        let from = format!("{} <{}>", config.from_name, config.from_email)
            .parse::<Mailbox>()
            .map_err(|e| EventPassError::Config(format!("Invalid from address: {}", e)))?;

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    fn build_message(&self, email: &OutgoingEmail) -> Result<Message> {
        let to = email
            .to
            .parse::<Mailbox>()
            .map_err(|e| EventPassError::Mail(format!("Invalid to address: {}", e)))?;

        let html = SinglePart::html(email.html.clone());
        let mut body = match &email.inline_png {
            Some((cid, png)) => {
                let png_type = ContentType::parse("image/png").map_err(mail_error)?;
                MultiPart::related()
                    .singlepart(html)
                    .singlepart(Attachment::new_inline(cid.clone()).body(png.clone(), png_type))
            }
            None => MultiPart::related().singlepart(html),
        };

        if !email.attachments.is_empty() {
            let mut mixed = MultiPart::mixed().multipart(body);
            for attachment in &email.attachments {
                let content_type = ContentType::parse(&attachment.content_type).map_err(mail_error)?;
                let part = Attachment::new(attachment.filename.clone()).body(attachment.data.clone(), content_type);
                mixed = mixed.singlepart(part);
            }
            body = mixed;
        }

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject.clone())
            .multipart(body)
            .map_err(|e| EventPassError::Mail(format!("Failed to build email: {}", e)))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<()> {
        let message = self.build_message(email)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| EventPassError::Mail(format!("Failed to send email: {}", e)))?;
        debug!(to = %email.to, subject = %email.subject, "Email sent via SMTP");
        Ok(())
    }
}

fn mail_error(e: impl std::fmt::Display) -> EventPassError {
    EventPassError::Mail(e.to_string())
}

/// Writes a summary of each message to the log instead of sending it
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<()> {
        info!(
            to = %email.to,
            subject = %email.subject,
            html_bytes = email.html.len(),
            inline_qr = email.inline_png.is_some(),
            attachments = email.attachments.len(),
            "Email not sent (mail disabled)"
        );
        Ok(())
    }
}

#[cfg(feature = "test-utils")]
pub use recording::RecordingMailer;

#[cfg(feature = "test-utils")]
mod recording {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use super::*;

    /// Keeps every delivered message in memory; listed recipients fail
    #[derive(Default)]
    pub struct RecordingMailer {
        sent: Mutex<Vec<OutgoingEmail>>,
        failing: Mutex<HashSet<String>>,
    }

    impl RecordingMailer {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make deliveries to `address` fail until `recover` is called
        pub fn fail_for(&self, address: &str) {
            if let Ok(mut failing) = self.failing.lock() {
                failing.insert(address.to_string());
            }
        }

        pub fn recover(&self, address: &str) {
            if let Ok(mut failing) = self.failing.lock() {
                failing.remove(address);
            }
        }

        pub fn sent(&self) -> Vec<OutgoingEmail> {
            self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
        }

        pub fn sent_to(&self, address: &str) -> Vec<OutgoingEmail> {
            self.sent().into_iter().filter(|email| email.to == address).collect()
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: &OutgoingEmail) -> Result<()> {
            let fails = self
                .failing
                .lock()
                .map(|failing| failing.contains(&email.to))
                .unwrap_or(false);
            if fails {
                return Err(EventPassError::Mail(format!("Mailbox unavailable: {}", email.to)));
            }

            self.sent
                .lock()
                .map_err(|_| EventPassError::Internal("Recording mailer poisoned".to_string()))?
                .push(email.clone());
            Ok(())
        }
    }
}
