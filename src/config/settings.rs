//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use serde::{Deserialize, Serialize};

use crate::utils::errors::Result;

/// Environment variable prefix, e.g. `EVENTPASS__DATABASE__URL`
pub const ENV_PREFIX: &str = "EVENTPASS";

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub qr: QrConfig,
    pub mail: MailConfig,
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub flyer: FlyerConfig,
    pub bootstrap: BootstrapConfig,
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Base URL of the public registration pages, used in emails
    pub public_base_url: String,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Token signing and login throttling
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
    pub issuer: String,
    pub login_attempts_per_minute: u32,
}

/// QR token obfuscation and rendering defaults
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QrConfig {
    pub encryption_key: String,
    pub scheme: String,
    pub size: u32,
    pub margin: u32,
    /// One of L, M, Q, H
    pub error_correction: String,
}

/// Outgoing mail transport
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MailConfig {
    /// When false, messages are written to the log instead of sent
    pub enabled: bool,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
}

/// Bulk notification pacing
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotificationsConfig {
    pub batch_size: usize,
    pub batch_delay_ms: u64,
    pub send_on_register: bool,
}

/// Flyer rendering assets
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FlyerConfig {
    pub template_path: Option<String>,
    pub font_path: Option<String>,
}

/// Default admin account seeded into an empty users table
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BootstrapConfig {
    pub admin_email: String,
    pub admin_name: String,
    pub admin_password: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    /// Directory for the daily rolling log file; stdout only when unset
    pub directory: Option<String>,
    pub json: bool,
}

impl Settings {
    /// Load settings from `config.toml` (optional) and environment variables.
    ///
    /// Fails when `database.url` is not provided by any source.
    pub fn new() -> Result<Self> {
        Ok(Self::load(config::File::with_name("config").required(false))?)
    }

    /// Load settings from an explicit file plus environment variables
    pub fn from_file(path: &str) -> Result<Self> {
        Ok(Self::load(config::File::with_name(path).required(true))?)
    }

    fn load(
        file: config::File<config::FileSourceFile, config::FileFormat>,
    ) -> std::result::Result<Self, config::ConfigError> {
        let defaults = Settings::default();

        let settings = config::Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", defaults.server.port)?
            .set_default("server.public_base_url", defaults.server.public_base_url)?
            .set_default("database.max_connections", defaults.database.max_connections)?
            .set_default("database.min_connections", defaults.database.min_connections)?
            .set_default("auth.jwt_secret", defaults.auth.jwt_secret)?
            .set_default("auth.token_ttl_minutes", defaults.auth.token_ttl_minutes)?
            .set_default("auth.issuer", defaults.auth.issuer)?
            .set_default("auth.login_attempts_per_minute", defaults.auth.login_attempts_per_minute)?
            .set_default("qr.encryption_key", defaults.qr.encryption_key)?
            .set_default("qr.scheme", defaults.qr.scheme)?
            .set_default("qr.size", defaults.qr.size)?
            .set_default("qr.margin", defaults.qr.margin)?
            .set_default("qr.error_correction", defaults.qr.error_correction)?
            .set_default("mail.enabled", defaults.mail.enabled)?
            .set_default("mail.smtp_host", defaults.mail.smtp_host)?
            .set_default("mail.smtp_port", defaults.mail.smtp_port)?
            .set_default("mail.username", defaults.mail.username)?
            .set_default("mail.password", defaults.mail.password)?
            .set_default("mail.from_email", defaults.mail.from_email)?
            .set_default("mail.from_name", defaults.mail.from_name)?
            .set_default("notifications.batch_size", defaults.notifications.batch_size as u64)?
            .set_default("notifications.batch_delay_ms", defaults.notifications.batch_delay_ms)?
            .set_default("notifications.send_on_register", defaults.notifications.send_on_register)?
            .set_default("bootstrap.admin_email", defaults.bootstrap.admin_email)?
            .set_default("bootstrap.admin_name", defaults.bootstrap.admin_name)?
            .set_default("logging.level", defaults.logging.level)?
            .set_default("logging.json", defaults.logging.json)?
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<()> {
        super::validation::validate_settings(self)
    }

    /// Address the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                public_base_url: "http://localhost:8080".to_string(),
            },
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 10,
                min_connections: 1,
            },
            auth: AuthConfig {
                jwt_secret: "change-me-to-a-long-random-secret-of-32-bytes".to_string(),
                token_ttl_minutes: 60 * 24,
                issuer: "eventpass".to_string(),
                login_attempts_per_minute: 10,
            },
            qr: QrConfig {
                encryption_key: "eventpass-default-qr-key".to_string(),
                scheme: "eventpass".to_string(),
                size: 200,
                margin: 2,
                error_correction: "M".to_string(),
            },
            mail: MailConfig {
                enabled: false,
                smtp_host: String::new(),
                smtp_port: 587,
                username: String::new(),
                password: String::new(),
                from_email: "noreply@eventpass.local".to_string(),
                from_name: "EventPass".to_string(),
            },
            notifications: NotificationsConfig {
                batch_size: 25,
                batch_delay_ms: 1000,
                send_on_register: true,
            },
            flyer: FlyerConfig::default(),
            bootstrap: BootstrapConfig {
                admin_email: "admin@eventpass.local".to_string(),
                admin_name: "System Administrator".to_string(),
                admin_password: None,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                directory: None,
                json: false,
            },
        }
    }
}
