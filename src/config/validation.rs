//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use super::Settings;
use crate::utils::errors::{EventPassError, Result};

const MIN_JWT_SECRET_BYTES: usize = 32;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_server_config(&settings.server)?;
    validate_database_config(&settings.database)?;
    validate_auth_config(&settings.auth)?;
    validate_qr_config(&settings.qr)?;
    validate_mail_config(&settings.mail)?;
    validate_notifications_config(&settings.notifications)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

/// Validate server configuration
fn validate_server_config(config: &super::ServerConfig) -> Result<()> {
    if config.host.is_empty() {
        return Err(EventPassError::Config("Server host is required".to_string()));
    }

    if url::Url::parse(&config.public_base_url).is_err() {
        return Err(EventPassError::Config(format!(
            "Public base URL is not a valid URL: {}",
            config.public_base_url
        )));
    }

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(EventPassError::Config(
            "Database URL is required (set EVENTPASS__DATABASE__URL)".to_string(),
        ));
    }

    if config.max_connections == 0 {
        return Err(EventPassError::Config(
            "Max connections must be greater than 0".to_string(),
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(EventPassError::Config(
            "Min connections cannot be greater than max connections".to_string(),
        ));
    }

    Ok(())
}

/// Validate token signing configuration
fn validate_auth_config(config: &super::AuthConfig) -> Result<()> {
    if config.jwt_secret.len() < MIN_JWT_SECRET_BYTES {
        return Err(EventPassError::Config(format!(
            "JWT secret must be at least {} bytes",
            MIN_JWT_SECRET_BYTES
        )));
    }

    if config.token_ttl_minutes <= 0 {
        return Err(EventPassError::Config(
            "Token lifetime must be greater than 0".to_string(),
        ));
    }

    if config.login_attempts_per_minute == 0 {
        return Err(EventPassError::Config(
            "Login attempts per minute must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

/// Validate QR configuration
fn validate_qr_config(config: &super::QrConfig) -> Result<()> {
    if config.encryption_key.is_empty() {
        return Err(EventPassError::Config(
            "QR encryption key is required".to_string(),
        ));
    }

    let scheme_ok = config
        .scheme
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic())
        && config
            .scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if !scheme_ok {
        return Err(EventPassError::Config(format!(
            "Invalid QR scheme: {}",
            config.scheme
        )));
    }

    if config.size == 0 {
        return Err(EventPassError::Config("QR size must be greater than 0".to_string()));
    }

    let valid_levels = ["L", "M", "Q", "H"];
    if !valid_levels.contains(&config.error_correction.to_uppercase().as_str()) {
        return Err(EventPassError::Config(format!(
            "Invalid QR error correction level: {}. Valid levels: {:?}",
            config.error_correction, valid_levels
        )));
    }

    Ok(())
}

/// Validate mail transport configuration
fn validate_mail_config(config: &super::MailConfig) -> Result<()> {
    if !config.enabled {
        return Ok(());
    }

    if config.smtp_host.is_empty() {
        return Err(EventPassError::Config(
            "SMTP host is required when mail is enabled".to_string(),
        ));
    }

    if config.from_email.is_empty() {
        return Err(EventPassError::Config(
            "Sender address is required when mail is enabled".to_string(),
        ));
    }

    Ok(())
}

/// Validate bulk notification pacing
fn validate_notifications_config(config: &super::NotificationsConfig) -> Result<()> {
    if config.batch_size == 0 {
        return Err(EventPassError::Config(
            "Notification batch size must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(EventPassError::Config("Log level is required".to_string()));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(EventPassError::Config(format!(
            "Invalid log level: {}. Valid levels: {:?}",
            config.level, valid_levels
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_settings() -> Settings {
        let mut settings = Settings::default();
        settings.database.url = "postgres://localhost/eventpass".to_string();
        settings
    }

    #[test]
    fn test_default_settings_with_database_url_are_valid() {
        assert!(validate_settings(&valid_settings()).is_ok());
    }

    #[test]
    fn test_missing_database_url_is_rejected() {
        let settings = Settings::default();
        let err = validate_settings(&settings).unwrap_err();
        assert!(err.to_string().contains("Database URL is required"));
    }

    #[test]
    fn test_pool_sizes() {
        let mut settings = valid_settings();
        settings.database.min_connections = 20;
        assert!(validate_settings(&settings).is_err());

        settings.database.min_connections = 0;
        settings.database.max_connections = 0;
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_short_jwt_secret_is_rejected() {
        let mut settings = valid_settings();
        settings.auth.jwt_secret = "short".to_string();
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_qr_settings() {
        let mut settings = valid_settings();
        settings.qr.scheme = "1bad scheme".to_string();
        assert!(validate_settings(&settings).is_err());

        let mut settings = valid_settings();
        settings.qr.encryption_key.clear();
        assert!(validate_settings(&settings).is_err());

        let mut settings = valid_settings();
        settings.qr.error_correction = "x".to_string();
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_mail_enabled_requires_host() {
        let mut settings = valid_settings();
        settings.mail.enabled = true;
        assert!(validate_settings(&settings).is_err());

        settings.mail.smtp_host = "smtp.example.com".to_string();
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn test_zero_batch_size_is_rejected() {
        let mut settings = valid_settings();
        settings.notifications.batch_size = 0;
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut settings = valid_settings();
        settings.logging.level = "verbose".to_string();
        assert!(validate_settings(&settings).is_err());
    }
}
