//! Configuration loading from files and environment variables

use std::fs;

use eventpass::config::Settings;
use serial_test::serial;
use tempfile::TempDir;

fn write_config(dir: &TempDir, contents: &toml::Value) -> String {
    let path = dir.path().join("eventpass.toml");
    fs::write(&path, toml::to_string(contents).unwrap()).unwrap();
    path.to_string_lossy().into_owned()
}

fn clear_env() {
    for key in [
        "EVENTPASS__DATABASE__URL",
        "EVENTPASS__SERVER__PORT",
        "EVENTPASS__NOTIFICATIONS__BATCH_SIZE",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
#[serial]
fn test_file_values_override_defaults() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let contents: toml::Value = toml::from_str(
        r#"
        [database]
        url = "postgresql://localhost/eventpass_test"

        [server]
        port = 3000
        public_base_url = "https://events.example.com"

        [qr]
        error_correction = "H"
        "#,
    )
    .unwrap();
    let path = write_config(&dir, &contents);

    let settings = Settings::from_file(&path).unwrap();
    assert_eq!(settings.database.url, "postgresql://localhost/eventpass_test");
    assert_eq!(settings.server.port, 3000);
    assert_eq!(settings.server.public_base_url, "https://events.example.com");
    assert_eq!(settings.qr.error_correction, "H");
    // Untouched sections keep their defaults
    assert_eq!(settings.qr.size, 200);
    assert_eq!(settings.notifications.batch_size, 25);
    assert!(settings.validate().is_ok());
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let contents: toml::Value = toml::from_str(
        r#"
        [database]
        url = "postgresql://localhost/from_file"

        [server]
        port = 3000
        "#,
    )
    .unwrap();
    let path = write_config(&dir, &contents);

    std::env::set_var("EVENTPASS__DATABASE__URL", "postgresql://localhost/from_env");
    std::env::set_var("EVENTPASS__SERVER__PORT", "9090");
    std::env::set_var("EVENTPASS__NOTIFICATIONS__BATCH_SIZE", "5");
    let settings = Settings::from_file(&path);
    clear_env();

    let settings = settings.unwrap();
    assert_eq!(settings.database.url, "postgresql://localhost/from_env");
    assert_eq!(settings.server.port, 9090);
    assert_eq!(settings.notifications.batch_size, 5);
}

#[test]
#[serial]
fn test_missing_database_url_fails() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let contents: toml::Value = toml::from_str("[server]\nport = 3000\n").unwrap();
    let path = write_config(&dir, &contents);

    assert!(Settings::from_file(&path).is_err());
}

#[test]
#[serial]
fn test_validation_rejects_short_jwt_secret() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let contents: toml::Value = toml::from_str(
        r#"
        [database]
        url = "postgresql://localhost/eventpass_test"

        [auth]
        jwt_secret = "short"
        "#,
    )
    .unwrap();
    let path = write_config(&dir, &contents);

    let settings = Settings::from_file(&path).unwrap();
    assert!(settings.validate().is_err());
}
