//! Helper functions and utilities
//!
//! This module contains common helper functions used throughout the application.

use std::collections::HashMap;
use std::sync::OnceLock;

use chrono::{Local, NaiveDate};
use regex::Regex;

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
static SLUG_RE: OnceLock<Regex> = OnceLock::new();
static PLACEHOLDER_RE: OnceLock<Regex> = OnceLock::new();

/// Today's calendar date in server-local time
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Format a calendar date the way emails and flyers show it ("October 26, 2025")
pub fn format_event_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Normalize an email address for storage and comparison
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate email format
pub fn is_valid_email(email: &str) -> bool {
    let re = EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
    });
    re.is_match(email)
}

/// Validate phone number format (length only, formats vary by region)
pub fn is_valid_phone(phone: &str) -> bool {
    phone.trim().chars().count() >= 11
}

/// Validate an event URL slug: letters, digits and hyphens, at least 3 long
pub fn is_valid_slug(slug: &str) -> bool {
    let re = SLUG_RE.get_or_init(|| Regex::new(r"^[a-zA-Z0-9-]+$").expect("slug pattern is valid"));
    slug.chars().count() >= 3 && re.is_match(slug)
}

/// Check that a trimmed string has at least `min` characters
pub fn has_min_chars(value: &str, min: usize) -> bool {
    value.trim().chars().count() >= min
}

/// Turn an optional string into `None` when it is empty or whitespace
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Substitute `{key}` placeholders in a single pass. Substituted values are
/// never scanned again, and unknown keys stay as written.
pub fn fill_placeholders(template: &str, params: &HashMap<String, String>) -> String {
    let re = PLACEHOLDER_RE.get_or_init(|| Regex::new(r"\{([a-z_]+)\}").expect("placeholder pattern is valid"));
    re.replace_all(template, |caps: &regex::Captures| match params.get(&caps[1]) {
        Some(value) => value.clone(),
        None => caps[0].to_string(),
    })
    .into_owned()
}

/// Every calendar day from `start` to `end`, inclusive
pub fn days_between(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start.iter_days().take_while(|day| *day <= end).collect()
}

/// Sanitize a name for use in a download filename
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Generate a random alphanumeric string
pub fn generate_random_string(length: usize) -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ\
                            abcdefghijklmnopqrstuvwxyz\
                            0123456789";
    let mut rng = rand::thread_rng();

    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// Escape text for interpolation into HTML email bodies
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
