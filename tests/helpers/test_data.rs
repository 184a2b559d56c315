//! Test data builders
//!
//! Fake but valid events, participants and users.

use chrono::Duration;
use eventpass::models::{EventDraft, ParticipantDraft};
use eventpass::utils::helpers::today;
use fake::faker::company::en::CompanyName;
use fake::faker::job::en::Title;
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use uuid::Uuid;

/// Slug that is unique across a test run
pub fn unique_slug(prefix: &str) -> String {
    format!("{}-{}", prefix, &Uuid::new_v4().simple().to_string()[..8])
}

/// Event running from yesterday to tomorrow, so it is active today
pub fn event_draft(slug: &str) -> EventDraft {
    let today = today();
    EventDraft {
        name: "Annual Tech Summit".to_string(),
        slug: slug.to_string(),
        start_date: Some(today - Duration::days(1)),
        end_date: Some(today + Duration::days(1)),
        location: "Abuja International Conference Centre".to_string(),
        description: "Two days of talks and workshops".to_string(),
        ..Default::default()
    }
}

pub fn fake_email() -> String {
    let first: String = FirstName().fake();
    format!(
        "{}.{}@example.com",
        first.to_lowercase().replace(|c: char| !c.is_ascii_alphanumeric(), ""),
        &Uuid::new_v4().simple().to_string()[..6]
    )
}

pub fn fake_phone() -> String {
    format!("080{:08}", (0..100_000_000u32).fake::<u32>())
}

pub fn fake_name() -> String {
    let first: String = FirstName().fake();
    let last: String = LastName().fake();
    format!("{} {}", first, last)
}

/// Registration form for `event_id` with unique contact details
pub fn participant_draft(event_id: Uuid) -> ParticipantDraft {
    ParticipantDraft {
        event_id,
        name: fake_name(),
        organization: Some(CompanyName().fake()),
        designation: Some(Title().fake()),
        department: None,
        position: None,
        contact: fake_email(),
        phone: fake_phone(),
    }
}
