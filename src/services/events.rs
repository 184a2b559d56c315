//! Event registry service
//!
//! Handles event CRUD with slug uniqueness, derived active status and the
//! per-event staff assignments that gate attendance marking.

use chrono::{NaiveDate, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use super::auth::CurrentUser;
use crate::database::DatabaseService;
use crate::models::{Event, EventDraft, User};
use crate::utils::errors::{EventPassError, Result};
use crate::utils::helpers::{has_min_chars, is_valid_slug, non_empty};

/// Longest span an event may cover, in calendar days
pub const MAX_EVENT_DAYS: i64 = 366;

#[derive(Clone)]
pub struct EventService {
    db: DatabaseService,
}

impl EventService {
    pub fn new(db: DatabaseService) -> Self {
        Self { db }
    }

    /// Create a new event
    pub async fn create(&self, draft: EventDraft) -> Result<Event> {
        let (start_date, end_date) = validate_draft(&draft)?;
        debug!(slug = %draft.slug, "Creating event");

        if self.db.events.find_by_slug(draft.slug.trim()).await?.is_some() {
            return Err(EventPassError::DuplicateSlug { slug: draft.slug.trim().to_string() });
        }

        let now = Utc::now();
        let event = Event {
            id: Uuid::new_v4(),
            name: draft.name.trim().to_string(),
            slug: draft.slug.trim().to_string(),
            start_date,
            end_date,
            location: draft.location.trim().to_string(),
            description: draft.description.trim().to_string(),
            is_active: draft.is_active,
            is_internal: draft.is_internal,
            department: non_empty(draft.department),
            position: non_empty(draft.position),
            assigned_staff: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        let event = self.db.events.insert(&event).await?;
        info!(event_id = %event.id, slug = %event.slug, "Event created");
        Ok(event)
    }

    /// Replace an event's details; staff assignments are kept
    pub async fn update(&self, id: Uuid, draft: EventDraft) -> Result<Event> {
        let (start_date, end_date) = validate_draft(&draft)?;
        debug!(event_id = %id, "Updating event");

        let existing = self.get_by_id(id).await?;

        let slug = draft.slug.trim().to_string();
        if let Some(other) = self.db.events.find_by_slug(&slug).await? {
            if other.id != id {
                return Err(EventPassError::DuplicateSlug { slug });
            }
        }

        let updated = Event {
            name: draft.name.trim().to_string(),
            slug,
            start_date,
            end_date,
            location: draft.location.trim().to_string(),
            description: draft.description.trim().to_string(),
            is_active: draft.is_active,
            is_internal: draft.is_internal,
            department: non_empty(draft.department),
            position: non_empty(draft.position),
            ..existing
        };

        let event = self
            .db
            .events
            .update(&updated)
            .await?
            .ok_or_else(|| EventPassError::EventNotFound { event_id: id.to_string() })?;
        info!(event_id = %event.id, "Event updated");
        Ok(event)
    }

    /// Hard-delete an event. Participants and attendance stay in place.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        if !self.db.events.delete(id).await? {
            return Err(EventPassError::EventNotFound { event_id: id.to_string() });
        }
        info!(event_id = %id, "Event deleted");
        Ok(())
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Event> {
        self.db
            .events
            .find_by_id(id)
            .await?
            .ok_or_else(|| EventPassError::EventNotFound { event_id: id.to_string() })
    }

    /// Look up an event by its public slug
    pub async fn get_by_slug(&self, slug: &str) -> Result<Event> {
        self.db
            .events
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| EventPassError::EventNotFound { event_id: slug.to_string() })
    }

    pub async fn list_all(&self) -> Result<Vec<Event>> {
        self.db.events.list().await
    }

    /// Events active on `today`, honouring explicit overrides
    pub async fn list_active(&self, today: NaiveDate) -> Result<Vec<Event>> {
        let events = self.db.events.list().await?;
        Ok(events.into_iter().filter(|e| e.is_active_on(today)).collect())
    }

    /// Active events a user may scan for: all for admins, assigned ones otherwise
    pub async fn list_for_scanner(&self, user: &CurrentUser, today: NaiveDate) -> Result<Vec<Event>> {
        let events = self.list_active(today).await?;
        Ok(events
            .into_iter()
            .filter(|event| can_mark_attendance(user, event))
            .collect())
    }

    /// Assign a staff member to an event
    pub async fn assign_staff(&self, event_id: Uuid, user_id: Uuid) -> Result<()> {
        self.get_by_id(event_id).await?;
        self.db
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(EventPassError::UserNotFound { user_id })?;

        if !self.db.events.add_staff(event_id, user_id).await? {
            return Err(EventPassError::StaffAlreadyAssigned);
        }
        info!(event_id = %event_id, user_id = %user_id, "Staff assigned to event");
        Ok(())
    }

    /// Remove a staff member from an event
    pub async fn unassign_staff(&self, event_id: Uuid, user_id: Uuid) -> Result<()> {
        self.get_by_id(event_id).await?;

        if !self.db.events.remove_staff(event_id, user_id).await? {
            return Err(EventPassError::StaffNotAssigned);
        }
        info!(event_id = %event_id, user_id = %user_id, "Staff removed from event");
        Ok(())
    }

    /// Users assigned to an event; ids of deleted users are skipped
    pub async fn assigned_staff(&self, event_id: Uuid) -> Result<Vec<User>> {
        let event = self.get_by_id(event_id).await?;
        let mut staff = Vec::with_capacity(event.assigned_staff.len());
        for user_id in &event.assigned_staff {
            if let Some(user) = self.db.users.find_by_id(*user_id).await? {
                staff.push(user);
            }
        }
        Ok(staff)
    }
}

/// Admins may mark attendance anywhere; other users only where assigned
pub fn can_mark_attendance(user: &CurrentUser, event: &Event) -> bool {
    user.is_admin() || event.is_staff_assigned(user.id)
}

/// Check an event form, returning the start and end dates
pub fn validate_draft(draft: &EventDraft) -> Result<(NaiveDate, NaiveDate)> {
    if !has_min_chars(&draft.name, 5) {
        return Err(EventPassError::validation("Event name must be at least 5 characters."));
    }
    if draft.slug.trim().chars().count() < 3 {
        return Err(EventPassError::validation("URL slug must be at least 3 characters."));
    }
    if !is_valid_slug(draft.slug.trim()) {
        return Err(EventPassError::validation(
            "URL slug can only contain letters, numbers, and hyphens.",
        ));
    }
    if !has_min_chars(&draft.location, 3) {
        return Err(EventPassError::validation("Location must be at least 3 characters."));
    }

    let start_date = draft
        .start_date
        .ok_or_else(|| EventPassError::validation("A start date is required."))?;
    let end_date = draft
        .end_date
        .ok_or_else(|| EventPassError::validation("An end date is required."))?;
    if end_date < start_date {
        return Err(EventPassError::validation("End date cannot be before the start date."));
    }
    if (end_date - start_date).num_days() >= MAX_EVENT_DAYS {
        return Err(EventPassError::validation(format!(
            "An event cannot span more than {} days.",
            MAX_EVENT_DAYS
        )));
    }

    Ok((start_date, end_date))
}
