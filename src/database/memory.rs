//! In-memory repositories for tests.
//!
//! Emulates the unique indexes of the PostgreSQL schema so services see the
//! same conflict errors they would get from the database.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use super::repositories::{
    AttendanceRepository, EventRepository, OutboxRepository, ParticipantRepository, UserRepository,
};
use crate::models::*;
use crate::utils::errors::{EventPassError, Result};

#[derive(Default)]
struct State {
    events: HashMap<Uuid, Event>,
    participants: Vec<Participant>,
    attendance: Vec<AttendanceRecord>,
    users: HashMap<Uuid, User>,
    outbox: Vec<OutboxEntry>,
}

/// Shared in-memory store implementing every repository trait
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| EventPassError::Internal("in-memory store poisoned".to_string()))
    }
}

#[async_trait]
impl EventRepository for MemoryStore {
    async fn insert(&self, event: &Event) -> Result<Event> {
        let mut state = self.lock()?;
        if state.events.values().any(|e| e.slug == event.slug) {
            return Err(EventPassError::DuplicateSlug { slug: event.slug.clone() });
        }
        state.events.insert(event.id, event.clone());
        Ok(event.clone())
    }

    async fn update(&self, event: &Event) -> Result<Option<Event>> {
        let mut state = self.lock()?;
        if state.events.values().any(|e| e.slug == event.slug && e.id != event.id) {
            return Err(EventPassError::DuplicateSlug { slug: event.slug.clone() });
        }
        let Some(stored) = state.events.get_mut(&event.id) else {
            return Ok(None);
        };

        let assigned_staff = std::mem::take(&mut stored.assigned_staff);
        let created_at = stored.created_at;
        *stored = Event {
            assigned_staff,
            created_at,
            updated_at: Utc::now(),
            ..event.clone()
        };
        Ok(Some(stored.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.lock()?.events.remove(&id).is_some())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>> {
        Ok(self.lock()?.events.get(&id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Event>> {
        Ok(self.lock()?.events.values().find(|e| e.slug == slug).cloned())
    }

    async fn list(&self) -> Result<Vec<Event>> {
        let mut events: Vec<Event> = self.lock()?.events.values().cloned().collect();
        events.sort_by(|a, b| b.start_date.cmp(&a.start_date).then_with(|| a.name.cmp(&b.name)));
        Ok(events)
    }

    async fn add_staff(&self, event_id: Uuid, user_id: Uuid) -> Result<bool> {
        let mut state = self.lock()?;
        match state.events.get_mut(&event_id) {
            Some(event) if !event.assigned_staff.contains(&user_id) => {
                event.assigned_staff.push(user_id);
                event.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn remove_staff(&self, event_id: Uuid, user_id: Uuid) -> Result<bool> {
        let mut state = self.lock()?;
        match state.events.get_mut(&event_id) {
            Some(event) if event.assigned_staff.contains(&user_id) => {
                event.assigned_staff.retain(|id| *id != user_id);
                event.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl ParticipantRepository for MemoryStore {
    async fn insert(&self, participant: &NewParticipant) -> Result<Participant> {
        let mut state = self.lock()?;

        // Partial indexes: only self-registrations are constrained
        if participant.onboarded_by.is_none() {
            let constrained = state
                .participants
                .iter()
                .filter(|p| p.event_id == participant.event_id && p.onboarded_by.is_none());
            for existing in constrained {
                if existing.contact == participant.contact {
                    return Err(EventPassError::DuplicateEmail);
                }
                if existing.phone == participant.phone {
                    return Err(EventPassError::DuplicatePhone);
                }
            }
        }

        let stored = Participant {
            id: Uuid::new_v4(),
            event_id: participant.event_id,
            name: participant.name.clone(),
            organization: participant.organization.clone(),
            designation: participant.designation.clone(),
            department: participant.department.clone(),
            position: participant.position.clone(),
            contact: participant.contact.clone(),
            phone: participant.phone.clone(),
            qr_email_sent: false,
            onboarded_by: participant.onboarded_by,
            onboarding_date: participant.onboarding_date,
            registered_at: Utc::now(),
        };
        state.participants.push(stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Participant>> {
        Ok(self.lock()?.participants.iter().find(|p| p.id == id).cloned())
    }

    async fn find_by_contact(&self, event_id: Uuid, contact: &str) -> Result<Option<Participant>> {
        Ok(self
            .lock()?
            .participants
            .iter()
            .find(|p| p.event_id == event_id && p.contact == contact)
            .cloned())
    }

    async fn find_by_phone(&self, event_id: Uuid, phone: &str) -> Result<Option<Participant>> {
        Ok(self
            .lock()?
            .participants
            .iter()
            .find(|p| p.event_id == event_id && p.phone == phone)
            .cloned())
    }

    async fn list_by_event(&self, event_id: Uuid) -> Result<Vec<Participant>> {
        Ok(self
            .lock()?
            .participants
            .iter()
            .filter(|p| p.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<Participant>> {
        Ok(self.lock()?.participants.clone())
    }

    async fn count_by_event(&self, event_id: Uuid) -> Result<i64> {
        Ok(self
            .lock()?
            .participants
            .iter()
            .filter(|p| p.event_id == event_id)
            .count() as i64)
    }

    async fn set_qr_email_sent(&self, id: Uuid) -> Result<()> {
        if let Some(participant) = self.lock()?.participants.iter_mut().find(|p| p.id == id) {
            participant.qr_email_sent = true;
        }
        Ok(())
    }

    async fn update_contact(&self, id: Uuid, contact: &str) -> Result<()> {
        let mut state = self.lock()?;
        let Some(target) = state.participants.iter().find(|p| p.id == id).cloned() else {
            return Ok(());
        };

        if target.onboarded_by.is_none()
            && state.participants.iter().any(|p| {
                p.id != id && p.event_id == target.event_id && p.onboarded_by.is_none() && p.contact == contact
            })
        {
            return Err(EventPassError::DuplicateEmail);
        }

        if let Some(participant) = state.participants.iter_mut().find(|p| p.id == id) {
            participant.contact = contact.to_string();
        }
        Ok(())
    }
}

impl MemoryStore {
    /// Store a participant row as-is, like a legacy row written before emails were normalized
    pub fn seed_participant(&self, participant: Participant) -> Result<()> {
        self.lock()?.participants.push(participant);
        Ok(())
    }
}

#[async_trait]
impl AttendanceRepository for MemoryStore {
    async fn insert(&self, record: &NewAttendance) -> Result<AttendanceRecord> {
        let mut state = self.lock()?;
        if let Some(existing) = state.attendance.iter().find(|a| {
            a.participant_id == record.participant_id
                && a.event_id == record.event_id
                && a.attendance_date == record.attendance_date
        }) {
            return Err(EventPassError::AlreadyMarked { existing: Box::new(existing.clone()) });
        }

        let stored = AttendanceRecord {
            id: Uuid::new_v4(),
            participant_id: record.participant_id,
            event_id: record.event_id,
            checked_in_at: record.checked_in_at,
            attendance_date: record.attendance_date,
            participant_name: record.participant_name.clone(),
            participant_organization: record.participant_organization.clone(),
            participant_position: record.participant_position.clone(),
            signed_by: record.signed_by.clone(),
            checked_in_by: record.checked_in_by,
        };
        state.attendance.push(stored.clone());
        Ok(stored)
    }

    async fn find(
        &self,
        participant_id: Uuid,
        event_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>> {
        Ok(self
            .lock()?
            .attendance
            .iter()
            .find(|a| a.participant_id == participant_id && a.event_id == event_id && a.attendance_date == date)
            .cloned())
    }

    async fn list_by_event(&self, event_id: Uuid, date: Option<NaiveDate>) -> Result<Vec<AttendanceRecord>> {
        let mut records: Vec<AttendanceRecord> = self
            .lock()?
            .attendance
            .iter()
            .filter(|a| a.event_id == event_id && date.map_or(true, |d| a.attendance_date == d))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.checked_in_at.cmp(&a.checked_in_at));
        Ok(records)
    }

    async fn count_checked_in(&self, event_id: Uuid, date: Option<NaiveDate>) -> Result<i64> {
        let state = self.lock()?;
        let mut participants: Vec<Uuid> = state
            .attendance
            .iter()
            .filter(|a| a.event_id == event_id && date.map_or(true, |d| a.attendance_date == d))
            .map(|a| a.participant_id)
            .collect();
        participants.sort();
        participants.dedup();
        Ok(participants.len() as i64)
    }

    async fn daily_counts(&self, event_id: Uuid) -> Result<Vec<(NaiveDate, i64)>> {
        let state = self.lock()?;
        let mut counts: HashMap<NaiveDate, i64> = HashMap::new();
        for record in state.attendance.iter().filter(|a| a.event_id == event_id) {
            *counts.entry(record.attendance_date).or_insert(0) += 1;
        }
        let mut rows: Vec<(NaiveDate, i64)> = counts.into_iter().collect();
        rows.sort_by_key(|(date, _)| *date);
        Ok(rows)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert(&self, user: &NewUser) -> Result<User> {
        let mut state = self.lock()?;
        if state.users.values().any(|u| u.email == user.email) {
            return Err(EventPassError::DuplicateUserEmail);
        }
        let now = Utc::now();
        let stored = User {
            id: Uuid::new_v4(),
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.lock()?.users.values().find(|u| u.email == email).cloned())
    }

    async fn list(&self) -> Result<Vec<User>> {
        let mut users: Vec<User> = self.lock()?.users.values().cloned().collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    async fn update(&self, user: &User) -> Result<Option<User>> {
        let mut state = self.lock()?;
        if state.users.values().any(|u| u.email == user.email && u.id != user.id) {
            return Err(EventPassError::DuplicateUserEmail);
        }
        let Some(stored) = state.users.get_mut(&user.id) else {
            return Ok(None);
        };
        stored.full_name = user.full_name.clone();
        stored.email = user.email.clone();
        stored.password_hash = user.password_hash.clone();
        stored.role = user.role;
        stored.updated_at = Utc::now();
        Ok(Some(stored.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.lock()?.users.remove(&id).is_some())
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.lock()?.users.len() as i64)
    }
}

#[async_trait]
impl OutboxRepository for MemoryStore {
    async fn insert(&self, participant_id: Uuid, event_id: Uuid, kind: NotificationKind) -> Result<OutboxEntry> {
        let now = Utc::now();
        let entry = OutboxEntry {
            id: Uuid::new_v4(),
            participant_id,
            event_id,
            kind,
            status: OutboxStatus::Pending,
            attempts: 0,
            last_error: None,
            created_at: now,
            updated_at: now,
        };
        self.lock()?.outbox.push(entry.clone());
        Ok(entry)
    }

    async fn mark_sent(&self, id: Uuid) -> Result<()> {
        if let Some(entry) = self.lock()?.outbox.iter_mut().find(|e| e.id == id) {
            entry.status = OutboxStatus::Sent;
            entry.attempts += 1;
            entry.last_error = None;
            entry.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, error: &str) -> Result<()> {
        if let Some(entry) = self.lock()?.outbox.iter_mut().find(|e| e.id == id) {
            entry.status = OutboxStatus::Failed;
            entry.attempts += 1;
            entry.last_error = Some(error.to_string());
            entry.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn supersede_failed(&self, participant_id: Uuid, kind: NotificationKind, except: Uuid) -> Result<u64> {
        let mut changed = 0;
        for entry in self.lock()?.outbox.iter_mut().filter(|e| {
            e.participant_id == participant_id && e.kind == kind && e.id != except && e.status == OutboxStatus::Failed
        }) {
            entry.status = OutboxStatus::Superseded;
            entry.updated_at = Utc::now();
            changed += 1;
        }
        Ok(changed)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<OutboxEntry>> {
        Ok(self.lock()?.outbox.iter().find(|e| e.id == id).cloned())
    }

    async fn list_by_status(&self, status: OutboxStatus) -> Result<Vec<OutboxEntry>> {
        Ok(self
            .lock()?
            .outbox
            .iter()
            .filter(|e| e.status == status)
            .cloned()
            .collect())
    }
}
