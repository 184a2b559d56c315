//! In-memory application harness
//!
//! Builds the full router over the in-memory store and a recording mailer,
//! then drives it with `tower::ServiceExt::oneshot`.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use eventpass::database::memory::MemoryStore;
use eventpass::models::{Event, NewUser, Participant, RegisterOptions, Role, User};
use eventpass::services::mailer::RecordingMailer;
use eventpass::services::{CurrentUser, OutgoingEmail};
use eventpass::{AppState, DatabaseService, Settings};
use serde_json::Value;
use tower::ServiceExt;

use super::test_data::{event_draft, fake_email, participant_draft, unique_slug};

/// Settings tuned for tests: no batch delay, fixed keys
pub fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.database.url = "postgresql://unused/eventpass".to_string();
    settings.auth.jwt_secret = "integration-test-secret-that-is-long-enough".to_string();
    settings.qr.encryption_key = "integration-test-qr-key".to_string();
    settings.notifications.batch_delay_ms = 0;
    settings.notifications.batch_size = 2;
    settings
}

pub struct TestApp {
    pub state: AppState,
    pub db: DatabaseService,
    pub mailer: Arc<RecordingMailer>,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_settings(test_settings())
    }

    pub fn with_settings(settings: Settings) -> Self {
        let db = DatabaseService::with_memory_store(MemoryStore::new());
        let mailer = Arc::new(RecordingMailer::new());
        let state = AppState::new(settings, db.clone(), mailer.clone()).expect("Failed to build app state");
        let router = eventpass::router(state.clone());

        Self {
            state,
            db,
            mailer,
            router,
        }
    }

    /// Insert a user directly, skipping password hashing
    pub async fn insert_user(&self, role: Role) -> User {
        self.db
            .users
            .insert(&NewUser {
                full_name: super::test_data::fake_name(),
                email: fake_email(),
                password_hash: "not-a-real-hash".to_string(),
                role,
            })
            .await
            .expect("Failed to insert user")
    }

    pub fn token_for(&self, user: &User) -> String {
        self.state
            .services
            .auth
            .issue_token(&CurrentUser::from(user))
            .expect("Failed to issue token")
    }

    /// New user plus a bearer token for them
    pub async fn login_as(&self, role: Role) -> (User, String) {
        let user = self.insert_user(role).await;
        let token = self.token_for(&user);
        (user, token)
    }

    pub async fn create_event(&self) -> Event {
        self.state
            .services
            .events
            .create(event_draft(&unique_slug("summit")))
            .await
            .expect("Failed to create event")
    }

    pub async fn register_participant(&self, event_id: uuid::Uuid) -> Participant {
        let id = self
            .state
            .services
            .participants
            .register(participant_draft(event_id), RegisterOptions::default())
            .await
            .expect("Failed to register participant");
        self.state.services.participants.get_by_id(id).await.expect("Participant missing")
    }

    pub async fn request(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let (status, _, bytes) = self.request_raw(method, uri, token, body).await;
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    /// Send a body verbatim, for payloads that are not valid JSON
    pub async fn request_text(&self, method: Method, uri: &str, token: Option<&str>, body: &str) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = builder.body(Body::from(body.to_string())).unwrap();

        let response = self.router.clone().oneshot(request).await.expect("Router failed");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    pub async fn request_raw(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, HeaderMap, Vec<u8>) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.expect("Router failed");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body")
            .to_vec();
        (status, headers, bytes)
    }
}

/// Wait for background deliveries to reach `address`
pub async fn wait_for_emails(mailer: &RecordingMailer, address: &str, count: usize) -> Vec<OutgoingEmail> {
    let deadline = Utc::now() + chrono::Duration::seconds(5);
    loop {
        let sent = mailer.sent_to(address);
        if sent.len() >= count || Utc::now() > deadline {
            return sent;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
