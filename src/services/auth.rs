//! Authentication service implementation
//!
//! Staff accounts, argon2 password hashing and HS256 session tokens. Role
//! checks live in the HTTP middleware; this service only answers who the
//! caller is.

use std::sync::OnceLock;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{AuthConfig, BootstrapConfig};
use crate::database::DatabaseService;
use crate::models::{CreateUserRequest, NewUser, Role, UpdateUserRequest, User};
use crate::utils::errors::{EventPassError, Result};
use crate::utils::helpers::{generate_random_string, has_min_chars, is_valid_email, normalize_email};
use crate::utils::logging::log_security_event;

const MIN_PASSWORD_CHARS: usize = 6;
const GENERATED_PASSWORD_CHARS: usize = 16;

static DUMMY_PASSWORD_HASH: OnceLock<String> = OnceLock::new();

/// Hash of a random password, verified against when the login email is unknown
fn dummy_password_hash() -> &'static str {
    DUMMY_PASSWORD_HASH.get_or_init(|| {
        AuthService::hash_password(&generate_random_string(GENERATED_PASSWORD_CHARS)).unwrap_or_default()
    })
}

/// Session token claims
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

/// Authenticated caller, injected into requests by `require_auth`
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: Role,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl TryFrom<Claims> for CurrentUser {
    type Error = EventPassError;

    fn try_from(claims: Claims) -> Result<Self> {
        let id = Uuid::parse_str(&claims.sub)
            .map_err(|_| EventPassError::Authentication("Invalid token subject".to_string()))?;
        Ok(Self {
            id,
            email: claims.email,
            full_name: claims.name,
            role: claims.role,
        })
    }
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            role: user.role,
        }
    }
}

#[derive(Clone)]
pub struct AuthService {
    db: DatabaseService,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    token_ttl: Duration,
}

impl AuthService {
    pub fn new(db: DatabaseService, config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);

        Self {
            db,
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            issuer: config.issuer.clone(),
            token_ttl: Duration::minutes(config.token_ttl_minutes),
        }
    }

    /// Hash a password with a fresh salt
    pub fn hash_password(password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| EventPassError::Internal(format!("Failed to hash password: {}", e)))
    }

    /// Check a password against a stored hash; malformed hashes never verify
    pub fn verify_password(password: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                warn!(error = %e, "Stored password hash could not be parsed");
                false
            }
        }
    }

    /// Issue a session token for `user`
    pub fn issue_token(&self, user: &CurrentUser) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            name: user.full_name.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + self.token_ttl).timestamp(),
            iss: self.issuer.clone(),
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?)
    }

    /// Validate a session token and return its claims
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => EventPassError::Authentication("Token expired".to_string()),
                ErrorKind::InvalidIssuer => EventPassError::Authentication("Invalid token issuer".to_string()),
                _ => EventPassError::Authentication("Invalid token".to_string()),
            })
    }

    /// Resolve the caller behind a bearer token
    pub fn current_user(&self, token: &str) -> Result<CurrentUser> {
        self.verify_token(token)?.try_into()
    }

    /// Check credentials. Unknown email and wrong password both yield `None`,
    /// and both pay for one argon2 verification.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Option<User>> {
        let email = normalize_email(email);
        let user = self.db.users.find_by_email(&email).await?;
        let hash = match &user {
            Some(user) => user.password_hash.as_str(),
            None => dummy_password_hash(),
        };
        let password_ok = Self::verify_password(password, hash);

        let Some(user) = user else {
            log_security_event("login_failed", Some(&email), Some("unknown email"));
            return Ok(None);
        };
        if !password_ok {
            log_security_event("login_failed", Some(&email), Some("wrong password"));
            return Ok(None);
        }

        info!(user_id = %user.id, "User authenticated");
        Ok(Some(user))
    }

    /// Create a staff account
    pub async fn create_user(&self, request: CreateUserRequest) -> Result<User> {
        if !has_min_chars(&request.full_name, 2) {
            return Err(EventPassError::validation("Full name must be at least 2 characters."));
        }
        let email = normalize_email(&request.email);
        if !is_valid_email(&email) {
            return Err(EventPassError::validation("Please enter a valid email address."));
        }
        if request.password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(EventPassError::validation("Password must be at least 6 characters."));
        }
        if self.db.users.find_by_email(&email).await?.is_some() {
            return Err(EventPassError::DuplicateUserEmail);
        }

        let user = self
            .db
            .users
            .insert(&NewUser {
                full_name: request.full_name.trim().to_string(),
                email,
                password_hash: Self::hash_password(&request.password)?,
                role: request.role,
            })
            .await?;

        info!(user_id = %user.id, role = %user.role, "User created");
        Ok(user)
    }

    /// Apply an admin edit; a supplied password resets the user's password
    pub async fn update_user(&self, user_id: Uuid, request: UpdateUserRequest) -> Result<User> {
        let mut user = self.get_user(user_id).await?;

        if let Some(full_name) = request.full_name {
            if !has_min_chars(&full_name, 2) {
                return Err(EventPassError::validation("Full name must be at least 2 characters."));
            }
            user.full_name = full_name.trim().to_string();
        }

        if let Some(email) = request.email {
            let email = normalize_email(&email);
            if !is_valid_email(&email) {
                return Err(EventPassError::validation("Please enter a valid email address."));
            }
            if let Some(other) = self.db.users.find_by_email(&email).await? {
                if other.id != user_id {
                    return Err(EventPassError::DuplicateUserEmail);
                }
            }
            user.email = email;
        }

        if let Some(role) = request.role {
            user.role = role;
        }

        if let Some(password) = request.password.filter(|p| !p.is_empty()) {
            if password.chars().count() < MIN_PASSWORD_CHARS {
                return Err(EventPassError::validation("Password must be at least 6 characters."));
            }
            user.password_hash = Self::hash_password(&password)?;
        }

        let user = self
            .db
            .users
            .update(&user)
            .await?
            .ok_or(EventPassError::UserNotFound { user_id })?;
        info!(user_id = %user.id, "User updated");
        Ok(user)
    }

    pub async fn delete_user(&self, user_id: Uuid) -> Result<()> {
        if !self.db.users.delete(user_id).await? {
            return Err(EventPassError::UserNotFound { user_id });
        }
        info!(user_id = %user_id, "User deleted");
        Ok(())
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.db.users.list().await
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<User> {
        self.db
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(EventPassError::UserNotFound { user_id })
    }

    /// Change the caller's own password
    pub async fn change_password(&self, user_id: Uuid, current: &str, new: &str) -> Result<()> {
        if current.is_empty() {
            return Err(EventPassError::validation("Current password is required."));
        }
        if new.chars().count() < MIN_PASSWORD_CHARS {
            return Err(EventPassError::validation("New password must be at least 6 characters."));
        }

        let mut user = self.get_user(user_id).await?;
        if !Self::verify_password(current, &user.password_hash) {
            log_security_event("password_change_rejected", Some(&user.email), None);
            return Err(EventPassError::Authentication("Current password is incorrect".to_string()));
        }

        user.password_hash = Self::hash_password(new)?;
        self.db
            .users
            .update(&user)
            .await?
            .ok_or(EventPassError::UserNotFound { user_id })?;
        info!(user_id = %user_id, "Password changed");
        Ok(())
    }

    /// Seed an admin when no users exist yet
    pub async fn bootstrap_admin(&self, config: &BootstrapConfig) -> Result<Option<User>> {
        if self.db.users.count().await? > 0 {
            debug!("Users present, skipping admin bootstrap");
            return Ok(None);
        }

        let password = match config.admin_password.clone().filter(|p| !p.is_empty()) {
            Some(password) => password,
            None => {
                let generated = generate_random_string(GENERATED_PASSWORD_CHARS);
                warn!(
                    email = %config.admin_email,
                    password = %generated,
                    "No bootstrap admin password configured; generated one. Change it after first login."
                );
                generated
            }
        };

        let user = self
            .create_user(CreateUserRequest {
                full_name: config.admin_name.clone(),
                email: config.admin_email.clone(),
                password,
                role: Role::Admin,
            })
            .await?;

        info!(user_id = %user.id, email = %user.email, "Bootstrap admin created");
        Ok(Some(user))
    }
}

/// Extract the token from an `Authorization: Bearer ...` header value
pub fn extract_bearer(header: &str) -> Option<&str> {
    header.strip_prefix("Bearer ").map(str::trim).filter(|t| !t.is_empty())
}

#[cfg(all(test, feature = "test-utils"))]
mod tests {
    use super::*;
    use crate::config::Settings;

    fn service() -> AuthService {
        AuthService::new(DatabaseService::in_memory(), &Settings::default().auth)
    }

    fn request(email: &str, role: Role) -> CreateUserRequest {
        CreateUserRequest {
            full_name: "Ada Admin".to_string(),
            email: email.to_string(),
            password: "secret123".to_string(),
            role,
        }
    }

    #[test]
    fn test_password_hash_round_trip() {
        let hash = AuthService::hash_password("secret123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(AuthService::verify_password("secret123", &hash));
        assert!(!AuthService::verify_password("wrong", &hash));
        assert!(!AuthService::verify_password("secret123", "not-a-hash"));
    }

    #[test]
    fn test_dummy_hash_is_a_real_argon2_hash() {
        let hash = dummy_password_hash();
        assert!(hash.starts_with("$argon2"));
        assert!(PasswordHash::new(hash).is_ok());
        assert!(!AuthService::verify_password("secret123", hash));
        assert!(std::ptr::eq(hash, dummy_password_hash()));
    }

    #[tokio::test]
    async fn test_token_round_trip() {
        let auth = service();
        let user = auth.create_user(request("ada@x.com", Role::Admin)).await.unwrap();

        let token = auth.issue_token(&CurrentUser::from(&user)).unwrap();
        let current = auth.current_user(&token).unwrap();
        assert_eq!(current.id, user.id);
        assert!(current.is_admin());
        assert_eq!(current.full_name, "Ada Admin");
    }

    #[tokio::test]
    async fn test_token_from_other_secret_is_rejected() {
        let auth = service();
        let user = auth.create_user(request("ada@x.com", Role::User)).await.unwrap();

        let mut config = Settings::default().auth;
        config.jwt_secret = "another-secret-that-is-long-enough-to-pass".to_string();
        let other = AuthService::new(DatabaseService::in_memory(), &config);

        let token = other.issue_token(&CurrentUser::from(&user)).unwrap();
        assert!(matches!(auth.verify_token(&token), Err(EventPassError::Authentication(_))));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let config = Settings::default().auth;
        let auth = AuthService::new(DatabaseService::in_memory(), &config);
        let past = Utc::now() - Duration::hours(2);
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            email: "ada@x.com".to_string(),
            name: "Ada".to_string(),
            role: Role::User,
            iat: past.timestamp(),
            exp: (past + Duration::minutes(5)).timestamp(),
            iss: config.issuer.clone(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .unwrap();

        let err = auth.verify_token(&token).unwrap_err();
        assert_eq!(err.to_string(), "Authentication error: Token expired");
    }

    #[tokio::test]
    async fn test_authenticate_normalizes_email() {
        let auth = service();
        auth.create_user(request("Ada@X.com", Role::Admin)).await.unwrap();

        assert!(auth.authenticate("  ADA@x.com ", "secret123").await.unwrap().is_some());
        assert!(auth.authenticate("ada@x.com", "wrong").await.unwrap().is_none());
        assert!(auth.authenticate("nobody@x.com", "secret123").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_user_email() {
        let auth = service();
        auth.create_user(request("ada@x.com", Role::Admin)).await.unwrap();
        let err = auth.create_user(request("ADA@x.com", Role::User)).await.unwrap_err();
        assert!(matches!(err, EventPassError::DuplicateUserEmail));
    }

    #[tokio::test]
    async fn test_change_password() {
        let auth = service();
        let user = auth.create_user(request("ada@x.com", Role::User)).await.unwrap();

        let err = auth.change_password(user.id, "wrong", "newpass1").await.unwrap_err();
        assert!(matches!(err, EventPassError::Authentication(_)));

        let err = auth.change_password(user.id, "secret123", "short").await.unwrap_err();
        assert!(matches!(err, EventPassError::Validation(_)));

        auth.change_password(user.id, "secret123", "newpass1").await.unwrap();
        assert!(auth.authenticate("ada@x.com", "newpass1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_bootstrap_admin_only_when_empty() {
        let auth = service();
        let config = Settings::default().bootstrap;

        let admin = auth.bootstrap_admin(&config).await.unwrap().unwrap();
        assert!(admin.is_admin());
        assert!(auth.bootstrap_admin(&config).await.unwrap().is_none());
        assert_eq!(auth.list_users().await.unwrap().len(), 1);
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer("Basic abc"), None);
        assert_eq!(extract_bearer("Bearer "), None);
    }
}
