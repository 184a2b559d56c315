//! Shared application state
//!
//! Everything a request handler needs, cloned cheaply into each request.

use std::sync::Arc;

use crate::config::Settings;
use crate::database::DatabaseService;
use crate::middleware::rate_limit::LoginRateLimiter;
use crate::services::{Mailer, ServiceFactory};
use crate::utils::errors::Result;

#[derive(Clone)]
pub struct AppState {
    pub services: ServiceFactory,
    pub settings: Arc<Settings>,
    pub login_limiter: Arc<LoginRateLimiter>,
}

impl AppState {
    pub fn new(settings: Settings, db: DatabaseService, mailer: Arc<dyn Mailer>) -> Result<Self> {
        let services = ServiceFactory::new(&settings, db, mailer)?;
        let login_limiter = Arc::new(LoginRateLimiter::new(settings.auth.login_attempts_per_minute));

        Ok(Self {
            services,
            settings: Arc::new(settings),
            login_limiter,
        })
    }
}
