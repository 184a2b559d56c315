//! Rate limiting middleware
//!
//! Login attempts are throttled per email address so a single account cannot
//! be brute-forced, while other users keep logging in normally.

use std::num::NonZeroU32;

use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use tracing::debug;

use crate::utils::errors::{EventPassError, Result};
use crate::utils::helpers::normalize_email;
use crate::utils::logging::log_security_event;

pub struct LoginRateLimiter {
    limiter: DefaultKeyedRateLimiter<String>,
}

impl LoginRateLimiter {
    /// Allow `per_minute` attempts per email, refilled continuously
    pub fn new(per_minute: u32) -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(per_minute).unwrap_or(NonZeroU32::MIN));
        Self {
            limiter: RateLimiter::keyed(quota),
        }
    }

    /// Consume one attempt for `email`; `RateLimitExceeded` when none are left
    pub fn check(&self, email: &str) -> Result<()> {
        let key = normalize_email(email);
        match self.limiter.check_key(&key) {
            Ok(()) => {
                debug!(email = %key, "Login attempt allowed");
                Ok(())
            }
            Err(_) => {
                log_security_event("login_rate_limited", Some(&key), None);
                Err(EventPassError::RateLimitExceeded)
            }
        }
    }

    /// Drop idle keys
    pub fn cleanup(&self) {
        self.limiter.retain_recent();
    }
}
