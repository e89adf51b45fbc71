use std::sync::Arc;

use crate::config::AuthConfig;
use crate::domain::clock::Clock;
use crate::domain::types::{CredentialPolicy, RatePolicy};
use crate::mailer::AnyMailer;
use crate::store::memory::{MemoryCredentialStore, MemoryRateLimiter, MemoryUserDirectory};

/// Shared application state passed to every handler via axum `State`.
/// The stores are cheap clones over shared maps; the auth flow
/// handlers are their only mutators.
#[derive(Clone)]
pub struct AppState {
    pub credentials: MemoryCredentialStore,
    pub users: MemoryUserDirectory,
    pub limiter: MemoryRateLimiter,
    pub mailer: AnyMailer,
    pub session_secret: String,
    pub public_origin: String,
    pub post_login_path: String,
    pub rate_policy: RatePolicy,
    pub credential_policy: CredentialPolicy,
}

impl AppState {
    pub fn new(config: &AuthConfig, mailer: AnyMailer, clock: Arc<dyn Clock>) -> Self {
        let credential_policy = config.credential_policy();
        Self {
            credentials: MemoryCredentialStore::new(clock.clone(), credential_policy),
            users: MemoryUserDirectory::new(clock.clone()),
            limiter: MemoryRateLimiter::new(clock),
            mailer,
            session_secret: config.session_secret.clone(),
            public_origin: config.public_origin.clone(),
            post_login_path: config.post_login_path.clone(),
            rate_policy: config.rate_policy(),
            credential_policy,
        }
    }
}
