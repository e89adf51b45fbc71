use std::sync::Arc;

use chrono::{TimeZone, Utc};

use csync_auth::domain::clock::{Clock, ManualClock};
use csync_auth::domain::types::{CredentialPolicy, RatePolicy};
use csync_auth::mailer::{AnyMailer, Email, MailError, Mailer, MemoryMailer};
use csync_auth::state::AppState;
use csync_auth::store::memory::{MemoryCredentialStore, MemoryRateLimiter, MemoryUserDirectory};
use csync_auth::usecase::session::{ConsumeLinkUseCase, VerifyCodeUseCase};
use csync_auth::usecase::start::StartAuthUseCase;

pub const TEST_SECRET: &str = "test-session-secret-for-integration-tests";
pub const TEST_ORIGIN: &str = "http://localhost:3000";

pub fn manual_clock() -> ManualClock {
    ManualClock::at(Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap())
}

/// Full application state over real in-memory stores, a manual clock,
/// and a capturing mailer. Returns the mailer handle for reading the
/// codes and links the flow sends.
pub fn test_state(clock: &ManualClock) -> (AppState, MemoryMailer) {
    let mailer = MemoryMailer::new();
    let clock: Arc<dyn Clock> = Arc::new(clock.clone());
    let state = AppState {
        credentials: MemoryCredentialStore::new(clock.clone(), CredentialPolicy::default()),
        users: MemoryUserDirectory::new(clock.clone()),
        limiter: MemoryRateLimiter::new(clock),
        mailer: AnyMailer::Memory(mailer.clone()),
        session_secret: TEST_SECRET.to_owned(),
        public_origin: TEST_ORIGIN.to_owned(),
        post_login_path: "/welcome".to_owned(),
        rate_policy: RatePolicy::default(),
        credential_policy: CredentialPolicy::default(),
    };
    (state, mailer)
}

/// A mailer whose relay is always down.
#[derive(Clone, Copy)]
pub struct FailingMailer;

impl Mailer for FailingMailer {
    async fn send(&self, _mail: &Email) -> Result<(), MailError> {
        Err(MailError::Transport("simulated relay outage".to_owned()))
    }
}

pub type TestStartUseCase =
    StartAuthUseCase<MemoryCredentialStore, MemoryUserDirectory, MemoryRateLimiter, AnyMailer>;

pub fn start_usecase(state: &AppState) -> TestStartUseCase {
    StartAuthUseCase {
        credentials: state.credentials.clone(),
        users: state.users.clone(),
        limiter: state.limiter.clone(),
        mailer: state.mailer.clone(),
        rate_policy: state.rate_policy,
        credential_policy: state.credential_policy,
        public_origin: state.public_origin.clone(),
    }
}

pub fn verify_usecase(
    state: &AppState,
) -> VerifyCodeUseCase<MemoryCredentialStore, MemoryUserDirectory> {
    VerifyCodeUseCase {
        credentials: state.credentials.clone(),
        users: state.users.clone(),
        session_secret: state.session_secret.clone(),
    }
}

pub fn link_usecase(
    state: &AppState,
) -> ConsumeLinkUseCase<MemoryCredentialStore, MemoryUserDirectory> {
    ConsumeLinkUseCase {
        credentials: state.credentials.clone(),
        users: state.users.clone(),
        session_secret: state.session_secret.clone(),
    }
}

/// Pull the 6-digit code out of a captured email body.
pub fn code_from_email(mail: &Email) -> String {
    mail.text
        .as_deref()
        .expect("code email has a text body")
        .split(|c: char| !c.is_ascii_digit())
        .find(|s| s.len() == 6)
        .expect("code email contains a 6-digit code")
        .to_owned()
}

/// Pull the magic-link token out of a captured email body.
pub fn link_token_from_email(mail: &Email) -> String {
    let text = mail.text.as_deref().expect("link email has a text body");
    let start = text.find("token=").expect("link email contains a token") + "token=".len();
    text[start..]
        .chars()
        .take_while(|c| !c.is_whitespace())
        .collect()
}
