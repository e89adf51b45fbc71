use uuid::Uuid;

use csync_session::cookie::SESSION_MAX_AGE_SECS;
use csync_session::token::{SessionClaims, now_secs, sign_session};

use crate::domain::repository::{CodeVerifyError, CredentialStore, UserDirectory};
use crate::error::AuthFlowError;

/// Sign a fresh session for `email`, valid for the full session
/// lifetime from now.
pub fn issue_session(email: &str, secret: &str) -> String {
    let claims = SessionClaims::new(email, now_secs(), SESSION_MAX_AGE_SECS);
    sign_session(&claims, secret)
}

/// Outcome of a successful verification or link consumption: the
/// authenticated email and the signed session token to set as the
/// `cs_session` cookie.
#[derive(Debug)]
pub struct SessionOutput {
    pub email: String,
    pub token: String,
}

// ── VerifyCode ───────────────────────────────────────────────────────────────

pub struct VerifyCodeInput {
    pub token_id: String,
    pub code: String,
}

pub struct VerifyCodeUseCase<C: CredentialStore, U: UserDirectory> {
    pub credentials: C,
    pub users: U,
    pub session_secret: String,
}

impl<C: CredentialStore, U: UserDirectory> VerifyCodeUseCase<C, U> {
    pub async fn execute(&self, input: VerifyCodeInput) -> Result<SessionOutput, AuthFlowError> {
        // Unparseable ids behave like unknown ones.
        let id = Uuid::parse_str(&input.token_id).map_err(|_| AuthFlowError::InvalidCredential)?;

        let email = self
            .credentials
            .verify_code(id, &input.code)
            .await
            .map_err(|e| match e {
                CodeVerifyError::NotFound | CodeVerifyError::Expired => {
                    AuthFlowError::InvalidCredential
                }
                CodeVerifyError::TooManyAttempts => AuthFlowError::AttemptsExhausted,
                CodeVerifyError::Incorrect => AuthFlowError::IncorrectCode,
            })?;

        // Login auto-provisions; a register flow already created the
        // record and keeps its profile.
        self.users.create_if_missing(&email, None).await;

        let token = issue_session(&email, &self.session_secret);
        tracing::info!(email = %email, "code verified, session issued");
        Ok(SessionOutput { email, token })
    }
}

// ── ConsumeLink ──────────────────────────────────────────────────────────────

pub struct ConsumeLinkUseCase<C: CredentialStore, U: UserDirectory> {
    pub credentials: C,
    pub users: U,
    pub session_secret: String,
}

impl<C: CredentialStore, U: UserDirectory> ConsumeLinkUseCase<C, U> {
    pub async fn execute(&self, raw_link_id: &str) -> Result<SessionOutput, AuthFlowError> {
        let id = Uuid::parse_str(raw_link_id).map_err(|_| AuthFlowError::InvalidCredential)?;

        // NotFound and Expired are indistinguishable to the caller.
        let email = self
            .credentials
            .consume_link(id)
            .await
            .map_err(|_| AuthFlowError::InvalidCredential)?;

        self.users.create_if_missing(&email, None).await;

        let token = issue_session(&email, &self.session_secret);
        tracing::info!(email = %email, "magic link consumed, session issued");
        Ok(SessionOutput { email, token })
    }
}
