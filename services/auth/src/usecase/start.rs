use serde::Deserialize;
use uuid::Uuid;

use crate::domain::email::{is_valid_email, normalize_email};
use crate::domain::repository::{CredentialStore, RateLimiter, UserDirectory};
use crate::domain::types::{CredentialPolicy, Profile, RatePolicy};
use crate::error::AuthFlowError;
use crate::mailer::{Email, Mailer};

/// How the caller wants to authenticate. `Register` and `Code` both
/// issue a one-time code; `Register` additionally creates the user
/// record up front with the supplied profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StartMode {
    Code,
    Register,
    Link,
}

pub struct StartAuthInput {
    pub mode: StartMode,
    pub email: String,
    pub profile: Option<Profile>,
    pub client_ip: String,
}

#[derive(Debug)]
pub struct StartAuthOutput {
    /// Set when a code was issued — the opaque handle the caller
    /// echoes back on verify. Never the code itself. Link mode has
    /// nothing to echo, so it stays `None`.
    pub token_id: Option<Uuid>,
}

pub struct StartAuthUseCase<C, U, R, M>
where
    C: CredentialStore,
    U: UserDirectory,
    R: RateLimiter,
    M: Mailer,
{
    pub credentials: C,
    pub users: U,
    pub limiter: R,
    pub mailer: M,
    pub rate_policy: RatePolicy,
    pub credential_policy: CredentialPolicy,
    pub public_origin: String,
}

impl<C, U, R, M> StartAuthUseCase<C, U, R, M>
where
    C: CredentialStore,
    U: UserDirectory,
    R: RateLimiter,
    M: Mailer,
{
    pub async fn execute(&self, input: StartAuthInput) -> Result<StartAuthOutput, AuthFlowError> {
        let rate = self.rate_policy;

        // 1. Per-IP window, before touching anything else.
        let ip_key = format!("ip:{}", input.client_ip);
        if !self.limiter.allow(&ip_key, rate.ip_max, rate.window_secs).await {
            return Err(AuthFlowError::RateLimited {
                hint: "Too many requests. Please wait a minute.",
            });
        }

        // 2. Normalize + shape-check the address.
        let email = normalize_email(&input.email);
        if !is_valid_email(&email) {
            return Err(AuthFlowError::InvalidEmail);
        }

        // 3. Per-email window.
        let email_key = format!("email:{email}");
        if !self
            .limiter
            .allow(&email_key, rate.email_max, rate.window_secs)
            .await
        {
            return Err(AuthFlowError::RateLimited {
                hint: "Please try again shortly.",
            });
        }

        // 4. Registration creates the record up front; plain login
        //    auto-provisions later, on successful verification.
        if input.mode == StartMode::Register {
            self.users
                .create_if_missing(&email, input.profile.as_ref())
                .await;
        }

        // 5. Issue the credential and hand it to the mailer. A failed
        //    send discards the pending record.
        match input.mode {
            StartMode::Link => {
                let link_id = self.credentials.create_link(&email).await;
                let mail = self.link_email(&email, link_id);
                if let Err(e) = self.mailer.send(&mail).await {
                    self.credentials.discard_link(link_id).await;
                    return Err(AuthFlowError::Delivery(e));
                }
                tracing::info!(email = %email, "magic link issued");
                Ok(StartAuthOutput { token_id: None })
            }
            StartMode::Code | StartMode::Register => {
                let (token_id, code) = self.credentials.create_code(&email).await;
                let mail = self.code_email(&email, &code);
                if let Err(e) = self.mailer.send(&mail).await {
                    self.credentials.discard_code(token_id).await;
                    return Err(AuthFlowError::Delivery(e));
                }
                tracing::info!(email = %email, token_id = %token_id, "sign-in code issued");
                Ok(StartAuthOutput {
                    token_id: Some(token_id),
                })
            }
        }
    }

    fn link_email(&self, to: &str, link_id: Uuid) -> Email {
        let url = format!("{}/api/auth/callback?token={link_id}", self.public_origin);
        let minutes = self.credential_policy.link_ttl_secs / 60;
        Email {
            to: to.to_owned(),
            subject: "Your ConciergeSync magic link".to_owned(),
            text: Some(format!(
                "Click to sign in: {url}\nThis link expires in {minutes} minutes."
            )),
            html: Some(format!(
                "<p>Click to sign in:</p><p><a href=\"{url}\">{url}</a></p>\
                 <p>This link expires in {minutes} minutes.</p>"
            )),
        }
    }

    fn code_email(&self, to: &str, code: &str) -> Email {
        let minutes = self.credential_policy.code_ttl_secs / 60;
        Email {
            to: to.to_owned(),
            subject: "Your ConciergeSync sign-in code".to_owned(),
            text: Some(format!(
                "Your code is {code}\nThis code expires in {minutes} minutes."
            )),
            html: Some(format!(
                "<p>Your code is:</p>\
                 <p style=\"font-size:28px;font-weight:800;letter-spacing:6px\">{code}</p>\
                 <p>This code expires in {minutes} minutes.</p>"
            )),
        }
    }
}
