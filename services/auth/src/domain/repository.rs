#![allow(async_fn_in_trait)]

use uuid::Uuid;

use crate::domain::types::{Profile, UserRecord};

/// Outcome of a failed code verification. The HTTP layer collapses
/// `NotFound` and `Expired` into one generic rejection so callers
/// cannot probe which case occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeVerifyError {
    NotFound,
    Expired,
    TooManyAttempts,
    Incorrect,
}

/// Outcome of a failed link consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkConsumeError {
    NotFound,
    Expired,
}

/// Store of pending one-time codes and magic links.
pub trait CredentialStore: Send + Sync {
    /// Issue a code for `email`. Returns the opaque record id and the
    /// plaintext code — the only place the plaintext is ever visible.
    async fn create_code(&self, email: &str) -> (Uuid, String);

    /// Verify a supplied code against the record `id`. Consumes the
    /// record on success; counts an attempt on mismatch; destroys the
    /// record on expiry or when the attempt ceiling is exceeded.
    async fn verify_code(&self, id: Uuid, supplied: &str) -> Result<String, CodeVerifyError>;

    /// Drop a pending code whose delivery failed.
    async fn discard_code(&self, id: Uuid);

    /// Issue a magic link for `email`, returning the opaque link id.
    async fn create_link(&self, email: &str) -> Uuid;

    /// Atomically remove and return the link. Absent (or already
    /// consumed) yields `NotFound`; a removed-but-expired link yields
    /// `Expired`. Either way the link can never be consumed twice.
    async fn consume_link(&self, id: Uuid) -> Result<String, LinkConsumeError>;

    /// Drop a pending link whose delivery failed.
    async fn discard_link(&self, id: Uuid);
}

/// Directory of known users, keyed by normalized email.
pub trait UserDirectory: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Option<UserRecord>;

    /// Return the existing record, or create one stamped with the
    /// current time. Profile fields apply at creation only — an
    /// existing record is returned unmodified.
    async fn create_if_missing(&self, email: &str, profile: Option<&Profile>) -> UserRecord;
}

/// Fixed-window rate limiter over string keys.
pub trait RateLimiter: Send + Sync {
    /// Count a call against `key` and return whether it is within
    /// `max` for the current window. The call that crosses the limit
    /// is itself counted and rejected.
    async fn allow(&self, key: &str, max: u32, window_secs: i64) -> bool;
}
