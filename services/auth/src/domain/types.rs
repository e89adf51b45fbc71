use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

/// Pending one-time-code credential. Only the digest of the code is
/// stored; the plaintext exists solely in the issuing call and the
/// outbound email.
#[derive(Debug, Clone)]
pub struct OneTimeCode {
    pub id: Uuid,
    pub email: String,
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
    pub attempts: u32,
}

/// Pending magic-link credential. Immutable until consumed; deletion
/// on first consumption makes it single-use.
#[derive(Debug, Clone)]
pub struct MagicLink {
    pub id: Uuid,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

/// A known user, keyed by normalized email. Profile fields are set at
/// creation only; this service never deletes users.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Optional profile supplied on registration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Fixed-window rate counter for one key.
#[derive(Debug, Clone)]
pub struct RateBucket {
    pub count: u32,
    pub window_reset_at: DateTime<Utc>,
}

/// One-time code length in digits.
pub const CODE_LEN: usize = 6;

/// One-time code time-to-live in seconds (10 minutes).
pub const DEFAULT_CODE_TTL_SECS: i64 = 600;

/// Magic link time-to-live in seconds (15 minutes).
pub const DEFAULT_LINK_TTL_SECS: i64 = 900;

/// Verification attempts allowed per issued code before the record is
/// destroyed.
pub const DEFAULT_MAX_CODE_ATTEMPTS: u32 = 6;

/// Requests allowed per client IP per window.
pub const DEFAULT_RATE_IP_MAX: u32 = 30;

/// Requests allowed per email address per window.
pub const DEFAULT_RATE_EMAIL_MAX: u32 = 10;

/// Rate-limit window in seconds.
pub const DEFAULT_RATE_WINDOW_SECS: i64 = 60;

/// Lifetimes and attempt ceiling for pending credentials.
#[derive(Debug, Clone, Copy)]
pub struct CredentialPolicy {
    pub code_ttl_secs: i64,
    pub link_ttl_secs: i64,
    pub max_code_attempts: u32,
}

impl Default for CredentialPolicy {
    fn default() -> Self {
        Self {
            code_ttl_secs: DEFAULT_CODE_TTL_SECS,
            link_ttl_secs: DEFAULT_LINK_TTL_SECS,
            max_code_attempts: DEFAULT_MAX_CODE_ATTEMPTS,
        }
    }
}

/// Fixed-window thresholds applied by the start flow.
#[derive(Debug, Clone, Copy)]
pub struct RatePolicy {
    pub ip_max: u32,
    pub email_max: u32,
    pub window_secs: i64,
}

impl Default for RatePolicy {
    fn default() -> Self {
        Self {
            ip_max: DEFAULT_RATE_IP_MAX,
            email_max: DEFAULT_RATE_EMAIL_MAX,
            window_secs: DEFAULT_RATE_WINDOW_SECS,
        }
    }
}
