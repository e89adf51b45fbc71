use std::str::FromStr;

use crate::domain::types::{
    CredentialPolicy, DEFAULT_CODE_TTL_SECS, DEFAULT_LINK_TTL_SECS, DEFAULT_MAX_CODE_ATTEMPTS,
    DEFAULT_RATE_EMAIL_MAX, DEFAULT_RATE_IP_MAX, DEFAULT_RATE_WINDOW_SECS,
};

/// Auth service configuration loaded from environment variables.
/// Everything except the signing secret has a workable default; a
/// missing secret fails at startup, not at the first request.
#[derive(Debug)]
pub struct AuthConfig {
    /// HMAC secret for signing session tokens. Env var: `SESSION_SECRET`.
    pub session_secret: String,
    /// Public origin used to build magic-link callback URLs
    /// (e.g. "https://conciergesync.ai"). Env var: `PUBLIC_ORIGIN`.
    pub public_origin: String,
    /// TCP port to listen on (default 3000). Env var: `AUTH_PORT`.
    pub auth_port: u16,
    /// SMTP connection URL. Unset means log-only delivery (dev mode).
    /// Env var: `SMTP_URL`.
    pub smtp_url: Option<String>,
    /// From address for outbound mail. Env var: `MAIL_FROM`.
    pub mail_from: String,
    /// Upper bound on a single SMTP send. Env var: `MAIL_TIMEOUT_SECS`.
    pub mail_timeout_secs: u64,
    /// One-time code lifetime. Env var: `CODE_TTL_SECS`.
    pub code_ttl_secs: i64,
    /// Magic link lifetime. Env var: `LINK_TTL_SECS`.
    pub link_ttl_secs: i64,
    /// Verification attempts per issued code. Env var: `MAX_CODE_ATTEMPTS`.
    pub max_code_attempts: u32,
    /// Start calls allowed per IP per window. Env var: `RATE_IP_MAX`.
    pub rate_ip_max: u32,
    /// Start calls allowed per email per window. Env var: `RATE_EMAIL_MAX`.
    pub rate_email_max: u32,
    /// Rate-limit window length. Env var: `RATE_WINDOW_SECS`.
    pub rate_window_secs: i64,
    /// Interval between expiry sweeps. Env var: `SWEEP_INTERVAL_SECS`.
    pub sweep_interval_secs: u64,
    /// Redirect target after a successful magic-link sign-in.
    /// Env var: `POST_LOGIN_PATH`.
    pub post_login_path: String,
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl AuthConfig {
    pub fn from_env() -> Self {
        Self {
            session_secret: std::env::var("SESSION_SECRET").expect("SESSION_SECRET"),
            public_origin: env_or("PUBLIC_ORIGIN", "http://localhost:3000".to_owned()),
            auth_port: env_or("AUTH_PORT", 3000),
            smtp_url: std::env::var("SMTP_URL").ok(),
            mail_from: env_or(
                "MAIL_FROM",
                "ConciergeSync <no-reply@conciergesync.ai>".to_owned(),
            ),
            mail_timeout_secs: env_or("MAIL_TIMEOUT_SECS", 10),
            code_ttl_secs: env_or("CODE_TTL_SECS", DEFAULT_CODE_TTL_SECS),
            link_ttl_secs: env_or("LINK_TTL_SECS", DEFAULT_LINK_TTL_SECS),
            max_code_attempts: env_or("MAX_CODE_ATTEMPTS", DEFAULT_MAX_CODE_ATTEMPTS),
            rate_ip_max: env_or("RATE_IP_MAX", DEFAULT_RATE_IP_MAX),
            rate_email_max: env_or("RATE_EMAIL_MAX", DEFAULT_RATE_EMAIL_MAX),
            rate_window_secs: env_or("RATE_WINDOW_SECS", DEFAULT_RATE_WINDOW_SECS),
            sweep_interval_secs: env_or("SWEEP_INTERVAL_SECS", 60),
            post_login_path: env_or("POST_LOGIN_PATH", "/welcome".to_owned()),
        }
    }

    pub fn credential_policy(&self) -> CredentialPolicy {
        CredentialPolicy {
            code_ttl_secs: self.code_ttl_secs,
            link_ttl_secs: self.link_ttl_secs,
            max_code_attempts: self.max_code_attempts,
        }
    }

    pub fn rate_policy(&self) -> crate::domain::types::RatePolicy {
        crate::domain::types::RatePolicy {
            ip_max: self.rate_ip_max,
            email_max: self.rate_email_max,
            window_secs: self.rate_window_secs,
        }
    }
}
