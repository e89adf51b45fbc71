//! Signing and verification of the `cs_session` token.
//!
//! Token format: `b64url(json claims) "." b64url(hmac-sha256(secret, body))`,
//! both components URL-safe base64 without padding. There is no
//! server-side revocation — logout only clears the client cookie, and a
//! stolen token stays valid until its embedded expiry. Known limitation,
//! accepted for the beta deployment.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Payload embedded in a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject — the authenticated email address.
    pub sub: String,
    /// Issued-at, seconds since UNIX epoch.
    pub iat: u64,
    /// Expiry, seconds since UNIX epoch. A token is invalid once
    /// `exp <= now`.
    pub exp: u64,
}

impl SessionClaims {
    /// Claims issued at `issued_at` expiring `lifetime_secs` later.
    pub fn new(sub: impl Into<String>, issued_at: u64, lifetime_secs: u64) -> Self {
        Self {
            sub: sub.into(),
            iat: issued_at,
            exp: issued_at + lifetime_secs,
        }
    }
}

/// Errors returned by [`verify_session`]. Callers surface all of these
/// uniformly as "not authenticated"; the distinction exists for logs
/// and tests only.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("malformed token")]
    Malformed,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("session expired")]
    Expired,
}

/// Current wall-clock time in seconds since UNIX epoch.
pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before UNIX epoch")
        .as_secs()
}

fn mac_b64(secret: &str, body: &str) -> String {
    // HMAC accepts keys of any length, so new_from_slice cannot fail.
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac key");
    mac.update(body.as_bytes());
    URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
}

/// Sign `claims` into a compact session token.
pub fn sign_session(claims: &SessionClaims, secret: &str) -> String {
    let json = serde_json::to_vec(claims).expect("session claims serialize");
    let body = URL_SAFE_NO_PAD.encode(json);
    let sig = mac_b64(secret, &body);
    format!("{body}.{sig}")
}

/// Verify a session token and return its claims.
///
/// The digest comparison covers the full MAC output in constant time;
/// prefix or partial matches are rejected. Expiry is checked only
/// after the signature holds.
pub fn verify_session(token: &str, secret: &str) -> Result<SessionClaims, SessionError> {
    let (body, sig) = token.split_once('.').ok_or(SessionError::Malformed)?;
    let supplied = URL_SAFE_NO_PAD
        .decode(sig)
        .map_err(|_| SessionError::Malformed)?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| SessionError::InvalidSignature)?;
    mac.update(body.as_bytes());
    mac.verify_slice(&supplied)
        .map_err(|_| SessionError::InvalidSignature)?;

    let json = URL_SAFE_NO_PAD
        .decode(body)
        .map_err(|_| SessionError::Malformed)?;
    let claims: SessionClaims =
        serde_json::from_slice(&json).map_err(|_| SessionError::Malformed)?;

    if claims.exp <= now_secs() {
        return Err(SessionError::Expired);
    }
    Ok(claims)
}
