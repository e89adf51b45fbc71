//! In-memory store objects. Acceptable for the beta deployment:
//! nothing here survives a process restart, sessions excepted (they
//! are stateless and verify against the secret alone).
//!
//! Each store owns its map behind a `Mutex` held only for a single
//! lookup-or-mutate operation — never across an await point.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Duration;
use constant_time_eq::constant_time_eq;
use rand::RngExt;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::domain::clock::Clock;
use crate::domain::repository::{
    CodeVerifyError, CredentialStore, LinkConsumeError, RateLimiter, UserDirectory,
};
use crate::domain::types::{
    CODE_LEN, CredentialPolicy, MagicLink, OneTimeCode, Profile, RateBucket, UserRecord,
};

/// Uniform random fixed-width numeric code, leading zeros permitted.
/// `rand::rng()` is cryptographically secure.
fn generate_code() -> String {
    let mut rng = rand::rng();
    let n = rng.random_range(0..10u32.pow(CODE_LEN as u32));
    format!("{n:0width$}", width = CODE_LEN)
}

/// SHA-256 hex digest of a code. Stored in place of the plaintext.
fn hash_code(code: &str) -> String {
    let digest = Sha256::digest(code.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

// ── MemoryCredentialStore ────────────────────────────────────────────────────

/// Pending one-time codes and magic links, keyed by opaque id.
#[derive(Clone)]
pub struct MemoryCredentialStore {
    codes: Arc<Mutex<HashMap<Uuid, OneTimeCode>>>,
    links: Arc<Mutex<HashMap<Uuid, MagicLink>>>,
    clock: Arc<dyn Clock>,
    policy: CredentialPolicy,
}

impl MemoryCredentialStore {
    pub fn new(clock: Arc<dyn Clock>, policy: CredentialPolicy) -> Self {
        Self {
            codes: Arc::new(Mutex::new(HashMap::new())),
            links: Arc::new(Mutex::new(HashMap::new())),
            clock,
            policy,
        }
    }

    /// Remove every code and link whose expiry has passed. Returns the
    /// removed (codes, links) counts. Memory hygiene only; lookups
    /// re-check expiry themselves.
    pub fn sweep(&self) -> (usize, usize) {
        let now = self.clock.now();

        let mut codes = self.codes.lock().expect("code store mutex poisoned");
        let before_codes = codes.len();
        codes.retain(|_, rec| rec.expires_at > now);
        let removed_codes = before_codes - codes.len();
        drop(codes);

        let mut links = self.links.lock().expect("link store mutex poisoned");
        let before_links = links.len();
        links.retain(|_, rec| rec.expires_at > now);
        let removed_links = before_links - links.len();

        (removed_codes, removed_links)
    }
}

impl CredentialStore for MemoryCredentialStore {
    async fn create_code(&self, email: &str) -> (Uuid, String) {
        let code = generate_code();
        let id = Uuid::new_v4();
        let record = OneTimeCode {
            id,
            email: email.to_owned(),
            code_hash: hash_code(&code),
            expires_at: self.clock.now() + Duration::seconds(self.policy.code_ttl_secs),
            attempts: 0,
        };
        self.codes
            .lock()
            .expect("code store mutex poisoned")
            .insert(id, record);
        (id, code)
    }

    async fn verify_code(&self, id: Uuid, supplied: &str) -> Result<String, CodeVerifyError> {
        let now = self.clock.now();
        let mut codes = self.codes.lock().expect("code store mutex poisoned");

        let Some(record) = codes.get_mut(&id) else {
            return Err(CodeVerifyError::NotFound);
        };

        if record.expires_at <= now {
            codes.remove(&id);
            return Err(CodeVerifyError::Expired);
        }

        record.attempts += 1;
        if record.attempts > self.policy.max_code_attempts {
            codes.remove(&id);
            return Err(CodeVerifyError::TooManyAttempts);
        }

        // Constant-time over the full digest; a mismatch leaves the
        // record in place, having consumed one attempt.
        let supplied_hash = hash_code(supplied);
        if !constant_time_eq(supplied_hash.as_bytes(), record.code_hash.as_bytes()) {
            return Err(CodeVerifyError::Incorrect);
        }

        let email = record.email.clone();
        codes.remove(&id);
        Ok(email)
    }

    async fn discard_code(&self, id: Uuid) {
        self.codes
            .lock()
            .expect("code store mutex poisoned")
            .remove(&id);
    }

    async fn create_link(&self, email: &str) -> Uuid {
        let id = Uuid::new_v4();
        let record = MagicLink {
            id,
            email: email.to_owned(),
            expires_at: self.clock.now() + Duration::seconds(self.policy.link_ttl_secs),
        };
        self.links
            .lock()
            .expect("link store mutex poisoned")
            .insert(id, record);
        id
    }

    async fn consume_link(&self, id: Uuid) -> Result<String, LinkConsumeError> {
        let now = self.clock.now();
        let record = self
            .links
            .lock()
            .expect("link store mutex poisoned")
            .remove(&id)
            .ok_or(LinkConsumeError::NotFound)?;

        // Past-expiry links not yet swept are still rejected; removal
        // above already made the id unusable either way.
        if record.expires_at <= now {
            return Err(LinkConsumeError::Expired);
        }
        Ok(record.email)
    }

    async fn discard_link(&self, id: Uuid) {
        self.links
            .lock()
            .expect("link store mutex poisoned")
            .remove(&id);
    }
}

// ── MemoryUserDirectory ──────────────────────────────────────────────────────

/// Users keyed by normalized email, created lazily.
#[derive(Clone)]
pub struct MemoryUserDirectory {
    users: Arc<Mutex<HashMap<String, UserRecord>>>,
    clock: Arc<dyn Clock>,
}

impl MemoryUserDirectory {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            users: Arc::new(Mutex::new(HashMap::new())),
            clock,
        }
    }
}

impl UserDirectory for MemoryUserDirectory {
    async fn find_by_email(&self, email: &str) -> Option<UserRecord> {
        self.users
            .lock()
            .expect("user directory mutex poisoned")
            .get(email)
            .cloned()
    }

    async fn create_if_missing(&self, email: &str, profile: Option<&Profile>) -> UserRecord {
        let mut users = self.users.lock().expect("user directory mutex poisoned");
        users
            .entry(email.to_owned())
            .or_insert_with(|| UserRecord {
                email: email.to_owned(),
                first_name: profile.and_then(|p| p.first_name.clone()),
                last_name: profile.and_then(|p| p.last_name.clone()),
                created_at: self.clock.now(),
            })
            .clone()
    }
}

// ── MemoryRateLimiter ────────────────────────────────────────────────────────

/// Fixed-window counters keyed by arbitrary strings (`ip:…`, `email:…`).
#[derive(Clone)]
pub struct MemoryRateLimiter {
    buckets: Arc<Mutex<HashMap<String, RateBucket>>>,
    clock: Arc<dyn Clock>,
}

impl MemoryRateLimiter {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            buckets: Arc::new(Mutex::new(HashMap::new())),
            clock,
        }
    }
}

impl RateLimiter for MemoryRateLimiter {
    async fn allow(&self, key: &str, max: u32, window_secs: i64) -> bool {
        let now = self.clock.now();
        let mut buckets = self.buckets.lock().expect("rate limiter mutex poisoned");
        let bucket = buckets.entry(key.to_owned()).or_insert_with(|| RateBucket {
            count: 0,
            window_reset_at: now + Duration::seconds(window_secs),
        });

        if now > bucket.window_reset_at {
            bucket.count = 0;
            bucket.window_reset_at = now + Duration::seconds(window_secs);
        }
        bucket.count += 1;
        bucket.count <= max
    }
}
