use std::sync::LazyLock;

use regex::Regex;

/// Minimal `local@domain` shape check; deliverability is proven by
/// the email round-trip, not by parsing.
static EMAIL_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\S+@\S+\.\S+$").expect("email shape regex"));

/// Trim and lowercase an address for use as a lookup key.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_SHAPE.is_match(email)
}
