//! Shared utility functions for the Storelink application.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;

pub const SECONDS_PER_DAY: i64 = 86400;

pub fn now() -> i64 {
    Utc::now().timestamp()
}

/// Parse a platform-reported date into a unix timestamp.
///
/// Platforms are inconsistent: Salla sends RFC 3339 in some payloads and
/// bare `YYYY-MM-DD` / `YYYY-MM-DD HH:MM:SS` in others. Unparseable values
/// become `None` rather than failing the event.
pub fn parse_event_date(value: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.timestamp());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc().timestamp());
    }
    if let Ok(d) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(d.and_hms_opt(0, 0, 0)?.and_utc().timestamp());
    }
    None
}

/// Generate a random secret (initial passwords, API tokens, reset tokens).
pub fn generate_secret(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Hash a secret for storage/lookup. Normal comparison happens against the
/// stored hash, so plaintext secrets never live in the database.
pub fn hash_secret(secret: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(b"storelink-secret-v1:");
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_event_date_accepts_common_formats() {
        assert_eq!(parse_event_date("2025-01-01").unwrap(), 1735689600);
        assert_eq!(
            parse_event_date("2025-01-01 00:00:00").unwrap(),
            1735689600
        );
        assert_eq!(
            parse_event_date("2025-01-01T00:00:00Z").unwrap(),
            1735689600
        );
    }

    #[test]
    fn test_parse_event_date_rejects_garbage() {
        assert!(parse_event_date("next tuesday").is_none());
        assert!(parse_event_date("").is_none());
    }

    #[test]
    fn test_hash_secret_is_deterministic_and_distinct() {
        assert_eq!(hash_secret("a"), hash_secret("a"));
        assert_ne!(hash_secret("a"), hash_secret("b"));
    }

    #[test]
    fn test_generate_secret_length_and_uniqueness() {
        let a = generate_secret(32);
        let b = generate_secret(32);
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
    }
}
