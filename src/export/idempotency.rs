//! Idempotency keys for report submissions.
//!
//! Every submission attempt carries a fresh token in `X-Idempotency-Key` so
//! the report service can drop a duplicate of the same logical export.

use std::collections::hash_map::RandomState;
use std::fmt;
use std::hash::{BuildHasher, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;
use uuid::Uuid;

/// Header carrying the key.
pub const IDEMPOTENCY_HEADER: &str = "X-Idempotency-Key";

static FALLBACK_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A per-attempt submission token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Generate a new key: a random UUID v4, or a timestamp plus random
    /// suffix when the OS random source is unavailable.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        match getrandom::fill(&mut bytes) {
            Ok(()) => Self(uuid::Builder::from_random_bytes(bytes).into_uuid().to_string()),
            Err(e) => {
                warn!("OS randomness unavailable ({}); using timestamp key", e);
                Self::fallback()
            }
        }
    }

    /// `"<unix-millis>-<hex suffix>"`.
    fn fallback() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let mut hasher = RandomState::new().build_hasher();
        hasher.write_u128(millis);
        hasher.write_u64(FALLBACK_COUNTER.fetch_add(1, Ordering::Relaxed));
        Self(format!("{}-{:x}", millis, hasher.finish()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if the key has UUID form.
    pub fn is_uuid(&self) -> bool {
        Uuid::parse_str(&self.0).is_ok()
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for IdempotencyKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn generated_keys_are_uuid_v4() {
        let key = IdempotencyKey::generate();
        assert!(key.is_uuid(), "got {key}");
        assert_eq!(Uuid::parse_str(key.as_str()).unwrap().get_version_num(), 4);
    }

    #[test]
    fn consecutive_keys_differ() {
        let keys: HashSet<IdempotencyKey> = (0..256).map(|_| IdempotencyKey::generate()).collect();
        assert_eq!(keys.len(), 256);
    }

    #[test]
    fn fallback_keys_are_unique_and_timestamped() {
        let a = IdempotencyKey::fallback();
        let b = IdempotencyKey::fallback();
        assert_ne!(a, b);
        let (millis, suffix) = a.as_str().split_once('-').unwrap();
        assert!(millis.parse::<u128>().is_ok());
        assert!(u64::from_str_radix(suffix, 16).is_ok());
        assert!(!a.is_uuid());
    }
}
