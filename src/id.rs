//! Content-addressed entry and project identifiers.
//!
//! Every record in the store is named by a 7-hex-char ID. IDs derived from a
//! seed are deterministic (sync relies on this for dedup across runs); fresh
//! IDs mix a namespace with a nanosecond counter so repeated calls on the
//! same host never collide in practice.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Derive a deterministic 7-hex-char ID from a seed string.
pub fn id_from_seed(seed: &str) -> String {
    let digest = Sha256::digest(seed.as_bytes());
    let mut hex = String::with_capacity(8);
    for byte in &digest[..4] {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex.truncate(7);
    hex
}

/// Generate a fresh 7-hex-char ID seeded with the namespace and a
/// monotonic-ish nanosecond counter.
pub fn id_fresh(namespace: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let tick = COUNTER.fetch_add(1, Ordering::Relaxed);
    id_from_seed(&format!("{namespace}\x00{}", nanos as u64 ^ tick.rotate_left(17)))
}

/// Check that an ID matches the expected 7-char lowercase hex format.
pub fn is_valid_id(id: &str) -> bool {
    id.len() == 7 && id.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_ids_are_deterministic() {
        let a = id_from_seed("abc1234 2025-06-15T12:30:00Z main feature-x");
        let b = id_from_seed("abc1234 2025-06-15T12:30:00Z main feature-x");
        assert_eq!(a, b);
    }

    #[test]
    fn seed_ids_have_expected_shape() {
        for seed in ["", "a", "hello world", "\x00\x00"] {
            let id = id_from_seed(seed);
            assert_eq!(id.len(), 7);
            assert!(is_valid_id(&id), "bad id {id:?} for seed {seed:?}");
        }
    }

    #[test]
    fn distinct_seeds_differ() {
        assert_ne!(id_from_seed("one"), id_from_seed("two"));
    }

    #[test]
    fn fresh_ids_do_not_repeat() {
        let mut seen = std::collections::HashSet::new();
        for _ in 0..1000 {
            let id = id_fresh("log");
            assert!(is_valid_id(&id));
            seen.insert(id);
        }
        // A few hash collisions on 28 bits are tolerable; identical streaks are not.
        assert!(seen.len() > 990);
    }

    #[test]
    fn id_validation() {
        assert!(is_valid_id("0a1b2c3"));
        assert!(!is_valid_id("0a1b2c"));
        assert!(!is_valid_id("0a1b2c34"));
        assert!(!is_valid_id("0A1B2C3"));
        assert!(!is_valid_id("0a1b2cg"));
    }
}
