// crates/url-state/src/hash.rs
//! Short content hashes for state kept out of the URL

use sha2::{Digest, Sha256};

/// Marks a URL parameter value as a hash reference instead of rison
pub const HASH_PREFIX: &str = "h@";

/// Shortest hash (not counting the prefix) ever handed out
pub const MIN_HASH_LENGTH: usize = 7;

/// Computes the key under which `json` is stored
///
/// Starting at `min_length` hex digits, the hash grows one digit at a time
/// until it names a slot that is either free or already holds the same
/// `json`. `existing` returns what is currently stored under a key. If every
/// prefix collides the full digest is used.
pub fn create_state_hash<F>(json: &str, min_length: usize, existing: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let digest = hex::encode(Sha256::digest(json.as_bytes()));
    let start = min_length.clamp(1, digest.len());

    for len in start..=digest.len() {
        let candidate = format!("{}{}", HASH_PREFIX, &digest[..len]);
        match existing(&candidate) {
            None => return candidate,
            Some(stored) if stored == json => return candidate,
            Some(_) => log::debug!("hash collision at length {}, growing", len),
        }
    }

    format!("{}{}", HASH_PREFIX, digest)
}

/// Whether a parameter value is a hash reference
pub fn is_state_hash(value: &str) -> bool {
    value.starts_with(HASH_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_hash_has_prefix_and_min_length() {
        let hash = create_state_hash(r#"{"a":1}"#, MIN_HASH_LENGTH, |_| None);
        assert!(is_state_hash(&hash));
        assert_eq!(hash.len(), HASH_PREFIX.len() + MIN_HASH_LENGTH);
    }

    #[test]
    fn test_hash_is_deterministic() {
        let a = create_state_hash("x", MIN_HASH_LENGTH, |_| None);
        let b = create_state_hash("x", MIN_HASH_LENGTH, |_| None);
        assert_eq!(a, b);
    }

    #[test]
    fn test_same_content_reuses_slot() {
        let json = r#"{"a":1}"#;
        let first = create_state_hash(json, MIN_HASH_LENGTH, |_| None);
        let stored: HashMap<String, String> = [(first.clone(), json.to_string())].into();
        let second = create_state_hash(json, MIN_HASH_LENGTH, |k| stored.get(k).cloned());
        assert_eq!(first, second);
    }

    #[test]
    fn test_collision_grows_hash() {
        let json = r#"{"a":1}"#;
        let short = create_state_hash(json, MIN_HASH_LENGTH, |_| None);
        let stored: HashMap<String, String> = [(short.clone(), "other".to_string())].into();
        let longer = create_state_hash(json, MIN_HASH_LENGTH, |k| stored.get(k).cloned());
        assert_eq!(longer.len(), short.len() + 1);
        assert!(longer.starts_with(&short));
    }

    #[test]
    fn test_full_digest_when_every_prefix_collides() {
        let hash = create_state_hash("x", MIN_HASH_LENGTH, |_| Some("other".to_string()));
        assert_eq!(hash.len(), HASH_PREFIX.len() + 64);
    }

    #[test]
    fn test_rison_is_not_a_hash() {
        assert!(!is_state_hash("(a:1)"));
        assert!(!is_state_hash("h"));
    }
}
