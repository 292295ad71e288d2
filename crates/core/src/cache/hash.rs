//! Cache key derivation.
//!
//! The key is a one-way hash of the canonical room URL, so the same room
//! always maps to the same storage slot regardless of how the URL was
//! originally typed, and independent of any mutable room metadata.

use sha2::{Digest, Sha256};

/// Compute the storage key for a canonical room URL.
pub fn cache_key(canonical_url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_url.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_stability() {
        let a = cache_key("https://live.bilibili.com/123456");
        let b = cache_key("https://live.bilibili.com/123456");
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_distinguishes_rooms() {
        let a = cache_key("https://live.bilibili.com/123456");
        let b = cache_key("https://live.bilibili.com/654321");
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_format() {
        let key = cache_key("https://www.huya.com/kpl");
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
