//! Cryptographic utilities for screen API key generation and hashing.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Prefix carried by every screen API key.
pub const API_KEY_PREFIX: &str = "signage_";

/// Number of random bytes behind each key.
const API_KEY_RANDOM_BYTES: usize = 32;

/// Number of leading characters kept as the displayable key prefix.
const DISPLAY_PREFIX_LEN: usize = 12;

/// Computes SHA-256 hash of the input and returns it as a hex string.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generates a new screen API key: `signage_` followed by 32 random bytes in
/// unpadded base64url.
pub fn generate_api_key() -> String {
    let mut bytes = [0u8; API_KEY_RANDOM_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("{}{}", API_KEY_PREFIX, URL_SAFE_NO_PAD.encode(bytes))
}

/// Returns the displayable prefix of a key (the first 12 characters).
pub fn display_prefix(key: &str) -> &str {
    let end = key
        .char_indices()
        .nth(DISPLAY_PREFIX_LEN)
        .map(|(idx, _)| idx)
        .unwrap_or(key.len());
    &key[..end]
}

/// Redacts an API key for display: `first 12 ... last 6`.
///
/// Keys shorter than 8 characters are returned as-is, empty keys render as a
/// placeholder.
pub fn redact_api_key(key: &str) -> String {
    if key.is_empty() {
        return "No key generated".to_string();
    }
    let chars: Vec<char> = key.chars().collect();
    if chars.len() < 8 {
        return key.to_string();
    }
    let head: String = chars.iter().take(DISPLAY_PREFIX_LEN).collect();
    let tail: String = chars[chars.len().saturating_sub(6)..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Compares two byte strings without short-circuiting on the first mismatch.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex() {
        let hash = sha256_hex("test");
        assert_eq!(hash.len(), 64);
        assert_eq!(
            hash,
            "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
        );
    }

    #[test]
    fn test_sha256_hex_deterministic() {
        assert_eq!(sha256_hex("same_input"), sha256_hex("same_input"));
        assert_ne!(sha256_hex("input1"), sha256_hex("input2"));
    }

    #[test]
    fn test_generate_api_key_format() {
        let key = generate_api_key();
        assert!(key.starts_with(API_KEY_PREFIX));
        // 32 bytes -> 43 chars of unpadded base64
        assert_eq!(key.len(), API_KEY_PREFIX.len() + 43);
        assert!(!key.contains('='));
        assert!(!key.contains('+'));
        assert!(!key.contains('/'));
    }

    #[test]
    fn test_generate_api_key_unique() {
        assert_ne!(generate_api_key(), generate_api_key());
    }

    #[test]
    fn test_display_prefix() {
        assert_eq!(display_prefix("signage_abcdefgh"), "signage_abcd");
        assert_eq!(display_prefix("short"), "short");
    }

    #[test]
    fn test_redact_api_key() {
        let key = "signage_abcdefghijklmnopqrstuvwxyz";
        assert_eq!(redact_api_key(key), "signage_abcd...uvwxyz");
        assert_eq!(redact_api_key(""), "No key generated");
        assert_eq!(redact_api_key("abc"), "abc");
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
        assert!(constant_time_eq(b"", b""));
    }
}
