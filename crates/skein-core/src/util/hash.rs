//! Content hashing for embedding cache keys.
//!
//! A cache key covers both the text and the model that embedded it, so the
//! same text embedded by two models never collides.

/// Separator placed between text and model before hashing.
pub const KEY_SEPARATOR: &str = "::";

/// Compute the content hash for a `(text, model)` pair.
///
/// The digest is BLAKE3 over `"{text}::{model}"`, rendered as lowercase hex.
pub fn content_hash(text: &str, model: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(text.as_bytes());
    hasher.update(KEY_SEPARATOR.as_bytes());
    hasher.update(model.as_bytes());
    hasher.finalize().to_hex().to_string()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_deterministic() {
        assert_eq!(
            content_hash("hello", "bge-small-en-v1.5"),
            content_hash("hello", "bge-small-en-v1.5")
        );
    }

    #[test]
    fn test_content_hash_is_hex_digest() {
        let hash = content_hash("hello", "m");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_content_hash_differs_by_model() {
        assert_ne!(content_hash("hello", "model-a"), content_hash("hello", "model-b"));
    }

    #[test]
    fn test_content_hash_differs_by_text() {
        assert_ne!(content_hash("hello", "m"), content_hash("hullo", "m"));
    }

    #[test]
    fn test_content_hash_matches_concatenated_input() {
        let expected = blake3::hash(b"cat::mini").to_hex().to_string();
        assert_eq!(content_hash("cat", "mini"), expected);
    }
}
