//! ID, slug and token generation utilities.

use rand::{Rng, distributions::Alphanumeric};
use ulid::Ulid;
use uuid::Uuid;

/// Length of generated content slugs.
const SLUG_LEN: usize = 16;

/// ID generator for entities.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new ULID-based ID.
    ///
    /// ULIDs are:
    /// - Lexicographically sortable
    /// - Monotonically increasing within the same millisecond
    /// - Shorter than UUIDs when represented as strings
    ///
    /// Ordering by ID descending therefore orders by creation time
    /// descending, which every listing query here relies on.
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Generate a random URL-safe slug.
    ///
    /// Slugs are opaque tokens; the database unique index is the
    /// authoritative uniqueness check, callers only pre-check to keep the
    /// retry loop short.
    #[must_use]
    pub fn generate_slug(&self) -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(SLUG_LEN)
            .map(char::from)
            .collect::<String>()
            .to_lowercase()
    }

    /// Generate a cryptographically secure random token.
    #[must_use]
    pub fn generate_token(&self) -> String {
        // Use UUID v4 for tokens (no time component)
        Uuid::new_v4().simple().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_ulid() {
        let id_gen = IdGenerator::new();
        let id1 = id_gen.generate();
        let id2 = id_gen.generate();

        assert_eq!(id1.len(), 26);
        assert_eq!(id2.len(), 26);
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_generate_slug_is_url_safe() {
        let id_gen = IdGenerator::new();
        let slug = id_gen.generate_slug();

        assert_eq!(slug.len(), SLUG_LEN);
        assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_generate_slug_varies() {
        let id_gen = IdGenerator::new();
        assert_ne!(id_gen.generate_slug(), id_gen.generate_slug());
    }

    #[test]
    fn test_generate_token() {
        let id_gen = IdGenerator::new();
        let token = id_gen.generate_token();

        assert_eq!(token.len(), 32); // Simple UUID without hyphens
    }
}
