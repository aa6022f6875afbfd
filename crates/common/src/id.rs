//! ID and token generation utilities.

use rand::Rng;
use ulid::Ulid;
use uuid::Uuid;

/// URL-safe alphabet for story access tokens (same character set as nanoid).
const ACCESS_TOKEN_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

/// Length of a story access token.
const ACCESS_TOKEN_LEN: usize = 10;

/// ID generator for entities and tokens.
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

    /// Generate a new ULID-based entity ID.
    ///
    /// ULIDs are:
    /// - Lexicographically sortable
    /// - Monotonically increasing within the same millisecond
    /// - Shorter than UUIDs when represented as strings
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Generate a cryptographically secure random API bearer token.
    #[must_use]
    pub fn generate_token(&self) -> String {
        // Use UUID v4 for tokens (no time component for security)
        Uuid::new_v4().simple().to_string()
    }

    /// Generate a short opaque access token for story permalinks.
    ///
    /// Ten characters drawn from a URL-safe alphabet. Uniqueness is
    /// probabilistic; callers must check for collisions at insert time and
    /// regenerate on the rare hit.
    #[must_use]
    pub fn generate_access_token(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..ACCESS_TOKEN_LEN)
            .map(|_| {
                let idx = rng.gen_range(0..ACCESS_TOKEN_ALPHABET.len());
                char::from(ACCESS_TOKEN_ALPHABET[idx])
            })
            .collect()
    }
}
