//! Identifiers for stored rows and session tokens.

use ulid::Ulid;
use uuid::Uuid;

/// Produces row IDs and token IDs.
///
/// Row IDs are lowercase ULIDs. They sort by creation time at millisecond
/// resolution, so listing by ID gives insertion order for rows created apart.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdGenerator;

impl IdGenerator {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// A new row ID.
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// A random 32-hex-digit ID for the `jti` claim.
    #[must_use]
    pub fn token_id(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}
