//! Author identity.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

/// Identifier of an author: 16 random bytes rendered as lowercase hex.
pub type AuthorId = String;

/// Someone who creates or edits drafts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Author {
    pub id: AuthorId,
    pub name: String,
}

impl Author {
    /// Create an author with a freshly generated id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: create_author_id(),
            name: name.into(),
        }
    }
}

/// Author used when a bundle is created without an explicit identity.
///
/// The id is generated once per process.
pub static UNKNOWN_AUTHOR: LazyLock<Author> = LazyLock::new(|| Author::new("Anonymous"));

/// Generate a new random author id (32 hex characters).
pub fn create_author_id() -> AuthorId {
    rand::random::<[u8; 16]>()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}
