//! Core types shared by the draft and metadata CRDT documents.

use serde::{Deserialize, Serialize};
use yrs::Snapshot;

/// Frontier of a CRDT document, used to cheaply tell whether two replicas
/// have diverged.
///
/// Wraps a yrs [`Snapshot`]: the state vector (highest clock seen per client)
/// plus the delete set. Yjs deletions don't advance the state vector, so the
/// delete set is needed to notice a replica that only removed text.
/// Comparison is order-insensitive over client ids.
#[derive(Debug, Clone, PartialEq)]
pub struct Heads(pub(crate) Snapshot);

/// Ledger record for a known draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftEntry {
    /// Author that created the draft
    pub author_id: String,

    /// Unix timestamp when the draft was registered (milliseconds)
    #[serde(default)]
    pub created_at: i64,
}

/// State of a comment thread entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentState {
    /// Top-level comment awaiting resolution
    Open,

    /// Resolved top-level comment
    Closed,

    /// Reply inside another comment's thread
    Child,
}

impl std::fmt::Display for CommentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommentState::Open => write!(f, "open"),
            CommentState::Closed => write!(f, "closed"),
            CommentState::Child => write!(f, "child"),
        }
    }
}

impl std::str::FromStr for CommentState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(CommentState::Open),
            "closed" => Ok(CommentState::Closed),
            "child" => Ok(CommentState::Child),
            _ => Err(format!("Unknown comment state: {}", s)),
        }
    }
}

/// A comment attached to a draft.
///
/// `children` is not part of the stored JSON; it is read from the parent's
/// ordered children list in the draft document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub author_id: String,
    pub message: String,
    pub state: CommentState,
    #[serde(skip)]
    pub children: Vec<String>,
}

impl Comment {
    /// Create a new open comment with a fresh id.
    pub fn new(author_id: &str, message: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            author_id: author_id.to_string(),
            message: message.to_string(),
            state: CommentState::Open,
            children: Vec::new(),
        }
    }

    /// Whether the comment is a top-level thread (not a reply).
    pub fn is_thread(&self) -> bool {
        self.state != CommentState::Child
    }
}
