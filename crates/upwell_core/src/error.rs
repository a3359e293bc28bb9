use serde::Serialize;
use thiserror::Error;

/// Unified error type for upwell operations
#[derive(Debug, Error)]
pub enum UpwellError {
    // Lookup errors
    #[error("Draft not found: '{0}'")]
    DraftNotFound(String),

    #[error("Document not found: '{0}'")]
    BundleNotFound(String),

    #[error("Comment not found: '{0}'")]
    CommentNotFound(String),

    #[error("History index {index} out of range (chain has {len} drafts)")]
    HistoryOutOfRange { index: usize, len: usize },

    // Bundle state errors
    #[error("Cannot archive '{0}' while it is the root draft")]
    ArchiveRoot(String),

    #[error("Cannot merge bundle '{found}' into bundle '{expected}'")]
    BundleMismatch { expected: String, found: String },

    // Codec errors
    #[error("Malformed archive: {0}")]
    MalformedArchive(String),

    #[error("CRDT error: {0}")]
    Crdt(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Config errors
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Result type alias for upwell operations
pub type Result<T> = std::result::Result<T, UpwellError>;

/// A serializable representation of UpwellError for IPC callers
#[derive(Debug, Clone, Serialize)]
pub struct SerializableError {
    /// Error kind/variant name
    pub kind: String,
    /// Human-readable error message
    pub message: String,
    /// Associated draft, document or comment id (if applicable)
    pub id: Option<String>,
}

impl From<&UpwellError> for SerializableError {
    fn from(err: &UpwellError) -> Self {
        let kind = match err {
            UpwellError::DraftNotFound(_) => "DraftNotFound",
            UpwellError::BundleNotFound(_) => "BundleNotFound",
            UpwellError::CommentNotFound(_) => "CommentNotFound",
            UpwellError::HistoryOutOfRange { .. } => "HistoryOutOfRange",
            UpwellError::ArchiveRoot(_) => "ArchiveRoot",
            UpwellError::BundleMismatch { .. } => "BundleMismatch",
            UpwellError::MalformedArchive(_) => "MalformedArchive",
            UpwellError::Crdt(_) => "Crdt",
            UpwellError::Io(_) => "Io",
            UpwellError::Json(_) => "Json",
            UpwellError::ConfigParse(_) => "ConfigParse",
            UpwellError::ConfigSerialize(_) => "ConfigSerialize",
            UpwellError::NoConfigDir => "NoConfigDir",
        }
        .to_string();

        let id = match err {
            UpwellError::DraftNotFound(id)
            | UpwellError::BundleNotFound(id)
            | UpwellError::CommentNotFound(id)
            | UpwellError::ArchiveRoot(id) => Some(id.clone()),
            UpwellError::BundleMismatch { found, .. } => Some(found.clone()),
            _ => None,
        };

        Self {
            kind,
            message: err.to_string(),
            id,
        }
    }
}

impl From<UpwellError> for SerializableError {
    fn from(err: UpwellError) -> Self {
        SerializableError::from(&err)
    }
}

impl UpwellError {
    /// Convert to a serializable representation for IPC
    pub fn to_serializable(&self) -> SerializableError {
        SerializableError::from(self)
    }

    /// Whether the error means the requested item doesn't exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            UpwellError::DraftNotFound(_)
                | UpwellError::BundleNotFound(_)
                | UpwellError::CommentNotFound(_)
        )
    }
}
