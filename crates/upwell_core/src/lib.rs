#![doc = include_str!("../README.md")]

/// Author identity
pub mod author;

/// Archive encoding of bundles
pub mod codec;

/// Comment threads on drafts
pub mod comments;

/// Configuration (local author and library location)
#[cfg(not(target_arch = "wasm32"))]
pub mod config;

/// CRDT documents backing drafts and the metadata ledger
pub mod crdt;

/// Registry of open bundles
pub mod documents;

/// Drafts
pub mod draft;

/// Error (common error types)
pub mod error;

/// Root promotion history
pub mod history;

pub mod names;

/// Persistence of encoded bundles
pub mod storage;

/// Bundles of drafts
pub mod upwell;

#[cfg(test)]
pub mod test_utils;

pub use author::{Author, AuthorId, UNKNOWN_AUTHOR, create_author_id};
pub use crdt::{Comment, CommentState, Heads};
pub use documents::Documents;
pub use draft::{Draft, DraftId};
pub use error::{Result, SerializableError, UpwellError};
pub use history::History;
#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileStorage;
pub use storage::{BundleStorage, MemoryStorage};
pub use upwell::{SPECIAL_ROOT_DOCUMENT, Upwell, UpwellOptions};
