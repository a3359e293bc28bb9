//! CRDT documents backing drafts and the bundle metadata ledger.
//!
//! Both documents are yrs (Yjs) docs and share the same primitives:
//! full-state `save`/`load`, `merge` of another replica, and `heads` for
//! cheap divergence checks.

mod draft_doc;
mod metadata_doc;
mod types;

pub use draft_doc::DraftDoc;
pub use metadata_doc::MetadataDoc;
pub use types::{Comment, CommentState, DraftEntry, Heads};
