//! A named, authored copy of versioned content.
//!
//! Draft-level fields live inside the draft's CRDT document so they travel
//! with content when drafts are forked and merged. Identity fields (message,
//! parent, author, creation time) are keyed by draft id inside the document,
//! so merging one draft into another never overwrites the receiver's
//! identity. The title is document-level and merges like content.

use crate::comments::Comments;
use crate::crdt::{DraftDoc, Heads};
use crate::error::Result;

/// Identifier of a draft within a bundle.
pub type DraftId = String;

const MESSAGE_KEY: &str = "message";
const TITLE_KEY: &str = "title";
const PARENT_KEY: &str = "parent_id";
const AUTHOR_KEY: &str = "author_id";
const CREATED_AT_KEY: &str = "created_at";

/// An independently editable copy of a document.
pub struct Draft {
    id: DraftId,
    doc: DraftDoc,
}

impl Draft {
    /// Create a draft with empty content that is its own parent.
    pub fn create(id: &str, author_id: &str) -> Self {
        let draft = Self {
            id: id.to_string(),
            doc: DraftDoc::new(),
        };
        draft.set_own(AUTHOR_KEY, author_id);
        draft.set_own(PARENT_KEY, id);
        draft.touch_created_at();
        draft
    }

    /// Decode a draft saved with [`Draft::save`].
    pub fn load(id: &str, state: &[u8]) -> Result<Self> {
        Ok(Self {
            id: id.to_string(),
            doc: DraftDoc::load(state)?,
        })
    }

    /// Encode the draft's full content.
    pub fn save(&self) -> Vec<u8> {
        self.doc.save()
    }

    /// Create a new draft whose content starts as a copy of this one.
    ///
    /// The fork is parented to this draft, authored by `author_id` and not
    /// shared, regardless of this draft's own fields.
    pub fn fork(&self, id: &str, message: &str, author_id: &str) -> Result<Draft> {
        let forked = Self {
            id: id.to_string(),
            doc: self.doc.fork()?,
        };
        forked.set_own(MESSAGE_KEY, message);
        forked.set_own(AUTHOR_KEY, author_id);
        forked.set_own(PARENT_KEY, &self.id);
        forked.touch_created_at();
        Ok(forked)
    }

    /// Merge another draft's content (and fields) into this one.
    pub fn merge(&self, other: &Draft) -> Result<()> {
        self.doc.merge(&other.doc)
    }

    fn own_key(&self, name: &str) -> String {
        format!("{}/{}", self.id, name)
    }

    fn own(&self, name: &str) -> Option<String> {
        self.doc.field(&self.own_key(name))
    }

    fn set_own(&self, name: &str, value: &str) {
        self.doc.set_field(&self.own_key(name), value);
    }

    fn touch_created_at(&self) {
        self.set_own(
            CREATED_AT_KEY,
            &chrono::Utc::now().timestamp_millis().to_string(),
        );
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Id of the draft this one was forked from. The first draft of a bundle
    /// is its own parent.
    pub fn parent_id(&self) -> DraftId {
        self.own(PARENT_KEY).unwrap_or_else(|| self.id.clone())
    }

    pub fn set_parent_id(&self, parent_id: &str) {
        self.set_own(PARENT_KEY, parent_id);
    }

    pub fn author_id(&self) -> String {
        self.own(AUTHOR_KEY).unwrap_or_default()
    }

    pub fn message(&self) -> String {
        self.own(MESSAGE_KEY).unwrap_or_default()
    }

    pub fn set_message(&self, message: &str) {
        self.set_own(MESSAGE_KEY, message);
    }

    pub fn title(&self) -> String {
        self.doc.field(TITLE_KEY).unwrap_or_default()
    }

    pub fn set_title(&self, title: &str) {
        self.doc.set_field(TITLE_KEY, title);
    }

    /// Unix timestamp (milliseconds) when the draft was created.
    pub fn created_at(&self) -> i64 {
        self.own(CREATED_AT_KEY)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }

    /// Whether the draft has been shared. Once shared, always shared.
    pub fn shared(&self) -> bool {
        self.doc.is_shared(&self.id)
    }

    pub fn share(&self) {
        self.doc.mark_shared(&self.id);
    }

    // ==================== Content ====================

    pub fn text(&self) -> String {
        self.doc.text()
    }

    /// Length of the content in UTF-16 code units, the unit of every
    /// editing offset.
    pub fn text_len(&self) -> u32 {
        self.doc.text_len()
    }

    pub fn set_text(&self, content: &str) {
        self.doc.set_text(content);
    }

    pub fn insert_at(&self, index: u32, chunk: &str) {
        self.doc.insert_at(index, chunk);
    }

    pub fn delete_at(&self, index: u32, length: u32) {
        self.doc.delete_at(index, length);
    }

    /// Current frontier of the draft's content.
    pub fn heads(&self) -> Heads {
        self.doc.heads()
    }

    /// Comment threads attached to this draft.
    pub fn comments(&self) -> Comments<'_> {
        Comments::new(&self.doc)
    }
}

impl std::fmt::Debug for Draft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Draft")
            .field("id", &self.id)
            .field("parent_id", &self.parent_id())
            .field("message", &self.message())
            .field("shared", &self.shared())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_is_self_parented() {
        let draft = Draft::create("root", "a1");
        assert_eq!(draft.id(), "root");
        assert_eq!(draft.parent_id(), "root");
        assert_eq!(draft.author_id(), "a1");
        assert_eq!(draft.text(), "");
        assert!(!draft.shared());
        assert!(draft.created_at() > 0);
    }

    #[test]
    fn test_fork_copies_content_not_identity() {
        let root = Draft::create("root", "a1");
        root.set_text("Hello");
        root.set_message("canonical");
        root.share();

        let fork = root.fork("d1", "edit", "a2").unwrap();
        assert_eq!(fork.text(), "Hello");
        assert_eq!(fork.message(), "edit");
        assert_eq!(fork.author_id(), "a2");
        assert_eq!(fork.parent_id(), "root");
        assert!(!fork.shared());
        assert!(root.shared());
    }

    #[test]
    fn test_share_is_idempotent() {
        let draft = Draft::create("d", "a1");
        draft.share();
        let heads = draft.heads();
        draft.share();
        assert!(draft.shared());
        assert_eq!(draft.heads(), heads);
    }

    #[test]
    fn test_load_keeps_fields() {
        let draft = Draft::create("d", "a1");
        draft.set_title("Title");
        draft.insert_at(0, "body");

        let loaded = Draft::load("d", &draft.save()).unwrap();
        assert_eq!(loaded.title(), "Title");
        assert_eq!(loaded.text(), "body");
        assert_eq!(loaded.author_id(), "a1");
    }

    #[test]
    fn test_merge_keeps_receiver_identity() {
        let root = Draft::create("root", "a1");
        root.set_message("canonical");
        let fork = root.fork("d1", "edit", "a2").unwrap();
        fork.set_title("Shared title");

        root.merge(&fork).unwrap();
        assert_eq!(root.message(), "canonical");
        assert_eq!(root.author_id(), "a1");
        assert_eq!(root.parent_id(), "root");
        assert_eq!(root.title(), "Shared title");
    }

    #[test]
    fn test_merge_forked_edits_back() {
        let root = Draft::create("root", "a1");
        root.set_text("Hello");
        let fork = root.fork("d1", "world", "a1").unwrap();
        fork.insert_at(5, " world");

        root.merge(&fork).unwrap();
        assert_eq!(root.text(), "Hello world");
    }
}
