//! Versioned content of a single draft.
//!
//! This module provides `DraftDoc`, a Y.Doc holding one draft's text together
//! with the draft-level fields that must travel with it when drafts are
//! forked and merged (message, parent, author, sharing and comments).

use yrs::updates::decoder::Decode;
use yrs::{
    Array, Doc, GetString, Map, MapRef, OffsetKind, Options, ReadTxn, StateVector, Text, TextRef,
    Transact, Update,
};

use super::types::Heads;
use crate::error::{Result, UpwellError};

/// Name of the Y.Text holding the draft body.
const TEXT_NAME: &str = "text";

/// Name of the Y.Map holding draft fields (message, title, parent_id, ...).
const FIELDS_MAP_NAME: &str = "fields";

/// Name of the Y.Map recording which draft ids have been shared.
const SHARED_MAP_NAME: &str = "shared";

/// Name of the Y.Map holding comments (id -> JSON).
const COMMENTS_MAP_NAME: &str = "comments";

/// A CRDT document for a single draft.
///
/// The document contains:
/// - A Y.Text for the body
/// - A Y.Map of string fields
/// - A Y.Map of shared draft ids (keyed by draft id so forks don't inherit it)
/// - A Y.Map of comments plus one Y.Array of child ids per commented thread
///
/// Text offsets and lengths are counted in UTF-16 code units, so a
/// character outside the Basic Multilingual Plane (most emoji) counts as two.
pub struct DraftDoc {
    doc: Doc,
    text: TextRef,
    fields: MapRef,
    shared: MapRef,
    comments: MapRef,
}

fn doc_options() -> Options {
    Options {
        offset_kind: OffsetKind::Utf16,
        ..Options::default()
    }
}

fn children_array_name(parent_id: &str) -> String {
    format!("{}/{}/children", COMMENTS_MAP_NAME, parent_id)
}

fn utf16_len(chars: &[char]) -> u32 {
    chars.iter().map(|c| c.len_utf16() as u32).sum()
}

impl DraftDoc {
    /// Create a new empty draft document.
    pub fn new() -> Self {
        Self::from_doc(Doc::with_options(doc_options()))
    }

    fn from_doc(doc: Doc) -> Self {
        let text = doc.get_or_insert_text(TEXT_NAME);
        let fields = doc.get_or_insert_map(FIELDS_MAP_NAME);
        let shared = doc.get_or_insert_map(SHARED_MAP_NAME);
        let comments = doc.get_or_insert_map(COMMENTS_MAP_NAME);

        Self {
            doc,
            text,
            fields,
            shared,
            comments,
        }
    }

    /// Load a draft document from bytes produced by [`DraftDoc::save`].
    pub fn load(state: &[u8]) -> Result<Self> {
        let doc = Doc::with_options(doc_options());

        {
            let update = Update::decode_v1(state)
                .map_err(|e| UpwellError::Crdt(format!("Failed to decode draft state: {}", e)))?;
            let mut txn = doc.transact_mut();
            txn.apply_update(update)
                .map_err(|e| UpwellError::Crdt(format!("Failed to apply draft state: {}", e)))?;
        }

        Ok(Self::from_doc(doc))
    }

    /// Encode the full document state.
    pub fn save(&self) -> Vec<u8> {
        let txn = self.doc.transact();
        txn.encode_state_as_update_v1(&StateVector::default())
    }

    /// Create an independent copy of this document under a new client id.
    pub fn fork(&self) -> Result<Self> {
        Self::load(&self.save())
    }

    /// Merge another replica's changes into this document.
    ///
    /// Only the operations this document hasn't seen yet are transferred.
    pub fn merge(&self, other: &DraftDoc) -> Result<()> {
        let sv = {
            let txn = self.doc.transact();
            txn.state_vector()
        };
        let update = {
            let txn = other.doc.transact();
            txn.encode_state_as_update_v1(&sv)
        };
        self.apply_update(&update)
    }

    /// Apply an encoded update from another replica.
    pub fn apply_update(&self, update: &[u8]) -> Result<()> {
        let decoded = Update::decode_v1(update)
            .map_err(|e| UpwellError::Crdt(format!("Failed to decode update: {}", e)))?;

        let mut txn = self.doc.transact_mut();
        txn.apply_update(decoded)
            .map_err(|e| UpwellError::Crdt(format!("Failed to apply update: {}", e)))
    }

    /// Current frontier of the document.
    pub fn heads(&self) -> Heads {
        let txn = self.doc.transact();
        Heads(txn.snapshot())
    }

    // ==================== Text Operations ====================

    /// Get the full body text.
    pub fn text(&self) -> String {
        let txn = self.doc.transact();
        self.text.get_string(&txn)
    }

    /// Length of the body text in UTF-16 code units.
    pub fn text_len(&self) -> u32 {
        let txn = self.doc.transact();
        self.text.len(&txn)
    }

    /// Replace the body text using minimal diff operations.
    ///
    /// Only the span between the common prefix and common suffix is deleted
    /// and reinserted, so concurrent edits elsewhere in the text still merge.
    pub fn set_text(&self, content: &str) {
        let current = self.text();
        if current == content {
            return;
        }

        let current_chars: Vec<char> = current.chars().collect();
        let new_chars: Vec<char> = content.chars().collect();

        let common_prefix = current_chars
            .iter()
            .zip(new_chars.iter())
            .take_while(|(a, b)| a == b)
            .count();

        // Suffix must not overlap the prefix
        let remaining_current = current_chars.len() - common_prefix;
        let remaining_new = new_chars.len() - common_prefix;
        let common_suffix = current_chars[common_prefix..]
            .iter()
            .rev()
            .zip(new_chars[common_prefix..].iter().rev())
            .take_while(|(a, b)| a == b)
            .take(remaining_current.min(remaining_new))
            .count();

        let delete_end = current_chars.len() - common_suffix;
        let insert_end = new_chars.len() - common_suffix;

        // Diff over chars so a surrogate pair is never split, then convert to
        // the document's UTF-16 offsets.
        let offset = utf16_len(&current_chars[..common_prefix]);
        let deleted = utf16_len(&current_chars[common_prefix..delete_end]);

        let mut txn = self.doc.transact_mut();
        if deleted > 0 {
            self.text.remove_range(&mut txn, offset, deleted);
        }
        if insert_end > common_prefix {
            let insert_text: String = new_chars[common_prefix..insert_end].iter().collect();
            self.text.insert(&mut txn, offset, &insert_text);
        }
    }

    /// Insert text at a position.
    pub fn insert_at(&self, index: u32, chunk: &str) {
        let mut txn = self.doc.transact_mut();
        self.text.insert(&mut txn, index, chunk);
    }

    /// Delete `length` characters starting at `index`.
    pub fn delete_at(&self, index: u32, length: u32) {
        let mut txn = self.doc.transact_mut();
        self.text.remove_range(&mut txn, index, length);
    }

    // ==================== Field Operations ====================

    /// Get a string field.
    pub fn field(&self, key: &str) -> Option<String> {
        let txn = self.doc.transact();
        self.fields
            .get(&txn, key)
            .and_then(|v| v.cast::<String>().ok())
    }

    /// Set a string field. Writing the current value is a no-op.
    pub fn set_field(&self, key: &str, value: &str) {
        if self.field(key).as_deref() == Some(value) {
            return;
        }
        let mut txn = self.doc.transact_mut();
        self.fields.insert(&mut txn, key, value.to_string());
    }

    /// Whether the given draft id has been marked shared in this document.
    pub fn is_shared(&self, draft_id: &str) -> bool {
        let txn = self.doc.transact();
        self.shared.contains_key(&txn, draft_id)
    }

    /// Mark a draft id as shared. There is no way to unmark it.
    pub fn mark_shared(&self, draft_id: &str) {
        if self.is_shared(draft_id) {
            return;
        }
        let mut txn = self.doc.transact_mut();
        self.shared.insert(
            &mut txn,
            draft_id,
            chrono::Utc::now().timestamp_millis().to_string(),
        );
    }

    // ==================== Comment Storage ====================

    /// Raw JSON of a stored comment.
    pub(crate) fn comment_json(&self, id: &str) -> Option<String> {
        let txn = self.doc.transact();
        self.comments
            .get(&txn, id)
            .and_then(|v| v.cast::<String>().ok())
    }

    /// Store (or overwrite) a comment's JSON.
    pub(crate) fn set_comment_json(&self, id: &str, json: String) {
        let mut txn = self.doc.transact_mut();
        self.comments.insert(&mut txn, id, json);
    }

    /// Ids of all stored comments.
    pub(crate) fn comment_ids(&self) -> Vec<String> {
        let txn = self.doc.transact();
        self.comments.keys(&txn).map(String::from).collect()
    }

    /// Ordered child ids of a comment thread.
    pub(crate) fn comment_children(&self, parent_id: &str) -> Vec<String> {
        let children = self.doc.get_or_insert_array(children_array_name(parent_id));
        let txn = self.doc.transact();
        children.iter(&txn).map(|v| v.to_string(&txn)).collect()
    }

    /// Append a child id to the end of a comment thread.
    pub(crate) fn push_comment_child(&self, parent_id: &str, child_id: &str) {
        let children = self.doc.get_or_insert_array(children_array_name(parent_id));
        let mut txn = self.doc.transact_mut();
        children.push_back(&mut txn, child_id.to_string());
    }
}

impl Default for DraftDoc {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DraftDoc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DraftDoc")
            .field("text_len", &self.text_len())
            .finish_non_exhaustive()
    }
}
