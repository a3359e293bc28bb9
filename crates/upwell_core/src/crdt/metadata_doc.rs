//! Metadata ledger CRDT for a bundle of drafts.
//!
//! This module provides [`MetadataDoc`], which wraps a yrs [`Doc`] recording
//! who has contributed to a bundle, which drafts exist, which of them are
//! archived and which one is the root.
//!
//! # Structure
//!
//! ```text
//! Y.Doc
//! ├── Y.Map "meta"      id → bundle id, main → root draft id
//! ├── Y.Map "authors"   author id → display name
//! ├── Y.Map "drafts"    draft id → DraftEntry { author_id, created_at }
//! └── Y.Map "archived"  draft id → archive timestamp
//! ```
//!
//! Every map only grows, except `archived`, which loses the entry of a draft
//! when it is promoted to root.

use yrs::updates::decoder::Decode;
use yrs::{Doc, Map, MapRef, ReadTxn, StateVector, Transact, Update};

use super::types::{DraftEntry, Heads};
use crate::author::Author;
use crate::error::{Result, UpwellError};

const META_MAP_NAME: &str = "meta";
const AUTHORS_MAP_NAME: &str = "authors";
const DRAFTS_MAP_NAME: &str = "drafts";
const ARCHIVED_MAP_NAME: &str = "archived";

const ID_KEY: &str = "id";
const MAIN_KEY: &str = "main";

/// The metadata ledger of a bundle.
pub struct MetadataDoc {
    doc: Doc,
    meta: MapRef,
    authors: MapRef,
    drafts: MapRef,
    archived: MapRef,
}

impl MetadataDoc {
    fn from_doc(doc: Doc) -> Self {
        let meta = doc.get_or_insert_map(META_MAP_NAME);
        let authors = doc.get_or_insert_map(AUTHORS_MAP_NAME);
        let drafts = doc.get_or_insert_map(DRAFTS_MAP_NAME);
        let archived = doc.get_or_insert_map(ARCHIVED_MAP_NAME);

        Self {
            doc,
            meta,
            authors,
            drafts,
            archived,
        }
    }

    /// Create a ledger for a new bundle.
    pub fn create(id: &str) -> Self {
        let ledger = Self::from_doc(Doc::new());
        {
            let mut txn = ledger.doc.transact_mut();
            ledger.meta.insert(&mut txn, ID_KEY, id.to_string());
        }
        ledger
    }

    /// Load a ledger from bytes produced by [`MetadataDoc::save`].
    pub fn load(state: &[u8]) -> Result<Self> {
        let doc = Doc::new();

        {
            let update = Update::decode_v1(state).map_err(|e| {
                UpwellError::Crdt(format!("Failed to decode metadata state: {}", e))
            })?;
            let mut txn = doc.transact_mut();
            txn.apply_update(update).map_err(|e| {
                UpwellError::Crdt(format!("Failed to apply metadata state: {}", e))
            })?;
        }

        Ok(Self::from_doc(doc))
    }

    /// Encode the full ledger state.
    pub fn save(&self) -> Vec<u8> {
        let txn = self.doc.transact();
        txn.encode_state_as_update_v1(&StateVector::default())
    }

    /// Current frontier of the ledger.
    pub fn heads(&self) -> Heads {
        let txn = self.doc.transact();
        Heads(txn.snapshot())
    }

    /// Merge another replica's ledger into this one.
    pub fn merge(&self, other: &MetadataDoc) -> Result<()> {
        let sv = {
            let txn = self.doc.transact();
            txn.state_vector()
        };
        let update = {
            let txn = other.doc.transact();
            txn.encode_state_as_update_v1(&sv)
        };
        let decoded = Update::decode_v1(&update)
            .map_err(|e| UpwellError::Crdt(format!("Failed to decode update: {}", e)))?;

        let mut txn = self.doc.transact_mut();
        txn.apply_update(decoded)
            .map_err(|e| UpwellError::Crdt(format!("Failed to apply update: {}", e)))
    }

    fn get_string(&self, map: &MapRef, key: &str) -> Option<String> {
        let txn = self.doc.transact();
        map.get(&txn, key).and_then(|v| v.cast::<String>().ok())
    }

    // ==================== Bundle Identity ====================

    /// Stable identifier of the bundle.
    pub fn id(&self) -> Option<String> {
        self.get_string(&self.meta, ID_KEY)
    }

    /// Id of the current root draft.
    pub fn root_id(&self) -> Option<String> {
        self.get_string(&self.meta, MAIN_KEY)
    }

    /// Make `id` the root. The new root leaves the archived set.
    pub fn set_root_id(&self, id: &str) {
        let is_root = self.root_id().as_deref() == Some(id);
        let was_archived = {
            let txn = self.doc.transact();
            self.archived.contains_key(&txn, id)
        };
        if is_root && !was_archived {
            return;
        }

        let mut txn = self.doc.transact_mut();
        if !is_root {
            self.meta.insert(&mut txn, MAIN_KEY, id.to_string());
        }
        if was_archived {
            self.archived.remove(&mut txn, id);
        }
    }

    // ==================== Authors ====================

    /// Record an author. Re-adding an identical author is a no-op.
    pub fn add_author(&self, author: &Author) {
        if self.get_string(&self.authors, &author.id).as_deref() == Some(author.name.as_str()) {
            return;
        }
        let mut txn = self.doc.transact_mut();
        self.authors
            .insert(&mut txn, author.id.as_str(), author.name.clone());
    }

    /// Look up an author by id.
    pub fn author(&self, id: &str) -> Option<Author> {
        self.get_string(&self.authors, id).map(|name| Author {
            id: id.to_string(),
            name,
        })
    }

    /// All known authors, ordered by id.
    pub fn authors(&self) -> Vec<Author> {
        let txn = self.doc.transact();
        let mut authors: Vec<Author> = self
            .authors
            .iter(&txn)
            .filter_map(|(id, value)| {
                let name = value.cast::<String>().ok()?;
                Some(Author {
                    id: id.to_string(),
                    name,
                })
            })
            .collect();
        authors.sort_by(|a, b| a.id.cmp(&b.id));
        authors
    }

    // ==================== Drafts ====================

    /// Register a draft id. Registering a known id is a no-op.
    pub fn add_draft(&self, id: &str, author_id: &str) {
        if self.has_draft(id) {
            return;
        }
        let entry = DraftEntry {
            author_id: author_id.to_string(),
            created_at: chrono::Utc::now().timestamp_millis(),
        };
        let json = serde_json::to_string(&entry).unwrap_or_default();
        let mut txn = self.doc.transact_mut();
        self.drafts.insert(&mut txn, id, json);
    }

    /// Whether a draft id has ever been registered.
    pub fn has_draft(&self, id: &str) -> bool {
        let txn = self.doc.transact();
        self.drafts.contains_key(&txn, id)
    }

    /// Ledger record of a draft.
    pub fn draft_entry(&self, id: &str) -> Option<DraftEntry> {
        self.get_string(&self.drafts, id)
            .and_then(|json| serde_json::from_str(&json).ok())
    }

    /// All registered draft ids, sorted.
    pub fn draft_ids(&self) -> Vec<String> {
        let txn = self.doc.transact();
        let mut ids: Vec<String> = self.drafts.keys(&txn).map(String::from).collect();
        ids.sort();
        ids
    }

    // ==================== Archive ====================

    /// Mark a draft archived. Returns `false` when it already was.
    pub fn archive(&self, id: &str) -> bool {
        {
            let txn = self.doc.transact();
            if self.archived.contains_key(&txn, id) {
                return false;
            }
        }
        let mut txn = self.doc.transact_mut();
        self.archived.insert(
            &mut txn,
            id,
            chrono::Utc::now().timestamp_millis().to_string(),
        );
        true
    }

    /// Whether a draft is archived.
    ///
    /// The root is never reported archived, even when a concurrent replica
    /// archived it before the two ledgers were merged.
    pub fn is_archived(&self, id: &str) -> bool {
        if self.root_id().as_deref() == Some(id) {
            return false;
        }
        let txn = self.doc.transact();
        self.archived.contains_key(&txn, id)
    }

    /// All archived draft ids (excluding the root), sorted.
    pub fn archived_ids(&self) -> Vec<String> {
        let root = self.root_id();
        let txn = self.doc.transact();
        let mut ids: Vec<String> = self
            .archived
            .keys(&txn)
            .filter(|id| root.as_deref() != Some(*id))
            .map(String::from)
            .collect();
        ids.sort();
        ids
    }
}

impl std::fmt::Debug for MetadataDoc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataDoc")
            .field("id", &self.id())
            .field("root_id", &self.root_id())
            .field("drafts", &self.draft_ids().len())
            .finish_non_exhaustive()
    }
}
