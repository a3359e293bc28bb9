//! A bundle of drafts of one logical document.
//!
//! An [`Upwell`] owns every draft of a document plus the metadata ledger
//! that says which draft is the root (the canonical version) and which
//! drafts are archived. Drafts fork from the root, get promoted to root, and
//! two replicas of the same bundle reconcile with [`Upwell::merge`].
//!
//! # Example
//!
//! ```ignore
//! use upwell_core::{Author, Upwell, UpwellOptions};
//!
//! let ada = Author { id: "a1".into(), name: "Ada".into() };
//! let mut upwell = Upwell::create(UpwellOptions::with_author(ada))?;
//!
//! let draft_id = upwell.create_draft(Some("edit"))?.id().to_string();
//! upwell.get(&draft_id)?.insert_at(0, "Hello");
//! upwell.set_root(&draft_id)?;
//! ```

use std::sync::OnceLock;

use indexmap::IndexMap;

use crate::author::{Author, UNKNOWN_AUTHOR};
use crate::crdt::{Heads, MetadataDoc};
use crate::draft::{Draft, DraftId};
use crate::error::{Result, UpwellError};
use crate::history::History;
use crate::names::random_dessert;

/// Id of the first draft of every bundle.
pub const SPECIAL_ROOT_DOCUMENT: &str = "UPWELL_ROOT@@@";

/// Options for [`Upwell::create`].
#[derive(Debug, Clone, Default)]
pub struct UpwellOptions {
    /// Bundle id; a new one is generated when absent
    pub id: Option<String>,

    /// Creating author; [`UNKNOWN_AUTHOR`] when absent
    pub author: Option<Author>,
}

impl UpwellOptions {
    pub fn with_author(author: Author) -> Self {
        Self {
            id: None,
            author: Some(author),
        }
    }
}

/// A draft as held by a bundle: decoded, or still the raw bytes it was
/// loaded from.
///
/// Archived drafts stay raw after loading because decoding them is only
/// needed to walk history. A raw slot decodes at most once and caches the
/// result. The original bytes are written back out unless the cached draft
/// was edited after decoding.
pub(crate) enum DraftSlot {
    Hydrated(Draft),
    Raw {
        bytes: Vec<u8>,
        cache: OnceLock<Decoded>,
    },
}

/// A lazily decoded draft and its heads at decode time.
pub(crate) struct Decoded {
    draft: Draft,
    loaded_heads: Heads,
}

impl DraftSlot {
    pub(crate) fn raw(bytes: Vec<u8>) -> Self {
        DraftSlot::Raw {
            bytes,
            cache: OnceLock::new(),
        }
    }

    /// Borrow the decoded draft, decoding raw bytes on first use.
    fn resolve(&self, id: &str) -> Result<&Draft> {
        match self {
            DraftSlot::Hydrated(draft) => Ok(draft),
            DraftSlot::Raw { bytes, cache } => {
                if let Some(decoded) = cache.get() {
                    return Ok(&decoded.draft);
                }
                let draft = Draft::load(id, bytes)?;
                let loaded_heads = draft.heads();
                let decoded = cache.get_or_init(|| Decoded {
                    draft,
                    loaded_heads,
                });
                Ok(&decoded.draft)
            }
        }
    }

    /// Take ownership of the decoded draft.
    fn into_draft(self, id: &str) -> Result<Draft> {
        match self {
            DraftSlot::Hydrated(draft) => Ok(draft),
            DraftSlot::Raw { bytes, cache } => match cache.into_inner() {
                Some(decoded) => Ok(decoded.draft),
                None => Draft::load(id, &bytes),
            },
        }
    }

    /// Bytes to persist for this slot.
    pub(crate) fn encode(&self) -> Vec<u8> {
        match self {
            DraftSlot::Hydrated(draft) => draft.save(),
            DraftSlot::Raw { bytes, cache } => match cache.get() {
                Some(decoded) if decoded.draft.heads() != decoded.loaded_heads => {
                    decoded.draft.save()
                }
                _ => bytes.clone(),
            },
        }
    }
}

/// Result of looking a draft id up in a bundle.
pub(crate) enum Lookup<'a> {
    /// Decoded draft
    Found(&'a Draft),

    /// Known, but only as raw bytes
    Stale(&'a [u8]),

    NotFound,
}

/// Incoming draft waiting to be applied by [`Upwell::merge`].
enum PendingMerge {
    Adopt(DraftSlot),
    Merge(Draft),
}

/// A bundle: every draft of a document plus its metadata ledger.
pub struct Upwell {
    pub(crate) drafts: IndexMap<DraftId, DraftSlot>,
    pub(crate) metadata: MetadataDoc,
    author: Author,
}

impl Upwell {
    /// Wrap a ledger, registering `author` in it.
    pub(crate) fn new(metadata: MetadataDoc, author: Author) -> Self {
        metadata.add_author(&author);
        Self {
            drafts: IndexMap::new(),
            metadata,
            author,
        }
    }

    /// Create a new bundle: an empty root draft plus one working draft.
    pub fn create(options: UpwellOptions) -> Result<Self> {
        let id = options
            .id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let author = options.author.unwrap_or_else(|| UNKNOWN_AUTHOR.clone());

        let mut upwell = Self::new(MetadataDoc::create(&id), author);
        let root = Draft::create(SPECIAL_ROOT_DOCUMENT, &upwell.author.id);
        upwell.add(root);
        upwell.metadata.set_root_id(SPECIAL_ROOT_DOCUMENT);

        upwell.create_draft(None)?;
        log::debug!("created upwell {}", id);
        Ok(upwell)
    }

    /// Stable identifier of the bundle.
    pub fn id(&self) -> String {
        self.metadata.id().unwrap_or_default()
    }

    /// Author performing local operations.
    pub fn author(&self) -> &Author {
        &self.author
    }

    pub fn metadata(&self) -> &MetadataDoc {
        &self.metadata
    }

    // ==================== Authors ====================

    pub fn authors(&self) -> Vec<Author> {
        self.metadata.authors()
    }

    pub fn author_name(&self, author_id: &str) -> Option<String> {
        self.metadata.author(author_id).map(|author| author.name)
    }

    // ==================== Lookup ====================

    /// Get a draft, decoding it from archived bytes if needed.
    pub fn get(&self, id: &str) -> Result<&Draft> {
        self.drafts
            .get(id)
            .ok_or_else(|| UpwellError::DraftNotFound(id.to_string()))?
            .resolve(id)
    }

    /// Get a draft for editing. Archived bytes are decoded and the slot
    /// keeps the decoded draft from then on.
    pub fn get_mut(&mut self, id: &str) -> Result<&mut Draft> {
        self.hydrate(id)?;
        match self.drafts.get_mut(id) {
            Some(DraftSlot::Hydrated(draft)) => Ok(draft),
            _ => Err(UpwellError::DraftNotFound(id.to_string())),
        }
    }

    fn hydrate(&mut self, id: &str) -> Result<()> {
        let slot = self
            .drafts
            .get_mut(id)
            .ok_or_else(|| UpwellError::DraftNotFound(id.to_string()))?;
        if let DraftSlot::Raw { bytes, cache } = &mut *slot {
            let draft = match cache.take() {
                Some(decoded) => decoded.draft,
                None => Draft::load(id, bytes)?,
            };
            *slot = DraftSlot::Hydrated(draft);
        }
        Ok(())
    }

    pub(crate) fn lookup(&self, id: &str) -> Lookup<'_> {
        match self.drafts.get(id) {
            Some(DraftSlot::Hydrated(draft)) => Lookup::Found(draft),
            Some(DraftSlot::Raw { bytes, .. }) => Lookup::Stale(bytes),
            None => Lookup::NotFound,
        }
    }

    /// Whether a draft is held by this bundle, decoded or not.
    pub fn contains(&self, id: &str) -> bool {
        self.drafts.contains_key(id)
    }

    /// Every draft id held by this bundle, in insertion order.
    pub fn draft_ids(&self) -> Vec<DraftId> {
        self.drafts.keys().cloned().collect()
    }

    // ==================== Root ====================

    pub fn root_id(&self) -> DraftId {
        self.metadata.root_id().unwrap_or_default()
    }

    pub fn root_draft(&self) -> Result<&Draft> {
        self.get(&self.root_id())
    }

    /// Promote a draft to root. The previous root is archived.
    pub fn set_root(&mut self, id: &str) -> Result<()> {
        if !self.contains(id) {
            return Err(UpwellError::DraftNotFound(id.to_string()));
        }
        let previous = self.root_id();
        if previous == id {
            log::debug!("{} is already root", id);
            return Ok(());
        }

        self.hydrate(id)?;
        if !self.metadata.archive(&previous) {
            log::debug!("previous root {} already archived", previous);
        }
        self.metadata.set_root_id(id);
        log::info!("promoted {} to root of {} (was {})", id, self.id(), previous);
        Ok(())
    }

    /// Merge the current root into a draft so it picks up canonical changes,
    /// then re-parent it onto that root. The draft keeps its own message.
    pub fn update_to_root(&mut self, id: &str) -> Result<()> {
        let root_id = self.root_id();
        if root_id == id {
            return Ok(());
        }
        self.hydrate(&root_id)?;
        self.hydrate(id)?;

        let root = self.get(&root_id)?;
        let draft = self.get(id)?;
        draft.merge(root)?;
        draft.set_parent_id(&root_id);

        self.metadata.add_draft(id, &draft.author_id());
        Ok(())
    }

    // ==================== Drafts ====================

    /// Add a draft to the bundle (replacing one with the same id) and
    /// register it in the ledger.
    pub fn add(&mut self, draft: Draft) {
        self.metadata.add_draft(draft.id(), &draft.author_id());
        self.drafts
            .insert(draft.id().to_string(), DraftSlot::Hydrated(draft));
    }

    /// Fork a new draft from the current root.
    ///
    /// Without a message, the draft gets a random placeholder name.
    pub fn create_draft(&mut self, message: Option<&str>) -> Result<&Draft> {
        let message = match message {
            Some(message) => message.to_string(),
            None => random_dessert(),
        };
        let id = uuid::Uuid::new_v4().to_string();
        let draft = self
            .root_draft()?
            .fork(&id, &message, &self.author.id)?;
        self.add(draft);
        self.get(&id)
    }

    /// Drafts that are neither archived nor the root, in insertion order.
    pub fn active_drafts(&self) -> Vec<&Draft> {
        let root_id = self.root_id();
        self.drafts
            .iter()
            .filter(|(id, _)| **id != root_id && !self.metadata.is_archived(id))
            .filter_map(|(id, slot)| match slot.resolve(id) {
                Ok(draft) => Some(draft),
                Err(e) => {
                    log::warn!("skipping undecodable draft {}: {}", id, e);
                    None
                }
            })
            .collect()
    }

    pub fn is_archived(&self, id: &str) -> bool {
        self.metadata.is_archived(id)
    }

    /// Archive a draft. Archiving an archived draft does nothing.
    pub fn archive(&mut self, id: &str) -> Result<()> {
        if !self.contains(id) {
            return Err(UpwellError::DraftNotFound(id.to_string()));
        }
        if self.root_id() == id {
            return Err(UpwellError::ArchiveRoot(id.to_string()));
        }
        if !self.metadata.archive(id) {
            log::debug!("skipping {}: already archived", id);
        }
        Ok(())
    }

    /// Mark a draft shared.
    pub fn share(&mut self, id: &str) -> Result<()> {
        self.get_mut(id)?.share();
        Ok(())
    }

    /// Chain of root promotions, newest first.
    pub fn history(&self) -> History<'_> {
        History::new(self)
    }

    // ==================== Merge ====================

    /// Merge another replica of this bundle into this one.
    ///
    /// Drafts unknown here are moved in as-is. Drafts known on both sides are
    /// merged only when their heads differ. The ledgers are reconciled the
    /// same way. Returns whether anything here actually changed, so merging
    /// the same replica twice reports `false` the second time.
    ///
    /// Everything that needs decoding is decoded before the first mutation:
    /// on error this bundle is left as it was. Replicas of a different bundle
    /// are rejected with [`UpwellError::BundleMismatch`].
    ///
    /// Loading a bundle registers the loading author in its ledger. A replica
    /// loaded by an author this bundle doesn't know yet therefore counts as a
    /// change even when nobody edited anything.
    pub fn merge(&mut self, other: Upwell) -> Result<bool> {
        let (ours, theirs) = (self.id(), other.id());
        if ours != theirs {
            return Err(UpwellError::BundleMismatch {
                expected: ours,
                found: theirs,
            });
        }

        let Upwell {
            drafts: incoming,
            metadata: theirs,
            ..
        } = other;

        let mut pending = Vec::with_capacity(incoming.len());
        for (id, slot) in incoming {
            match self.lookup(&id) {
                Lookup::NotFound => pending.push((id, PendingMerge::Adopt(slot))),
                Lookup::Stale(ours) => {
                    if let DraftSlot::Raw { bytes, .. } = &slot
                        && bytes.as_slice() == ours
                    {
                        continue;
                    }
                    let draft = slot.into_draft(&id)?;
                    pending.push((id, PendingMerge::Merge(draft)));
                }
                Lookup::Found(_) => {
                    let draft = slot.into_draft(&id)?;
                    pending.push((id, PendingMerge::Merge(draft)));
                }
            }
        }
        for (id, item) in &pending {
            if let PendingMerge::Merge(_) = item {
                self.hydrate(id)?;
            }
        }

        let mut changed = false;
        for (id, item) in pending {
            match item {
                PendingMerge::Adopt(slot) => {
                    log::debug!("adopting draft {}", id);
                    self.drafts.insert(id, slot);
                    changed = true;
                }
                PendingMerge::Merge(draft) => {
                    let existing = self.get(&id)?;
                    let before = existing.heads();
                    if before == draft.heads() {
                        continue;
                    }
                    existing.merge(&draft)?;
                    changed |= existing.heads() != before;
                }
            }
        }

        let before = self.metadata.heads();
        if before != theirs.heads() {
            self.metadata.merge(&theirs)?;
            changed |= self.metadata.heads() != before;
        }

        if changed {
            log::info!("merged incoming changes into {}", self.id());
        }
        Ok(changed)
    }
}

impl std::fmt::Debug for Upwell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Upwell")
            .field("id", &self.id())
            .field("root_id", &self.root_id())
            .field("drafts", &self.drafts.len())
            .field("author", &self.author)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ada, copy_of, with_entry_replaced};

    fn active_ids(upwell: &Upwell) -> Vec<String> {
        upwell
            .active_drafts()
            .iter()
            .map(|d| d.id().to_string())
            .collect()
    }

    #[test]
    fn test_create_has_root_and_one_draft() {
        let upwell = Upwell::create(UpwellOptions::with_author(ada())).unwrap();

        assert_eq!(upwell.root_id(), SPECIAL_ROOT_DOCUMENT);
        assert_eq!(upwell.active_drafts().len(), 1);
        assert!(!upwell.is_archived(SPECIAL_ROOT_DOCUMENT));

        let root = upwell.root_draft().unwrap();
        assert_eq!(root.parent_id(), root.id());
        assert_eq!(upwell.author_name("a1"), Some("Ada".to_string()));

        let draft = upwell.active_drafts()[0];
        assert_eq!(draft.parent_id(), SPECIAL_ROOT_DOCUMENT);
        assert!(!draft.message().is_empty());
    }

    #[test]
    fn test_create_uses_given_id_or_generates_one() {
        let named = Upwell::create(UpwellOptions {
            id: Some("doc-1".to_string()),
            author: None,
        })
        .unwrap();
        assert_eq!(named.id(), "doc-1");
        assert_eq!(named.author().name, "Anonymous");

        let generated = Upwell::create(UpwellOptions::default()).unwrap();
        assert!(!generated.id().is_empty());
        assert_ne!(generated.id(), named.id());
    }

    #[test]
    fn test_concrete_scenario() {
        let mut upwell = Upwell::create(UpwellOptions::with_author(ada())).unwrap();
        let r0 = upwell.root_id();
        let d0 = upwell.active_drafts()[0].id().to_string();
        assert_eq!(upwell.active_drafts().len(), 1);

        let d1 = upwell.create_draft(Some("edit")).unwrap();
        let d1_id = d1.id().to_string();
        assert_eq!(d1.parent_id(), r0);
        assert_eq!(d1.message(), "edit");
        assert_eq!(upwell.active_drafts().len(), 2);

        upwell.archive(&d0).unwrap();
        assert_eq!(upwell.active_drafts().len(), 1);

        upwell.set_root(&d1_id).unwrap();
        assert!(upwell.is_archived(&r0));
        assert_eq!(upwell.root_id(), d1_id);
        assert!(upwell.active_drafts().is_empty());
    }

    #[test]
    fn test_fork_then_promote_keeps_active_count() {
        let mut upwell = Upwell::create(UpwellOptions::with_author(ada())).unwrap();
        let before = upwell.active_drafts().len();

        let id = upwell.create_draft(None).unwrap().id().to_string();
        upwell.set_root(&id).unwrap();

        assert_eq!(upwell.active_drafts().len(), before);
    }

    #[test]
    fn test_archive_twice_is_same_as_once() {
        let mut upwell = Upwell::create(UpwellOptions::with_author(ada())).unwrap();
        let id = upwell.active_drafts()[0].id().to_string();

        upwell.archive(&id).unwrap();
        let heads = upwell.metadata().heads();
        upwell.archive(&id).unwrap();

        assert_eq!(upwell.metadata().heads(), heads);
        assert!(upwell.is_archived(&id));
    }

    #[test]
    fn test_archive_unknown_and_root() {
        let mut upwell = Upwell::create(UpwellOptions::with_author(ada())).unwrap();

        let err = upwell.archive("nope").unwrap_err();
        assert!(matches!(err, UpwellError::DraftNotFound(_)));

        let root = upwell.root_id();
        let err = upwell.archive(&root).unwrap_err();
        assert!(matches!(err, UpwellError::ArchiveRoot(_)));
        assert!(!upwell.is_archived(&root));
    }

    #[test]
    fn test_promote_unknown_draft_fails() {
        let mut upwell = Upwell::create(UpwellOptions::with_author(ada())).unwrap();
        assert!(matches!(
            upwell.set_root("nope"),
            Err(UpwellError::DraftNotFound(_))
        ));
        assert_eq!(upwell.root_id(), SPECIAL_ROOT_DOCUMENT);
    }

    #[test]
    fn test_promote_archived_draft_restores_it() {
        let mut upwell = Upwell::create(UpwellOptions::with_author(ada())).unwrap();
        let d0 = upwell.active_drafts()[0].id().to_string();
        upwell.set_root(&d0).unwrap();

        // promoting the old root back archives d0 and un-archives the old root
        upwell.set_root(SPECIAL_ROOT_DOCUMENT).unwrap();
        assert_eq!(upwell.root_id(), SPECIAL_ROOT_DOCUMENT);
        assert!(!upwell.is_archived(SPECIAL_ROOT_DOCUMENT));
        assert!(upwell.is_archived(&d0));
    }

    #[test]
    fn test_share_is_idempotent_and_keeps_archive_state() {
        let mut upwell = Upwell::create(UpwellOptions::with_author(ada())).unwrap();
        let id = upwell.active_drafts()[0].id().to_string();

        upwell.share(&id).unwrap();
        upwell.share(&id).unwrap();

        assert!(upwell.get(&id).unwrap().shared());
        assert!(!upwell.is_archived(&id));
        assert!(matches!(
            upwell.share("nope"),
            Err(UpwellError::DraftNotFound(_))
        ));
    }

    #[test]
    fn test_shared_count_stable_across_forks() {
        let mut upwell = Upwell::create(UpwellOptions::with_author(ada())).unwrap();
        let first = upwell.create_draft(None).unwrap().id().to_string();
        upwell.share(&first).unwrap();
        upwell.create_draft(None).unwrap();
        let second = upwell.create_draft(None).unwrap().id().to_string();
        upwell.share(&second).unwrap();
        upwell.create_draft(None).unwrap();

        let shared = upwell.active_drafts().iter().filter(|d| d.shared()).count();
        assert_eq!(shared, 2);
    }

    #[test]
    fn test_get_unknown_is_not_found() {
        let upwell = Upwell::create(UpwellOptions::with_author(ada())).unwrap();
        let err = upwell.get("mystery").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_update_to_root_rebases_and_keeps_message() {
        let mut upwell = Upwell::create(UpwellOptions::with_author(ada())).unwrap();
        let first = upwell.active_drafts()[0].id().to_string();
        upwell.get(&first).unwrap().insert_at(0, "Hello");

        let long_lived = upwell.create_draft(Some("long lived")).unwrap().id().to_string();
        upwell.get(&long_lived).unwrap().insert_at(0, "Notes. ");

        upwell.set_root(&first).unwrap();
        upwell.update_to_root(&long_lived).unwrap();

        let draft = upwell.get(&long_lived).unwrap();
        assert_eq!(draft.message(), "long lived");
        assert_eq!(draft.parent_id(), first);
        assert!(draft.text().contains("Hello"));
        assert!(draft.text().contains("Notes. "));
        // the root itself is untouched
        assert_eq!(upwell.root_draft().unwrap().text(), "Hello");
    }

    #[test]
    fn test_merge_identical_copy_is_unchanged() {
        let upwell = Upwell::create(UpwellOptions::with_author(ada())).unwrap();
        let mut local = copy_of(&upwell);
        assert!(!local.merge(copy_of(&upwell)).unwrap());
    }

    #[test]
    fn test_merge_adds_unknown_drafts() {
        let base = Upwell::create(UpwellOptions::with_author(ada())).unwrap();
        let mut local = copy_of(&base);
        let mut remote = copy_of(&base);

        let new_id = remote.create_draft(Some("remote")).unwrap().id().to_string();

        assert!(local.merge(remote).unwrap());
        assert_eq!(local.get(&new_id).unwrap().message(), "remote");
        assert!(local.metadata().has_draft(&new_id));
        assert_eq!(local.active_drafts().len(), 2);
    }

    #[test]
    fn test_merge_twice_reports_unchanged_second_time() {
        let base = Upwell::create(UpwellOptions::with_author(ada())).unwrap();
        let mut local = copy_of(&base);
        let remote = copy_of(&base);
        let id = base.active_drafts()[0].id().to_string();

        local.get(&id).unwrap().insert_at(0, "local ");
        remote.get(&id).unwrap().insert_at(0, "remote ");

        assert!(local.merge(copy_of(&remote)).unwrap());
        assert!(!local.merge(copy_of(&remote)).unwrap());
    }

    #[test]
    fn test_edits_to_lazily_decoded_draft_are_saved() {
        let mut upwell = Upwell::create(UpwellOptions::with_author(ada())).unwrap();
        let d0 = upwell.active_drafts()[0].id().to_string();
        upwell.archive(&d0).unwrap();

        let loaded = copy_of(&upwell);
        assert!(matches!(loaded.lookup(&d0), Lookup::Stale(_)));
        loaded.get(&d0).unwrap().insert_at(0, "edit");

        let reloaded = copy_of(&loaded);
        assert_eq!(reloaded.get(&d0).unwrap().text(), "edit");
    }

    #[test]
    fn test_promoting_archived_draft_after_reload_keeps_edits() {
        let mut upwell = Upwell::create(UpwellOptions::with_author(ada())).unwrap();
        let d0 = upwell.active_drafts()[0].id().to_string();
        upwell.set_root(&d0).unwrap();

        let mut loaded = copy_of(&upwell);
        assert!(matches!(loaded.lookup(SPECIAL_ROOT_DOCUMENT), Lookup::Stale(_)));
        loaded.set_root(SPECIAL_ROOT_DOCUMENT).unwrap();
        assert!(matches!(loaded.lookup(SPECIAL_ROOT_DOCUMENT), Lookup::Found(_)));
        loaded.root_draft().unwrap().insert_at(0, "canonical");

        let reloaded = copy_of(&loaded);
        assert_eq!(reloaded.root_id(), SPECIAL_ROOT_DOCUMENT);
        assert_eq!(reloaded.root_draft().unwrap().text(), "canonical");
    }

    #[test]
    fn test_merge_rejects_other_bundle() {
        let mut first = Upwell::create(UpwellOptions {
            id: Some("doc-a".to_string()),
            author: Some(ada()),
        })
        .unwrap();
        let second = Upwell::create(UpwellOptions {
            id: Some("doc-b".to_string()),
            author: Some(ada()),
        })
        .unwrap();
        let drafts = first.draft_ids();

        let err = first.merge(second).unwrap_err();
        assert!(matches!(
            err,
            UpwellError::BundleMismatch { ref expected, ref found }
                if expected == "doc-a" && found == "doc-b"
        ));
        assert_eq!(first.draft_ids(), drafts);
        assert_eq!(first.id(), "doc-a");
    }

    #[test]
    fn test_failed_merge_leaves_bundle_untouched() {
        let mut local = Upwell::create(UpwellOptions::with_author(ada())).unwrap();
        let d0 = local.active_drafts()[0].id().to_string();
        local.get(&d0).unwrap().insert_at(0, "kept");
        local.archive(&d0).unwrap();

        let corrupt = with_entry_replaced(
            &local.to_bytes().unwrap(),
            &format!("{}.draft", d0),
            &[0xff, 0xff, 0xff],
        );
        let mut remote = Upwell::from_bytes(&corrupt, ada()).unwrap();
        let extra = remote.create_draft(Some("extra")).unwrap().id().to_string();

        let drafts = local.draft_ids();
        let ledger = local.metadata().heads();
        let content = local.get(&d0).unwrap().heads();

        assert!(local.merge(remote).is_err());
        assert_eq!(local.draft_ids(), drafts);
        assert!(!local.contains(&extra));
        assert_eq!(local.metadata().heads(), ledger);
        assert_eq!(local.get(&d0).unwrap().heads(), content);
        assert_eq!(local.get(&d0).unwrap().text(), "kept");
    }

    #[test]
    fn test_merge_copy_loaded_by_new_author_reports_change() {
        let mut local = Upwell::create(UpwellOptions::with_author(ada())).unwrap();
        let grace = Upwell::from_bytes(&local.to_bytes().unwrap(), Author::new("Grace")).unwrap();

        assert!(local.merge(grace).unwrap());
        assert_eq!(local.authors().len(), 2);
        assert!(!local.merge(copy_of(&local)).unwrap());
    }

    #[test]
    fn test_merge_brings_archival_and_authors() {
        let base = Upwell::create(UpwellOptions::with_author(ada())).unwrap();
        let mut local = copy_of(&base);
        let mut remote = Upwell::from_bytes(&base.to_bytes().unwrap(), Author::new("Grace")).unwrap();
        let id = base.active_drafts()[0].id().to_string();

        remote.archive(&id).unwrap();
        assert!(local.merge(remote).unwrap());

        assert!(local.is_archived(&id));
        assert!(local.authors().iter().any(|a| a.name == "Grace"));
    }
}
