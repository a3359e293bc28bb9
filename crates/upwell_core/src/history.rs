//! Walk the chain of root promotions.
//!
//! Starting at the current root and following each draft's parent link
//! yields the sequence of drafts that were canonical before it, newest first.
//! The first draft of a bundle is its own parent, which ends the chain.

use std::collections::HashSet;

use crate::draft::Draft;
use crate::error::{Result, UpwellError};
use crate::upwell::Upwell;

/// Restartable view over a bundle's root history.
pub struct History<'a> {
    upwell: &'a Upwell,
}

impl<'a> History<'a> {
    pub(crate) fn new(upwell: &'a Upwell) -> Self {
        Self { upwell }
    }

    /// Iterate from the current root back to the first draft.
    ///
    /// Archived drafts are decoded on demand; an undecodable or missing
    /// ancestor is yielded as an error and ends the walk.
    pub fn iter(&self) -> HistoryIter<'a> {
        HistoryIter {
            upwell: self.upwell,
            next: Some(self.upwell.root_id()),
            seen: HashSet::new(),
        }
    }

    /// The `n`-th entry, where 0 is the current root.
    pub fn get(&self, n: usize) -> Result<&'a Draft> {
        let mut len = 0;
        for (i, draft) in self.iter().enumerate() {
            let draft = draft?;
            if i == n {
                return Ok(draft);
            }
            len = i + 1;
        }
        Err(UpwellError::HistoryOutOfRange { index: n, len })
    }

    /// Number of drafts in the chain.
    pub fn len(&self) -> usize {
        self.iter().take_while(|d| d.is_ok()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Iterator returned by [`History::iter`].
pub struct HistoryIter<'a> {
    upwell: &'a Upwell,
    next: Option<String>,
    seen: HashSet<String>,
}

impl<'a> Iterator for HistoryIter<'a> {
    type Item = Result<&'a Draft>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next.take()?;
        if !self.seen.insert(id.clone()) {
            log::warn!("parent chain loops back to {}; stopping history", id);
            return None;
        }

        let draft = match self.upwell.get(&id) {
            Ok(draft) => draft,
            Err(e) => return Some(Err(e)),
        };
        let parent = draft.parent_id();
        if parent != id {
            self.next = Some(parent);
        }
        Some(Ok(draft))
    }
}
