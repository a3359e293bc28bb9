//! Comment threads attached to a draft.
//!
//! Comments are stored as JSON in the draft document. Replies are appended
//! to an ordered list scoped to the parent comment, so the insertion order is
//! the display order of the thread and concurrent replies are all kept.

use crate::crdt::{Comment, CommentState, DraftDoc};
use crate::error::{Result, UpwellError};

/// Access to the comments of one draft.
pub struct Comments<'a> {
    doc: &'a DraftDoc,
}

impl<'a> Comments<'a> {
    pub(crate) fn new(doc: &'a DraftDoc) -> Self {
        Self { doc }
    }

    /// Store a comment, replacing any comment with the same id.
    pub fn insert(&self, comment: &Comment) -> Result<()> {
        let json = serde_json::to_string(comment)?;
        self.doc.set_comment_json(&comment.id, json);
        Ok(())
    }

    /// Get a comment with its children.
    pub fn get(&self, id: &str) -> Result<Comment> {
        let json = self
            .doc
            .comment_json(id)
            .ok_or_else(|| UpwellError::CommentNotFound(id.to_string()))?;
        let mut comment: Comment = serde_json::from_str(&json)?;
        comment.children = self.doc.comment_children(id);
        Ok(comment)
    }

    /// All comments, including replies, ordered by id.
    pub fn list(&self) -> Vec<Comment> {
        let mut ids = self.doc.comment_ids();
        ids.sort();
        ids.iter().filter_map(|id| self.get(id).ok()).collect()
    }

    /// Top-level comments only.
    pub fn threads(&self) -> Vec<Comment> {
        self.list().into_iter().filter(Comment::is_thread).collect()
    }

    /// Add a reply to the end of `parent_id`'s thread.
    pub fn add_child(&self, parent_id: &str, mut child: Comment) -> Result<Comment> {
        if self.doc.comment_json(parent_id).is_none() {
            return Err(UpwellError::CommentNotFound(parent_id.to_string()));
        }
        child.state = CommentState::Child;
        self.insert(&child)?;
        self.doc.push_comment_child(parent_id, &child.id);
        Ok(child)
    }

    /// Resolve a comment.
    pub fn close(&self, id: &str) -> Result<()> {
        self.set_state(id, CommentState::Closed)
    }

    /// Reopen a resolved comment.
    pub fn reopen(&self, id: &str) -> Result<()> {
        self.set_state(id, CommentState::Open)
    }

    fn set_state(&self, id: &str, state: CommentState) -> Result<()> {
        let mut comment = self.get(id)?;
        if comment.state == state {
            return Ok(());
        }
        comment.state = state;
        self.insert(&comment)
    }
}
