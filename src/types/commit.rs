use serde::{Deserialize, Serialize};

use crate::hash::Id;
use crate::types::Tree;

/// a snapshot of the working tree at a point in time
///
/// field order is part of the canonical encoding; changing it changes every
/// commit id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// unix timestamp (seconds since epoch)
    pub time: i64,
    /// author identity
    pub author: String,
    /// commit message
    pub message: String,
    /// root tree, embedded in full
    pub tree: Tree,
    /// id of the root tree
    pub tree_id: Id,
    /// parent commit ids (empty for the first commit on a branch, one otherwise)
    pub parents: Vec<Id>,
}

impl Commit {
    pub fn new(
        time: i64,
        author: impl Into<String>,
        message: impl Into<String>,
        tree: Tree,
        tree_id: Id,
        parents: Vec<Id>,
    ) -> Self {
        Self {
            time,
            author: author.into(),
            message: message.into(),
            tree,
            tree_id,
            parents,
        }
    }

    /// is this an initial commit (no parents)
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }
}
