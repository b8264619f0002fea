use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::hash::Id;
use crate::types::{Blob, Commit, Tree, TreeLine};

/// three disjoint content-addressed mappings
///
/// insertion is idempotent: a key that already maps silently rejects the
/// write (content is identical by construction). values are immutable once
/// inserted; removal only happens through gc. BTreeMap keeps serialization
/// deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectStore {
    pub blobs: BTreeMap<Id, Blob>,
    pub trees: BTreeMap<Id, Tree>,
    pub commits: BTreeMap<Id, Commit>,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_blob(&mut self, id: Id, blob: Blob) {
        self.blobs.entry(id).or_insert(blob);
    }

    pub fn insert_tree(&mut self, id: Id, tree: Tree) {
        self.trees.entry(id).or_insert(tree);
    }

    pub fn insert_commit(&mut self, id: Id, commit: Commit) {
        self.commits.entry(id).or_insert(commit);
    }

    /// insert a tree together with every blob and subtree it embeds
    pub fn insert_tree_deep(&mut self, id: Id, tree: &Tree) {
        tree.walk(&mut |line| match line {
            TreeLine::Blob { id, blob, .. } => {
                self.blobs.entry(*id).or_insert_with(|| blob.clone());
            }
            TreeLine::Subtree { id, tree, .. } => {
                self.trees.entry(*id).or_insert_with(|| tree.clone());
            }
        });
        self.insert_tree(id, tree.clone());
    }
}
