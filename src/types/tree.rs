use serde::{Deserialize, Serialize};

use crate::hash::Id;
use crate::types::Blob;

/// path separator used in tree line paths, on every platform
pub const PATH_SEPARATOR: char = '/';

/// one directory level: an ordered sequence of lines
///
/// line order is fixed by the scanner (lexicographic by name within a
/// directory) so that identical directory contents always hash to the same
/// id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    pub lines: Vec<TreeLine>,
}

impl Tree {
    pub fn new(lines: Vec<TreeLine>) -> Self {
        Self { lines }
    }

    /// create an empty tree
    pub fn empty() -> Self {
        Self { lines: vec![] }
    }

    /// number of lines at this level
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// is tree empty
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// visit every line depth-first, recursing into subtrees
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a TreeLine)) {
        for line in &self.lines {
            f(line);
            if let TreeLine::Subtree { tree, .. } = line {
                tree.walk(f);
            }
        }
    }
}

/// a single entry in a tree: either a file or a subdirectory
///
/// lines embed the object they reference. a commit therefore carries its
/// complete snapshot, which is what lets the sync protocol ship commits
/// alone and still deliver a closed object set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeLine {
    /// file content at `path` (relative to the working-directory root)
    Blob { id: Id, blob: Blob, path: String },

    /// subdirectory at `path`; subtree paths end with the separator
    Subtree { id: Id, tree: Tree, path: String },
}

impl TreeLine {
    /// id of the referenced blob or subtree
    pub fn id(&self) -> &Id {
        match self {
            TreeLine::Blob { id, .. } => id,
            TreeLine::Subtree { id, .. } => id,
        }
    }

    /// path of the entry relative to the working-directory root
    pub fn path(&self) -> &str {
        match self {
            TreeLine::Blob { path, .. } => path,
            TreeLine::Subtree { path, .. } => path,
        }
    }

    /// is this a blob line
    pub fn is_blob(&self) -> bool {
        matches!(self, TreeLine::Blob { .. })
    }
}
