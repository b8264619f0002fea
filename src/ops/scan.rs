use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{IoResultExt, Result};
use crate::hash::{hash_value, Id};
use crate::storage::STATE_FILE;
use crate::types::{Blob, Tree, TreeLine, PATH_SEPARATOR};

/// everything a working-tree scan produced
///
/// the root tree plus every blob and tree encountered on the way, keyed by
/// id and ready for bulk insertion into the object store.
pub struct ScanOutcome {
    pub root_id: Id,
    pub root: Tree,
    pub blobs: BTreeMap<Id, Blob>,
    pub trees: BTreeMap<Id, Tree>,
}

/// hash the working directory into a tree
///
/// recurses depth-first; entries within a directory are sorted by name so
/// identical contents always yield the same tree id. the state file at the
/// root is skipped, nothing else is.
pub fn scan(root: &Path) -> Result<ScanOutcome> {
    let mut blobs = BTreeMap::new();
    let mut trees = BTreeMap::new();
    let (root_id, root_tree) = scan_dir(root, "", &mut blobs, &mut trees)?;
    Ok(ScanOutcome {
        root_id,
        root: root_tree,
        blobs,
        trees,
    })
}

/// scan one directory level (recursive helper)
fn scan_dir(
    dir: &Path,
    prefix: &str,
    blobs: &mut BTreeMap<Id, Blob>,
    trees: &mut BTreeMap<Id, Tree>,
) -> Result<(Id, Tree)> {
    let mut dir_entries: Vec<_> = fs::read_dir(dir)
        .with_path(dir)?
        .collect::<std::io::Result<Vec<_>>>()
        .with_path(dir)?;
    dir_entries.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let mut lines = Vec::new();
    for entry in dir_entries {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().to_string();

        // the state file is skipped at the root exactly
        if prefix.is_empty() && name == STATE_FILE {
            continue;
        }

        let logical_path = if prefix.is_empty() {
            name
        } else {
            format!("{}{}{}", prefix, PATH_SEPARATOR, name)
        };

        let file_type = entry.file_type().with_path(&path)?;
        if file_type.is_dir() {
            let (sub_id, subtree) = scan_dir(&path, &logical_path, blobs, trees)?;
            lines.push(TreeLine::Subtree {
                id: sub_id,
                tree: subtree,
                path: format!("{}{}", logical_path, PATH_SEPARATOR),
            });
        } else {
            let content = fs::read_to_string(&path).with_path(&path)?;
            let blob = Blob::new(content);
            let id = hash_value(&blob)?;
            blobs.insert(id, blob.clone());
            lines.push(TreeLine::Blob {
                id,
                blob,
                path: logical_path,
            });
        }
    }

    let tree = Tree::new(lines);
    let id = hash_value(&tree)?;
    trees.insert(id, tree.clone());
    Ok((id, tree))
}
