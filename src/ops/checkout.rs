use std::fs;

use walkdir::WalkDir;

use crate::error::{Error, IoResultExt, Result};
use crate::hash::Id;
use crate::refs::Head;
use crate::repo::Repository;
use crate::storage::STATE_FILE;
use crate::types::TreeLine;

/// switch HEAD to a branch or commit
///
/// a branch name attaches HEAD to that branch after materializing its tip
/// (a tipless branch is attached without touching the working directory).
/// a commit id equal to some branch's tip attaches to that branch; any
/// other stored id detaches HEAD at that commit.
pub fn checkout(repo: &mut Repository, target: &str) -> Result<()> {
    if repo.storage.branches.contains_key(target) {
        if let Some(tip) = repo.storage.branches[target].tip {
            reset(repo, &tip)?;
        }
        repo.storage.head = Head::attached(target);
        return Ok(());
    }

    let id = Id::from_hex(target).map_err(|_| Error::UnknownRef(target.to_string()))?;
    if !repo.storage.objects.commits.contains_key(&id) {
        return Err(Error::UnknownRef(target.to_string()));
    }

    reset(repo, &id)?;

    let at_tip = repo
        .storage
        .branches
        .iter()
        .find(|(_, branch)| branch.tip == Some(id))
        .map(|(name, _)| name.clone());

    repo.storage.head = match at_tip {
        Some(branch) => Head::attached(branch),
        None => Head::detached(id),
    };
    Ok(())
}

/// materialize a commit into the working directory
///
/// removes every file and directory under the root except the state file,
/// then restores the commit's tree in full: subtree lines create their
/// directories, blob lines write their content at their full relative
/// paths.
pub fn reset(repo: &mut Repository, id: &Id) -> Result<()> {
    let commit = repo
        .storage
        .objects
        .commits
        .get(id)
        .ok_or_else(|| Error::UnknownRef(id.to_hex()))?
        .clone();

    clear_work_dir(repo)?;

    let root = repo.work_dir().to_path_buf();
    let mut failure = None;
    commit.tree.walk(&mut |line| {
        if failure.is_some() {
            return;
        }
        let result = match line {
            TreeLine::Subtree { path, .. } => {
                fs::create_dir_all(root.join(path)).with_path(root.join(path))
            }
            TreeLine::Blob { blob, path, .. } => {
                let target = root.join(path);
                let made = match target.parent() {
                    Some(parent) => fs::create_dir_all(parent).with_path(parent),
                    None => Ok(()),
                };
                made.and_then(|_| fs::write(&target, &blob.content).with_path(&target))
            }
        };
        if let Err(e) = result {
            failure = Some(e);
        }
    });

    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// remove everything under the working directory except the state file
fn clear_work_dir(repo: &Repository) -> Result<()> {
    for entry in WalkDir::new(repo.work_dir()).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| Error::Io {
            path: repo.work_dir().to_path_buf(),
            source: e.into_io_error().unwrap_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::Other, "walkdir error")
            }),
        })?;

        if entry.file_name() == STATE_FILE {
            continue;
        }

        let path = entry.path();
        if entry.file_type().is_dir() {
            fs::remove_dir_all(path).with_path(path)?;
        } else {
            fs::remove_file(path).with_path(path)?;
        }
    }
    Ok(())
}
