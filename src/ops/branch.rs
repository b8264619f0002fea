use std::fmt::Write;

use crate::error::{Error, Result};
use crate::hash::Id;
use crate::ops::checkout::reset;
use crate::refs::{Branch, Head};
use crate::repo::Repository;

/// create a branch at the given commit and switch to it
///
/// `at` is usually the resolved HEAD; None forks an empty branch from an
/// empty one. the working directory is reset to `at` when present.
pub fn create_branch(repo: &mut Repository, name: &str, at: Option<Id>) -> Result<()> {
    if repo.storage.branches.contains_key(name) {
        return Err(Error::BranchExists(name.to_string()));
    }
    if let Some(id) = at {
        if !repo.storage.objects.commits.contains_key(&id) {
            return Err(Error::UnknownRef(id.to_hex()));
        }
    }

    repo.storage.branches.insert(name.to_string(), Branch::at(at));
    if let Some(id) = at {
        reset(repo, &id)?;
    }
    repo.storage.head = Head::attached(name);
    Ok(())
}

/// delete a branch
pub fn delete_branch(repo: &mut Repository, name: &str) -> Result<()> {
    if repo.storage.head.is_attached_to(name) {
        return Err(Error::BranchCheckedOut(name.to_string()));
    }
    repo.storage
        .branches
        .remove(name)
        .ok_or_else(|| Error::UnknownRef(name.to_string()))?;
    Ok(())
}

/// list branch names ascending, current branch marked
///
/// a detached HEAD is reported on its own line first.
pub fn list_branches(repo: &Repository) -> String {
    let mut out = String::new();

    if let Head::Detached { id } = &repo.storage.head {
        let _ = writeln!(out, "* (HEAD detached at {})", id.short());
    }

    for name in repo.storage.branches.keys() {
        let marker = if repo.storage.head.is_attached_to(name) {
            '*'
        } else {
            ' '
        };
        let _ = writeln!(out, "{} {}", marker, name);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::commit::commit;
    use std::fs;
    use tempfile::tempdir;

    fn test_repo() -> (tempfile::TempDir, Repository) {
        let dir = tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        (dir, repo)
    }

    #[test]
    fn test_create_branch_switches_head() {
        let (dir, mut repo) = test_repo();

        fs::write(dir.path().join("a.txt"), "a").unwrap();
        let c1 = commit(&mut repo, "c1", "author", 1).unwrap();

        create_branch(&mut repo, "feature", Some(c1)).unwrap();

        assert_eq!(repo.storage.head, Head::attached("feature"));
        let feature = &repo.storage.branches["feature"];
        assert_eq!(feature.created, Some(c1));
        assert_eq!(feature.tip, Some(c1));
    }

    #[test]
    fn test_create_branch_exists() {
        let (_dir, mut repo) = test_repo();

        let result = create_branch(&mut repo, "master", None);
        assert!(matches!(result, Err(Error::BranchExists(_))));
    }

    #[test]
    fn test_create_branch_unknown_commit() {
        let (_dir, mut repo) = test_repo();

        let result = create_branch(&mut repo, "feature", Some(Id::ZERO));
        assert!(matches!(result, Err(Error::UnknownRef(_))));
    }

    #[test]
    fn test_create_empty_branch_from_empty() {
        let (_dir, mut repo) = test_repo();

        create_branch(&mut repo, "feature", None).unwrap();
        assert_eq!(repo.storage.branches["feature"], Branch::empty());
        assert_eq!(repo.storage.head, Head::attached("feature"));
    }

    #[test]
    fn test_delete_branch_guard() {
        let (_dir, mut repo) = test_repo();

        create_branch(&mut repo, "feature", None).unwrap();

        // back on master, feature can go; master cannot
        repo.storage.head = Head::attached("master");
        delete_branch(&mut repo, "feature").unwrap();
        assert!(!repo.storage.branches.contains_key("feature"));

        let result = delete_branch(&mut repo, "master");
        assert!(matches!(result, Err(Error::BranchCheckedOut(_))));
    }

    #[test]
    fn test_delete_unknown_branch() {
        let (_dir, mut repo) = test_repo();

        let result = delete_branch(&mut repo, "ghost");
        assert!(matches!(result, Err(Error::UnknownRef(_))));
    }

    #[test]
    fn test_list_branches_marks_current() {
        let (_dir, mut repo) = test_repo();

        create_branch(&mut repo, "feature", None).unwrap();
        let listing = list_branches(&repo);
        assert_eq!(listing, "* feature\n  master\n");
    }

    #[test]
    fn test_list_branches_detached() {
        let (dir, mut repo) = test_repo();

        fs::write(dir.path().join("a.txt"), "a").unwrap();
        let c1 = commit(&mut repo, "c1", "author", 1).unwrap();
        repo.storage.head = Head::detached(c1);

        let listing = list_branches(&repo);
        assert!(listing.starts_with(&format!("* (HEAD detached at {})\n", c1.short())));
        assert!(listing.contains("  master\n"));
    }
}
