use crate::error::Result;
use crate::hash::{hash_value, Id};
use crate::ops::scan::scan;
use crate::repo::Repository;
use crate::types::Commit;

/// commit the working tree
///
/// scans the working directory, inserts every produced blob and tree, then
/// records a commit whose parent is the resolved HEAD (none if the current
/// branch has no tip) and advances the current reference. never fails on an
/// unchanged tree; every invocation yields a new commit.
pub fn commit(repo: &mut Repository, message: &str, author: &str, time: i64) -> Result<Id> {
    let scanned = scan(repo.work_dir())?;

    for (id, blob) in scanned.blobs {
        repo.storage.objects.insert_blob(id, blob);
    }
    for (id, tree) in scanned.trees {
        repo.storage.objects.insert_tree(id, tree);
    }

    let parents: Vec<Id> = repo.resolve_head().into_iter().collect();
    let commit = Commit::new(time, author, message, scanned.root, scanned.root_id, parents);

    let id = hash_value(&commit)?;
    repo.storage.objects.insert_commit(id, commit);
    repo.advance_head(id)?;

    tracing::debug!(id = %id, "created commit");
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refs::Head;
    use std::fs;
    use tempfile::tempdir;

    fn test_repo() -> (tempfile::TempDir, Repository) {
        let dir = tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        (dir, repo)
    }

    #[test]
    fn test_linear_history() {
        let (dir, mut repo) = test_repo();

        fs::write(dir.path().join("a.txt"), "hello").unwrap();
        let c1 = commit(&mut repo, "c1", "author", 1).unwrap();

        fs::write(dir.path().join("a.txt"), "hello world").unwrap();
        let c2 = commit(&mut repo, "c2", "author", 2).unwrap();

        assert_eq!(repo.storage.branches["master"].tip, Some(c2));
        assert_eq!(repo.storage.objects.commits[&c2].parents, vec![c1]);
        assert!(repo.storage.objects.commits[&c1].parents.is_empty());
    }

    #[test]
    fn test_commit_on_empty_repository() {
        let (_dir, mut repo) = test_repo();

        let id = commit(&mut repo, "empty", "author", 1).unwrap();

        let c = &repo.storage.objects.commits[&id];
        assert!(c.parents.is_empty());
        assert!(c.tree.is_empty());
        assert_eq!(repo.storage.branches["master"].tip, Some(id));
    }

    #[test]
    fn test_commit_detached_moves_head_only() {
        let (dir, mut repo) = test_repo();

        fs::write(dir.path().join("a.txt"), "v1").unwrap();
        let c1 = commit(&mut repo, "c1", "author", 1).unwrap();

        repo.storage.head = Head::detached(c1);
        fs::write(dir.path().join("a.txt"), "v2").unwrap();
        let c2 = commit(&mut repo, "c2", "author", 2).unwrap();

        assert_eq!(repo.storage.head, Head::detached(c2));
        // branch set unchanged
        assert_eq!(repo.storage.branches["master"].tip, Some(c1));
        assert_eq!(repo.storage.objects.commits[&c2].parents, vec![c1]);
    }

    #[test]
    fn test_commit_ids_match_content() {
        let (dir, mut repo) = test_repo();

        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/f.txt"), "f").unwrap();
        let id = commit(&mut repo, "m", "author", 1).unwrap();

        let c = &repo.storage.objects.commits[&id];
        assert_eq!(id, hash_value(c).unwrap());
        assert_eq!(c.tree_id, hash_value(&c.tree).unwrap());
        assert!(repo.storage.objects.trees.contains_key(&c.tree_id));

        // closure holds after a commit
        repo.storage.validate().unwrap();
    }

    #[test]
    fn test_unchanged_tree_still_commits() {
        let (dir, mut repo) = test_repo();

        fs::write(dir.path().join("a.txt"), "same").unwrap();
        let c1 = commit(&mut repo, "first", "author", 1).unwrap();
        let c2 = commit(&mut repo, "second", "author", 2).unwrap();

        assert_ne!(c1, c2);
        assert_eq!(repo.storage.objects.commits[&c2].parents, vec![c1]);
        // identical tree content is stored once
        assert_eq!(
            repo.storage.objects.commits[&c1].tree_id,
            repo.storage.objects.commits[&c2].tree_id
        );
    }
}
