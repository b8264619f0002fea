use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::hash::Id;
use crate::refs::Head;
use crate::storage::{Storage, STATE_FILE};
use crate::types::Commit;

/// a kit repository: a working directory plus its loaded state
///
/// engine operations mutate the state in memory; callers persist with
/// `save` when the command completes.
pub struct Repository {
    work_dir: PathBuf,
    pub storage: Storage,
}

impl Repository {
    /// initialize a new repository in the given working directory
    pub fn init(work_dir: &Path) -> Result<Self> {
        if work_dir.join(STATE_FILE).exists() {
            return Err(Error::RepoExists(work_dir.to_path_buf()));
        }

        let repo = Self {
            work_dir: work_dir.to_path_buf(),
            storage: Storage::new(),
        };
        repo.save()?;
        Ok(repo)
    }

    /// open an existing repository
    pub fn open(work_dir: &Path) -> Result<Self> {
        let storage = Storage::load(work_dir)?;
        Ok(Self {
            work_dir: work_dir.to_path_buf(),
            storage,
        })
    }

    /// persist the current state
    pub fn save(&self) -> Result<()> {
        self.storage.save(&self.work_dir)
    }

    /// working directory root
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// effective id of HEAD: the branch tip when attached, the stored id
    /// when detached. None on a branch with no commits.
    pub fn resolve_head(&self) -> Option<Id> {
        match &self.storage.head {
            Head::Attached { branch } => {
                self.storage.branches.get(branch).and_then(|b| b.tip)
            }
            Head::Detached { id } => Some(*id),
        }
    }

    /// resolve HEAD, then follow first parents `n` times
    pub fn head_ref(&self, n: usize) -> Result<Id> {
        let mut id = self.resolve_head().ok_or(Error::NoParent)?;
        for _ in 0..n {
            let commit = self
                .storage
                .objects
                .commits
                .get(&id)
                .ok_or_else(|| Error::Corruption(format!("missing commit {}", id)))?;
            id = *commit.parents.first().ok_or(Error::NoParent)?;
        }
        Ok(id)
    }

    /// move the current reference to a new commit: the branch tip when
    /// attached, the detached id otherwise
    pub(crate) fn advance_head(&mut self, id: Id) -> Result<()> {
        match self.storage.head.clone() {
            Head::Detached { .. } => {
                self.storage.head = Head::detached(id);
            }
            Head::Attached { branch } => {
                let b = self.storage.branches.get_mut(&branch).ok_or_else(|| {
                    Error::Corruption(format!("HEAD attached to missing branch '{}'", branch))
                })?;
                b.tip = Some(id);
            }
        }
        Ok(())
    }

    /// commits reachable from `from` following parent links
    ///
    /// iterative depth-first walk; the start commit is always included.
    /// `down_to` is exclusive: parents equal to it are not followed and it
    /// never appears in the result. the result has no duplicates.
    pub fn reachable(&self, from: &Id, down_to: Option<&Id>) -> Result<Vec<(Id, Commit)>> {
        let start = self
            .storage
            .objects
            .commits
            .get(from)
            .ok_or_else(|| Error::UnknownRef(from.to_hex()))?;

        let mut out = vec![(*from, start.clone())];
        let mut seen: HashSet<Id> = HashSet::new();
        seen.insert(*from);

        let mut stack: Vec<Id> = Vec::new();
        push_parents(start, down_to, &seen, &mut stack);

        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            let commit = self
                .storage
                .objects
                .commits
                .get(&id)
                .ok_or_else(|| Error::Corruption(format!("missing commit {}", id)))?;
            out.push((id, commit.clone()));
            push_parents(commit, down_to, &seen, &mut stack);
        }

        Ok(out)
    }
}

fn push_parents(commit: &Commit, down_to: Option<&Id>, seen: &HashSet<Id>, stack: &mut Vec<Id>) {
    for parent in commit.parents.iter().rev() {
        if Some(parent) != down_to && !seen.contains(parent) {
            stack.push(*parent);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::hash_value;
    use crate::types::Tree;
    use tempfile::tempdir;

    fn insert_chain(repo: &mut Repository, len: usize) -> Vec<Id> {
        let tree = Tree::empty();
        let tree_id = hash_value(&tree).unwrap();
        repo.storage.objects.insert_tree(tree_id, tree.clone());

        let mut ids = Vec::new();
        let mut parents = vec![];
        for i in 0..len {
            let commit = Commit::new(i as i64, "author", format!("c{}", i), tree.clone(), tree_id, parents);
            let id = hash_value(&commit).unwrap();
            repo.storage.objects.insert_commit(id, commit);
            ids.push(id);
            parents = vec![id];
        }
        ids
    }

    #[test]
    fn test_init_creates_state_file() {
        let dir = tempdir().unwrap();
        Repository::init(dir.path()).unwrap();
        assert!(dir.path().join(STATE_FILE).is_file());
    }

    #[test]
    fn test_init_already_exists() {
        let dir = tempdir().unwrap();
        Repository::init(dir.path()).unwrap();
        let result = Repository::init(dir.path());
        assert!(matches!(result, Err(Error::RepoExists(_))));
    }

    #[test]
    fn test_open_roundtrip() {
        let dir = tempdir().unwrap();
        Repository::init(dir.path()).unwrap();
        let repo = Repository::open(dir.path()).unwrap();
        assert_eq!(repo.work_dir(), dir.path());
        assert!(repo.storage.head.is_attached_to("master"));
    }

    #[test]
    fn test_open_not_found() {
        let dir = tempdir().unwrap();
        let result = Repository::open(dir.path());
        assert!(matches!(result, Err(Error::NoRepo(_))));
    }

    #[test]
    fn test_resolve_head_empty() {
        let dir = tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        assert_eq!(repo.resolve_head(), None);
    }

    #[test]
    fn test_resolve_head_detached() {
        let dir = tempdir().unwrap();
        let mut repo = Repository::init(dir.path()).unwrap();
        repo.storage.head = Head::detached(Id::ZERO);
        assert_eq!(repo.resolve_head(), Some(Id::ZERO));
    }

    #[test]
    fn test_head_ref_walks_first_parents() {
        let dir = tempdir().unwrap();
        let mut repo = Repository::init(dir.path()).unwrap();
        let ids = insert_chain(&mut repo, 3);
        repo.storage.branches.get_mut("master").unwrap().tip = Some(ids[2]);

        assert_eq!(repo.head_ref(0).unwrap(), ids[2]);
        assert_eq!(repo.head_ref(1).unwrap(), ids[1]);
        assert_eq!(repo.head_ref(2).unwrap(), ids[0]);
        assert!(matches!(repo.head_ref(3), Err(Error::NoParent)));
    }

    #[test]
    fn test_head_ref_empty_repo() {
        let dir = tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        assert!(matches!(repo.head_ref(0), Err(Error::NoParent)));
    }

    #[test]
    fn test_reachable_full_chain() {
        let dir = tempdir().unwrap();
        let mut repo = Repository::init(dir.path()).unwrap();
        let ids = insert_chain(&mut repo, 4);

        let chain = repo.reachable(&ids[3], None).unwrap();
        let chain_ids: Vec<Id> = chain.iter().map(|(id, _)| *id).collect();
        assert_eq!(chain_ids, vec![ids[3], ids[2], ids[1], ids[0]]);

        // ends at a root commit, no duplicates
        assert!(chain.last().unwrap().1.is_root());
        let unique: HashSet<Id> = chain_ids.iter().copied().collect();
        assert_eq!(unique.len(), chain.len());
    }

    #[test]
    fn test_reachable_down_to_is_exclusive() {
        let dir = tempdir().unwrap();
        let mut repo = Repository::init(dir.path()).unwrap();
        let ids = insert_chain(&mut repo, 4);

        let chain = repo.reachable(&ids[3], Some(&ids[1])).unwrap();
        let chain_ids: Vec<Id> = chain.iter().map(|(id, _)| *id).collect();
        assert_eq!(chain_ids, vec![ids[3], ids[2]]);
    }

    #[test]
    fn test_reachable_unknown_start() {
        let dir = tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let result = repo.reachable(&Id::ZERO, None);
        assert!(matches!(result, Err(Error::UnknownRef(_))));
    }
}
