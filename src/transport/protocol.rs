//! wire records for the sync protocol
//!
//! records travel as the same canonical CBOR used for hashing and for the
//! state file. compatibility is between kit peers only.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::hash::Id;
use crate::refs::Branch;
use crate::storage::Storage;
use crate::types::Commit;

/// server reply to a pull: the branch descriptor plus the full reachable
/// commit set from its tip
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PullResponse {
    pub branch_info: Branch,
    pub commits: Vec<(Id, Commit)>,
}

/// client request for a push
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PushRequest {
    pub branch: String,
    pub branch_info: Branch,
    /// remote tip as last seen by the client; transmitted but unused
    /// server-side
    pub latest_remote_branch_position: Option<Id>,
    pub commits: Vec<(Id, Commit)>,
}

/// serialize a wire record
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    ciborium::into_writer(value, &mut bytes)?;
    Ok(bytes)
}

/// deserialize a wire record
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    ciborium::from_reader(bytes)
        .map_err(|e| Error::Protocol(format!("undecodable record: {}", e)))
}

/// import a shipped commit set and point a branch at it
///
/// every commit is inserted idempotently together with its embedded root
/// tree and every blob/subtree line, then the branch is created or its tip
/// moved. the shipped set is trusted to be closed; no validation happens
/// here.
pub fn raw_import(
    storage: &mut Storage,
    commits: Vec<(Id, Commit)>,
    branch_name: &str,
    branch_info: Branch,
) {
    let count = commits.len();
    for (id, commit) in commits {
        storage
            .objects
            .insert_tree_deep(commit.tree_id, &commit.tree);
        storage.objects.insert_commit(id, commit);
    }
    storage.add_or_set_branch(branch_name, branch_info);
    tracing::debug!(commits = count, branch = branch_name, "imported commit set");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::hash_value;
    use crate::types::{Blob, Tree, TreeLine};

    fn sample_commit(time: i64, parents: Vec<Id>) -> (Id, Commit) {
        let blob = Blob::new("payload");
        let tree = Tree::new(vec![TreeLine::Blob {
            id: hash_value(&blob).unwrap(),
            blob,
            path: "file.txt".to_string(),
        }]);
        let tree_id = hash_value(&tree).unwrap();
        let commit = Commit::new(time, "author", "m", tree, tree_id, parents);
        let id = hash_value(&commit).unwrap();
        (id, commit)
    }

    #[test]
    fn test_wire_roundtrip() {
        let (id, commit) = sample_commit(1, vec![]);
        let response = PullResponse {
            branch_info: Branch::at(Some(id)),
            commits: vec![(id, commit)],
        };

        let bytes = encode(&response).unwrap();
        let parsed: PullResponse = decode(&bytes).unwrap();
        assert_eq!(response, parsed);
    }

    #[test]
    fn test_decode_garbage_is_protocol_error() {
        let result: Result<PullResponse> = decode(b"not cbor at all");
        assert!(matches!(result, Err(Error::Protocol(_))));
    }

    #[test]
    fn test_raw_import_registers_closure() {
        let (id, commit) = sample_commit(1, vec![]);
        let mut storage = Storage::new();

        raw_import(
            &mut storage,
            vec![(id, commit)],
            "origin/master",
            Branch::at(Some(id)),
        );

        assert!(storage.objects.commits.contains_key(&id));
        assert_eq!(storage.branches["origin/master"].tip, Some(id));
        storage.validate().unwrap();
    }

    #[test]
    fn test_raw_import_is_idempotent() {
        let (id1, c1) = sample_commit(1, vec![]);
        let (id2, c2) = sample_commit(2, vec![id1]);
        let shipped = vec![(id1, c1), (id2, c2)];
        let info = Branch::at(Some(id2));

        let mut once = Storage::new();
        raw_import(&mut once, shipped.clone(), "origin/master", info.clone());

        let mut twice = once.clone();
        raw_import(&mut twice, shipped, "origin/master", info);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_raw_import_moves_existing_tip() {
        let (id1, c1) = sample_commit(1, vec![]);
        let (id2, c2) = sample_commit(2, vec![id1]);

        let mut storage = Storage::new();
        raw_import(&mut storage, vec![(id1, c1)], "master", Branch::at(Some(id1)));
        assert_eq!(storage.branches["master"].tip, Some(id1));

        raw_import(&mut storage, vec![(id2, c2)], "master", Branch::at(Some(id2)));
        assert_eq!(storage.branches["master"].tip, Some(id2));
        // created field of the existing branch is untouched
        assert_eq!(storage.branches["master"].created, None);
    }
}
