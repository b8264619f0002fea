use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, IoResultExt, Result};
use crate::refs::{Branch, Head, Remote};
use crate::store::ObjectStore;
use crate::types::TreeLine;

/// name of the state file at the working-directory root
pub const STATE_FILE: &str = ".git";

/// branch every repository starts with
pub const DEFAULT_BRANCH: &str = "master";

/// the whole repository state
///
/// owns the object store, the branch table, the HEAD cell and the remotes
/// list. persisted wholesale to the state file at the end of each
/// state-changing command and reloaded on command entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Storage {
    pub objects: ObjectStore,
    pub branches: BTreeMap<String, Branch>,
    pub head: Head,
    pub remotes: Vec<Remote>,
}

impl Storage {
    /// fresh state: one empty `master` branch with HEAD attached to it
    pub fn new() -> Self {
        let mut branches = BTreeMap::new();
        branches.insert(DEFAULT_BRANCH.to_string(), Branch::empty());
        Self {
            objects: ObjectStore::new(),
            branches,
            head: Head::attached(DEFAULT_BRANCH),
            remotes: vec![],
        }
    }

    /// serialize to the on-disk format (canonical CBOR, zstd compressed)
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut cbor_bytes = Vec::new();
        ciborium::into_writer(self, &mut cbor_bytes)?;

        zstd::encode_all(&cbor_bytes[..], 3).map_err(|e| Error::Io {
            path: "<zstd>".into(),
            source: e,
        })
    }

    /// deserialize from the on-disk format, then validate referential closure
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let cbor_bytes = zstd::decode_all(bytes)
            .map_err(|e| Error::Corruption(format!("state file not decompressible: {}", e)))?;

        let storage: Storage = ciborium::from_reader(&cbor_bytes[..])
            .map_err(|e| Error::Corruption(format!("state file not decodable: {}", e)))?;

        storage.validate()?;
        Ok(storage)
    }

    /// load state from the working directory
    pub fn load(work_dir: &Path) -> Result<Self> {
        let path = work_dir.join(STATE_FILE);
        let bytes = fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NoRepo(work_dir.to_path_buf())
            } else {
                Error::Io { path, source: e }
            }
        })?;
        Self::from_bytes(&bytes)
    }

    /// store state in the working directory
    ///
    /// atomic write: temp -> fsync -> rename
    pub fn save(&self, work_dir: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        let path = work_dir.join(STATE_FILE);

        let tmp_path = work_dir.join(format!("{}.{}", STATE_FILE, uuid::Uuid::new_v4()));
        {
            let mut tmp_file = File::create(&tmp_path).with_path(&tmp_path)?;
            tmp_file.write_all(&bytes).with_path(&tmp_path)?;
            tmp_file.sync_all().with_path(&tmp_path)?;
        }

        fs::rename(&tmp_path, &path).with_path(&path)?;

        // fsync the directory so the rename itself is durable
        let dir = File::open(work_dir).with_path(work_dir)?;
        dir.sync_all().with_path(work_dir)?;

        Ok(())
    }

    /// check referential closure: every commit's tree and every line it
    /// embeds must resolve in the store, and every parent must be a stored
    /// commit. a HEAD attached to a missing branch is also corruption.
    pub fn validate(&self) -> Result<()> {
        if let Some(branch) = self.head.branch() {
            if !self.branches.contains_key(branch) {
                return Err(Error::Corruption(format!(
                    "HEAD attached to missing branch '{}'",
                    branch
                )));
            }
        }

        for (id, commit) in &self.objects.commits {
            if !self.objects.trees.contains_key(&commit.tree_id) {
                return Err(Error::Corruption(format!(
                    "commit {} references missing tree {}",
                    id, commit.tree_id
                )));
            }

            let mut missing = None;
            commit.tree.walk(&mut |line| {
                let present = match line {
                    TreeLine::Blob { id, .. } => self.objects.blobs.contains_key(id),
                    TreeLine::Subtree { id, .. } => self.objects.trees.contains_key(id),
                };
                if !present && missing.is_none() {
                    missing = Some((*line.id(), line.path().to_string()));
                }
            });
            if let Some((line_id, path)) = missing {
                return Err(Error::Corruption(format!(
                    "commit {} line '{}' references missing object {}",
                    id, path, line_id
                )));
            }

            for parent in &commit.parents {
                if !self.objects.commits.contains_key(parent) {
                    return Err(Error::Corruption(format!(
                        "commit {} references missing parent {}",
                        id, parent
                    )));
                }
            }
        }

        Ok(())
    }

    /// add a remote; names are unique
    pub fn add_remote(&mut self, name: impl Into<String>, url: impl Into<String>) -> Result<()> {
        let name = name.into();
        if self.remotes.iter().any(|r| r.name == name) {
            return Err(Error::RemoteExists(name));
        }
        self.remotes.push(Remote::new(name, url));
        Ok(())
    }

    /// remove a remote
    pub fn remove_remote(&mut self, name: &str) -> Result<()> {
        let pos = self
            .remotes
            .iter()
            .position(|r| r.name == name)
            .ok_or_else(|| Error::RemoteNotFound(name.to_string()))?;
        self.remotes.remove(pos);
        Ok(())
    }

    /// get remote by name
    pub fn remote(&self, name: &str) -> Option<&Remote> {
        self.remotes.iter().find(|r| r.name == name)
    }

    /// set the tip of an existing branch, or insert the branch as given
    pub fn add_or_set_branch(&mut self, name: &str, info: Branch) {
        match self.branches.get_mut(name) {
            Some(branch) => branch.tip = info.tip,
            None => {
                self.branches.insert(name.to_string(), info);
            }
        }
    }
}

impl Default for Storage {
    fn default() -> Self {
        Self::new()
    }
}
