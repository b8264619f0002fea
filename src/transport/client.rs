//! client side of the sync protocol - pull, push and clone over HTTP

use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};
use crate::hash::Id;
use crate::ops::checkout;
use crate::repo::Repository;
use crate::storage::DEFAULT_BRANCH;
use crate::transport::protocol::{decode, encode, raw_import, PullResponse, PushRequest};

/// pull a branch from a configured remote
///
/// fetches the remote's full reachable commit set and imports it under the
/// tracking branch `<remote>/<branch>`. returns the pulled tip.
pub fn pull(repo: &mut Repository, remote: &str, branch: &str) -> Result<Option<Id>> {
    let url = remote_url(repo, remote)?;

    let response = match ureq::get(&url).query("branch", branch).call() {
        Ok(response) => response,
        Err(ureq::Error::Status(404, _)) => {
            return Err(Error::UnknownRef(format!(
                "branch '{}' not found on remote '{}'",
                branch, remote
            )))
        }
        Err(ureq::Error::Status(code, _)) => {
            return Err(Error::Protocol(format!("server returned status {}", code)))
        }
        Err(e) => return Err(Error::Network(e.to_string())),
    };

    let mut body = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut body)
        .map_err(|e| Error::Network(e.to_string()))?;

    let pulled: PullResponse = decode(&body)?;
    let tip = pulled.branch_info.tip;

    tracing::info!(
        remote = remote,
        branch = branch,
        commits = pulled.commits.len(),
        "pulled"
    );

    raw_import(
        &mut repo.storage,
        pulled.commits,
        &format!("{}/{}", remote, branch),
        pulled.branch_info,
    );
    Ok(tip)
}

/// push a branch to a configured remote
///
/// ships the full reachable set from the local tip; the remote imports it
/// and moves (or creates) the branch. returns the pushed tip.
pub fn push(repo: &Repository, remote: &str, branch: &str) -> Result<Id> {
    let url = remote_url(repo, remote)?;

    let branch_info = repo
        .storage
        .branches
        .get(branch)
        .ok_or_else(|| Error::UnknownRef(branch.to_string()))?
        .clone();
    let tip = branch_info
        .tip
        .ok_or_else(|| Error::UnknownRef(format!("branch '{}' has no commits", branch)))?;

    let commits = repo.reachable(&tip, None)?;
    let latest_remote_branch_position = repo
        .storage
        .branches
        .get(&format!("{}/{}", remote, branch))
        .and_then(|b| b.tip);

    let request = PushRequest {
        branch: branch.to_string(),
        branch_info,
        latest_remote_branch_position,
        commits,
    };
    let body = encode(&request)?;

    match ureq::post(&url).send_bytes(&body) {
        Ok(_) => {
            tracing::info!(remote = remote, branch = branch, tip = %tip, "pushed");
            Ok(tip)
        }
        Err(ureq::Error::Status(code, _)) => {
            Err(Error::Protocol(format!("server returned status {}", code)))
        }
        Err(e) => Err(Error::Network(e.to_string())),
    }
}

/// clone a remote branch into a fresh repository
///
/// initializes the working directory, adds the url as remote `origin`,
/// pulls the branch, moves `master` to the pulled tip and checks it out.
pub fn clone(work_dir: &Path, url: &str, branch: &str) -> Result<Repository> {
    let mut repo = Repository::init(work_dir)?;
    repo.storage.add_remote("origin", url)?;

    let tip = pull(&mut repo, "origin", branch)?;

    if let Some(master) = repo.storage.branches.get_mut(DEFAULT_BRANCH) {
        master.tip = tip;
    }
    checkout(&mut repo, DEFAULT_BRANCH)?;

    repo.save()?;
    Ok(repo)
}

fn remote_url(repo: &Repository, remote: &str) -> Result<String> {
    Ok(repo
        .storage
        .remote(remote)
        .ok_or_else(|| Error::RemoteNotFound(remote.to_string()))?
        .url
        .clone())
}
