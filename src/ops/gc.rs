use std::collections::HashSet;

use crate::error::Result;
use crate::hash::Id;
use crate::repo::Repository;
use crate::types::TreeLine;

/// gc statistics
#[derive(Debug, Default)]
pub struct GcStats {
    pub commits_removed: usize,
    pub trees_removed: usize,
    pub blobs_removed: usize,
}

/// garbage collect unreachable objects
///
/// mark phase: every commit reachable from any branch tip or from the
/// resolved HEAD. sweep phase: commits outside that set, then trees and
/// blobs no surviving commit's tree references.
pub fn gc(repo: &mut Repository) -> Result<GcStats> {
    let mut roots: Vec<Id> = repo
        .storage
        .branches
        .values()
        .filter_map(|branch| branch.tip)
        .collect();
    if let Some(id) = repo.resolve_head() {
        roots.push(id);
    }

    let mut live_commits: HashSet<Id> = HashSet::new();
    for root in roots {
        for (id, _) in repo.reachable(&root, None)? {
            live_commits.insert(id);
        }
    }

    let objects = &mut repo.storage.objects;
    let mut stats = GcStats::default();

    let commits_before = objects.commits.len();
    objects.commits.retain(|id, _| live_commits.contains(id));
    stats.commits_removed = commits_before - objects.commits.len();

    // trees and blobs referenced by the surviving commits
    let mut live_trees: HashSet<Id> = HashSet::new();
    let mut live_blobs: HashSet<Id> = HashSet::new();
    for commit in objects.commits.values() {
        live_trees.insert(commit.tree_id);
        commit.tree.walk(&mut |line| match line {
            TreeLine::Blob { id, .. } => {
                live_blobs.insert(*id);
            }
            TreeLine::Subtree { id, .. } => {
                live_trees.insert(*id);
            }
        });
    }

    let trees_before = objects.trees.len();
    objects.trees.retain(|id, _| live_trees.contains(id));
    stats.trees_removed = trees_before - objects.trees.len();

    let blobs_before = objects.blobs.len();
    objects.blobs.retain(|id, _| live_blobs.contains(id));
    stats.blobs_removed = blobs_before - objects.blobs.len();

    tracing::debug!(
        commits = stats.commits_removed,
        trees = stats.trees_removed,
        blobs = stats.blobs_removed,
        "swept unreachable objects"
    );
    Ok(stats)
}
