use std::fmt::Write;

use crate::error::Result;
use crate::repo::Repository;

/// per-branch history, newest first
///
/// one header per branch, then one line per reachable commit:
/// `* <id> - <message truncated to 40 chars> (yyyy/MM/dd hh:mm:ss) <author>`
pub fn log(repo: &Repository) -> Result<String> {
    let mut out = String::new();

    for (name, branch) in &repo.storage.branches {
        let _ = writeln!(out, "Log for {}", name);

        let Some(tip) = branch.tip else { continue };
        let mut entries = repo.reachable(&tip, None)?;
        entries.sort_by(|a, b| b.1.time.cmp(&a.1.time));

        for (id, commit) in entries {
            let _ = writeln!(
                out,
                "* {} - {} ({}) {}",
                id,
                truncate(&commit.message, 40),
                format_time(commit.time),
                commit.author
            );
        }
    }

    Ok(out)
}

fn truncate(message: &str, max: usize) -> String {
    message.chars().take(max).collect()
}

fn format_time(timestamp: i64) -> String {
    match chrono::DateTime::from_timestamp(timestamp, 0) {
        Some(datetime) => datetime.format("%Y/%m/%d %H:%M:%S").to_string(),
        None => timestamp.to_string(),
    }
}
