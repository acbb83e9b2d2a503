//! Commit collection across repositories.

use crate::github::{CommitListing, CommitSource, ListedCommit};
use crate::model::{CommitRecord, ReportBundle};
use crate::output;
use crate::window::TimeWindow;

/// Commits authored by `author` in `repo` within `window`.
///
/// An empty repository and a failed listing both yield an empty list; only
/// the failure is reported. With `with_details`, each record is enriched with
/// line stats and the touched files. A failed detail lookup leaves that
/// record without details.
pub fn fetch_repo_commits(
    source: &dyn CommitSource,
    repo: &str,
    author: &str,
    window: &TimeWindow,
    with_details: bool,
) -> Vec<CommitRecord> {
    let listed = match source.list_commits(repo, author, window) {
        CommitListing::Commits(commits) => commits,
        CommitListing::EmptyRepository => {
            output::verbose(&format!("{repo} has no commits yet"));
            return Vec::new();
        }
        CommitListing::Failed(reason) => {
            output::warn(&format!("failed to list commits for {repo}: {reason}"));
            return Vec::new();
        }
    };

    if !with_details {
        return listed.into_iter().map(|c| c.record).collect();
    }
    listed
        .into_iter()
        .map(|c| enrich(source, repo, c))
        .collect()
}

fn enrich(source: &dyn CommitSource, repo: &str, commit: ListedCommit) -> CommitRecord {
    match source.commit_detail(repo, &commit.full_sha) {
        Ok(detail) => commit.record.with_details(detail.stats, detail.files),
        Err(e) => {
            output::warn(&format!(
                "failed to fetch details for {repo}@{}: {e:#}",
                commit.record.sha
            ));
            commit.record
        }
    }
}

/// Visit `repos` in order and aggregate their commits into a bundle filed
/// under the window's report date.
pub fn collect_commits(
    source: &dyn CommitSource,
    repos: &[String],
    author: &str,
    window: &TimeWindow,
    with_details: bool,
) -> ReportBundle {
    let total = repos.len();
    let mut results = Vec::with_capacity(total);
    for (i, repo) in repos.iter().enumerate() {
        let commits = fetch_repo_commits(source, repo, author, window, with_details);
        let status = match commits.len() {
            0 => "none".to_string(),
            1 => "1 commit".to_string(),
            n => format!("{n} commits"),
        };
        output::action(&format!("[{}/{total}]", i + 1), &format!("{repo} ... {status}"));
        results.push((repo.clone(), commits));
    }
    ReportBundle::from_repo_results(&window.report_date, results)
}
