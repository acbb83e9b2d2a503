use serde::{Deserialize, Serialize};

/// Number of characters kept from a full commit hash.
pub const SHORT_SHA_LEN: usize = 7;

/// How a file was touched by a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Added,
    Modified,
    Removed,
    /// Any other provider status (`renamed`, `copied`, `changed`, ...).
    #[serde(other)]
    Other,
}

impl FileStatus {
    /// Single-character marker used in agent prompts.
    pub fn glyph(self) -> char {
        match self {
            FileStatus::Added => '+',
            FileStatus::Modified => '~',
            FileStatus::Removed => '-',
            FileStatus::Other => '?',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub filename: String,
    pub status: FileStatus,
    pub additions: u64,
    pub deletions: u64,
    pub changes: u64,
}

/// Whole-commit line counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitStats {
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
    #[serde(default)]
    pub total: u64,
}

/// One commit relevant to the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Abbreviated hash, see [`short_sha`].
    pub sha: String,
    pub message: String,
    /// Owning repository as `owner/name`.
    pub repo: String,
    pub url: String,
    /// Committer date, ISO-8601 in UTC (`2026-02-02T09:15:00Z`).
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<CommitStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<FileChange>>,
}

impl CommitRecord {
    /// First line of the commit message.
    pub fn title(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    /// Everything after the first line, trimmed. Empty when the message is a
    /// single line.
    pub fn body(&self) -> String {
        match self.message.split_once('\n') {
            Some((_, rest)) => rest.trim().to_string(),
            None => String::new(),
        }
    }

    pub fn with_details(self, stats: CommitStats, files: Vec<FileChange>) -> Self {
        Self {
            stats: Some(stats),
            files: Some(files),
            ..self
        }
    }
}

/// Abbreviate a full commit hash to [`SHORT_SHA_LEN`] characters. Hashes
/// shorter than that are returned unchanged.
pub fn short_sha(full: &str) -> String {
    full.chars().take(SHORT_SHA_LEN).collect()
}

/// The aggregated, time-sorted result of one collection run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportBundle {
    pub date: String,
    pub total_commits: usize,
    /// Repositories with at least one commit, in resolver order.
    pub repos_with_commits: Vec<String>,
    /// Sorted ascending by `time`; ties keep fetch order.
    pub commits: Vec<CommitRecord>,
}

impl ReportBundle {
    /// Build a bundle from per-repository results given in resolver order.
    ///
    /// Repositories with no commits are left out of `repos_with_commits`.
    pub fn from_repo_results(date: &str, results: Vec<(String, Vec<CommitRecord>)>) -> Self {
        let mut repos_with_commits = Vec::new();
        let mut commits = Vec::new();
        for (repo, repo_commits) in results {
            if repo_commits.is_empty() {
                continue;
            }
            if !repos_with_commits.contains(&repo) {
                repos_with_commits.push(repo);
            }
            commits.extend(repo_commits);
        }
        sort_by_time(&mut commits);
        Self {
            date: date.to_string(),
            total_commits: commits.len(),
            repos_with_commits,
            commits,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    /// Repositories in the order their first commit appears in the sorted
    /// sequence.
    pub fn repos_by_first_commit(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for commit in &self.commits {
            if !seen.contains(&commit.repo.as_str()) {
                seen.push(commit.repo.as_str());
            }
        }
        seen
    }

    pub fn commits_for<'a>(&'a self, repo: &'a str) -> impl Iterator<Item = &'a CommitRecord> {
        self.commits.iter().filter(move |c| c.repo == repo)
    }
}

/// Stable ascending sort by timestamp string. All timestamps share the same
/// UTC `Z` format, so lexicographic order is chronological order.
pub fn sort_by_time(commits: &mut [CommitRecord]) {
    commits.sort_by(|a, b| a.time.cmp(&b.time));
}
