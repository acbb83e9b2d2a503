//! HTTP client for the GitHub REST API.
//!
//! Wraps `reqwest::blocking::Client` for the four calls this tool consumes:
//! owned repositories, collaborator repositories, commit listing and single
//! commit details. Requests go through [`crate::http::send_with_retry`].

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::config::GitHubCredentials;
use crate::http::{self, Replay, RetryPolicy};
use crate::model::{CommitRecord, CommitStats, FileChange, short_sha};
use crate::window::TimeWindow;

/// Page size for every listing call. Commit listing never asks for a second
/// page, so at most this many commits are seen per repository.
pub const PER_PAGE: u32 = 100;

const ACCEPT: &str = "application/vnd.github.v3+json";

// ---------------------------------------------------------------------------
// Response DTOs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RepoSummary {
    full_name: String,
}

#[derive(Debug, Deserialize)]
struct CommitSummary {
    sha: String,
    #[serde(default)]
    html_url: String,
    commit: CommitBody,
}

#[derive(Debug, Deserialize)]
struct CommitBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    committer: Option<Signature>,
    #[serde(default)]
    author: Option<Signature>,
}

#[derive(Debug, Deserialize)]
struct Signature {
    #[serde(default)]
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommitDetailResponse {
    #[serde(default)]
    stats: Option<CommitStats>,
    #[serde(default)]
    files: Vec<FileChange>,
}

// ---------------------------------------------------------------------------
// Public result types
// ---------------------------------------------------------------------------

/// A commit as listed, with its full hash kept for detail lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedCommit {
    pub full_sha: String,
    pub record: CommitRecord,
}

/// Outcome of listing one repository's commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitListing {
    Commits(Vec<ListedCommit>),
    /// HTTP 409: GitHub's answer for a repository with no commits at all.
    EmptyRepository,
    /// Any other status, a transport error, or an unreadable body.
    Failed(String),
}

/// File-level statistics for one commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitDetail {
    pub stats: CommitStats,
    pub files: Vec<FileChange>,
}

/// Paged repository listings used by discovery.
pub trait RepoListing {
    /// One page (1-based) of repositories owned by the configured user,
    /// most recently pushed first.
    fn owned_repos(&self, page: u32) -> Result<Vec<String>>;

    /// One page (1-based) of repositories the authenticated user
    /// collaborates on.
    fn collaborator_repos(&self, page: u32) -> Result<Vec<String>>;
}

/// Commit lookups used by the fetcher.
pub trait CommitSource {
    fn list_commits(&self, repo: &str, author: &str, window: &TimeWindow) -> CommitListing;

    fn commit_detail(&self, repo: &str, full_sha: &str) -> Result<CommitDetail>;
}

// ---------------------------------------------------------------------------
// GitHubClient
// ---------------------------------------------------------------------------

pub struct GitHubClient {
    client: reqwest::blocking::Client,
    base_url: String,
    credentials: GitHubCredentials,
    retry: RetryPolicy,
}

impl GitHubClient {
    /// `base_url` is trimmed and stripped of trailing slashes.
    pub fn new(base_url: &str, credentials: GitHubCredentials, retry: RetryPolicy) -> Result<Self> {
        Ok(Self {
            client: http::build_client()?,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            credentials,
            retry,
        })
    }

    pub fn username(&self) -> &str {
        &self.credentials.username
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(&self, url: &str, query: &[(&str, String)]) -> Result<reqwest::blocking::Response> {
        http::send_with_retry(&self.retry, Replay::Safe, url, || {
            self.client
                .get(url)
                .query(query)
                .header("Authorization", format!("token {}", self.credentials.token))
                .header("Accept", ACCEPT)
        })
    }

    fn repo_page(&self, path: &str, query: &[(&str, String)]) -> Result<Vec<String>> {
        let url = self.url(path);
        let resp = self.get(&url, query)?;
        let body = expect_success(resp)?;
        let repos: Vec<RepoSummary> = serde_json::from_str(&body)
            .with_context(|| format!("failed to parse repository list from {url}"))?;
        Ok(repos.into_iter().map(|r| r.full_name).collect())
    }

    fn try_list_commits(
        &self,
        repo: &str,
        author: &str,
        window: &TimeWindow,
    ) -> Result<CommitListing> {
        let url = self.url(&format!("/repos/{repo}/commits"));
        let query = [
            ("author", author.to_string()),
            ("since", window.since_param()?),
            ("until", window.until_param()?),
            ("per_page", PER_PAGE.to_string()),
        ];
        let resp = self.get(&url, &query)?;

        let status = resp.status();
        if status == reqwest::StatusCode::CONFLICT {
            return Ok(CommitListing::EmptyRepository);
        }
        if status != reqwest::StatusCode::OK {
            let body = resp.text().unwrap_or_default();
            return Ok(CommitListing::Failed(format!(
                "HTTP {}: {}",
                status.as_u16(),
                extract_error_message(&body)
            )));
        }

        let body = resp.text().context("failed to read commit list")?;
        let commits: Vec<CommitSummary> =
            serde_json::from_str(&body).context("failed to parse commit list")?;
        Ok(CommitListing::Commits(
            commits
                .into_iter()
                .map(|c| to_listed_commit(repo, c))
                .collect(),
        ))
    }
}

impl RepoListing for GitHubClient {
    fn owned_repos(&self, page: u32) -> Result<Vec<String>> {
        let path = format!("/users/{}/repos", self.credentials.username);
        self.repo_page(
            &path,
            &[
                ("per_page", PER_PAGE.to_string()),
                ("page", page.to_string()),
                ("sort", "pushed".to_string()),
                ("direction", "desc".to_string()),
            ],
        )
    }

    fn collaborator_repos(&self, page: u32) -> Result<Vec<String>> {
        self.repo_page(
            "/user/repos",
            &[
                ("per_page", PER_PAGE.to_string()),
                ("page", page.to_string()),
                ("affiliation", "collaborator".to_string()),
                ("sort", "pushed".to_string()),
            ],
        )
    }
}

impl CommitSource for GitHubClient {
    fn list_commits(&self, repo: &str, author: &str, window: &TimeWindow) -> CommitListing {
        match self.try_list_commits(repo, author, window) {
            Ok(listing) => listing,
            Err(e) => CommitListing::Failed(format!("{e:#}")),
        }
    }

    fn commit_detail(&self, repo: &str, full_sha: &str) -> Result<CommitDetail> {
        let url = self.url(&format!("/repos/{repo}/commits/{full_sha}"));
        let resp = self.get(&url, &[])?;
        let body = expect_success(resp)?;
        let detail: CommitDetailResponse = serde_json::from_str(&body)
            .with_context(|| format!("failed to parse commit detail from {url}"))?;
        Ok(CommitDetail {
            stats: detail.stats.unwrap_or_default(),
            files: detail.files,
        })
    }
}

fn to_listed_commit(repo: &str, c: CommitSummary) -> ListedCommit {
    let time = c
        .commit
        .committer
        .and_then(|s| s.date)
        .or_else(|| c.commit.author.and_then(|s| s.date))
        .unwrap_or_default();
    ListedCommit {
        record: CommitRecord {
            sha: short_sha(&c.sha),
            message: c.commit.message,
            repo: repo.to_string(),
            url: c.html_url,
            time,
            stats: None,
            files: None,
        },
        full_sha: c.sha,
    }
}

/// Return the body of a 200 response, or an error carrying the status and
/// the provider's message.
fn expect_success(resp: reqwest::blocking::Response) -> Result<String> {
    let status = resp.status();
    let body = resp.text().unwrap_or_default();
    if status == reqwest::StatusCode::OK {
        return Ok(body);
    }
    anyhow::bail!(
        "GitHub returned HTTP {}: {}",
        status.as_u16(),
        extract_error_message(&body)
    )
}

/// Pull `message` out of a GitHub error body, falling back to the raw body
/// truncated to 200 characters.
fn extract_error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body)
        && let Some(msg) = value.get("message").and_then(|m| m.as_str())
    {
        return msg.to_string();
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "no details provided".to_string();
    }
    if trimmed.chars().count() > 200 {
        format!("{}...", trimmed.chars().take(200).collect::<String>())
    } else {
        trimmed.to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
