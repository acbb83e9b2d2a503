//! Local config file for API credentials and report settings.
//!
//! Persists credentials as JSON in
//! `$HOME/.config/github-daily-report/config.json`. The directory is created
//! with mode 0700 and the file with mode 0600 on Unix.
//!
//! Reading config never prompts. Interactive setup lives in
//! [`crate::onboarding`] and is only invoked by the `config` command.

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Default GitHub REST API base URL.
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Default Notion REST API base URL.
pub const DEFAULT_NOTION_API_URL: &str = "https://api.notion.com";

/// Environment variable overriding the GitHub API base URL.
const GITHUB_API_URL_ENV_VAR: &str = "GITHUB_API_URL";

/// Environment variable overriding the Notion API base URL.
const NOTION_API_URL_ENV_VAR: &str = "NOTION_API_URL";

/// Default Notion title property name.
pub const DEFAULT_TITLE_PROPERTY: &str = "标题";

/// Default Notion date property name.
pub const DEFAULT_DATE_PROPERTY: &str = "日期";

const CONFIG_ROOT_DIR_NAME: &str = ".config";
const CONFIG_SUBDIR_NAME: &str = "github-daily-report";
const CONFIG_FILE_NAME: &str = "config.json";

/// How the list of repositories to inspect is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RepoSource {
    /// Use the `repositories` list from config verbatim.
    Static,
    /// Discover owned and collaborator repositories through the GitHub API.
    Discover,
}

impl RepoSource {
    pub fn as_str(self) -> &'static str {
        match self {
            RepoSource::Static => "static",
            RepoSource::Discover => "discover",
        }
    }
}

/// A single string-valued config field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigField {
    GithubToken,
    GithubUsername,
    NotionToken,
    NotionDatabaseId,
    NotionLocation,
}

impl ConfigField {
    pub fn key(self) -> &'static str {
        match self {
            ConfigField::GithubToken => "github_token",
            ConfigField::GithubUsername => "github_username",
            ConfigField::NotionToken => "notion_token",
            ConfigField::NotionDatabaseId => "notion_database_id",
            ConfigField::NotionLocation => "notion_location",
        }
    }

    /// Secrets are never printed back, only reported as set or not set.
    pub fn is_secret(self) -> bool {
        matches!(self, ConfigField::GithubToken | ConfigField::NotionToken)
    }
}

/// GitHub credentials required before any GitHub call is made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubCredentials {
    pub token: String,
    pub username: String,
}

/// Notion credentials and page layout required before publishing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotionCredentials {
    pub token: String,
    pub database_id: String,
    pub title_property: String,
    pub date_property: String,
}

/// Persisted CLI configuration.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// GitHub personal access token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_token: Option<String>,
    /// GitHub login whose commits are collected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_username: Option<String>,
    /// Notion integration token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notion_token: Option<String>,
    /// Target Notion database id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notion_database_id: Option<String>,
    /// Repositories as `owner/name`, in inspection order.
    #[serde(default)]
    pub repositories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_source: Option<RepoSource>,
    /// Default Notion destination named in agent prompts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notion_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notion_title_property: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notion_date_property: Option<String>,
}

impl CliConfig {
    /// Resolve the config file path. Returns `None` if `$HOME` is unset.
    pub fn config_path() -> Option<PathBuf> {
        Self::config_path_with_home(home_dir()?.as_path())
    }

    pub fn config_path_with_home(home: &Path) -> Option<PathBuf> {
        Some(
            home.join(CONFIG_ROOT_DIR_NAME)
                .join(CONFIG_SUBDIR_NAME)
                .join(CONFIG_FILE_NAME),
        )
    }

    /// Load config from disk. Returns defaults if the config file does not exist.
    ///
    /// Parse errors and I/O errors other than not-found are hard failures.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) if contents.trim().is_empty() => Ok(Self::default()),
            Ok(contents) => serde_json::from_str(&contents)
                .with_context(|| format!("failed to parse config file at {}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => {
                Err(e).with_context(|| format!("failed to read config file at {}", path.display()))
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("cannot determine config path: $HOME is not set"))?;
        self.save_to(&path)
    }

    /// Save config to a specific path, creating the owner-only parent
    /// directory if needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create config directory at {}", parent.display())
            })?;
            restrict_permissions(parent, 0o700)?;
        }
        let contents = serde_json::to_string_pretty(self).context("failed to serialize config")?;
        std::fs::write(path, format!("{contents}\n"))
            .with_context(|| format!("failed to write config file at {}", path.display()))?;
        restrict_permissions(path, 0o600)?;
        Ok(())
    }

    /// Delete the persisted config file. Returns whether a file was removed.
    pub fn reset() -> Result<bool> {
        match Self::config_path() {
            Some(path) => Self::reset_at(&path),
            None => Ok(false),
        }
    }

    pub fn reset_at(path: &Path) -> Result<bool> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e)
                .with_context(|| format!("failed to remove config file at {}", path.display())),
        }
    }

    /// Read a field. Empty or whitespace-only values count as missing.
    pub fn get(&self, field: ConfigField) -> Option<String> {
        non_empty_trimmed(self.slot(field).clone())
    }

    pub fn set(&mut self, field: ConfigField, value: &str) {
        *self.slot_mut(field) = non_empty_trimmed(Some(value.to_string()));
    }

    fn slot(&self, field: ConfigField) -> &Option<String> {
        match field {
            ConfigField::GithubToken => &self.github_token,
            ConfigField::GithubUsername => &self.github_username,
            ConfigField::NotionToken => &self.notion_token,
            ConfigField::NotionDatabaseId => &self.notion_database_id,
            ConfigField::NotionLocation => &self.notion_location,
        }
    }

    fn slot_mut(&mut self, field: ConfigField) -> &mut Option<String> {
        match field {
            ConfigField::GithubToken => &mut self.github_token,
            ConfigField::GithubUsername => &mut self.github_username,
            ConfigField::NotionToken => &mut self.notion_token,
            ConfigField::NotionDatabaseId => &mut self.notion_database_id,
            ConfigField::NotionLocation => &mut self.notion_location,
        }
    }

    /// GitHub token and username, or an error naming what is missing.
    pub fn require_github(&self) -> Result<GitHubCredentials> {
        let token = self.get(ConfigField::GithubToken);
        let username = self.get(ConfigField::GithubUsername);
        match (token, username) {
            (Some(token), Some(username)) => Ok(GitHubCredentials { token, username }),
            (token, username) => bail!(
                "GitHub configuration is incomplete (missing {}). Run `github-daily-report config` first.",
                missing_list(&[
                    (ConfigField::GithubToken, token.is_none()),
                    (ConfigField::GithubUsername, username.is_none()),
                ])
            ),
        }
    }

    /// Notion token and database id, or an error naming what is missing.
    pub fn require_notion(&self) -> Result<NotionCredentials> {
        let token = self.get(ConfigField::NotionToken);
        let database_id = self.get(ConfigField::NotionDatabaseId);
        match (token, database_id) {
            (Some(token), Some(database_id)) => Ok(NotionCredentials {
                token,
                database_id,
                title_property: non_empty_trimmed(self.notion_title_property.clone())
                    .unwrap_or_else(|| DEFAULT_TITLE_PROPERTY.to_string()),
                date_property: non_empty_trimmed(self.notion_date_property.clone())
                    .unwrap_or_else(|| DEFAULT_DATE_PROPERTY.to_string()),
            }),
            (token, database_id) => bail!(
                "Notion configuration is incomplete (missing {}). Run `github-daily-report config` first.",
                missing_list(&[
                    (ConfigField::NotionToken, token.is_none()),
                    (ConfigField::NotionDatabaseId, database_id.is_none()),
                ])
            ),
        }
    }

    /// Resolve the repository source.
    ///
    /// Priority: CLI flag, then `repository_source` from config, then
    /// `static` if a repository list is configured and `discover` otherwise.
    pub fn resolve_repo_source(&self, cli_override: Option<RepoSource>) -> RepoSource {
        cli_override
            .or(self.repository_source)
            .unwrap_or(if self.repositories.is_empty() {
                RepoSource::Discover
            } else {
                RepoSource::Static
            })
    }

    /// Write a redacted view of the config: secrets as set/not set, other
    /// values verbatim.
    pub fn show(&self, w: &mut dyn Write) -> Result<()> {
        writeln!(w, "Current configuration:")?;
        for (label, field) in [
            ("GitHub token", ConfigField::GithubToken),
            ("GitHub username", ConfigField::GithubUsername),
            ("Notion token", ConfigField::NotionToken),
            ("Notion database id", ConfigField::NotionDatabaseId),
            ("Notion location", ConfigField::NotionLocation),
        ] {
            let value = self.get(field);
            let shown = if field.is_secret() {
                let state = if value.is_some() { "set" } else { "not set" };
                state.to_string()
            } else {
                value.unwrap_or_else(|| "(not set)".to_string())
            };
            writeln!(w, "  {label}: {shown}")?;
        }
        let repos = if self.repositories.is_empty() {
            "(not set)".to_string()
        } else {
            self.repositories.join(", ")
        };
        writeln!(w, "  Repositories: {repos}")?;
        writeln!(
            w,
            "  Repository source: {}",
            self.resolve_repo_source(None).as_str()
        )?;
        Ok(())
    }
}

/// Resolve an API base URL: CLI flag, then environment, then default.
///
/// Empty or whitespace-only layers fall through.
pub fn resolve_api_url(
    cli_override: Option<&str>,
    env_value: Option<String>,
    default: &str,
) -> String {
    non_empty_trimmed(cli_override.map(|s| s.to_string()))
        .or_else(|| non_empty_trimmed(env_value))
        .unwrap_or_else(|| default.to_string())
}

pub fn github_api_url(cli_override: Option<&str>) -> String {
    resolve_api_url(
        cli_override,
        std::env::var(GITHUB_API_URL_ENV_VAR).ok(),
        DEFAULT_GITHUB_API_URL,
    )
}

pub fn notion_api_url(cli_override: Option<&str>) -> String {
    resolve_api_url(
        cli_override,
        std::env::var(NOTION_API_URL_ENV_VAR).ok(),
        DEFAULT_NOTION_API_URL,
    )
}

/// Split a comma-separated `owner/repo` list. Entries are trimmed, empties
/// dropped, and duplicates removed keeping the first occurrence.
pub fn parse_repository_list(input: &str) -> Vec<String> {
    let mut repos: Vec<String> = Vec::new();
    for entry in input.split(',') {
        let entry = entry.trim();
        if !entry.is_empty() && !repos.iter().any(|r| r == entry) {
            repos.push(entry.to_string());
        }
    }
    repos
}

fn missing_list(fields: &[(ConfigField, bool)]) -> String {
    fields
        .iter()
        .filter(|(_, missing)| *missing)
        .map(|(field, _)| field.key())
        .collect::<Vec<_>>()
        .join(", ")
}

fn non_empty_trimmed(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}

#[cfg(unix)]
fn restrict_permissions(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
        .with_context(|| format!("failed to set permissions on {}", path.display()))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
