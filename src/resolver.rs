//! Repository resolution: which `owner/name` repositories a run inspects.

use crate::config::{CliConfig, RepoSource};
use crate::github::RepoListing;
use crate::output;

/// Owned-repository discovery stops once this many have been collected.
pub const OWNED_REPO_LIMIT: usize = 200;

/// Maximum number of collaborator pages requested.
pub const COLLABORATOR_PAGE_LIMIT: u32 = 5;

pub trait RepositoryResolver {
    /// Repositories to inspect, in inspection order.
    fn resolve(&self) -> Vec<String>;
}

/// The configured repository list, verbatim.
pub struct StaticList {
    repos: Vec<String>,
}

impl StaticList {
    pub fn new(repos: Vec<String>) -> Self {
        Self { repos }
    }
}

impl RepositoryResolver for StaticList {
    fn resolve(&self) -> Vec<String> {
        self.repos.clone()
    }
}

/// Owned repositories (most recently pushed first) followed by
/// collaborator repositories not already listed.
pub struct Discovery<'a> {
    listing: &'a dyn RepoListing,
}

impl<'a> Discovery<'a> {
    pub fn new(listing: &'a dyn RepoListing) -> Self {
        Self { listing }
    }

    fn owned(&self) -> Vec<String> {
        let mut repos = Vec::new();
        let mut page = 1;
        while repos.len() < OWNED_REPO_LIMIT {
            match self.listing.owned_repos(page) {
                Ok(batch) if batch.is_empty() => break,
                Ok(batch) => repos.extend(batch),
                Err(e) => {
                    output::warn(&format!("stopped listing owned repositories: {e:#}"));
                    break;
                }
            }
            page += 1;
        }
        repos
    }

    fn add_collaborator(&self, repos: &mut Vec<String>) {
        for page in 1..=COLLABORATOR_PAGE_LIMIT {
            match self.listing.collaborator_repos(page) {
                Ok(batch) if batch.is_empty() => break,
                Ok(batch) => {
                    for repo in batch {
                        if !repos.contains(&repo) {
                            repos.push(repo);
                        }
                    }
                }
                Err(e) => {
                    output::warn(&format!("stopped listing collaborator repositories: {e:#}"));
                    break;
                }
            }
        }
    }
}

impl RepositoryResolver for Discovery<'_> {
    fn resolve(&self) -> Vec<String> {
        let mut repos = self.owned();
        self.add_collaborator(&mut repos);
        output::verbose(&format!("discovered {} repositories", repos.len()));
        repos
    }
}

/// Build the resolver for `source`.
pub fn resolver_for<'a>(
    source: RepoSource,
    config: &CliConfig,
    listing: &'a dyn RepoListing,
) -> Box<dyn RepositoryResolver + 'a> {
    match source {
        RepoSource::Static => Box::new(StaticList::new(config.repositories.clone())),
        RepoSource::Discover => Box::new(Discovery::new(listing)),
    }
}
