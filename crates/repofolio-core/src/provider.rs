// GitHub-backed source - bridges the raw API client with the RepoApi seam
use async_trait::async_trait;
use repofolio_api::{GithubClient, GithubRepo};

use crate::{models::RepoRecord, Result};

/// The four read operations the fetch layer needs from the upstream API.
///
/// A trait seam so the pipeline can be exercised against a stub in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RepoApi: Send + Sync {
    /// All public repos for a user, one page of up to 100
    async fn user_repos(&self, user: &str) -> Result<Vec<RepoRecord>>;

    /// Public repos for an organization, one page of up to 100
    async fn org_repos(&self, org: &str) -> Result<Vec<RepoRecord>>;

    /// Full metadata for a single repository
    async fn repo_detail(&self, owner: &str, name: &str) -> Result<RepoRecord>;

    /// Topic names for a single repository (the deep fetch)
    async fn repo_topics(&self, owner: &str, name: &str) -> Result<Vec<String>>;
}

const PAGE_SIZE: u32 = 100;

/// Wrapper around GithubClient that implements RepoApi
pub struct GithubSource {
    client: GithubClient,
}

impl GithubSource {
    pub fn new(client: GithubClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RepoApi for GithubSource {
    async fn user_repos(&self, user: &str) -> Result<Vec<RepoRecord>> {
        let repos = self.client.list_user_repos(user, PAGE_SIZE).await?;
        Ok(repos.into_iter().map(record_from_wire).collect())
    }

    async fn org_repos(&self, org: &str) -> Result<Vec<RepoRecord>> {
        let repos = self.client.list_org_repos(org, PAGE_SIZE).await?;
        Ok(repos.into_iter().map(record_from_wire).collect())
    }

    async fn repo_detail(&self, owner: &str, name: &str) -> Result<RepoRecord> {
        let repo = self.client.get_repo(owner, name).await?;
        Ok(record_from_wire(repo))
    }

    async fn repo_topics(&self, owner: &str, name: &str) -> Result<Vec<String>> {
        let topics = self.client.get_topics(owner, name).await?;
        Ok(topics.into_iter().map(|t| t.to_lowercase()).collect())
    }
}

/// Convert a GitHub API repo to our internal record
fn record_from_wire(gh: GithubRepo) -> RepoRecord {
    RepoRecord {
        full_name: gh.full_name,
        name: gh.name,
        html_url: gh.html_url,
        description: gh.description,
        language: gh.language,
        stars: gh.stargazers_count,
        pushed_at: gh.pushed_at,
        is_archived: gh.archived,
        is_fork: gh.fork,
        is_private: gh.private,
        topics: gh.topics.into_iter().map(|t| t.to_lowercase()).collect(),
        pinned: false,
        from_override: false,
    }
}
