// Source fetchers: cache-check, then dispatch, then cache-write
use std::sync::Arc;
use std::time::Duration;

use repofolio_api::{Badge, BadgeClient, Dispatcher};
use repofolio_cache::CacheStore;
use tracing::{debug, info};

use crate::{config::AppConfig, models::RepoRecord, provider::RepoApi, Result};

/// Cache-fronted accessors for the four upstream read operations.
///
/// Every path is the same shape: a fresh cache entry short-circuits without
/// touching the network; otherwise the call goes through the shared
/// dispatcher and overwrites the cache on success. Fetch failures propagate
/// so the caller can pick its own fallback (often the stale entry, via the
/// `cached_*` accessors).
pub struct Fetcher {
    api: Arc<dyn RepoApi>,
    cache: Arc<CacheStore>,
    dispatcher: Dispatcher,
    list_ttl: Duration,
    detail_ttl: Duration,
    topics_ttl: Duration,
}

impl Fetcher {
    pub fn new(
        api: Arc<dyn RepoApi>,
        cache: Arc<CacheStore>,
        dispatcher: Dispatcher,
        config: &AppConfig,
    ) -> Self {
        Self {
            api,
            cache,
            dispatcher,
            list_ttl: config.cache.list_ttl(),
            detail_ttl: config.cache.detail_ttl(),
            topics_ttl: config.cache.topics_ttl(),
        }
    }

    pub async fn user_repos(&self, user: &str) -> Result<Vec<RepoRecord>> {
        let key = format!("user-repos:{}", user);
        if let Some(entry) = self.cache.get::<Vec<RepoRecord>>(&key) {
            if entry.is_fresh(self.list_ttl) {
                debug!("cache hit for {}", key);
                return Ok(entry.payload);
            }
        }

        let api = Arc::clone(&self.api);
        let owner = user.to_string();
        let repos = self
            .dispatcher
            .submit(async move { api.user_repos(&owner).await })
            .await??;

        info!("fetched {} user repos for {}", repos.len(), user);
        self.cache.set(&key, &repos);
        Ok(repos)
    }

    pub async fn org_repos(&self, org: &str) -> Result<Vec<RepoRecord>> {
        let key = format!("org-repos:{}", org);
        if let Some(entry) = self.cache.get::<Vec<RepoRecord>>(&key) {
            if entry.is_fresh(self.list_ttl) {
                debug!("cache hit for {}", key);
                return Ok(entry.payload);
            }
        }

        let api = Arc::clone(&self.api);
        let org_owned = org.to_string();
        let repos = self
            .dispatcher
            .submit(async move { api.org_repos(&org_owned).await })
            .await??;

        info!("fetched {} org repos for {}", repos.len(), org);
        self.cache.set(&key, &repos);
        Ok(repos)
    }

    pub async fn repo_detail(&self, owner: &str, name: &str) -> Result<RepoRecord> {
        let key = format!("repo-detail:{}/{}", owner, name);
        if let Some(entry) = self.cache.get::<RepoRecord>(&key) {
            if entry.is_fresh(self.detail_ttl) {
                debug!("cache hit for {}", key);
                return Ok(entry.payload);
            }
        }

        let api = Arc::clone(&self.api);
        let (owner_owned, name_owned) = (owner.to_string(), name.to_string());
        let repo = self
            .dispatcher
            .submit(async move { api.repo_detail(&owner_owned, &name_owned).await })
            .await??;

        self.cache.set(&key, &repo);
        Ok(repo)
    }

    /// The deep fetch. Budget gating happens at the call site - by the time
    /// this runs, a budget unit has already been spent.
    pub async fn repo_topics(&self, owner: &str, name: &str) -> Result<Vec<String>> {
        let key = format!("repo-topics:{}/{}", owner, name);
        if let Some(entry) = self.cache.get::<Vec<String>>(&key) {
            if entry.is_fresh(self.topics_ttl) {
                debug!("cache hit for {}", key);
                return Ok(entry.payload);
            }
        }

        let api = Arc::clone(&self.api);
        let (owner_owned, name_owned) = (owner.to_string(), name.to_string());
        let topics = self
            .dispatcher
            .submit(async move { api.repo_topics(&owner_owned, &name_owned).await })
            .await??;

        self.cache.set(&key, &topics);
        Ok(topics)
    }

    /// Last cached user repo list, fresh or not. For fallback after a failed
    /// live fetch.
    pub fn cached_user_repos(&self, user: &str) -> Option<Vec<RepoRecord>> {
        self.cache
            .get::<Vec<RepoRecord>>(&format!("user-repos:{}", user))
            .map(|entry| entry.payload)
    }

    /// Last cached org repo list, fresh or not.
    pub fn cached_org_repos(&self, org: &str) -> Option<Vec<RepoRecord>> {
        self.cache
            .get::<Vec<RepoRecord>>(&format!("org-repos:{}", org))
            .map(|entry| entry.payload)
    }
}

/// Badge fetching is a second, simpler instance of the same pattern: one
/// endpoint, one key namespace, long TTL.
pub struct BadgeFetcher {
    client: BadgeClient,
    cache: Arc<CacheStore>,
    dispatcher: Dispatcher,
    ttl: Duration,
    page_size: u32,
}

impl BadgeFetcher {
    pub fn new(
        client: BadgeClient,
        cache: Arc<CacheStore>,
        dispatcher: Dispatcher,
        config: &AppConfig,
    ) -> Self {
        Self {
            client,
            cache,
            dispatcher,
            ttl: config.badges.ttl(),
            page_size: config.badges.page_size,
        }
    }

    pub async fn badges(&self, user: &str) -> Result<Vec<Badge>> {
        let key = format!("badges:{}:v1:{}", user, self.page_size);
        if let Some(entry) = self.cache.get::<Vec<Badge>>(&key) {
            if entry.is_fresh(self.ttl) {
                debug!("cache hit for {}", key);
                return Ok(entry.payload);
            }
        }

        let client = self.client.clone();
        let user_owned = user.to_string();
        let page_size = self.page_size;
        let page = self
            .dispatcher
            .submit(async move { client.list_badges(&user_owned, page_size).await })
            .await??;

        self.cache.set(&key, &page.data);
        Ok(page.data)
    }
}
