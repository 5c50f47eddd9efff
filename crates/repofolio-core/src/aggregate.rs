// Aggregation: merge every source into one collection plus derived views
use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    budget::TopicBudget,
    fetch::Fetcher,
    hydrate::hydrate_overrides,
    models::{LoadStatus, OrgCardConfig, RepoRecord, SortMode, TopicCount},
    overrides::ManualRepo,
};

/// Knobs for the main grid view.
#[derive(Debug, Clone)]
pub struct GridOptions {
    pub exclude_forks: bool,
    pub exclude_archived: bool,
    pub sort: SortMode,
    /// Cap on deep topic fetches the grid itself may trigger
    pub topic_fetch_limit: usize,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            exclude_forks: true,
            exclude_archived: true,
            sort: SortMode::Stars,
            topic_fetch_limit: 6,
        }
    }
}

/// The final collection handed to the rendering collaborator.
#[derive(Debug, Clone)]
pub struct GridResult {
    pub records: Vec<RepoRecord>,
    pub status: LoadStatus,
}

/// One rendered organization panel's worth of data.
#[derive(Debug, Clone)]
pub struct OrgCard {
    pub config: OrgCardConfig,
    pub records: Vec<RepoRecord>,
    pub topics: Vec<TopicCount>,
    pub status: LoadStatus,
}

/// How one source's list load went.
enum SourceLoad {
    Live(Vec<RepoRecord>),
    Cached(Vec<RepoRecord>),
    Failed(String),
}

/// Runs the fetch streams, reconciles them, and builds the derived views.
pub struct Aggregator {
    fetcher: Arc<Fetcher>,
    budget: Arc<TopicBudget>,
}

impl Aggregator {
    pub fn new(fetcher: Arc<Fetcher>, budget: Arc<TopicBudget>) -> Self {
        Self { fetcher, budget }
    }

    /// One full aggregation pass: user stream, org streams, and the
    /// hydrated manual entries run concurrently, then merge.
    pub async fn run(
        &self,
        user: &str,
        cards: &[OrgCardConfig],
        manuals: Vec<ManualRepo>,
        options: &GridOptions,
    ) -> (GridResult, Vec<OrgCard>) {
        let user_stream = self.load_user(user);
        let org_streams = futures::future::join_all(
            cards.iter().map(|card| self.load_org(&card.org)),
        );
        let manual_stream = hydrate_overrides(&self.fetcher, manuals);

        let (user_load, org_loads, manual_records) =
            tokio::join!(user_stream, org_streams, manual_stream);

        let mut org_cards: Vec<OrgCard> = cards
            .iter()
            .zip(org_loads.iter())
            .map(|(config, load)| self.build_card(config.clone(), load))
            .collect();
        for card in org_cards.iter_mut() {
            self.fill_topics(&mut card.records, card.config.topic_fetch_limit)
                .await;
            card.topics = topic_frequencies(&card.records, Some(card.config.topic_chip_limit));
        }

        let grid = self
            .build_grid(&user_load, &org_loads, manual_records, options)
            .await;

        (grid, org_cards)
    }

    async fn load_user(&self, user: &str) -> SourceLoad {
        if user.is_empty() {
            return SourceLoad::Live(Vec::new());
        }
        match self.fetcher.user_repos(user).await {
            Ok(repos) => SourceLoad::Live(repos),
            Err(e) => {
                warn!("user repo fetch for {} failed: {}", user, e);
                match self.fetcher.cached_user_repos(user) {
                    Some(repos) => SourceLoad::Cached(repos),
                    None => SourceLoad::Failed(e.hint()),
                }
            }
        }
    }

    async fn load_org(&self, org: &str) -> SourceLoad {
        match self.fetcher.org_repos(org).await {
            Ok(repos) => SourceLoad::Live(repos),
            Err(e) => {
                warn!("org repo fetch for {} failed: {}", org, e);
                match self.fetcher.cached_org_repos(org) {
                    Some(repos) => SourceLoad::Cached(repos),
                    None => SourceLoad::Failed(e.hint()),
                }
            }
        }
    }

    fn build_card(&self, config: OrgCardConfig, load: &SourceLoad) -> OrgCard {
        let (records, status) = match load {
            SourceLoad::Live(repos) => {
                let filtered = card_view(repos, &config);
                let count = filtered.len();
                (filtered, LoadStatus::Loaded { count })
            }
            SourceLoad::Cached(repos) => {
                let filtered = card_view(repos, &config);
                let count = filtered.len();
                (filtered, LoadStatus::FromCache { count })
            }
            SourceLoad::Failed(hint) => (
                Vec::new(),
                LoadStatus::Failed { hint: hint.clone() },
            ),
        };

        OrgCard {
            config,
            records,
            topics: Vec::new(),
            status,
        }
    }

    async fn build_grid(
        &self,
        user_load: &SourceLoad,
        org_loads: &[SourceLoad],
        manual_records: Vec<RepoRecord>,
        options: &GridOptions,
    ) -> GridResult {
        // Manual/hydrated goes last so it always wins identity collisions.
        let mut streams: Vec<Vec<RepoRecord>> = Vec::new();
        if let SourceLoad::Live(repos) | SourceLoad::Cached(repos) = user_load {
            streams.push(repos.clone());
        }
        for load in org_loads {
            if let SourceLoad::Live(repos) | SourceLoad::Cached(repos) = load {
                streams.push(repos.clone());
            }
        }
        streams.push(manual_records);

        let mut records = merge_by_identity(streams);
        records.retain(|r| !r.is_private);
        if options.exclude_forks {
            records.retain(|r| !r.is_fork);
        }
        if options.exclude_archived {
            records.retain(|r| !r.is_archived);
        }

        sort_records(&mut records, options.sort);
        self.fill_topics(&mut records, options.topic_fetch_limit).await;
        let records = partition_pinned(records);

        let count = records.len();
        let status = match user_load {
            SourceLoad::Live(_) => LoadStatus::Loaded { count },
            SourceLoad::Cached(_) => LoadStatus::FromCache { count },
            SourceLoad::Failed(hint) => LoadStatus::Failed { hint: hint.clone() },
        };

        info!("grid aggregated: {}", status);
        GridResult { records, status }
    }

    /// Deep-fetch topics for records that have none, up to the local cap and
    /// the shared budget. A unit is spent per attempt whether or not the
    /// fetch succeeds; once the budget is dry, repos just render without
    /// topic chips.
    async fn fill_topics(&self, records: &mut [RepoRecord], local_cap: usize) {
        let candidates: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.topics.is_empty())
            .map(|(i, _)| i)
            .collect();

        let planned = self.budget.plan(local_cap, candidates.len());
        let mut attempted = 0;
        for idx in candidates {
            if attempted >= planned {
                break;
            }
            if !self.budget.try_take() {
                break;
            }
            attempted += 1;

            let (owner, name) = match records[idx].full_name.split_once('/') {
                Some(parts) => parts,
                None => continue,
            };
            match self.fetcher.repo_topics(owner, name).await {
                Ok(topics) => records[idx].topics = topics,
                Err(e) => {
                    warn!("topic fetch for {} failed: {}", records[idx].full_name, e);
                }
            }
        }
    }
}

/// Filter, sort, and truncate an org repo list per its card config.
fn card_view(repos: &[RepoRecord], config: &OrgCardConfig) -> Vec<RepoRecord> {
    let mut records: Vec<RepoRecord> = repos
        .iter()
        .filter(|r| !r.is_private)
        .filter(|r| !(config.exclude_forks && r.is_fork))
        .filter(|r| !(config.exclude_archived && r.is_archived))
        .cloned()
        .collect();
    sort_records(&mut records, config.sort);
    records.truncate(config.limit);
    records
}

/// Flatten streams into one sequence keyed by `full_name`; later streams
/// overwrite earlier ones on collision.
pub fn merge_by_identity(streams: Vec<Vec<RepoRecord>>) -> Vec<RepoRecord> {
    let mut by_key: HashMap<String, usize> = HashMap::new();
    let mut merged: Vec<RepoRecord> = Vec::new();

    for stream in streams {
        for record in stream {
            match by_key.get(&record.full_name) {
                Some(&idx) => merged[idx] = record,
                None => {
                    by_key.insert(record.full_name.clone(), merged.len());
                    merged.push(record);
                }
            }
        }
    }
    merged
}

/// Sort in place. All modes break ties by name ascending, so output order
/// is deterministic for equal keys.
pub fn sort_records(records: &mut [RepoRecord], mode: SortMode) {
    match mode {
        SortMode::Stars => records.sort_by(|a, b| {
            b.stars
                .cmp(&a.stars)
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        }),
        SortMode::Name => {
            records.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        }
        SortMode::Updated => records.sort_by(|a, b| {
            b.pushed_at
                .cmp(&a.pushed_at)
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        }),
    }
}

/// Stable partition: pinned records first, order preserved inside each half.
pub fn partition_pinned(records: Vec<RepoRecord>) -> Vec<RepoRecord> {
    let (mut pinned, rest): (Vec<_>, Vec<_>) = records.into_iter().partition(|r| r.pinned);
    pinned.extend(rest);
    pinned
}

/// Count lowercased topics across a set; sort by count descending then name
/// ascending; optionally cap for display.
pub fn topic_frequencies(records: &[RepoRecord], cap: Option<usize>) -> Vec<TopicCount> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for record in records {
        for topic in &record.topics {
            *counts.entry(topic.to_lowercase()).or_insert(0) += 1;
        }
    }

    let mut table: Vec<TopicCount> = counts
        .into_iter()
        .map(|(topic, count)| TopicCount { topic, count })
        .collect();
    table.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.topic.cmp(&b.topic)));

    if let Some(cap) = cap {
        table.truncate(cap);
    }
    table
}
