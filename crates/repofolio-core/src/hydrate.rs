// Hydration: enrich curated entries with live detail
use tracing::{debug, warn};

use crate::{fetch::Fetcher, models::RepoRecord, overrides::ManualRepo};

/// Fetch detail for every override entry and merge, manual fields winning.
///
/// A failed detail fetch degrades to the manual entry as-is - a curated
/// record never disappears because the live source was unreachable.
pub async fn hydrate_overrides(fetcher: &Fetcher, manuals: Vec<ManualRepo>) -> Vec<RepoRecord> {
    let mut records = Vec::with_capacity(manuals.len());

    for manual in manuals {
        let (owner, name) = match manual.full_name.split_once('/') {
            Some(parts) => parts,
            None => continue,
        };

        let fetched = match fetcher.repo_detail(owner, name).await {
            Ok(detail) => {
                debug!("hydrated {}", manual.full_name);
                Some(detail)
            }
            Err(e) => {
                warn!(
                    "detail fetch for {} failed, keeping manual entry: {}",
                    manual.full_name, e
                );
                None
            }
        };

        records.push(merge(manual, fetched));
    }

    records
}

/// Field-by-field merge. Manual wins where it says something; fetched data
/// fills the rest.
pub fn merge(manual: ManualRepo, fetched: Option<RepoRecord>) -> RepoRecord {
    let full_name = manual.full_name;
    let fallback_name = full_name.split('/').nth(1).unwrap_or(&full_name).to_string();
    let fallback_url = format!("https://github.com/{}", full_name);

    match fetched {
        Some(live) => RepoRecord {
            name: manual.name.unwrap_or(live.name),
            html_url: manual.html_url.unwrap_or(live.html_url),
            description: manual.description.or(live.description),
            language: manual.language.or(live.language),
            stars: manual.stars.unwrap_or(live.stars),
            pushed_at: manual.pushed_at.or(live.pushed_at),
            is_archived: manual.archived.unwrap_or(live.is_archived),
            is_fork: manual.fork.unwrap_or(live.is_fork),
            is_private: manual.private.unwrap_or(live.is_private),
            topics: if manual.topics.is_empty() {
                live.topics
            } else {
                manual.topics
            },
            pinned: manual.pinned,
            from_override: true,
            full_name,
        },
        None => RepoRecord {
            name: manual.name.unwrap_or(fallback_name),
            html_url: manual.html_url.unwrap_or(fallback_url),
            description: manual.description,
            language: manual.language,
            stars: manual.stars.unwrap_or(0),
            pushed_at: manual.pushed_at,
            is_archived: manual.archived.unwrap_or(false),
            is_fork: manual.fork.unwrap_or(false),
            is_private: manual.private.unwrap_or(false),
            topics: manual.topics,
            pinned: manual.pinned,
            from_override: true,
            full_name,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::provider::MockRepoApi;
    use repofolio_api::Dispatcher;
    use repofolio_cache::CacheStore;
    use std::sync::Arc;
    use std::time::Duration;

    fn manual(full_name: &str) -> ManualRepo {
        ManualRepo {
            full_name: full_name.to_string(),
            html_url: None,
            name: None,
            description: None,
            language: None,
            stars: None,
            pushed_at: None,
            topics: Vec::new(),
            pinned: false,
            archived: None,
            fork: None,
            private: None,
        }
    }

    fn live(full_name: &str, stars: u32, topics: &[&str]) -> RepoRecord {
        RepoRecord {
            full_name: full_name.to_string(),
            name: full_name.split('/').nth(1).unwrap().to_string(),
            html_url: format!("https://github.com/{}", full_name),
            description: Some("live description".to_string()),
            language: Some("Rust".to_string()),
            stars,
            pushed_at: None,
            is_archived: false,
            is_fork: false,
            is_private: false,
            topics: topics.iter().map(|t| t.to_string()).collect(),
            pinned: false,
            from_override: false,
        }
    }

    #[test]
    fn test_manual_stars_win_when_present() {
        let mut m = manual("a/b");
        m.stars = Some(9);
        let merged = merge(m, Some(live("a/b", 5, &[])));
        assert_eq!(merged.stars, 9);
    }

    #[test]
    fn test_fetched_stars_used_when_manual_absent() {
        let merged = merge(manual("a/b"), Some(live("a/b", 5, &[])));
        assert_eq!(merged.stars, 5);
    }

    #[test]
    fn test_empty_manual_topics_take_fetched() {
        let merged = merge(manual("a/b"), Some(live("a/b", 0, &["x", "y"])));
        assert_eq!(merged.topics, vec!["x", "y"]);
    }

    #[test]
    fn test_nonempty_manual_topics_win_regardless_of_fetch() {
        let mut m = manual("a/b");
        m.topics = vec!["z".to_string()];
        let merged = merge(m, Some(live("a/b", 0, &["x", "y"])));
        assert_eq!(merged.topics, vec!["z"]);
    }

    #[test]
    fn test_fetched_display_fields_fill_absent_manual_ones() {
        let mut m = manual("a/b");
        m.description = Some("manual description".to_string());
        let merged = merge(m, Some(live("a/b", 0, &[])));
        assert_eq!(merged.description.as_deref(), Some("manual description"));
        assert_eq!(merged.language.as_deref(), Some("Rust"));
        assert!(merged.from_override);
    }

    #[test]
    fn test_manual_flags_overwrite_fetched_ones() {
        let mut m = manual("a/b");
        m.private = Some(true);
        let merged = merge(m.clone(), Some(live("a/b", 0, &[])));
        assert!(merged.is_private);

        // Without a fetched base the explicit flag still lands.
        let merged = merge(m, None);
        assert!(merged.is_private);

        // Absent manual flags defer to the fetched record.
        let merged = merge(manual("a/b"), Some(live("a/b", 0, &[])));
        assert!(!merged.is_private);
    }

    #[test]
    fn test_merge_without_fetch_synthesizes_url_and_name() {
        let merged = merge(manual("acme/widget"), None);
        assert_eq!(merged.name, "widget");
        assert_eq!(merged.html_url, "https://github.com/acme/widget");
        assert_eq!(merged.stars, 0);
    }

    #[tokio::test]
    async fn test_detail_404_falls_back_to_manual_entry() {
        let mut api = MockRepoApi::new();
        api.expect_repo_detail().times(1).returning(|_, _| {
            Err(crate::Error::Api(repofolio_api::GithubError::NotFound(
                "acme/gone".to_string(),
            )))
        });

        let fetcher = Fetcher::new(
            Arc::new(api),
            Arc::new(CacheStore::open_in_memory().unwrap()),
            Dispatcher::new(Duration::from_millis(1)),
            &AppConfig::default(),
        );

        let mut m = manual("acme/gone");
        m.pinned = true;
        m.stars = Some(3);

        let records = hydrate_overrides(&fetcher, vec![m]).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].full_name, "acme/gone");
        assert_eq!(records[0].stars, 3);
        assert!(records[0].pinned);
        assert!(records[0].from_override);
    }

    #[tokio::test]
    async fn test_hydration_merges_live_detail() {
        let mut api = MockRepoApi::new();
        api.expect_repo_detail()
            .times(1)
            .returning(|_, _| Ok(live("acme/widget", 7, &["rust"])));

        let fetcher = Fetcher::new(
            Arc::new(api),
            Arc::new(CacheStore::open_in_memory().unwrap()),
            Dispatcher::new(Duration::from_millis(1)),
            &AppConfig::default(),
        );

        let records = hydrate_overrides(&fetcher, vec![manual("acme/widget")]).await;
        assert_eq!(records[0].stars, 7);
        assert_eq!(records[0].topics, vec!["rust"]);
    }
}
