use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Main configuration structure
///
/// Loaded from the config file with serde defaults filling the gaps.
/// Priority: CLI > File > Defaults (like a sensible person would do)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Whose public repos feed the grid
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub badges: BadgesConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub topics: TopicsConfig,
}

impl AppConfig {
    /// Load config from the default location, or defaults if there is none
    pub fn load() -> crate::Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            let config: AppConfig = toml::from_str(&contents)
                .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to disk
    pub fn save(&self) -> crate::Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| crate::Error::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(&config_path, contents)?;
        Ok(())
    }

    /// Config file path: XDG on Linux/macOS, AppData on Windows
    fn config_path() -> crate::Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| crate::Error::Config("Could not find config directory".into()))?
            .join("repofolio");
        Ok(config_dir.join("config.toml"))
    }

    /// Where the sqlite cache lives
    pub fn cache_db_path(&self) -> crate::Result<PathBuf> {
        if let Some(ref path) = self.cache.db_path {
            return Ok(path.clone());
        }
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| crate::Error::Config("Could not find cache directory".into()))?
            .join("repofolio");
        std::fs::create_dir_all(&cache_dir)?;
        Ok(cache_dir.join("cache.db"))
    }
}

/// Paths to the declarative JSON sources.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SourcesConfig {
    /// JSON array of org card configs; missing file means zero cards
    pub org_cards_path: Option<PathBuf>,
    /// JSON array of manual override entries; missing file means none
    pub overrides_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    #[serde(default = "default_github_url")]
    pub api_base: String,
}

fn default_github_url() -> String {
    "https://api.github.com".to_string()
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_base: default_github_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BadgesConfig {
    /// Reverse proxy fronting the badge provider (it blocks direct reads)
    #[serde(default = "default_badge_proxy")]
    pub proxy_base: String,

    #[serde(default = "default_badge_page_size")]
    pub page_size: u32,

    #[serde(default = "default_badge_ttl_hours")]
    pub ttl_hours: u64,
}

fn default_badge_proxy() -> String {
    "https://credly-proxy.example.workers.dev/api/v1".to_string()
}

fn default_badge_page_size() -> u32 {
    12
}

fn default_badge_ttl_hours() -> u64 {
    12
}

impl Default for BadgesConfig {
    fn default() -> Self {
        Self {
            proxy_base: default_badge_proxy(),
            page_size: default_badge_page_size(),
            ttl_hours: default_badge_ttl_hours(),
        }
    }
}

impl BadgesConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_hours * 3600)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Override the sqlite path; defaults to the platform cache dir
    pub db_path: Option<PathBuf>,

    /// TTL for user/org repo lists - list ordering churns, keep it short
    #[serde(default = "default_list_ttl_minutes")]
    pub list_ttl_minutes: u64,

    /// TTL for single-repo detail
    #[serde(default = "default_detail_ttl_minutes")]
    pub detail_ttl_minutes: u64,

    /// TTL for per-repo topic lists - topics barely ever change
    #[serde(default = "default_topics_ttl_days")]
    pub topics_ttl_days: u64,
}

fn default_list_ttl_minutes() -> u64 {
    30
}

fn default_detail_ttl_minutes() -> u64 {
    60
}

fn default_topics_ttl_days() -> u64 {
    7
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            list_ttl_minutes: default_list_ttl_minutes(),
            detail_ttl_minutes: default_detail_ttl_minutes(),
            topics_ttl_days: default_topics_ttl_days(),
        }
    }
}

impl CacheConfig {
    pub fn list_ttl(&self) -> Duration {
        Duration::from_secs(self.list_ttl_minutes * 60)
    }

    pub fn detail_ttl(&self) -> Duration {
        Duration::from_secs(self.detail_ttl_minutes * 60)
    }

    pub fn topics_ttl(&self) -> Duration {
        Duration::from_secs(self.topics_ttl_days * 24 * 3600)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Minimum gap between consecutive request starts
    #[serde(default = "default_min_gap_ms")]
    pub min_gap_ms: u64,
}

fn default_min_gap_ms() -> u64 {
    750
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            min_gap_ms: default_min_gap_ms(),
        }
    }
}

impl DispatchConfig {
    pub fn min_gap(&self) -> Duration {
        Duration::from_millis(self.min_gap_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicsConfig {
    /// Global ceiling on deep topic fetches per run
    #[serde(default = "default_topic_budget")]
    pub budget: u32,
}

fn default_topic_budget() -> u32 {
    12
}

impl Default for TopicsConfig {
    fn default() -> Self {
        Self {
            budget: default_topic_budget(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.cache.list_ttl_minutes, 30);
        assert_eq!(config.cache.topics_ttl_days, 7);
        assert_eq!(config.badges.ttl_hours, 12);
        assert_eq!(config.dispatch.min_gap_ms, 750);
        assert_eq!(config.topics.budget, 12);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            username = "alice"

            [cache]
            list_ttl_minutes = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.username, "alice");
        assert_eq!(config.cache.list_ttl_minutes, 5);
        assert_eq!(config.cache.detail_ttl_minutes, 60);
        assert_eq!(config.github.api_base, "https://api.github.com");
    }

    #[test]
    fn test_ttl_conversions() {
        let config = AppConfig::default();
        assert_eq!(config.cache.list_ttl().as_secs(), 30 * 60);
        assert_eq!(config.cache.topics_ttl().as_secs(), 7 * 24 * 3600);
        assert_eq!(config.badges.ttl().as_secs(), 12 * 3600);
    }
}
