use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Repository record - the canonical unit flowing through the pipeline.
///
/// Created from an API response or a manual override entry, merged during
/// hydration, and read-only once aggregation is done. `full_name` is the
/// identity key; a record that can't resolve one never gets built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoRecord {
    pub full_name: String,
    pub name: String,
    pub html_url: String,
    pub description: Option<String>,
    pub language: Option<String>,
    pub stars: u32,
    pub pushed_at: Option<DateTime<Utc>>,
    pub is_archived: bool,
    pub is_fork: bool,
    pub is_private: bool,
    /// Lowercase topic strings; order only matters for display
    pub topics: Vec<String>,
    pub pinned: bool,
    /// True when this record came from the curated override list
    pub from_override: bool,
}

impl RepoRecord {
    /// Owner half of `owner/name`.
    pub fn owner(&self) -> &str {
        self.full_name.split('/').next().unwrap_or("")
    }

    /// Repo half of `owner/name`.
    pub fn repo_name(&self) -> &str {
        self.full_name.split('/').nth(1).unwrap_or("")
    }
}

/// Parse `owner/name` out of a canonical repository web URL.
///
/// Accepts `https://github.com/owner/name`, with or without a trailing
/// slash, extra path segments, or a `.git` suffix. Returns None when the
/// path doesn't carry both halves - callers drop such entries.
pub fn full_name_from_url(url: &str) -> Option<String> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?;
    let mut segments = rest.split('/').filter(|s| !s.is_empty());

    let _host = segments.next()?;
    let owner = segments.next()?;
    let name = segments.next()?;
    let name = name.strip_suffix(".git").unwrap_or(name);

    if owner.is_empty() || name.is_empty() {
        return None;
    }
    Some(format!("{}/{}", owner, name))
}

/// How the final collection gets ordered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// Star count descending, ties broken by name ascending
    #[default]
    Stars,
    /// Name ascending
    Name,
    /// Last push descending; repos without a push date sink to the end
    Updated,
}

impl SortMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Stars => "stars",
            SortMode::Name => "name",
            SortMode::Updated => "updated",
        }
    }
}

impl std::str::FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stars" => Ok(SortMode::Stars),
            "name" => Ok(SortMode::Name),
            "updated" => Ok(SortMode::Updated),
            other => Err(format!("unknown sort mode: {}", other)),
        }
    }
}

impl std::fmt::Display for SortMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Declarative description of one organization panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrgCardConfig {
    pub org: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_card_limit")]
    pub limit: usize,
    #[serde(default = "default_true")]
    pub exclude_forks: bool,
    #[serde(default = "default_true")]
    pub exclude_archived: bool,
    #[serde(default)]
    pub sort: SortMode,
    #[serde(default = "default_true")]
    pub show_view_all: bool,
    /// Max topic chips shown in the card's frequency table
    #[serde(default = "default_topic_chip_limit")]
    pub topic_chip_limit: usize,
    /// Cap on deep topic fetches this card may trigger
    #[serde(default = "default_topic_fetch_limit")]
    pub topic_fetch_limit: usize,
}

impl OrgCardConfig {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.org)
    }
}

fn default_card_limit() -> usize {
    6
}

fn default_true() -> bool {
    true
}

fn default_topic_chip_limit() -> usize {
    4
}

fn default_topic_fetch_limit() -> usize {
    5
}

/// One row of a card's topic-frequency table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicCount {
    pub topic: String,
    pub count: usize,
}

/// Outcome of loading one view, for the rendering collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// Live data, this many records
    Loaded { count: usize },
    /// Live fetch failed, records served from a (possibly stale) cache entry
    FromCache { count: usize },
    /// Nothing to show; hint is human-actionable
    Failed { hint: String },
}

impl std::fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadStatus::Loaded { count } => write!(f, "{} repositories", count),
            LoadStatus::FromCache { count } => write!(f, "{} repositories (cached)", count),
            LoadStatus::Failed { hint } => write!(f, "failed to load: {}", hint),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_name_from_url() {
        assert_eq!(
            full_name_from_url("https://github.com/acme/widget"),
            Some("acme/widget".to_string())
        );
        assert_eq!(
            full_name_from_url("https://github.com/acme/widget/"),
            Some("acme/widget".to_string())
        );
        assert_eq!(
            full_name_from_url("https://github.com/acme/widget.git"),
            Some("acme/widget".to_string())
        );
        assert_eq!(
            full_name_from_url("http://github.com/acme/widget/tree/main"),
            Some("acme/widget".to_string())
        );
    }

    #[test]
    fn test_full_name_from_url_rejects_partial_paths() {
        assert_eq!(full_name_from_url("https://github.com/acme"), None);
        assert_eq!(full_name_from_url("https://github.com/"), None);
        assert_eq!(full_name_from_url("not a url"), None);
        assert_eq!(full_name_from_url(""), None);
    }

    #[test]
    fn test_sort_mode_roundtrip() {
        for mode in [SortMode::Stars, SortMode::Name, SortMode::Updated] {
            assert_eq!(mode.as_str().parse::<SortMode>().unwrap(), mode);
        }
        assert!("relevance".parse::<SortMode>().is_err());
    }

    #[test]
    fn test_org_card_config_defaults() {
        let cfg: OrgCardConfig = serde_json::from_str(r#"{"org": "acme"}"#).unwrap();
        assert_eq!(cfg.display_title(), "acme");
        assert_eq!(cfg.limit, 6);
        assert!(cfg.exclude_forks);
        assert!(cfg.exclude_archived);
        assert_eq!(cfg.sort, SortMode::Stars);
        assert_eq!(cfg.topic_chip_limit, 4);
        assert_eq!(cfg.topic_fetch_limit, 5);
    }
}
