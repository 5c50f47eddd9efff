// Manual override loader
//
// The curated list is deliberately loose JSON: entries may carry a full
// identity, just a web URL, or any subset of display fields. Anything that
// can't resolve an identity is dropped without failing the batch.
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::full_name_from_url;

/// One raw entry as it appears in the overrides file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverrideEntry {
    pub full_name: Option<String>,
    pub html_url: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    /// Loosely typed on purpose; validated to a non-negative integer
    pub stars: Option<f64>,
    pub pushed_at: Option<DateTime<Utc>>,
    pub topics: Option<Vec<String>>,
    pub pinned: Option<bool>,
    pub archived: Option<bool>,
    pub fork: Option<bool>,
    pub private: Option<bool>,
}

/// An override entry with its identity resolved. Fields stay optional so
/// hydration can tell "explicitly set" apart from "absent".
#[derive(Debug, Clone)]
pub struct ManualRepo {
    pub full_name: String,
    pub html_url: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub stars: Option<u32>,
    pub pushed_at: Option<DateTime<Utc>>,
    /// Lowercased; empty means "not specified"
    pub topics: Vec<String>,
    pub pinned: bool,
    pub archived: Option<bool>,
    pub fork: Option<bool>,
    pub private: Option<bool>,
}

impl ManualRepo {
    /// Identity comes from `full_name` directly or is parsed out of the web
    /// URL. No identity, no record.
    fn resolve(entry: OverrideEntry) -> Option<Self> {
        let full_name = match entry.full_name {
            Some(ref fname) if fname.split('/').filter(|s| !s.is_empty()).count() == 2 => {
                fname.clone()
            }
            _ => full_name_from_url(entry.html_url.as_deref().unwrap_or(""))?,
        };

        let stars = entry
            .stars
            .filter(|s| s.is_finite() && *s >= 0.0)
            .map(|s| s as u32);

        let topics = entry
            .topics
            .unwrap_or_default()
            .into_iter()
            .map(|t| t.to_lowercase())
            .collect();

        Some(ManualRepo {
            full_name,
            html_url: entry.html_url,
            name: entry.name,
            description: entry.description,
            language: entry.language,
            stars,
            pushed_at: entry.pushed_at,
            topics,
            pinned: entry.pinned.unwrap_or(false),
            archived: entry.archived,
            fork: entry.fork,
            private: entry.private,
        })
    }
}

/// Parse a JSON array of override entries, dropping the unusable ones.
pub fn parse_overrides(json: &str) -> Vec<ManualRepo> {
    let values: Vec<serde_json::Value> = match serde_json::from_str(json) {
        Ok(values) => values,
        Err(e) => {
            warn!("overrides source is not a JSON array: {}", e);
            return Vec::new();
        }
    };

    values
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<OverrideEntry>(value) {
            Ok(entry) => {
                let resolved = ManualRepo::resolve(entry);
                if resolved.is_none() {
                    debug!("dropping override entry with no resolvable identity");
                }
                resolved
            }
            Err(e) => {
                debug!("dropping malformed override entry: {}", e);
                None
            }
        })
        .collect()
}

/// Load the overrides file. Missing or unreadable file degrades to an empty
/// list, same as a malformed one.
pub fn load_overrides(path: &Path) -> Vec<ManualRepo> {
    match std::fs::read_to_string(path) {
        Ok(contents) => parse_overrides(&contents),
        Err(e) => {
            warn!("could not read overrides file {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_from_full_name() {
        let repos = parse_overrides(r#"[{"full_name": "acme/widget", "pinned": true}]"#);
        assert_eq!(repos.len(), 1);
        assert_eq!(repos[0].full_name, "acme/widget");
        assert!(repos[0].pinned);
    }

    #[test]
    fn test_identity_parsed_from_url() {
        let repos = parse_overrides(r#"[{"html_url": "https://github.com/acme/widget"}]"#);
        assert_eq!(repos.len(), 1);
        assert_eq!(repos[0].full_name, "acme/widget");
        assert!(!repos[0].pinned);
    }

    #[test]
    fn test_unresolvable_entries_dropped_silently() {
        let repos = parse_overrides(
            r#"[
                {"name": "no identity here"},
                {"html_url": "https://github.com/just-an-owner"},
                {"full_name": "acme/kept"}
            ]"#,
        );
        assert_eq!(repos.len(), 1);
        assert_eq!(repos[0].full_name, "acme/kept");
    }

    #[test]
    fn test_malformed_array_degrades_to_empty() {
        assert!(parse_overrides("{ not json").is_empty());
        assert!(parse_overrides(r#"{"not": "an array"}"#).is_empty());
    }

    #[test]
    fn test_malformed_entry_does_not_sink_the_batch() {
        let repos = parse_overrides(
            r#"[
                {"full_name": "acme/good"},
                {"full_name": 42},
                {"full_name": "acme/also-good"}
            ]"#,
        );
        let names: Vec<_> = repos.iter().map(|r| r.full_name.as_str()).collect();
        assert_eq!(names, vec!["acme/good", "acme/also-good"]);
    }

    #[test]
    fn test_star_validation() {
        let repos = parse_overrides(
            r#"[
                {"full_name": "a/one", "stars": 12},
                {"full_name": "a/two", "stars": -3},
                {"full_name": "a/three"}
            ]"#,
        );
        assert_eq!(repos[0].stars, Some(12));
        assert_eq!(repos[1].stars, None);
        assert_eq!(repos[2].stars, None);
    }

    #[test]
    fn test_flag_overrides_stay_tristate() {
        let repos = parse_overrides(
            r#"[
                {"full_name": "a/one", "private": true, "fork": false},
                {"full_name": "a/two"}
            ]"#,
        );
        assert_eq!(repos[0].private, Some(true));
        assert_eq!(repos[0].fork, Some(false));
        assert_eq!(repos[1].private, None);
    }

    #[test]
    fn test_topics_lowercased() {
        let repos = parse_overrides(r#"[{"full_name": "a/b", "topics": ["Rust", "WASM"]}]"#);
        assert_eq!(repos[0].topics, vec!["rust", "wasm"]);
    }
}
