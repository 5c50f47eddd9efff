use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const GITHUB_API_BASE: &str = "https://api.github.com";

/// Hint attached to transport-level failures so the UI can say something
/// more useful than "network error".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkHint {
    /// Connection never got established - likely no internet
    Offline,
    /// The request was rejected before reaching the API (proxy/redirect policy)
    OriginRestricted,
    Unknown,
}

impl std::fmt::Display for NetworkHint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkHint::Offline => write!(f, "offline"),
            NetworkHint::OriginRestricted => write!(f, "blocked by origin restriction"),
            NetworkHint::Unknown => write!(f, "unknown network failure"),
        }
    }
}

#[derive(Error, Debug)]
pub enum GithubError {
    #[error("Rate limited or abuse-detected while fetching {0}")]
    RateLimited(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream server error {status} while fetching {resource}")]
    ServerError { status: u16, resource: String },

    #[error("API request for {resource} failed with status {status}")]
    RequestFailed { status: u16, resource: String },

    #[error("Network error while fetching {resource} ({hint}): {source}")]
    Network {
        resource: String,
        hint: NetworkHint,
        source: reqwest::Error,
    },

    #[error("JSON parsing failed: {0}")]
    Parse(#[from] serde_json::Error),
}

impl GithubError {
    /// Classify a non-success HTTP status for the given resource.
    ///
    /// GitHub reports abuse detection as 403 on unauthenticated calls,
    /// so 403 and 429 both land in the rate-limited bucket.
    pub fn from_status(status: reqwest::StatusCode, resource: &str) -> Self {
        if status == reqwest::StatusCode::FORBIDDEN
            || status == reqwest::StatusCode::TOO_MANY_REQUESTS
        {
            GithubError::RateLimited(resource.to_string())
        } else if status == reqwest::StatusCode::NOT_FOUND {
            GithubError::NotFound(resource.to_string())
        } else if status.is_server_error() {
            GithubError::ServerError {
                status: status.as_u16(),
                resource: resource.to_string(),
            }
        } else {
            GithubError::RequestFailed {
                status: status.as_u16(),
                resource: resource.to_string(),
            }
        }
    }

    fn from_transport(err: reqwest::Error, resource: &str) -> Self {
        let hint = if err.is_connect() {
            NetworkHint::Offline
        } else if err.is_redirect() {
            NetworkHint::OriginRestricted
        } else {
            NetworkHint::Unknown
        };
        GithubError::Network {
            resource: resource.to_string(),
            hint,
            source: err,
        }
    }
}

pub type Result<T> = std::result::Result<T, GithubError>;

/// Unauthenticated GitHub REST client.
///
/// All four endpoints the aggregator needs are public reads; no token is
/// ever sent. Pacing between calls is the dispatcher's job, not ours.
pub struct GithubClient {
    client: reqwest::Client,
    base_url: String,
}

impl GithubClient {
    pub fn new() -> Self {
        Self::with_base_url(GITHUB_API_BASE.to_string())
    }

    /// For GitHub Enterprise or tests with a local stub server
    pub fn with_base_url(base_url: String) -> Self {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("repofolio/0.1.0"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/vnd.github+json"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .expect("Failed to build HTTP client");

        Self { client, base_url }
    }

    /// All public repositories for a user, one page of up to 100.
    pub async fn list_user_repos(&self, user: &str, per_page: u32) -> Result<Vec<GithubRepo>> {
        let url = format!("{}/users/{}/repos", self.base_url, user);
        let resource = format!("user repos for {}", user);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("per_page", per_page.min(100).to_string().as_str()),
                ("sort", "updated"),
            ])
            .send()
            .await
            .map_err(|e| GithubError::from_transport(e, &resource))?;

        if !response.status().is_success() {
            return Err(GithubError::from_status(response.status(), &resource));
        }

        let repos: Vec<GithubRepo> = response
            .json()
            .await
            .map_err(|e| GithubError::from_transport(e, &resource))?;
        Ok(repos)
    }

    /// Public repositories for an organization, one page of up to 100.
    pub async fn list_org_repos(&self, org: &str, per_page: u32) -> Result<Vec<GithubRepo>> {
        let url = format!("{}/orgs/{}/repos", self.base_url, org);
        let resource = format!("org repos for {}", org);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("type", "public"),
                ("per_page", per_page.min(100).to_string().as_str()),
            ])
            .send()
            .await
            .map_err(|e| GithubError::from_transport(e, &resource))?;

        if !response.status().is_success() {
            return Err(GithubError::from_status(response.status(), &resource));
        }

        let repos: Vec<GithubRepo> = response
            .json()
            .await
            .map_err(|e| GithubError::from_transport(e, &resource))?;
        Ok(repos)
    }

    /// Full metadata for a single repository.
    pub async fn get_repo(&self, owner: &str, name: &str) -> Result<GithubRepo> {
        let full_name = format!("{}/{}", owner, name);
        let url = format!("{}/repos/{}", self.base_url, full_name);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| GithubError::from_transport(e, &full_name))?;

        if !response.status().is_success() {
            return Err(GithubError::from_status(response.status(), &full_name));
        }

        let repo: GithubRepo = response
            .json()
            .await
            .map_err(|e| GithubError::from_transport(e, &full_name))?;
        Ok(repo)
    }

    /// Topic names for a single repository - the "deep fetch".
    ///
    /// List responses sometimes omit topics, so this costs one extra call
    /// per repository and is budget-gated by the caller.
    pub async fn get_topics(&self, owner: &str, name: &str) -> Result<Vec<String>> {
        let full_name = format!("{}/{}", owner, name);
        let resource = format!("topics for {}", full_name);
        let url = format!("{}/repos/{}/topics", self.base_url, full_name);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| GithubError::from_transport(e, &resource))?;

        if !response.status().is_success() {
            return Err(GithubError::from_status(response.status(), &resource));
        }

        let topics: TopicsResponse = response
            .json()
            .await
            .map_err(|e| GithubError::from_transport(e, &resource))?;
        Ok(topics.names)
    }
}

impl Default for GithubClient {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubRepo {
    pub name: String,
    pub full_name: String,
    pub html_url: String,
    pub description: Option<String>,
    pub language: Option<String>,
    #[serde(default)]
    pub stargazers_count: u32,
    pub pushed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub fork: bool,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub topics: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TopicsResponse {
    #[serde(default)]
    names: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        let rate = GithubError::from_status(reqwest::StatusCode::FORBIDDEN, "x/y");
        assert!(matches!(rate, GithubError::RateLimited(_)));

        let rate = GithubError::from_status(reqwest::StatusCode::TOO_MANY_REQUESTS, "x/y");
        assert!(matches!(rate, GithubError::RateLimited(_)));

        let missing = GithubError::from_status(reqwest::StatusCode::NOT_FOUND, "x/y");
        assert!(matches!(missing, GithubError::NotFound(_)));

        let server = GithubError::from_status(reqwest::StatusCode::BAD_GATEWAY, "x/y");
        assert!(matches!(server, GithubError::ServerError { status: 502, .. }));

        let other = GithubError::from_status(reqwest::StatusCode::UNPROCESSABLE_ENTITY, "x/y");
        assert!(matches!(other, GithubError::RequestFailed { status: 422, .. }));
    }

    #[test]
    fn test_error_carries_resource_identity() {
        let err = GithubError::from_status(reqwest::StatusCode::NOT_FOUND, "octocat/spoon-knife");
        assert_eq!(err.to_string(), "Not found: octocat/spoon-knife");
    }

    #[test]
    fn test_repo_deserializes_with_missing_optionals() {
        let json = r#"{
            "name": "demo",
            "full_name": "acme/demo",
            "html_url": "https://github.com/acme/demo",
            "description": null,
            "language": null,
            "pushed_at": null
        }"#;
        let repo: GithubRepo = serde_json::from_str(json).unwrap();
        assert_eq!(repo.full_name, "acme/demo");
        assert_eq!(repo.stargazers_count, 0);
        assert!(repo.topics.is_empty());
        assert!(!repo.archived);
    }

    #[test]
    fn test_topics_response_shape() {
        let json = r#"{"names": ["rust", "cli"]}"#;
        let topics: TopicsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(topics.names, vec!["rust", "cli"]);
    }
}
