// Badge provider client (Credly-style)
//
// The provider does not allow direct cross-origin reads, so requests go
// through a public reverse proxy in front of the real API. Single bounded
// page, read-only, cached by the caller with a long TTL.
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BadgeError {
    #[error("Badge request for {user} failed with status {status}")]
    RequestFailed { status: u16, user: String },

    #[error("Badge provider network error: {0}")]
    Network(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, BadgeError>;

/// One earned badge as the provider reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Badge {
    pub id: String,
    #[serde(default)]
    pub issued_at: Option<String>,
    pub badge_template: BadgeTemplate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BadgeTemplate {
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BadgePage {
    #[serde(default)]
    pub data: Vec<Badge>,
}

#[derive(Clone)]
pub struct BadgeClient {
    client: reqwest::Client,
    proxy_base: String,
}

impl BadgeClient {
    /// `proxy_base` fronts the provider API, e.g. a public CORS proxy root.
    pub fn new(proxy_base: String) -> Self {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("repofolio/0.1.0"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .expect("Failed to build HTTP client");

        Self { client, proxy_base }
    }

    /// One page of public badges for a user.
    pub async fn list_badges(&self, user: &str, page_size: u32) -> Result<BadgePage> {
        let url = format!(
            "{}/users/{}/badges?page=1&page_size={}",
            self.proxy_base, user, page_size
        );

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(BadgeError::RequestFailed {
                status: response.status().as_u16(),
                user: user.to_string(),
            });
        }

        let page: BadgePage = response.json().await?;
        Ok(page)
    }
}
