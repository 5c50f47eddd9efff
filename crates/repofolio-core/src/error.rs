use thiserror::Error;

/// All the ways the aggregation pipeline can go wrong
///
/// We use thiserror here because it generates the boilerplate for us.
/// Life's too short to manually implement Display and Error traits.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] repofolio_api::GithubError),

    #[error("Dispatcher failure: {0}")]
    Dispatch(#[from] repofolio_api::DispatchError),

    #[error("Badge provider failure: {0}")]
    Badges(#[from] repofolio_api::BadgeError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Human-actionable hint for rendering alongside a failed card or grid.
    pub fn hint(&self) -> String {
        match self {
            Error::Api(repofolio_api::GithubError::RateLimited(_)) => {
                "rate limited - try again in a minute".to_string()
            }
            Error::Api(repofolio_api::GithubError::Network { hint, .. }) => hint.to_string(),
            Error::Api(repofolio_api::GithubError::NotFound(resource)) => {
                format!("{} does not exist", resource)
            }
            other => other.to_string(),
        }
    }
}
