// Core aggregation logic lives here - the brain of the operation
pub mod aggregate;
pub mod budget;
pub mod config;
pub mod error;
pub mod fetch;
pub mod hydrate;
pub mod models;
pub mod overrides;
pub mod provider;

pub use aggregate::{Aggregator, GridOptions, GridResult, OrgCard};
pub use budget::TopicBudget;
pub use config::AppConfig;
pub use error::Error;
pub use fetch::{BadgeFetcher, Fetcher};
pub use models::{LoadStatus, OrgCardConfig, RepoRecord, SortMode, TopicCount};
pub use provider::{GithubSource, RepoApi};

/// Result type alias because typing Result<T, Error> everywhere is tedious
pub type Result<T> = std::result::Result<T, Error>;
