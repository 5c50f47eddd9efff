// HTTP clients and request pacing for the aggregation pipeline
pub mod badges;
pub mod dispatcher;
pub mod github;

// Re-export common types
pub use badges::{Badge, BadgeClient, BadgeError, BadgePage};
pub use dispatcher::{DispatchError, Dispatcher};
pub use github::{GithubClient, GithubError, GithubRepo, NetworkHint};
