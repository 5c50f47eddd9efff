// SQLite-based TTL cache
// Keeps API calls down and makes stale-fallback rendering possible

pub mod cache;

pub use cache::{CacheEntry, CacheStore};
