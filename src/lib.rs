//! SearchBridge: one search API in front of several web search providers
//!
//! Requests name a provider (Google, Bing or DuckDuckGo); the orchestrator
//! validates them, serves repeats from a TTL cache, applies a per-client
//! fixed-window rate limit and returns normalized results.

pub mod cache;
pub mod config;
pub mod engines;
pub mod error;
pub mod limiter;
pub mod metrics;
pub mod network;
pub mod results;
pub mod search;
pub mod web;

pub use config::Settings;
pub use engines::{Engine, EngineKind};
pub use error::SearchError;
pub use results::{SearchResponse, SearchResult};
pub use search::{CacheStatus, Search, SearchRequest};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default timeout for engine requests in seconds
pub const DEFAULT_TIMEOUT: u64 = 5;

/// Maximum timeout that can be set
pub const MAX_TIMEOUT: u64 = 30;
