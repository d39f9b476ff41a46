//! Search orchestration module
//!
//! Validates requests, consults the cache and rate limiter, and dispatches
//! to the resolved provider.

mod executor;
mod models;

pub use executor::{CacheStatus, Search};
pub use models::*;
