//! Response cache keyed by request fingerprint
//!
//! Entries carry their own time-to-live and are bounded by capacity with
//! least-recently-used eviction.

use crate::config::CacheSettings;
use crate::results::{Scalar, SearchResponse};
use crate::search::SearchRequest;
use moka::future::Cache;
use moka::policy::EvictionPolicy;
use moka::Expiry;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A stored response and how long it stays valid
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub response: Arc<SearchResponse>,
    pub ttl: Duration,
}

struct PerEntryTtl;

impl Expiry<String, CacheEntry> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Cache for search responses
#[derive(Clone)]
pub struct ResultCache {
    cache: Option<Cache<String, CacheEntry>>,
}

impl ResultCache {
    pub fn new(settings: &CacheSettings) -> Self {
        if !settings.enabled {
            return Self::disabled();
        }
        Self::with_capacity(settings.max_capacity)
    }

    pub fn with_capacity(max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .eviction_policy(EvictionPolicy::lru())
            .expire_after(PerEntryTtl)
            .build();

        Self { cache: Some(cache) }
    }

    /// A cache that never stores anything
    pub fn disabled() -> Self {
        Self { cache: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.cache.is_some()
    }

    /// Look up a live entry
    pub async fn get(&self, fingerprint: &str) -> Option<SearchResponse> {
        let cache = self.cache.as_ref()?;
        cache
            .get(fingerprint)
            .await
            .map(|entry| entry.response.as_ref().clone())
    }

    /// Store a response for `ttl`, replacing any entry with the same fingerprint
    pub async fn put(&self, fingerprint: String, response: SearchResponse, ttl: Duration) {
        if let Some(ref cache) = self.cache {
            let entry = CacheEntry {
                response: Arc::new(response),
                ttl,
            };
            cache.insert(fingerprint, entry).await;
        }
    }

    pub fn invalidate_all(&self) {
        if let Some(ref cache) = self.cache {
            cache.invalidate_all();
        }
    }

    /// Approximate number of entries
    pub fn entry_count(&self) -> u64 {
        self.cache.as_ref().map_or(0, |c| c.entry_count())
    }

    /// Apply pending evictions and expirations
    pub async fn run_pending_tasks(&self) {
        if let Some(ref cache) = self.cache {
            cache.run_pending_tasks().await;
        }
    }

    /// Stable key for a request as it will be executed.
    ///
    /// Equivalent requests (same trimmed query, engine, count, locale, safe
    /// search and extras, ignoring case where the provider does) produce the
    /// same key; anything that could change the payload produces a different one.
    pub fn fingerprint(request: &SearchRequest, engine: &str, num_results: usize) -> String {
        let mut hasher = Sha256::new();

        field(&mut hasher, request.query().trim().as_bytes());
        field(&mut hasher, engine.trim().to_ascii_lowercase().as_bytes());
        field(&mut hasher, &(num_results as u64).to_be_bytes());
        field(&mut hasher, request.language().to_ascii_lowercase().as_bytes());
        field(&mut hasher, request.country().to_ascii_lowercase().as_bytes());
        field(&mut hasher, &[u8::from(request.safe_search())]);

        field(&mut hasher, &(request.extras().len() as u64).to_be_bytes());
        for (key, value) in request.extras() {
            field(&mut hasher, key.as_bytes());
            match value {
                Scalar::Bool(b) => {
                    field(&mut hasher, b"b");
                    field(&mut hasher, &[u8::from(*b)]);
                }
                Scalar::Integer(i) => {
                    field(&mut hasher, b"i");
                    field(&mut hasher, &i.to_be_bytes());
                }
                Scalar::Float(f) => {
                    field(&mut hasher, b"f");
                    field(&mut hasher, &f.to_bits().to_be_bytes());
                }
                Scalar::Text(s) => {
                    field(&mut hasher, b"s");
                    field(&mut hasher, s.as_bytes());
                }
            }
        }

        format!("{:x}", hasher.finalize())
    }
}

/// Length-prefix each field so adjacent values cannot run together
fn field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_be_bytes());
    hasher.update(bytes);
}
