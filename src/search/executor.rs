//! Search execution and orchestration

use super::models::SearchRequest;
use crate::cache::ResultCache;
use crate::config::{SearchSettings, Settings};
use crate::engines::EngineRegistry;
use crate::error::{self, SearchError};
use crate::limiter::RateLimiter;
use crate::metrics::Metrics;
use crate::results::SearchResponse;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Whether a response came from the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hit => "HIT",
            Self::Miss => "MISS",
        }
    }
}

/// Search orchestrator: validation, caching, rate limiting and dispatch to
/// a single provider
pub struct Search {
    registry: Arc<EngineRegistry>,
    limiter: RateLimiter,
    cache: ResultCache,
    metrics: Arc<Metrics>,
    policy: SearchSettings,
    cache_ttl: Duration,
}

impl Search {
    pub fn new(
        registry: Arc<EngineRegistry>,
        limiter: RateLimiter,
        cache: ResultCache,
        metrics: Arc<Metrics>,
        policy: SearchSettings,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            registry,
            limiter,
            cache,
            metrics,
            policy,
            cache_ttl,
        }
    }

    /// Build the orchestrator with limiter and cache taken from settings
    pub fn from_settings(
        settings: &Settings,
        registry: Arc<EngineRegistry>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self::new(
            registry,
            RateLimiter::new(&settings.rate_limit),
            ResultCache::new(&settings.cache),
            metrics,
            settings.search.clone(),
            settings.cache.ttl(),
        )
    }

    pub fn registry(&self) -> &Arc<EngineRegistry> {
        &self.registry
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Run a search on behalf of `client_key`
    pub async fn search(
        &self,
        request: &SearchRequest,
        client_key: &str,
    ) -> error::Result<SearchResponse> {
        self.search_with_status(request, client_key)
            .await
            .map(|(response, _)| response)
    }

    /// Run a search and report whether the response was served from cache
    pub async fn search_with_status(
        &self,
        request: &SearchRequest,
        client_key: &str,
    ) -> error::Result<(SearchResponse, CacheStatus)> {
        self.metrics.inc_search();

        let num_results = request
            .num_results()
            .unwrap_or(self.policy.default_num_results);
        self.validate(request, num_results)?;

        let engine_name = request
            .engine()
            .unwrap_or(self.policy.default_engine.as_str())
            .trim()
            .to_ascii_lowercase();

        let fingerprint = ResultCache::fingerprint(request, &engine_name, num_results);
        if self.cache.is_enabled() {
            if let Some(mut response) = self.cache.get(&fingerprint).await {
                // Equivalent requests share an entry; echo this caller's query
                response.query = request.query().to_string();
                debug!("Cache hit for '{}' on {}", request.query(), engine_name);
                self.metrics.record_cache_hit();
                return Ok((response, CacheStatus::Hit));
            }
            self.metrics.record_cache_miss();
        }

        if let Err(e) = self.limiter.check(client_key) {
            warn!("Rate limit exceeded for client {}", client_key);
            self.metrics.record_rate_limited();
            return Err(e);
        }

        let engine = self.registry.resolve(&engine_name)?;
        let kind = engine.kind();

        info!(
            "Searching {} for '{}' ({} results)",
            kind,
            request.query(),
            num_results
        );

        let start = Instant::now();
        let outcome = engine
            .execute(request.query().trim(), num_results, &request.options())
            .await;
        let elapsed = start.elapsed();
        self.metrics
            .record_engine_call(kind, elapsed, outcome.is_ok());

        let results = match outcome {
            Ok(results) => results,
            Err(e) => {
                warn!("{} search failed after {:?}: {}", kind, elapsed, e);
                return Err(e);
            }
        };

        let response =
            SearchResponse::assemble(request.query(), kind, results, num_results, elapsed);
        debug!(
            "{} returned {} results in {:.3}s",
            kind, response.total_results, response.search_time
        );

        self.cache
            .put(fingerprint, response.clone(), self.cache_ttl)
            .await;

        Ok((response, CacheStatus::Miss))
    }

    fn validate(&self, request: &SearchRequest, num_results: usize) -> error::Result<()> {
        if request.query().trim().is_empty() {
            return Err(SearchError::validation("query must not be empty"));
        }

        let (min, max) = (self.policy.min_results, self.policy.max_results);
        if !(min..=max).contains(&num_results) {
            return Err(SearchError::validation(format!(
                "num_results must be between {} and {}, got {}",
                min, max, num_results
            )));
        }

        Ok(())
    }
}
