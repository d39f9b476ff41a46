//! Per-client fixed-window rate limiting
//!
//! Each client key gets a counter and a window start. The first request after
//! the window has elapsed opens a new window; within a window at most
//! `max_requests` requests are admitted. Rejected attempts still count.

use crate::config::RateLimitSettings;
use crate::error::{self, SearchError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone, Copy)]
struct RateLimitState {
    count: u32,
    window_start: Instant,
}

/// Shared fixed-window limiter keyed by client identity
#[derive(Debug, Clone)]
pub struct RateLimiter {
    clients: Arc<Mutex<HashMap<String, RateLimitState>>>,
    max_requests: u32,
    window: Duration,
    enabled: bool,
}

impl RateLimiter {
    pub fn new(settings: &RateLimitSettings) -> Self {
        Self::with_window(settings.max_requests, settings.window(), settings.enabled)
    }

    pub fn with_window(max_requests: u32, window: Duration, enabled: bool) -> Self {
        Self {
            clients: Arc::new(Mutex::new(HashMap::new())),
            max_requests,
            window,
            enabled,
        }
    }

    /// A limiter that admits everything
    pub fn disabled() -> Self {
        Self::with_window(0, Duration::ZERO, false)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Count a request for `key` and report whether it is admitted
    pub fn admit(&self, key: &str) -> bool {
        self.admit_at(key, Instant::now())
    }

    /// Same as [`admit`](Self::admit) with an explicit clock reading
    pub fn admit_at(&self, key: &str, now: Instant) -> bool {
        self.record(key, now).is_ok()
    }

    /// Count a request, failing with `RateLimitExceeded` once the quota is spent
    pub fn check(&self, key: &str) -> error::Result<()> {
        self.record(key, Instant::now())
            .map_err(|retry_after| SearchError::RateLimitExceeded {
                client: key.to_string(),
                retry_after_secs: retry_after.as_secs_f64().ceil().max(1.0) as u64,
            })
    }

    /// Returns the time until the window resets when the request is rejected
    fn record(&self, key: &str, now: Instant) -> Result<(), Duration> {
        if !self.enabled {
            return Ok(());
        }

        let mut clients = self.lock();
        let state = clients.entry(key.to_string()).or_insert(RateLimitState {
            count: 0,
            window_start: now,
        });

        let elapsed = now.saturating_duration_since(state.window_start);
        if elapsed >= self.window {
            state.count = 0;
            state.window_start = now;
        }

        state.count = state.count.saturating_add(1);
        if state.count <= self.max_requests {
            Ok(())
        } else {
            let elapsed = now.saturating_duration_since(state.window_start);
            debug!("Client {} over quota ({} requests)", key, state.count);
            Err(self.window.saturating_sub(elapsed))
        }
    }

    /// Drop clients whose window has fully elapsed, returning how many were removed
    pub fn prune(&self) -> usize {
        self.prune_at(Instant::now())
    }

    pub fn prune_at(&self, now: Instant) -> usize {
        let mut clients = self.lock();
        let before = clients.len();
        clients.retain(|_, state| now.saturating_duration_since(state.window_start) < self.window);
        before - clients.len()
    }

    /// Number of clients with live state
    pub fn tracked_clients(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, RateLimitState>> {
        self.clients.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_fixed_window_quota() {
        let limiter = RateLimiter::with_window(3, Duration::from_secs(60), true);
        let now = Instant::now();

        let admitted: Vec<bool> = (0..4).map(|_| limiter.admit_at("1.2.3.4", now)).collect();
        assert_eq!(admitted, vec![true, true, true, false]);

        // Other clients have their own window
        assert!(limiter.admit_at("5.6.7.8", now));
        assert_eq!(limiter.tracked_clients(), 2);
    }

    #[test]
    fn test_window_resets() {
        let limiter = RateLimiter::with_window(2, Duration::from_secs(10), true);
        let start = Instant::now();

        assert!(limiter.admit_at("a", start));
        assert!(limiter.admit_at("a", start + Duration::from_secs(1)));
        assert!(!limiter.admit_at("a", start + Duration::from_secs(9)));
        assert!(limiter.admit_at("a", start + Duration::from_secs(10)));
        assert!(limiter.admit_at("a", start + Duration::from_secs(11)));
        assert!(!limiter.admit_at("a", start + Duration::from_secs(12)));
    }

    #[test]
    fn test_rejected_attempts_are_counted() {
        let limiter = RateLimiter::with_window(1, Duration::from_secs(60), true);
        let now = Instant::now();
        assert!(limiter.admit_at("a", now));
        for _ in 0..5 {
            assert!(!limiter.admit_at("a", now));
        }
        let state = limiter.lock().get("a").copied().unwrap();
        assert_eq!(state.count, 6);
    }

    #[test]
    fn test_check_reports_retry_after() {
        let limiter = RateLimiter::with_window(1, Duration::from_secs(30), true);
        tokio_test::assert_ok!(limiter.check("client"));

        let error = tokio_test::assert_err!(limiter.check("client"));
        match error {
            SearchError::RateLimitExceeded {
                client,
                retry_after_secs,
            } => {
                assert_eq!(client, "client");
                assert!((1..=30).contains(&retry_after_secs));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_disabled_always_admits() {
        let limiter = RateLimiter::disabled();
        assert!((0..1000).all(|_| limiter.admit("anyone")));
        assert_eq!(limiter.tracked_clients(), 0);

        let settings = RateLimitSettings {
            enabled: false,
            max_requests: 1,
            window_secs: 60,
        };
        let limiter = RateLimiter::new(&settings);
        assert!(limiter.admit("a") && limiter.admit("a"));
    }

    #[test]
    fn test_prune() {
        let limiter = RateLimiter::with_window(5, Duration::from_secs(10), true);
        let start = Instant::now();
        limiter.admit_at("old", start);
        limiter.admit_at("new", start + Duration::from_secs(8));

        assert_eq!(limiter.prune_at(start + Duration::from_secs(12)), 1);
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn test_concurrent_admission_never_exceeds_quota() {
        let limiter = RateLimiter::with_window(50, Duration::from_secs(3600), true);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = limiter.clone();
                thread::spawn(move || (0..25).filter(|_| limiter.admit("shared")).count())
            })
            .collect();

        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(admitted, 50);
    }
}
