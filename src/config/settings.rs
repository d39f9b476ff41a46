//! Settings structures for SearchBridge configuration

use crate::engines::EngineKind;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main settings structure, loaded from settings.yml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub server: ServerSettings,
    pub search: SearchSettings,
    pub outgoing: OutgoingSettings,
    pub rate_limit: RateLimitSettings,
    pub cache: CacheSettings,
    pub engines: Vec<EngineConfig>,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_yaml::from_str(&content)?;
        Ok(settings)
    }

    /// Merge with environment variables (SEARCH_* prefix)
    pub fn merge_env(&mut self) {
        self.merge_vars(|key| std::env::var(key).ok());
    }

    /// Merge overrides from an arbitrary variable source
    pub fn merge_vars<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = var("SEARCH_GOOGLE_API_KEY") {
            self.engine_mut(EngineKind::Google).api_key = Some(val);
        }
        if let Some(val) = var("SEARCH_GOOGLE_CX") {
            self.engine_mut(EngineKind::Google).cx = Some(val);
        }
        if let Some(val) = var("SEARCH_BING_API_KEY") {
            self.engine_mut(EngineKind::Bing).api_key = Some(val);
        }
        if let Some(val) = var("SEARCH_API_HOST") {
            self.server.bind_address = val;
        }
        if let Some(port) = var("SEARCH_API_PORT").and_then(|v| v.parse().ok()) {
            self.server.port = port;
        }
        if let Some(val) = var("SEARCH_LOG_LEVEL") {
            self.general.log_level = val.to_lowercase();
        }
        if let Some(val) = var("SEARCH_DEFAULT_ENGINE") {
            self.search.default_engine = val.to_lowercase();
        }
        if let Some(enabled) = var("SEARCH_ENABLE_RATE_LIMIT").and_then(|v| parse_bool(&v)) {
            self.rate_limit.enabled = enabled;
        }
        if let Some(max) = var("SEARCH_RATE_LIMIT").and_then(|v| v.parse().ok()) {
            self.rate_limit.max_requests = max;
        }
        if let Some(window) = var("SEARCH_RATE_LIMIT_WINDOW").and_then(|v| v.parse().ok()) {
            self.rate_limit.window_secs = window;
        }
        if let Some(enabled) = var("SEARCH_ENABLE_CACHE").and_then(|v| parse_bool(&v)) {
            self.cache.enabled = enabled;
        }
        if let Some(ttl) = var("SEARCH_CACHE_TTL").and_then(|v| v.parse().ok()) {
            self.cache.ttl_secs = ttl;
        }
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.search.min_results == 0 || self.search.min_results > self.search.max_results {
            bail!(
                "Invalid result bounds: {}..={}",
                self.search.min_results,
                self.search.max_results
            );
        }
        if !(self.search.min_results..=self.search.max_results)
            .contains(&self.search.default_num_results)
        {
            bail!(
                "default_num_results {} is outside {}..={}",
                self.search.default_num_results,
                self.search.min_results,
                self.search.max_results
            );
        }
        if self.search.default_engine.parse::<EngineKind>().is_err() {
            bail!("Unknown default engine: {}", self.search.default_engine);
        }
        if self.rate_limit.enabled
            && (self.rate_limit.max_requests == 0 || self.rate_limit.window_secs == 0)
        {
            bail!("Rate limit must allow at least one request per non-empty window");
        }
        if self.cache.enabled && self.cache.ttl_secs == 0 {
            bail!("Cache TTL must be greater than 0");
        }
        if self.cache.enabled && self.cache.max_capacity == 0 {
            bail!("Cache max_capacity must be greater than 0");
        }
        if self.outgoing.request_timeout <= 0.0 {
            bail!("request_timeout must be positive");
        }
        for config in &self.engines {
            config.name.parse::<EngineKind>()?;
        }
        Ok(())
    }

    /// Get engine config by kind
    pub fn get_engine(&self, kind: EngineKind) -> Option<&EngineConfig> {
        self.engines
            .iter()
            .find(|e| e.name.parse::<EngineKind>().ok() == Some(kind))
    }

    fn engine_mut(&mut self, kind: EngineKind) -> &mut EngineConfig {
        let index = match self
            .engines
            .iter()
            .position(|e| e.name.parse::<EngineKind>().ok() == Some(kind))
        {
            Some(index) => index,
            None => {
                self.engines.push(EngineConfig::named(kind));
                self.engines.len() - 1
            }
        };
        &mut self.engines[index]
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log filter directive used when RUST_LOG is unset
    pub log_level: String,
    /// Name reported by the health endpoint
    pub instance_name: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            instance_name: "SearchBridge".to_string(),
        }
    }
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub port: u16,
    pub bind_address: String,
    /// Method to determine the client key for rate limiting
    pub real_ip_method: RealIpMethod,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 8000,
            bind_address: "0.0.0.0".to_string(),
            real_ip_method: RealIpMethod::default(),
        }
    }
}

/// Method to determine real client IP
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RealIpMethod {
    /// Use the first address of X-Forwarded-For
    XForwardedFor,
    /// Use X-Real-IP header
    XRealIp,
    /// Use connection IP directly
    #[default]
    Connection,
}

/// Search request policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Engine used when a request names none
    pub default_engine: String,
    pub default_num_results: usize,
    pub min_results: usize,
    pub max_results: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_engine: "google".to_string(),
            default_num_results: 10,
            min_results: 1,
            max_results: 50,
        }
    }
}

/// Outgoing request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingSettings {
    /// Default request timeout in seconds
    pub request_timeout: f64,
    /// Upper bound for any per-engine timeout
    pub max_request_timeout: f64,
    /// Appended to the generated user agent
    pub useragent_suffix: Option<String>,
    pub pool_maxsize: usize,
    pub verify_ssl: bool,
    pub proxies: ProxySettings,
}

impl OutgoingSettings {
    /// Default timeout as a duration
    pub fn default_timeout(&self) -> Duration {
        self.clamp_timeout(self.request_timeout)
    }

    /// Clamp a timeout in seconds to the configured maximum
    pub fn clamp_timeout(&self, seconds: f64) -> Duration {
        Duration::from_secs_f64(seconds.max(0.0).min(self.max_request_timeout))
    }
}

impl Default for OutgoingSettings {
    fn default() -> Self {
        Self {
            request_timeout: crate::DEFAULT_TIMEOUT as f64,
            max_request_timeout: crate::MAX_TIMEOUT as f64,
            useragent_suffix: None,
            pool_maxsize: 20,
            verify_ssl: true,
            proxies: ProxySettings::default(),
        }
    }
}

/// Proxy settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub http: Option<String>,
    pub https: Option<String>,
    pub all: Option<String>,
}

/// Per-client fixed window quota
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    pub enabled: bool,
    /// Requests admitted per window
    pub max_requests: u32,
    pub window_secs: u64,
}

impl RateLimitSettings {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 100,
            window_secs: 3600,
        }
    }
}

/// Response cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,
    pub ttl_secs: u64,
    pub max_capacity: u64,
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 3600,
            max_capacity: 10_000,
        }
    }
}

/// Individual engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Engine identifier (google, bing, duckduckgo)
    pub name: String,
    pub disabled: bool,
    /// Custom timeout for this engine in seconds
    pub timeout: Option<f64>,
    /// API key if required
    pub api_key: Option<String>,
    /// Google Programmable Search Engine ID
    pub cx: Option<String>,
    /// Override of the provider endpoint
    pub base_url: Option<String>,
}

impl EngineConfig {
    pub fn named(kind: EngineKind) -> Self {
        Self {
            name: kind.to_string(),
            ..Default::default()
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            disabled: false,
            timeout: None,
            api_key: None,
            cx: None,
            base_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8000);
        assert_eq!(settings.rate_limit.max_requests, 100);
        assert_eq!(settings.rate_limit.window_secs, 3600);
        assert_eq!(settings.cache.ttl_secs, 3600);
        assert_eq!(settings.search.default_engine, "google");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_yaml_partial_override() {
        let yaml = r#"
search:
  default_engine: duckduckgo
  max_results: 20
rate_limit:
  max_requests: 3
engines:
  - name: bing
    api_key: abc
    timeout: 8
"#;
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.search.default_engine, "duckduckgo");
        assert_eq!(settings.search.max_results, 20);
        assert_eq!(settings.search.min_results, 1);
        assert_eq!(settings.rate_limit.max_requests, 3);
        assert!(settings.rate_limit.enabled);

        let bing = settings.get_engine(EngineKind::Bing).unwrap();
        assert_eq!(bing.api_key.as_deref(), Some("abc"));
        assert_eq!(bing.timeout, Some(8.0));
        assert!(settings.get_engine(EngineKind::Google).is_none());
    }

    #[test]
    fn test_merge_vars() {
        let vars: HashMap<&str, &str> = [
            ("SEARCH_GOOGLE_API_KEY", "g-key"),
            ("SEARCH_GOOGLE_CX", "g-cx"),
            ("SEARCH_API_PORT", "9000"),
            ("SEARCH_ENABLE_CACHE", "false"),
            ("SEARCH_RATE_LIMIT", "250"),
            ("SEARCH_LOG_LEVEL", "DEBUG"),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        settings.merge_vars(|key| vars.get(key).map(|v| v.to_string()));

        let google = settings.get_engine(EngineKind::Google).unwrap();
        assert_eq!(google.api_key.as_deref(), Some("g-key"));
        assert_eq!(google.cx.as_deref(), Some("g-cx"));
        assert_eq!(settings.engines.len(), 1);
        assert_eq!(settings.server.port, 9000);
        assert!(!settings.cache.enabled);
        assert_eq!(settings.rate_limit.max_requests, 250);
        assert_eq!(settings.general.log_level, "debug");
    }

    #[test]
    fn test_merge_vars_ignores_garbage() {
        let mut settings = Settings::default();
        settings.merge_vars(|key| match key {
            "SEARCH_API_PORT" => Some("not-a-port".to_string()),
            "SEARCH_ENABLE_RATE_LIMIT" => Some("maybe".to_string()),
            _ => None,
        });
        assert_eq!(settings.server.port, 8000);
        assert!(settings.rate_limit.enabled);
    }

    #[test]
    fn test_validate_rejects_bad_bounds() {
        let mut settings = Settings::default();
        settings.search.min_results = 10;
        settings.search.max_results = 5;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.search.default_engine = "yandex".to_string();
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.engines.push(EngineConfig {
            name: "altavista".to_string(),
            ..Default::default()
        });
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_zero_limits() {
        let mut settings = Settings::default();
        settings.rate_limit.max_requests = 0;
        assert!(settings.validate().is_err());

        settings.rate_limit.enabled = false;
        assert!(settings.validate().is_ok());

        settings.cache.ttl_secs = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_zero_cache_capacity() {
        let mut settings = Settings::default();
        settings.cache.max_capacity = 0;
        assert!(settings.validate().is_err());

        settings.cache.enabled = false;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_timeout_clamped() {
        let outgoing = OutgoingSettings::default();
        assert_eq!(outgoing.default_timeout(), Duration::from_secs(5));
        assert_eq!(outgoing.clamp_timeout(120.0), Duration::from_secs(30));
    }
}
