//! Engine traits and types

use crate::error::{self, SearchError};
use crate::results::{Attributes, SearchResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// The closed set of supported search providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Google,
    Bing,
    DuckDuckGo,
}

impl EngineKind {
    pub const ALL: [EngineKind; 3] = [EngineKind::Google, EngineKind::Bing, EngineKind::DuckDuckGo];

    /// Canonical identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Bing => "bing",
            Self::DuckDuckGo => "duckduckgo",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineKind {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "bing" => Ok(Self::Bing),
            "duckduckgo" => Ok(Self::DuckDuckGo),
            _ => Err(SearchError::UnknownEngine {
                engine: s.to_string(),
            }),
        }
    }
}

/// Per-call options every adapter receives alongside the query
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    pub language: String,
    pub country: String,
    pub safe_search: bool,
    /// Opaque provider-specific parameters
    pub extras: Attributes,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            country: "us".to_string(),
            safe_search: true,
            extras: Attributes::new(),
        }
    }
}

/// HTTP request to be made by the engine
#[derive(Debug, Clone)]
pub struct EngineRequest {
    /// URL to request
    pub url: String,
    pub method: HttpMethod,
    pub headers: HashMap<String, String>,
    /// Query parameters
    pub params: Vec<(String, String)>,
    /// POST body data
    pub data: Option<RequestBody>,
}

impl EngineRequest {
    /// Create a GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: HttpMethod::Get,
            headers: HashMap::new(),
            params: Vec::new(),
            data: None,
        }
    }

    /// Create a POST request
    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Post,
            ..Self::get(url)
        }
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    /// Add form data (sets content-type to form-urlencoded)
    pub fn form(mut self, data: Vec<(String, String)>) -> Self {
        self.data = Some(RequestBody::Form(data));
        self
    }

    /// Look up the first value of a query parameter
    pub fn param_value(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Append extras as query parameters, skipping reserved keys
    pub fn extra_params(mut self, engine: EngineKind, extras: &Attributes, reserved: &[&str]) -> Self {
        for (key, value) in extras {
            if reserved.contains(&key.as_str()) {
                tracing::warn!("Ignoring reserved parameter '{}' for {}", key, engine);
                continue;
            }
            self.params.push((key.clone(), value.to_string()));
        }
        self
    }
}

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// Request body types
#[derive(Debug, Clone)]
pub enum RequestBody {
    /// `application/x-www-form-urlencoded` pairs
    Form(Vec<(String, String)>),
}

/// HTTP response from engine request
#[derive(Debug)]
pub struct EngineResponse {
    pub status: u16,
    /// Response body as text
    pub text: String,
}

impl EngineResponse {
    /// Longest body excerpt carried in a provider error
    const EXCERPT_LEN: usize = 512;

    /// Decode the body as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self, engine: EngineKind) -> error::Result<T> {
        serde_json::from_str(&self.text).map_err(|e| SearchError::parse(engine, e))
    }

    /// Check if response is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Fail with a provider error unless the status is 2xx
    pub fn error_for_status(self, engine: EngineKind) -> error::Result<Self> {
        self.error_for_status_with(engine, |_| None)
    }

    /// Like [`error_for_status`](Self::error_for_status), but lets the adapter
    /// pull a message out of the provider's error envelope. `decode` sees the
    /// whole body; only the raw fallback is truncated.
    pub fn error_for_status_with<F>(self, engine: EngineKind, decode: F) -> error::Result<Self>
    where
        F: FnOnce(&str) -> Option<String>,
    {
        if self.is_success() {
            return Ok(self);
        }

        let message = decode(&self.text).unwrap_or_else(|| {
            let excerpt: String = self.text.trim().chars().take(Self::EXCERPT_LEN).collect();
            if excerpt.is_empty() {
                format!("HTTP status {}", self.status)
            } else {
                excerpt
            }
        });

        Err(SearchError::Provider {
            engine,
            status: Some(self.status),
            message,
        })
    }
}

/// Uniform capability every search provider adapter implements
#[async_trait]
pub trait Engine: Send + Sync {
    /// Which provider this adapter talks to
    fn kind(&self) -> EngineKind;

    /// Short description of the engine
    fn about(&self) -> EngineAbout {
        EngineAbout::default()
    }

    /// Bound on each outbound call
    fn timeout(&self) -> Duration {
        Duration::from_secs(crate::DEFAULT_TIMEOUT)
    }

    /// Run a search and return at most `num_results` hits, ranked from 1
    async fn execute(
        &self,
        query: &str,
        num_results: usize,
        options: &SearchOptions,
    ) -> error::Result<Vec<SearchResult>>;
}

/// Engine metadata
#[derive(Debug, Clone, Default, Serialize)]
pub struct EngineAbout {
    pub website: Option<String>,
    /// Whether it uses the official API
    pub use_official_api: bool,
    pub require_api_key: bool,
    /// Result format (HTML, JSON)
    pub results: String,
}

impl EngineAbout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn website(mut self, url: impl Into<String>) -> Self {
        self.website = Some(url.into());
        self
    }

    pub fn official_api(mut self, uses: bool) -> Self {
        self.use_official_api = uses;
        self
    }

    pub fn api_key_required(mut self, required: bool) -> Self {
        self.require_api_key = required;
        self
    }

    pub fn results_format(mut self, format: impl Into<String>) -> Self {
        self.results = format.into();
        self
    }
}
