//! Result type definitions

use crate::engines::EngineKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// A scalar value in an opaque provider or request map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

/// Ordered key-value map of scalars
pub type Attributes = BTreeMap<String, Scalar>;

/// A single normalized search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub link: String,
    pub snippet: String,
    /// Engine that produced this result
    pub source: EngineKind,
    /// 1-based rank within the response
    pub position: u32,
    /// Provider-specific extras
    #[serde(default)]
    pub additional_data: Attributes,
}

impl SearchResult {
    /// Create a result with no snippet or extras
    pub fn new(title: impl Into<String>, link: impl Into<String>, source: EngineKind) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            snippet: String::new(),
            source,
            position: 0,
            additional_data: Attributes::new(),
        }
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }

    pub fn with_position(mut self, position: u32) -> Self {
        self.position = position;
        self
    }

    /// Add a provider attribute, skipping absent values
    pub fn with_attribute(mut self, key: &str, value: Option<impl Into<Scalar>>) -> Self {
        if let Some(value) = value {
            self.additional_data.insert(key.to_string(), value.into());
        }
        self
    }
}

/// Response envelope for one orchestrated search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Echo of the requested query
    pub query: String,
    pub results: Vec<SearchResult>,
    pub total_results: usize,
    /// Elapsed provider time in seconds
    pub search_time: f64,
    /// Engine that was actually invoked
    pub engine: EngineKind,
}

impl SearchResponse {
    /// Build a response, capping results to `num_results` and numbering
    /// positions from 1 in provider order.
    pub fn assemble(
        query: impl Into<String>,
        engine: EngineKind,
        mut results: Vec<SearchResult>,
        num_results: usize,
        elapsed: Duration,
    ) -> Self {
        results.truncate(num_results);
        for (i, result) in results.iter_mut().enumerate() {
            result.position = (i + 1) as u32;
        }

        Self {
            query: query.into(),
            total_results: results.len(),
            results,
            search_time: elapsed.as_secs_f64(),
            engine,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(n: usize) -> Vec<SearchResult> {
        (0..n)
            .map(|i| {
                SearchResult::new(
                    format!("Result {}", i),
                    format!("https://example.com/{}", i),
                    EngineKind::Bing,
                )
                .with_position(42)
            })
            .collect()
    }

    #[test]
    fn test_assemble_caps_and_renumbers() {
        let response = SearchResponse::assemble(
            "rust",
            EngineKind::Bing,
            sample(8),
            5,
            Duration::from_millis(250),
        );

        assert_eq!(response.results.len(), 5);
        assert_eq!(response.total_results, 5);
        let positions: Vec<u32> = response.results.iter().map(|r| r.position).collect();
        assert_eq!(positions, vec![1, 2, 3, 4, 5]);
        assert_eq!(response.results[0].title, "Result 0");
        assert!((response.search_time - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_assemble_fewer_than_requested() {
        let response =
            SearchResponse::assemble("rust", EngineKind::Google, sample(2), 10, Duration::ZERO);
        assert_eq!(response.total_results, 2);
        assert_eq!(response.results[1].position, 2);
    }

    #[test]
    fn test_attribute_skips_missing_values() {
        let result = SearchResult::new("t", "https://www.rust-lang.org/learn", EngineKind::Google)
            .with_attribute("displayLink", Some("www.rust-lang.org"))
            .with_attribute("mime", None::<String>);

        assert_eq!(result.additional_data.len(), 1);
        assert_eq!(
            result.additional_data.get("displayLink"),
            Some(&Scalar::from("www.rust-lang.org"))
        );
    }

    #[test]
    fn test_scalar_untagged_serde() {
        let attrs: Attributes =
            serde_json::from_str(r#"{"a": true, "b": 3, "c": 1.5, "d": "x"}"#).unwrap();
        assert_eq!(attrs["a"], Scalar::Bool(true));
        assert_eq!(attrs["b"], Scalar::Integer(3));
        assert_eq!(attrs["c"], Scalar::Float(1.5));
        assert_eq!(attrs["d"].to_string(), "x");
    }

    #[test]
    fn test_response_serialization_uses_engine_name() {
        let response =
            SearchResponse::assemble("ai", EngineKind::DuckDuckGo, sample(1), 1, Duration::ZERO);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["engine"], "duckduckgo");
        assert_eq!(json["results"][0]["position"], 1);
    }
}
