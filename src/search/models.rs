//! Search request model

use crate::engines::SearchOptions;
use crate::results::{Attributes, Scalar};
use serde::{Deserialize, Serialize};

/// A caller's search request
///
/// Built with [`SearchRequest::new`] and the `with_*` builders, or
/// deserialized from the wire. Absent engine and result count fall back to
/// the configured defaults when the search runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    query: String,
    #[serde(default)]
    engine: Option<String>,
    #[serde(default)]
    num_results: Option<usize>,
    #[serde(default = "default_language")]
    language: String,
    #[serde(default = "default_country")]
    country: String,
    #[serde(default = "default_safe_search")]
    safe_search: bool,
    /// Provider-specific parameters passed through to the adapter
    #[serde(default, alias = "additional_params")]
    extras: Attributes,
}

fn default_language() -> String {
    "en".to_string()
}

fn default_country() -> String {
    "us".to_string()
}

fn default_safe_search() -> bool {
    true
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            engine: None,
            num_results: None,
            language: default_language(),
            country: default_country(),
            safe_search: default_safe_search(),
            extras: Attributes::new(),
        }
    }

    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = Some(engine.into());
        self
    }

    pub fn with_num_results(mut self, num_results: usize) -> Self {
        self.num_results = Some(num_results);
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = country.into();
        self
    }

    pub fn with_safe_search(mut self, safe_search: bool) -> Self {
        self.safe_search = safe_search;
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.extras.insert(key.into(), value.into());
        self
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn engine(&self) -> Option<&str> {
        self.engine.as_deref()
    }

    pub fn num_results(&self) -> Option<usize> {
        self.num_results
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn safe_search(&self) -> bool {
        self.safe_search
    }

    pub fn extras(&self) -> &Attributes {
        &self.extras
    }

    /// Options handed to the provider adapter
    pub fn options(&self) -> SearchOptions {
        SearchOptions {
            language: self.language.clone(),
            country: self.country.clone(),
            safe_search: self.safe_search,
            extras: self.extras.clone(),
        }
    }
}
