//! Google search engine implementation
//!
//! Uses the Custom Search JSON API, which pages results ten at a time.

use super::traits::*;
use crate::config::EngineConfig;
use crate::error::{self, SearchError};
use crate::network::{accept_json, HttpClient};
use crate::results::SearchResult;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Google Custom Search engine
pub struct Google {
    api_key: String,
    cx: String,
    base_url: String,
    timeout: Duration,
    client: HttpClient,
}

impl Google {
    pub const API_URL: &'static str = "https://www.googleapis.com/customsearch/v1";

    /// Results per API call
    const PAGE_SIZE: usize = 10;
    /// The API never serves results past index 100
    const MAX_RESULTS: usize = 100;
    const RESERVED: &'static [&'static str] = &["key", "cx", "q", "hl", "gl", "safe", "start", "num"];

    /// Create an engine; both the API key and the search engine ID are required
    pub fn new(
        client: HttpClient,
        api_key: impl Into<String>,
        cx: impl Into<String>,
    ) -> error::Result<Self> {
        let engine = Self {
            api_key: api_key.into(),
            cx: cx.into(),
            base_url: Self::API_URL.to_string(),
            timeout: client.default_timeout(),
            client,
        };
        engine.ensure_configured()?;
        Ok(engine)
    }

    /// Create an engine from its settings entry
    pub fn from_config(
        config: &EngineConfig,
        client: HttpClient,
        timeout: Duration,
    ) -> error::Result<Self> {
        let mut engine = Self::new(
            client,
            config.api_key.clone().unwrap_or_default(),
            config.cx.clone().unwrap_or_default(),
        )?
        .with_timeout(timeout);
        if let Some(ref url) = config.base_url {
            engine = engine.with_base_url(url);
        }
        Ok(engine)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn ensure_configured(&self) -> error::Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(SearchError::configuration(
                EngineKind::Google,
                "Google API key is required",
            ));
        }
        if self.cx.trim().is_empty() {
            return Err(SearchError::configuration(
                EngineKind::Google,
                "Google search engine ID (cx) is required",
            ));
        }
        Ok(())
    }

    /// Build the request for one page starting at the 1-based index `start`
    pub fn request(
        &self,
        query: &str,
        options: &SearchOptions,
        start: usize,
        num: usize,
    ) -> EngineRequest {
        EngineRequest::get(&self.base_url)
            .header("Accept", accept_json())
            .param("key", &self.api_key)
            .param("cx", &self.cx)
            .param("q", query)
            .param("hl", &options.language)
            .param("gl", &options.country)
            .param("safe", if options.safe_search { "active" } else { "off" })
            .param("start", start)
            .param("num", num.min(Self::PAGE_SIZE))
            .extra_params(EngineKind::Google, &options.extras, Self::RESERVED)
    }

    /// Parse one page, numbering results from `first_position`
    pub fn parse(
        &self,
        response: EngineResponse,
        first_position: u32,
    ) -> error::Result<Vec<SearchResult>> {
        let response = response.error_for_status_with(EngineKind::Google, api_error_message)?;
        let page: GoogleResponse = response.json(EngineKind::Google)?;

        Ok(page
            .items
            .unwrap_or_default()
            .into_iter()
            .zip(first_position..)
            .map(|(item, position)| item.into_result(position))
            .collect())
    }
}

#[async_trait]
impl Engine for Google {
    fn kind(&self) -> EngineKind {
        EngineKind::Google
    }

    fn about(&self) -> EngineAbout {
        EngineAbout::new()
            .website("https://programmablesearchengine.google.com")
            .official_api(true)
            .api_key_required(true)
            .results_format("JSON")
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn execute(
        &self,
        query: &str,
        num_results: usize,
        options: &SearchOptions,
    ) -> error::Result<Vec<SearchResult>> {
        self.ensure_configured()?;

        let wanted = num_results.min(Self::MAX_RESULTS);
        let mut results: Vec<SearchResult> = Vec::with_capacity(wanted);
        let mut start = 1;

        while results.len() < wanted {
            let num = (wanted - results.len()).min(Self::PAGE_SIZE);
            let request = self.request(query, options, start, num);
            let response = self
                .client
                .execute_with_timeout(EngineKind::Google, request, self.timeout)
                .await?;

            let page = self.parse(response, results.len() as u32 + 1)?;
            let received = page.len();
            debug!("Google page at {} returned {} items", start, received);
            results.extend(page);

            if received < num {
                break;
            }
            start += received;
        }

        results.truncate(num_results);
        Ok(results)
    }
}

/// Message from Google's JSON error envelope, if the body is one
fn api_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<GoogleErrorEnvelope>(body)
        .ok()
        .map(|e| e.error.message)
}

#[derive(Debug, Deserialize)]
struct GoogleResponse {
    #[serde(default)]
    items: Option<Vec<GoogleItem>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
    display_link: Option<String>,
    formatted_url: Option<String>,
    html_snippet: Option<String>,
    html_title: Option<String>,
    kind: Option<String>,
    mime: Option<String>,
}

impl GoogleItem {
    fn into_result(self, position: u32) -> SearchResult {
        SearchResult::new(self.title, self.link, EngineKind::Google)
            .with_snippet(self.snippet)
            .with_position(position)
            .with_attribute("displayLink", self.display_link)
            .with_attribute("formattedUrl", self.formatted_url)
            .with_attribute("htmlSnippet", self.html_snippet)
            .with_attribute("htmlTitle", self.html_title)
            .with_attribute("kind", self.kind)
            .with_attribute("mime", self.mime)
    }
}

#[derive(Debug, Deserialize)]
struct GoogleErrorEnvelope {
    error: GoogleErrorBody,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    message: String,
}
