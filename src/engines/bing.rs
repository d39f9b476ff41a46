//! Bing search engine implementation
//!
//! Talks to the Bing Web Search v7 API, which returns up to 50 results per call.

use super::traits::*;
use crate::config::EngineConfig;
use crate::error::{self, SearchError};
use crate::network::{accept_json, HttpClient};
use crate::results::SearchResult;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Bing Web Search engine
pub struct Bing {
    api_key: String,
    base_url: String,
    timeout: Duration,
    client: HttpClient,
}

impl Bing {
    pub const API_URL: &'static str = "https://api.bing.microsoft.com/v7.0/search";

    const MAX_COUNT: usize = 50;
    const RESERVED: &'static [&'static str] = &["q", "count", "setLang", "cc", "safeSearch"];

    pub fn new(client: HttpClient, api_key: impl Into<String>) -> error::Result<Self> {
        let engine = Self {
            api_key: api_key.into(),
            base_url: Self::API_URL.to_string(),
            timeout: client.default_timeout(),
            client,
        };
        engine.ensure_configured()?;
        Ok(engine)
    }

    pub fn from_config(
        config: &EngineConfig,
        client: HttpClient,
        timeout: Duration,
    ) -> error::Result<Self> {
        let mut engine =
            Self::new(client, config.api_key.clone().unwrap_or_default())?.with_timeout(timeout);
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
                EngineKind::Bing,
                "Bing API key is required",
            ));
        }
        Ok(())
    }

    pub fn request(&self, query: &str, num_results: usize, options: &SearchOptions) -> EngineRequest {
        EngineRequest::get(&self.base_url)
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .header("Accept", accept_json())
            .param("q", query)
            .param("count", num_results.min(Self::MAX_COUNT))
            .param("setLang", &options.language)
            .param("cc", &options.country)
            .param("safeSearch", if options.safe_search { "Strict" } else { "Off" })
            .extra_params(EngineKind::Bing, &options.extras, Self::RESERVED)
    }

    pub fn parse(&self, response: EngineResponse) -> error::Result<Vec<SearchResult>> {
        let response = response.error_for_status_with(EngineKind::Bing, api_error_message)?;
        let body: BingResponse = response.json(EngineKind::Bing)?;

        Ok(body
            .web_pages
            .map(|pages| pages.value)
            .unwrap_or_default()
            .into_iter()
            .zip(1u32..)
            .map(|(page, position)| page.into_result(position))
            .collect())
    }
}

#[async_trait]
impl Engine for Bing {
    fn kind(&self) -> EngineKind {
        EngineKind::Bing
    }

    fn about(&self) -> EngineAbout {
        EngineAbout::new()
            .website("https://www.microsoft.com/bing/apis/bing-web-search-api")
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

        let request = self.request(query, num_results, options);
        let response = self
            .client
            .execute_with_timeout(EngineKind::Bing, request, self.timeout)
            .await?;

        let mut results = self.parse(response)?;
        results.truncate(num_results);
        Ok(results)
    }
}

/// Bing reports failures either as `errors: [..]` or a single `error` object
fn api_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<BingErrorEnvelope>(body)
        .ok()
        .and_then(BingErrorEnvelope::into_message)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BingResponse {
    web_pages: Option<BingWebPages>,
}

#[derive(Debug, Deserialize)]
struct BingWebPages {
    #[serde(default)]
    value: Vec<BingWebPage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BingWebPage {
    id: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    snippet: String,
    display_url: Option<String>,
    date_last_crawled: Option<String>,
}

impl BingWebPage {
    fn into_result(self, position: u32) -> SearchResult {
        SearchResult::new(self.name, self.url, EngineKind::Bing)
            .with_snippet(self.snippet)
            .with_position(position)
            .with_attribute("id", self.id)
            .with_attribute("displayUrl", self.display_url)
            .with_attribute("dateLastCrawled", self.date_last_crawled)
    }
}

#[derive(Debug, Deserialize)]
struct BingErrorEnvelope {
    #[serde(default)]
    errors: Vec<BingErrorBody>,
    error: Option<BingErrorBody>,
}

impl BingErrorEnvelope {
    fn into_message(self) -> Option<String> {
        self.errors
            .into_iter()
            .next()
            .or(self.error)
            .map(|e| e.message)
    }
}

#[derive(Debug, Deserialize)]
struct BingErrorBody {
    message: String,
}
