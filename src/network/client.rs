//! HTTP client for making requests to search providers

use super::user_agent::{accept_language, generate_user_agent};
use crate::config::OutgoingSettings;
use crate::engines::{EngineKind, EngineRequest, EngineResponse, HttpMethod, RequestBody};
use crate::error::{self, SearchError};
use anyhow::Result;
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::debug;

/// HTTP client wrapper shared by all engines
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    default_timeout: Duration,
    user_agent: String,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self> {
        Self::with_settings(&OutgoingSettings::default())
    }

    /// Create a new HTTP client with custom settings
    pub fn with_settings(settings: &OutgoingSettings) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs_f64(settings.max_request_timeout))
            .pool_max_idle_per_host(settings.pool_maxsize)
            .gzip(true)
            .brotli(true);

        if !settings.verify_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(ref proxy_url) = settings.proxies.all {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        } else {
            if let Some(ref http) = settings.proxies.http {
                builder = builder.proxy(reqwest::Proxy::http(http)?);
            }
            if let Some(ref https) = settings.proxies.https {
                builder = builder.proxy(reqwest::Proxy::https(https)?);
            }
        }

        let client = builder.build()?;

        let mut user_agent = generate_user_agent();
        if let Some(ref suffix) = settings.useragent_suffix {
            user_agent = format!("{} {}", user_agent, suffix);
        }

        Ok(Self {
            client,
            default_timeout: settings.default_timeout(),
            user_agent,
        })
    }

    /// Execute an engine request, failing with `Timeout` once `timeout` elapses
    pub async fn execute_with_timeout(
        &self,
        engine: EngineKind,
        request: EngineRequest,
        timeout: Duration,
    ) -> error::Result<EngineResponse> {
        let mut req_builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };

        req_builder = req_builder.timeout(timeout);

        // Defaults first, so engine headers win
        if !has_header(&request, "user-agent") {
            req_builder = req_builder.header("User-Agent", &self.user_agent);
        }
        if !has_header(&request, "accept-language") {
            req_builder = req_builder.header("Accept-Language", accept_language("en"));
        }
        for (key, value) in &request.headers {
            req_builder = req_builder.header(key, value);
        }

        if !request.params.is_empty() {
            req_builder = req_builder.query(&request.params);
        }

        if let Some(RequestBody::Form(data)) = request.data {
            req_builder = req_builder.form(&data);
        }

        debug!("{} {:?} {}", engine, request.method, request.url);

        let response = req_builder
            .send()
            .await
            .map_err(|e| SearchError::from_transport(engine, timeout, &e))?;

        Self::parse_response(engine, timeout, response).await
    }

    async fn parse_response(
        engine: EngineKind,
        timeout: Duration,
        response: Response,
    ) -> error::Result<EngineResponse> {
        let status = response.status().as_u16();

        let text = response
            .text()
            .await
            .map_err(|e| SearchError::from_transport(engine, timeout, &e))?;

        Ok(EngineResponse { status, text })
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }
}

fn has_header(request: &EngineRequest, name: &str) -> bool {
    request.headers.keys().any(|k| k.eq_ignore_ascii_case(name))
}
