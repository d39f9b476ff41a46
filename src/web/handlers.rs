//! HTTP request handlers

use super::state::AppState;
use crate::config::RealIpMethod;
use crate::error::SearchError;
use crate::search::SearchRequest;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        ConnectInfo, Query, State,
    },
    http::{HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use std::net::SocketAddr;
use tracing::{info_span, Instrument};
use uuid::Uuid;

const UNKNOWN_CLIENT: &str = "unknown";

/// Service banner
pub async fn index() -> impl IntoResponse {
    Json(json!({ "message": "Web Search API is running" }))
}

/// Health check handler
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "version": crate::VERSION,
        "instance": state.instance_name(),
    }))
}

/// `GET /search?query=...`
pub async fn search_get(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    params: Result<Query<SearchRequest>, QueryRejection>,
) -> Response {
    let client = client_key(
        state.settings.server.real_ip_method,
        &headers,
        connect_info.map(|ConnectInfo(addr)| addr),
    );
    match params {
        Ok(Query(request)) => run_search(state, request, client).await,
        Err(rejection) => SearchError::validation(rejection.body_text()).into_response(),
    }
}

/// `POST /search` with a JSON body
pub async fn search_post(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> Response {
    let client = client_key(
        state.settings.server.real_ip_method,
        &headers,
        connect_info.map(|ConnectInfo(addr)| addr),
    );
    match body {
        Ok(Json(request)) => run_search(state, request, client).await,
        Err(rejection) => SearchError::validation(rejection.body_text()).into_response(),
    }
}

async fn run_search(state: AppState, request: SearchRequest, client: String) -> Response {
    let span = info_span!("search", request_id = %Uuid::new_v4(), client = %client);

    async move {
        match state.search.search_with_status(&request, &client).await {
            Ok((response, cache_status)) => {
                let mut http = Json(response).into_response();
                http.headers_mut()
                    .insert("X-Cache", HeaderValue::from_static(cache_status.as_str()));
                http
            }
            Err(e) => e.into_response(),
        }
    }
    .instrument(span)
    .await
}

/// Identity used for rate limiting
pub fn client_key(method: RealIpMethod, headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let from_header = match method {
        RealIpMethod::XForwardedFor => headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string),
        RealIpMethod::XRealIp => headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string),
        RealIpMethod::Connection => None,
    };

    from_header
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

#[derive(Debug, Serialize)]
struct UnavailableEngine {
    engine: String,
    reason: String,
}

/// Metrics and engine availability
pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    let unavailable: Vec<UnavailableEngine> = state
        .registry
        .unavailable()
        .into_iter()
        .map(|(kind, reason)| UnavailableEngine {
            engine: kind.to_string(),
            reason,
        })
        .collect();

    let engines: Vec<_> = state
        .registry
        .available()
        .into_iter()
        .filter_map(|kind| state.registry.resolve_kind(kind).ok())
        .map(|engine| json!({ "name": engine.kind(), "about": engine.about() }))
        .collect();

    Json(json!({
        "metrics": state.metrics.snapshot(),
        "engines": {
            "available": engines,
            "unavailable": unavailable,
        },
        "cache": {
            "enabled": state.search.cache().is_enabled(),
            "entries": state.search.cache().entry_count(),
        },
        "rate_limit": {
            "enabled": state.search.limiter().is_enabled(),
            "tracked_clients": state.search.limiter().tracked_clients(),
        },
    }))
}
