//! Route definitions

use super::handlers;
use super::state::AppState;
use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route(
            "/search",
            get(handlers::search_get).post(handlers::search_post),
        )
        .route("/stats", get(handlers::stats))
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RealIpMethod, Settings};
    use crate::engines::testing::StubEngine;
    use crate::engines::{EngineKind, EngineRegistry};
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app_with(settings: Settings) -> Router {
        let mut registry = EngineRegistry::new();
        registry.register(Arc::new(StubEngine::new(EngineKind::Google)));
        registry.mark_unavailable(EngineKind::Bing, "Bing API key is required");
        create_router(AppState::new(settings, registry))
    }

    fn app() -> Router {
        app_with(Settings::default())
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_index_and_health() {
        let response = app().oneshot(get_request("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({ "message": "Web Search API is running" })
        );

        let response = app().oneshot(get_request("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "healthy");
    }

    #[tokio::test]
    async fn test_get_search_and_cache_header() {
        let app = app();

        let response = app
            .clone()
            .oneshot(get_request("/search?query=rust%20lang&num_results=3"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-cache"], "MISS");

        let body = json_body(response).await;
        assert_eq!(body["query"], "rust lang");
        assert_eq!(body["engine"], "google");
        assert_eq!(body["total_results"], 3);
        assert_eq!(body["results"][2]["position"], 3);

        let response = app
            .oneshot(get_request("/search?query=rust%20lang&num_results=3"))
            .await
            .unwrap();
        assert_eq!(response.headers()["x-cache"], "HIT");
    }

    #[tokio::test]
    async fn test_post_search_with_additional_params() {
        let payload = json!({
            "query": "rust",
            "engine": "Google",
            "num_results": 2,
            "safe_search": false,
            "additional_params": { "dateRestrict": "d7" }
        });
        let request = Request::builder()
            .method("POST")
            .uri("/search")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["results"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let cases = [
            ("/search?query=rust&engine=yandex", StatusCode::BAD_REQUEST, "unknown_engine"),
            ("/search?query=rust&engine=bing", StatusCode::SERVICE_UNAVAILABLE, "engine_unavailable"),
            ("/search?query=%20&engine=google", StatusCode::BAD_REQUEST, "validation_error"),
            ("/search?query=rust&num_results=500", StatusCode::BAD_REQUEST, "validation_error"),
            ("/search?engine=google", StatusCode::BAD_REQUEST, "validation_error"),
        ];

        for (uri, status, kind) in cases {
            let response = app().oneshot(get_request(uri)).await.unwrap();
            assert_eq!(response.status(), status, "{}", uri);
            assert_eq!(json_body(response).await["error"], kind, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_rate_limited_client_gets_429() {
        let mut settings = Settings::default();
        settings.rate_limit.max_requests = 1;
        settings.server.real_ip_method = RealIpMethod::XForwardedFor;
        let app = app_with(settings);

        let request = |query: &str, ip: &str| {
            Request::builder()
                .uri(format!("/search?query={}", query))
                .header("x-forwarded-for", ip)
                .body(Body::empty())
                .unwrap()
        };

        let response = app.clone().oneshot(request("one", "1.2.3.4")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.clone().oneshot(request("two", "1.2.3.4")).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().contains_key(header::RETRY_AFTER));
        assert_eq!(json_body(response).await["error"], "rate_limit_exceeded");

        let response = app.oneshot(request("two", "5.6.7.8")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_stats() {
        let app = app();
        app.clone()
            .oneshot(get_request("/search?query=rust"))
            .await
            .unwrap();

        let response = app.oneshot(get_request("/stats")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["metrics"]["total_searches"], 1);
        assert_eq!(body["engines"]["available"][0]["name"], "google");
        assert_eq!(body["engines"]["unavailable"][0]["engine"], "bing");
        assert_eq!(body["rate_limit"]["tracked_clients"], 1);
    }
}
