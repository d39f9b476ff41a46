//! HTTP mapping of search errors

use crate::error::SearchError;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Status code for each error kind
pub fn status_for(error: &SearchError) -> StatusCode {
    match error {
        SearchError::Validation { .. } | SearchError::UnknownEngine { .. } => {
            StatusCode::BAD_REQUEST
        }
        SearchError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
        SearchError::EngineUnavailable { .. } | SearchError::Configuration { .. } => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        SearchError::Provider { .. } | SearchError::Parse { .. } => StatusCode::BAD_GATEWAY,
        SearchError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
    }
}

impl IntoResponse for SearchError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status.is_server_error() {
            tracing::error!("Search failed: {}", self);
        }

        let body = Json(json!({
            "error": self.kind(),
            "message": self.to_string(),
        }));
        let mut response = (status, body).into_response();

        if let SearchError::RateLimitExceeded {
            retry_after_secs, ..
        } = self
        {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }

        response
    }
}
