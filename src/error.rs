//! Error taxonomy for search orchestration
//!
//! Every failure surfaces as a specific [`SearchError`] variant so the
//! transport layer can decide status codes and retry-ability.

use crate::engines::EngineKind;
use std::time::Duration;
use thiserror::Error;

/// Errors produced by the search core
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SearchError {
    /// Malformed request, rejected before any downstream work
    #[error("Invalid request: {reason}")]
    Validation { reason: String },

    /// The client exhausted its quota for the current window
    #[error("Rate limit exceeded for {client}, retry after {retry_after_secs}s")]
    RateLimitExceeded {
        client: String,
        retry_after_secs: u64,
    },

    /// The engine identifier is not one of the supported providers
    #[error("Unknown search engine: {engine}")]
    UnknownEngine { engine: String },

    /// The engine is supported but was not configured at startup
    #[error("Search engine {engine} is unavailable: {reason}")]
    EngineUnavailable { engine: EngineKind, reason: String },

    /// The provider answered with a failure or could not be reached
    #[error("{engine} error{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Provider {
        engine: EngineKind,
        status: Option<u16>,
        message: String,
    },

    /// The provider did not answer within the configured timeout
    #[error("{engine} timed out after {timeout_ms}ms")]
    Timeout { engine: EngineKind, timeout_ms: u64 },

    /// The provider payload could not be decoded
    #[error("Failed to parse {engine} response: {message}")]
    Parse { engine: EngineKind, message: String },

    /// The adapter lacks credentials or settings it needs
    #[error("{engine} is not configured: {message}")]
    Configuration { engine: EngineKind, message: String },
}

impl SearchError {
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    pub fn configuration(engine: EngineKind, message: impl Into<String>) -> Self {
        Self::Configuration {
            engine,
            message: message.into(),
        }
    }

    pub fn parse(engine: EngineKind, message: impl ToString) -> Self {
        Self::Parse {
            engine,
            message: message.to_string(),
        }
    }

    /// Map a transport failure from reqwest onto the taxonomy
    pub fn from_transport(engine: EngineKind, timeout: Duration, error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout {
                engine,
                timeout_ms: timeout.as_millis() as u64,
            }
        } else if error.is_decode() {
            Self::parse(engine, error)
        } else {
            Self::Provider {
                engine,
                status: error.status().map(|s| s.as_u16()),
                message: error.to_string(),
            }
        }
    }

    /// Stable snake_case code for this error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation_error",
            Self::RateLimitExceeded { .. } => "rate_limit_exceeded",
            Self::UnknownEngine { .. } => "unknown_engine",
            Self::EngineUnavailable { .. } => "engine_unavailable",
            Self::Provider { .. } => "provider_error",
            Self::Timeout { .. } => "timeout",
            Self::Parse { .. } => "parse_error",
            Self::Configuration { .. } => "configuration_error",
        }
    }

    /// Whether the caller may retry the same request later
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimitExceeded { .. }
                | Self::Provider { .. }
                | Self::Timeout { .. }
                | Self::Parse { .. }
        )
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, SearchError>;
