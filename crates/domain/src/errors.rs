//! Error types used throughout the publishing pipeline

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for storeship
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum PublishError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Signing material could not be read or parsed. Never retried.
    #[error("Credential error: {0}")]
    Credential(String),

    /// Transport-level failure (timeout, connection refused, TLS).
    #[error("Network error: {0}")]
    Network(String),

    /// Terminal API failure, raised after retries are exhausted or on a
    /// non-retryable response. Carries the endpoint and the last cause.
    #[error("API {endpoint}: {cause}")]
    Api {
        endpoint: String,
        /// Structured vendor error code, when the response body carried one.
        code: Option<String>,
        cause: String,
    },

    /// A dependent step's required upstream identifier was never produced.
    #[error("Missing prerequisite: {0}")]
    MissingPrerequisite(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PublishError {
    /// Build a terminal API error for `endpoint` without a structured code.
    pub fn api(endpoint: impl Into<String>, cause: impl Into<String>) -> Self {
        Self::Api { endpoint: endpoint.into(), code: None, cause: cause.into() }
    }

    /// Whether this error reports an idempotent "resource already exists"
    /// conflict.
    ///
    /// The structured vendor code is consulted first (`errors[0].code` on App
    /// Store Connect, `error.errors[0].reason` on Google Play). The substring
    /// match on the detail text is a fallback heuristic for responses that
    /// carry no structured code.
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        match self {
            Self::Api { code, cause, .. } => {
                if let Some(code) = code {
                    let code = code.to_ascii_lowercase();
                    if code.contains("already_exists")
                        || code.contains("duplicate")
                        || code == "alreadyexists"
                    {
                        return true;
                    }
                }
                cause.to_ascii_lowercase().contains("already exists")
            }
            _ => false,
        }
    }
}

/// Result type alias for storeship operations
pub type Result<T> = std::result::Result<T, PublishError>;
