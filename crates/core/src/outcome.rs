//! Request and outcome types
//!
//! A `RequestSpec` describes one API call; it is immutable and retried
//! as-is. The executor classifies every response into a `CallOutcome` so the
//! retrying client can decide between backoff, credential refresh, and
//! terminal failure without inspecting HTTP details.

use std::fmt;
use std::time::Duration;

use serde_json::Value;

/// HTTP method subset used by the publish flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Put,
    Delete,
}

impl Method {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Patch => "PATCH",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One API call: method, path relative to the executor's base URL, optional
/// JSON body.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

impl RequestSpec {
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self { method: Method::Get, path: path.into(), body: None }
    }

    #[must_use]
    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self { method: Method::Post, path: path.into(), body: Some(body) }
    }

    /// POST without a body (used by action endpoints such as edit commit).
    #[must_use]
    pub fn post_empty(path: impl Into<String>) -> Self {
        Self { method: Method::Post, path: path.into(), body: None }
    }

    #[must_use]
    pub fn patch(path: impl Into<String>, body: Value) -> Self {
        Self { method: Method::Patch, path: path.into(), body: Some(body) }
    }

    #[must_use]
    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self { method: Method::Put, path: path.into(), body: Some(body) }
    }
}

/// Why a failed call is worth retrying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryCause {
    /// The service throttled the request (HTTP 429). Carries the server's
    /// suggested wait when a `Retry-After` header was present.
    RateLimited { retry_after: Option<Duration> },
    /// The bearer token was rejected (HTTP 401); the cached credential must
    /// be invalidated before the next attempt.
    CredentialExpired,
}

impl fmt::Display for RetryCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimited { .. } => f.write_str("rate limited"),
            Self::CredentialExpired => f.write_str("credential expired"),
        }
    }
}

/// Terminal failure detail extracted from a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FatalDetail {
    /// Structured vendor error code, when present in the body.
    pub code: Option<String>,
    /// First human-readable error detail, or the status text.
    pub detail: String,
}

impl FatalDetail {
    #[must_use]
    pub fn new(code: Option<String>, detail: impl Into<String>) -> Self {
        Self { code, detail: detail.into() }
    }
}

/// Classified result of a single executed request.
#[derive(Debug, Clone)]
pub enum CallOutcome {
    /// 2xx with the parsed JSON body (`Value::Null` for empty bodies).
    Success(Value),
    /// 429 or 401; recoverable by the retrying client.
    Retryable(RetryCause),
    /// Any other non-2xx response; never retried.
    Fatal(FatalDetail),
}
