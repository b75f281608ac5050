//! Infrastructure port interfaces
//!
//! The core drives credential minting and request execution exclusively
//! through these traits; the infra crate provides the reqwest and JWT
//! implementations.

use async_trait::async_trait;
use storeship_domain::Result;

use crate::outcome::{CallOutcome, RequestSpec};
use crate::token::Token;

/// Produces short-lived bearer tokens, caching them until near expiry.
///
/// `invalidate` is called exclusively by the retrying API client when the
/// remote service rejects a token; every other component treats tokens as
/// opaque.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Return a cached token while it is fresh, otherwise mint a new one.
    ///
    /// # Errors
    /// Fails only when the underlying signing material cannot be read or
    /// parsed (`PublishError::Credential`) - that failure is fatal and must
    /// not be wrapped in retry.
    async fn bearer_token(&self) -> Result<Token>;

    /// Drop the cached token so the next call mints a fresh one.
    async fn invalidate(&self);
}

/// Issues a single HTTP request and classifies the response.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    /// Execute `spec` with `bearer` injected, within a fixed timeout.
    ///
    /// # Errors
    /// Transport-level failures (timeout, connection refused) surface as
    /// `PublishError::Network`; every HTTP response, including error
    /// statuses, is an `Ok(CallOutcome)`.
    async fn execute(&self, spec: &RequestSpec, bearer: &str) -> Result<CallOutcome>;
}
