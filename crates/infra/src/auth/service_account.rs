//! Google service-account OAuth provider
//!
//! Signs an RS256 JWT-bearer assertion with the service-account private key
//! and exchanges it at the account's `token_uri` for a short-lived access
//! token. The access token is cached until shortly before the `expires_in`
//! the token endpoint reported.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use storeship_core::testing::{Clock, SystemClock};
use storeship_core::{Token, TokenProvider};
use storeship_domain::constants::{
    ANDROID_PUBLISHER_SCOPE, JWT_BEARER_GRANT_TYPE, SERVICE_ACCOUNT_ASSERTION_TTL_SECS,
    TOKEN_CACHE_MARGIN_SECS, TOKEN_REFRESH_SKEW_SECS,
};
use storeship_domain::{PublishError, Result};
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
    token_uri: String,
}

#[derive(Serialize)]
struct GrantClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// Mints and caches Android Publisher access tokens.
pub struct ServiceAccountTokenProvider {
    key: EncodingKey,
    client_email: String,
    token_uri: String,
    http: reqwest::Client,
    clock: Arc<dyn Clock>,
    cached: Mutex<Option<Token>>,
}

impl std::fmt::Debug for ServiceAccountTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountTokenProvider")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountTokenProvider {
    /// Load a Google service-account JSON key from `key_path`.
    ///
    /// # Errors
    /// `PublishError::Credential` when the file is unreadable, not valid
    /// service-account JSON, or its private key is not a valid RSA PEM.
    pub fn from_key_file(key_path: impl AsRef<Path>) -> Result<Self> {
        let path = key_path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            PublishError::Credential(format!("reading service account {}: {e}", path.display()))
        })?;
        let account: ServiceAccountKey = serde_json::from_str(&raw).map_err(|e| {
            PublishError::Credential(format!("parsing service account {}: {e}", path.display()))
        })?;
        let key = EncodingKey::from_rsa_pem(account.private_key.as_bytes())
            .map_err(|e| PublishError::Credential(format!("parsing RSA key: {e}")))?;

        Ok(Self {
            key,
            client_email: account.client_email,
            token_uri: account.token_uri,
            http: reqwest::Client::new(),
            clock: Arc::new(SystemClock),
            cached: Mutex::new(None),
        })
    }

    /// Substitute the wall-clock source (tests drive a `MockClock`).
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn assertion(&self) -> Result<String> {
        let iat = self.clock.now_utc().timestamp();
        let claims = GrantClaims {
            iss: &self.client_email,
            scope: ANDROID_PUBLISHER_SCOPE,
            aud: &self.token_uri,
            iat,
            exp: iat + SERVICE_ACCOUNT_ASSERTION_TTL_SECS,
        };
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.key)
            .map_err(|e| PublishError::Credential(format!("signing grant assertion: {e}")))
    }

    async fn exchange(&self) -> Result<Token> {
        let assertion = self.assertion()?;
        let issued_at = self.clock.now_utc();

        let response = self
            .http
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT_TYPE), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| PublishError::Network(format!("token exchange: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Credential(format!(
                "token endpoint returned {}: {body}",
                status.as_u16()
            )));
        }

        let granted: TokenResponse = response
            .json()
            .await
            .map_err(|e| PublishError::Credential(format!("parsing token response: {e}")))?;

        debug!(account = %self.client_email, expires_in = granted.expires_in, "access token granted");
        let cached_lifetime = (granted.expires_in - TOKEN_CACHE_MARGIN_SECS).max(0);
        Ok(Token::new(granted.access_token, issued_at, cached_lifetime))
    }
}

#[async_trait]
impl TokenProvider for ServiceAccountTokenProvider {
    async fn bearer_token(&self) -> Result<Token> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.is_fresh(self.clock.now_utc(), TOKEN_REFRESH_SKEW_SECS) {
                return Ok(token.clone());
            }
        }

        let token = self.exchange().await?;
        *cached = Some(token.clone());
        Ok(token)
    }

    async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }
}
