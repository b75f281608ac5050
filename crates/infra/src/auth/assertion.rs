//! App Store Connect ES256 assertion provider

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::Serialize;
use storeship_core::testing::{Clock, SystemClock};
use storeship_core::{Token, TokenProvider};
use storeship_domain::constants::{
    APP_STORE_CONNECT_AUDIENCE, TOKEN_CACHE_MARGIN_SECS, TOKEN_REFRESH_SKEW_SECS, TOKEN_TTL_SECS,
};
use storeship_domain::{PublishError, Result};
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Serialize)]
struct ConnectClaims<'a> {
    iss: &'a str,
    iat: i64,
    exp: i64,
    aud: &'a str,
}

/// Mints and caches App Store Connect bearer assertions.
///
/// The assertion is signed for [`TOKEN_TTL_SECS`] but cached for one minute
/// less, so a token handed out is never within a minute of its real expiry.
pub struct ConnectTokenProvider {
    key: EncodingKey,
    key_id: String,
    issuer_id: String,
    clock: Arc<dyn Clock>,
    cached: Mutex<Option<Token>>,
}

impl std::fmt::Debug for ConnectTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectTokenProvider")
            .field("key_id", &self.key_id)
            .field("issuer_id", &self.issuer_id)
            .finish_non_exhaustive()
    }
}

impl ConnectTokenProvider {
    /// Load the `.p8` signing key from `key_path`.
    ///
    /// # Errors
    /// `PublishError::Credential` when the file is unreadable or not a valid
    /// EC PEM key.
    pub fn from_key_file(
        key_path: impl AsRef<Path>,
        key_id: impl Into<String>,
        issuer_id: impl Into<String>,
    ) -> Result<Self> {
        let path = key_path.as_ref();
        let pem = std::fs::read(path).map_err(|e| {
            PublishError::Credential(format!("reading key {}: {e}", path.display()))
        })?;
        Self::from_pem(&pem, key_id, issuer_id)
    }

    /// Build a provider from in-memory PEM key material.
    ///
    /// # Errors
    /// `PublishError::Credential` when the PEM is not a valid EC key.
    pub fn from_pem(
        pem: &[u8],
        key_id: impl Into<String>,
        issuer_id: impl Into<String>,
    ) -> Result<Self> {
        let key = EncodingKey::from_ec_pem(pem)
            .map_err(|e| PublishError::Credential(format!("parsing EC key: {e}")))?;
        Ok(Self {
            key,
            key_id: key_id.into(),
            issuer_id: issuer_id.into(),
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

    fn mint(&self) -> Result<Token> {
        let now = self.clock.now_utc();
        let iat = now.timestamp();
        let claims = ConnectClaims {
            iss: &self.issuer_id,
            iat,
            exp: iat + TOKEN_TTL_SECS,
            aud: APP_STORE_CONNECT_AUDIENCE,
        };
        let header = Header {
            alg: Algorithm::ES256,
            kid: Some(self.key_id.clone()),
            ..Header::default()
        };
        let signed = jsonwebtoken::encode(&header, &claims, &self.key)
            .map_err(|e| PublishError::Credential(format!("signing assertion: {e}")))?;

        debug!(issuer = %self.issuer_id, "minted App Store Connect assertion");
        Ok(Token::new(signed, now, TOKEN_TTL_SECS - TOKEN_CACHE_MARGIN_SECS))
    }
}

#[async_trait]
impl TokenProvider for ConnectTokenProvider {
    async fn bearer_token(&self) -> Result<Token> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.is_fresh(self.clock.now_utc(), TOKEN_REFRESH_SKEW_SECS) {
                return Ok(token.clone());
            }
        }

        let token = self.mint()?;
        *cached = Some(token.clone());
        Ok(token)
    }

    async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use jsonwebtoken::{decode, decode_header, DecodingKey, Validation};
    use serde::Deserialize;
    use storeship_core::testing::MockClock;

    use super::*;

    const EC_PRIVATE: &str =
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/ec_private.pem"));
    const EC_PUBLIC: &str =
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/ec_public.pem"));

    #[derive(Debug, Deserialize)]
    struct DecodedClaims {
        iss: String,
        iat: i64,
        exp: i64,
        aud: String,
    }

    fn provider(clock: &MockClock) -> ConnectTokenProvider {
        ConnectTokenProvider::from_pem(EC_PRIVATE.as_bytes(), "KEY123", "issuer-uuid")
            .unwrap()
            .with_clock(Arc::new(clock.clone()))
    }

    #[tokio::test]
    async fn assertion_carries_the_connect_claims() {
        let clock = MockClock::new();
        let token = provider(&clock).bearer_token().await.unwrap();

        let header = decode_header(&token.value).unwrap();
        assert_eq!(header.alg, Algorithm::ES256);
        assert_eq!(header.kid.as_deref(), Some("KEY123"));

        let mut validation = Validation::new(Algorithm::ES256);
        validation.set_audience(&[APP_STORE_CONNECT_AUDIENCE]);
        let decoded = decode::<DecodedClaims>(
            &token.value,
            &DecodingKey::from_ec_pem(EC_PUBLIC.as_bytes()).unwrap(),
            &validation,
        )
        .unwrap();

        assert_eq!(decoded.claims.iss, "issuer-uuid");
        assert_eq!(decoded.claims.aud, APP_STORE_CONNECT_AUDIENCE);
        assert_eq!(decoded.claims.exp - decoded.claims.iat, TOKEN_TTL_SECS);
    }

    #[tokio::test]
    async fn token_is_reused_while_fresh() {
        let clock = MockClock::new();
        let provider = provider(&clock);

        let first = provider.bearer_token().await.unwrap();
        clock.advance(Duration::from_secs(600));
        let second = provider.bearer_token().await.unwrap();

        assert_eq!(first.value, second.value);
    }

    #[tokio::test]
    async fn token_is_reminted_past_the_cache_window() {
        let clock = MockClock::new();
        let provider = provider(&clock);

        let first = provider.bearer_token().await.unwrap();
        // Cached lifetime is ttl - margin (19 min); crossing the skew
        // boundary forces a fresh signature with a later iat.
        clock.advance(Duration::from_secs(1100));
        let second = provider.bearer_token().await.unwrap();

        assert_ne!(first.value, second.value);
        assert!(second.issued_at > first.issued_at);
    }

    #[tokio::test]
    async fn invalidate_forces_a_fresh_mint() {
        let clock = MockClock::new();
        let provider = provider(&clock);

        let first = provider.bearer_token().await.unwrap();
        clock.advance(Duration::from_secs(1));
        provider.invalidate().await;
        let second = provider.bearer_token().await.unwrap();

        assert_ne!(first.value, second.value);
    }

    #[test]
    fn bad_key_material_is_a_credential_error() {
        let err =
            ConnectTokenProvider::from_pem(b"not a key", "KEY123", "issuer-uuid").unwrap_err();
        assert!(matches!(err, PublishError::Credential(_)));
    }

    #[test]
    fn missing_key_file_is_a_credential_error() {
        let err = ConnectTokenProvider::from_key_file("/nonexistent/AuthKey.p8", "K", "I")
            .unwrap_err();
        assert!(matches!(err, PublishError::Credential(_)));
    }
}
