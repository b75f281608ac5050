//! Shared helpers for the flow integration tests.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use storeship_core::{ApiClient, Token, TokenProvider};
use storeship_domain::Result;
use storeship_infra::HttpExecutor;

/// Token provider that always hands out the same bearer value.
pub struct StaticTokens;

#[async_trait]
impl TokenProvider for StaticTokens {
    async fn bearer_token(&self) -> Result<Token> {
        Ok(Token::new("test-token".into(), Utc::now(), 1200))
    }

    async fn invalidate(&self) {}
}

/// Retrying client pointed at a wiremock server.
pub fn client(base_url: &str) -> ApiClient {
    let executor = HttpExecutor::new(base_url).unwrap();
    ApiClient::new(Arc::new(executor), Arc::new(StaticTokens))
}
