//! Bearer token model
//!
//! A token is a signed assertion string with its issue and expiry
//! timestamps. Providers cache one and reuse it while it is comfortably far
//! from expiry; the retrying client invalidates it when the remote service
//! rejects it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A signed bearer token with lifecycle metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    /// The signed assertion presented in the `Authorization` header.
    pub value: String,
    pub issued_at: DateTime<Utc>,
    /// Cached expiry. May be conservatively earlier than the expiry embedded
    /// in the assertion itself, to force an early refresh.
    pub expires_at: DateTime<Utc>,
}

impl Token {
    /// Create a token expiring `lifetime_secs` after `issued_at`.
    #[must_use]
    pub fn new(value: String, issued_at: DateTime<Utc>, lifetime_secs: i64) -> Self {
        let expires_at = issued_at + chrono::Duration::seconds(lifetime_secs);
        Self { value, issued_at, expires_at }
    }

    /// Whether the token is still reusable at `now`, with `skew_secs` of
    /// safety margin: reuse while `now < expires_at - skew`.
    #[must_use]
    pub fn is_fresh(&self, now: DateTime<Utc>, skew_secs: i64) -> bool {
        now < self.expires_at - chrono::Duration::seconds(skew_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_within_skew_window() {
        let issued = Utc::now();
        let token = Token::new("sig".into(), issued, 1200);

        assert!(token.is_fresh(issued, 60));
        assert!(token.is_fresh(issued + chrono::Duration::seconds(1100), 60));
    }

    #[test]
    fn stale_once_inside_skew() {
        let issued = Utc::now();
        let token = Token::new("sig".into(), issued, 1200);

        // 1140s leaves exactly the 60s skew; the boundary is stale.
        assert!(!token.is_fresh(issued + chrono::Duration::seconds(1140), 60));
        assert!(!token.is_fresh(issued + chrono::Duration::seconds(1300), 60));
    }
}
