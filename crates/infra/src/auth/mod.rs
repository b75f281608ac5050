//! Credential providers
//!
//! Both stores authenticate with short-lived signed assertions. The App
//! Store Connect provider signs an ES256 JWT that is itself the bearer
//! token; the Google provider signs an RS256 assertion and exchanges it for
//! an OAuth access token. Both cache the result and re-mint only near
//! expiry or after an explicit invalidation.

mod assertion;
mod service_account;

pub use assertion::ConnectTokenProvider;
pub use service_account::ServiceAccountTokenProvider;
