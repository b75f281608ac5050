//! App Store Connect integration
//!
//! Publish steps over the App Store Connect v1 REST API (JSON:API
//! envelopes). The executor's base URL already carries the `/v1` prefix, so
//! step paths start at the resource collections.

mod flow;
mod jsonapi;
mod shared_secret;
pub mod steps;

pub use flow::app_store_flow;
pub use shared_secret::{regenerate_shared_secret, shared_secret_flow, SharedSecret};
