//! # Storeship Infra
//!
//! Infrastructure implementations of the core ports:
//! - `auth`: ES256 assertion provider (App Store Connect) and RS256
//!   service-account provider (Google Play)
//! - `http`: reqwest-backed request executor with response classification
//! - `appstore`: App Store Connect flow (client, publish steps, shared
//!   secret regeneration)
//! - `play`: Google Play flow (edit-based client and publish steps)
//! - `config`: configuration loading and validation

pub mod appstore;
pub mod auth;
pub mod config;
pub mod http;
pub mod play;

pub use appstore::{app_store_flow, regenerate_shared_secret, SharedSecret};
pub use auth::{ConnectTokenProvider, ServiceAccountTokenProvider};
pub use config::{load_config, load_config_from_env};
pub use http::HttpExecutor;
pub use play::play_flow;
