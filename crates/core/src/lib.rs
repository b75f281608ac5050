//! # Storeship Core
//!
//! Pure publishing logic - no HTTP or file-system dependencies.
//!
//! This crate contains:
//! - The bearer token model and provider/executor port interfaces (traits)
//! - The retrying API client (backoff on rate limiting, refresh on
//!   credential expiry)
//! - The publish orchestrator (phases, ensure-steps, prerequisite context,
//!   run report)
//! - The run reporter and line formatters
//!
//! ## Architecture Principles
//! - Only depends on `storeship-domain`
//! - No HTTP, signing, or platform code
//! - All external dependencies via traits
//! - Pure, testable publishing logic

pub mod client;
pub mod outcome;
pub mod ports;
pub mod publish;
pub mod reporter;
pub mod testing;
pub mod token;

// Re-export specific items to avoid ambiguity
pub use client::ApiClient;
pub use outcome::{CallOutcome, FatalDetail, Method, RequestSpec, RetryCause};
pub use ports::{RequestExecutor, TokenProvider};
pub use publish::{
    Orchestrator, Phase, PublishContext, PublishStep, RunReport, StepStatus,
};
pub use reporter::{summarize, AnsiFormatter, LineFormatter, PlainFormatter};
pub use token::Token;
