//! # Storeship Domain
//!
//! Business domain types and models for store publishing.
//!
//! This crate contains:
//! - Publish error types and Result definitions
//! - Configuration structures for both vendor integrations
//! - Domain constants (token lifetimes, retry bounds, API base URLs)
//!
//! ## Architecture
//! - No dependencies on other storeship crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
