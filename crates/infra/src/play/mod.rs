//! Google Play integration
//!
//! Edit-based publishing against the Android Publisher v3 API. The
//! executor's base URL carries the `applications/{package}` prefix, so step
//! paths start at `/edits`, `/inappproducts` and `/subscriptions`.

mod flow;
pub mod steps;

pub use flow::play_flow;
