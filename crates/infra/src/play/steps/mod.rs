//! Google Play publish steps
//!
//! Listing and release changes are staged inside an edit and atomically
//! committed at the end; the product and subscription catalogs live outside
//! edits and converge independently.

mod catalog;
mod edit;
mod rollout;

pub use catalog::{Products, Subscriptions};
pub use edit::{Listings, OpenEdit};
pub use rollout::{Commit, Release};

/// Context key: the open edit id all staged changes belong to.
pub const EDIT_ID: &str = "edit_id";
