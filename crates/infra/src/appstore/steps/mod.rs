//! App Store Connect publish steps
//!
//! Each step converges one slice of store state. Steps communicate through
//! context keys: identify populates the app/version identifiers everything
//! later depends on.

mod commerce;
mod identify;
mod metadata;
mod release;

pub use commerce::{InAppPurchases, Price, SubscriptionGroupStep, Subscriptions};
pub use identify::{AppInfo, EnsureVersion, FindApp};
pub use metadata::{AgeRating, Categorize, Localize};
pub use release::{AttachBuild, Encryption, Review, Submit};

/// Context key: App Store app identifier.
pub const APP_ID: &str = "app_id";
/// Context key: `appInfos` resource id.
pub const APP_INFO_ID: &str = "app_info_id";
/// Context key: `appStoreVersions` resource id.
pub const VERSION_ID: &str = "version_id";
/// Context key: the version's `appStoreState` at identify time.
pub const VERSION_STATE: &str = "version_state";
/// Context key: attached build id.
pub const BUILD_ID: &str = "build_id";
/// Context key: subscription group id.
pub const SUBSCRIPTION_GROUP_ID: &str = "subscription_group_id";

/// Version states in which metadata (including `whatsNew`) is editable.
pub(crate) const EDITABLE_VERSION_STATES: [&str; 3] =
    ["PREPARE_FOR_SUBMISSION", "DEVELOPER_REJECTED", "WAITING_FOR_REVIEW"];

pub(crate) fn version_is_editable(state: &str) -> bool {
    EDITABLE_VERSION_STATES.contains(&state)
}
