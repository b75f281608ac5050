//! Google Play flow assembly

use storeship_core::{ApiClient, Orchestrator, Phase};
use storeship_domain::PlayConfig;

use super::steps::{Commit, Listings, OpenEdit, Products, Release, Subscriptions};

/// Assemble the full Google Play publish run.
///
/// The edit is opened first and committed last; the catalog steps sit in
/// between even though they converge outside the edit, so their failures
/// surface before anything goes live.
#[must_use]
pub fn play_flow(api: &ApiClient, config: &PlayConfig) -> Orchestrator {
    Orchestrator::new()
        .phase(Phase::new("edit").step(Box::new(OpenEdit::new(api.clone()))))
        .phase(Phase::new("listings").step(Box::new(Listings::new(api.clone(), config))))
        .phase(
            Phase::new("catalog")
                .step(Box::new(Products::new(api.clone(), config)))
                .step(Box::new(Subscriptions::new(api.clone(), config))),
        )
        .phase(
            Phase::new("rollout")
                .step(Box::new(Release::new(api.clone(), config)))
                .step(Box::new(Commit::new(api.clone()))),
        )
}
