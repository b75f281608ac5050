//! App Store Connect flow assembly

use storeship_core::{ApiClient, Orchestrator, Phase};
use storeship_domain::AppStoreConfig;

use super::steps::{
    AgeRating, AppInfo, AttachBuild, Categorize, Encryption, EnsureVersion, FindApp,
    InAppPurchases, Localize, Price, Review, SubscriptionGroupStep, Subscriptions, Submit,
};

/// Assemble the full App Store Connect publish run.
///
/// Phase order mirrors the dependency chain: identify produces the app and
/// version ids everything else consumes, and submission is always last.
#[must_use]
pub fn app_store_flow(api: &ApiClient, config: &AppStoreConfig) -> Orchestrator {
    Orchestrator::new()
        .phase(
            Phase::new("identify")
                .step(Box::new(FindApp::new(api.clone(), config)))
                .step(Box::new(AppInfo::new(api.clone())))
                .step(Box::new(EnsureVersion::new(api.clone(), config))),
        )
        .phase(
            Phase::new("metadata")
                .step(Box::new(Categorize::new(api.clone(), config)))
                .step(Box::new(AgeRating::new(api.clone(), config)))
                .step(Box::new(Localize::new(api.clone(), config))),
        )
        .phase(
            Phase::new("commerce")
                .step(Box::new(Price::new(api.clone(), config)))
                .step(Box::new(SubscriptionGroupStep::new(api.clone(), config)))
                .step(Box::new(Subscriptions::new(api.clone(), config)))
                .step(Box::new(InAppPurchases::new(config))),
        )
        .phase(
            Phase::new("release")
                .step(Box::new(AttachBuild::new(api.clone(), config)))
                .step(Box::new(Review::new(api.clone(), config)))
                .step(Box::new(Encryption::new(api.clone(), config)))
                .step(Box::new(Submit::new(api.clone(), config))),
        )
}
