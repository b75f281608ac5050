//! Publish configuration
//!
//! The configuration is an explicit, injected value: it is loaded once,
//! validated before any network activity, and passed to the orchestrator at
//! construction time. Nothing here lives in process-wide state.

mod app_store;
mod play;

use serde::{Deserialize, Serialize};

pub use app_store::{
    AgeRating, AppStoreConfig, Categories, EncryptionDeclaration, GroupLocalization, InAppPurchase,
    Pricing, ReviewInfo, Subscription, SubscriptionGroup, SubscriptionLocalization,
    VersionLocalization,
};
pub use play::{
    Listing, PlayConfig, PlayContact, PlayProduct, PlaySubscription, ProductListing, ReleaseConfig,
};

use crate::errors::{PublishError, Result};

/// Top-level configuration covering both vendor integrations.
///
/// Each section is optional; a flow refuses to start when its section is
/// absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublishConfig {
    #[serde(default)]
    pub app_store: Option<AppStoreConfig>,
    #[serde(default)]
    pub play: Option<PlayConfig>,
}

impl PublishConfig {
    /// Validate every configured section, failing fast before any request.
    ///
    /// # Errors
    /// Returns `PublishError::Config` naming every missing required field.
    pub fn validate(&self) -> Result<()> {
        if self.app_store.is_none() && self.play.is_none() {
            return Err(PublishError::Config(
                "configuration must contain an `app_store` or `play` section".into(),
            ));
        }
        if let Some(app_store) = &self.app_store {
            app_store.validate()?;
        }
        if let Some(play) = &self.play {
            play.validate()?;
        }
        Ok(())
    }

    /// The App Store Connect section, or a config error naming it.
    ///
    /// # Errors
    /// Returns `PublishError::Config` when the section is absent.
    pub fn require_app_store(&self) -> Result<&AppStoreConfig> {
        self.app_store
            .as_ref()
            .ok_or_else(|| PublishError::Config("missing `app_store` configuration section".into()))
    }

    /// The Google Play section, or a config error naming it.
    ///
    /// # Errors
    /// Returns `PublishError::Config` when the section is absent.
    pub fn require_play(&self) -> Result<&PlayConfig> {
        self.play
            .as_ref()
            .ok_or_else(|| PublishError::Config("missing `play` configuration section".into()))
    }
}

/// Collect missing required fields into one fail-fast config error.
pub(crate) fn missing_fields_error(section: &str, missing: &[&str]) -> PublishError {
    PublishError::Config(format!(
        "missing required {section} configuration: {}",
        missing.join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_is_rejected() {
        let config = PublishConfig::default();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, PublishError::Config(_)));
    }

    #[test]
    fn valid_app_store_section_passes() {
        let config = PublishConfig {
            app_store: Some(AppStoreConfig::for_tests()),
            play: None,
        };
        config.validate().unwrap();
    }

    #[test]
    fn missing_fields_are_enumerated() {
        let mut section = AppStoreConfig::for_tests();
        section.key_id.clear();
        section.bundle_id.clear();
        let config = PublishConfig { app_store: Some(section), play: None };

        let err = config.validate().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("key_id"));
        assert!(message.contains("bundle_id"));
        assert!(!message.contains("issuer_id"));
    }
}
