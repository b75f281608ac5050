//! Google Play configuration section

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::Result;

use super::missing_fields_error;

/// Everything the Google Play publish flow needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayConfig {
    /// Path to the service-account key JSON downloaded from the cloud console.
    pub service_account_key_path: String,
    pub package_name: String,
    #[serde(default = "PlayConfig::default_language")]
    pub default_language: String,

    /// Store listing for the default language.
    pub listing: Listing,
    #[serde(default)]
    pub localizations: BTreeMap<String, Listing>,
    #[serde(default)]
    pub contact: Option<PlayContact>,

    #[serde(default)]
    pub products: Vec<PlayProduct>,
    #[serde(default)]
    pub subscriptions: Vec<PlaySubscription>,

    #[serde(default)]
    pub release: Option<ReleaseConfig>,
    /// `internal`, `alpha`, `beta` or `production`.
    #[serde(default = "PlayConfig::default_track")]
    pub track: String,
    /// `true` publishes the release immediately; otherwise it stays a draft.
    #[serde(default)]
    pub auto_publish: bool,
}

impl Default for PlayConfig {
    fn default() -> Self {
        Self {
            service_account_key_path: String::new(),
            package_name: String::new(),
            default_language: Self::default_language(),
            listing: Listing::default(),
            localizations: BTreeMap::new(),
            contact: None,
            products: Vec::new(),
            subscriptions: Vec::new(),
            release: None,
            track: Self::default_track(),
            auto_publish: false,
        }
    }
}

impl PlayConfig {
    fn default_language() -> String {
        "en-US".into()
    }

    fn default_track() -> String {
        "internal".into()
    }

    /// Check required identity fields, enumerating everything missing.
    ///
    /// # Errors
    /// Returns `PublishError::Config` listing each absent field.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.service_account_key_path.is_empty() {
            missing.push("service_account_key_path");
        }
        if self.package_name.is_empty() {
            missing.push("package_name");
        }
        if self.listing.title.is_empty() {
            missing.push("listing.title");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(missing_fields_error("play", &missing))
        }
    }

    /// Minimal valid section for unit tests.
    #[must_use]
    pub fn for_tests() -> Self {
        Self {
            service_account_key_path: "./service-account.json".into(),
            package_name: "com.example.android".into(),
            listing: Listing {
                title: "Example".into(),
                short_description: "Short".into(),
                full_description: "Full".into(),
                video: None,
            },
            ..Self::default()
        }
    }
}

/// A store listing in one language.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Listing {
    pub title: String,
    pub short_description: String,
    pub full_description: String,
    #[serde(default)]
    pub video: Option<String>,
}

/// Developer contact details shown on the store page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayContact {
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
}

/// A managed in-app product.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayProduct {
    pub sku: String,
    /// Price in micro-units of the default currency (0.99 USD = 990000).
    pub default_price_micros: String,
    #[serde(default)]
    pub listings: BTreeMap<String, ProductListing>,
}

/// Localized title/description for a product.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductListing {
    pub title: String,
    pub description: String,
}

/// An auto-renewing subscription with one base plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaySubscription {
    pub sku: String,
    pub base_plan_id: String,
    /// ISO-8601 billing period, `P1M` or `P1Y`.
    pub billing_period: String,
    pub price_micros: String,
    #[serde(default = "PlaySubscription::default_region")]
    pub region_code: String,
    #[serde(default)]
    pub listings: BTreeMap<String, ProductListing>,
}

impl PlaySubscription {
    fn default_region() -> String {
        "US".into()
    }
}

/// Release metadata for the configured track.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReleaseConfig {
    pub version_code: i64,
    pub version_name: String,
    #[serde(default)]
    pub notes: BTreeMap<String, String>,
    /// Staged rollout fraction; a value below 1.0 marks the release
    /// `inProgress` instead of `completed`.
    #[serde(default)]
    pub rollout_fraction: Option<f64>,
}
