//! App Store Connect configuration section

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::Result;

use super::missing_fields_error;

/// Everything the App Store Connect publish flow needs.
///
/// The publishing core treats the business values (descriptions, prices,
/// category identifiers) as opaque payload data; only identity and ordering
/// fields are interpreted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppStoreConfig {
    /// API key identifier (the `kid` JWT header).
    pub key_id: String,
    /// Issuer identifier for the signed assertion.
    pub issuer_id: String,
    /// Path to the `.p8` private key file.
    pub key_path: String,

    pub bundle_id: String,
    pub version_string: String,
    #[serde(default)]
    pub build_version: Option<String>,
    #[serde(default)]
    pub copyright: Option<String>,
    /// `MANUAL` unless configured otherwise.
    #[serde(default)]
    pub release_type: Option<String>,

    #[serde(default)]
    pub categories: Option<Categories>,
    #[serde(default)]
    pub age_rating: Option<AgeRating>,
    #[serde(default)]
    pub localizations: BTreeMap<String, VersionLocalization>,
    #[serde(default)]
    pub pricing: Option<Pricing>,
    #[serde(default)]
    pub review_info: Option<ReviewInfo>,
    #[serde(default)]
    pub encryption: Option<EncryptionDeclaration>,
    #[serde(default)]
    pub subscription_group: Option<SubscriptionGroup>,
    #[serde(default)]
    pub subscriptions: Vec<Subscription>,
    #[serde(default)]
    pub in_app_purchases: Vec<InAppPurchase>,

    /// Submit for review at the end of the run. Off by default.
    #[serde(default)]
    pub auto_submit: bool,
}

impl AppStoreConfig {
    /// Check required identity fields, enumerating everything missing.
    ///
    /// # Errors
    /// Returns `PublishError::Config` listing each absent field.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.key_id.is_empty() {
            missing.push("key_id");
        }
        if self.issuer_id.is_empty() {
            missing.push("issuer_id");
        }
        if self.key_path.is_empty() {
            missing.push("key_path");
        }
        if self.bundle_id.is_empty() {
            missing.push("bundle_id");
        }
        if self.version_string.is_empty() {
            missing.push("version_string");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(missing_fields_error("app_store", &missing))
        }
    }

    /// Minimal valid section for unit tests.
    #[must_use]
    pub fn for_tests() -> Self {
        Self {
            key_id: "TESTKEY123".into(),
            issuer_id: "00000000-0000-0000-0000-000000000000".into(),
            key_path: "./AuthKey_TESTKEY123.p8".into(),
            bundle_id: "com.example.app".into(),
            version_string: "1.0.0".into(),
            ..Self::default()
        }
    }
}

/// Primary and optional secondary store category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Categories {
    pub primary: String,
    #[serde(default)]
    pub secondary: Option<String>,
}

/// Age rating questionnaire answers. Every omitted level defaults to `NONE`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgeRating {
    #[serde(default)]
    pub alcohol: Option<String>,
    #[serde(default)]
    pub gambling_simulated: Option<String>,
    #[serde(default)]
    pub violence_cartoon: Option<String>,
    #[serde(default)]
    pub violence_realistic: Option<String>,
    #[serde(default)]
    pub profanity: Option<String>,
    #[serde(default)]
    pub mature_themes: Option<String>,
    #[serde(default)]
    pub sexual_content: Option<String>,
    #[serde(default)]
    pub horror: Option<String>,
    #[serde(default)]
    pub medical_info: Option<String>,
    #[serde(default)]
    pub contests: Option<String>,
    #[serde(default)]
    pub gambling: bool,
    #[serde(default)]
    pub unrestricted_web: bool,
}

/// Per-locale store listing text for an app version.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VersionLocalization {
    pub description: String,
    pub keywords: String,
    #[serde(default)]
    pub whats_new: Option<String>,
    #[serde(default)]
    pub marketing_url: Option<String>,
    #[serde(default)]
    pub support_url: Option<String>,
    #[serde(default)]
    pub promotional_text: Option<String>,
}

/// Price schedule configuration. `schedule_price` of 0.0 means free.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pricing {
    #[serde(default)]
    pub schedule_price: Option<f64>,
    #[serde(default = "Pricing::default_territory")]
    pub base_territory: String,
}

impl Pricing {
    fn default_territory() -> String {
        "USA".into()
    }
}

/// Contact details handed to the review team.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewInfo {
    pub contact_first_name: String,
    pub contact_last_name: String,
    pub contact_phone: String,
    pub contact_email: String,
    #[serde(default)]
    pub demo_account_name: Option<String>,
    #[serde(default)]
    pub demo_account_password: Option<String>,
    #[serde(default)]
    pub demo_account_required: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Export-compliance declaration attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptionDeclaration {
    #[serde(default = "EncryptionDeclaration::default_true")]
    pub exempt: bool,
    #[serde(default)]
    pub contains_proprietary_cryptography: bool,
    #[serde(default)]
    pub contains_third_party_cryptography: bool,
    #[serde(default = "EncryptionDeclaration::default_true")]
    pub available_on_french_store: bool,
    #[serde(default)]
    pub app_description: Option<String>,
}

impl EncryptionDeclaration {
    fn default_true() -> bool {
        true
    }
}

/// A subscription group, keyed by its reference name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubscriptionGroup {
    pub reference_name: String,
    #[serde(default)]
    pub localizations: BTreeMap<String, GroupLocalization>,
}

/// Localized display data for a subscription group.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupLocalization {
    pub name: String,
    #[serde(default)]
    pub custom_app_name: Option<String>,
}

/// An auto-renewable subscription, keyed by its product id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub product_id: String,
    pub reference_name: String,
    #[serde(default = "Subscription::default_group_level")]
    pub group_level: u32,
    #[serde(default)]
    pub family_sharable: bool,
    #[serde(default)]
    pub review_note: Option<String>,
    #[serde(default)]
    pub localizations: BTreeMap<String, SubscriptionLocalization>,
}

impl Subscription {
    fn default_group_level() -> u32 {
        1
    }
}

/// Localized display data for a subscription.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubscriptionLocalization {
    pub name: String,
    pub description: String,
}

/// An in-app purchase, keyed by its product id.
///
/// The create endpoint for these is not yet generally available; the flow
/// records them as not-yet-supported instead of issuing requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InAppPurchase {
    pub product_id: String,
    pub reference_name: String,
    /// `CONSUMABLE` or `NON_CONSUMABLE`.
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub family_sharable: bool,
    #[serde(default)]
    pub review_note: Option<String>,
}
