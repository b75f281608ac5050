//! Product and subscription catalog steps.
//!
//! The catalogs live outside edits. Creation conflicts with already
//! published entries are expected on re-runs: products fall back to an
//! update, subscriptions are left alone.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use storeship_core::{ApiClient, PublishContext, PublishStep, RequestSpec, StepStatus};
use storeship_domain::config::{PlayProduct, PlaySubscription, ProductListing};
use storeship_domain::{PlayConfig, Result};
use tracing::{debug, info};

/// Create or update the managed in-app products.
pub struct Products {
    api: ApiClient,
    package_name: String,
    default_language: String,
    products: Vec<PlayProduct>,
}

impl Products {
    pub fn new(api: ApiClient, config: &PlayConfig) -> Self {
        Self {
            api,
            package_name: config.package_name.clone(),
            default_language: config.default_language.clone(),
            products: config.products.clone(),
        }
    }

    fn body(&self, product: &PlayProduct) -> Value {
        json!({
            "packageName": self.package_name,
            "sku": product.sku,
            "status": "active",
            "purchaseType": "managedUser",
            "defaultLanguage": self.default_language,
            "defaultPrice": {
                "priceMicros": product.default_price_micros,
                "currency": "USD",
            },
            "listings": listings_map(&product.listings),
        })
    }

    async fn upsert(&self, product: &PlayProduct) -> Result<bool> {
        let body = self.body(product);
        let create = RequestSpec::post("/inappproducts?autoConvertMissingPrices=true", body.clone());
        match self.api.call(&create).await {
            Ok(_) => Ok(true),
            Err(err) if err.is_already_exists() => {
                debug!(sku = %product.sku, "product exists, updating");
                self.api
                    .call(&RequestSpec::put(
                        format!(
                            "/inappproducts/{}?autoConvertMissingPrices=true",
                            product.sku
                        ),
                        body,
                    ))
                    .await?;
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }
}

#[async_trait]
impl PublishStep for Products {
    fn name(&self) -> &str {
        "products"
    }

    async fn ensure(&self, ctx: &mut PublishContext) -> Result<StepStatus> {
        if self.products.is_empty() {
            return Ok(StepStatus::Skipped);
        }

        let mut failed = 0usize;
        for product in &self.products {
            match self.upsert(product).await {
                Ok(true) => info!(sku = %product.sku, "product created"),
                Ok(false) => info!(sku = %product.sku, "product updated"),
                Err(err) => {
                    failed += 1;
                    ctx.note_fatal(format!("products [{}]: {err}", product.sku));
                }
            }
        }

        if failed == 0 {
            Ok(StepStatus::Completed)
        } else {
            Ok(StepStatus::Warning)
        }
    }
}

/// Create the auto-renewing subscriptions that do not exist yet.
pub struct Subscriptions {
    api: ApiClient,
    package_name: String,
    subscriptions: Vec<PlaySubscription>,
}

impl Subscriptions {
    pub fn new(api: ApiClient, config: &PlayConfig) -> Self {
        Self {
            api,
            package_name: config.package_name.clone(),
            subscriptions: config.subscriptions.clone(),
        }
    }

    fn body(&self, sub: &PlaySubscription) -> Value {
        json!({
            "packageName": self.package_name,
            "productId": sub.sku,
            "basePlans": [{
                "basePlanId": sub.base_plan_id,
                "autoRenewingBasePlanType": {
                    "billingPeriodDuration": sub.billing_period,
                    "gracePeriodDuration": "P7D",
                },
                "regionalConfigs": [{
                    "regionCode": sub.region_code,
                    "newSubscriberAvailability": true,
                    "price": price_from_micros(&sub.price_micros, "USD"),
                }],
            }],
            "listings": subscription_listings(&sub.listings),
        })
    }
}

#[async_trait]
impl PublishStep for Subscriptions {
    fn name(&self) -> &str {
        "subscriptions"
    }

    async fn ensure(&self, ctx: &mut PublishContext) -> Result<StepStatus> {
        if self.subscriptions.is_empty() {
            return Ok(StepStatus::Skipped);
        }

        let mut skipped = 0usize;
        let mut failed = 0usize;
        for sub in &self.subscriptions {
            let create = RequestSpec::post(
                format!("/subscriptions?productId={}", sub.sku),
                self.body(sub),
            );
            match self.api.call(&create).await {
                Ok(_) => info!(sku = %sub.sku, "subscription created"),
                Err(err) if err.is_already_exists() => {
                    debug!(sku = %sub.sku, "subscription already exists");
                    ctx.note_warning(format!(
                        "subscriptions [{}]: already exists, left unchanged",
                        sub.sku
                    ));
                    skipped += 1;
                }
                Err(err) => {
                    failed += 1;
                    ctx.note_fatal(format!("subscriptions [{}]: {err}", sub.sku));
                }
            }
        }

        if failed > 0 || skipped > 0 {
            Ok(StepStatus::Warning)
        } else {
            Ok(StepStatus::Completed)
        }
    }
}

fn listings_map(listings: &BTreeMap<String, ProductListing>) -> Value {
    let map: Map<String, Value> = listings
        .iter()
        .map(|(lang, listing)| {
            (
                lang.clone(),
                json!({ "title": listing.title, "description": listing.description }),
            )
        })
        .collect();
    Value::Object(map)
}

fn subscription_listings(listings: &BTreeMap<String, ProductListing>) -> Value {
    let entries: Vec<Value> = listings
        .iter()
        .map(|(lang, listing)| {
            json!({
                "languageCode": lang,
                "title": listing.title,
                "description": listing.description,
            })
        })
        .collect();
    Value::Array(entries)
}

/// Convert a micro-unit price string into the Money shape the API expects.
fn price_from_micros(micros: &str, currency: &str) -> Value {
    let micros: i64 = micros.parse().unwrap_or(0);
    json!({
        "currencyCode": currency,
        "units": (micros / 1_000_000).to_string(),
        "nanos": (micros % 1_000_000) * 1000,
    })
}
