//! Commerce phase: pricing, subscription groups, subscriptions, IAPs.

use async_trait::async_trait;
use serde_json::json;
use storeship_core::{ApiClient, PublishContext, PublishStep, RequestSpec, StepStatus};
use storeship_domain::config::{
    InAppPurchase, Pricing, Subscription as SubscriptionConfig, SubscriptionGroup,
};
use storeship_domain::{AppStoreConfig, PublishError, Result};
use tracing::{debug, info, warn};

use crate::appstore::jsonapi;
use super::{APP_ID, SUBSCRIPTION_GROUP_ID};

/// Schedule the configured base-territory price.
pub struct Price {
    api: ApiClient,
    pricing: Option<Pricing>,
}

impl Price {
    pub fn new(api: ApiClient, config: &AppStoreConfig) -> Self {
        Self { api, pricing: config.pricing.clone() }
    }

    async fn find_price_point(
        &self,
        app_id: &str,
        territory: &str,
        price: f64,
    ) -> Result<Option<String>> {
        let payload = self
            .api
            .call(&RequestSpec::get(format!(
                "/apps/{app_id}/appPricePoints?filter[territory]={territory}&limit=200"
            )))
            .await?;

        let points = payload["data"].as_array().cloned().unwrap_or_default();
        Ok(points
            .iter()
            .find(|point| {
                jsonapi::attr_str(point, "customerPrice")
                    .and_then(|p| p.parse::<f64>().ok())
                    .is_some_and(|p| (p - price).abs() < f64::EPSILON * 100.0)
            })
            .and_then(|point| point["id"].as_str().map(str::to_string)))
    }
}

#[async_trait]
impl PublishStep for Price {
    fn name(&self) -> &str {
        "price"
    }

    // Config-gated steps carry no prerequisite when idle so an upstream
    // failure does not turn a clean skip into a fatal entry.
    fn prerequisites(&self) -> &[&str] {
        match &self.pricing {
            Some(pricing) if pricing.schedule_price.is_some() => &[APP_ID],
            _ => &[],
        }
    }

    async fn ensure(&self, ctx: &mut PublishContext) -> Result<StepStatus> {
        let Some(pricing) = &self.pricing else {
            return Ok(StepStatus::Skipped);
        };
        let Some(price) = pricing.schedule_price else {
            return Ok(StepStatus::Skipped);
        };
        let app_id = ctx.require(APP_ID)?.to_string();

        let Some(point_id) =
            self.find_price_point(&app_id, &pricing.base_territory, price).await?
        else {
            ctx.note_warning(format!(
                "price: no {} price point matches {price}",
                pricing.base_territory
            ));
            return Ok(StepStatus::Warning);
        };

        let body = json!({
            "data": {
                "type": "appPriceSchedules",
                "attributes": {},
                "relationships": {
                    "app": jsonapi::linkage("apps", &app_id),
                    "baseTerritory": jsonapi::linkage("territories", &pricing.base_territory),
                    "manualPrices": { "data": [{ "type": "appPrices", "id": "${price-1}" }] },
                }
            },
            "included": [{
                "type": "appPrices",
                "id": "${price-1}",
                "attributes": { "startDate": null },
                "relationships": {
                    "appPricePoint": jsonapi::linkage("appPricePoints", &point_id),
                }
            }]
        });

        match self.api.call(&RequestSpec::post("/appPriceSchedules", body)).await {
            Ok(_) => {
                info!(price, territory = %pricing.base_territory, "price schedule applied");
                Ok(StepStatus::Completed)
            }
            Err(err) => {
                warn!(%err, "price schedule rejected");
                ctx.note_warning(format!("price: {err}"));
                Ok(StepStatus::Warning)
            }
        }
    }
}

/// Find or create the subscription group and its localizations.
pub struct SubscriptionGroupStep {
    api: ApiClient,
    group: Option<SubscriptionGroup>,
}

impl SubscriptionGroupStep {
    pub fn new(api: ApiClient, config: &AppStoreConfig) -> Self {
        Self { api, group: config.subscription_group.clone() }
    }

    async fn create(&self, ctx: &mut PublishContext, app_id: &str, group: &SubscriptionGroup) -> Result<String> {
        let body = jsonapi::envelope(
            "subscriptionGroups",
            json!({ "referenceName": group.reference_name }),
            &[("app", jsonapi::linkage("apps", app_id))],
        );
        let payload = self.api.call(&RequestSpec::post("/subscriptionGroups", body)).await?;
        let group_id = jsonapi::data_id(&payload).ok_or_else(|| {
            PublishError::api("/subscriptionGroups", "create response carried no group id")
        })?;

        for (locale, loc) in &group.localizations {
            let mut attributes = json!({ "name": loc.name, "locale": locale });
            if let Some(app_name) = &loc.custom_app_name {
                attributes["customAppName"] = json!(app_name);
            }
            let body = jsonapi::envelope(
                "subscriptionGroupLocalizations",
                attributes,
                &[("subscriptionGroup", jsonapi::linkage("subscriptionGroups", &group_id))],
            );
            if let Err(err) =
                self.api.call(&RequestSpec::post("/subscriptionGroupLocalizations", body)).await
            {
                ctx.note_warning(format!("subscription-group [{locale}]: {err}"));
            }
        }

        Ok(group_id)
    }
}

#[async_trait]
impl PublishStep for SubscriptionGroupStep {
    fn name(&self) -> &str {
        "subscription-group"
    }

    fn prerequisites(&self) -> &[&str] {
        if self.group.is_some() {
            &[APP_ID]
        } else {
            &[]
        }
    }

    async fn ensure(&self, ctx: &mut PublishContext) -> Result<StepStatus> {
        let Some(group) = self.group.clone() else {
            return Ok(StepStatus::Skipped);
        };
        let app_id = ctx.require(APP_ID)?.to_string();

        let payload = self
            .api
            .call(&RequestSpec::get(format!("/apps/{app_id}/subscriptionGroups")))
            .await?;
        let existing = payload["data"].as_array().and_then(|groups| {
            groups
                .iter()
                .find(|g| jsonapi::attr_str(g, "referenceName") == Some(&group.reference_name))
                .and_then(|g| g["id"].as_str().map(str::to_string))
        });

        if let Some(group_id) = existing {
            debug!(%group_id, name = %group.reference_name, "subscription group already exists");
            ctx.record_id(SUBSCRIPTION_GROUP_ID, group_id);
            return Ok(StepStatus::Skipped);
        }

        let group_id = self.create(ctx, &app_id, &group).await?;
        info!(%group_id, name = %group.reference_name, "subscription group created");
        ctx.record_id(SUBSCRIPTION_GROUP_ID, group_id);
        Ok(StepStatus::Completed)
    }
}

/// Create the configured subscriptions that do not exist yet.
pub struct Subscriptions {
    api: ApiClient,
    subscriptions: Vec<SubscriptionConfig>,
}

impl Subscriptions {
    pub fn new(api: ApiClient, config: &AppStoreConfig) -> Self {
        Self { api, subscriptions: config.subscriptions.clone() }
    }

    async fn create(&self, group_id: &str, sub: &SubscriptionConfig) -> Result<()> {
        let mut attributes = json!({
            "name": sub.reference_name,
            "productId": sub.product_id,
            "groupLevel": sub.group_level,
            "familySharable": sub.family_sharable,
        });
        if let Some(note) = &sub.review_note {
            attributes["reviewNote"] = json!(note);
        }
        let body = jsonapi::envelope(
            "subscriptions",
            attributes,
            &[("group", jsonapi::linkage("subscriptionGroups", group_id))],
        );
        let payload = self.api.call(&RequestSpec::post("/subscriptions", body)).await?;
        let sub_id = jsonapi::data_id(&payload).ok_or_else(|| {
            PublishError::api("/subscriptions", "create response carried no subscription id")
        })?;

        for (locale, loc) in &sub.localizations {
            let body = jsonapi::envelope(
                "subscriptionLocalizations",
                json!({ "name": loc.name, "description": loc.description, "locale": locale }),
                &[("subscription", jsonapi::linkage("subscriptions", &sub_id))],
            );
            self.api.call(&RequestSpec::post("/subscriptionLocalizations", body)).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl PublishStep for Subscriptions {
    fn name(&self) -> &str {
        "subscriptions"
    }

    fn prerequisites(&self) -> &[&str] {
        if self.subscriptions.is_empty() {
            &[]
        } else {
            &[SUBSCRIPTION_GROUP_ID]
        }
    }

    async fn ensure(&self, ctx: &mut PublishContext) -> Result<StepStatus> {
        if self.subscriptions.is_empty() {
            return Ok(StepStatus::Skipped);
        }
        let group_id = ctx.require(SUBSCRIPTION_GROUP_ID)?.to_string();

        let payload = self
            .api
            .call(&RequestSpec::get(format!("/subscriptionGroups/{group_id}/subscriptions")))
            .await?;
        let existing: Vec<String> = payload["data"]
            .as_array()
            .map(|subs| {
                subs.iter()
                    .filter_map(|s| jsonapi::attr_str(s, "productId").map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        let mut created = 0usize;
        let mut failed = 0usize;
        for sub in &self.subscriptions {
            if existing.contains(&sub.product_id) {
                debug!(product_id = %sub.product_id, "subscription already exists");
                continue;
            }
            match self.create(&group_id, sub).await {
                Ok(()) => {
                    info!(product_id = %sub.product_id, "subscription created");
                    created += 1;
                }
                Err(err) => {
                    failed += 1;
                    ctx.note_fatal(format!("subscriptions [{}]: {err}", sub.product_id));
                }
            }
        }

        if failed > 0 {
            Ok(StepStatus::Warning)
        } else if created == 0 {
            Ok(StepStatus::Skipped)
        } else {
            Ok(StepStatus::Completed)
        }
    }
}

/// Configured in-app purchases, which the write API does not cover yet.
pub struct InAppPurchases {
    purchases: Vec<InAppPurchase>,
}

impl InAppPurchases {
    pub fn new(config: &AppStoreConfig) -> Self {
        Self { purchases: config.in_app_purchases.clone() }
    }
}

#[async_trait]
impl PublishStep for InAppPurchases {
    fn name(&self) -> &str {
        "in-app-purchases"
    }

    async fn ensure(&self, ctx: &mut PublishContext) -> Result<StepStatus> {
        if self.purchases.is_empty() {
            return Ok(StepStatus::Skipped);
        }
        let ids: Vec<&str> = self.purchases.iter().map(|p| p.product_id.as_str()).collect();
        warn!(products = ?ids, "in-app purchase creation is not yet supported");
        ctx.note_warning(format!(
            "in-app-purchases: create manually in App Store Connect: {}",
            ids.join(", ")
        ));
        Ok(StepStatus::NotYetSupported)
    }
}
