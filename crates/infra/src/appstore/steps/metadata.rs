//! Metadata phase: categories, age rating, per-locale listing text.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use storeship_core::{ApiClient, PublishContext, PublishStep, RequestSpec, StepStatus};
use storeship_domain::config::{AgeRating as AgeRatingConfig, Categories, VersionLocalization};
use storeship_domain::{AppStoreConfig, Result};
use tracing::{debug, info, warn};

use crate::appstore::jsonapi;
use super::{version_is_editable, APP_INFO_ID, VERSION_ID, VERSION_STATE};

/// Set the primary (and optional secondary) store category.
pub struct Categorize {
    api: ApiClient,
    categories: Option<Categories>,
}

impl Categorize {
    pub fn new(api: ApiClient, config: &AppStoreConfig) -> Self {
        Self { api, categories: config.categories.clone() }
    }
}

#[async_trait]
impl PublishStep for Categorize {
    fn name(&self) -> &str {
        "categorize"
    }

    // No prerequisite when there is nothing to do: the step must skip
    // cleanly instead of reporting a missing upstream id.
    fn prerequisites(&self) -> &[&str] {
        if self.categories.is_some() {
            &[APP_INFO_ID]
        } else {
            &[]
        }
    }

    async fn ensure(&self, ctx: &mut PublishContext) -> Result<StepStatus> {
        let Some(categories) = &self.categories else {
            return Ok(StepStatus::Skipped);
        };
        let info_id = ctx.require(APP_INFO_ID)?.to_string();

        let mut relationships = Map::new();
        relationships.insert(
            "primaryCategory".into(),
            jsonapi::linkage("appCategories", &categories.primary),
        );
        if let Some(secondary) = &categories.secondary {
            relationships.insert(
                "secondaryCategory".into(),
                jsonapi::linkage("appCategories", secondary),
            );
        }
        let body = json!({
            "data": {
                "type": "appInfos",
                "id": info_id,
                "relationships": Value::Object(relationships),
            }
        });

        match self.api.call(&RequestSpec::patch(format!("/appInfos/{info_id}"), body)).await {
            Ok(_) => Ok(StepStatus::Completed),
            Err(err) => {
                warn!(%err, "category update rejected");
                ctx.note_warning(format!("categorize: {err}"));
                Ok(StepStatus::Warning)
            }
        }
    }
}

/// Answer the age-rating questionnaire for the version.
pub struct AgeRating {
    api: ApiClient,
    rating: Option<AgeRatingConfig>,
}

impl AgeRating {
    pub fn new(api: ApiClient, config: &AppStoreConfig) -> Self {
        Self { api, rating: config.age_rating.clone() }
    }

    fn attributes(rating: &AgeRatingConfig) -> Value {
        let mut attrs = Map::new();
        let levels = [
            ("alcoholTobaccoOrDrugUseOrReferences", &rating.alcohol),
            ("gamblingSimulated", &rating.gambling_simulated),
            ("violenceCartoonOrFantasy", &rating.violence_cartoon),
            ("violenceRealistic", &rating.violence_realistic),
            ("profanityOrCrudeHumor", &rating.profanity),
            ("matureOrSuggestiveThemes", &rating.mature_themes),
            ("sexualContentOrNudity", &rating.sexual_content),
            ("horrorOrFearThemes", &rating.horror),
            ("medicalOrTreatmentInformation", &rating.medical_info),
            ("contests", &rating.contests),
        ];
        for (name, level) in levels {
            attrs.insert(name.into(), json!(level.as_deref().unwrap_or("NONE")));
        }
        attrs.insert("gambling".into(), json!(rating.gambling));
        attrs.insert("unrestrictedWebAccess".into(), json!(rating.unrestricted_web));
        Value::Object(attrs)
    }
}

#[async_trait]
impl PublishStep for AgeRating {
    fn name(&self) -> &str {
        "age-rating"
    }

    fn prerequisites(&self) -> &[&str] {
        if self.rating.is_some() {
            &[VERSION_ID]
        } else {
            &[]
        }
    }

    async fn ensure(&self, ctx: &mut PublishContext) -> Result<StepStatus> {
        let Some(rating) = &self.rating else {
            return Ok(StepStatus::Skipped);
        };
        let version_id = ctx.require(VERSION_ID)?.to_string();
        let attributes = Self::attributes(rating);

        let existing = self
            .api
            .call(&RequestSpec::get(format!("/appStoreVersions/{version_id}/ageRatingDeclaration")))
            .await
            .ok()
            .and_then(|payload| jsonapi::data_id(&payload));

        let result = match existing {
            Some(declaration_id) => {
                debug!(%declaration_id, "updating age rating declaration");
                let body =
                    jsonapi::update_envelope("ageRatingDeclarations", &declaration_id, attributes);
                self.api
                    .call(&RequestSpec::patch(
                        format!("/ageRatingDeclarations/{declaration_id}"),
                        body,
                    ))
                    .await
            }
            None => {
                let body = jsonapi::envelope(
                    "ageRatingDeclarations",
                    attributes,
                    &[("appStoreVersion", jsonapi::linkage("appStoreVersions", &version_id))],
                );
                self.api.call(&RequestSpec::post("/ageRatingDeclarations", body)).await
            }
        };

        match result {
            Ok(_) => Ok(StepStatus::Completed),
            Err(err) => {
                warn!(%err, "age rating update rejected");
                ctx.note_warning(format!("age-rating: {err}"));
                Ok(StepStatus::Warning)
            }
        }
    }
}

/// Create or update the version's listing text per configured locale.
///
/// `whatsNew` is only sent while the version state allows editing it; a
/// rejection that names the attribute is retried once without it.
pub struct Localize {
    api: ApiClient,
    localizations: BTreeMap<String, VersionLocalization>,
}

impl Localize {
    pub fn new(api: ApiClient, config: &AppStoreConfig) -> Self {
        Self { api, localizations: config.localizations.clone() }
    }

    fn attributes(loc: &VersionLocalization, include_whats_new: bool) -> Value {
        let mut attrs = Map::new();
        attrs.insert("description".into(), json!(loc.description));
        attrs.insert("keywords".into(), json!(loc.keywords));
        if let Some(url) = &loc.marketing_url {
            attrs.insert("marketingUrl".into(), json!(url));
        }
        if let Some(url) = &loc.support_url {
            attrs.insert("supportUrl".into(), json!(url));
        }
        if let Some(text) = &loc.promotional_text {
            attrs.insert("promotionalText".into(), json!(text));
        }
        if include_whats_new {
            if let Some(whats_new) = &loc.whats_new {
                attrs.insert("whatsNew".into(), json!(whats_new));
            }
        }
        Value::Object(attrs)
    }

    async fn upsert_locale(
        &self,
        version_id: &str,
        locale: &str,
        loc: &VersionLocalization,
        whats_new_editable: bool,
    ) -> Result<()> {
        let existing = self
            .api
            .call(&RequestSpec::get(format!(
                "/appStoreVersions/{version_id}/appStoreVersionLocalizations?filter[locale]={locale}"
            )))
            .await
            .map(|payload| jsonapi::first_id(&payload))?;

        match existing {
            Some(loc_id) => {
                let body = jsonapi::update_envelope(
                    "appStoreVersionLocalizations",
                    &loc_id,
                    Self::attributes(loc, whats_new_editable),
                );
                let patch = RequestSpec::patch(
                    format!("/appStoreVersionLocalizations/{loc_id}"),
                    body,
                );
                match self.api.call(&patch).await {
                    Ok(_) => Ok(()),
                    // A stale-state rejection of whatsNew alone should not
                    // lose the rest of the listing text.
                    Err(err) if whats_new_editable && err.to_string().contains("whatsNew") => {
                        warn!(locale, "retrying localization update without whatsNew");
                        let body = jsonapi::update_envelope(
                            "appStoreVersionLocalizations",
                            &loc_id,
                            Self::attributes(loc, false),
                        );
                        self.api
                            .call(&RequestSpec::patch(
                                format!("/appStoreVersionLocalizations/{loc_id}"),
                                body,
                            ))
                            .await
                            .map(|_| ())
                    }
                    Err(err) => Err(err),
                }
            }
            None => {
                let body = {
                    let mut attrs = Self::attributes(loc, whats_new_editable);
                    attrs["locale"] = json!(locale);
                    jsonapi::envelope(
                        "appStoreVersionLocalizations",
                        attrs,
                        &[("appStoreVersion", jsonapi::linkage("appStoreVersions", version_id))],
                    )
                };
                self.api
                    .call(&RequestSpec::post("/appStoreVersionLocalizations", body))
                    .await
                    .map(|_| ())
            }
        }
    }
}

#[async_trait]
impl PublishStep for Localize {
    fn name(&self) -> &str {
        "localize"
    }

    fn prerequisites(&self) -> &[&str] {
        if self.localizations.is_empty() {
            &[]
        } else {
            &[VERSION_ID]
        }
    }

    async fn ensure(&self, ctx: &mut PublishContext) -> Result<StepStatus> {
        if self.localizations.is_empty() {
            return Ok(StepStatus::Skipped);
        }
        let version_id = ctx.require(VERSION_ID)?.to_string();
        let whats_new_editable =
            ctx.id(VERSION_STATE).is_some_and(version_is_editable);

        let mut failed = 0usize;
        for (locale, loc) in &self.localizations {
            match self.upsert_locale(&version_id, locale, loc, whats_new_editable).await {
                Ok(()) => info!(locale, "localization converged"),
                Err(err) => {
                    failed += 1;
                    ctx.note_fatal(format!("localize [{locale}]: {err}"));
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
