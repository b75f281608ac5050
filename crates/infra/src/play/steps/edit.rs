//! Edit lifecycle and store-listing steps.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::{json, Value};
use storeship_core::{ApiClient, PublishContext, PublishStep, RequestSpec, StepStatus};
use storeship_domain::config::{Listing, PlayContact};
use storeship_domain::{PlayConfig, PublishError, Result};
use tracing::info;

use super::EDIT_ID;

/// Open the edit every staged change hangs off.
///
/// Failure here is terminal for the staged steps: they all list the edit id
/// as a prerequisite and degrade into recorded skips.
pub struct OpenEdit {
    api: ApiClient,
}

impl OpenEdit {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl PublishStep for OpenEdit {
    fn name(&self) -> &str {
        "open-edit"
    }

    async fn ensure(&self, ctx: &mut PublishContext) -> Result<StepStatus> {
        let payload = self.api.call(&RequestSpec::post_empty("/edits")).await?;
        let edit_id = payload["id"]
            .as_str()
            .ok_or_else(|| PublishError::api("/edits", "insert response carried no edit id"))?
            .to_string();

        info!(%edit_id, "edit opened");
        ctx.record_id(EDIT_ID, edit_id);
        Ok(StepStatus::Completed)
    }
}

/// Stage the store listings for every configured language, plus the
/// developer contact details.
pub struct Listings {
    api: ApiClient,
    default_language: String,
    listing: Listing,
    localizations: BTreeMap<String, Listing>,
    contact: Option<PlayContact>,
}

impl Listings {
    pub fn new(api: ApiClient, config: &PlayConfig) -> Self {
        Self {
            api,
            default_language: config.default_language.clone(),
            listing: config.listing.clone(),
            localizations: config.localizations.clone(),
            contact: config.contact.clone(),
        }
    }

    fn listing_body(language: &str, listing: &Listing) -> Value {
        let mut body = json!({
            "language": language,
            "title": listing.title,
            "shortDescription": listing.short_description,
            "fullDescription": listing.full_description,
        });
        if let Some(video) = &listing.video {
            body["video"] = json!(video);
        }
        body
    }

    async fn stage_listing(&self, edit_id: &str, language: &str, listing: &Listing) -> Result<()> {
        self.api
            .call(&RequestSpec::put(
                format!("/edits/{edit_id}/listings/{language}"),
                Self::listing_body(language, listing),
            ))
            .await
            .map(|_| ())
    }

    async fn stage_contact(&self, edit_id: &str, contact: &PlayContact) -> Result<()> {
        let mut body = json!({
            "contactEmail": contact.email,
            "defaultLanguage": self.default_language,
        });
        if let Some(phone) = &contact.phone {
            body["contactPhone"] = json!(phone);
        }
        if let Some(website) = &contact.website {
            body["contactWebsite"] = json!(website);
        }
        self.api
            .call(&RequestSpec::patch(format!("/edits/{edit_id}/details"), body))
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl PublishStep for Listings {
    fn name(&self) -> &str {
        "listings"
    }

    fn prerequisites(&self) -> &[&str] {
        &[EDIT_ID]
    }

    async fn ensure(&self, ctx: &mut PublishContext) -> Result<StepStatus> {
        let edit_id = ctx.require(EDIT_ID)?.to_string();
        let mut failed = 0usize;

        let mut languages: Vec<(&str, &Listing)> =
            vec![(self.default_language.as_str(), &self.listing)];
        languages.extend(
            self.localizations.iter().map(|(lang, listing)| (lang.as_str(), listing)),
        );

        for (language, listing) in languages {
            match self.stage_listing(&edit_id, language, listing).await {
                Ok(()) => info!(language, "listing staged"),
                Err(err) => {
                    failed += 1;
                    ctx.note_warning(format!("listings [{language}]: {err}"));
                }
            }
        }

        if let Some(contact) = &self.contact {
            if let Err(err) = self.stage_contact(&edit_id, contact).await {
                failed += 1;
                ctx.note_warning(format!("listings: contact details: {err}"));
            }
        }

        if failed == 0 {
            Ok(StepStatus::Completed)
        } else {
            Ok(StepStatus::Warning)
        }
    }
}
