//! Release phase: build attachment, review details, export compliance,
//! submission.

use async_trait::async_trait;
use serde_json::{json, Value};
use storeship_core::{ApiClient, PublishContext, PublishStep, RequestSpec, StepStatus};
use storeship_domain::config::{EncryptionDeclaration, ReviewInfo};
use storeship_domain::{AppStoreConfig, PublishError, Result};
use tracing::{info, warn};

use crate::appstore::jsonapi;
use super::{APP_ID, BUILD_ID, VERSION_ID, VERSION_STATE};

/// Attach the right build to the version.
///
/// Prefers the build whose version matches the configured build number;
/// otherwise the newest non-expired build is used with a warning.
pub struct AttachBuild {
    api: ApiClient,
    build_version: Option<String>,
}

impl AttachBuild {
    pub fn new(api: ApiClient, config: &AppStoreConfig) -> Self {
        Self { api, build_version: config.build_version.clone() }
    }
}

#[async_trait]
impl PublishStep for AttachBuild {
    fn name(&self) -> &str {
        "attach-build"
    }

    fn prerequisites(&self) -> &[&str] {
        &[APP_ID, VERSION_ID]
    }

    async fn ensure(&self, ctx: &mut PublishContext) -> Result<StepStatus> {
        let app_id = ctx.require(APP_ID)?.to_string();
        let version_id = ctx.require(VERSION_ID)?.to_string();

        let payload = self
            .api
            .call(&RequestSpec::get(format!(
                "/builds?filter[app]={app_id}&filter[expired]=false&sort=-uploadedDate&limit=10"
            )))
            .await?;
        let builds = payload["data"].as_array().cloned().unwrap_or_default();
        if builds.is_empty() {
            ctx.note_warning("attach-build: no processable builds uploaded");
            return Ok(StepStatus::Warning);
        }

        let matched = self.build_version.as_deref().and_then(|wanted| {
            builds.iter().find(|b| jsonapi::attr_str(b, "version") == Some(wanted))
        });
        let build = match matched {
            Some(build) => build,
            None => {
                if let Some(wanted) = &self.build_version {
                    ctx.note_warning(format!(
                        "attach-build: build {wanted} not found, using the newest upload"
                    ));
                }
                &builds[0]
            }
        };

        let build_id = build["id"].as_str().unwrap_or_default().to_string();
        match jsonapi::attr_str(build, "processingState") {
            Some("VALID") | None => {}
            Some("PROCESSING") => {
                ctx.note_warning(format!(
                    "attach-build: build {build_id} is still processing"
                ));
            }
            Some(state) => {
                ctx.note_warning(format!(
                    "attach-build: build {build_id} is in state {state}, not attaching"
                ));
                return Ok(StepStatus::Skipped);
            }
        }

        self.api
            .call(&RequestSpec::patch(
                format!("/appStoreVersions/{version_id}/relationships/build"),
                json!({ "data": { "type": "builds", "id": build_id } }),
            ))
            .await?;

        info!(%build_id, %version_id, "build attached");
        ctx.record_id(BUILD_ID, build_id);
        Ok(StepStatus::Completed)
    }
}

/// Create or update the review-team contact details.
pub struct Review {
    api: ApiClient,
    review: Option<ReviewInfo>,
}

impl Review {
    pub fn new(api: ApiClient, config: &AppStoreConfig) -> Self {
        Self { api, review: config.review_info.clone() }
    }

    fn attributes(review: &ReviewInfo) -> Value {
        let mut attrs = json!({
            "contactFirstName": review.contact_first_name,
            "contactLastName": review.contact_last_name,
            "contactPhone": review.contact_phone,
            "contactEmail": review.contact_email,
            "demoAccountRequired": review.demo_account_required,
        });
        if let Some(name) = &review.demo_account_name {
            attrs["demoAccountName"] = json!(name);
        }
        if let Some(password) = &review.demo_account_password {
            attrs["demoAccountPassword"] = json!(password);
        }
        if let Some(notes) = &review.notes {
            attrs["notes"] = json!(notes);
        }
        attrs
    }
}

#[async_trait]
impl PublishStep for Review {
    fn name(&self) -> &str {
        "review"
    }

    fn prerequisites(&self) -> &[&str] {
        if self.review.is_some() {
            &[VERSION_ID]
        } else {
            &[]
        }
    }

    async fn ensure(&self, ctx: &mut PublishContext) -> Result<StepStatus> {
        let Some(review) = &self.review else {
            return Ok(StepStatus::Skipped);
        };
        let version_id = ctx.require(VERSION_ID)?.to_string();
        let attributes = Self::attributes(review);

        let existing = self
            .api
            .call(&RequestSpec::get(format!(
                "/appStoreVersions/{version_id}/appStoreReviewDetail"
            )))
            .await
            .ok()
            .and_then(|payload| jsonapi::data_id(&payload));

        let result = match existing {
            Some(detail_id) => {
                let body =
                    jsonapi::update_envelope("appStoreReviewDetails", &detail_id, attributes);
                self.api
                    .call(&RequestSpec::patch(
                        format!("/appStoreReviewDetails/{detail_id}"),
                        body,
                    ))
                    .await
            }
            None => {
                let body = jsonapi::envelope(
                    "appStoreReviewDetails",
                    attributes,
                    &[("appStoreVersion", jsonapi::linkage("appStoreVersions", &version_id))],
                );
                self.api.call(&RequestSpec::post("/appStoreReviewDetails", body)).await
            }
        };

        match result {
            Ok(_) => Ok(StepStatus::Completed),
            Err(err) => {
                warn!(%err, "review details rejected");
                ctx.note_warning(format!("review: {err}"));
                Ok(StepStatus::Warning)
            }
        }
    }
}

/// Declare export compliance and link the attached build to it.
pub struct Encryption {
    api: ApiClient,
    declaration: Option<EncryptionDeclaration>,
}

impl Encryption {
    pub fn new(api: ApiClient, config: &AppStoreConfig) -> Self {
        Self { api, declaration: config.encryption.clone() }
    }
}

#[async_trait]
impl PublishStep for Encryption {
    fn name(&self) -> &str {
        "encryption"
    }

    fn prerequisites(&self) -> &[&str] {
        if self.declaration.is_some() {
            &[APP_ID]
        } else {
            &[]
        }
    }

    async fn ensure(&self, ctx: &mut PublishContext) -> Result<StepStatus> {
        let Some(declaration) = &self.declaration else {
            return Ok(StepStatus::Skipped);
        };
        let app_id = ctx.require(APP_ID)?.to_string();

        let mut attributes = json!({
            "usesEncryption": !declaration.exempt,
            "exempt": declaration.exempt,
            "containsProprietaryCryptography": declaration.contains_proprietary_cryptography,
            "containsThirdPartyCryptography": declaration.contains_third_party_cryptography,
            "availableOnFrenchStore": declaration.available_on_french_store,
        });
        if let Some(description) = &declaration.app_description {
            attributes["appDescription"] = json!(description);
        }
        let body = jsonapi::envelope(
            "appEncryptionDeclarations",
            attributes,
            &[("app", jsonapi::linkage("apps", &app_id))],
        );

        let declaration_id =
            match self.api.call(&RequestSpec::post("/appEncryptionDeclarations", body)).await {
                Ok(payload) => jsonapi::data_id(&payload),
                Err(err) if err.is_already_exists() => {
                    info!("encryption declaration already on file");
                    return Ok(StepStatus::Skipped);
                }
                Err(err) => return Err(err),
            };

        if let (Some(declaration_id), Some(build_id)) = (declaration_id, ctx.id(BUILD_ID)) {
            let link = RequestSpec::post(
                format!("/appEncryptionDeclarations/{declaration_id}/relationships/builds"),
                json!({ "data": [{ "type": "builds", "id": build_id }] }),
            );
            if let Err(err) = self.api.call(&link).await {
                ctx.note_warning(format!("encryption: linking build: {err}"));
                return Ok(StepStatus::Warning);
            }
        }

        Ok(StepStatus::Completed)
    }
}

/// Submit the version for review when `auto_submit` is set.
pub struct Submit {
    api: ApiClient,
    auto_submit: bool,
}

impl Submit {
    pub fn new(api: ApiClient, config: &AppStoreConfig) -> Self {
        Self { api, auto_submit: config.auto_submit }
    }
}

#[async_trait]
impl PublishStep for Submit {
    fn name(&self) -> &str {
        "submit"
    }

    fn prerequisites(&self) -> &[&str] {
        if self.auto_submit {
            &[VERSION_ID]
        } else {
            &[]
        }
    }

    async fn ensure(&self, ctx: &mut PublishContext) -> Result<StepStatus> {
        if !self.auto_submit {
            return Ok(StepStatus::Skipped);
        }
        let version_id = ctx.require(VERSION_ID)?.to_string();
        let state = ctx.id(VERSION_STATE).unwrap_or("UNKNOWN");
        if state != "PREPARE_FOR_SUBMISSION" {
            return Err(PublishError::api(
                "/appStoreVersionSubmissions",
                format!("version is in state {state}, expected PREPARE_FOR_SUBMISSION"),
            ));
        }

        let body = jsonapi::envelope(
            "appStoreVersionSubmissions",
            json!({}),
            &[("appStoreVersion", jsonapi::linkage("appStoreVersions", &version_id))],
        );
        self.api.call(&RequestSpec::post("/appStoreVersionSubmissions", body)).await?;

        info!(%version_id, "version submitted for review");
        Ok(StepStatus::Completed)
    }
}
