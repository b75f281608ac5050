//! Identify phase: resolve the app, its info record, and the target version.

use async_trait::async_trait;
use serde_json::json;
use storeship_core::{ApiClient, PublishContext, PublishStep, RequestSpec, StepStatus};
use storeship_domain::{AppStoreConfig, PublishError, Result};
use tracing::{info, warn};

use crate::appstore::jsonapi;
use super::{version_is_editable, APP_ID, APP_INFO_ID, VERSION_ID, VERSION_STATE};

/// Resolve the app id from the configured bundle id.
///
/// No matching app is terminal: every later step depends on the id, so the
/// run degenerates into prerequisite skips.
pub struct FindApp {
    api: ApiClient,
    bundle_id: String,
}

impl FindApp {
    pub fn new(api: ApiClient, config: &AppStoreConfig) -> Self {
        Self { api, bundle_id: config.bundle_id.clone() }
    }
}

#[async_trait]
impl PublishStep for FindApp {
    fn name(&self) -> &str {
        "find-app"
    }

    async fn ensure(&self, ctx: &mut PublishContext) -> Result<StepStatus> {
        let path = format!("/apps?filter[bundleId]={}&limit=1", self.bundle_id);
        let payload = self.api.call(&RequestSpec::get(&path)).await?;

        match jsonapi::first_id(&payload) {
            Some(id) => {
                info!(app_id = %id, bundle_id = %self.bundle_id, "app resolved");
                ctx.record_id(APP_ID, id);
                Ok(StepStatus::Completed)
            }
            None => Err(PublishError::api(
                path,
                format!("no app found for bundle id {}", self.bundle_id),
            )),
        }
    }
}

/// Fetch the app's `appInfos` record (category updates hang off it).
pub struct AppInfo {
    api: ApiClient,
}

impl AppInfo {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl PublishStep for AppInfo {
    fn name(&self) -> &str {
        "app-info"
    }

    fn prerequisites(&self) -> &[&str] {
        &[APP_ID]
    }

    async fn ensure(&self, ctx: &mut PublishContext) -> Result<StepStatus> {
        let app_id = ctx.require(APP_ID)?.to_string();
        let payload =
            self.api.call(&RequestSpec::get(format!("/apps/{app_id}/appInfos"))).await?;

        match jsonapi::first_id(&payload) {
            Some(id) => {
                ctx.record_id(APP_INFO_ID, id);
                Ok(StepStatus::Completed)
            }
            None => {
                ctx.note_warning("app-info: no appInfos record, categories will be skipped");
                Ok(StepStatus::Warning)
            }
        }
    }
}

/// Find the configured version or create it in `PREPARE_FOR_SUBMISSION`.
pub struct EnsureVersion {
    api: ApiClient,
    version_string: String,
    copyright: Option<String>,
    release_type: Option<String>,
}

impl EnsureVersion {
    pub fn new(api: ApiClient, config: &AppStoreConfig) -> Self {
        Self {
            api,
            version_string: config.version_string.clone(),
            copyright: config.copyright.clone(),
            release_type: config.release_type.clone(),
        }
    }

    async fn create(&self, ctx: &mut PublishContext, app_id: &str) -> Result<StepStatus> {
        let mut attributes = json!({
            "platform": "IOS",
            "versionString": self.version_string,
            "releaseType": self.release_type.as_deref().unwrap_or("MANUAL"),
        });
        if let Some(copyright) = &self.copyright {
            attributes["copyright"] = json!(copyright);
        }

        let body = jsonapi::envelope(
            "appStoreVersions",
            attributes,
            &[("app", jsonapi::linkage("apps", app_id))],
        );
        let payload =
            self.api.call(&RequestSpec::post("/appStoreVersions", body)).await?;
        let id = jsonapi::data_id(&payload).ok_or_else(|| {
            PublishError::api("/appStoreVersions", "create response carried no version id")
        })?;

        info!(version_id = %id, version = %self.version_string, "version created");
        ctx.record_id(VERSION_ID, id);
        ctx.record_id(VERSION_STATE, "PREPARE_FOR_SUBMISSION");
        Ok(StepStatus::Completed)
    }
}

#[async_trait]
impl PublishStep for EnsureVersion {
    fn name(&self) -> &str {
        "ensure-version"
    }

    fn prerequisites(&self) -> &[&str] {
        &[APP_ID]
    }

    async fn ensure(&self, ctx: &mut PublishContext) -> Result<StepStatus> {
        let app_id = ctx.require(APP_ID)?.to_string();
        let path = format!(
            "/apps/{app_id}/appStoreVersions?filter[versionString]={}",
            self.version_string
        );
        let payload = self.api.call(&RequestSpec::get(path)).await?;

        let Some(existing) = jsonapi::first_resource(&payload) else {
            return self.create(ctx, &app_id).await;
        };

        let id = existing["id"].as_str().unwrap_or_default().to_string();
        let state = jsonapi::attr_str(existing, "appStoreState").unwrap_or("UNKNOWN").to_string();
        ctx.record_id(VERSION_ID, &id);
        ctx.record_id(VERSION_STATE, &state);

        if version_is_editable(&state) {
            info!(version_id = %id, state = %state, "reusing existing version");
            Ok(StepStatus::Skipped)
        } else {
            warn!(version_id = %id, state = %state, "version exists in a non-editable state");
            ctx.note_warning(format!(
                "ensure-version: version {} exists in state {state}, metadata updates may be rejected",
                self.version_string
            ));
            Ok(StepStatus::Warning)
        }
    }
}
