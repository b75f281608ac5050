//! Track release and edit commit steps.

use async_trait::async_trait;
use serde_json::{json, Value};
use storeship_core::{ApiClient, PublishContext, PublishStep, RequestSpec, StepStatus};
use storeship_domain::config::ReleaseConfig;
use storeship_domain::{PlayConfig, Result};
use tracing::{info, warn};

use super::EDIT_ID;

/// Stage the release on the configured track.
pub struct Release {
    api: ApiClient,
    track: String,
    auto_publish: bool,
    release: Option<ReleaseConfig>,
}

impl Release {
    pub fn new(api: ApiClient, config: &PlayConfig) -> Self {
        Self {
            api,
            track: config.track.clone(),
            auto_publish: config.auto_publish,
            release: config.release.clone(),
        }
    }

    fn release_body(&self, release: &ReleaseConfig) -> Value {
        let staged = release.rollout_fraction.filter(|f| *f < 1.0);
        let status = if !self.auto_publish {
            "draft"
        } else if staged.is_some() {
            "inProgress"
        } else {
            "completed"
        };

        let notes: Vec<Value> = release
            .notes
            .iter()
            .map(|(language, text)| json!({ "language": language, "text": text }))
            .collect();

        let mut entry = json!({
            "name": release.version_name,
            "versionCodes": [release.version_code.to_string()],
            "status": status,
            "releaseNotes": notes,
        });
        if status == "inProgress" {
            if let Some(fraction) = staged {
                entry["userFraction"] = json!(fraction);
            }
        }

        json!({ "releases": [entry] })
    }
}

#[async_trait]
impl PublishStep for Release {
    fn name(&self) -> &str {
        "release"
    }

    fn prerequisites(&self) -> &[&str] {
        if self.release.is_some() {
            &[EDIT_ID]
        } else {
            &[]
        }
    }

    async fn ensure(&self, ctx: &mut PublishContext) -> Result<StepStatus> {
        let Some(release) = &self.release else {
            return Ok(StepStatus::Skipped);
        };
        let edit_id = ctx.require(EDIT_ID)?.to_string();

        self.api
            .call(&RequestSpec::put(
                format!("/edits/{edit_id}/tracks/{}", self.track),
                self.release_body(release),
            ))
            .await?;

        info!(
            track = %self.track,
            version_code = release.version_code,
            "release staged"
        );
        Ok(StepStatus::Completed)
    }
}

/// Commit the edit, making every staged change live.
///
/// A failed commit is re-checked with `:validate` so the report carries the
/// actionable validation errors, not just the commit failure.
pub struct Commit {
    api: ApiClient,
}

impl Commit {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl PublishStep for Commit {
    fn name(&self) -> &str {
        "commit"
    }

    fn prerequisites(&self) -> &[&str] {
        &[EDIT_ID]
    }

    async fn ensure(&self, ctx: &mut PublishContext) -> Result<StepStatus> {
        let edit_id = ctx.require(EDIT_ID)?.to_string();

        match self.api.call(&RequestSpec::post_empty(format!("/edits/{edit_id}:commit"))).await {
            Ok(_) => {
                info!(%edit_id, "edit committed");
                Ok(StepStatus::Completed)
            }
            Err(commit_err) => {
                warn!(%commit_err, "commit failed, validating the edit");
                match self
                    .api
                    .call(&RequestSpec::post_empty(format!("/edits/{edit_id}:validate")))
                    .await
                {
                    Ok(_) => ctx.note_warning(
                        "commit: edit validates cleanly, the commit failure is transient"
                            .to_string(),
                    ),
                    Err(validate_err) => {
                        ctx.note_warning(format!("commit: validation: {validate_err}"));
                    }
                }
                Err(commit_err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use storeship_core::ApiClient;

    use super::*;

    fn release_config(rollout: Option<f64>) -> ReleaseConfig {
        ReleaseConfig {
            version_code: 42,
            version_name: "1.2.0".into(),
            notes: BTreeMap::from([("en-US".into(), "Fixes".into())]),
            rollout_fraction: rollout,
        }
    }

    fn step(auto_publish: bool) -> Release {
        let mut config = PlayConfig::for_tests();
        config.auto_publish = auto_publish;
        let api = ApiClient::new(
            std::sync::Arc::new(NoopExecutor),
            std::sync::Arc::new(NoopTokens),
        );
        Release::new(api, &config)
    }

    struct NoopExecutor;
    struct NoopTokens;

    #[async_trait]
    impl storeship_core::RequestExecutor for NoopExecutor {
        async fn execute(
            &self,
            _spec: &RequestSpec,
            _bearer: &str,
        ) -> Result<storeship_core::CallOutcome> {
            Ok(storeship_core::CallOutcome::Success(Value::Null))
        }
    }

    #[async_trait]
    impl storeship_core::TokenProvider for NoopTokens {
        async fn bearer_token(&self) -> Result<storeship_core::Token> {
            Ok(storeship_core::Token::new("t".into(), chrono::Utc::now(), 60))
        }

        async fn invalidate(&self) {}
    }

    #[test]
    fn draft_without_auto_publish() {
        let body = step(false).release_body(&release_config(None));
        assert_eq!(body["releases"][0]["status"], "draft");
    }

    #[test]
    fn completed_when_publishing_fully() {
        let body = step(true).release_body(&release_config(None));
        assert_eq!(body["releases"][0]["status"], "completed");
        assert!(body["releases"][0].get("userFraction").is_none());
    }

    #[test]
    fn staged_rollout_marks_in_progress() {
        let body = step(true).release_body(&release_config(Some(0.2)));
        assert_eq!(body["releases"][0]["status"], "inProgress");
        assert_eq!(body["releases"][0]["userFraction"], 0.2);
        assert_eq!(body["releases"][0]["versionCodes"][0], "42");
    }
}
