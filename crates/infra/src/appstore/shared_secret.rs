//! App-specific shared secret regeneration
//!
//! The primary endpoint moved at some point; the legacy in-app-purchase
//! path is kept as a fallback so older tenants keep working. The secret is
//! written to a local artifact file so it can be handed to the receipt
//! validation service.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::Value;
use storeship_core::{ApiClient, RequestSpec};
use storeship_domain::{PublishError, Result};
use tracing::{info, warn};

/// A freshly generated secret and where it was persisted.
#[derive(Debug)]
pub struct SharedSecret {
    pub secret: String,
    pub artifact_path: PathBuf,
}

/// Regenerate the app's shared secret and write the artifact file.
///
/// Tries `/apps/{id}/appSharedSecret` first, falling back to the legacy
/// `/apps/{id}/inAppPurchases/appSharedSecret` endpoint.
///
/// # Errors
/// `PublishError::Api` when both endpoints fail, `PublishError::Io` when
/// the artifact cannot be written.
pub async fn regenerate_shared_secret(
    api: &ApiClient,
    app_id: &str,
    out_dir: &Path,
) -> Result<SharedSecret> {
    let primary = format!("/apps/{app_id}/appSharedSecret");
    let payload = match api.call(&RequestSpec::post_empty(&primary)).await {
        Ok(payload) => payload,
        Err(err) => {
            warn!(%err, "primary shared-secret endpoint failed, trying legacy path");
            let legacy = format!("/apps/{app_id}/inAppPurchases/appSharedSecret");
            api.call(&RequestSpec::post_empty(&legacy)).await.map_err(|legacy_err| {
                PublishError::api(
                    legacy,
                    format!(
                        "both endpoints failed ({err}; {legacy_err}); regenerate manually under \
                         App Information > App-Specific Shared Secret"
                    ),
                )
            })?
        }
    };

    let secret = extract_secret(&payload).ok_or_else(|| {
        PublishError::api(primary, "response carried no sharedSecret value")
    })?;

    let artifact_path = write_artifact(app_id, &secret, out_dir)?;
    info!(app_id, path = %artifact_path.display(), "shared secret regenerated");
    Ok(SharedSecret { secret, artifact_path })
}

/// Resolve the app id for `bundle_id` and regenerate its shared secret.
///
/// # Errors
/// `PublishError::Api` when the bundle id matches no app or both
/// regeneration endpoints fail.
pub async fn shared_secret_flow(
    api: &ApiClient,
    bundle_id: &str,
    out_dir: &Path,
) -> Result<SharedSecret> {
    let path = format!("/apps?filter[bundleId]={bundle_id}&limit=1");
    let payload = api.call(&RequestSpec::get(&path)).await?;
    let app_id = crate::appstore::jsonapi::first_id(&payload)
        .ok_or_else(|| PublishError::api(path, format!("no app found for bundle id {bundle_id}")))?;

    regenerate_shared_secret(api, &app_id, out_dir).await
}

fn extract_secret(payload: &Value) -> Option<String> {
    payload["data"]["attributes"]["sharedSecret"]
        .as_str()
        .or_else(|| payload["data"]["sharedSecret"].as_str())
        .map(str::to_string)
}

fn write_artifact(app_id: &str, secret: &str, out_dir: &Path) -> Result<PathBuf> {
    let path = out_dir.join(format!("shared-secret-{app_id}.txt"));
    let contents = format!(
        "# App-specific shared secret\n# App ID: {app_id}\n# Generated: {}\nSHARED_SECRET={secret}\n",
        Utc::now().to_rfc3339(),
    );
    std::fs::write(&path, contents)
        .map_err(|e| PublishError::Io(format!("writing {}: {e}", path.display())))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn secret_is_read_from_either_envelope() {
        let primary = json!({"data": {"attributes": {"sharedSecret": "abc123"}}});
        let legacy = json!({"data": {"sharedSecret": "def456"}});

        assert_eq!(extract_secret(&primary).as_deref(), Some("abc123"));
        assert_eq!(extract_secret(&legacy).as_deref(), Some("def456"));
        assert_eq!(extract_secret(&json!({"data": {}})), None);
    }

    #[test]
    fn artifact_contains_the_secret_and_app_id() {
        let dir = tempfile::tempdir().unwrap();

        let path = write_artifact("6448311069", "abc123", dir.path()).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(path.ends_with("shared-secret-6448311069.txt"));
        assert!(contents.contains("SHARED_SECRET=abc123"));
        assert!(contents.contains("App ID: 6448311069"));
    }
}
