//! End-to-end Google Play flow tests against a mocked Android Publisher API.

mod common;

use serde_json::json;
use storeship_core::PublishContext;
use storeship_domain::config::{PlayProduct, ProductListing, ReleaseConfig};
use storeship_domain::PlayConfig;
use storeship_infra::play::play_flow;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_with_release() -> PlayConfig {
    let mut config = PlayConfig::for_tests();
    config.release = Some(ReleaseConfig {
        version_code: 42,
        version_name: "1.2.0".into(),
        notes: [("en-US".to_string(), "Fixes".to_string())].into(),
        rollout_fraction: None,
    });
    config
}

async fn mount_edit_lifecycle(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/edits"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "edit-1"})))
        .mount(server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/edits/edit-1/listings/en-US"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"language": "en-US"})))
        .mount(server)
        .await;
}

#[tokio::test]
async fn edit_id_threads_through_listing_release_and_commit() {
    let server = MockServer::start().await;
    mount_edit_lifecycle(&server).await;

    Mock::given(method("PUT"))
        .and(path("/edits/edit-1/tracks/internal"))
        .and(body_partial_json(json!({
            "releases": [{"status": "draft", "versionCodes": ["42"]}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"track": "internal"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/edits/edit-1:commit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "edit-1"})))
        .expect(1)
        .mount(&server)
        .await;

    let api = common::client(&server.uri());
    let report = play_flow(&api, &config_with_release()).run(PublishContext::new()).await;

    assert!(report.is_clean(), "fatals: {:?}", report.fatals());
    assert!(report.successes().iter().any(|s| s == "open-edit: completed"));
    assert!(report.successes().iter().any(|s| s == "release: completed"));
    assert!(report.successes().iter().any(|s| s == "commit: completed"));
}

#[tokio::test]
async fn existing_product_falls_back_to_update() {
    let server = MockServer::start().await;
    mount_edit_lifecycle(&server).await;
    Mock::given(method("POST"))
        .and(path("/edits/edit-1:commit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "edit-1"})))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/inappproducts"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "error": {
                "code": 409,
                "message": "Inappproduct already exists.",
                "errors": [{"reason": "alreadyExists"}]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/inappproducts/premium_upgrade"))
        .and(body_partial_json(json!({"sku": "premium_upgrade", "status": "active"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"sku": "premium_upgrade"})))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = PlayConfig::for_tests();
    config.products.push(PlayProduct {
        sku: "premium_upgrade".into(),
        default_price_micros: "4990000".into(),
        listings: [(
            "en-US".to_string(),
            ProductListing { title: "Premium".into(), description: "All features".into() },
        )]
        .into(),
    });

    let api = common::client(&server.uri());
    let report = play_flow(&api, &config).run(PublishContext::new()).await;

    assert!(report.is_clean(), "fatals: {:?}", report.fatals());
    assert!(report.successes().iter().any(|s| s == "products: completed"));
}

#[tokio::test]
async fn failed_commit_surfaces_validation_errors() {
    let server = MockServer::start().await;
    mount_edit_lifecycle(&server).await;

    Mock::given(method("POST"))
        .and(path("/edits/edit-1:commit"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "code": 400,
                "message": "The edit could not be committed.",
                "errors": [{"reason": "editNotCommittable"}]
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/edits/edit-1:validate"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "code": 400,
                "message": "APK specifies a version code that has already been used.",
                "errors": [{"reason": "versionCodeUsed"}]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = common::client(&server.uri());
    let report = play_flow(&api, &PlayConfig::for_tests()).run(PublishContext::new()).await;

    assert!(report.fatals().iter().any(|f| f.starts_with("commit:")));
    assert!(report
        .warnings()
        .iter()
        .any(|w| w.contains("version code that has already been used")));
}

#[tokio::test]
async fn failed_edit_open_skips_every_staged_step() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/edits"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"code": 403, "message": "The caller does not have permission."}
        })))
        .mount(&server)
        .await;

    let api = common::client(&server.uri());
    let report = play_flow(&api, &config_with_release()).run(PublishContext::new()).await;

    assert!(report.fatals().iter().any(|f| f.starts_with("open-edit:")));
    assert!(report
        .fatals()
        .iter()
        .any(|f| f.contains("missing prerequisite `edit_id`")));
    // Only the edit insert reached the wire.
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}
