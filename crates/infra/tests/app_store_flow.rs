//! End-to-end App Store Connect flow tests against a mocked API.

mod common;

use serde_json::json;
use storeship_core::PublishContext;
use storeship_domain::config::VersionLocalization;
use storeship_domain::AppStoreConfig;
use storeship_infra::appstore::{app_store_flow, regenerate_shared_secret};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_with_localization() -> AppStoreConfig {
    let mut config = AppStoreConfig::for_tests();
    config.version_string = "1.2.3".into();
    config.localizations.insert(
        "en-US".into(),
        VersionLocalization {
            description: "An example app".into(),
            keywords: "example".into(),
            whats_new: Some("Bug fixes".into()),
            ..VersionLocalization::default()
        },
    );
    config
}

async fn mount_identify(server: &MockServer, versions: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/apps"))
        .and(query_param("filter[bundleId]", "com.example.app"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"type": "apps", "id": "app-1", "attributes": {"bundleId": "com.example.app"}}]
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/apps/app-1/appInfos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"type": "appInfos", "id": "info-1"}]
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/apps/app-1/appStoreVersions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": versions })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/builds"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "type": "builds",
                "id": "build-1",
                "attributes": {"version": "100", "processingState": "VALID"}
            }]
        })))
        .mount(server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/appStoreVersions/ver-1/relationships/build"))
        .respond_with(ResponseTemplate::new(204))
        .mount(server)
        .await;
}

#[tokio::test]
async fn fresh_publish_creates_version_then_localizations() {
    let server = MockServer::start().await;
    mount_identify(&server, json!([])).await;

    Mock::given(method("POST"))
        .and(path("/appStoreVersions"))
        .and(body_partial_json(json!({
            "data": {
                "type": "appStoreVersions",
                "attributes": {"versionString": "1.2.3", "platform": "IOS"},
                "relationships": {"app": {"data": {"id": "app-1"}}}
            }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": {"type": "appStoreVersions", "id": "ver-1"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/appStoreVersions/ver-1/appStoreVersionLocalizations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(&server)
        .await;
    // The localization create must reference the version id produced above.
    Mock::given(method("POST"))
        .and(path("/appStoreVersionLocalizations"))
        .and(body_partial_json(json!({
            "data": {
                "attributes": {"locale": "en-US", "whatsNew": "Bug fixes"},
                "relationships": {"appStoreVersion": {"data": {"id": "ver-1"}}}
            }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": {"type": "appStoreVersionLocalizations", "id": "loc-1"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = common::client(&server.uri());
    let report =
        app_store_flow(&api, &config_with_localization()).run(PublishContext::new()).await;

    assert!(report.is_clean(), "fatals: {:?}", report.fatals());
    assert!(report.successes().iter().any(|s| s == "ensure-version: completed"));
    assert!(report.successes().iter().any(|s| s == "localize: completed"));
}

#[tokio::test]
async fn rerun_reuses_the_existing_version_and_updates_in_place() {
    let server = MockServer::start().await;
    mount_identify(
        &server,
        json!([{
            "type": "appStoreVersions",
            "id": "ver-1",
            "attributes": {"versionString": "1.2.3", "appStoreState": "PREPARE_FOR_SUBMISSION"}
        }]),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/appStoreVersions/ver-1/appStoreVersionLocalizations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"type": "appStoreVersionLocalizations", "id": "loc-1"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/appStoreVersionLocalizations/loc-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"type": "appStoreVersionLocalizations", "id": "loc-1"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = common::client(&server.uri());
    let report =
        app_store_flow(&api, &config_with_localization()).run(PublishContext::new()).await;

    // Re-running over published state is success-only: finds turn into
    // skips, creates into updates.
    assert!(report.is_clean(), "fatals: {:?}", report.fatals());
    assert!(report.warnings().is_empty(), "warnings: {:?}", report.warnings());
    assert!(report.successes().iter().any(|s| s == "ensure-version: skipped"));
}

#[tokio::test]
async fn missing_app_fails_identify_and_skips_dependents() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/apps"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(&server)
        .await;

    let api = common::client(&server.uri());
    let report =
        app_store_flow(&api, &config_with_localization()).run(PublishContext::new()).await;

    assert!(!report.is_clean());
    assert!(report.fatals().iter().any(|f| f.starts_with("find-app:")));
    // Dependent steps never reached the network; they report the missing
    // prerequisite instead.
    assert!(report
        .fatals()
        .iter()
        .any(|f| f.contains("missing prerequisite `app_id`")));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn one_failing_step_leaves_the_rest_running() {
    let server = MockServer::start().await;
    mount_identify(
        &server,
        json!([{
            "type": "appStoreVersions",
            "id": "ver-1",
            "attributes": {"versionString": "1.2.3", "appStoreState": "PREPARE_FOR_SUBMISSION"}
        }]),
    )
    .await;

    // Localization lookup blows up with a terminal server error.
    Mock::given(method("GET"))
        .and(path("/appStoreVersions/ver-1/appStoreVersionLocalizations"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "errors": [{"code": "UNEXPECTED_ERROR", "detail": "An unexpected error occurred."}]
        })))
        .mount(&server)
        .await;

    let mut config = config_with_localization();
    config.review_info = Some(storeship_domain::config::ReviewInfo {
        contact_first_name: "Ada".into(),
        contact_last_name: "Lovelace".into(),
        contact_phone: "+1-555-0100".into(),
        contact_email: "ada@example.com".into(),
        ..storeship_domain::config::ReviewInfo::default()
    });
    Mock::given(method("GET"))
        .and(path("/appStoreVersions/ver-1/appStoreReviewDetail"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"type": "appStoreReviewDetails", "id": "rd-1"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/appStoreReviewDetails/rd-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"type": "appStoreReviewDetails", "id": "rd-1"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = common::client(&server.uri());
    let report = app_store_flow(&api, &config).run(PublishContext::new()).await;

    // The locale failure is recorded, and the review step after it still ran.
    assert!(report.fatals().iter().any(|f| f.starts_with("localize [en-US]:")));
    assert!(report.successes().iter().any(|s| s == "review: completed"));
}

#[tokio::test]
async fn shared_secret_is_written_to_the_artifact_file() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/apps/app-1/appSharedSecret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"attributes": {"sharedSecret": "abc123"}}
        })))
        .mount(&server)
        .await;

    let api = common::client(&server.uri());
    let dir = tempfile::tempdir().unwrap();
    let secret = regenerate_shared_secret(&api, "app-1", dir.path()).await.unwrap();

    assert_eq!(secret.secret, "abc123");
    let contents = std::fs::read_to_string(&secret.artifact_path).unwrap();
    assert!(contents.contains("SHARED_SECRET=abc123"));
}

#[tokio::test]
async fn shared_secret_falls_back_to_the_legacy_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/apps/app-1/appSharedSecret"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "errors": [{"code": "NOT_FOUND", "detail": "The resource does not exist."}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/apps/app-1/inAppPurchases/appSharedSecret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"sharedSecret": "legacy-secret"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = common::client(&server.uri());
    let dir = tempfile::tempdir().unwrap();
    let secret = regenerate_shared_secret(&api, "app-1", dir.path()).await.unwrap();

    assert_eq!(secret.secret, "legacy-secret");
}
