//! Reqwest-backed request executor
//!
//! Issues one request per call and classifies the response for the retrying
//! client: 2xx is success, 429 and 401 are retryable, everything else is
//! fatal with the most specific error detail the body offers. Both vendor
//! error shapes are understood (App Store Connect JSON:API `errors[]` and
//! Google's `error` object).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use storeship_core::{CallOutcome, FatalDetail, Method, RequestExecutor, RequestSpec, RetryCause};
use storeship_domain::constants::DEFAULT_REQUEST_TIMEOUT_SECS;
use storeship_domain::{PublishError, Result};
use tracing::debug;

/// Executes [`RequestSpec`]s against a fixed base URL.
pub struct HttpExecutor {
    http: reqwest::Client,
    base_url: String,
}

impl HttpExecutor {
    /// Build an executor for `base_url` with the standard request timeout.
    ///
    /// # Errors
    /// `PublishError::Internal` when the TLS backend cannot be initialized.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
    }

    /// Build an executor with a custom timeout.
    ///
    /// # Errors
    /// `PublishError::Internal` when the TLS backend cannot be initialized.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PublishError::Internal(format!("http client init: {e}")))?;
        Ok(Self { http, base_url: base_url.into() })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl RequestExecutor for HttpExecutor {
    async fn execute(&self, spec: &RequestSpec, bearer: &str) -> Result<CallOutcome> {
        let method = match spec.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Patch => reqwest::Method::PATCH,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut request = self.http.request(method, self.url(&spec.path)).bearer_auth(bearer);
        if let Some(body) = &spec.body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            PublishError::Network(format!("{} {}: {e}", spec.method, spec.path))
        })?;

        let status = response.status();
        let retry_after = parse_retry_after(response.headers());
        let body = response.bytes().await.map_err(|e| {
            PublishError::Network(format!("{} {}: reading body: {e}", spec.method, spec.path))
        })?;

        debug!(status = status.as_u16(), path = %spec.path, "response received");
        Ok(classify(status, retry_after, &body))
    }
}

fn classify(status: StatusCode, retry_after: Option<Duration>, body: &[u8]) -> CallOutcome {
    if status.is_success() {
        let payload = serde_json::from_slice(body).unwrap_or(Value::Null);
        return CallOutcome::Success(payload);
    }

    match status {
        StatusCode::TOO_MANY_REQUESTS => {
            CallOutcome::Retryable(RetryCause::RateLimited { retry_after })
        }
        StatusCode::UNAUTHORIZED => CallOutcome::Retryable(RetryCause::CredentialExpired),
        _ => CallOutcome::Fatal(extract_detail(status, body)),
    }
}

fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Pull the most specific failure description out of an error body.
///
/// App Store Connect wraps failures in a JSON:API `errors` array with
/// `code`/`detail`; Google nests an `error` object carrying `message` and a
/// `reason` per sub-error. Falls back to the HTTP status line for anything
/// else.
fn extract_detail(status: StatusCode, body: &[u8]) -> FatalDetail {
    let fallback = || {
        FatalDetail::new(
            None,
            format!("HTTP {} {}", status.as_u16(), status.canonical_reason().unwrap_or("error")),
        )
    };

    let Ok(parsed) = serde_json::from_slice::<Value>(body) else {
        return fallback();
    };

    if let Some(first) = parsed["errors"].get(0) {
        let detail = first["detail"]
            .as_str()
            .or_else(|| first["title"].as_str())
            .map(str::to_string);
        let code = first["code"].as_str().map(str::to_string);
        if let Some(detail) = detail {
            return FatalDetail::new(code, detail);
        }
    }

    let error = &parsed["error"];
    if let Some(message) = error["message"].as_str() {
        let code = error["errors"]
            .get(0)
            .and_then(|e| e["reason"].as_str())
            .or_else(|| error["status"].as_str())
            .map(str::to_string);
        return FatalDetail::new(code, message.to_string());
    }

    if let Some(message) = parsed["message"].as_str() {
        return FatalDetail::new(None, message.to_string());
    }

    fallback()
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{bearer_token, body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn executor_for(server: &MockServer) -> HttpExecutor {
        HttpExecutor::new(server.uri()).unwrap()
    }

    #[tokio::test]
    async fn success_yields_parsed_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/apps"))
            .and(bearer_token("tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .mount(&server)
            .await;

        let outcome = executor_for(&server)
            .await
            .execute(&RequestSpec::get("/v1/apps"), "tok")
            .await
            .unwrap();

        match outcome {
            CallOutcome::Success(payload) => assert_eq!(payload["data"], json!([])),
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_success_body_is_null() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let spec = RequestSpec {
            method: Method::Delete,
            path: "/v1/things/1".into(),
            body: None,
        };
        let outcome = executor_for(&server).await.execute(&spec, "tok").await.unwrap();

        assert!(matches!(outcome, CallOutcome::Success(Value::Null)));
    }

    #[tokio::test]
    async fn posts_serialize_the_json_body() {
        let server = MockServer::start().await;
        let body = json!({"data": {"type": "appStoreVersions"}});
        Mock::given(method("POST"))
            .and(path("/v1/appStoreVersions"))
            .and(body_json(body.clone()))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"data": {"id": "v1"}})))
            .mount(&server)
            .await;

        let outcome = executor_for(&server)
            .await
            .execute(&RequestSpec::post("/v1/appStoreVersions", body), "tok")
            .await
            .unwrap();

        assert!(matches!(outcome, CallOutcome::Success(_)));
    }

    #[tokio::test]
    async fn rate_limit_carries_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "12"))
            .mount(&server)
            .await;

        let outcome =
            executor_for(&server).await.execute(&RequestSpec::get("/v1/apps"), "tok").await.unwrap();

        assert!(matches!(
            outcome,
            CallOutcome::Retryable(RetryCause::RateLimited {
                retry_after: Some(d)
            }) if d == Duration::from_secs(12)
        ));
    }

    #[tokio::test]
    async fn unauthorized_maps_to_credential_expired() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let outcome =
            executor_for(&server).await.execute(&RequestSpec::get("/v1/apps"), "tok").await.unwrap();

        assert!(matches!(outcome, CallOutcome::Retryable(RetryCause::CredentialExpired)));
    }

    #[test]
    fn connect_error_body_yields_code_and_detail() {
        let body = json!({
            "errors": [{
                "code": "ENTITY_ERROR.ATTRIBUTE.INVALID",
                "title": "An attribute value is invalid.",
                "detail": "The attribute 'whatsNew' cannot be edited in the current state."
            }]
        });

        let detail = extract_detail(StatusCode::CONFLICT, body.to_string().as_bytes());

        assert_eq!(detail.code.as_deref(), Some("ENTITY_ERROR.ATTRIBUTE.INVALID"));
        assert!(detail.detail.contains("whatsNew"));
    }

    #[test]
    fn google_error_body_yields_reason_and_message() {
        let body = json!({
            "error": {
                "code": 409,
                "message": "Inappproduct already exists.",
                "errors": [{"reason": "alreadyExists", "message": "Inappproduct already exists."}]
            }
        });

        let detail = extract_detail(StatusCode::CONFLICT, body.to_string().as_bytes());

        assert_eq!(detail.code.as_deref(), Some("alreadyExists"));
        assert_eq!(detail.detail, "Inappproduct already exists.");
    }

    #[test]
    fn unparseable_body_falls_back_to_status_text() {
        let detail = extract_detail(StatusCode::BAD_GATEWAY, b"<html>oops</html>");

        assert_eq!(detail.code, None);
        assert_eq!(detail.detail, "HTTP 502 Bad Gateway");
    }
}
