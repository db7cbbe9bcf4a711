//! Single-shot request execution: URL resolution, auth headers, and
//! classification of non-2xx responses. No retry logic lives here.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, info};
use reqwest::{
    Method,
    header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue},
};
use serde_json::Value;

use super::transport::{HttpTransport, ResponseEnvelope, TransportRequest};
use crate::auth::Credentials;
use crate::error::ApiError;

/// Performs exactly one HTTP call per [`execute`](RequestExecutor::execute).
#[derive(Clone)]
pub struct RequestExecutor {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    credentials: Credentials,
    timeout: Option<Duration>,
    trace: bool,
    trace_out: bool,
}

impl RequestExecutor {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        base_url: &str,
        credentials: Credentials,
    ) -> Self {
        let mut base_url = base_url.to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Self {
            transport,
            base_url,
            credentials,
            timeout: None,
            trace: false,
            trace_out: false,
        }
    }

    /// Timeout applied to every call; `None` leaves it to the transport.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// `trace_out` logs each resolved URL; `trace` logs full request/response detail.
    pub fn with_trace(mut self, trace: bool, trace_out: bool) -> Self {
        self.trace = trace;
        self.trace_out = trace_out;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URLs pass through untouched; anything else is appended to the base URL.
    pub fn resolve_url(&self, path: &str) -> String {
        if has_scheme(path) {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }

    async fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(token) = self.credentials.bearer_token().await? {
            let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", token))
                .context("Access token is not a valid header value")?;
            auth_value.set_sensitive(true);
            headers.insert(AUTHORIZATION, auth_value);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// Sends one request and returns the parsed body, `None` for an empty
    /// success, or an error. Non-2xx responses surface as [`ApiError`].
    #[tracing::instrument(skip(self, payload, params))]
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        payload: Option<&Value>,
        params: &[(&str, &str)],
    ) -> Result<Option<Value>> {
        let url = self.resolve_url(path);
        let headers = self.headers().await?;
        let body = payload
            .map(serde_json::to_string)
            .transpose()
            .context("Failed to serialize request payload")?;

        if self.trace_out {
            info!("{}", url);
        }
        debug!("{} {}...", method, url);

        let request = TransportRequest {
            method: method.clone(),
            url,
            headers: headers.clone(),
            query: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body,
            timeout: self.timeout,
        };
        let response = self.transport.send(request).await?;

        if self.trace {
            info!("headers {:?}", headers);
            info!("http_status {}", response.status);
            info!("{} {}", method, response.url);
            if let Some(payload) = payload {
                info!("DATA {}", payload);
            }
        }

        if !response.is_success() {
            let error = classify(&response);
            debug!("{} {} failed: {}", method, response.url, error);
            return Err(error.into());
        }

        let result = response.json()?;
        if self.trace {
            if let Some(result) = &result {
                info!("RESP {}", result);
            }
        }
        Ok(result)
    }
}

/// True when `path` starts with `<scheme>://`.
fn has_scheme(path: &str) -> bool {
    let Some((scheme, _)) = path.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn classify(response: &ResponseEnvelope) -> ApiError {
    let message = response
        .content()
        .and_then(vendor_message)
        .unwrap_or_else(|| "error".to_string());

    ApiError::new(
        response.status,
        format!("{}:\n {}", response.url, message),
        response.headers.clone(),
    )
}

/// Extracts `error.message` from a vendor error body.
fn vendor_message(text: &str) -> Option<String> {
    let body: Value = serde_json::from_str(text).ok()?;
    body.get("error")?
        .get("message")?
        .as_str()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MockCredentialManager;
    use crate::http::transport::MockHttpTransport;
    use crate::test_utils::{TEST_API_URL, response, response_with_headers};
    use serde_json::json;

    fn executor(transport: MockHttpTransport, credentials: Credentials) -> RequestExecutor {
        RequestExecutor::new(Arc::new(transport), TEST_API_URL, credentials)
    }

    #[test]
    fn test_resolve_relative_path() {
        let executor = executor(MockHttpTransport::new(), Credentials::None);
        assert_eq!(
            executor.resolve_url("track/123"),
            "https://api.chartmetric.com/api/track/123"
        );
    }

    #[test]
    fn test_resolve_absolute_url_untouched() {
        let executor = executor(MockHttpTransport::new(), Credentials::None);
        assert_eq!(
            executor.resolve_url("https://example.com/track/1"),
            "https://example.com/track/1"
        );
        assert_eq!(
            executor.resolve_url("http://localhost:8080/x"),
            "http://localhost:8080/x"
        );
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let executor = RequestExecutor::new(
            Arc::new(MockHttpTransport::new()),
            "http://127.0.0.1:1234",
            Credentials::None,
        );
        assert_eq!(executor.base_url(), "http://127.0.0.1:1234/");
        assert_eq!(executor.resolve_url("artist/1"), "http://127.0.0.1:1234/artist/1");
    }

    #[test]
    fn test_has_scheme() {
        assert!(has_scheme("https://api.chartmetric.com/api/track/1"));
        assert!(has_scheme("svn+ssh://host/path"));
        assert!(!has_scheme("track/1"));
        assert!(!has_scheme("search?q=http://example.com"));
        assert!(!has_scheme("://nothing"));
        assert!(!has_scheme("1http://x"));
    }

    #[tokio::test]
    async fn test_execute_sends_static_token_and_content_type() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .withf(|req| {
                req.method == Method::GET
                    && req.url == "https://api.chartmetric.com/api/track/123"
                    && req.headers.get(AUTHORIZATION).unwrap() == "Bearer abc"
                    && req.headers.get(CONTENT_TYPE).unwrap() == "application/json"
                    && req.body.is_none()
            })
            .times(1)
            .returning(|_| Ok(response(200, r#"{"obj": {"id": 123}}"#)));

        let executor = executor(transport, Credentials::Token("abc".to_string()));
        let result = executor
            .execute(Method::GET, "track/123", None, &[])
            .await
            .unwrap();

        assert_eq!(result, Some(json!({"obj": {"id": 123}})));
    }

    #[tokio::test]
    async fn test_execute_without_credentials_has_no_authorization() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .withf(|req| !req.headers.contains_key(AUTHORIZATION))
            .times(1)
            .returning(|_| Ok(response(200, "{}")));

        let executor = executor(transport, Credentials::None);
        executor
            .execute(Method::GET, "artist/1", None, &[])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_execute_uses_credential_manager_each_call() {
        let mut manager = MockCredentialManager::new();
        manager
            .expect_get_access_token()
            .times(2)
            .returning(|| Ok("managed".to_string()));

        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .withf(|req| req.headers.get(AUTHORIZATION).unwrap() == "Bearer managed")
            .times(2)
            .returning(|_| Ok(response(200, "{}")));

        let executor = executor(transport, Credentials::Manager(Arc::new(manager)));
        executor.execute(Method::GET, "artist/1", None, &[]).await.unwrap();
        executor.execute(Method::GET, "artist/2", None, &[]).await.unwrap();
    }

    #[tokio::test]
    async fn test_execute_credential_failure_skips_transport() {
        let mut manager = MockCredentialManager::new();
        manager
            .expect_get_access_token()
            .returning(|| Err(anyhow::anyhow!("token endpoint unreachable")));

        let mut transport = MockHttpTransport::new();
        transport.expect_send().times(0);

        let executor = executor(transport, Credentials::Manager(Arc::new(manager)));
        let err = executor
            .execute(Method::GET, "artist/1", None, &[])
            .await
            .unwrap_err();

        assert!(err.downcast_ref::<ApiError>().is_none());
    }

    #[tokio::test]
    async fn test_execute_serializes_payload_and_params() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .withf(|req| {
                req.method == Method::POST
                    && req.body.as_deref() == Some(r#"{"refreshtoken":"r"}"#)
                    && req.query == vec![("since".to_string(), "2024-01-01".to_string())]
            })
            .times(1)
            .returning(|_| Ok(response(200, r#"{"token": "t"}"#)));

        let executor = executor(transport, Credentials::None);
        let payload = json!({"refreshtoken": "r"});
        let result = executor
            .execute(Method::POST, "token", Some(&payload), &[("since", "2024-01-01")])
            .await
            .unwrap();

        assert_eq!(result, Some(json!({"token": "t"})));
    }

    #[tokio::test]
    async fn test_execute_passes_timeout() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .withf(|req| req.timeout == Some(Duration::from_secs(7)))
            .times(1)
            .returning(|_| Ok(response(200, "")));

        let executor =
            executor(transport, Credentials::None).with_timeout(Some(Duration::from_secs(7)));
        executor.execute(Method::GET, "track/1", None, &[]).await.unwrap();
    }

    #[tokio::test]
    async fn test_execute_empty_and_null_bodies_are_no_content() {
        for body in ["", "null"] {
            let mut transport = MockHttpTransport::new();
            transport
                .expect_send()
                .times(1)
                .returning(move |_| Ok(response(200, body)));

            let executor = executor(transport, Credentials::None);
            let result = executor
                .execute(Method::GET, "track/1", None, &[])
                .await
                .unwrap();
            assert_eq!(result, None);
        }
    }

    #[tokio::test]
    async fn test_execute_malformed_success_body_is_parse_error() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_| Ok(response(200, "{not json")));

        let executor = executor(transport, Credentials::None);
        let err = executor
            .execute(Method::GET, "track/1", None, &[])
            .await
            .unwrap_err();

        assert!(err.downcast_ref::<ApiError>().is_none());
        assert!(err.to_string().contains("Failed to parse JSON response"));
    }

    #[tokio::test]
    async fn test_execute_vendor_error_message() {
        let mut transport = MockHttpTransport::new();
        transport.expect_send().times(1).returning(|_| {
            Ok(response_with_headers(
                400,
                r#"{"error": {"message": "bad id"}}"#,
                &[("x-request-id", "req-1")],
            ))
        });

        let executor = executor(transport, Credentials::None);
        let err = executor
            .execute(Method::GET, "track/abc", None, &[])
            .await
            .unwrap_err();

        let api = err.downcast_ref::<ApiError>().unwrap();
        assert_eq!(api.http_status, 400);
        assert_eq!(api.code, -1);
        assert_eq!(api.message, format!("{}test:\n bad id", TEST_API_URL));
        assert_eq!(api.headers.get("x-request-id").unwrap(), "req-1");
    }

    #[tokio::test]
    async fn test_execute_generic_error_message() {
        for body in ["", "null", "<html>oops</html>", r#"{"message": "no error key"}"#] {
            let mut transport = MockHttpTransport::new();
            transport
                .expect_send()
                .times(1)
                .returning(move |_| Ok(response(502, body)));

            let executor = executor(transport, Credentials::None);
            let err = executor
                .execute(Method::GET, "track/1", None, &[])
                .await
                .unwrap_err();

            let api = err.downcast_ref::<ApiError>().unwrap();
            assert_eq!(api.http_status, 502);
            assert_eq!(api.message, format!("{}test:\n error", TEST_API_URL));
        }
    }

    #[tokio::test]
    async fn test_execute_transport_error_propagates() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("connection reset")));

        let executor = executor(transport, Credentials::None);
        let err = executor
            .execute(Method::GET, "track/1", None, &[])
            .await
            .unwrap_err();

        assert!(err.downcast_ref::<ApiError>().is_none());
        assert!(err.to_string().contains("connection reset"));
    }

    #[test_log::test(tokio::test)]
    async fn test_execute_with_trace_enabled() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_| Ok(response(200, r#"{"ok": true}"#)));

        let executor = executor(transport, Credentials::Token("secret".to_string()))
            .with_trace(true, true);
        let payload = json!({"a": 1});
        let result = executor
            .execute(Method::POST, "thing", Some(&payload), &[])
            .await
            .unwrap();

        assert_eq!(result, Some(json!({"ok": true})));

        let logged = format!("{:?}", executor.headers().await.unwrap());
        assert!(!logged.contains("secret"));
        assert!(logged.contains("Sensitive"));
    }
}
