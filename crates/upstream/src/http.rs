//! Outbound GET helpers shared by both upstream clients.

use crate::config::HttpConfig;
use crate::error::{Result, UpstreamError};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

const EXCERPT_CHARS: usize = 500;

/// Body of a response whose status has not been checked.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone)]
pub struct UpstreamHttp {
    client: reqwest::Client,
    max_response_bytes: usize,
}

impl UpstreamHttp {
    /// # Errors
    ///
    /// Returns [`UpstreamError::Config`] if the user agent is not a valid header value or the
    /// client cannot be built.
    pub fn new(cfg: &HttpConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let user_agent = HeaderValue::from_str(&cfg.user_agent)
            .map_err(|e| UpstreamError::Config(format!("http.userAgent: {e}")))?;

        let mut builder = reqwest::Client::builder()
            .user_agent(user_agent)
            .default_headers(headers);
        if let Some(secs) = cfg.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| UpstreamError::Config(format!("build http client: {e}")))?;

        Ok(Self {
            client,
            max_response_bytes: cfg.max_response_bytes,
        })
    }

    /// GET `url` and decode a JSON body.
    ///
    /// # Errors
    ///
    /// [`UpstreamError::Unavailable`] for transport failures and non-2xx statuses,
    /// [`UpstreamError::MalformedPayload`] when the body is not the expected JSON.
    pub async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let redacted = redact_url(&url);
        let body = self.get_text(url, None).await?;
        serde_json::from_str(&body).map_err(|_| UpstreamError::MalformedPayload {
            url: redacted,
            excerpt: excerpt(&body),
        })
    }

    /// GET `url` and return the body as text. `accept` overrides the JSON default.
    ///
    /// # Errors
    ///
    /// [`UpstreamError::Unavailable`] for transport failures and non-2xx statuses.
    pub async fn get_text(&self, url: Url, accept: Option<&'static str>) -> Result<String> {
        let redacted = redact_url(&url);
        let raw = self.get_raw(url, accept).await?;
        if !raw.is_success() {
            return Err(UpstreamError::Unavailable {
                url: redacted,
                status: Some(raw.status),
                message: format!("upstream returned status {}", raw.status),
            });
        }
        Ok(raw.body)
    }

    /// GET `url` without interpreting the status.
    ///
    /// # Errors
    ///
    /// [`UpstreamError::Unavailable`] for transport failures, and
    /// [`UpstreamError::ResponseTooLargeBody`] when the body exceeds `http.maxResponseBytes`.
    pub async fn get_raw(&self, url: Url, accept: Option<&'static str>) -> Result<RawResponse> {
        let redacted = redact_url(&url);
        debug!(url = %redacted, "upstream GET");

        let mut request = self.client.get(url);
        if let Some(accept) = accept {
            request = request.header(ACCEPT, accept);
        }
        let response = request.send().await.map_err(UpstreamError::from)?;
        let status = response.status().as_u16();
        debug!(url = %redacted, status, "upstream responded");

        let bytes = read_body_limited(response, self.max_response_bytes, &redacted).await?;
        Ok(RawResponse {
            status,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }
}

async fn read_body_limited(
    mut response: reqwest::Response,
    max: usize,
    url: &str,
) -> Result<Vec<u8>> {
    let too_large = || UpstreamError::ResponseTooLargeBody {
        url: url.to_string(),
        limit: max,
    };

    if let Some(len) = response.content_length()
        && len > max as u64
    {
        return Err(too_large());
    }

    let mut out: Vec<u8> = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(UpstreamError::from)? {
        if out.len().saturating_add(chunk.len()) > max {
            return Err(too_large());
        }
        out.extend_from_slice(&chunk);
    }
    Ok(out)
}

/// First 500 characters of an upstream body, for diagnostics.
#[must_use]
pub fn excerpt(body: &str) -> String {
    body.chars().take(EXCERPT_CHARS).collect()
}

/// The URL as it may appear in logs and error records: no userinfo, query or fragment.
#[must_use]
pub fn redact_url(url: &Url) -> String {
    let mut u = url.clone();
    let _ = u.set_username("");
    let _ = u.set_password(None);
    u.set_query(None);
    u.set_fragment(None);
    u.to_string()
}

#[must_use]
pub fn sanitize_reqwest_error(e: &reqwest::Error) -> String {
    let mut msg = e.to_string();
    if let Some(u) = e.url() {
        msg = msg.replace(u.as_str(), &redact_url(u));
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::http::{StatusCode, header};
    use axum::response::IntoResponse;
    use axum::routing::get;
    use opendata_test_support::MockUpstream;

    fn http(max_response_bytes: usize) -> UpstreamHttp {
        UpstreamHttp::new(&HttpConfig {
            max_response_bytes,
            ..HttpConfig::default()
        })
        .expect("http client")
    }

    async fn mock() -> MockUpstream {
        let app = Router::new()
            .route(
                "/json",
                get(|headers: axum::http::HeaderMap| async move {
                    let ua = headers
                        .get(header::USER_AGENT)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    axum::Json(serde_json::json!({ "ua": ua }))
                }),
            )
            .route("/html", get(|| async { "<html>maintenance</html>" }))
            .route(
                "/missing",
                get(|| async { (StatusCode::NOT_FOUND, "no such thing").into_response() }),
            )
            .route("/big", get(|| async { "x".repeat(4_096) }));
        MockUpstream::spawn(app).await.expect("spawn mock")
    }

    fn url(server: &MockUpstream, path: &str) -> Url {
        Url::parse(&format!("{}{path}?secret=1", server.base_url())).expect("url")
    }

    #[tokio::test]
    async fn sends_configured_user_agent() {
        let server = mock().await;
        let body: serde_json::Value = http(1024).get_json(url(&server, "/json")).await.unwrap();
        assert_eq!(body["ua"], serde_json::json!(crate::config::DEFAULT_USER_AGENT));
    }

    #[tokio::test]
    async fn non_json_body_is_malformed_payload() {
        let server = mock().await;
        let err = http(1024)
            .get_json::<serde_json::Value>(url(&server, "/html"))
            .await
            .unwrap_err();
        match err {
            UpstreamError::MalformedPayload { url, excerpt } => {
                assert!(!url.contains("secret"));
                assert_eq!(excerpt, "<html>maintenance</html>");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_success_status_is_unavailable() {
        let server = mock().await;
        let err = http(1024)
            .get_text(url(&server, "/missing"), None)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn body_over_limit_is_rejected() {
        let server = mock().await;
        let err = http(1_000)
            .get_raw(url(&server, "/big"), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            UpstreamError::ResponseTooLargeBody { limit: 1_000, .. }
        ));
    }

    #[test]
    fn excerpt_counts_characters() {
        let body = "ä".repeat(800);
        assert_eq!(excerpt(&body).chars().count(), 500);
    }
}
