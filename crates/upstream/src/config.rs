use crate::error::{Result, UpstreamError};
use opendata_resilience::normalize::EnvelopeFormat;
use opendata_resilience::rate_limit::RateLimit;
use opendata_resilience::safety::{DEFAULT_MAX_ITEMS, SanitizeOptions};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// data.riksdagen.se only answers allow-listed agents; this one is accepted.
pub const DEFAULT_USER_AGENT: &str = "Wget/1.21 (riksdag-regering-mcp)";
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GatewayConfig {
    pub riksdagen: RiksdagenConfig,
    pub g0v: G0vConfig,
    pub http: HttpConfig,
    pub cache: CacheTtls,
    pub pagination: PaginationConfig,
    pub safety: SafetyConfig,
    pub envelope: EnvelopeFormat,
}

impl GatewayConfig {
    /// Parse a YAML (or JSON) document. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::Config`] if the document does not parse or fails validation.
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        if s.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Self = serde_yaml::from_str(s)
            .map_err(|e| UpstreamError::Config(format!("parse gateway config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// # Errors
    ///
    /// Returns [`UpstreamError::Config`] naming the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        validate_base_url("riksdagen.baseUrl", &self.riksdagen.base_url)?;
        validate_base_url("g0v.baseUrl", &self.g0v.base_url)?;
        if self.http.user_agent.trim().is_empty() {
            return Err(UpstreamError::Config(
                "http.userAgent must not be empty".to_string(),
            ));
        }
        if self.http.max_response_bytes == 0 {
            return Err(UpstreamError::Config(
                "http.maxResponseBytes must be > 0".to_string(),
            ));
        }
        if self.http.request_timeout_secs == Some(0) {
            return Err(UpstreamError::Config(
                "http.requestTimeoutSecs must be > 0 when set".to_string(),
            ));
        }
        Ok(())
    }
}

fn validate_base_url(field: &str, value: &str) -> Result<()> {
    let url = Url::parse(value)
        .map_err(|e| UpstreamError::Config(format!("{field}: invalid URL '{value}': {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(UpstreamError::Config(format!(
            "{field}: unsupported scheme '{}'",
            url.scheme()
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RiksdagenConfig {
    pub base_url: String,
    pub rate_limit: RateLimit,
}

impl Default for RiksdagenConfig {
    fn default() -> Self {
        Self {
            base_url: "https://data.riksdagen.se".to_string(),
            rate_limit: RateLimit::per_minute(100),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct G0vConfig {
    pub base_url: String,
    pub rate_limit: RateLimit,
}

impl Default for G0vConfig {
    fn default() -> Self {
        Self {
            base_url: "https://g0v.se".to_string(),
            rate_limit: RateLimit::per_minute(60),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HttpConfig {
    pub user_agent: String,
    /// Raw body ceiling while reading an upstream response.
    pub max_response_bytes: usize,
    /// Unset means the transport default (no overall timeout).
    pub request_timeout_secs: Option<u64>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
            request_timeout_secs: None,
        }
    }
}

/// Per-category cache lifetimes, in seconds. A value of 0 disables caching for that category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheTtls {
    pub persons_secs: u64,
    pub documents_secs: u64,
    pub speeches_secs: u64,
    pub votes_secs: u64,
    pub calendar_secs: u64,
    pub reports_secs: u64,
    pub g0v_documents_secs: u64,
    pub g0v_content_secs: u64,
    pub g0v_codes_secs: u64,
    pub g0v_latest_update_secs: u64,
}

impl Default for CacheTtls {
    fn default() -> Self {
        const HOUR: u64 = 60 * 60;
        Self {
            persons_secs: 24 * HOUR,
            documents_secs: 6 * HOUR,
            speeches_secs: HOUR,
            votes_secs: HOUR,
            calendar_secs: 15 * 60,
            reports_secs: 6 * HOUR,
            g0v_documents_secs: 6 * HOUR,
            g0v_content_secs: HOUR,
            g0v_codes_secs: 24 * HOUR,
            g0v_latest_update_secs: 5 * 60,
        }
    }
}

impl CacheTtls {
    #[must_use]
    pub fn persons(&self) -> Duration {
        Duration::from_secs(self.persons_secs)
    }

    #[must_use]
    pub fn documents(&self) -> Duration {
        Duration::from_secs(self.documents_secs)
    }

    #[must_use]
    pub fn speeches(&self) -> Duration {
        Duration::from_secs(self.speeches_secs)
    }

    #[must_use]
    pub fn votes(&self) -> Duration {
        Duration::from_secs(self.votes_secs)
    }

    #[must_use]
    pub fn calendar(&self) -> Duration {
        Duration::from_secs(self.calendar_secs)
    }

    #[must_use]
    pub fn reports(&self) -> Duration {
        Duration::from_secs(self.reports_secs)
    }

    #[must_use]
    pub fn g0v_documents(&self) -> Duration {
        Duration::from_secs(self.g0v_documents_secs)
    }

    #[must_use]
    pub fn g0v_content(&self) -> Duration {
        Duration::from_secs(self.g0v_content_secs)
    }

    #[must_use]
    pub fn g0v_codes(&self) -> Duration {
        Duration::from_secs(self.g0v_codes_secs)
    }

    #[must_use]
    pub fn g0v_latest_update(&self) -> Duration {
        Duration::from_secs(self.g0v_latest_update_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaginationConfig {
    /// Pause between consecutive page fetches of one multi-page call.
    pub inter_page_delay_ms: u64,
    /// Page cap used when a multi-page request does not name one.
    pub default_max_pages: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            inter_page_delay_ms: 100,
            default_max_pages: 10,
        }
    }
}

impl PaginationConfig {
    #[must_use]
    pub fn inter_page_delay(&self) -> Duration {
        Duration::from_millis(self.inter_page_delay_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SafetyConfig {
    pub max_items: usize,
    pub truncate_strings: bool,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            max_items: DEFAULT_MAX_ITEMS,
            truncate_strings: true,
        }
    }
}

impl SafetyConfig {
    #[must_use]
    pub fn options(&self) -> SanitizeOptions {
        SanitizeOptions {
            max_items: self.max_items,
            truncate_strings: self.truncate_strings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let cfg = GatewayConfig::from_yaml_str("").unwrap();
        assert_eq!(cfg, GatewayConfig::default());
        assert_eq!(cfg.riksdagen.rate_limit, RateLimit::per_minute(100));
        assert_eq!(cfg.g0v.rate_limit, RateLimit::per_minute(60));
        assert_eq!(cfg.cache.calendar(), Duration::from_secs(900));
        assert_eq!(cfg.pagination.inter_page_delay(), Duration::from_millis(100));
    }

    #[test]
    fn partial_sections_keep_their_other_defaults() {
        let cfg = GatewayConfig::from_yaml_str(
            r"
riksdagen:
  baseUrl: http://127.0.0.1:8080
cache:
  votesSecs: 0
envelope:
  itemCountAttributes: ['@hits']
",
        )
        .unwrap();
        assert_eq!(cfg.riksdagen.base_url, "http://127.0.0.1:8080");
        assert_eq!(cfg.riksdagen.rate_limit, RateLimit::per_minute(100));
        assert_eq!(cfg.cache.votes(), Duration::ZERO);
        assert_eq!(cfg.cache.persons(), Duration::from_secs(86_400));
        assert_eq!(cfg.envelope.item_count_attributes, vec!["@hits".to_string()]);
        assert_eq!(cfg.envelope.page_attribute, "@sida");
    }

    #[test]
    fn json_documents_are_accepted() {
        let cfg = GatewayConfig::from_yaml_str(r#"{"http": {"requestTimeoutSecs": 30}}"#).unwrap();
        assert_eq!(cfg.http.request_timeout_secs, Some(30));
        assert_eq!(cfg.http.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = GatewayConfig::from_yaml_str("g0v:\n  baseUrl: ftp://g0v.se\n").unwrap_err();
        assert!(err.to_string().contains("g0v.baseUrl"), "{err}");

        let err = GatewayConfig::from_yaml_str("riksdagen:\n  baseUrl: not a url\n").unwrap_err();
        assert!(matches!(err, UpstreamError::Config(_)));
    }
}
