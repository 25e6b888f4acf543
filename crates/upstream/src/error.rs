use crate::http::sanitize_reqwest_error;
use opendata_resilience::error::{Classify, ErrorCode, FieldViolation};
use opendata_resilience::safety::SafetyError;
use serde_json::{Value, json};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream unavailable: {message} ({url})")]
    Unavailable {
        url: String,
        status: Option<u16>,
        message: String,
    },

    #[error("malformed upstream payload from {url}")]
    MalformedPayload { url: String, excerpt: String },

    #[error("invalid parameters: {}", describe_violations(.violations))]
    Validation { violations: Vec<FieldViolation> },

    #[error("{entity} {id} not found")]
    NotFound {
        entity: &'static str,
        id: String,
        suggestions: Vec<String>,
    },

    #[error("response too large: exceeded {limit} bytes ({url})")]
    ResponseTooLargeBody { url: String, limit: usize },

    #[error(transparent)]
    Safety(#[from] SafetyError),

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, UpstreamError>;

impl From<reqwest::Error> for UpstreamError {
    fn from(value: reqwest::Error) -> Self {
        Self::Unavailable {
            url: value
                .url()
                .map(crate::http::redact_url)
                .unwrap_or_default(),
            status: value.status().map(|s| s.as_u16()),
            message: sanitize_reqwest_error(&value),
        }
    }
}

impl UpstreamError {
    pub(crate) fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            violations: vec![FieldViolation::new(field, message)],
        }
    }

    /// Upstream HTTP status, when the failure came from a response.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            UpstreamError::Unavailable { status, .. } => *status,
            _ => None,
        }
    }
}

fn describe_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("{}: {}", v.field, v.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl Classify for UpstreamError {
    fn error_code(&self) -> ErrorCode {
        match self {
            UpstreamError::Unavailable {
                status: Some(404), ..
            }
            | UpstreamError::NotFound { .. } => ErrorCode::NotFound,
            UpstreamError::Unavailable {
                status: Some(429), ..
            } => ErrorCode::RateLimited,
            UpstreamError::Validation { .. } => ErrorCode::InvalidParams,
            UpstreamError::ResponseTooLargeBody { .. } => ErrorCode::ResponseTooLarge,
            UpstreamError::Safety(e) => e.error_code(),
            UpstreamError::Unavailable { .. }
            | UpstreamError::MalformedPayload { .. }
            | UpstreamError::Config(_) => ErrorCode::Internal,
        }
    }

    fn hint(&self) -> Option<String> {
        match self {
            UpstreamError::Unavailable {
                status: Some(429), ..
            } => Some("The upstream is throttling requests; retry in a minute".to_string()),
            UpstreamError::ResponseTooLargeBody { .. } => {
                Some("Use pagination or filtering to reduce response size".to_string())
            }
            UpstreamError::Safety(e) => e.hint(),
            _ => None,
        }
    }

    fn context(&self) -> Option<Value> {
        match self {
            UpstreamError::Unavailable {
                status: Some(status),
                ..
            } => Some(json!({ "status": status })),
            UpstreamError::Validation { violations } => Some(json!({ "violations": violations })),
            UpstreamError::NotFound { suggestions, .. } if !suggestions.is_empty() => {
                Some(json!({ "suggestions": suggestions }))
            }
            UpstreamError::ResponseTooLargeBody { limit, .. } => Some(json!({ "maxSize": limit })),
            UpstreamError::Safety(e) => e.context(),
            _ => None,
        }
    }
}
