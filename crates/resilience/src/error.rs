//! Uniform error record returned across the gateway boundary.
//!
//! Whatever fails inside the gateway (validation, upstream outage, oversize response) reaches the
//! caller as an [`ErrorRecord`]: a JSON-RPC style code, a message and optional safe context.
//! Internal details such as backtraces or source chains are never included.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error classification; each variant maps to a fixed JSON-RPC code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCode {
    InvalidParams,
    NotFound,
    ResponseTooLarge,
    RateLimited,
    Internal,
}

impl ErrorCode {
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            ErrorCode::InvalidParams => -32602,
            ErrorCode::NotFound => -32001,
            ErrorCode::ResponseTooLarge => -32000,
            ErrorCode::RateLimited => -32002,
            ErrorCode::Internal => -32603,
        }
    }
}

/// A single failed parameter constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Implemented by every error type that can cross the gateway boundary.
pub trait Classify: std::error::Error {
    fn error_code(&self) -> ErrorCode;

    /// Remediation hint for the caller (e.g. "use pagination").
    fn hint(&self) -> Option<String> {
        None
    }

    /// Structured, caller-safe context (sizes, field violations, suggestions).
    fn context(&self) -> Option<Value> {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ErrorData>,
}

impl ErrorRecord {
    /// Build the record for `err`, attributing it to `tool` when known.
    #[must_use]
    pub fn from_error<E: Classify + ?Sized>(err: &E, tool: Option<&str>) -> Self {
        let message = err.to_string();
        let hint = err.hint();
        let context = err.context();
        let data = (tool.is_some() || hint.is_some() || context.is_some()).then(|| ErrorData {
            tool: tool.map(str::to_string),
            reason: message.clone(),
            hint,
            context,
        });
        Self {
            code: err.error_code().code(),
            message,
            data,
        }
    }

    /// Record for failures that have no richer classification.
    #[must_use]
    pub fn internal(message: impl Into<String>, tool: Option<&str>) -> Self {
        let message = message.into();
        Self {
            code: ErrorCode::Internal.code(),
            data: tool.map(|t| ErrorData {
                tool: Some(t.to_string()),
                reason: message.clone(),
                hint: None,
                context: None,
            }),
            message,
        }
    }
}
