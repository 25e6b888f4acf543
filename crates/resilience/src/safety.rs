//! Size bounds applied to every payload before it leaves the gateway.
//!
//! The bounds are applied in a fixed order: arrays are truncated first, long strings are cut
//! second, and only then is the serialized size measured. A payload that is still above
//! [`MAX_RESPONSE_BYTES`] after truncation is rejected outright instead of being cut mid-value.

use crate::error::{Classify, ErrorCode};
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use tracing::{info, warn};

pub const DEFAULT_MAX_ITEMS: usize = 500;
pub const ABSOLUTE_MAX_ITEMS: usize = 2_000;
pub const MAX_STRING_CHARS: usize = 100_000;
pub const MAX_RESPONSE_BYTES: usize = 5 * 1024 * 1024;
pub const TRUNCATION_MARKER: &str = "... [TRUNCATED]";

const SIZE_SUGGESTION: &str = "Consider using pagination, filtering, or requesting fewer fields";

#[derive(Debug, thiserror::Error)]
pub enum SafetyError {
    #[error("response too large: {actual_bytes} bytes (max: {max_bytes} bytes)")]
    ResponseTooLarge {
        actual_bytes: usize,
        max_bytes: usize,
        suggestion: String,
    },

    #[error("response could not be serialized: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl Classify for SafetyError {
    fn error_code(&self) -> ErrorCode {
        match self {
            SafetyError::ResponseTooLarge { .. } => ErrorCode::ResponseTooLarge,
            SafetyError::Serialize(_) => ErrorCode::Internal,
        }
    }

    fn hint(&self) -> Option<String> {
        match self {
            SafetyError::ResponseTooLarge { suggestion, .. } => Some(suggestion.clone()),
            SafetyError::Serialize(_) => None,
        }
    }

    fn context(&self) -> Option<Value> {
        match self {
            SafetyError::ResponseTooLarge {
                actual_bytes,
                max_bytes,
                ..
            } => Some(json!({ "actualSize": actual_bytes, "maxSize": max_bytes })),
            SafetyError::Serialize(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SanitizeOptions {
    /// Array bound; 0 selects [`DEFAULT_MAX_ITEMS`], anything above [`ABSOLUTE_MAX_ITEMS`] is clamped.
    pub max_items: usize,
    pub truncate_strings: bool,
}

impl Default for SanitizeOptions {
    fn default() -> Self {
        Self {
            max_items: DEFAULT_MAX_ITEMS,
            truncate_strings: false,
        }
    }
}

impl SanitizeOptions {
    #[must_use]
    pub fn effective_max_items(&self) -> usize {
        match self.max_items {
            0 => DEFAULT_MAX_ITEMS,
            n => n.min(ABSOLUTE_MAX_ITEMS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SanitizedResult {
    pub data: Value,
    pub truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Fields that were cut, with their original length (items or chars). Arrays inside an
    /// object-valued field are keyed `parent.child`.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub truncated_fields: BTreeMap<String, usize>,
}

impl SanitizedResult {
    fn untouched(data: Value) -> Self {
        Self {
            data,
            truncated: false,
            original_count: None,
            suggestion: None,
            truncated_fields: BTreeMap::new(),
        }
    }
}

/// Bound `value` for delivery to a caller.
///
/// # Errors
///
/// Returns [`SafetyError::ResponseTooLarge`] when the bounded result still serializes to more
/// than [`MAX_RESPONSE_BYTES`].
pub fn sanitize(value: Value, options: SanitizeOptions) -> Result<SanitizedResult, SafetyError> {
    let max_items = options.effective_max_items();

    let result = match value {
        Value::Array(items) => {
            let original_count = items.len();
            let (items, cut) = truncate_items(items, max_items);
            let mut result = SanitizedResult::untouched(Value::Array(items));
            if cut {
                info!(original_count, max_items, "array truncated");
                result.truncated = true;
                result.original_count = Some(original_count);
                result.suggestion = Some(format!(
                    "Use pagination parameters to retrieve more results. Total available: {original_count}"
                ));
            }
            result
        }
        Value::Object(fields) => sanitize_fields(fields, max_items, options.truncate_strings),
        other => SanitizedResult::untouched(other),
    };

    check_size(&result)?;
    Ok(result)
}

/// Serialized size of `value` in bytes, checked against [`MAX_RESPONSE_BYTES`].
///
/// # Errors
///
/// Returns [`SafetyError::ResponseTooLarge`] above the ceiling.
pub fn check_size<T: Serialize + ?Sized>(value: &T) -> Result<usize, SafetyError> {
    let size = serde_json::to_vec(value)?.len();
    if size > MAX_RESPONSE_BYTES {
        warn!(size, max_size = MAX_RESPONSE_BYTES, "response too large");
        return Err(SafetyError::ResponseTooLarge {
            actual_bytes: size,
            max_bytes: MAX_RESPONSE_BYTES,
            suggestion: SIZE_SUGGESTION.to_string(),
        });
    }
    Ok(size)
}

fn sanitize_fields(
    fields: Map<String, Value>,
    max_items: usize,
    truncate_strings: bool,
) -> SanitizedResult {
    let mut truncated_fields = BTreeMap::new();
    let mut out = Map::with_capacity(fields.len());

    for (key, value) in fields {
        let value = match value {
            Value::Array(items) => {
                let original = items.len();
                let (items, cut) = truncate_items(items, max_items);
                if cut {
                    truncated_fields.insert(key.clone(), original);
                }
                Value::Array(items)
            }
            Value::String(s) if truncate_strings => match truncate_chars(&s) {
                Some(cut) => {
                    truncated_fields.insert(key.clone(), s.chars().count());
                    Value::String(cut)
                }
                None => Value::String(s),
            },
            Value::Object(nested) => {
                Value::Object(cap_nested_arrays(&key, nested, max_items, &mut truncated_fields))
            }
            other => other,
        };
        out.insert(key, value);
    }

    if !truncated_fields.is_empty() {
        info!(fields = ?truncated_fields, max_items, "object fields truncated");
    }
    SanitizedResult {
        data: Value::Object(out),
        truncated: !truncated_fields.is_empty(),
        original_count: None,
        suggestion: None,
        truncated_fields,
    }
}

/// Cap the array fields of an object-valued field (e.g. per-category result lists), recording
/// each cut as `parent.child`.
fn cap_nested_arrays(
    parent: &str,
    nested: Map<String, Value>,
    max_items: usize,
    truncated_fields: &mut BTreeMap<String, usize>,
) -> Map<String, Value> {
    nested
        .into_iter()
        .map(|(key, value)| match value {
            Value::Array(items) => {
                let original = items.len();
                let (items, cut) = truncate_items(items, max_items);
                if cut {
                    truncated_fields.insert(format!("{parent}.{key}"), original);
                }
                (key, Value::Array(items))
            }
            other => (key, other),
        })
        .collect()
}

fn truncate_items(mut items: Vec<Value>, max_items: usize) -> (Vec<Value>, bool) {
    if items.len() > max_items {
        items.truncate(max_items);
        (items, true)
    } else {
        (items, false)
    }
}

/// `Some(prefix + marker)` when `s` is longer than [`MAX_STRING_CHARS`] characters.
fn truncate_chars(s: &str) -> Option<String> {
    let (cut_at, _) = s.char_indices().nth(MAX_STRING_CHARS)?;
    let mut out = String::with_capacity(cut_at + TRUNCATION_MARKER.len());
    out.push_str(&s[..cut_at]);
    out.push_str(TRUNCATION_MARKER);
    Some(out)
}
