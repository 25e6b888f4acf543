//! Normalization of list envelopes returned by the parliamentary records API.
//!
//! List endpoints wrap their results in a container object (e.g. `dokumentlista`) that carries a
//! reported count next to the items. The item field is absent when the count is 0, a bare object
//! when it is 1, and an array otherwise. Callers never see that asymmetry: everything goes through
//! [`EnvelopeFormat::shape`] and comes out as a [`Shape`].

use crate::pagination::PaginatedResult;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Resolved item shape of an envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape<T> {
    Empty,
    Single(T),
    Many(Vec<T>),
}

impl<T> Shape<T> {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Shape::Empty => 0,
            Shape::Single(_) => 1,
            Shape::Many(items) => items.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Shape::Empty => Vec::new(),
            Shape::Single(item) => vec![item],
            Shape::Many(items) => items,
        }
    }
}

/// Page metadata read from an envelope's container attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMeta {
    pub total_hits: u64,
    pub current_page: u32,
    pub next_page_token: Option<String>,
}

impl PageMeta {
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.next_page_token.is_some()
    }
}

/// Attribute names used by an upstream's list envelopes.
///
/// The count-attribute priority follows observed upstream behavior, not a documented contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnvelopeFormat {
    /// Checked in order to decide the item shape; the first present, non-empty one wins.
    pub item_count_attributes: Vec<String>,
    /// Checked in order to read the reported total.
    pub total_hits_attributes: Vec<String>,
    /// Removed from the container key (first occurrence) to derive the item key.
    pub container_suffix: String,
    pub page_attribute: String,
    pub next_page_attribute: String,
}

impl Default for EnvelopeFormat {
    fn default() -> Self {
        Self {
            item_count_attributes: vec!["@antal".into(), "@hits".into(), "@traffar".into()],
            total_hits_attributes: vec!["@hits".into(), "@antal".into(), "@traffar".into()],
            container_suffix: "lista".into(),
            page_attribute: "@sida".into(),
            next_page_attribute: "@nasta_sida".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ReportedCount {
    Absent,
    Known(u64),
    Unparseable(String),
}

impl EnvelopeFormat {
    /// `dokumentlista` → `dokument`, `voteringlistagrupp` → `voteringgrupp`.
    #[must_use]
    pub fn item_key(&self, container_key: &str) -> String {
        if self.container_suffix.is_empty() {
            return container_key.to_string();
        }
        container_key.replacen(&self.container_suffix, "", 1)
    }

    /// Resolve the item shape of `envelope[container_key]`.
    #[must_use]
    pub fn shape(&self, envelope: &mut Value, container_key: &str) -> Shape<Value> {
        let Some(container) = envelope
            .get_mut(container_key)
            .and_then(Value::as_object_mut)
        else {
            return Shape::Empty;
        };

        let item_key = self.item_key(container_key);
        let count = read_count(container, &self.item_count_attributes);
        let payload = container.remove(&item_key);

        match count {
            ReportedCount::Absent | ReportedCount::Known(0) => Shape::Empty,
            ReportedCount::Known(1) => match payload {
                None | Some(Value::Null) => Shape::Empty,
                Some(Value::Array(items)) => Shape::Many(items),
                Some(item) => Shape::Single(item),
            },
            ReportedCount::Known(n) => match payload {
                None | Some(Value::Null) => Shape::Empty,
                Some(Value::Array(items)) => Shape::Many(items),
                Some(item) => {
                    warn!(
                        container = %container_key,
                        reported = n,
                        "envelope reported several items but carried a single object"
                    );
                    Shape::Single(item)
                }
            },
            ReportedCount::Unparseable(raw) => {
                warn!(
                    container = %container_key,
                    raw = %raw,
                    "unparseable item count; inferring shape from payload"
                );
                match payload {
                    None | Some(Value::Null) => Shape::Empty,
                    Some(Value::Array(items)) => Shape::Many(items),
                    Some(item) => Shape::Single(item),
                }
            }
        }
    }

    /// Read total hits, current page and the next-page marker.
    #[must_use]
    pub fn page_meta(&self, envelope: &Value, container_key: &str) -> PageMeta {
        let Some(container) = envelope.get(container_key).and_then(Value::as_object) else {
            return PageMeta {
                total_hits: 0,
                current_page: 1,
                next_page_token: None,
            };
        };

        let total_hits = match read_count(container, &self.total_hits_attributes) {
            ReportedCount::Known(n) => n,
            ReportedCount::Absent | ReportedCount::Unparseable(_) => 0,
        };

        let current_page = attribute_text(container, &self.page_attribute)
            .and_then(|s| s.parse::<u32>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1);

        let next_page_token = attribute_text(container, &self.next_page_attribute);

        PageMeta {
            total_hits,
            current_page,
            next_page_token,
        }
    }

    /// Normalize an envelope into a page of items.
    #[must_use]
    pub fn paginated(&self, mut envelope: Value, container_key: &str) -> PaginatedResult<Value> {
        let meta = self.page_meta(&envelope, container_key);
        let items = self.shape(&mut envelope, container_key).into_vec();
        PaginatedResult::new(
            items,
            meta.total_hits,
            meta.current_page,
            meta.next_page_token,
        )
    }
}

fn read_count(container: &Map<String, Value>, attributes: &[String]) -> ReportedCount {
    let Some(raw) = attributes
        .iter()
        .find_map(|name| attribute_text(container, name))
    else {
        return ReportedCount::Absent;
    };
    match raw.parse::<u64>() {
        Ok(n) => ReportedCount::Known(n),
        Err(_) => ReportedCount::Unparseable(raw),
    }
}

/// Attribute value as trimmed text; missing, null and empty values count as absent.
fn attribute_text(container: &Map<String, Value>, name: &str) -> Option<String> {
    let text = match container.get(name)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}
