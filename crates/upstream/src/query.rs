use crate::error::{Result, UpstreamError};
use serde::Serialize;
use url::Url;

/// Ordered outbound query parameters.
///
/// Empty values are never sent. The serialized form doubles as the cache fingerprint input, so
/// two logically identical requests must build their parameters in the same order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn set(mut self, key: &str, value: impl ToString) -> Self {
        let value = value.to_string();
        if !value.is_empty() {
            self.0.push((key.to_string(), value));
        }
        self
    }

    #[must_use]
    pub fn set_opt(self, key: &str, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.set(key, v.trim()),
            None => self,
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Join `base_url` and `path`, then append `query` form-encoded (`2024/25` → `2024%2F25`).
///
/// # Errors
///
/// Returns [`UpstreamError::Config`] when the joined URL does not parse.
pub fn build_url(base_url: &str, path: &str, query: &QueryParams) -> Result<Url> {
    let url = format!("{}{}", base_url.trim_end_matches('/'), path);
    let mut url =
        Url::parse(&url).map_err(|e| UpstreamError::Config(format!("invalid URL '{url}': {e}")))?;

    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (k, v) in &query.0 {
            pairs.append_pair(k, v);
        }
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_values_are_skipped() {
        let q = QueryParams::new()
            .set_opt("sok", Some(""))
            .set_opt("rm", None)
            .set_opt("parti", Some(" S "))
            .set("p", 1);
        assert_eq!(q.get("parti"), Some("S"));
        assert_eq!(q.get("sok"), None);
        assert_eq!(q.get("rm"), None);
    }

    #[test]
    fn session_slash_is_encoded() {
        let q = QueryParams::new()
            .set("rm", "2024/25")
            .set("utformat", "json");
        let url = build_url("https://data.riksdagen.se/", "/dokumentlista/", &q).unwrap();
        assert_eq!(
            url.as_str(),
            "https://data.riksdagen.se/dokumentlista/?rm=2024%2F25&utformat=json"
        );
    }

    #[test]
    fn no_query_leaves_url_bare() {
        let url = build_url("https://g0v.se", "/api/codes.json", &QueryParams::new()).unwrap();
        assert_eq!(url.as_str(), "https://g0v.se/api/codes.json");
    }
}
