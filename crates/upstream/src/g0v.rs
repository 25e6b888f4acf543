//! Client for the g0v.se mirror of government documents.
//!
//! A category listing is one flat JSON array, often several megabytes. The full listing is cached
//! per slug and every filter is applied locally, so repeated searches over the same category cost
//! a single upstream fetch per TTL.

use crate::config::{CacheTtls, GatewayConfig};
use crate::error::{Result, UpstreamError};
use crate::http::UpstreamHttp;
use crate::query::{QueryParams, build_url};
use futures::future::{join_all, try_join3};
use opendata_resilience::cache::{TtlCache, fingerprint};
use opendata_resilience::rate_limit::RateLimiter;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

/// Short names accepted for document categories, mapped to their listing slug.
pub const TYPE_ALIASES: &[(&str, &str)] = &[
    ("pressmeddelanden", "pressmeddelanden"),
    ("propositioner", "rattsliga-dokument/proposition"),
    ("proposition", "rattsliga-dokument/proposition"),
    ("sou", "rattsliga-dokument/statens-offentliga-utredningar"),
    (
        "statens-offentliga-utredningar",
        "rattsliga-dokument/statens-offentliga-utredningar",
    ),
    ("ds", "rattsliga-dokument/departementsserien-och-promemorior"),
    (
        "departementsserien",
        "rattsliga-dokument/departementsserien-och-promemorior",
    ),
    ("dir", "rattsliga-dokument/kommittedirektiv"),
    ("kommittedirektiv", "rattsliga-dokument/kommittedirektiv"),
    ("remisser", "remisser"),
    ("regeringsuppdrag", "regeringsuppdrag"),
    ("regeringsarenden", "regeringsarenden"),
    ("rapporter", "rapporter"),
    ("tal", "tal"),
    ("uttalanden", "uttalanden"),
    ("debattartiklar", "debattartiklar"),
    ("overenskommelser", "overenskommelser-och-avtal"),
    ("overenskommelser-och-avtal", "overenskommelser-och-avtal"),
    (
        "rattsakter",
        "rattsliga-dokument/sveriges-internationella-overenskommelser",
    ),
    (
        "sveriges-internationella-overenskommelser",
        "rattsliga-dokument/sveriges-internationella-overenskommelser",
    ),
    ("granskningar", "internationella-mr-granskningar-av-sverige"),
    (
        "internationella-mr-granskningar-av-sverige",
        "internationella-mr-granskningar-av-sverige",
    ),
    ("faktapromemoria", "faktapromemoria"),
    ("informationsmaterial", "informationsmaterial"),
    ("artiklar", "artiklar"),
    ("ud-avrader", "ud-avrader"),
    ("kommenterade-dagordningar", "kommenterade-dagordningar"),
    ("arendeforteckningar", "arendeforteckningar"),
    ("sakrad", "sakrad"),
    (
        "strategier-for-internationellt-bistand",
        "strategier-for-internationellt-bistand",
    ),
    ("forordningsmotiv", "rattsliga-dokument/forordningsmotiv"),
    ("lagradsremiss", "rattsliga-dokument/lagradsremiss"),
    ("skrivelse", "rattsliga-dokument/skrivelse"),
];

/// Categories searched by [`G0vClient::search_all`] when none are named.
pub const DEFAULT_SEARCH_TYPES: &[&str] = &[
    "propositioner",
    "pressmeddelanden",
    "sou",
    "ds",
    "remisser",
    "rapporter",
    "tal",
    "debattartiklar",
];

/// Documents returned per category when no limit is given.
pub const DEFAULT_DOCUMENT_LIMIT: usize = 50;
pub const MAX_DOCUMENT_LIMIT: usize = 200;

const UNKNOWN_DEPARTMENT: &str = "Okänt departement";

/// Category codes that identify a ministry when a document names no sender.
const DEPARTMENT_CODES: &[(&str, &str)] = &[
    ("1286", "Försvarsdepartementet"),
    ("1285", "Finansdepartementet"),
    ("1284", "Utbildningsdepartementet"),
    ("1283", "Justitiedepartementet"),
    ("1282", "Miljödepartementet"),
    ("1281", "Näringsdepartementet"),
    ("1280", "Socialdepartementet"),
];

/// URL fragments that identify a ministry, checked last.
const DEPARTMENT_URL_SLUGS: &[(&str, &str)] = &[
    ("forsvarsdepartementet", "Försvarsdepartementet"),
    ("finansdepartementet", "Finansdepartementet"),
    ("utbildningsdepartementet", "Utbildningsdepartementet"),
    ("justitiedepartementet", "Justitiedepartementet"),
    ("miljodepartementet", "Miljödepartementet"),
    ("naringsdepartementet", "Näringsdepartementet"),
    ("socialdepartementet", "Socialdepartementet"),
];

const REGERINGEN_HOSTS: &[&str] = &["https://www.regeringen.se/", "http://www.regeringen.se/"];

/// Listing slug for an alias (case-insensitive); unknown names are used as slugs verbatim.
#[must_use]
pub fn resolve_type(name: &str) -> String {
    let key = name.trim().to_lowercase();
    TYPE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map_or_else(|| name.trim().to_string(), |(_, slug)| (*slug).to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct G0vDocument {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub published: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    #[serde(rename = "type", default)]
    pub doc_type: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentFilter {
    /// Case-insensitive substring of the title.
    pub search: Option<String>,
    /// Inclusive lower bound on `published` (ISO date string comparison).
    pub date_from: Option<String>,
    /// Inclusive upper bound on `published`.
    pub date_to: Option<String>,
    /// `None` means [`DEFAULT_DOCUMENT_LIMIT`]; at most [`MAX_DOCUMENT_LIMIT`].
    pub limit: Option<usize>,
}

impl DocumentFilter {
    fn effective_limit(&self) -> Result<usize> {
        check_limit(self.limit)
    }

    fn apply(&self, documents: &[G0vDocument], limit: usize) -> Vec<G0vDocument> {
        let needle = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        let from = self.date_from.as_deref().filter(|s| !s.is_empty());
        let to = self.date_to.as_deref().filter(|s| !s.is_empty());

        documents
            .iter()
            .filter(|d| {
                needle
                    .as_deref()
                    .is_none_or(|n| d.title.to_lowercase().contains(n))
            })
            .filter(|d| from.is_none_or(|f| d.published.as_str() >= f))
            .filter(|d| to.is_none_or(|t| d.published.as_str() <= t))
            .take(limit)
            .cloned()
            .collect()
    }
}

fn check_limit(limit: Option<usize>) -> Result<usize> {
    match limit {
        None => Ok(DEFAULT_DOCUMENT_LIMIT),
        Some(n) if (1..=MAX_DOCUMENT_LIMIT).contains(&n) => Ok(n),
        Some(_) => Err(UpstreamError::invalid(
            "limit",
            format!("must be between 1 and {MAX_DOCUMENT_LIMIT}"),
        )),
    }
}

/// Date window for [`G0vClient::analyze_by_department`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DateRange {
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentCounts {
    pub count: usize,
    pub press_releases: usize,
    pub propositions: usize,
    pub speeches: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentAnalysis {
    pub departments: BTreeMap<String, DepartmentCounts>,
    pub total: usize,
}

/// Ministry a document belongs to: its sender, else a ministry-like category or known category
/// code, else a ministry named in the URL.
fn department_of(doc: &G0vDocument) -> String {
    if let Some(sender) = doc.sender.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        return sender.to_string();
    }
    for category in &doc.categories {
        let lower = category.to_lowercase();
        if lower.contains("departement") {
            return category.clone();
        }
        if let Some((_, name)) = DEPARTMENT_CODES.iter().find(|(code, _)| lower.contains(code)) {
            return (*name).to_string();
        }
    }
    let url = doc.url.to_lowercase();
    DEPARTMENT_URL_SLUGS
        .iter()
        .find(|(slug, _)| url.contains(slug))
        .map_or(UNKNOWN_DEPARTMENT, |(_, name)| name)
        .to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchAllOptions {
    /// Empty means [`DEFAULT_SEARCH_TYPES`].
    pub types: Vec<String>,
    pub limit: Option<usize>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchAllResult {
    pub results: BTreeMap<String, Vec<G0vDocument>>,
    /// Categories whose listing could not be fetched; they appear in `results` as empty lists.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_types: Vec<String>,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentContent {
    pub url: String,
    pub markdown_url: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestUpdate {
    pub updated: String,
    pub total_documents: u64,
    pub codes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCodes {
    pub count: usize,
    pub category_codes: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTypes {
    pub document_types: Vec<&'static str>,
    pub count: usize,
}

#[derive(Clone)]
pub struct G0vClient {
    base_url: String,
    http: UpstreamHttp,
    limiter: Arc<RateLimiter>,
    ttls: CacheTtls,
    listings: TtlCache<Arc<Vec<G0vDocument>>>,
    content: TtlCache<String>,
    meta: TtlCache<Value>,
}

impl G0vClient {
    #[must_use]
    pub fn new(config: &GatewayConfig, http: UpstreamHttp, limiter: Arc<RateLimiter>) -> Self {
        Self {
            base_url: config.g0v.base_url.trim_end_matches('/').to_string(),
            http,
            limiter,
            ttls: config.cache,
            listings: TtlCache::new(),
            content: TtlCache::new(),
            meta: TtlCache::new(),
        }
    }

    #[must_use]
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn clear_cache(&self) {
        self.listings.clear();
        self.content.clear();
        self.meta.clear();
    }

    #[must_use]
    pub fn document_types(&self) -> DocumentTypes {
        let document_types: Vec<_> = TYPE_ALIASES.iter().map(|(alias, _)| *alias).collect();
        DocumentTypes {
            count: document_types.len(),
            document_types,
        }
    }

    /// Documents of one category, filtered locally.
    ///
    /// # Errors
    ///
    /// Validation failures for an unusable category name or limit, and upstream failures.
    pub async fn documents(
        &self,
        type_or_alias: &str,
        filter: &DocumentFilter,
    ) -> Result<Vec<G0vDocument>> {
        let limit = filter.effective_limit()?;
        let listing = self.listing(type_or_alias).await?;
        let documents = filter.apply(&listing, limit);
        info!(
            category = %type_or_alias,
            listed = listing.len(),
            matched = documents.len(),
            "filtered g0v documents"
        );
        Ok(documents)
    }

    /// Run [`documents`](Self::documents) concurrently over several categories.
    ///
    /// A category that fails contributes an empty list and is named in `failed_types`.
    ///
    /// # Errors
    ///
    /// Returns a validation error when `term` is blank or the per-category limit is out of range.
    pub async fn search_all(
        &self,
        term: &str,
        options: &SearchAllOptions,
    ) -> Result<SearchAllResult> {
        if term.trim().is_empty() {
            return Err(UpstreamError::invalid("query", "must not be empty"));
        }
        check_limit(options.limit)?;
        let types: Vec<String> = if options.types.is_empty() {
            DEFAULT_SEARCH_TYPES.iter().map(|t| (*t).to_string()).collect()
        } else {
            options.types.clone()
        };
        let filter = DocumentFilter {
            search: Some(term.to_string()),
            date_from: options.date_from.clone(),
            date_to: options.date_to.clone(),
            limit: options.limit,
        };

        let fetched = join_all(types.iter().map(|t| self.documents(t, &filter))).await;

        let mut results = BTreeMap::new();
        let mut failed_types = Vec::new();
        for (name, outcome) in types.into_iter().zip(fetched) {
            let docs = match outcome {
                Ok(docs) => docs,
                Err(e) => {
                    warn!(category = %name, error = %e, "g0v category search failed");
                    failed_types.push(name.clone());
                    Vec::new()
                }
            };
            results.insert(name, docs);
        }
        let total = results.values().map(Vec::len).sum();
        Ok(SearchAllResult {
            results,
            failed_types,
            total,
        })
    }

    /// Press releases, propositions and speeches in `range`, counted per ministry.
    ///
    /// # Errors
    ///
    /// The first listing that cannot be fetched fails the analysis.
    pub async fn analyze_by_department(&self, range: &DateRange) -> Result<DepartmentAnalysis> {
        let (press, props, speeches) = try_join3(
            self.listing("pressmeddelanden"),
            self.listing("propositioner"),
            self.listing("tal"),
        )
        .await?;

        let filter = DocumentFilter {
            date_from: range.date_from.clone(),
            date_to: range.date_to.clone(),
            ..DocumentFilter::default()
        };
        let mut departments: BTreeMap<String, DepartmentCounts> = BTreeMap::new();
        let mut total = 0;
        let buckets: [(&[G0vDocument], fn(&mut DepartmentCounts)); 3] = [
            (press.as_slice(), |c| c.press_releases += 1),
            (props.as_slice(), |c| c.propositions += 1),
            (speeches.as_slice(), |c| c.speeches += 1),
        ];
        for (listing, bump) in buckets {
            for doc in filter.apply(listing, usize::MAX) {
                let counts = departments.entry(department_of(&doc)).or_default();
                counts.count += 1;
                bump(counts);
                total += 1;
            }
        }
        info!(departments = departments.len(), total, "analyzed g0v documents by department");
        Ok(DepartmentAnalysis { departments, total })
    }

    /// Markdown rendering of a document, addressed by its regeringen.se or g0v.se URL.
    ///
    /// # Errors
    ///
    /// Validation failure for a URL that cannot be mapped, [`UpstreamError::NotFound`] when the
    /// mirror has no such document, and other upstream failures.
    pub async fn document_content(&self, url: &str) -> Result<DocumentContent> {
        let markdown_url = self.markdown_url(url)?;
        let parsed = Url::parse(&markdown_url)
            .map_err(|e| UpstreamError::invalid("url", format!("invalid URL: {e}")))?;

        let key = fingerprint("g0v-content", &markdown_url);
        let content = self
            .content
            .with_cache(&key, self.ttls.g0v_content(), || async {
                self.limiter.admit().await;
                match self
                    .http
                    .get_text(parsed, Some("text/markdown, text/plain;q=0.9, */*;q=0.1"))
                    .await
                {
                    Err(e) if e.status() == Some(404) => Err(UpstreamError::NotFound {
                        entity: "document",
                        id: url.to_string(),
                        suggestions: vec![
                            "Check that the URL points at a single document".to_string(),
                            "Search g0v documents to find a valid URL".to_string(),
                        ],
                    }),
                    other => other,
                }
            })
            .await?;

        Ok(DocumentContent {
            url: url.to_string(),
            markdown_url,
            content,
        })
    }

    /// # Errors
    ///
    /// Upstream and payload failures.
    pub async fn latest_update(&self) -> Result<LatestUpdate> {
        let raw = self
            .cached_json(
                "/api/latest_updated.json",
                self.ttls.g0v_latest_update(),
            )
            .await?;
        let updated = ["latest_updated", "updated"]
            .iter()
            .find_map(|k| raw.get(*k).and_then(Value::as_str))
            .unwrap_or_default()
            .to_string();
        let total_documents = ["items", "totalDocuments"]
            .iter()
            .find_map(|k| raw.get(*k).and_then(Value::as_u64))
            .unwrap_or(0);
        let codes = raw.get("codes").and_then(Value::as_u64).unwrap_or(0);
        Ok(LatestUpdate {
            updated,
            total_documents,
            codes,
        })
    }

    /// # Errors
    ///
    /// Upstream failures, or a payload that is not a JSON object.
    pub async fn category_codes(&self) -> Result<CategoryCodes> {
        let path = "/api/codes.json";
        let raw = self.cached_json(path, self.ttls.g0v_codes()).await?;
        let Value::Object(category_codes) = raw else {
            return Err(UpstreamError::MalformedPayload {
                url: format!("{}{path}", self.base_url),
                excerpt: "expected a JSON object of category codes".to_string(),
            });
        };
        Ok(CategoryCodes {
            count: category_codes.len(),
            category_codes,
        })
    }

    async fn listing(&self, type_or_alias: &str) -> Result<Arc<Vec<G0vDocument>>> {
        let slug = resolve_type(type_or_alias);
        let slug = slug.trim_matches('/');
        if slug.is_empty()
            || !slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '/')
            || slug.contains("//")
        {
            return Err(UpstreamError::invalid(
                "type",
                format!("unknown document type '{type_or_alias}'"),
            ));
        }

        let key = fingerprint("g0v-documents", slug);
        self.listings
            .with_cache(&key, self.ttls.g0v_documents(), || async {
                let url = build_url(&self.base_url, &format!("/{slug}.json"), &QueryParams::new())?;
                self.limiter.admit().await;
                let documents: Vec<G0vDocument> = self.http.get_json(url).await?;
                info!(slug, documents = documents.len(), "fetched g0v listing");
                Ok::<_, UpstreamError>(Arc::new(documents))
            })
            .await
    }

    async fn cached_json(&self, path: &str, ttl: std::time::Duration) -> Result<Value> {
        let key = fingerprint("g0v-meta", path);
        self.meta
            .with_cache(&key, ttl, || async {
                let url = build_url(&self.base_url, path, &QueryParams::new())?;
                self.limiter.admit().await;
                self.http.get_json::<Value>(url).await
            })
            .await
    }

    /// Map a document URL onto the mirror's markdown rendering.
    fn markdown_url(&self, url: &str) -> Result<String> {
        let url = url.trim();
        let mirror_prefix = format!("{}/", self.base_url);

        let path = if let Some(rest) = url.strip_prefix(&mirror_prefix) {
            rest
        } else if let Some(rest) = REGERINGEN_HOSTS
            .iter()
            .find_map(|host| url.strip_prefix(host))
        {
            rest
        } else if let Some(rest) = url.strip_prefix('/') {
            rest
        } else {
            return Err(UpstreamError::invalid(
                "url",
                format!(
                    "expected a full URL (https://www.regeringen.se/...) or a site-relative path (/pressmeddelanden/...), got '{url}'"
                ),
            ));
        };

        let path = path.trim_end_matches('/');
        if path.is_empty() {
            return Err(UpstreamError::invalid("url", "must point at a document"));
        }
        Ok(format!("{}/{path}.md", self.base_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> G0vClient {
        let config = GatewayConfig::default();
        let http = UpstreamHttp::new(&config.http).expect("http");
        let limiter = Arc::new(RateLimiter::new("g0v", config.g0v.rate_limit));
        G0vClient::new(&config, http, limiter)
    }

    fn doc(title: &str, published: &str) -> G0vDocument {
        G0vDocument {
            url: format!("/pressmeddelanden/{}", title.to_lowercase()),
            title: title.to_string(),
            published: published.to_string(),
            updated: None,
            doc_type: "Pressmeddelande".to_string(),
            categories: Vec::new(),
            sender: None,
            reference: None,
            attachments: Vec::new(),
        }
    }

    #[test]
    fn aliases_resolve_case_insensitively() {
        assert_eq!(resolve_type("SOU"), "rattsliga-dokument/statens-offentliga-utredningar");
        assert_eq!(resolve_type("propositioner"), "rattsliga-dokument/proposition");
        assert_eq!(resolve_type("nagot-annat"), "nagot-annat");
    }

    #[test]
    fn markdown_url_variants() {
        let c = client();
        assert_eq!(
            c.markdown_url("https://www.regeringen.se/pressmeddelanden/2025/01/x/").unwrap(),
            "https://g0v.se/pressmeddelanden/2025/01/x.md"
        );
        assert_eq!(
            c.markdown_url("https://g0v.se/tal/2024/05/y").unwrap(),
            "https://g0v.se/tal/2024/05/y.md"
        );
        assert_eq!(
            c.markdown_url("/rapporter/2023/z").unwrap(),
            "https://g0v.se/rapporter/2023/z.md"
        );
        assert!(matches!(
            c.markdown_url("just-a-slug"),
            Err(UpstreamError::Validation { .. })
        ));
        assert!(c.markdown_url("https://g0v.se/").is_err());
    }

    #[test]
    fn filter_by_title_date_and_limit() {
        let docs = vec![
            doc("Budget för 2025", "2024-09-19"),
            doc("Nytt försvarsbeslut", "2024-10-01"),
            doc("Budgetpropositionen", "2025-01-10"),
        ];
        let f = DocumentFilter {
            search: Some("BUDGET".to_string()),
            date_from: Some("2024-09-01".to_string()),
            date_to: Some("2024-12-31".to_string()),
            limit: None,
        };
        let out = f.apply(&docs, f.effective_limit().unwrap());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Budget för 2025");

        let f = DocumentFilter {
            limit: Some(2),
            ..DocumentFilter::default()
        };
        assert_eq!(f.apply(&docs, f.effective_limit().unwrap()).len(), 2);
    }

    #[test]
    fn limit_defaults_and_bounds() {
        assert_eq!(check_limit(None).unwrap(), DEFAULT_DOCUMENT_LIMIT);
        assert_eq!(check_limit(Some(MAX_DOCUMENT_LIMIT)).unwrap(), MAX_DOCUMENT_LIMIT);
        assert!(matches!(check_limit(Some(0)), Err(UpstreamError::Validation { .. })));
        assert!(matches!(
            check_limit(Some(MAX_DOCUMENT_LIMIT + 1)),
            Err(UpstreamError::Validation { .. })
        ));
    }

    #[test]
    fn department_comes_from_sender_then_categories_then_url() {
        let mut d = doc("Tal", "2024-01-01");
        d.sender = Some(" Finansdepartementet ".to_string());
        assert_eq!(department_of(&d), "Finansdepartementet");

        let mut d = doc("Tal", "2024-01-01");
        d.categories = vec!["Landsbygd".to_string(), "Kulturdepartementet".to_string()];
        assert_eq!(department_of(&d), "Kulturdepartementet");

        let mut d = doc("Tal", "2024-01-01");
        d.categories = vec!["1283".to_string()];
        assert_eq!(department_of(&d), "Justitiedepartementet");

        let mut d = doc("Tal", "2024-01-01");
        d.url = "/tal/2024/01/tal-av-socialdepartementet/".to_string();
        assert_eq!(department_of(&d), "Socialdepartementet");

        assert_eq!(department_of(&doc("Tal", "2024-01-01")), UNKNOWN_DEPARTMENT);
    }

    #[test]
    fn document_types_lists_every_alias() {
        let types = client().document_types();
        assert_eq!(types.count, TYPE_ALIASES.len());
        assert!(types.document_types.contains(&"sou"));
    }
}
