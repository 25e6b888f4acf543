//! Client for the parliamentary records API (data.riksdagen.se).
//!
//! Every list operation goes through the same path: build the outbound query, look it up in the
//! list cache by fingerprint, and on a miss wait for a rate-limit token, fetch the envelope and
//! normalize it into a [`PaginatedResult`]. Only successful pages are cached.

use crate::config::{CacheTtls, GatewayConfig};
use crate::error::{Result, UpstreamError};
use crate::http::{UpstreamHttp, excerpt, redact_url};
use crate::query::{QueryParams, build_url};
use crate::reports::{
    DEFAULT_REPORT_LIMIT, MAX_REPORT_LIMIT, Report, ReportFormat, ReportKind, text_preview,
};
use opendata_resilience::cache::{TtlCache, fingerprint};
use opendata_resilience::error::FieldViolation;
use opendata_resilience::normalize::EnvelopeFormat;
use opendata_resilience::pagination::{PaginatedResult, fetch_all_pages};
use opendata_resilience::rate_limit::RateLimiter;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

pub const MAX_PAGE: u32 = 10_000;
pub const MAX_PAGES_PER_CALL: u32 = 50;
pub const MAX_BATCH_PER_SESSION: u32 = 300;

/// Full texts longer than this carry a `textWarning`.
pub const LARGE_TEXT_CHARS: usize = 100_000;

const TEXT_ACCEPT: &str = "text/plain, text/html;q=0.9, */*;q=0.1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Documents,
    Persons,
    Speeches,
    Votes,
    VoteGroups,
    Calendar,
}

impl ListKind {
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            ListKind::Documents => "/dokumentlista/",
            ListKind::Persons => "/personlista/",
            ListKind::Speeches => "/anforandelista/",
            ListKind::Votes => "/voteringlista/",
            ListKind::VoteGroups => "/voteringlistagrupp/",
            ListKind::Calendar => "/kalenderlista/",
        }
    }

    /// Top-level key of the JSON envelope.
    #[must_use]
    pub const fn container(self) -> &'static str {
        match self {
            ListKind::Documents => "dokumentlista",
            ListKind::Persons => "personlista",
            ListKind::Speeches => "anforandelista",
            ListKind::Votes => "voteringlista",
            ListKind::VoteGroups => "voteringlistagrupp",
            ListKind::Calendar => "kalender",
        }
    }

    #[must_use]
    pub const fn default_page_size(self) -> u32 {
        match self {
            ListKind::Documents | ListKind::Persons => 50,
            ListKind::Speeches => 100,
            ListKind::Votes | ListKind::VoteGroups => 500,
            ListKind::Calendar => 200,
        }
    }

    #[must_use]
    pub const fn max_page_size(self) -> u32 {
        match self {
            ListKind::Documents | ListKind::Persons | ListKind::Speeches => 200,
            ListKind::Votes | ListKind::VoteGroups | ListKind::Calendar => 500,
        }
    }

    const fn namespace(self) -> &'static str {
        match self {
            ListKind::Documents => "riksdagen-documents",
            ListKind::Persons => "riksdagen-persons",
            ListKind::Speeches => "riksdagen-speeches",
            ListKind::Votes => "riksdagen-votes",
            ListKind::VoteGroups => "riksdagen-vote-groups",
            ListKind::Calendar => "riksdagen-calendar",
        }
    }

    fn ttl(self, ttls: &CacheTtls) -> Duration {
        match self {
            ListKind::Documents => ttls.documents(),
            ListKind::Persons => ttls.persons(),
            ListKind::Speeches => ttls.speeches(),
            ListKind::Votes | ListKind::VoteGroups => ttls.votes(),
            ListKind::Calendar => ttls.calendar(),
        }
    }
}

/// Page selection for a single-page list call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paging {
    pub page: u32,
    /// `None` uses the endpoint's default page size.
    pub page_size: Option<u32>,
}

impl Default for Paging {
    fn default() -> Self {
        Self::first(None)
    }
}

impl Paging {
    #[must_use]
    pub const fn first(page_size: Option<u32>) -> Self {
        Self { page: 1, page_size }
    }

    #[must_use]
    pub const fn page(page: u32, page_size: Option<u32>) -> Self {
        Self { page, page_size }
    }

    fn validate(self, kind: ListKind) -> Result<u32> {
        let mut violations = Vec::new();
        check_page(self.page, &mut violations);
        let page_size = check_page_size(self.page_size, kind, &mut violations);
        finish(violations)?;
        Ok(page_size)
    }
}

/// Page selection for the paginated document and speech operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    pub page: u32,
    pub page_size: Option<u32>,
    /// Collect pages `1..=max_pages` instead of returning `page`.
    pub fetch_all: bool,
    pub max_pages: Option<u32>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: None,
            fetch_all: false,
            max_pages: None,
        }
    }
}

impl PageRequest {
    fn validate(self, kind: ListKind, default_max_pages: u32) -> Result<(u32, u32)> {
        let mut violations = Vec::new();
        check_page(self.page, &mut violations);
        let page_size = check_page_size(self.page_size, kind, &mut violations);
        let max_pages = self.max_pages.unwrap_or(default_max_pages);
        if !(1..=MAX_PAGES_PER_CALL).contains(&max_pages) {
            violations.push(FieldViolation::new(
                "maxPages",
                format!("must be between 1 and {MAX_PAGES_PER_CALL}"),
            ));
        }
        finish(violations)?;
        Ok((page_size, max_pages))
    }
}

fn check_page(page: u32, violations: &mut Vec<FieldViolation>) {
    if !(1..=MAX_PAGE).contains(&page) {
        violations.push(FieldViolation::new(
            "page",
            format!("must be between 1 and {MAX_PAGE}"),
        ));
    }
}

fn check_page_size(
    page_size: Option<u32>,
    kind: ListKind,
    violations: &mut Vec<FieldViolation>,
) -> u32 {
    let max = kind.max_page_size();
    let size = page_size.unwrap_or_else(|| kind.default_page_size());
    if !(1..=max).contains(&size) {
        violations.push(FieldViolation::new(
            "pageSize",
            format!("must be between 1 and {max}"),
        ));
    }
    size
}

fn finish(violations: Vec<FieldViolation>) -> Result<()> {
    if violations.is_empty() {
        Ok(())
    } else {
        Err(UpstreamError::Validation { violations })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentQuery {
    pub doktyp: Option<String>,
    pub sok: Option<String>,
    pub rm: Option<String>,
    pub organ: Option<String>,
    pub bet: Option<String>,
    pub nummer: Option<String>,
    pub iid: Option<String>,
    pub parti: Option<String>,
    pub talare: Option<String>,
    pub from: Option<String>,
    pub tom: Option<String>,
    pub status: Option<String>,
    pub sort: Option<String>,
    pub sortorder: Option<String>,
}

impl DocumentQuery {
    fn to_query(&self) -> QueryParams {
        let doktyp = self.doktyp.as_deref().map(str::to_lowercase);
        QueryParams::new()
            .set_opt("doktyp", doktyp.as_deref())
            .set_opt("sok", self.sok.as_deref())
            .set_opt("rm", self.rm.as_deref())
            .set_opt("organ", self.organ.as_deref())
            .set_opt("bet", self.bet.as_deref())
            .set_opt("nummer", self.nummer.as_deref())
            .set_opt("iid", self.iid.as_deref())
            .set_opt("parti", self.parti.as_deref())
            .set_opt("talare", self.talare.as_deref())
            .set_opt("from", self.from.as_deref())
            .set_opt("tom", self.tom.as_deref())
            .set_opt("status", self.status.as_deref())
            .set_opt("sort", self.sort.as_deref())
            .set_opt("sortorder", self.sortorder.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonQuery {
    pub fnamn: Option<String>,
    pub enamn: Option<String>,
    pub parti: Option<String>,
    pub valkrets: Option<String>,
    /// Defaults to `samtliga` (all members, current and former).
    pub rdlstatus: Option<String>,
    pub iid: Option<String>,
}

impl PersonQuery {
    fn to_query(&self) -> QueryParams {
        let parti = self.parti.as_deref().map(str::to_uppercase);
        QueryParams::new()
            .set_opt("fnamn", self.fnamn.as_deref())
            .set_opt("enamn", self.enamn.as_deref())
            .set_opt("parti", parti.as_deref())
            .set_opt("iid", self.iid.as_deref())
            .set_opt("valkrets", self.valkrets.as_deref())
            .set("rdlstatus", self.rdlstatus.as_deref().unwrap_or("samtliga"))
            .set("sort", "sorteringsnamn")
            .set("sortorder", "asc")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechQuery {
    pub sok: Option<String>,
    pub talare: Option<String>,
    pub parti: Option<String>,
    pub rm: Option<String>,
}

impl SpeechQuery {
    fn to_query(&self) -> QueryParams {
        let parti = self.parti.as_deref().map(str::to_uppercase);
        QueryParams::new()
            .set_opt("sok", self.sok.as_deref())
            .set_opt("talare", self.talare.as_deref())
            .set_opt("parti", parti.as_deref())
            .set_opt("rm", self.rm.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoteQuery {
    pub votering_id: Option<String>,
    pub rm: Option<String>,
    pub bet: Option<String>,
    pub punkt: Option<String>,
    pub iid: Option<String>,
    pub parti: Option<String>,
    pub valkrets: Option<String>,
    pub rost: Option<String>,
    pub avser: Option<String>,
    /// `namn`, `parti` or `valkrets`.
    pub gruppering: Option<String>,
}

impl VoteQuery {
    fn to_query(&self) -> QueryParams {
        QueryParams::new()
            .set_opt("votering_id", self.votering_id.as_deref())
            .set_opt("rm", self.rm.as_deref())
            .set_opt("bet", self.bet.as_deref())
            .set_opt("punkt", self.punkt.as_deref())
            .set_opt("iid", self.iid.as_deref())
            .set_opt("parti", self.parti.as_deref())
            .set_opt("valkrets", self.valkrets.as_deref())
            .set_opt("rost", self.rost.as_deref())
            .set_opt("avser", self.avser.as_deref())
            .set_opt("gruppering", self.gruppering.as_deref())
            .set("sort", "datum")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoteGroupQuery {
    pub rm: Option<String>,
    pub bet: Option<String>,
    pub punkt: Option<String>,
    pub gruppering: Option<String>,
}

impl VoteGroupQuery {
    fn to_query(&self) -> QueryParams {
        QueryParams::new()
            .set_opt("rm", self.rm.as_deref())
            .set_opt("bet", self.bet.as_deref())
            .set_opt("punkt", self.punkt.as_deref())
            .set_opt("gruppering", self.gruppering.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarQuery {
    pub from: Option<String>,
    pub tom: Option<String>,
    pub akt: Option<String>,
    pub org: Option<String>,
    pub sort: Option<String>,
}

impl CalendarQuery {
    fn to_query(&self) -> QueryParams {
        QueryParams::new()
            .set_opt("from", self.from.as_deref())
            .set_opt("tom", self.tom.as_deref())
            .set_opt("akt", self.akt.as_deref())
            .set_opt("org", self.org.as_deref())
            .set_opt("sort", self.sort.as_deref())
    }
}

/// Calendar result. The calendar endpoint is known to answer with HTML instead of JSON at times;
/// that case is reported as `Unavailable` rather than as an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(
    tag = "status",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum CalendarResponse {
    Ok {
        count: u64,
        events: Vec<Value>,
    },
    Unavailable {
        raw_excerpt: String,
        url: String,
        notice: String,
        suggestions: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub hits: u64,
    pub page: u32,
    pub total_pages: u64,
    pub page_size: u32,
    pub has_more: bool,
    pub next_page: Option<u32>,
    pub prev_page: Option<u32>,
    pub showing: usize,
}

impl PageInfo {
    fn new<T>(page: &PaginatedResult<T>, page_size: u32) -> Self {
        Self {
            hits: page.total_hits,
            page: page.current_page,
            total_pages: page.total_hits.div_ceil(u64::from(page_size.max(1))),
            page_size,
            has_more: page.has_more,
            next_page: page
                .current_page
                .checked_add(1)
                .filter(|_| page.has_more),
            prev_page: (page.current_page > 1).then(|| page.current_page - 1),
            showing: page.items.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ListPage {
    #[serde(rename_all = "camelCase")]
    Page {
        items: Vec<Value>,
        pagination: PageInfo,
    },
    #[serde(rename_all = "camelCase")]
    All {
        items: Vec<Value>,
        total: usize,
        pages_fetched: u32,
        complete: bool,
    },
}

impl ListPage {
    #[must_use]
    pub fn items(&self) -> &[Value] {
        match self {
            ListPage::Page { items, .. } | ListPage::All { items, .. } => items,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDocuments {
    pub rm: String,
    pub documents: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchDocuments {
    pub sessions: Vec<SessionDocuments>,
    pub total_documents: usize,
}

#[derive(Clone)]
pub struct RiksdagenClient {
    base_url: String,
    http: UpstreamHttp,
    limiter: Arc<RateLimiter>,
    envelope: EnvelopeFormat,
    ttls: CacheTtls,
    inter_page_delay: Duration,
    default_max_pages: u32,
    lists: TtlCache<PaginatedResult<Value>>,
    records: TtlCache<Value>,
    texts: TtlCache<String>,
    reports: TtlCache<Report>,
}

impl RiksdagenClient {
    #[must_use]
    pub fn new(config: &GatewayConfig, http: UpstreamHttp, limiter: Arc<RateLimiter>) -> Self {
        Self {
            base_url: config.riksdagen.base_url.clone(),
            http,
            limiter,
            envelope: config.envelope.clone(),
            ttls: config.cache,
            inter_page_delay: config.pagination.inter_page_delay(),
            default_max_pages: config.pagination.default_max_pages,
            lists: TtlCache::new(),
            records: TtlCache::new(),
            texts: TtlCache::new(),
            reports: TtlCache::new(),
        }
    }

    #[must_use]
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn clear_cache(&self) {
        self.lists.clear();
        self.records.clear();
        self.texts.clear();
        self.reports.clear();
    }

    /// # Errors
    ///
    /// Validation, upstream and payload failures as [`UpstreamError`].
    pub async fn documents(
        &self,
        query: &DocumentQuery,
        paging: Paging,
    ) -> Result<PaginatedResult<Value>> {
        let mut page = self
            .fetch_list(ListKind::Documents, query.to_query(), paging)
            .await?;
        page.items.iter_mut().for_each(normalize_document_url);
        Ok(page)
    }

    /// # Errors
    ///
    /// Validation, upstream and payload failures as [`UpstreamError`].
    pub async fn persons(
        &self,
        query: &PersonQuery,
        paging: Paging,
    ) -> Result<PaginatedResult<Value>> {
        self.fetch_list(ListKind::Persons, query.to_query(), paging)
            .await
    }

    /// # Errors
    ///
    /// Validation, upstream and payload failures as [`UpstreamError`].
    pub async fn speeches(
        &self,
        query: &SpeechQuery,
        paging: Paging,
    ) -> Result<PaginatedResult<Value>> {
        let mut page = self
            .fetch_list(ListKind::Speeches, query.to_query(), paging)
            .await?;
        page.items.iter_mut().for_each(ensure_speech_text);
        Ok(page)
    }

    /// # Errors
    ///
    /// Validation, upstream and payload failures as [`UpstreamError`].
    pub async fn votes(&self, query: &VoteQuery, paging: Paging) -> Result<PaginatedResult<Value>> {
        self.fetch_list(ListKind::Votes, query.to_query(), paging)
            .await
    }

    /// Grouped vote tallies. The grouped endpoint has no page parameter.
    ///
    /// # Errors
    ///
    /// Validation, upstream and payload failures as [`UpstreamError`].
    pub async fn vote_groups(
        &self,
        query: &VoteGroupQuery,
        page_size: Option<u32>,
    ) -> Result<PaginatedResult<Value>> {
        let kind = ListKind::VoteGroups;
        let page_size = Paging::first(page_size).validate(kind)?;
        let q = query
            .to_query()
            .set("sz", page_size)
            .set("utformat", "json");
        self.fetch_envelope(kind, q, page_size).await
    }

    /// # Errors
    ///
    /// Validation failures, transport failures and non-2xx statuses as [`UpstreamError`]. A 2xx
    /// body that is not JSON is returned as [`CalendarResponse::Unavailable`].
    pub async fn calendar(
        &self,
        query: &CalendarQuery,
        limit: Option<u32>,
    ) -> Result<CalendarResponse> {
        let kind = ListKind::Calendar;
        let page_size = Paging::first(limit).validate(kind)?;
        let q = query
            .to_query()
            .set("sz", page_size)
            .set("utformat", "json");

        let key = fingerprint(kind.namespace(), &q);
        if let Some(page) = self.lists.get(&key) {
            return Ok(CalendarResponse::Ok {
                count: page.total_hits,
                events: page.items,
            });
        }

        let url = build_url(&self.base_url, kind.path(), &q)?;
        let redacted = redact_url(&url);
        self.limiter.admit().await;
        let raw = self.http.get_raw(url, None).await?;
        if !raw.is_success() {
            return Err(UpstreamError::Unavailable {
                url: redacted,
                status: Some(raw.status),
                message: format!("upstream returned status {}", raw.status),
            });
        }

        let Ok(envelope) = serde_json::from_str::<Value>(&raw.body) else {
            warn!(url = %redacted, "calendar endpoint returned a non-JSON body");
            return Ok(CalendarResponse::Unavailable {
                raw_excerpt: excerpt(&raw.body),
                url: redacted,
                notice: "The calendar endpoint returned HTML instead of JSON. This is a known upstream problem; try again later.".to_string(),
                suggestions: vec![
                    "Search documents for upcoming debates and votes instead".to_string(),
                    "Try a different or shorter date range".to_string(),
                ],
            });
        };

        let mut page = self.envelope.paginated(envelope, kind.container());
        page.truncate_to(page_size as usize);
        self.lists.put(key, page.clone(), kind.ttl(&self.ttls));
        Ok(CalendarResponse::Ok {
            count: page.total_hits,
            events: page.items,
        })
    }

    /// A single document by id (e.g. `H901FiU1`).
    ///
    /// With `include_full_text` the plain-text rendering is attached as `text`. Texts longer
    /// than 100 000 characters also carry a `textWarning`. A text that cannot be fetched leaves
    /// `text` null and adds a `notice`; the record itself is still returned.
    ///
    /// # Errors
    ///
    /// [`UpstreamError::NotFound`] when the upstream has no such document.
    pub async fn document(&self, dok_id: &str, include_full_text: bool) -> Result<Value> {
        let mut doc = self.document_record(dok_id).await?;
        if include_full_text {
            self.attach_full_text(dok_id, &mut doc).await;
        }
        Ok(doc)
    }

    async fn document_record(&self, dok_id: &str) -> Result<Value> {
        let dok_id = validate_id("dok_id", dok_id, 2)?;
        let key = fingerprint("riksdagen-document", dok_id);
        self.records
            .with_cache(&key, self.ttls.documents(), || async {
                let path = format!("/dokument/{dok_id}.json");
                let url = build_url(&self.base_url, &path, &QueryParams::new())?;
                self.limiter.admit().await;
                let mut body: Value = match self.http.get_json(url).await {
                    Ok(body) => body,
                    Err(e) if e.status() == Some(404) => return Err(document_not_found(dok_id)),
                    Err(e) => return Err(e),
                };
                let mut doc = body
                    .pointer_mut("/dokumentstatus/dokument")
                    .filter(|d| d.is_object())
                    .map(Value::take)
                    .ok_or_else(|| document_not_found(dok_id))?;
                normalize_document_url(&mut doc);
                info!(dok_id, "fetched document");
                Ok::<_, UpstreamError>(doc)
            })
            .await
    }

    async fn attach_full_text(&self, dok_id: &str, doc: &mut Value) {
        let Some(obj) = doc.as_object_mut() else {
            return;
        };
        let source = non_empty_str(obj, "dokument_url_text")
            .or_else(|| non_empty_str(obj, "dokument_url_html"))
            .map(str::to_string);
        let fetched = match source {
            Some(raw) => self.full_text(&raw).await.map_err(|e| e.to_string()),
            None => Err("the document has no text or HTML rendering".to_string()),
        };

        match fetched {
            Ok(text) => {
                let chars = text.chars().count();
                if chars > LARGE_TEXT_CHARS {
                    warn!(dok_id, chars, "document text is very large");
                    obj.insert(
                        "textWarning".to_string(),
                        Value::String(format!(
                            "The full text is large ({} KB). Consider the summary instead.",
                            chars / 1000
                        )),
                    );
                }
                obj.insert("text".to_string(), Value::String(text));
            }
            Err(reason) => {
                warn!(dok_id, %reason, "document text unavailable");
                obj.insert("text".to_string(), Value::Null);
                obj.insert(
                    "notice".to_string(),
                    Value::String(format!("The full text could not be fetched: {reason}")),
                );
            }
        }
    }

    async fn full_text(&self, raw_url: &str) -> Result<String> {
        let url = self.resolve_upstream_url(raw_url)?;
        let key = fingerprint("riksdagen-document-text", url.as_str());
        self.texts
            .with_cache(&key, self.ttls.documents(), || async move {
                self.limiter.admit().await;
                self.http.get_text(url, Some(TEXT_ACCEPT)).await
            })
            .await
    }

    /// Absolute URL for a link found in a record: protocol-relative links get `https:`, and
    /// root-relative ones are resolved against the configured base URL.
    fn resolve_upstream_url(&self, raw: &str) -> Result<Url> {
        let absolute = if raw.starts_with("//") {
            format!("https:{raw}")
        } else if raw.starts_with('/') {
            return build_url(&self.base_url, raw, &QueryParams::new());
        } else {
            raw.to_string()
        };
        let url = Url::parse(&absolute)
            .map_err(|e| UpstreamError::invalid("url", format!("'{raw}' is not a URL: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(UpstreamError::invalid("url", "only http(s) links can be fetched"));
        }
        Ok(url)
    }

    /// One of the statistical reports. `limit` (1..=500, default 200) only applies to the
    /// reports served from the document list; HTML reports are cut to a 500-character preview.
    ///
    /// # Errors
    ///
    /// Validation failures, transport failures and non-2xx statuses as [`UpstreamError`].
    pub async fn report(&self, kind: ReportKind, limit: Option<u32>) -> Result<Report> {
        let limit = limit.unwrap_or(DEFAULT_REPORT_LIMIT);
        if !(1..=MAX_REPORT_LIMIT).contains(&limit) {
            return Err(UpstreamError::invalid(
                "limit",
                format!("must be between 1 and {MAX_REPORT_LIMIT}"),
            ));
        }

        let mut q = kind
            .params()
            .iter()
            .fold(QueryParams::new(), |q, (k, v)| q.set(k, v));
        if kind.takes_limit() {
            q = q.set("sz", limit);
        }
        let url = build_url(&self.base_url, kind.path(), &q)?;
        let key = fingerprint("riksdagen-report", url.as_str());

        self.reports
            .with_cache(&key, self.ttls.reports(), || async move {
                let shown = url.to_string();
                self.limiter.admit().await;
                let report = match kind.format() {
                    ReportFormat::Json => Report {
                        report: kind,
                        url: shown,
                        summary: "JSON data received".to_string(),
                        data: self.http.get_json(url).await?,
                        notice: None,
                    },
                    ReportFormat::Text => {
                        let body = self.http.get_text(url, Some("text/html")).await?;
                        let (data, summary) = text_preview(&body);
                        Report {
                            report: kind,
                            url: shown,
                            summary,
                            data,
                            notice: Some(
                                "This report is published as HTML. Open the URL for the full report."
                                    .to_string(),
                            ),
                        }
                    }
                };
                info!(report = %kind, "fetched report");
                Ok::<_, UpstreamError>(report)
            })
            .await
    }

    /// A single member of parliament by `intressent_id`.
    ///
    /// # Errors
    ///
    /// [`UpstreamError::NotFound`] when no member has that id.
    pub async fn person(&self, intressent_id: &str) -> Result<Value> {
        let iid = validate_id("intressent_id", intressent_id, 1)?;
        let query = PersonQuery {
            iid: Some(iid.to_string()),
            ..PersonQuery::default()
        };
        let page = self.persons(&query, Paging::first(Some(1))).await?;
        page.items
            .into_iter()
            .next()
            .ok_or_else(|| UpstreamError::NotFound {
                entity: "person",
                id: iid.to_string(),
                suggestions: vec![
                    "Check the intressent_id".to_string(),
                    "Search members by name to find the id".to_string(),
                ],
            })
    }

    /// Documents with explicit page metadata, or every page up to `max_pages`.
    ///
    /// # Errors
    ///
    /// Validation failures, or the first failing page.
    pub async fn paginated_documents(
        &self,
        query: &DocumentQuery,
        request: PageRequest,
    ) -> Result<ListPage> {
        let mut page = self
            .paginated(ListKind::Documents, query.to_query(), request)
            .await?;
        match &mut page {
            ListPage::Page { items, .. } | ListPage::All { items, .. } => {
                items.iter_mut().for_each(normalize_document_url);
            }
        }
        Ok(page)
    }

    /// Speeches with explicit page metadata, or every page up to `max_pages`.
    ///
    /// # Errors
    ///
    /// Validation failures, or the first failing page.
    pub async fn paginated_speeches(
        &self,
        query: &SpeechQuery,
        request: PageRequest,
    ) -> Result<ListPage> {
        let mut page = self
            .paginated(ListKind::Speeches, query.to_query(), request)
            .await?;
        match &mut page {
            ListPage::Page { items, .. } | ListPage::All { items, .. } => {
                items.iter_mut().for_each(ensure_speech_text);
            }
        }
        Ok(page)
    }

    /// First page of `doktyp` documents for each session in `sessions`, fetched one after another.
    ///
    /// # Errors
    ///
    /// Validation failures, or the first failing session.
    pub async fn batch_documents(
        &self,
        doktyp: &str,
        sessions: &[String],
        per_session: Option<u32>,
    ) -> Result<BatchDocuments> {
        let mut violations = Vec::new();
        if doktyp.trim().is_empty() {
            violations.push(FieldViolation::new("doktyp", "must not be empty"));
        }
        if sessions.is_empty() {
            violations.push(FieldViolation::new("riksmoten", "must name at least one session"));
        }
        let per_session = per_session.unwrap_or(100);
        if !(1..=MAX_BATCH_PER_SESSION).contains(&per_session) {
            violations.push(FieldViolation::new(
                "maxPerRiksmote",
                format!("must be between 1 and {MAX_BATCH_PER_SESSION}"),
            ));
        }
        finish(violations)?;

        let mut out = Vec::with_capacity(sessions.len());
        for (i, rm) in sessions.iter().enumerate() {
            if i > 0 && !self.inter_page_delay.is_zero() {
                tokio::time::sleep(self.inter_page_delay).await;
            }
            let query = DocumentQuery {
                doktyp: Some(doktyp.to_string()),
                rm: Some(rm.clone()),
                ..DocumentQuery::default()
            };
            let q = paged(query.to_query(), 1, per_session);
            let page = self
                .fetch_envelope(ListKind::Documents, q, per_session)
                .await?;
            let mut documents = page.items;
            documents.iter_mut().for_each(normalize_document_url);
            out.push(SessionDocuments {
                rm: rm.clone(),
                documents,
            });
        }

        let total_documents = out.iter().map(|s| s.documents.len()).sum();
        Ok(BatchDocuments {
            sessions: out,
            total_documents,
        })
    }

    async fn paginated(
        &self,
        kind: ListKind,
        query: QueryParams,
        request: PageRequest,
    ) -> Result<ListPage> {
        let (page_size, max_pages) = request.validate(kind, self.default_max_pages)?;

        if request.fetch_all {
            let collected = fetch_all_pages(
                |p| self.fetch_envelope(kind, paged(query.clone(), p, page_size), page_size),
                max_pages,
                self.inter_page_delay,
            )
            .await?;
            return Ok(ListPage::All {
                total: collected.items.len(),
                items: collected.items,
                pages_fetched: collected.pages_fetched,
                complete: collected.complete,
            });
        }

        let page = self
            .fetch_envelope(kind, paged(query, request.page, page_size), page_size)
            .await?;
        let pagination = PageInfo::new(&page, page_size);
        Ok(ListPage::Page {
            items: page.items,
            pagination,
        })
    }

    async fn fetch_list(
        &self,
        kind: ListKind,
        query: QueryParams,
        paging: Paging,
    ) -> Result<PaginatedResult<Value>> {
        let page_size = paging.validate(kind)?;
        self.fetch_envelope(kind, paged(query, paging.page, page_size), page_size)
            .await
    }

    async fn fetch_envelope(
        &self,
        kind: ListKind,
        query: QueryParams,
        page_size: u32,
    ) -> Result<PaginatedResult<Value>> {
        let key = fingerprint(kind.namespace(), &query);
        self.lists
            .with_cache(&key, kind.ttl(&self.ttls), || async {
                let url = build_url(&self.base_url, kind.path(), &query)?;
                self.limiter.admit().await;
                let envelope: Value = self.http.get_json(url).await?;
                let mut page = self.envelope.paginated(envelope, kind.container());
                page.truncate_to(page_size as usize);
                info!(
                    list = kind.container(),
                    items = page.items.len(),
                    total_hits = page.total_hits,
                    page = page.current_page,
                    has_more = page.has_more,
                    "fetched list page"
                );
                Ok::<_, UpstreamError>(page)
            })
            .await
    }
}

fn paged(query: QueryParams, page: u32, page_size: u32) -> QueryParams {
    query
        .set("p", page)
        .set("sz", page_size)
        .set("utformat", "json")
}

/// Trimmed id made of ASCII letters, digits, `-` and `_`, at least `min_len` long.
fn validate_id<'a>(field: &str, id: &'a str, min_len: usize) -> Result<&'a str> {
    let id = id.trim();
    if id.len() < min_len {
        return Err(UpstreamError::invalid(
            field,
            format!("must be at least {min_len} characters"),
        ));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(UpstreamError::invalid(
            field,
            "may only contain letters, digits, '-' and '_'",
        ));
    }
    Ok(id)
}

fn document_not_found(dok_id: &str) -> UpstreamError {
    UpstreamError::NotFound {
        entity: "document",
        id: dok_id.to_string(),
        suggestions: vec![
            "Check the document id (e.g. HD0144, H901FiU1)".to_string(),
            "Search documents to find the id".to_string(),
            "Some documents are archived or withdrawn".to_string(),
        ],
    }
}

/// Make `dokument_url_html` absolute, falling back to `relurl`.
fn normalize_document_url(doc: &mut Value) {
    let Some(obj) = doc.as_object_mut() else {
        return;
    };
    let url = match non_empty_str(obj, "dokument_url_html") {
        Some(u) if u.starts_with("http://") || u.starts_with("https://") => u.to_string(),
        Some(u) => format!("https:{u}"),
        None => non_empty_str(obj, "relurl").unwrap_or_default().to_string(),
    };
    obj.insert("dokument_url_html".to_string(), Value::String(url));
}

fn ensure_speech_text(speech: &mut Value) {
    let Some(obj) = speech.as_object_mut() else {
        return;
    };
    if non_empty_str(obj, "anforandetext").is_some() {
        return;
    }
    let text = non_empty_str(obj, "anforandetext_html")
        .unwrap_or_default()
        .to_string();
    obj.insert("anforandetext".to_string(), Value::String(text));
}

fn non_empty_str<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn protocol_relative_document_urls_get_a_scheme() {
        let mut doc = json!({ "dokument_url_html": "//data.riksdagen.se/dokument/H901FiU1.html" });
        normalize_document_url(&mut doc);
        assert_eq!(
            doc["dokument_url_html"],
            json!("https://data.riksdagen.se/dokument/H901FiU1.html")
        );

        let mut doc = json!({ "dokument_url_html": "https://x/y" });
        normalize_document_url(&mut doc);
        assert_eq!(doc["dokument_url_html"], json!("https://x/y"));

        let mut doc = json!({ "relurl": "/dokument/H901FiU1" });
        normalize_document_url(&mut doc);
        assert_eq!(doc["dokument_url_html"], json!("/dokument/H901FiU1"));
    }

    #[test]
    fn speech_text_falls_back_to_html() {
        let mut speech = json!({ "anforandetext_html": "<p>Fru talman!</p>" });
        ensure_speech_text(&mut speech);
        assert_eq!(speech["anforandetext"], json!("<p>Fru talman!</p>"));
    }

    #[test]
    fn page_request_reports_every_violation() {
        let req = PageRequest {
            page: 0,
            page_size: Some(201),
            fetch_all: true,
            max_pages: Some(51),
        };
        let err = req.validate(ListKind::Documents, 10).unwrap_err();
        let UpstreamError::Validation { violations } = err else {
            panic!("expected validation error");
        };
        let fields: Vec<_> = violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["page", "pageSize", "maxPages"]);
    }

    #[test]
    fn votes_allow_larger_pages() {
        assert_eq!(Paging::first(Some(500)).validate(ListKind::Votes).unwrap(), 500);
        assert!(Paging::first(Some(500)).validate(ListKind::Speeches).is_err());
        assert_eq!(Paging::default().validate(ListKind::Speeches).unwrap(), 100);
    }

    #[test]
    fn person_query_defaults_and_casing() {
        let q = PersonQuery {
            parti: Some("s".to_string()),
            ..PersonQuery::default()
        }
        .to_query();
        assert_eq!(q.get("parti"), Some("S"));
        assert_eq!(q.get("rdlstatus"), Some("samtliga"));
        assert_eq!(q.get("sort"), Some("sorteringsnamn"));
    }

    #[test]
    fn document_query_lowercases_type() {
        let q = DocumentQuery {
            doktyp: Some("MOT".to_string()),
            rm: Some("2024/25".to_string()),
            ..DocumentQuery::default()
        }
        .to_query();
        assert_eq!(q.get("doktyp"), Some("mot"));
        assert_eq!(q.get("rm"), Some("2024/25"));
    }

    #[test]
    fn ids_are_restricted_to_safe_characters() {
        assert_eq!(validate_id("dok_id", " H901FiU1 ", 2).unwrap(), "H901FiU1");
        assert!(validate_id("dok_id", "../etc", 2).is_err());
        assert!(validate_id("dok_id", "H", 2).is_err());
    }

    #[test]
    fn page_info_reports_neighbours() {
        let page = PaginatedResult::new(vec![json!(1); 20], 120, 3, None);
        let info = PageInfo::new(&page, 50);
        assert_eq!(info.total_pages, 3);
        assert_eq!(info.next_page, None);
        assert_eq!(info.prev_page, Some(2));
        assert_eq!(info.showing, 20);
    }

    #[test]
    fn page_info_survives_the_largest_upstream_page_number() {
        let page = PaginatedResult::new(vec![json!(1)], 10, u32::MAX, Some("next".to_string()));
        let info = PageInfo::new(&page, 50);
        assert!(info.has_more);
        assert_eq!(info.next_page, None);
        assert_eq!(info.prev_page, Some(u32::MAX - 1));
    }
}
