//! Page model and bounded multi-page collection.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// One page of results as reported by an upstream list endpoint.
///
/// `has_more` is derived from `next_page_token`, so a page without more results never carries a
/// token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total_hits: u64,
    pub current_page: u32,
    pub has_more: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

impl<T> PaginatedResult<T> {
    #[must_use]
    pub fn new(
        items: Vec<T>,
        total_hits: u64,
        current_page: u32,
        next_page_token: Option<String>,
    ) -> Self {
        let next_page_token = next_page_token.filter(|t| !t.is_empty());
        Self {
            items,
            total_hits,
            current_page: current_page.max(1),
            has_more: next_page_token.is_some(),
            next_page_token,
        }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec::new(), 0, 1, None)
    }

    /// Drop items beyond `page_size` (some upstream endpoints ignore the requested size).
    pub fn truncate_to(&mut self, page_size: usize) {
        if self.items.len() > page_size {
            debug!(
                received = self.items.len(),
                page_size, "upstream returned more items than requested; truncating page"
            );
            self.items.truncate(page_size);
        }
    }

    #[must_use]
    pub fn map_items<U>(self, f: impl FnMut(T) -> U) -> PaginatedResult<U> {
        PaginatedResult {
            items: self.items.into_iter().map(f).collect(),
            total_hits: self.total_hits,
            current_page: self.current_page,
            has_more: self.has_more,
            next_page_token: self.next_page_token,
        }
    }
}

/// Items gathered by [`fetch_all_pages`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageCollection<T> {
    pub items: Vec<T>,
    pub pages_fetched: u32,
    /// `false` when collection stopped at `max_pages` while the upstream still had more pages.
    pub complete: bool,
}

/// Fetch pages `1..=max_pages` in order, stopping early when a page reports no more results.
///
/// `inter_page_delay` is slept between consecutive fetches (not after the last one). The first
/// failing page fails the whole collection; partial results are never returned.
///
/// # Errors
///
/// Returns the first error produced by `fetch_page`.
pub async fn fetch_all_pages<T, E, F, Fut>(
    mut fetch_page: F,
    max_pages: u32,
    inter_page_delay: Duration,
) -> Result<PageCollection<T>, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<PaginatedResult<T>, E>>,
{
    let max_pages = max_pages.max(1);
    let mut items = Vec::new();
    let mut page = 1;

    loop {
        let result = fetch_page(page).await?;
        let has_more = result.has_more;
        items.extend(result.items);

        if !has_more {
            return Ok(PageCollection {
                items,
                pages_fetched: page,
                complete: true,
            });
        }

        if page >= max_pages {
            warn!(
                max_pages,
                collected = items.len(),
                "page cap reached while upstream reports more results; result is incomplete"
            );
            return Ok(PageCollection {
                items,
                pages_fetched: page,
                complete: false,
            });
        }

        page += 1;
        if !inter_page_delay.is_zero() {
            tokio::time::sleep(inter_page_delay).await;
        }
    }
}
