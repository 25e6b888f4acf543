//! Upstream-agnostic building blocks for the open-data clients: token-bucket rate limiting,
//! list-envelope normalization, multi-page collection, TTL caching and size-bounded results.
//!
//! Nothing here knows a Riksdagen or g0v.se URL; `opendata-upstream` supplies those.

pub mod cache;
pub mod error;
pub mod normalize;
pub mod pagination;
pub mod rate_limit;
pub mod safety;
