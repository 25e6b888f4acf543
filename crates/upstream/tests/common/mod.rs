#![allow(dead_code)]

use opendata_resilience::rate_limit::RateLimit;
use opendata_upstream::GatewayConfig;
use serde_json::{Value, json};

pub use opendata_test_support::{MockUpstream, list_envelope};

/// Gateway config pointed at mock upstreams, with a generous budget and no inter-page pause.
pub fn config_for(riksdagen_base: &str, g0v_base: &str) -> GatewayConfig {
    let mut cfg = GatewayConfig::default();
    cfg.riksdagen.base_url = riksdagen_base.to_string();
    cfg.riksdagen.rate_limit = RateLimit::per_minute(1_000);
    cfg.g0v.base_url = g0v_base.to_string();
    cfg.g0v.rate_limit = RateLimit::per_minute(1_000);
    cfg.pagination.inter_page_delay_ms = 0;
    cfg
}

/// `n` numbered documents starting at `first`.
pub fn documents(first: usize, n: usize) -> Vec<Value> {
    (first..first + n)
        .map(|i| {
            json!({
                "dok_id": format!("H{i:04}"),
                "titel": format!("Dokument {i}"),
                "dokument_url_html": format!("//data.riksdagen.se/dokument/H{i:04}.html"),
            })
        })
        .collect()
}
