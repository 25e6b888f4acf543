//! Upstream clients for the Riksdagen records API and the g0v.se government-documents mirror.
//!
//! Both clients share one HTTP stack and route every call through the resilience layer in
//! `opendata-resilience`. [`Gateway`] wires them together from a [`GatewayConfig`].

pub mod config;
pub mod error;
pub mod g0v;
pub mod gateway;
pub mod http;
pub mod query;
pub mod reports;
pub mod riksdagen;

pub use config::GatewayConfig;
pub use error::{Result, UpstreamError};
pub use gateway::Gateway;
