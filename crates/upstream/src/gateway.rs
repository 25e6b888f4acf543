use crate::config::GatewayConfig;
use crate::error::Result;
use crate::g0v::G0vClient;
use crate::http::UpstreamHttp;
use crate::riksdagen::RiksdagenClient;
use opendata_resilience::error::{Classify, ErrorRecord};
use opendata_resilience::rate_limit::RateLimiter;
use opendata_resilience::safety::{SanitizeOptions, SanitizedResult, sanitize};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Composition root: one rate limiter per origin, one client per upstream.
#[derive(Clone)]
pub struct Gateway {
    riksdagen: RiksdagenClient,
    g0v: G0vClient,
    safety: SanitizeOptions,
}

impl Gateway {
    /// # Errors
    ///
    /// Returns [`crate::UpstreamError::Config`] for invalid configuration.
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        config.validate()?;
        let http = UpstreamHttp::new(&config.http)?;
        let riksdagen_limiter = Arc::new(RateLimiter::new(
            "riksdagen",
            config.riksdagen.rate_limit,
        ));
        let g0v_limiter = Arc::new(RateLimiter::new("g0v", config.g0v.rate_limit));

        Ok(Self {
            riksdagen: RiksdagenClient::new(config, http.clone(), riksdagen_limiter),
            g0v: G0vClient::new(config, http, g0v_limiter),
            safety: config.safety.options(),
        })
    }

    #[must_use]
    pub fn riksdagen(&self) -> &RiksdagenClient {
        &self.riksdagen
    }

    #[must_use]
    pub fn g0v(&self) -> &G0vClient {
        &self.g0v
    }

    /// Turn an operation outcome into what the caller receives: a size-bounded result or a
    /// uniform error record attributed to `tool`.
    ///
    /// # Errors
    ///
    /// Returns the [`ErrorRecord`] for a failed operation or an oversize result.
    pub fn respond<T, E>(
        &self,
        tool: &str,
        outcome: std::result::Result<T, E>,
    ) -> std::result::Result<SanitizedResult, ErrorRecord>
    where
        T: Serialize,
        E: Classify,
    {
        let value = match outcome {
            Ok(value) => value,
            Err(e) => return Err(self.reject(tool, &e)),
        };
        let value = serde_json::to_value(value).map_err(|e| {
            warn!(tool, error = %e, "result did not serialize");
            ErrorRecord::internal(format!("result could not be serialized: {e}"), Some(tool))
        })?;

        match sanitize(value, self.safety) {
            Ok(result) => {
                info!(
                    tool,
                    truncated = result.truncated,
                    original_count = result.original_count,
                    "operation completed"
                );
                Ok(result)
            }
            Err(e) => Err(self.reject(tool, &e)),
        }
    }

    fn reject<E: Classify>(&self, tool: &str, err: &E) -> ErrorRecord {
        let record = ErrorRecord::from_error(err, Some(tool));
        warn!(tool, code = record.code, error = %err, "operation failed");
        record
    }
}
