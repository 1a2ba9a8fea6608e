//! Quota-aware request wrapper
//!
//! Every platform call goes through [`RetryingRequester::call`]:
//!
//! 1. Refuse immediately with `QuotaExceeded` if the ledger cannot afford the
//!    cost; no network attempt is made.
//! 2. Try the transport up to `max_attempts` times with exponential backoff.
//! 3. Debit the cost once, on the first success only.
//! 4. Sleep the courtesy delay before handing the response back.

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::CollectorConfig;
use crate::crawler::transport::{Endpoint, PlatformTransport, QueryParams};
use crate::metrics;
use crate::quota::QuotaLedger;
use crate::utils::error::CollectError;
use crate::utils::redact_params;
use crate::utils::retry::{with_retry, RetryConfig};

/// Wraps a transport with retries, quota accounting and pacing
pub struct RetryingRequester {
    transport: Arc<dyn PlatformTransport>,
    retry: RetryConfig,
    courtesy_delay: Duration,
}

impl RetryingRequester {
    pub fn new(
        transport: Arc<dyn PlatformTransport>,
        retry: RetryConfig,
        courtesy_delay: Duration,
    ) -> Self {
        Self {
            transport,
            retry,
            courtesy_delay,
        }
    }

    /// Build from collector configuration
    pub fn from_config(transport: Arc<dyn PlatformTransport>, config: &CollectorConfig) -> Self {
        let retry = RetryConfig {
            max_attempts: config.retry_attempts,
            base_delay_ms: config.backoff_base_ms,
            ..RetryConfig::default()
        };
        Self::new(
            transport,
            retry,
            Duration::from_millis(config.courtesy_delay_ms),
        )
    }

    /// Issue one logical request costing `cost` quota units
    ///
    /// # Errors
    ///
    /// - `QuotaExceeded` when the ledger cannot afford `cost` (no request sent)
    /// - `RequestFailed` when every attempt failed
    /// - `Storage` when the debited usage could not be persisted
    pub async fn call(
        &self,
        ledger: &mut QuotaLedger,
        endpoint: Endpoint,
        params: &QueryParams,
        cost: u64,
    ) -> Result<Value, CollectError> {
        if !ledger.can_afford(cost) {
            metrics::record_api_request(endpoint.path(), "rejected");
            warn!(
                endpoint = %endpoint,
                cost = cost,
                used = ledger.used(),
                "Daily quota would be exceeded"
            );
            return Err(ledger.exceeded(cost));
        }

        debug!(endpoint = %endpoint, params = %redact_params(params), "Calling platform API");

        let transport = &self.transport;
        let result = with_retry(&self.retry, || async move {
            let outcome = transport.get(endpoint, params).await;
            let label = if outcome.is_ok() { "success" } else { "error" };
            metrics::record_api_request(endpoint.path(), label);
            outcome
        })
        .await;

        let response = result.map_err(|exhausted| CollectError::RequestFailed {
            endpoint: endpoint.path(),
            attempts: exhausted.attempts,
            source: exhausted.last_error,
        })?;

        ledger.debit(cost)?;
        metrics::record_quota_spent(cost);

        if !self.courtesy_delay.is_zero() {
            tokio::time::sleep(self.courtesy_delay).await;
        }

        Ok(response)
    }
}
