//! Platform API collection
//!
//! This module implements the quota-aware collection loop: the HTTP transport,
//! the retrying requester, search strategy selection, search and detail
//! endpoints, and the stratified collector that ties them together.

pub mod collector;
pub mod details;
pub mod requester;
pub mod search;
pub mod strategy;
pub mod transport;

pub use collector::{CollectorSettings, RunReport, StratifiedCollector, TierOutcome};
pub use details::VideoDetailFetcher;
pub use requester::RetryingRequester;
pub use strategy::{SearchStrategySelector, SPACE_KEYWORDS};
pub use transport::{Endpoint, HttpTransport, PlatformTransport, QueryParams};

use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::storage::CheckpointStore;

/// Build a collector talking to the real platform API
///
/// # Errors
///
/// Fails if the HTTP client cannot be built or the checkpoint cannot be read
pub fn http_collector(config: &Config, store: CheckpointStore) -> Result<StratifiedCollector> {
    let transport: Arc<dyn PlatformTransport> = Arc::new(HttpTransport::new(&config.api)?);
    let requester = RetryingRequester::from_config(transport, &config.collector);
    let selector = SearchStrategySelector::new(config.sampling.keywords.clone());

    Ok(StratifiedCollector::new(config, requester, selector, store)?)
}
