//! Batched video detail lookup

use serde_json::Value;
use tracing::debug;

use crate::crawler::requester::RetryingRequester;
use crate::crawler::transport::{Endpoint, QueryParams};
use crate::models::RawVideo;
use crate::quota::QuotaLedger;
use crate::utils::error::CollectError;

/// Resource parts requested for every video
const DETAIL_PARTS: &str = "snippet,statistics,contentDetails";

/// Fetches snippet, statistics and content details for candidate ids
#[derive(Debug, Clone)]
pub struct VideoDetailFetcher {
    batch_size: usize,
    cost: u64,
}

impl VideoDetailFetcher {
    /// `batch_size` ids per call, each call costing `cost` units
    pub fn new(batch_size: usize, cost: u64) -> Self {
        Self {
            batch_size: batch_size.max(1),
            cost,
        }
    }

    /// Fetch details for `ids`, one request per batch
    ///
    /// Results keep request order. The first failing batch aborts the whole
    /// fetch and partial results are dropped.
    pub async fn fetch(
        &self,
        requester: &RetryingRequester,
        ledger: &mut QuotaLedger,
        ids: &[String],
    ) -> Result<Vec<RawVideo>, CollectError> {
        let mut videos = Vec::with_capacity(ids.len());

        for batch in ids.chunks(self.batch_size) {
            let params: QueryParams = vec![
                ("part", DETAIL_PARTS.to_string()),
                ("id", batch.join(",")),
            ];
            let body = requester
                .call(ledger, Endpoint::Videos, &params, self.cost)
                .await?;
            let parsed = parse_detail_response(body)?;
            debug!(requested = batch.len(), returned = parsed.len(), "Detail batch fetched");
            videos.extend(parsed);
        }

        Ok(videos)
    }
}

/// Decode the `items` array of a detail response
pub fn parse_detail_response(mut body: Value) -> Result<Vec<RawVideo>, CollectError> {
    let items = match body.get_mut("items") {
        Some(items) => items.take(),
        None => return Ok(Vec::new()),
    };

    serde_json::from_value(items).map_err(|e| CollectError::InvalidResponse {
        endpoint: Endpoint::Videos.path(),
        reason: e.to_string(),
    })
}
