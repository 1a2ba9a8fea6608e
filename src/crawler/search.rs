//! Keyword search against the platform
//!
//! One search returns a single page of candidate video ids. Only the first page
//! is read: breadth across keywords and windows matters more than depth.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::info;

use crate::crawler::requester::RetryingRequester;
use crate::crawler::strategy::window_bounds;
use crate::crawler::transport::{Endpoint, QueryParams};
use crate::models::SearchAttempt;
use crate::quota::QuotaLedger;
use crate::utils::error::CollectError;

/// Candidate ids from one search page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResults {
    /// Ids in response order
    pub video_ids: Vec<String>,

    /// Total hits reported by the platform
    pub total_results: u64,
}

/// Build the query for one search attempt
pub fn search_params(
    attempt: &SearchAttempt,
    max_results: u32,
    language: &str,
    now: DateTime<Utc>,
) -> QueryParams {
    let (published_after, published_before) = window_bounds(attempt.window, now);
    vec![
        ("part", "id".to_string()),
        ("q", attempt.keyword.clone()),
        ("type", "video".to_string()),
        ("videoDuration", "short".to_string()),
        ("maxResults", max_results.to_string()),
        ("publishedAfter", published_after),
        ("publishedBefore", published_before),
        ("order", attempt.order.as_str().to_string()),
        ("relevanceLanguage", language.to_string()),
    ]
}

/// Pull ids and the hit count out of a search response
///
/// Items without an `id.videoId` (channels, playlists) are skipped.
pub fn parse_search_response(body: &Value) -> Result<SearchResults, CollectError> {
    let items = match body.get("items") {
        Some(Value::Array(items)) => items.as_slice(),
        Some(_) => {
            return Err(CollectError::InvalidResponse {
                endpoint: Endpoint::Search.path(),
                reason: "`items` is not an array".to_string(),
            })
        }
        None => &[],
    };

    let video_ids = items
        .iter()
        .filter_map(|item| item.pointer("/id/videoId").and_then(Value::as_str))
        .map(str::to_string)
        .collect();

    let total_results = body
        .pointer("/pageInfo/totalResults")
        .and_then(Value::as_u64)
        .unwrap_or(0);

    Ok(SearchResults {
        video_ids,
        total_results,
    })
}

/// Run one search and return its candidate ids
pub async fn search_videos(
    requester: &RetryingRequester,
    ledger: &mut QuotaLedger,
    attempt: &SearchAttempt,
    max_results: u32,
    language: &str,
    cost: u64,
) -> Result<SearchResults, CollectError> {
    let params = search_params(attempt, max_results, language, Utc::now());
    let body = requester
        .call(ledger, Endpoint::Search, &params, cost)
        .await?;
    let results = parse_search_response(&body)?;

    info!(
        keyword = %attempt.keyword,
        found = results.video_ids.len(),
        total_available = results.total_results,
        "Search completed"
    );
    Ok(results)
}
