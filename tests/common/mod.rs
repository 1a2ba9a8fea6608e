//! Common test utilities

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

use strata::config::Config;
use strata::crawler::{Endpoint, PlatformTransport, QueryParams};
use strata::error::TransportError;
use strata::models::{Tier, TierBias};

pub type Script = Arc<Mutex<VecDeque<Result<Value, TransportError>>>>;

/// Endpoint and parameters of every call, in order
pub type CallLog = Arc<Mutex<Vec<(Endpoint, QueryParams)>>>;

/// Transport that replays a shared script of responses
///
/// Once the script runs dry every call returns an empty page. With `hang_at`
/// set, the n-th call (1-based) never completes and consumes nothing.
pub struct ScriptedTransport {
    script: Script,
    calls: CallLog,
    hang_at: Option<usize>,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<Result<Value, TransportError>>) -> Self {
        Self::sharing(Arc::new(Mutex::new(responses.into())))
    }

    /// Transport reading from an existing script
    pub fn sharing(script: Script) -> Self {
        Self {
            script,
            calls: Arc::new(Mutex::new(Vec::new())),
            hang_at: None,
        }
    }

    pub fn hang_at(mut self, call: usize) -> Self {
        self.hang_at = Some(call);
        self
    }

    pub fn script(&self) -> Script {
        Arc::clone(&self.script)
    }

    /// Handle on the call log that survives moving the transport
    pub fn call_log(&self) -> CallLog {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl PlatformTransport for ScriptedTransport {
    async fn get(&self, endpoint: Endpoint, params: &QueryParams) -> Result<Value, TransportError> {
        let call_number = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((endpoint, params.clone()));
            calls.len()
        };

        if self.hang_at == Some(call_number) {
            std::future::pending::<()>().await;
        }

        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(json!({ "items": [] })))
    }
}

/// Search response listing `ids`
pub fn search_page(ids: &[&str]) -> Result<Value, TransportError> {
    let items: Vec<Value> = ids
        .iter()
        .map(|id| json!({ "id": { "kind": "youtube#video", "videoId": id } }))
        .collect();
    Ok(json!({ "items": items, "pageInfo": { "totalResults": ids.len() } }))
}

/// Detail item with a fixed title and no publish time
pub fn video(id: &str, views: u64, duration: &str) -> Value {
    json!({
        "id": id,
        "snippet": {
            "title": format!("Video {id}?"),
            "description": "",
            "channelTitle": "Orbit",
            "tags": ["space"]
        },
        "statistics": { "viewCount": views.to_string(), "likeCount": "1", "commentCount": "0" },
        "contentDetails": { "duration": duration }
    })
}

/// Detail response wrapping `items`
pub fn videos_page(items: Vec<Value>) -> Result<Value, TransportError> {
    Ok(json!({ "items": items }))
}

/// Two small tiers: `top` is `[1000, inf)`, `base` is `[10, 1000)`, two records each
pub fn small_tiers() -> Vec<Tier> {
    vec![
        Tier::new("top", 1_000, None, 2, TierBias::Peak),
        Tier::new("base", 10, Some(1_000), 2, TierBias::Recency),
    ]
}

/// Fast configuration writing into `dir`
pub fn test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.api.api_key = "test-key".to_string();
    config.collector.output_dir = dir.to_path_buf();
    config.collector.courtesy_delay_ms = 0;
    config.collector.backoff_base_ms = 1;
    config.collector.max_attempts_per_tier = 5;
    config.sampling.tiers = small_tiers();
    config
}

/// Script that fills both small tiers in six calls
///
/// 1. search a, b, c
/// 2. details: a kept for top, b out of range, c too long
/// 3. search a, d (a already seen)
/// 4. details: d fills top
/// 5. search b, e, a
/// 6. details: b and e fill base
pub fn filling_script() -> Vec<Result<Value, TransportError>> {
    vec![
        search_page(&["a", "b", "c"]),
        videos_page(vec![
            video("a", 5_000, "PT30S"),
            video("b", 50, "PT20S"),
            video("c", 8_000, "PT1M10S"),
        ]),
        search_page(&["a", "d"]),
        videos_page(vec![video("d", 2_000, "PT15S")]),
        search_page(&["b", "e", "a"]),
        videos_page(vec![video("b", 50, "PT20S"), video("e", 20, "PT5S")]),
    ]
}
