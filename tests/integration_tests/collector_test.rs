//! Collection loop tests against a scripted transport

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;

use strata::config::Config;
use strata::crawler::{
    Endpoint, RetryingRequester, SearchStrategySelector, StratifiedCollector,
};
use strata::error::TransportError;
use strata::models::TierStatus;
use strata::quota::QuotaLedger;
use strata::storage::{CheckpointStore, CollectionCheckpoint};

use crate::common::{
    filling_script, search_page, test_config, video, videos_page, CallLog, ScriptedTransport,
};

struct Harness {
    collector: StratifiedCollector<ChaCha8Rng>,
    ledger: QuotaLedger,
    store: CheckpointStore,
    calls: CallLog,
}

fn harness(config: &Config, transport: ScriptedTransport) -> Harness {
    let store = CheckpointStore::new(&config.collector.output_dir).unwrap();
    let calls = transport.call_log();
    let requester = RetryingRequester::from_config(Arc::new(transport), &config.collector);
    let selector = SearchStrategySelector::with_rng(
        config.sampling.keywords.clone(),
        ChaCha8Rng::seed_from_u64(7),
    );
    let collector = StratifiedCollector::new(config, requester, selector, store.clone()).unwrap();
    let ledger = QuotaLedger::load(store.clone(), &config.quota).unwrap();

    Harness {
        collector,
        ledger,
        store,
        calls,
    }
}

fn ids(checkpoint: &CollectionCheckpoint, tier: &str) -> Vec<String> {
    checkpoint
        .tier_records(tier)
        .iter()
        .map(|r| r.video_id.clone())
        .collect()
}

fn endpoints(calls: &CallLog) -> Vec<Endpoint> {
    calls.lock().unwrap().iter().map(|(e, _)| *e).collect()
}

#[tokio::test]
async fn test_fills_tiers_in_order() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let mut h = harness(&config, ScriptedTransport::new(filling_script()));

    let report = h.collector.run(&mut h.ledger).await.unwrap();

    assert!(!report.quota_exhausted);
    assert_eq!(report.attempts, 3);
    assert_eq!(report.tiers[0].name, "top");
    assert_eq!(report.tiers[0].status, TierStatus::Satisfied);
    assert_eq!(report.tiers[0].attempts, 2);
    assert_eq!(report.tiers[1].status, TierStatus::Satisfied);
    assert_eq!(report.total_collected(), 4);

    let checkpoint = h.collector.checkpoint();
    assert_eq!(ids(checkpoint, "top"), vec!["a", "d"]);
    assert_eq!(ids(checkpoint, "base"), vec!["b", "e"]);
    assert!(!checkpoint.is_seen("c"));
    assert_eq!(checkpoint.seen_count(), 4);

    // Three searches and three detail calls
    assert_eq!(h.ledger.used(), 303);
    assert_eq!(
        endpoints(&h.calls),
        vec![
            Endpoint::Search,
            Endpoint::Videos,
            Endpoint::Search,
            Endpoint::Videos,
            Endpoint::Search,
            Endpoint::Videos,
        ]
    );
}

#[tokio::test]
async fn test_checkpoint_matches_memory() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let mut h = harness(&config, ScriptedTransport::new(filling_script()));

    h.collector.run(&mut h.ledger).await.unwrap();

    let saved: CollectionCheckpoint = h
        .store
        .load(CollectionCheckpoint::STORE_KEY)
        .unwrap()
        .unwrap();
    assert_eq!(&saved, h.collector.checkpoint());
}

#[tokio::test]
async fn test_accepted_records_respect_tier_bounds() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let script = vec![
        search_page(&["p", "q", "r", "s"]),
        videos_page(vec![
            video("p", 1_500, "PT10S"),
            video("q", 3_000, "PT10S"),
            video("r", 9_000, "PT10S"),
            video("s", 20, "PT10S"),
        ]),
        search_page(&["r", "s", "t", "p"]),
        videos_page(vec![
            video("r", 9_000, "PT10S"),
            video("s", 20, "PT10S"),
            video("t", 999, "PT10S"),
        ]),
    ];
    let mut h = harness(&config, ScriptedTransport::new(script));

    h.collector.run(&mut h.ledger).await.unwrap();
    let checkpoint = h.collector.checkpoint();

    // Top stops at its target even though r also qualifies
    assert_eq!(ids(checkpoint, "top"), vec!["p", "q"]);
    assert_eq!(ids(checkpoint, "base"), vec!["s", "t"]);
    assert!(!checkpoint.is_seen("r"));

    for tier in h.collector.tiers() {
        let records = checkpoint.tier_records(&tier.name);
        assert!(records.len() <= tier.target_count);
        for record in records {
            assert!(tier.contains(record.view_count), "{} outside {}", record.video_id, tier.name);
        }
    }
}

#[tokio::test]
async fn test_quota_exhaustion_stops_run() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(dir.path());
    config.quota.daily_limit = 250;
    config.quota.reserve = 0;
    let mut h = harness(&config, ScriptedTransport::new(filling_script()));

    let report = h.collector.run(&mut h.ledger).await.unwrap();

    assert!(report.quota_exhausted);
    assert_eq!(report.tiers[0].status, TierStatus::Satisfied);
    assert_eq!(report.tiers[1].status, TierStatus::Abandoned);
    assert_eq!(report.tiers[1].collected, 0);

    // The third search was refused before reaching the transport
    assert_eq!(h.calls.lock().unwrap().len(), 4);
    assert_eq!(h.ledger.used(), 202);
}

#[tokio::test]
async fn test_later_tiers_untouched_after_quota_exhaustion() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(dir.path());
    config.quota.daily_limit = 50;
    config.quota.reserve = 0;
    let mut h = harness(&config, ScriptedTransport::new(filling_script()));

    let report = h.collector.run(&mut h.ledger).await.unwrap();

    assert!(report.quota_exhausted);
    assert_eq!(report.tiers[0].attempts, 1);
    assert_eq!(report.tiers[1].attempts, 0);
    assert!(h.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_request_moves_to_next_attempt() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let mut script: Vec<Result<Value, TransportError>> = vec![
        Err(TransportError::Status(500)),
        Err(TransportError::Status(503)),
        Err(TransportError::Timeout),
    ];
    script.extend(filling_script());
    let mut h = harness(&config, ScriptedTransport::new(script));

    let report = h.collector.run(&mut h.ledger).await.unwrap();

    assert_eq!(report.tiers[0].status, TierStatus::Satisfied);
    assert_eq!(report.tiers[0].attempts, 3);
    assert_eq!(report.tiers[1].status, TierStatus::Satisfied);
    // Failed attempts cost nothing
    assert_eq!(h.ledger.used(), 303);
    assert_eq!(h.calls.lock().unwrap().len(), 9);
}

#[tokio::test]
async fn test_transient_failure_then_success_debits_once() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let mut script: Vec<Result<Value, TransportError>> = vec![Err(TransportError::Timeout)];
    script.extend(filling_script());
    let mut h = harness(&config, ScriptedTransport::new(script));

    let report = h.collector.run(&mut h.ledger).await.unwrap();

    assert_eq!(report.tiers[0].attempts, 2);
    assert_eq!(h.ledger.used(), 303);
    assert_eq!(h.calls.lock().unwrap().len(), 7);
}

#[tokio::test]
async fn test_attempt_budget_abandons_tiers() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(dir.path());
    config.collector.max_attempts_per_tier = 3;
    let mut h = harness(&config, ScriptedTransport::new(Vec::new()));

    let report = h.collector.run(&mut h.ledger).await.unwrap();

    assert!(!report.quota_exhausted);
    assert_eq!(report.attempts, 6);
    for tier in &report.tiers {
        assert_eq!(tier.status, TierStatus::Abandoned);
        assert_eq!(tier.attempts, 3);
    }
    // Empty searches never reach the detail endpoint
    assert!(endpoints(&h.calls).iter().all(|e| *e == Endpoint::Search));
    assert_eq!(h.ledger.used(), 600);
}

#[tokio::test]
async fn test_seen_candidates_skip_detail_call() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(dir.path());
    config.collector.max_attempts_per_tier = 2;
    let script = vec![
        search_page(&["a"]),
        videos_page(vec![video("a", 5_000, "PT30S")]),
        search_page(&["a"]),
    ];
    let mut h = harness(&config, ScriptedTransport::new(script));

    let report = h.collector.run(&mut h.ledger).await.unwrap();

    assert_eq!(report.tiers[0].collected, 1);
    assert_eq!(report.tiers[0].status, TierStatus::Abandoned);
    assert_eq!(
        &endpoints(&h.calls)[..3],
        &[Endpoint::Search, Endpoint::Videos, Endpoint::Search]
    );
}

#[tokio::test]
async fn test_detail_batch_capped_per_attempt() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(dir.path());
    config.collector.max_attempts_per_tier = 1;
    let candidates: Vec<String> = (0..30).map(|i| format!("v{i}")).collect();
    let refs: Vec<&str> = candidates.iter().map(String::as_str).collect();
    let mut h = harness(&config, ScriptedTransport::new(vec![search_page(&refs)]));

    h.collector.run(&mut h.ledger).await.unwrap();

    let calls = h.calls.lock().unwrap();
    let (endpoint, params) = &calls[1];
    assert_eq!(*endpoint, Endpoint::Videos);
    let id_param = params.iter().find(|(k, _)| *k == "id").map(|(_, v)| v.clone()).unwrap();
    assert_eq!(id_param.split(',').count(), 20);
    assert!(id_param.starts_with("v0,v1,"));
}

#[tokio::test]
async fn test_satisfied_tiers_skipped_on_rerun() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());

    let mut first = harness(&config, ScriptedTransport::new(filling_script()));
    first.collector.run(&mut first.ledger).await.unwrap();

    let mut second = harness(&config, ScriptedTransport::new(Vec::new()));
    let report = second.collector.run(&mut second.ledger).await.unwrap();

    assert_eq!(report.attempts, 0);
    assert!(report.tiers.iter().all(|t| t.status == TierStatus::Satisfied));
    assert!(second.calls.lock().unwrap().is_empty());
    assert_eq!(second.ledger.used(), 303);
}

#[tokio::test]
async fn test_search_params_never_carry_key() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let mut h = harness(&config, ScriptedTransport::new(filling_script()));

    h.collector.run(&mut h.ledger).await.unwrap();

    for (_, params) in h.calls.lock().unwrap().iter() {
        assert!(params.iter().all(|(k, v)| *k != "key" && v != "test-key"));
    }
}
