//! Crash and resume behaviour
//!
//! A run that dies right after a checkpoint write must, once restarted against
//! the same response script, end with exactly the records an uninterrupted run
//! collects.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use chrono::NaiveDate;
use strata::analytics::finish_run;
use strata::config::Config;
use strata::crawler::{RetryingRequester, SearchStrategySelector, StratifiedCollector};
use strata::error::CollectError;
use strata::models::TierStatus;
use strata::quota::QuotaLedger;
use strata::storage::{CheckpointStore, CollectionCheckpoint};

use crate::common::{filling_script, test_config, ScriptedTransport};

fn collector(
    config: &Config,
    store: &CheckpointStore,
    transport: ScriptedTransport,
    seed: u64,
) -> StratifiedCollector<ChaCha8Rng> {
    let requester = RetryingRequester::from_config(Arc::new(transport), &config.collector);
    let selector = SearchStrategySelector::with_rng(
        config.sampling.keywords.clone(),
        ChaCha8Rng::seed_from_u64(seed),
    );
    StratifiedCollector::new(config, requester, selector, store.clone()).unwrap()
}

async fn uninterrupted(config: &Config) -> CollectionCheckpoint {
    let store = CheckpointStore::new(&config.collector.output_dir).unwrap();
    let mut ledger = QuotaLedger::load(store.clone(), &config.quota).unwrap();
    let mut collector = collector(config, &store, ScriptedTransport::new(filling_script()), 1);
    collector.run(&mut ledger).await.unwrap();
    collector.checkpoint().clone()
}

#[tokio::test]
async fn test_resume_after_crash_matches_uninterrupted_run() {
    let reference_dir = TempDir::new().unwrap();
    let expected = uninterrupted(&test_config(reference_dir.path())).await;

    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let store = CheckpointStore::new(dir.path()).unwrap();

    // The third call (second search) hangs, right after the first checkpoint write
    let crashing = ScriptedTransport::new(filling_script()).hang_at(3);
    let script = crashing.script();
    {
        let mut ledger = QuotaLedger::load(store.clone(), &config.quota).unwrap();
        let mut first = collector(&config, &store, crashing, 1);
        let outcome =
            tokio::time::timeout(Duration::from_millis(500), first.run(&mut ledger)).await;
        assert!(outcome.is_err(), "run should have been cut off");
    }

    let partial: CollectionCheckpoint = store
        .load(CollectionCheckpoint::STORE_KEY)
        .unwrap()
        .unwrap();
    assert_eq!(partial.tier_count("top"), 1);
    assert_eq!(partial.seen_count(), 1);

    // Restart with a different seed; the remaining script is unchanged
    let mut ledger = QuotaLedger::load(store.clone(), &config.quota).unwrap();
    let mut resumed = collector(&config, &store, ScriptedTransport::sharing(script), 99);
    let report = resumed.run(&mut ledger).await.unwrap();

    assert!(report.tiers.iter().all(|t| t.status == TierStatus::Satisfied));
    assert_eq!(resumed.checkpoint(), &expected);
    // Quota spent before the crash is not spent again
    assert_eq!(ledger.used(), 303);
}

#[tokio::test]
async fn test_seen_set_only_grows_across_runs() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let store = CheckpointStore::new(dir.path()).unwrap();

    let transport = ScriptedTransport::new(filling_script()).hang_at(5);
    let script = transport.script();
    {
        let mut ledger = QuotaLedger::load(store.clone(), &config.quota).unwrap();
        let mut first = collector(&config, &store, transport, 3);
        let _ = tokio::time::timeout(Duration::from_millis(500), first.run(&mut ledger)).await;
    }
    let before: CollectionCheckpoint = store
        .load(CollectionCheckpoint::STORE_KEY)
        .unwrap()
        .unwrap();

    let mut ledger = QuotaLedger::load(store.clone(), &config.quota).unwrap();
    let mut resumed = collector(&config, &store, ScriptedTransport::sharing(script), 4);
    resumed.run(&mut ledger).await.unwrap();
    let after = resumed.checkpoint();

    assert!(before.seen_ids.is_subset(&after.seen_ids));
    assert!(after.seen_count() > before.seen_count());
    assert_eq!(after.tier_count("top"), 2);
    assert_eq!(after.tier_count("base"), 2);
}

#[tokio::test]
async fn test_storage_failure_still_exports_checkpointed_progress() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let store = CheckpointStore::new(dir.path()).unwrap();

    // First run checkpoints `a`, then hangs on the second search
    let transport = ScriptedTransport::new(filling_script()).hang_at(3);
    let script = transport.script();
    {
        let mut ledger = QuotaLedger::load(store.clone(), &config.quota).unwrap();
        let mut first = collector(&config, &store, transport, 5);
        let _ = tokio::time::timeout(Duration::from_millis(500), first.run(&mut ledger)).await;
    }

    // A directory squatting on the temp path makes the next checkpoint write fail
    let temp_path = store
        .path_for(CollectionCheckpoint::STORE_KEY)
        .with_extension("json.tmp");
    std::fs::create_dir(&temp_path).unwrap();

    let mut ledger = QuotaLedger::load(store.clone(), &config.quota).unwrap();
    let mut resumed = collector(&config, &store, ScriptedTransport::sharing(script), 6);
    let err = resumed.run(&mut ledger).await.unwrap_err();
    assert!(matches!(err, CollectError::Storage(_)));

    let date = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
    let output = finish_run(&store, &config.sampling.tiers, dir.path(), date)
        .unwrap()
        .expect("checkpointed progress should be exported");

    let csv = std::fs::read_to_string(&output.csv_path).unwrap();
    let rows: Vec<&str> = csv.lines().skip(1).collect();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].starts_with("a,"));
    assert!(output.summary.contains("Total videos collected: 1"));
    assert!(output.summary.contains("top: 1/2"));
}
