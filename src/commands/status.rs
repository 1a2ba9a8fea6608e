use anyhow::Result;

use strata::config::Config;
use strata::quota::QuotaLedger;
use strata::storage::{CheckpointStore, CollectionCheckpoint};
use strata::utils::{format_thousands, truncate_text};

/// Print quota usage and checkpointed progress without touching the API
pub fn status(config: Config) -> Result<()> {
    let output_dir = &config.collector.output_dir;
    if !output_dir.exists() {
        println!("Output directory not found: {}", output_dir.display());
        println!("Run a collection first to create it.");
        return Ok(());
    }

    let store = CheckpointStore::new(output_dir)?;
    let ledger = QuotaLedger::load(store.clone(), &config.quota)?;
    let checkpoint = store
        .load::<CollectionCheckpoint>(CollectionCheckpoint::STORE_KEY)?
        .unwrap_or_default();

    println!("Collection Status");
    println!("=================");
    println!("Output: {}", output_dir.display());
    println!();
    println!(
        "Quota: {}/{} used today ({:.1}%), reserve {}",
        format_thousands(ledger.used()),
        format_thousands(ledger.daily_limit()),
        ledger.usage_percent(),
        format_thousands(config.quota.reserve)
    );
    println!();

    println!("Tiers:");
    for tier in &config.sampling.tiers {
        let collected = checkpoint.tier_count(&tier.name);
        let pct = if tier.target_count > 0 {
            collected as f64 / tier.target_count as f64 * 100.0
        } else {
            100.0
        };
        println!(
            "  {:<14} {:>10}  {:>5}/{:<5} ({pct:.1}%)",
            tier.name,
            tier.status_for(collected).as_str(),
            collected,
            tier.target_count
        );
        if let Some(last) = checkpoint.tier_records(&tier.name).last() {
            println!("      last: {}", truncate_text(&last.title, 60));
        }
    }
    println!();
    println!("Total records: {}", checkpoint.total_records());
    println!("Seen ids: {}", checkpoint.seen_count());

    Ok(())
}
