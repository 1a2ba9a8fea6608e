use anyhow::{Context, Result};
use chrono::Local;

use strata::analytics::finish_run;
use strata::config::Config;
use strata::crawler::http_collector;
use strata::metrics;
use strata::quota::QuotaLedger;
use strata::storage::CheckpointStore;
use strata::utils::format_thousands;

/// Metrics textfile written next to the dataset
const METRICS_FILE: &str = "strata.prom";

pub async fn run(config: Config) -> Result<()> {
    config.validate()?;
    config.require_api_key()?;

    if let Err(e) = metrics::init_metrics() {
        tracing::warn!(error = %e, "Metrics registration failed, continuing without metrics");
    }

    let output_dir = config.collector.output_dir.clone();
    let store = CheckpointStore::new(&output_dir).with_context(|| {
        format!("Failed to open output directory: {}", output_dir.display())
    })?;
    let mut ledger = QuotaLedger::load(store.clone(), &config.quota)?;

    let target_total: usize = config.sampling.tiers.iter().map(|t| t.target_count).sum();
    println!("Short-form Space Video Pattern Collector");
    println!("========================================");
    println!("Daily quota limit: {}", format_thousands(ledger.daily_limit()));
    println!("Current quota used: {}", format_thousands(ledger.used()));
    println!("Target distribution: {target_total} total videos");
    println!();

    let mut collector = http_collector(&config, store.clone())?;

    let outcome = tokio::select! {
        result = collector.run(&mut ledger) => Some(result),
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                tracing::error!("Failed to wait for Ctrl+C: {}", e);
            }
            println!("\nInterrupted, keeping checkpointed progress.");
            None
        }
    };

    // Report checkpointed progress before surfacing a run failure
    let failure = match outcome {
        Some(Ok(report)) => {
            for tier in &report.tiers {
                println!(
                    "  {:<14} {:>10}  {}/{} ({} attempts)",
                    tier.name,
                    tier.status.as_str(),
                    tier.collected,
                    tier.target,
                    tier.attempts
                );
            }
            if report.quota_exhausted {
                println!("\nQuota limit reached. Run again tomorrow to continue.");
            }
            None
        }
        Some(Err(e)) => {
            tracing::error!(error = %e, "Collection stopped");
            println!("\nCollection stopped: {e}");
            Some(e)
        }
        None => None,
    };

    match finish_run(
        &store,
        &config.sampling.tiers,
        &output_dir,
        Local::now().date_naive(),
    )? {
        Some(output) => {
            println!();
            print!("{}", output.summary);
            println!("\nOutput saved to: {}", output.csv_path.display());
        }
        None => println!("\nNo videos collected yet."),
    }

    println!(
        "Quota used today: {}/{} ({:.1}%)",
        format_thousands(ledger.used()),
        format_thousands(ledger.daily_limit()),
        ledger.usage_percent()
    );

    let metrics_path = output_dir.join(METRICS_FILE);
    if let Err(e) = metrics::write_textfile(&metrics_path) {
        tracing::warn!(path = %metrics_path.display(), error = %e, "Failed to write metrics");
    }

    match failure {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}
