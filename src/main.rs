use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use strata::config::Config;

mod commands;

#[derive(Parser)]
#[command(
    name = "strata",
    version,
    about = "Stratified, quota-bounded collector of short-form space video metadata",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); defaults to the configured format
    #[arg(long, global = true)]
    log_format: Option<String>,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect videos until every tier is full or the daily quota runs out
    Run {
        /// Override the output directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Override the attempt budget per tier
        #[arg(long)]
        max_attempts: Option<usize>,
    },

    /// Show quota usage and per-tier progress without calling the API
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };

    // Initialize tracing/logging
    let log_format = cli
        .log_format
        .clone()
        .unwrap_or_else(|| config.logging.format.clone());
    setup_tracing(&log_format, &config.logging.level, cli.verbose)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "strata starting");

    match cli.command {
        Commands::Run {
            output_dir,
            max_attempts,
        } => {
            if let Some(dir) = output_dir {
                config.collector.output_dir = dir;
            }
            if let Some(attempts) = max_attempts {
                config.collector.max_attempts_per_tier = attempts;
            }
            tracing::info!(
                output_dir = %config.collector.output_dir.display(),
                max_attempts = config.collector.max_attempts_per_tier,
                "Starting run command"
            );
            commands::run(config).await?;
        }

        Commands::Status => {
            commands::status(config)?;
        }
    }

    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("strata=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("strata={level},warn")))
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
