//! strata - Stratified short-form video metadata collector
//!
//! Collects a view-count-stratified sample of short-form space videos from a
//! quota-limited platform data API and exports per-video feature rows for
//! title and engagement pattern analysis.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`quota`] - Persistent daily quota ledger
//! - [`crawler`] - Transport, retrying requester, search strategy and the collection loop
//! - [`parser`] - Feature extraction from raw platform records
//! - [`models`] - Core data structures and types
//! - [`storage`] - Checkpoint store and CSV export
//! - [`analytics`] - End-of-run summary statistics
//! - [`metrics`] - Prometheus counters
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use strata::config::Config;
//! use strata::crawler::http_collector;
//! use strata::quota::QuotaLedger;
//! use strata::storage::CheckpointStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let store = CheckpointStore::new(&config.collector.output_dir)?;
//!     let mut ledger = QuotaLedger::load(store.clone(), &config.quota)?;
//!     let mut collector = http_collector(&config, store)?;
//!     let report = collector.run(&mut ledger).await?;
//!     println!("collected {}", report.total_collected());
//!     Ok(())
//! }
//! ```

pub mod analytics;
pub mod config;
pub mod crawler;
pub mod error;
pub mod metrics;
pub mod models;
pub mod parser;
pub mod quota;
pub mod storage;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::analytics::RunSummary;
    pub use crate::config::Config;
    pub use crate::crawler::{RunReport, StratifiedCollector};
    pub use crate::error::{CollectError, Error, Result};
    pub use crate::models::{FeatureRecord, Tier, TierBias, TierStatus};
    pub use crate::quota::QuotaLedger;
    pub use crate::storage::{CheckpointStore, CollectionCheckpoint, CsvExporter};
}

// Direct re-exports for convenience
pub use models::{FeatureRecord, Tier, TierStatus};
