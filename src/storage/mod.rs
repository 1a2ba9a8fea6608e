//! Durable state and dataset output
//!
//! This module handles persistence of quota and collection progress as JSON
//! checkpoints, and the final CSV export of accepted records.

pub mod checkpoint;
pub mod export;

pub use checkpoint::{CheckpointStore, CollectionCheckpoint};
pub use export::CsvExporter;
