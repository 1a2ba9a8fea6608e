//! Checkpoint system for resumable collection
//!
//! This module provides the durable key-value store behind both the quota
//! ledger and the collection progress, so an interrupted run resumes from the
//! last saved state.
//!
//! # Features
//!
//! - Atomic writes (temp file + rename)
//! - Per-tier accumulated records plus the seen-id set
//! - JSON-based state serialization
//!
//! # Example
//!
//! ```no_run
//! use strata::storage::checkpoint::{CheckpointStore, CollectionCheckpoint};
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = CheckpointStore::new(Path::new("./space_video_patterns"))?;
//!
//! let checkpoint = CollectionCheckpoint::default();
//! store.save(CollectionCheckpoint::STORE_KEY, &checkpoint)?;
//!
//! if let Some(restored) = store.load::<CollectionCheckpoint>(CollectionCheckpoint::STORE_KEY)? {
//!     println!("Resuming with {} seen ids", restored.seen_count());
//! }
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::models::FeatureRecord;
use crate::utils::error::StorageError;

// ============================================================================
// Collection State
// ============================================================================

/// Accumulated progress of a stratified collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionCheckpoint {
    /// Accepted records keyed by tier name
    #[serde(default)]
    pub collected: BTreeMap<String, Vec<FeatureRecord>>,

    /// Video ids already accepted, in this run or a previous one
    #[serde(default)]
    pub seen_ids: BTreeSet<String>,
}

impl CollectionCheckpoint {
    /// Store key for collection progress
    pub const STORE_KEY: &'static str = "scraping_progress";

    /// Records accepted so far for a tier
    pub fn tier_records(&self, tier: &str) -> &[FeatureRecord] {
        self.collected.get(tier).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of records accepted for a tier
    pub fn tier_count(&self, tier: &str) -> usize {
        self.tier_records(tier).len()
    }

    pub fn is_seen(&self, video_id: &str) -> bool {
        self.seen_ids.contains(video_id)
    }

    pub fn seen_count(&self) -> usize {
        self.seen_ids.len()
    }

    /// File a record under a tier and remember its id
    pub fn accept(&mut self, tier: &str, record: FeatureRecord) {
        self.seen_ids.insert(record.video_id.clone());
        self.collected
            .entry(tier.to_string())
            .or_default()
            .push(record);
    }

    /// Total accepted records across all tiers
    pub fn total_records(&self) -> usize {
        self.collected.values().map(Vec::len).sum()
    }
}

// ============================================================================
// Checkpoint Store
// ============================================================================

/// JSON file store with one file per key
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    /// Directory for checkpoint files
    checkpoint_dir: PathBuf,
}

impl CheckpointStore {
    /// Create a new store, creating the directory if needed
    pub fn new(checkpoint_dir: &Path) -> Result<Self, StorageError> {
        fs::create_dir_all(checkpoint_dir).map_err(|source| StorageError::Io {
            path: checkpoint_dir.to_path_buf(),
            source,
        })?;

        Ok(Self {
            checkpoint_dir: checkpoint_dir.to_path_buf(),
        })
    }

    /// Save state under a key
    pub fn save<T: Serialize>(&self, key: &str, state: &T) -> Result<PathBuf, StorageError> {
        let filepath = self.path_for(key);

        // Write to temp file first, then rename (atomic)
        let temp_path = filepath.with_extension("json.tmp");
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| StorageError::Io { path, source }
        };

        let file = File::create(&temp_path).map_err(io_err(&temp_path))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, state).map_err(|source| {
            StorageError::Serialization {
                path: temp_path.clone(),
                source,
            }
        })?;
        writer
            .into_inner()
            .map_err(|e| e.into_error())
            .and_then(|file| file.sync_all())
            .map_err(io_err(&temp_path))?;

        fs::rename(&temp_path, &filepath).map_err(io_err(&filepath))?;

        tracing::debug!(path = %filepath.display(), "Checkpoint saved");
        Ok(filepath)
    }

    /// Load state for a key, `None` when nothing was saved yet
    pub fn load<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let filepath = self.path_for(key);

        if !filepath.exists() {
            return Ok(None);
        }

        let file = File::open(&filepath).map_err(|source| StorageError::Io {
            path: filepath.clone(),
            source,
        })?;

        let reader = BufReader::new(file);
        let state = serde_json::from_reader(reader).map_err(|source| {
            StorageError::Serialization {
                path: filepath.clone(),
                source,
            }
        })?;

        tracing::debug!(path = %filepath.display(), "Checkpoint loaded");
        Ok(Some(state))
    }

    /// Check if a key has been saved
    pub fn exists(&self, key: &str) -> bool {
        self.path_for(key).exists()
    }

    /// File backing a key
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.checkpoint_dir.join(format!("{key}.checkpoint.json"))
    }
}

/// Write raw bytes atomically next to the checkpoints (used for exports)
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), StorageError> {
    let temp_path = path.with_extension("tmp");
    let result = File::create(&temp_path)
        .and_then(|mut file| {
            file.write_all(contents)?;
            file.sync_all()
        })
        .and_then(|_| fs::rename(&temp_path, path));

    result.map_err(|source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ============================================================================
// Tests
// ============================================================================
