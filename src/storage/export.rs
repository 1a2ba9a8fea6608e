//! CSV export of collected records
//!
//! One row per accepted record, tiers in their declared order, with the tier
//! name appended as the last column. Quoting follows RFC 4180.

use chrono::NaiveDate;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::{FeatureRecord, Tier};
use crate::storage::checkpoint::{write_atomic, CollectionCheckpoint};

const HEADER: &[&str] = &[
    "video_id",
    "title",
    "description",
    "channel_title",
    "published_at",
    "duration_seconds",
    "view_count",
    "like_count",
    "comment_count",
    "views_per_hour",
    "title_length",
    "title_word_count",
    "has_emoji",
    "has_question",
    "has_exclamation",
    "caps_ratio",
    "tags",
    "tag_count",
    "tier",
];

/// Writes the collected dataset as a CSV file
pub struct CsvExporter {
    /// Output directory
    output_dir: PathBuf,
}

impl CsvExporter {
    pub fn new(output_dir: &Path) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
        }
    }

    /// File name for a given run date
    pub fn file_name(date: NaiveDate) -> String {
        format!("space_videos_patterns_{}.csv", date.format("%Y%m%d"))
    }

    /// Write every record of the checkpoint and return the output path
    ///
    /// Tiers listed in `tiers` come first in declared order; records filed under
    /// tiers no longer configured follow in name order.
    pub fn write(
        &self,
        checkpoint: &CollectionCheckpoint,
        tiers: &[Tier],
        date: NaiveDate,
    ) -> Result<PathBuf> {
        let path = self.output_dir.join(Self::file_name(date));
        let body = render_csv(checkpoint, tiers);

        write_atomic(&path, body.as_bytes())?;

        tracing::info!(
            path = %path.display(),
            rows = checkpoint.total_records(),
            "Dataset exported"
        );
        Ok(path)
    }
}

/// Render the checkpoint as CSV text
pub fn render_csv(checkpoint: &CollectionCheckpoint, tiers: &[Tier]) -> String {
    let mut out = String::new();
    out.push_str(&HEADER.join(","));
    out.push('\n');

    let configured = tiers.iter().map(|t| t.name.as_str());
    let leftover = checkpoint
        .collected
        .keys()
        .map(String::as_str)
        .filter(|name| !tiers.iter().any(|t| t.name == *name));

    for tier in configured.chain(leftover) {
        for record in checkpoint.tier_records(tier) {
            write_row(&mut out, record, tier);
        }
    }

    out
}

fn write_row(out: &mut String, record: &FeatureRecord, tier: &str) {
    let fields = [
        escape(&record.video_id),
        escape(&record.title),
        escape(&record.description),
        escape(&record.channel_title),
        escape(record.published_at.as_deref().unwrap_or_default()),
        record.duration_seconds.to_string(),
        record.view_count.to_string(),
        record.like_count.to_string(),
        record.comment_count.to_string(),
        record.views_per_hour.to_string(),
        record.title_length.to_string(),
        record.title_word_count.to_string(),
        record.has_emoji.to_string(),
        record.has_question.to_string(),
        record.has_exclamation.to_string(),
        record.caps_ratio.to_string(),
        escape(&record.tags),
        record.tag_count.to_string(),
        escape(tier),
    ];

    let _ = writeln!(out, "{}", fields.join(","));
}

/// Quote a field when it contains a delimiter, quote or line break
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
