//! Run summary statistics
//!
//! Descriptive statistics over the collected dataset, printed at the end of a
//! run: per-tier counts, the view-count range, mean title length in words, and
//! the share of titles containing a question mark or an emoji.

use chrono::NaiveDate;
use handlebars::Handlebars;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::{FeatureRecord, Tier};
use crate::storage::{CheckpointStore, CollectionCheckpoint, CsvExporter};
use crate::utils::format_thousands;

/// Summary template
const SUMMARY_TEMPLATE: &str = include_str!("../../templates/summary.hbs");

/// Records collected for one tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierCount {
    pub name: String,
    pub collected: usize,
    pub target: usize,
}

/// Statistics over every accepted record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub tiers: Vec<TierCount>,
    /// `(min, max)` view count, `None` when nothing was collected
    pub view_range: Option<(u64, u64)>,
    pub mean_title_words: f64,
    pub questions: usize,
    pub emojis: usize,
}

/// Flattened strings handed to the template
#[derive(Debug, Serialize)]
struct SummaryView<'a> {
    total: usize,
    tiers: &'a [TierCount],
    has_records: bool,
    view_min: String,
    view_max: String,
    mean_title_words: String,
    questions: usize,
    question_pct: String,
    emojis: usize,
    emoji_pct: String,
}

impl RunSummary {
    /// Compute the summary for the configured tiers
    ///
    /// Records filed under tiers missing from `tiers` are still counted in the
    /// dataset statistics and listed after the configured tiers.
    pub fn from_checkpoint(checkpoint: &CollectionCheckpoint, tiers: &[Tier]) -> Self {
        let mut counts: Vec<TierCount> = tiers
            .iter()
            .map(|tier| TierCount {
                name: tier.name.clone(),
                collected: checkpoint.tier_count(&tier.name),
                target: tier.target_count,
            })
            .collect();

        for (name, records) in &checkpoint.collected {
            if !tiers.iter().any(|t| &t.name == name) {
                counts.push(TierCount {
                    name: name.clone(),
                    collected: records.len(),
                    target: 0,
                });
            }
        }

        let records: Vec<&FeatureRecord> = checkpoint.collected.values().flatten().collect();
        let total = records.len();

        let view_range = records
            .iter()
            .map(|r| r.view_count)
            .fold(None, |range: Option<(u64, u64)>, v| match range {
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
                None => Some((v, v)),
            });

        let mean_title_words = if total == 0 {
            0.0
        } else {
            records.iter().map(|r| r.title_word_count).sum::<usize>() as f64 / total as f64
        };

        Self {
            total,
            tiers: counts,
            view_range,
            mean_title_words,
            questions: records.iter().filter(|r| r.has_question).count(),
            emojis: records.iter().filter(|r| r.has_emoji).count(),
        }
    }

    /// Share of records with a question mark, in percent
    pub fn question_share(&self) -> f64 {
        percent(self.questions, self.total)
    }

    /// Share of records with an emoji, in percent
    pub fn emoji_share(&self) -> f64 {
        percent(self.emojis, self.total)
    }

    /// Render the summary as plain text
    pub fn render(&self) -> Result<String> {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(handlebars::no_escape);

        let (view_min, view_max) = self.view_range.unwrap_or((0, 0));
        let view = SummaryView {
            total: self.total,
            tiers: &self.tiers,
            has_records: self.total > 0,
            view_min: format_thousands(view_min),
            view_max: format_thousands(view_max),
            mean_title_words: format!("{:.1}", self.mean_title_words),
            questions: self.questions,
            question_pct: format!("{:.1}", self.question_share()),
            emojis: self.emojis,
            emoji_pct: format!("{:.1}", self.emoji_share()),
        };

        Ok(handlebars.render_template(SUMMARY_TEMPLATE, &view)?)
    }
}

/// Dataset file and summary text produced at the end of a run
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub csv_path: PathBuf,
    pub summary: String,
}

/// Export and summarise the last durable checkpoint in `store`
///
/// Reads progress back from disk, so a run that failed part way still reports
/// exactly what was checkpointed. Returns `None` when nothing has been
/// collected yet.
pub fn finish_run(
    store: &CheckpointStore,
    tiers: &[Tier],
    output_dir: &Path,
    date: NaiveDate,
) -> Result<Option<RunOutput>> {
    let checkpoint = store
        .load::<CollectionCheckpoint>(CollectionCheckpoint::STORE_KEY)?
        .unwrap_or_default();
    if checkpoint.total_records() == 0 {
        return Ok(None);
    }

    let csv_path = CsvExporter::new(output_dir).write(&checkpoint, tiers, date)?;
    let summary = RunSummary::from_checkpoint(&checkpoint, tiers).render()?;
    Ok(Some(RunOutput { csv_path, summary }))
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
