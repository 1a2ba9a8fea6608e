//! Feature extraction from raw platform records
//!
//! This module turns a [`RawVideo`] from the detail endpoint into a flat
//! [`FeatureRecord`]. Records that are not short-form are dropped here; every
//! other parse problem degrades a single field to a safe default.

pub mod duration;
pub mod title;

pub use duration::parse_duration;
pub use title::TitleFeatures;

use chrono::{DateTime, Utc};

use crate::models::{FeatureRecord, RawVideo};

/// Converts raw records into feature rows
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    max_duration_secs: u32,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(60)
    }
}

impl FeatureExtractor {
    pub fn new(max_duration_secs: u32) -> Self {
        Self { max_duration_secs }
    }

    /// Extract one record, or `None` when the video is not short-form
    ///
    /// A missing, unparseable or zero duration, or one above the short-form
    /// ceiling, discards the record.
    pub fn extract(&self, raw: &RawVideo, now: DateTime<Utc>) -> Option<FeatureRecord> {
        let duration_seconds = raw
            .content_details
            .duration
            .as_deref()
            .and_then(parse_duration)
            .filter(|&secs| secs > 0 && secs <= self.max_duration_secs)?;

        let snippet = &raw.snippet;
        let stats = &raw.statistics;
        let view_count = stats.view_count.unwrap_or(0);
        let title = TitleFeatures::from_title(&snippet.title);

        Some(FeatureRecord {
            video_id: raw.id.clone(),
            title: snippet.title.clone(),
            description: snippet.description.clone(),
            channel_title: snippet.channel_title.clone(),
            published_at: snippet.published_at.clone(),
            duration_seconds,
            view_count,
            like_count: stats.like_count.unwrap_or(0),
            comment_count: stats.comment_count.unwrap_or(0),
            views_per_hour: views_per_hour(view_count, snippet.published_at.as_deref(), now),
            title_length: title.length,
            title_word_count: title.word_count,
            has_emoji: title.has_emoji,
            has_question: title.has_question,
            has_exclamation: title.has_exclamation,
            caps_ratio: title.caps_ratio,
            tags: snippet.tags.join("|"),
            tag_count: snippet.tags.len(),
        })
    }

    /// Extract every record of a batch, returning the kept rows and the number discarded
    pub fn extract_all(
        &self,
        raws: &[RawVideo],
        now: DateTime<Utc>,
    ) -> (Vec<FeatureRecord>, usize) {
        let records: Vec<FeatureRecord> = raws
            .iter()
            .filter_map(|raw| self.extract(raw, now))
            .collect();
        let discarded = raws.len() - records.len();
        (records, discarded)
    }
}

/// Views divided by age in hours, with age floored at one hour
///
/// Returns 0 when the publish time is missing or unparseable.
pub fn views_per_hour(views: u64, published_at: Option<&str>, now: DateTime<Utc>) -> f64 {
    let Some(published) = published_at.and_then(|s| DateTime::parse_from_rfc3339(s).ok()) else {
        return 0.0;
    };

    let age_hours = (now - published.with_timezone(&Utc)).num_seconds() as f64 / 3600.0;
    views as f64 / age_hours.max(1.0)
}
