// Core data structures for strata

use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// Tiers
// ============================================================================

/// Search bias applied when collecting a tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierBias {
    /// Short window, newest uploads first
    Recency,
    /// Long window, most viewed first
    Peak,
    /// Cycle through the mixed strategy table
    Rotating,
}

/// A view-count bucket with its own collection target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tier {
    pub name: String,
    /// Inclusive lower bound
    pub min_views: u64,
    /// Exclusive upper bound, `None` for unbounded
    #[serde(default)]
    pub max_views: Option<u64>,
    pub target_count: usize,
    pub bias: TierBias,
}

impl Tier {
    pub fn new(
        name: &str,
        min_views: u64,
        max_views: Option<u64>,
        target_count: usize,
        bias: TierBias,
    ) -> Self {
        Self {
            name: name.to_string(),
            min_views,
            max_views,
            target_count,
            bias,
        }
    }

    /// Whether a view count falls inside `[min_views, max_views)`
    pub fn contains(&self, views: u64) -> bool {
        views >= self.min_views && self.max_views.map_or(true, |max| views < max)
    }

    /// Status of a tier holding `collected` records while attempts remain
    pub fn status_for(&self, collected: usize) -> TierStatus {
        if collected >= self.target_count {
            TierStatus::Satisfied
        } else {
            TierStatus::Collecting
        }
    }

    /// The default sampling plan, rarest tier first
    pub fn default_tiers() -> Vec<Self> {
        vec![
            Self::new("mega_viral", 100_000, None, 300, TierBias::Peak),
            Self::new("highly_viral", 50_000, Some(100_000), 200, TierBias::Rotating),
            Self::new("moderate", 10_000, Some(50_000), 200, TierBias::Rotating),
            Self::new("low", 1_000, Some(10_000), 200, TierBias::Recency),
            Self::new("very_low", 100, Some(1_000), 100, TierBias::Recency),
        ]
    }
}

/// Lifecycle of a tier within one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierStatus {
    /// Target reached
    Satisfied,
    /// Still below target with attempts left
    Collecting,
    /// Attempt budget or quota ran out before the target
    Abandoned,
}

impl TierStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Satisfied => "satisfied",
            Self::Collecting => "collecting",
            Self::Abandoned => "abandoned",
        }
    }
}

impl std::fmt::Display for TierStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Search parameters
// ============================================================================

/// Result ordering accepted by the search endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchOrder {
    Relevance,
    ViewCount,
    Rating,
    Date,
}

impl SearchOrder {
    /// Wire value for the `order` parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Relevance => "relevance",
            Self::ViewCount => "viewCount",
            Self::Rating => "rating",
            Self::Date => "date",
        }
    }
}

/// How far back a search reaches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeWindow {
    Month,
    Year,
    TwoYears,
}

impl TimeWindow {
    pub fn days_back(&self) -> i64 {
        match self {
            Self::Month => 30,
            Self::Year => 365,
            Self::TwoYears => 730,
        }
    }
}

/// Parameters chosen for one search attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchAttempt {
    pub keyword: String,
    pub window: TimeWindow,
    pub order: SearchOrder,
}

// ============================================================================
// Platform records
// ============================================================================

/// Video resource as returned by the detail endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawVideo {
    pub id: String,
    #[serde(default)]
    pub snippet: RawSnippet,
    #[serde(default)]
    pub statistics: RawStatistics,
    #[serde(default)]
    pub content_details: RawContentDetails,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSnippet {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub channel_title: String,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Counters arrive as decimal strings; numbers are accepted too
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStatistics {
    #[serde(default, deserialize_with = "lenient_count")]
    pub view_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub like_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub comment_count: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawContentDetails {
    #[serde(default)]
    pub duration: Option<String>,
}

fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        Some(serde_json::Value::Number(n)) => n.as_u64(),
        _ => None,
    })
}

// ============================================================================
// Feature records
// ============================================================================

/// Flat, immutable feature row for one accepted video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub video_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub channel_title: String,
    pub published_at: Option<String>,
    pub duration_seconds: u32,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    /// Engagement rate: views per hour of age
    pub views_per_hour: f64,
    pub title_length: usize,
    pub title_word_count: usize,
    pub has_emoji: bool,
    pub has_question: bool,
    pub has_exclamation: bool,
    pub caps_ratio: f64,
    /// Tags joined with `|`
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub tag_count: usize,
}
