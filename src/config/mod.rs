//! Configuration management for the strata collector
//!
//! This module handles loading and validating configuration from environment
//! variables and TOML files. Tier definitions, the keyword vocabulary and the
//! quota constants default to the built-in sampling plan.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::crawler::strategy::SPACE_KEYWORDS;
use crate::models::Tier;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Platform API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Daily quota budget
    #[serde(default)]
    pub quota: QuotaConfig,

    /// Collection loop limits
    #[serde(default)]
    pub collector: CollectorConfig,

    /// Tiers and search vocabulary
    #[serde(default)]
    pub sampling: SamplingConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Platform API configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the data API (e.g. `https://www.googleapis.com/youtube/v3`)
    pub base_url: String,

    /// API key; read from `YOUTUBE_API_KEY`, never written back out
    #[serde(skip_serializing)]
    pub api_key: String,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Relevance language hint for searches
    pub relevance_language: String,
}

impl ApiConfig {
    /// Get request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// Hand-written so the key never ends up in logs
impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field(
                "api_key",
                &if self.api_key.is_empty() {
                    "<unset>"
                } else {
                    "REDACTED"
                },
            )
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("relevance_language", &self.relevance_language)
            .finish()
    }
}

/// Daily quota budget, in platform quota units
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaConfig {
    /// Units granted per calendar day
    pub daily_limit: u64,

    /// Units never spent by this tool
    pub reserve: u64,

    /// Cost of one search call
    pub search_cost: u64,

    /// Cost of one detail call
    pub detail_cost: u64,
}

/// Collection loop limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Attempts per tier before it is abandoned
    pub max_attempts_per_tier: usize,

    /// New ids sent to the detail endpoint per attempt
    pub max_details_per_attempt: usize,

    /// Results requested per search
    pub max_results_per_search: u32,

    /// Ids per detail call (platform maximum is 50)
    pub detail_batch_size: usize,

    /// Longest duration still counted as short-form
    pub max_duration_secs: u32,

    /// Attempts per request, including the first
    pub retry_attempts: u32,

    /// Backoff unit in milliseconds
    pub backoff_base_ms: u64,

    /// Pause after every successful request
    pub courtesy_delay_ms: u64,

    /// Directory for checkpoints, exports and metrics
    pub output_dir: PathBuf,
}

/// Tier definitions and search vocabulary
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Search keywords
    pub keywords: Vec<String>,

    /// Tiers in collection order
    pub tiers: Vec<Tier>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::from("https://www.googleapis.com/youtube/v3"),
            api_key: String::new(),
            request_timeout_secs: 10,
            relevance_language: String::from("en"),
        }
    }
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            daily_limit: 10_000,
            reserve: 200,
            search_cost: 100,
            detail_cost: 1,
        }
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            max_attempts_per_tier: 30,
            max_details_per_attempt: 20,
            max_results_per_search: 50,
            detail_batch_size: 50,
            max_duration_secs: 60,
            retry_attempts: 3,
            backoff_base_ms: 1000,
            courtesy_delay_ms: 500,
            output_dir: PathBuf::from("space_video_patterns"),
        }
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            keywords: SPACE_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            tiers: Tier::default_tiers(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env();
        Ok(config)
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        fn parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
            std::env::var(name).ok().and_then(|v| v.parse::<T>().ok())
        }

        if let Ok(key) = std::env::var("YOUTUBE_API_KEY") {
            self.api.api_key = key;
        }
        if let Ok(url) = std::env::var("STRATA_API_BASE_URL") {
            self.api.base_url = url;
        }
        if let Some(v) = parsed("STRATA_REQUEST_TIMEOUT") {
            self.api.request_timeout_secs = v;
        }
        if let Some(v) = parsed("STRATA_QUOTA_DAILY_LIMIT") {
            self.quota.daily_limit = v;
        }
        if let Some(v) = parsed("STRATA_QUOTA_RESERVE") {
            self.quota.reserve = v;
        }
        if let Some(v) = parsed("STRATA_MAX_ATTEMPTS") {
            self.collector.max_attempts_per_tier = v;
        }
        if let Some(v) = parsed("STRATA_COURTESY_DELAY_MS") {
            self.collector.courtesy_delay_ms = v;
        }
        if let Ok(dir) = std::env::var("STRATA_OUTPUT_DIR") {
            self.collector.output_dir = PathBuf::from(dir);
        }
        if let Ok(level) = std::env::var("STRATA_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("STRATA_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let base = url::Url::parse(&self.api.base_url)
            .with_context(|| format!("Invalid API base URL: {}", self.api.base_url))?;
        if !matches!(base.scheme(), "http" | "https") {
            anyhow::bail!("API base URL must use http or https");
        }

        if self.quota.reserve >= self.quota.daily_limit {
            anyhow::bail!("quota reserve must be below the daily limit");
        }

        if self.collector.max_attempts_per_tier == 0 {
            anyhow::bail!("max_attempts_per_tier must be greater than 0");
        }

        if self.collector.detail_batch_size == 0 || self.collector.detail_batch_size > 50 {
            anyhow::bail!("detail_batch_size must be between 1 and 50");
        }

        if self.collector.max_details_per_attempt == 0 {
            anyhow::bail!("max_details_per_attempt must be greater than 0");
        }

        if self.collector.retry_attempts == 0 {
            anyhow::bail!("retry_attempts must be greater than 0");
        }

        if self.sampling.keywords.iter().all(|k| k.trim().is_empty()) {
            anyhow::bail!("at least one search keyword is required");
        }

        if self.sampling.tiers.is_empty() {
            anyhow::bail!("at least one tier is required");
        }

        for tier in &self.sampling.tiers {
            if let Some(max) = tier.max_views {
                if max <= tier.min_views {
                    anyhow::bail!("tier {} has an empty view range", tier.name);
                }
            }
        }

        let mut names: Vec<&str> = self.sampling.tiers.iter().map(|t| t.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        if names.len() != self.sampling.tiers.len() {
            anyhow::bail!("tier names must be unique");
        }

        Ok(())
    }

    /// Fail unless an API key is available
    pub fn require_api_key(&self) -> Result<&str> {
        if self.api.api_key.trim().is_empty() {
            anyhow::bail!("YOUTUBE_API_KEY is not set");
        }
        Ok(&self.api.api_key)
    }
}
