//! Search strategy selection
//!
//! Each attempt searches one random keyword inside a publication window with a
//! result ordering. Rare, high-view tiers look back a full year sorted by views;
//! low-view tiers look at the last month sorted by upload date; the tiers in
//! between rotate through a fixed table so consecutive attempts surface
//! different slices of the catalogue.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::models::{SearchAttempt, SearchOrder, Tier, TierBias, TimeWindow};

/// Built-in search vocabulary
pub const SPACE_KEYWORDS: &[&str] = &[
    "space",
    "NASA",
    "ISS",
    "JWST",
    "James Webb",
    "SpaceX",
    "astronomy",
    "cosmos",
    "galaxy",
    "nebula",
    "black hole",
    "mars",
    "moon",
    "asteroid",
    "comet",
    "telescope",
    "universe",
    "jupiter",
    "star",
    "planet",
    "celestial",
    "rocket",
    "space facts",
    "space 4k",
    "space edit",
    "earth from space",
    "stars",
    "intergalactic",
    "astronaut",
    "interstellar",
    "space shorts",
    "NASA space",
    "International Space Station",
    "blackhole",
    "sun",
    "solar",
    "lunar",
    "cosmos universe",
    "astrophysics",
    "Solar system",
    "space size comparison",
    "space zoom",
    "webb telescope new images",
    "space compilation",
    "space timelapse",
    "hubble images",
    "space discoveries 2024",
    "space discoveries 2025",
    "universe size",
    "how big is space",
    "space comparison",
    "science facts",
    "amazing facts",
    "mind blowing space",
    "space didyouknow",
    "space mindblowing",
    "space amazing facts",
    "cosmos facts",
    "universe facts",
    "astronomy facts",
    "space documentary",
    "space education",
    "learn space",
    "viral space",
    "best space moments",
    "kurzgesagt space",
    "vsauce space",
    "veritasium space",
    "space explained",
    "space in 60 seconds",
    "quick space facts",
];

/// Ordering and window pairs cycled by rotating tiers
const ROTATION: [(SearchOrder, TimeWindow); 4] = [
    (SearchOrder::Relevance, TimeWindow::Year),
    (SearchOrder::ViewCount, TimeWindow::TwoYears),
    (SearchOrder::Rating, TimeWindow::Year),
    (SearchOrder::Date, TimeWindow::Month),
];

/// Ordering and window for a tier bias at a given attempt number
pub fn plan(bias: TierBias, attempt: usize) -> (SearchOrder, TimeWindow) {
    match bias {
        TierBias::Recency => (SearchOrder::Date, TimeWindow::Month),
        TierBias::Peak => (SearchOrder::ViewCount, TimeWindow::Year),
        TierBias::Rotating => ROTATION[attempt % ROTATION.len()],
    }
}

/// `(published_after, published_before)` for a window ending at `now`
pub fn window_bounds(window: TimeWindow, now: DateTime<Utc>) -> (String, String) {
    let start = now - Duration::days(window.days_back());
    (
        start.to_rfc3339_opts(SecondsFormat::Secs, true),
        now.to_rfc3339_opts(SecondsFormat::Secs, true),
    )
}

/// Picks keyword, ordering and window for each attempt
pub struct SearchStrategySelector<R: Rng = StdRng> {
    keywords: Vec<String>,
    rng: R,
}

impl SearchStrategySelector<StdRng> {
    /// Selector seeded from the operating system
    pub fn new(keywords: Vec<String>) -> Self {
        Self::with_rng(keywords, StdRng::from_entropy())
    }
}

impl<R: Rng> SearchStrategySelector<R> {
    /// Selector with an explicit random source
    pub fn with_rng(keywords: Vec<String>, rng: R) -> Self {
        let keywords = keywords
            .into_iter()
            .filter(|k| !k.trim().is_empty())
            .collect();
        Self { keywords, rng }
    }

    /// Choose the search for `attempt` (1-based) of `tier`
    pub fn choose(&mut self, tier: &Tier, attempt: usize) -> SearchAttempt {
        let keyword = self
            .keywords
            .choose(&mut self.rng)
            .cloned()
            .unwrap_or_else(|| SPACE_KEYWORDS[0].to_string());
        let (order, window) = plan(tier.bias, attempt);

        SearchAttempt {
            keyword,
            window,
            order,
        }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}
