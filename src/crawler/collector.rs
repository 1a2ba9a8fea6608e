//! Stratified collection loop
//!
//! Tiers are visited in declared order. Each tier gets a bounded number of
//! attempts; one attempt is a search, a detail fetch for unseen candidates,
//! and acceptance of the records whose view count falls inside the tier.
//!
//! Progress is checkpointed after every attempt that accepted something, so a
//! restarted run resumes from the last accepted record. Quota exhaustion ends
//! the run; request failures only end the current attempt.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::Rng;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::Config;
use crate::crawler::details::VideoDetailFetcher;
use crate::crawler::requester::RetryingRequester;
use crate::crawler::search::search_videos;
use crate::crawler::strategy::SearchStrategySelector;
use crate::metrics;
use crate::models::{Tier, TierStatus};
use crate::parser::FeatureExtractor;
use crate::quota::QuotaLedger;
use crate::storage::{CheckpointStore, CollectionCheckpoint};
use crate::utils::error::CollectError;

/// Loop limits for one run
#[derive(Debug, Clone)]
pub struct CollectorSettings {
    pub max_attempts_per_tier: usize,
    pub max_details_per_attempt: usize,
    pub max_results_per_search: u32,
    pub relevance_language: String,
    pub search_cost: u64,
}

impl CollectorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts_per_tier: config.collector.max_attempts_per_tier,
            max_details_per_attempt: config.collector.max_details_per_attempt,
            max_results_per_search: config.collector.max_results_per_search,
            relevance_language: config.api.relevance_language.clone(),
            search_cost: config.quota.search_cost,
        }
    }
}

/// Final state of one tier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierOutcome {
    pub name: String,
    pub status: TierStatus,
    pub collected: usize,
    pub target: usize,
    /// Attempts spent on this tier during this run
    pub attempts: usize,
}

/// Summary of a collection run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub tiers: Vec<TierOutcome>,
    /// The run stopped early because the daily quota ran out
    pub quota_exhausted: bool,
    /// Attempts spent across all tiers
    pub attempts: usize,
}

impl RunReport {
    pub fn total_collected(&self) -> usize {
        self.tiers.iter().map(|t| t.collected).sum()
    }
}

/// Drives collection across all tiers
pub struct StratifiedCollector<R: Rng = StdRng> {
    requester: RetryingRequester,
    selector: SearchStrategySelector<R>,
    details: VideoDetailFetcher,
    extractor: FeatureExtractor,
    store: CheckpointStore,
    tiers: Vec<Tier>,
    settings: CollectorSettings,
    checkpoint: CollectionCheckpoint,
}

impl<R: Rng> StratifiedCollector<R> {
    /// Build a collector, resuming from any checkpoint in `store`
    ///
    /// # Errors
    ///
    /// Returns `CollectError::Storage` if an existing checkpoint cannot be read
    pub fn new(
        config: &Config,
        requester: RetryingRequester,
        selector: SearchStrategySelector<R>,
        store: CheckpointStore,
    ) -> Result<Self, CollectError> {
        let checkpoint = store
            .load::<CollectionCheckpoint>(CollectionCheckpoint::STORE_KEY)?
            .unwrap_or_default();

        if checkpoint.total_records() > 0 {
            info!(
                records = checkpoint.total_records(),
                seen = checkpoint.seen_count(),
                "Resuming from checkpoint"
            );
        }

        Ok(Self {
            requester,
            selector,
            details: VideoDetailFetcher::new(
                config.collector.detail_batch_size,
                config.quota.detail_cost,
            ),
            extractor: FeatureExtractor::new(config.collector.max_duration_secs),
            store,
            tiers: config.sampling.tiers.clone(),
            settings: CollectorSettings::from_config(config),
            checkpoint,
        })
    }

    pub fn checkpoint(&self) -> &CollectionCheckpoint {
        &self.checkpoint
    }

    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    /// Collect until every tier is satisfied, abandoned, or quota runs out
    ///
    /// # Errors
    ///
    /// Returns `CollectError::Storage` if progress cannot be persisted. Quota
    /// exhaustion is not an error; it is reported in [`RunReport::quota_exhausted`].
    pub async fn run(&mut self, ledger: &mut QuotaLedger) -> Result<RunReport, CollectError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("collect", run_id = %run_id);
        self.run_tiers(ledger).instrument(span).await
    }

    async fn run_tiers(&mut self, ledger: &mut QuotaLedger) -> Result<RunReport, CollectError> {
        let target_total: usize = self.tiers.iter().map(|t| t.target_count).sum();
        info!(
            tiers = self.tiers.len(),
            target_total = target_total,
            quota_used = ledger.used(),
            "Starting stratified collection"
        );

        let tiers = self.tiers.clone();
        let mut report = RunReport {
            tiers: Vec::with_capacity(tiers.len()),
            quota_exhausted: false,
            attempts: 0,
        };

        for tier in &tiers {
            if report.quota_exhausted {
                report.tiers.push(self.outcome(tier, 0));
                continue;
            }

            let mut attempts = 0;
            match self.collect_tier(tier, ledger, &mut attempts).await {
                Ok(()) => {}
                Err(CollectError::QuotaExceeded { used, limit, .. }) => {
                    warn!(
                        tier = %tier.name,
                        used = used,
                        limit = limit,
                        "Quota exhausted, stopping run; resume tomorrow"
                    );
                    report.quota_exhausted = true;
                }
                Err(e) => return Err(e),
            }

            report.attempts += attempts;
            let outcome = self.outcome(tier, attempts);
            info!(
                tier = %outcome.name,
                status = %outcome.status,
                collected = outcome.collected,
                target = outcome.target,
                "Tier finished"
            );
            report.tiers.push(outcome);
        }

        info!(
            collected = report.total_collected(),
            attempts = report.attempts,
            quota_used = ledger.used(),
            quota_exhausted = report.quota_exhausted,
            "Collection finished"
        );
        Ok(report)
    }

    /// Run attempts for one tier until it is full or out of attempts
    ///
    /// Only run-fatal errors are returned.
    async fn collect_tier(
        &mut self,
        tier: &Tier,
        ledger: &mut QuotaLedger,
        attempts: &mut usize,
    ) -> Result<(), CollectError> {
        let already = self.checkpoint.tier_count(&tier.name);
        if tier.status_for(already) == TierStatus::Satisfied {
            info!(
                tier = %tier.name,
                collected = already,
                target = tier.target_count,
                "Tier already satisfied"
            );
            return Ok(());
        }

        while tier.status_for(self.checkpoint.tier_count(&tier.name)) == TierStatus::Collecting
            && *attempts < self.settings.max_attempts_per_tier
        {
            *attempts += 1;
            match self.run_attempt(tier, *attempts, ledger).await {
                Ok(_) => {}
                Err(e) if e.is_run_fatal() => return Err(e),
                Err(e) => {
                    warn!(tier = %tier.name, attempt = *attempts, error = %e, "Attempt failed");
                }
            }
        }

        Ok(())
    }

    /// One search, detail fetch and acceptance pass; returns records accepted
    async fn run_attempt(
        &mut self,
        tier: &Tier,
        attempt: usize,
        ledger: &mut QuotaLedger,
    ) -> Result<usize, CollectError> {
        let choice = self.selector.choose(tier, attempt);
        info!(
            tier = %tier.name,
            attempt = attempt,
            keyword = %choice.keyword,
            days_back = choice.window.days_back(),
            order = choice.order.as_str(),
            "Searching"
        );

        let results = search_videos(
            &self.requester,
            ledger,
            &choice,
            self.settings.max_results_per_search,
            &self.settings.relevance_language,
            self.settings.search_cost,
        )
        .await?;

        let mut new_ids: Vec<String> = Vec::new();
        for id in results.video_ids {
            if new_ids.len() >= self.settings.max_details_per_attempt {
                break;
            }
            if !self.checkpoint.is_seen(&id) && !new_ids.contains(&id) {
                new_ids.push(id);
            }
        }

        if new_ids.is_empty() {
            debug!(tier = %tier.name, attempt = attempt, "No unseen candidates");
            return Ok(0);
        }

        let raws = self.details.fetch(&self.requester, ledger, &new_ids).await?;
        let (records, discarded) = self.extractor.extract_all(&raws, Utc::now());
        metrics::record_discarded(discarded);

        let mut accepted = 0;
        for record in records {
            if self.checkpoint.tier_count(&tier.name) >= tier.target_count {
                break;
            }
            if !tier.contains(record.view_count) || self.checkpoint.is_seen(&record.video_id) {
                continue;
            }
            self.checkpoint.accept(&tier.name, record);
            accepted += 1;
        }

        if accepted > 0 {
            self.store.save(CollectionCheckpoint::STORE_KEY, &self.checkpoint)?;
            metrics::record_checkpoint_write();
            metrics::record_accepted(&tier.name, accepted);
        }

        info!(
            tier = %tier.name,
            accepted = accepted,
            discarded = discarded,
            collected = self.checkpoint.tier_count(&tier.name),
            target = tier.target_count,
            "Attempt finished"
        );
        Ok(accepted)
    }

    fn outcome(&self, tier: &Tier, attempts: usize) -> TierOutcome {
        let collected = self.checkpoint.tier_count(&tier.name);
        // A tier still collecting once its loop has ended is abandoned for this run
        let status = match tier.status_for(collected) {
            TierStatus::Collecting => TierStatus::Abandoned,
            status => status,
        };

        TierOutcome {
            name: tier.name.clone(),
            status,
            collected,
            target: tier.target_count,
            attempts,
        }
    }
}
