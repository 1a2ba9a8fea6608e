//! Daily API quota ledger
//!
//! The platform grants a fixed number of quota units per calendar day. The
//! ledger tracks units spent today, keeps a reserve that is never touched, and
//! persists usage after every debit so a restarted process cannot spend the
//! same units twice.
//!
//! An operation may proceed only while `used + cost < daily_limit - reserve`.
//! When the current day differs from the stored day, usage starts again at zero.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::QuotaConfig;
use crate::storage::CheckpointStore;
use crate::utils::error::CollectError;

/// Source of "today" for the daily reset boundary
pub type DayClock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// Persisted quota usage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaState {
    /// Calendar day the usage belongs to
    pub date: NaiveDate,

    /// Units consumed on that day
    pub used: u64,
}

/// Tracks and persists daily quota consumption
pub struct QuotaLedger {
    store: CheckpointStore,
    state: QuotaState,
    daily_limit: u64,
    reserve: u64,
    today: DayClock,
}

impl QuotaLedger {
    /// Store key for quota usage
    pub const STORE_KEY: &'static str = "quota_status";

    /// Load the ledger using the local calendar day
    pub fn load(store: CheckpointStore, config: &QuotaConfig) -> Result<Self, CollectError> {
        Self::load_with_clock(store, config, Arc::new(|| Local::now().date_naive()))
    }

    /// Load the ledger with an explicit day source
    pub fn load_with_clock(
        store: CheckpointStore,
        config: &QuotaConfig,
        today: DayClock,
    ) -> Result<Self, CollectError> {
        let current_day = today();
        let state = match store.load::<QuotaState>(Self::STORE_KEY)? {
            Some(saved) if saved.date == current_day => saved,
            Some(saved) => {
                info!(
                    stored_date = %saved.date,
                    stored_used = saved.used,
                    "New quota day, usage reset"
                );
                QuotaState {
                    date: current_day,
                    used: 0,
                }
            }
            None => QuotaState {
                date: current_day,
                used: 0,
            },
        };

        Ok(Self {
            store,
            state,
            daily_limit: config.daily_limit,
            reserve: config.reserve,
            today,
        })
    }

    /// Whether an operation costing `cost` units may proceed
    pub fn can_afford(&mut self, cost: u64) -> bool {
        self.roll_over();
        let allowed = self.spendable_ceiling();
        let affordable = self.state.used.saturating_add(cost) < allowed;

        debug!(
            used = self.state.used,
            limit = self.daily_limit,
            remaining = self.remaining(),
            cost = cost,
            affordable = affordable,
            "Quota status"
        );
        affordable
    }

    /// Record `cost` units as spent and persist the new usage
    pub fn debit(&mut self, cost: u64) -> Result<(), CollectError> {
        if !self.can_afford(cost) {
            return Err(self.exceeded(cost));
        }

        self.state.used += cost;
        self.store.save(Self::STORE_KEY, &self.state)?;

        debug!(
            used = self.state.used,
            limit = self.daily_limit,
            usage_percent = self.usage_percent(),
            "Quota debited"
        );
        Ok(())
    }

    /// Build the error reported when `cost` cannot be afforded
    pub fn exceeded(&self, cost: u64) -> CollectError {
        CollectError::QuotaExceeded {
            used: self.state.used,
            requested: cost,
            limit: self.daily_limit,
        }
    }

    /// Units consumed today
    pub fn used(&self) -> u64 {
        self.state.used
    }

    /// Units left before the daily limit (the reserve included)
    pub fn remaining(&self) -> u64 {
        self.daily_limit.saturating_sub(self.state.used)
    }

    pub fn daily_limit(&self) -> u64 {
        self.daily_limit
    }

    /// Share of the daily limit consumed, in percent
    pub fn usage_percent(&self) -> f64 {
        if self.daily_limit == 0 {
            return 100.0;
        }
        self.state.used as f64 / self.daily_limit as f64 * 100.0
    }

    fn spendable_ceiling(&self) -> u64 {
        self.daily_limit.saturating_sub(self.reserve)
    }

    fn roll_over(&mut self) {
        let current_day = (self.today)();
        if current_day != self.state.date {
            info!(
                previous_date = %self.state.date,
                previous_used = self.state.used,
                "Quota day rolled over, usage reset"
            );
            self.state = QuotaState {
                date: current_day,
                used: 0,
            };
        }
    }
}
