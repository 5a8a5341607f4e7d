//! Per-user momentum ledger.
//!
//! The ledger is a durable accumulator: momentum decays over time, grows
//! with every completed work item, and a daily-return streak rides along.
//! Everything in this module is pure; persistence is the service's job.

pub mod cap;
pub mod decay;
pub mod gain;
pub mod milestone;
pub mod streak;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub use cap::{compute_cap, CapConfig};
pub use decay::{compute_decay, hours_between, DecayConfig, DecayResult};
pub use gain::{apply_gain, GainOutcome};
pub use milestone::{Milestone, MilestoneConfig};
pub use streak::{advance_streak, StreakUpdate};

/// Momentum and streak state for a single user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomentumLedger {
    pub user_id: String,
    /// Always within `[0, max_value]`
    pub current_value: u32,
    pub max_value: u32,
    /// Subtracted once per elapsed decay period (effective minimum 1)
    pub decay_rate_per_period: f64,
    /// Watermark for decay; only whole periods since here count
    pub last_decay_at: DateTime<Utc>,
    /// Day of the most recent qualifying completion
    pub last_action_date: Option<NaiveDate>,
    pub current_streak: u32,
    /// Never below `current_streak`, never decreases
    pub longest_streak: u32,
    pub total_completed_count: u32,
    /// Row version for compare-and-swap writes
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MomentumLedger {
    /// A fresh ledger as created on a user's first activity.
    pub fn new(user_id: impl Into<String>, now: DateTime<Utc>, cap: &CapConfig, decay: &DecayConfig) -> Self {
        Self {
            user_id: user_id.into(),
            current_value: 0,
            max_value: cap.base_max,
            decay_rate_per_period: decay.default_rate_per_period,
            last_decay_at: now,
            last_action_date: None,
            current_streak: 0,
            longest_streak: 0,
            total_completed_count: 0,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Current momentum as a percentage of the cap. Zero when the cap is zero.
    pub fn momentum_percentage(&self) -> f64 {
        if self.max_value == 0 {
            return 0.0;
        }
        100.0 * f64::from(self.current_value) / f64::from(self.max_value)
    }

    /// The streak as it stands on `today`.
    ///
    /// The stored streak is only rewritten by the next action, so a streak
    /// whose last action is older than yesterday reads as zero here.
    pub fn streak_on(&self, today: NaiveDate) -> u32 {
        match self.last_action_date.and_then(|d| d.succ_opt()) {
            Some(next_day) if next_day < today => 0,
            _ => self.current_streak,
        }
    }
}
