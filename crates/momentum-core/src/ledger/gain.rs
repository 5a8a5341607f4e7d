//! Momentum gain on work-item completion.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::cap::{compute_cap, CapConfig};
use super::milestone::{Milestone, MilestoneConfig};
use super::streak::{advance_streak, StreakUpdate};
use super::MomentumLedger;
use crate::error::ValidationError;

/// What a single completion did to the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GainOutcome {
    pub momentum_gained: u32,
    pub new_value: u32,
    /// Cap after recomputing from the new completion count
    pub new_max_value: u32,
    pub streak_updated: bool,
    pub new_streak: u32,
    pub streak_broken: bool,
    pub total_completed_count: u32,
    pub milestone_reached: Option<Milestone>,
}

/// Apply one completion worth `momentum_gain` to the ledger.
///
/// The streak is advanced first. The new value is clamped to the cap in
/// force before this completion; gains above it are dropped, not banked.
/// The cap is then recomputed from the new completion count and never
/// shrinks.
///
/// # Errors
/// Returns [`ValidationError::NegativeGain`] when `momentum_gain < 0`.
pub fn apply_gain(
    ledger: &mut MomentumLedger,
    momentum_gain: i64,
    today: NaiveDate,
    cap: &CapConfig,
    milestones: &MilestoneConfig,
) -> Result<GainOutcome, ValidationError> {
    if momentum_gain < 0 {
        return Err(ValidationError::NegativeGain(momentum_gain));
    }
    let gain = u32::try_from(momentum_gain).unwrap_or(u32::MAX);

    let StreakUpdate {
        streak_updated,
        new_streak,
        streak_broken,
    } = advance_streak(ledger, today);

    ledger.current_value = ledger.current_value.saturating_add(gain).min(ledger.max_value);
    ledger.total_completed_count = ledger.total_completed_count.saturating_add(1);
    ledger.max_value = ledger
        .max_value
        .max(compute_cap(ledger.total_completed_count, cap));

    let milestone_reached = Milestone::detect(ledger.total_completed_count, new_streak, milestones);

    Ok(GainOutcome {
        momentum_gained: gain,
        new_value: ledger.current_value,
        new_max_value: ledger.max_value,
        streak_updated,
        new_streak,
        streak_broken,
        total_completed_count: ledger.total_completed_count,
        milestone_reached,
    })
}
