//! Daily-return streak tracking.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::MomentumLedger;

/// Result of advancing a streak for a given day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakUpdate {
    /// False when the user already acted today
    pub streak_updated: bool,
    pub new_streak: u32,
    /// True when a gap of two or more days reset the streak
    pub streak_broken: bool,
}

/// Advance the ledger's streak for an action on `today`.
///
/// Mutates the in-memory ledger only. Multiple actions on the same day do
/// not inflate the streak. A `last_action_date` after `today` is treated
/// like an action already recorded today.
pub fn advance_streak(ledger: &mut MomentumLedger, today: NaiveDate) -> StreakUpdate {
    let Some(last) = ledger.last_action_date else {
        ledger.last_action_date = Some(today);
        ledger.current_streak = 1;
        ledger.longest_streak = ledger.longest_streak.max(1);
        return StreakUpdate {
            streak_updated: true,
            new_streak: 1,
            streak_broken: false,
        };
    };

    if last >= today {
        return StreakUpdate {
            streak_updated: false,
            new_streak: ledger.current_streak,
            streak_broken: false,
        };
    }

    let (new_streak, streak_broken) = if last == today - Duration::days(1) {
        (ledger.current_streak.saturating_add(1), false)
    } else {
        (1, true)
    };

    ledger.current_streak = new_streak;
    ledger.longest_streak = ledger.longest_streak.max(new_streak);
    ledger.last_action_date = Some(today);

    StreakUpdate {
        streak_updated: true,
        new_streak,
        streak_broken,
    }
}
