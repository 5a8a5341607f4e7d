//! Periodic momentum decay.
//!
//! Decay is counted in whole periods since the ledger's watermark. Partial
//! periods are dropped, not carried: the caller advances the watermark to
//! "now" whenever decay is applied.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::MomentumLedger;
use crate::error::ValidationError;

/// Configuration for decay behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecayConfig {
    /// Length of one decay period in hours
    #[serde(default = "default_period_hours")]
    pub period_hours: f64,
    /// Decay rate given to newly created ledgers
    #[serde(default = "default_rate_per_period")]
    pub default_rate_per_period: f64,
}

fn default_period_hours() -> f64 {
    6.0
}
fn default_rate_per_period() -> f64 {
    5.0
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            period_hours: default_period_hours(),
            default_rate_per_period: default_rate_per_period(),
        }
    }
}

/// Outcome of a decay computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecayResult {
    pub previous_value: u32,
    pub new_value: u32,
    pub decay_amount: u32,
    pub periods_elapsed: u64,
    pub applied: bool,
}

/// Compute the decayed momentum value for `hours_since_last_decay`.
///
/// # Errors
/// Returns [`ValidationError::InvalidElapsedHours`] for negative or
/// non-finite input.
pub fn compute_decay(
    ledger: &MomentumLedger,
    hours_since_last_decay: f64,
    config: &DecayConfig,
) -> Result<DecayResult, ValidationError> {
    if !hours_since_last_decay.is_finite() || hours_since_last_decay < 0.0 {
        return Err(ValidationError::InvalidElapsedHours(hours_since_last_decay));
    }
    if !config.period_hours.is_finite() || config.period_hours <= 0.0 {
        return Err(ValidationError::InvalidValue {
            field: "decay.period_hours".into(),
            message: format!("must be > 0, got {}", config.period_hours),
        });
    }

    let previous_value = ledger.current_value;
    let periods_elapsed = (hours_since_last_decay / config.period_hours).floor() as u64;

    if periods_elapsed == 0 {
        return Ok(DecayResult {
            previous_value,
            new_value: previous_value,
            decay_amount: 0,
            periods_elapsed,
            applied: false,
        });
    }

    let decay_per_period = ledger.decay_rate_per_period.max(1.0);
    let total_decay = decay_per_period * periods_elapsed as f64;
    let new_value = (f64::from(previous_value) - total_decay).max(0.0).round();

    Ok(DecayResult {
        previous_value,
        new_value: new_value as u32,
        decay_amount: total_decay.round().min(f64::from(u32::MAX)) as u32,
        periods_elapsed,
        applied: true,
    })
}

/// Fractional hours from `from` to `to`. Negative when `to` is earlier.
pub fn hours_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 3_600_000.0
}
