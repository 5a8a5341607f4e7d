//! Momentum cap growth.
//!
//! The cap grows in fixed steps as lifetime completions cross milestones.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapConfig {
    #[serde(default = "default_base_max")]
    pub base_max: u32,
    #[serde(default = "default_bonus_per_milestone")]
    pub bonus_per_milestone: u32,
    /// Completions needed per cap step
    #[serde(default = "default_completions_per_milestone")]
    pub completions_per_milestone: u32,
}

fn default_base_max() -> u32 {
    100
}
fn default_bonus_per_milestone() -> u32 {
    10
}
fn default_completions_per_milestone() -> u32 {
    20
}

impl Default for CapConfig {
    fn default() -> Self {
        Self {
            base_max: default_base_max(),
            bonus_per_milestone: default_bonus_per_milestone(),
            completions_per_milestone: default_completions_per_milestone(),
        }
    }
}

/// Cap for a ledger with `total_completed_count` lifetime completions.
pub fn compute_cap(total_completed_count: u32, config: &CapConfig) -> u32 {
    if config.completions_per_milestone == 0 {
        return config.base_max;
    }
    let milestones = total_completed_count / config.completions_per_milestone;
    config
        .base_max
        .saturating_add(config.bonus_per_milestone.saturating_mul(milestones))
}
