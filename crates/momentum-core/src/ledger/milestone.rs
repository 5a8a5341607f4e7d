//! Milestone detection for gain events.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneConfig {
    /// A completion-count milestone fires every this many completions
    #[serde(default = "default_completion_interval")]
    pub completion_interval: u32,
    /// Streak lengths (days) that count as milestones
    #[serde(default = "default_streak_days")]
    pub streak_days: Vec<u32>,
}

fn default_completion_interval() -> u32 {
    10
}
fn default_streak_days() -> Vec<u32> {
    vec![7, 30]
}

impl Default for MilestoneConfig {
    fn default() -> Self {
        Self {
            completion_interval: default_completion_interval(),
            streak_days: default_streak_days(),
        }
    }
}

/// A notable threshold crossed by a single gain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Milestone {
    TasksCompleted(u32),
    Streak(u32),
}

impl Milestone {
    /// Pick the milestone for a gain, if any.
    ///
    /// Streak milestones win over completion-count milestones whenever the
    /// streak sits on a milestone length. Only one milestone is reported.
    pub fn detect(
        total_completed_count: u32,
        new_streak: u32,
        config: &MilestoneConfig,
    ) -> Option<Self> {
        if config.streak_days.contains(&new_streak) {
            return Some(Milestone::Streak(new_streak));
        }
        if config.completion_interval > 0
            && total_completed_count > 0
            && total_completed_count % config.completion_interval == 0
        {
            return Some(Milestone::TasksCompleted(total_completed_count));
        }
        None
    }

    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Milestone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Milestone::TasksCompleted(n) => write!(f, "{n} tasks completed!"),
            Milestone::Streak(days) => write!(f, "{days}-day streak achieved!"),
        }
    }
}
