//! Momentum nudges.
//!
//! Reads a ledger snapshot plus the user's work items and produces a ranked
//! list of suggestions. Pure: nothing here mutates the ledger or the items,
//! and the same snapshot always yields the same output.

use serde::{Deserialize, Serialize};

use crate::ledger::{Milestone, MomentumLedger};
use crate::work::{WorkItem, WorkItemStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    AntiDrop,
    StreakRepair,
    Boost,
    Milestone,
}

/// How soon a suggestion should be acted on. Ordered `Low < ... < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    pub urgency: Urgency,
    pub message: String,
    pub suggested_actions: Vec<String>,
    #[serde(default)]
    pub suggested_work_item_ids: Vec<String>,
}

/// Thresholds for the suggestion tiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionConfig {
    /// Below this percentage momentum is critical
    #[serde(default = "default_critical_below_pct")]
    pub critical_below_pct: f64,
    /// Below this percentage (and not critical) momentum is declining
    #[serde(default = "default_declining_below_pct")]
    pub declining_below_pct: f64,
    /// Minimum weight for a quick win in the critical tier
    #[serde(default = "default_critical_min_weight")]
    pub critical_min_weight: u32,
    /// Minimum weight for a ready item in the declining tier
    #[serde(default = "default_declining_min_weight")]
    pub declining_min_weight: u32,
    #[serde(default = "default_max_suggested_items")]
    pub max_suggested_items: usize,
    /// Longest streak that makes a broken streak worth repairing
    #[serde(default = "default_streak_repair_min_longest")]
    pub streak_repair_min_longest: u32,
    /// Consecutive completed sequence items needed for a boost
    #[serde(default = "default_min_sequence_run")]
    pub min_sequence_run: usize,
}

fn default_critical_below_pct() -> f64 {
    20.0
}
fn default_declining_below_pct() -> f64 {
    40.0
}
fn default_critical_min_weight() -> u32 {
    3
}
fn default_declining_min_weight() -> u32 {
    2
}
fn default_max_suggested_items() -> usize {
    3
}
fn default_streak_repair_min_longest() -> u32 {
    5
}
fn default_min_sequence_run() -> usize {
    3
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            critical_below_pct: default_critical_below_pct(),
            declining_below_pct: default_declining_below_pct(),
            critical_min_weight: default_critical_min_weight(),
            declining_min_weight: default_declining_min_weight(),
            max_suggested_items: default_max_suggested_items(),
            streak_repair_min_longest: default_streak_repair_min_longest(),
            min_sequence_run: default_min_sequence_run(),
        }
    }
}

/// Generator for momentum suggestions.
#[derive(Debug, Clone, Default)]
pub struct SuggestionGenerator {
    config: SuggestionConfig,
}

impl SuggestionGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SuggestionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SuggestionConfig {
        &self.config
    }

    /// Produce suggestions for a snapshot, most urgent first.
    ///
    /// Each tier is evaluated on its own and contributes at most one
    /// suggestion. Ties keep tier order.
    pub fn generate(&self, ledger: &MomentumLedger, items: &[WorkItem]) -> Vec<Suggestion> {
        let mut suggestions = Vec::new();

        if let Some(s) = self.anti_drop(ledger, items) {
            suggestions.push(s);
        }
        if let Some(s) = self.streak_repair(ledger) {
            suggestions.push(s);
        }
        if let Some(s) = self.sequence_boost(items) {
            suggestions.push(s);
        }

        suggestions.sort_by(|a, b| b.urgency.cmp(&a.urgency));
        suggestions
    }

    fn anti_drop(&self, ledger: &MomentumLedger, items: &[WorkItem]) -> Option<Suggestion> {
        let pct = ledger.momentum_percentage();

        if pct < self.config.critical_below_pct {
            let quick_wins = self.pick(items, |i| {
                i.is_pending()
                    && i.momentum_weight >= self.config.critical_min_weight
                    && i.depends_on.is_empty()
            });
            return Some(Suggestion {
                kind: SuggestionKind::AntiDrop,
                urgency: Urgency::Critical,
                message: format!(
                    "Momentum critically low ({}/{})",
                    ledger.current_value, ledger.max_value
                ),
                suggested_actions: vec![
                    "Complete a quick win task immediately".into(),
                    "Focus on high-momentum-value tasks".into(),
                    "Avoid starting new complex tasks".into(),
                ],
                suggested_work_item_ids: quick_wins,
            });
        }

        if pct < self.config.declining_below_pct {
            let ready = self.pick(items, |i| {
                i.is_pending() && i.momentum_weight >= self.config.declining_min_weight
            });
            return Some(Suggestion {
                kind: SuggestionKind::AntiDrop,
                urgency: Urgency::High,
                message: "Momentum declining - act now to prevent further drop".into(),
                suggested_actions: vec![
                    "Complete 2-3 tasks to rebuild momentum".into(),
                    "Choose medium-difficulty tasks for best results".into(),
                ],
                suggested_work_item_ids: ready,
            });
        }

        None
    }

    fn streak_repair(&self, ledger: &MomentumLedger) -> Option<Suggestion> {
        if ledger.current_streak != 0
            || ledger.longest_streak < self.config.streak_repair_min_longest
        {
            return None;
        }
        Some(Suggestion {
            kind: SuggestionKind::StreakRepair,
            urgency: Urgency::Medium,
            message: format!(
                "You had a {}-day streak. Start a new one today!",
                ledger.longest_streak
            ),
            suggested_actions: vec![
                "Complete any task today to start rebuilding your streak".into(),
                "Set a daily reminder to maintain consistency".into(),
            ],
            suggested_work_item_ids: Vec::new(),
        })
    }

    fn sequence_boost(&self, items: &[WorkItem]) -> Option<Suggestion> {
        let run = longest_completed_run(items);
        if run.is_empty() || run.len() < self.config.min_sequence_run {
            return None;
        }
        Some(Suggestion {
            kind: SuggestionKind::Boost,
            urgency: Urgency::Low,
            message: format!("Sequence completed! {} work items done in order.", run.len()),
            suggested_actions: vec!["Start the next sequence for continued momentum".into()],
            suggested_work_item_ids: run,
        })
    }

    /// Ids of the first matching items, in input order.
    fn pick(&self, items: &[WorkItem], pred: impl Fn(&WorkItem) -> bool) -> Vec<String> {
        items
            .iter()
            .filter(|i| pred(i))
            .take(self.config.max_suggested_items)
            .map(|i| i.id.clone())
            .collect()
    }
}

/// Longest run of done items whose `sequence_order` values are consecutive.
///
/// Returns the ids in sequence order. The earliest run wins a tie.
fn longest_completed_run(items: &[WorkItem]) -> Vec<String> {
    let mut done: Vec<(i64, &WorkItem)> = items
        .iter()
        .filter(|i| i.status == WorkItemStatus::Done)
        .filter_map(|i| i.sequence_order.map(|o| (o, i)))
        .collect();
    done.sort_by_key(|(order, _)| *order);

    let mut best: &[(i64, &WorkItem)] = &[];
    let mut start = 0;
    for end in 1..=done.len() {
        let breaks = end == done.len() || done[end].0 != done[end - 1].0 + 1;
        if breaks {
            if end - start > best.len() {
                best = &done[start..end];
            }
            start = end;
        }
    }

    best.iter().map(|(_, i)| i.id.clone()).collect()
}

impl Milestone {
    /// Celebrate a milestone reached by a gain.
    pub fn to_suggestion(&self) -> Suggestion {
        let next = match self {
            Milestone::TasksCompleted(_) => "Keep the pace: pick your next task now",
            Milestone::Streak(_) => "Come back tomorrow to extend your streak",
        };
        Suggestion {
            kind: SuggestionKind::Milestone,
            urgency: Urgency::Low,
            message: self.message(),
            suggested_actions: vec![next.into()],
            suggested_work_item_ids: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{CapConfig, DecayConfig};
    use chrono::Utc;

    fn ledger(value: u32) -> MomentumLedger {
        let mut l =
            MomentumLedger::new("u1", Utc::now(), &CapConfig::default(), &DecayConfig::default());
        l.current_value = value;
        l
    }

    fn item(id: &str, weight: u32) -> WorkItem {
        let mut i = WorkItem::new("u1", id, weight);
        i.id = id.into();
        i
    }

    fn done_in_sequence(id: &str, order: i64) -> WorkItem {
        let mut i = item(id, 1);
        i.status = WorkItemStatus::Done;
        i.sequence_order = Some(order);
        i
    }

    #[test]
    fn healthy_momentum_yields_nothing() {
        let generator = SuggestionGenerator::new();
        assert!(generator.generate(&ledger(80), &[item("a", 5)]).is_empty());
    }

    #[test]
    fn critical_tier_picks_quick_wins() {
        let mut blocked_dep = item("dep", 5);
        blocked_dep.depends_on = vec!["a".into()];
        let mut done = item("done", 5);
        done.status = WorkItemStatus::Done;
        let items = vec![
            item("light", 2),
            blocked_dep,
            done,
            item("a", 3),
            item("b", 4),
            item("c", 9),
            item("d", 6),
        ];

        let suggestions = SuggestionGenerator::new().generate(&ledger(10), &items);
        assert_eq!(suggestions.len(), 1);
        let s = &suggestions[0];
        assert_eq!(s.kind, SuggestionKind::AntiDrop);
        assert_eq!(s.urgency, Urgency::Critical);
        assert_eq!(s.message, "Momentum critically low (10/100)");
        assert_eq!(s.suggested_work_item_ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn twenty_percent_is_high_not_critical() {
        let items = vec![item("a", 2), item("b", 1)];
        let suggestions = SuggestionGenerator::new().generate(&ledger(20), &items);

        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].urgency, Urgency::High);
        assert_eq!(suggestions[0].suggested_work_item_ids, vec!["a"]);
    }

    #[test]
    fn forty_percent_is_healthy() {
        assert!(SuggestionGenerator::new().generate(&ledger(40), &[]).is_empty());
    }

    #[test]
    fn streak_repair_when_long_streak_lost() {
        let mut l = ledger(90);
        l.current_streak = 0;
        l.longest_streak = 5;

        let suggestions = SuggestionGenerator::new().generate(&l, &[]);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].kind, SuggestionKind::StreakRepair);
        assert_eq!(suggestions[0].urgency, Urgency::Medium);
        assert!(suggestions[0].suggested_work_item_ids.is_empty());
        assert!(suggestions[0].message.contains("5-day streak"));

        l.longest_streak = 4;
        assert!(SuggestionGenerator::new().generate(&l, &[]).is_empty());
    }

    #[test]
    fn boost_needs_consecutive_run() {
        let items = vec![
            done_in_sequence("s3", 3),
            done_in_sequence("s1", 1),
            done_in_sequence("s2", 2),
            done_in_sequence("s7", 7),
        ];
        let suggestions = SuggestionGenerator::new().generate(&ledger(90), &items);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].kind, SuggestionKind::Boost);
        assert_eq!(suggestions[0].urgency, Urgency::Low);
        assert_eq!(suggestions[0].suggested_work_item_ids, vec!["s1", "s2", "s3"]);

        let gapped = vec![
            done_in_sequence("s1", 1),
            done_in_sequence("s2", 2),
            done_in_sequence("s4", 4),
        ];
        assert!(SuggestionGenerator::new().generate(&ledger(90), &gapped).is_empty());
    }

    #[test]
    fn pending_sequence_items_do_not_boost() {
        let mut pending = done_in_sequence("s2", 2);
        pending.status = WorkItemStatus::Pending;
        let items = vec![done_in_sequence("s1", 1), pending, done_in_sequence("s3", 3)];
        assert!(SuggestionGenerator::new().generate(&ledger(90), &items).is_empty());
    }

    #[test]
    fn multiple_tiers_ranked_by_urgency() {
        let mut l = ledger(5);
        l.longest_streak = 9;
        let items = vec![
            done_in_sequence("s1", 1),
            done_in_sequence("s2", 2),
            done_in_sequence("s3", 3),
            item("a", 4),
        ];

        let kinds: Vec<_> = SuggestionGenerator::new()
            .generate(&l, &items)
            .into_iter()
            .map(|s| (s.kind, s.urgency))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (SuggestionKind::AntiDrop, Urgency::Critical),
                (SuggestionKind::StreakRepair, Urgency::Medium),
                (SuggestionKind::Boost, Urgency::Low),
            ]
        );
    }

    #[test]
    fn generation_is_idempotent() {
        let l = ledger(25);
        let items = vec![item("a", 2), item("b", 3)];
        let generator = SuggestionGenerator::new();
        let snapshot = (l.clone(), items.clone());

        let first = generator.generate(&l, &items);
        let second = generator.generate(&l, &items);
        assert_eq!(first, second);
        assert_eq!((l, items), snapshot);
    }

    #[test]
    fn milestone_suggestion() {
        let s = Milestone::Streak(7).to_suggestion();
        assert_eq!(s.kind, SuggestionKind::Milestone);
        assert_eq!(s.urgency, Urgency::Low);
        assert_eq!(s.message, "7-day streak achieved!");
    }

    #[test]
    fn urgency_ordering() {
        assert!(Urgency::Critical > Urgency::High);
        assert!(Urgency::High > Urgency::Medium);
        assert!(Urgency::Medium > Urgency::Low);
    }
}
