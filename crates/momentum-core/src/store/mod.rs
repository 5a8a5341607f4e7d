//! Ledger persistence seam.
//!
//! A [`LedgerStore`] is a single-row read/modify/write store keyed by user.
//! Writes are compare-and-swap on the ledger's `version`, which gives the
//! service single-writer-at-a-time semantics per user without a lock.

mod memory;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::StoreError;
use crate::ledger::MomentumLedger;

pub use memory::MemoryStore;

/// Retry policy for conflicting writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Read-modify-write attempts before giving up on a contended ledger
    #[serde(default = "default_max_write_attempts")]
    pub max_write_attempts: u32,
}

fn default_max_write_attempts() -> u32 {
    5
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_write_attempts: default_max_write_attempts(),
        }
    }
}

/// Partial update of a ledger. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerPatch {
    pub current_value: Option<u32>,
    pub max_value: Option<u32>,
    pub decay_rate_per_period: Option<f64>,
    pub last_decay_at: Option<DateTime<Utc>>,
    pub last_action_date: Option<NaiveDate>,
    pub current_streak: Option<u32>,
    pub longest_streak: Option<u32>,
    pub total_completed_count: Option<u32>,
}

impl LedgerPatch {
    /// Fields that differ between `before` and `after`.
    pub fn diff(before: &MomentumLedger, after: &MomentumLedger) -> Self {
        fn changed<T: PartialEq + Copy>(a: T, b: T) -> Option<T> {
            (a != b).then_some(b)
        }

        Self {
            current_value: changed(before.current_value, after.current_value),
            max_value: changed(before.max_value, after.max_value),
            decay_rate_per_period: changed(before.decay_rate_per_period, after.decay_rate_per_period),
            last_decay_at: changed(before.last_decay_at, after.last_decay_at),
            last_action_date: changed(before.last_action_date, after.last_action_date).flatten(),
            current_streak: changed(before.current_streak, after.current_streak),
            longest_streak: changed(before.longest_streak, after.longest_streak),
            total_completed_count: changed(before.total_completed_count, after.total_completed_count),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Write the patched fields into `ledger`.
    pub fn apply_to(&self, ledger: &mut MomentumLedger) {
        if let Some(v) = self.current_value {
            ledger.current_value = v;
        }
        if let Some(v) = self.max_value {
            ledger.max_value = v;
        }
        if let Some(v) = self.decay_rate_per_period {
            ledger.decay_rate_per_period = v;
        }
        if let Some(v) = self.last_decay_at {
            ledger.last_decay_at = v;
        }
        if let Some(v) = self.last_action_date {
            ledger.last_action_date = Some(v);
        }
        if let Some(v) = self.current_streak {
            ledger.current_streak = v;
        }
        if let Some(v) = self.longest_streak {
            ledger.longest_streak = v;
        }
        if let Some(v) = self.total_completed_count {
            ledger.total_completed_count = v;
        }
    }
}

/// Persistent storage for momentum ledgers.
pub trait LedgerStore {
    /// Fetch the ledger for `user_id`, if one exists.
    fn get(&self, user_id: &str) -> Result<Option<MomentumLedger>, StoreError>;

    /// Insert a new ledger. Fails with [`StoreError::AlreadyExists`] if the
    /// user already has one.
    fn insert(&self, ledger: &MomentumLedger) -> Result<(), StoreError>;

    /// Apply `patch` if the stored version still equals `expected_version`.
    ///
    /// Returns the new version. A moved version is [`StoreError::Conflict`],
    /// a missing row [`StoreError::NotFound`].
    fn update(
        &self,
        user_id: &str,
        expected_version: u64,
        patch: &LedgerPatch,
    ) -> Result<u64, StoreError>;
}

impl<S: LedgerStore + ?Sized> LedgerStore for &S {
    fn get(&self, user_id: &str) -> Result<Option<MomentumLedger>, StoreError> {
        (**self).get(user_id)
    }

    fn insert(&self, ledger: &MomentumLedger) -> Result<(), StoreError> {
        (**self).insert(ledger)
    }

    fn update(
        &self,
        user_id: &str,
        expected_version: u64,
        patch: &LedgerPatch,
    ) -> Result<u64, StoreError> {
        (**self).update(user_id, expected_version, patch)
    }
}

impl<S: LedgerStore + ?Sized> LedgerStore for Arc<S> {
    fn get(&self, user_id: &str) -> Result<Option<MomentumLedger>, StoreError> {
        (**self).get(user_id)
    }

    fn insert(&self, ledger: &MomentumLedger) -> Result<(), StoreError> {
        (**self).insert(ledger)
    }

    fn update(
        &self,
        user_id: &str,
        expected_version: u64,
        patch: &LedgerPatch,
    ) -> Result<u64, StoreError> {
        (**self).update(user_id, expected_version, patch)
    }
}
