//! Momentum ledger operations over a [`LedgerStore`].
//!
//! Every mutating operation is a read-modify-write of the user's ledger
//! row. The write is a compare-and-swap on the row version; when another
//! writer got there first the whole operation is recomputed from a fresh
//! read, up to `store.max_write_attempts` times. Any other store failure
//! is surfaced to the caller untouched.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::error::{MomentumError, Result, StoreError, ValidationError};
use crate::ledger::{self, DecayResult, GainOutcome, MomentumLedger, StreakUpdate};
use crate::storage::Config;
use crate::store::{LedgerPatch, LedgerStore};
use crate::suggest::{Suggestion, SuggestionGenerator};
use crate::work::{WorkItemFilter, WorkItemSource};

/// Momentum operations for any ledger store.
pub struct MomentumService<S> {
    store: S,
    config: Config,
    generator: SuggestionGenerator,
}

impl<S: LedgerStore> MomentumService<S> {
    /// Service with default configuration.
    pub fn new(store: S) -> Self {
        Self::with_config(store, Config::default())
    }

    pub fn with_config(store: S, config: Config) -> Self {
        let generator = SuggestionGenerator::with_config(config.suggestions.clone());
        Self {
            store,
            config,
            generator,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fetch the user's ledger.
    ///
    /// # Errors
    /// [`MomentumError::LedgerNotFound`] when the user has none yet.
    pub fn ledger(&self, user_id: &str) -> Result<MomentumLedger> {
        self.store
            .get(user_id)
            .map_err(MomentumError::StoreReadFailed)?
            .ok_or_else(|| MomentumError::LedgerNotFound {
                user_id: user_id.to_string(),
            })
    }

    /// Fetch the user's ledger, creating a fresh one on first use.
    pub fn get_or_create(&self, user_id: &str, now: DateTime<Utc>) -> Result<MomentumLedger> {
        if let Some(existing) = self.store.get(user_id).map_err(MomentumError::StoreReadFailed)? {
            return Ok(existing);
        }

        let fresh = MomentumLedger::new(user_id, now, &self.config.cap, &self.config.decay);
        match self.store.insert(&fresh) {
            Ok(()) => {
                info!(user_id, max_value = fresh.max_value, "created momentum ledger");
                Ok(fresh)
            }
            // Someone else created it between our read and insert
            Err(StoreError::AlreadyExists(_)) => self.ledger(user_id),
            Err(e) => Err(MomentumError::StoreWriteFailed(e)),
        }
    }

    /// Apply any whole decay periods elapsed since the ledger's watermark.
    ///
    /// The watermark advances to `now` only when decay was applied, so
    /// frequent calls still accumulate toward the next whole period.
    pub fn apply_decay(&self, user_id: &str, now: DateTime<Utc>) -> Result<DecayResult> {
        let decay_config = &self.config.decay;
        let result = self.read_modify_write(user_id, |current| {
            let hours = ledger::hours_between(current.last_decay_at, now);
            let result = ledger::compute_decay(current, hours, decay_config)?;
            if result.applied {
                current.current_value = result.new_value;
                current.last_decay_at = now;
            }
            Ok(result)
        })?;

        if result.applied {
            info!(
                user_id,
                previous = result.previous_value,
                new = result.new_value,
                periods = result.periods_elapsed,
                "momentum decayed"
            );
        }
        Ok(result)
    }

    /// Record a qualifying action on `today` against the user's streak.
    pub fn update_streak(&self, user_id: &str, today: NaiveDate) -> Result<StreakUpdate> {
        let update =
            self.read_modify_write(user_id, |current| Ok(ledger::advance_streak(current, today)))?;
        if update.streak_broken {
            info!(user_id, "streak broken, restarting at 1");
        }
        Ok(update)
    }

    /// Credit one completed work item worth `momentum_gain`.
    ///
    /// Streak, value, completion count and cap are written together in a
    /// single compare-and-swap.
    ///
    /// # Errors
    /// [`MomentumError::InvalidInput`] for a negative gain, before any I/O.
    pub fn add_momentum(
        &self,
        user_id: &str,
        momentum_gain: i64,
        now: DateTime<Utc>,
    ) -> Result<GainOutcome> {
        if momentum_gain < 0 {
            return Err(ValidationError::NegativeGain(momentum_gain).into());
        }

        let today = now.date_naive();
        let (cap, milestones) = (&self.config.cap, &self.config.milestones);
        let outcome = self.read_modify_write(user_id, |current| {
            Ok(ledger::apply_gain(current, momentum_gain, today, cap, milestones)?)
        })?;

        if let Some(milestone) = &outcome.milestone_reached {
            info!(user_id, %milestone, "milestone reached");
        }
        debug!(
            user_id,
            gained = outcome.momentum_gained,
            value = outcome.new_value,
            streak = outcome.new_streak,
            "momentum added"
        );
        Ok(outcome)
    }

    /// Suggestions for the user's current ledger and work items on `today`.
    ///
    /// A streak that lapsed before `today` is presented to the generator as
    /// zero, so streak repair fires without waiting for the next action.
    pub fn suggestions<W>(
        &self,
        user_id: &str,
        source: &W,
        today: NaiveDate,
    ) -> Result<Vec<Suggestion>>
    where
        W: WorkItemSource + ?Sized,
    {
        let mut snapshot = self.ledger(user_id)?;
        snapshot.current_streak = snapshot.streak_on(today);
        let items = source
            .list(&WorkItemFilter::for_user(user_id))
            .map_err(MomentumError::StoreReadFailed)?;
        Ok(self.generator.generate(&snapshot, &items))
    }

    /// Run `apply` against a fresh copy of the ledger and persist the diff.
    ///
    /// `apply` may run more than once; it must only touch the ledger it is
    /// handed.
    fn read_modify_write<T>(
        &self,
        user_id: &str,
        mut apply: impl FnMut(&mut MomentumLedger) -> Result<T>,
    ) -> Result<T> {
        let attempts = self.config.store.max_write_attempts.max(1);

        for attempt in 1..=attempts {
            let before = self.ledger(user_id)?;
            let mut after = before.clone();
            let output = apply(&mut after)?;

            let patch = LedgerPatch::diff(&before, &after);
            if patch.is_empty() {
                return Ok(output);
            }

            match self.store.update(user_id, before.version, &patch) {
                Ok(_) => return Ok(output),
                Err(StoreError::Conflict { expected, actual, .. }) => {
                    debug!(user_id, attempt, expected, actual, "ledger write conflict, retrying");
                }
                Err(StoreError::NotFound(_)) => {
                    return Err(MomentumError::LedgerNotFound {
                        user_id: user_id.to_string(),
                    })
                }
                Err(e) => return Err(MomentumError::StoreWriteFailed(e)),
            }
        }

        warn!(user_id, attempts, "giving up on contended ledger");
        Err(MomentumError::ConcurrentModification {
            user_id: user_id.to_string(),
            attempts,
        })
    }
}
