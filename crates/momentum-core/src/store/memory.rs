//! In-process ledger store.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;

use super::{LedgerPatch, LedgerStore};
use crate::error::StoreError;
use crate::ledger::MomentumLedger;

/// Ledger store backed by a mutex-guarded map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<HashMap<String, MomentumLedger>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn rows(&self) -> Result<MutexGuard<'_, HashMap<String, MomentumLedger>>, StoreError> {
        self.rows
            .lock()
            .map_err(|_| StoreError::QueryFailed("memory store mutex poisoned".into()))
    }
}

impl LedgerStore for MemoryStore {
    fn get(&self, user_id: &str) -> Result<Option<MomentumLedger>, StoreError> {
        Ok(self.rows()?.get(user_id).cloned())
    }

    fn insert(&self, ledger: &MomentumLedger) -> Result<(), StoreError> {
        let mut rows = self.rows()?;
        if rows.contains_key(&ledger.user_id) {
            return Err(StoreError::AlreadyExists(ledger.user_id.clone()));
        }
        rows.insert(ledger.user_id.clone(), ledger.clone());
        Ok(())
    }

    fn update(
        &self,
        user_id: &str,
        expected_version: u64,
        patch: &LedgerPatch,
    ) -> Result<u64, StoreError> {
        let mut rows = self.rows()?;
        let row = rows
            .get_mut(user_id)
            .ok_or_else(|| StoreError::NotFound(user_id.to_string()))?;
        if row.version != expected_version {
            return Err(StoreError::Conflict {
                user_id: user_id.to_string(),
                expected: expected_version,
                actual: row.version,
            });
        }
        patch.apply_to(row);
        row.version += 1;
        row.updated_at = Utc::now();
        Ok(row.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{CapConfig, DecayConfig};

    fn ledger(user: &str) -> MomentumLedger {
        MomentumLedger::new(user, Utc::now(), &CapConfig::default(), &DecayConfig::default())
    }

    #[test]
    fn insert_and_get() {
        let store = MemoryStore::new();
        assert!(store.get("u1").unwrap().is_none());

        store.insert(&ledger("u1")).unwrap();
        assert_eq!(store.get("u1").unwrap().unwrap().user_id, "u1");
        assert!(matches!(store.insert(&ledger("u1")), Err(StoreError::AlreadyExists(_))));
    }

    #[test]
    fn update_is_compare_and_swap() {
        let store = MemoryStore::new();
        store.insert(&ledger("u1")).unwrap();

        let patch = LedgerPatch {
            current_value: Some(7),
            ..Default::default()
        };
        assert_eq!(store.update("u1", 0, &patch).unwrap(), 1);
        assert_eq!(store.get("u1").unwrap().unwrap().current_value, 7);

        let err = store.update("u1", 0, &patch).unwrap_err();
        assert!(matches!(err, StoreError::Conflict { expected: 0, actual: 1, .. }));
    }

    #[test]
    fn update_missing_row() {
        let store = MemoryStore::new();
        let err = store.update("ghost", 0, &LedgerPatch::default()).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
