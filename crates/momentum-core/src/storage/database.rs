//! SQLite-based ledger and work-item storage.
//!
//! Provides persistent storage for:
//! - Momentum ledgers (one row per user, compare-and-swap on `version`)
//! - Work items read by the suggestion generator

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::{data_dir, migrations};
use crate::error::{MomentumError, StoreError};
use crate::ledger::MomentumLedger;
use crate::store::{LedgerPatch, LedgerStore};
use crate::work::{WorkItem, WorkItemFilter, WorkItemSource, WorkItemStatus};

const LEDGER_COLUMNS: &str = "user_id, current_value, max_value, decay_rate_per_period,
    last_decay_at, last_action_date, current_streak, longest_streak,
    total_completed_count, version, created_at, updated_at";

const WORK_ITEM_COLUMNS: &str = "id, user_id, title, status, momentum_weight, depends_on,
    sequence_order, created_at, completed_at";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// SQLite database for ledgers and work items.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `<data_dir>/momentum.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StoreError> {
        let dir = data_dir().map_err(|e| StoreError::QueryFailed(e.to_string()))?;
        Self::open_at(&dir.join("momentum.db"))
    }

    /// Open (or create) the database file at `path`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        migrations::migrate(&conn).map_err(|e| StoreError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Insert a new work item.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn create_work_item(&self, item: &WorkItem) -> Result<(), StoreError> {
        let depends_on = serde_json::to_string(&item.depends_on).map_err(|e| StoreError::Corrupt {
            column: "depends_on".into(),
            message: e.to_string(),
        })?;
        self.conn.execute(
            "INSERT INTO work_items (id, user_id, title, status, momentum_weight, depends_on,
                                     sequence_order, created_at, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                item.id,
                item.user_id,
                item.title,
                item.status.as_str(),
                item.momentum_weight,
                depends_on,
                item.sequence_order,
                item.created_at.to_rfc3339(),
                item.completed_at.map(|t| t.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    /// Fetch a work item by id.
    pub fn get_work_item(&self, id: &str) -> Result<Option<WorkItem>, StoreError> {
        let sql = format!("SELECT {WORK_ITEM_COLUMNS} FROM work_items WHERE id = ?1");
        Ok(self
            .conn
            .query_row(&sql, params![id], work_item_from_row)
            .optional()?)
    }

    /// Mark a pending work item done and return it.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] for an unknown id and
    /// [`StoreError::InvalidState`] when the item is not pending.
    pub fn complete_work_item(&self, id: &str, now: DateTime<Utc>) -> Result<WorkItem, StoreError> {
        let changed = self.conn.execute(
            "UPDATE work_items SET status = 'done', completed_at = ?1
             WHERE id = ?2 AND status = 'pending'",
            params![now.to_rfc3339(), id],
        )?;

        let item = self
            .get_work_item(id)?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if changed == 0 {
            return Err(StoreError::InvalidState(format!(
                "Work item '{id}' is {}, not pending",
                item.status
            )));
        }
        Ok(item)
    }

    /// Mark a pending work item done and run `credit` for it, atomically.
    ///
    /// Both happen inside one transaction on this connection, so writes
    /// `credit` makes through this database commit or roll back together
    /// with the completion. When `credit` fails the item stays pending.
    pub fn complete_work_item_with<T>(
        &self,
        id: &str,
        now: DateTime<Utc>,
        credit: impl FnOnce(&WorkItem) -> Result<T, MomentumError>,
    ) -> Result<(WorkItem, T), MomentumError> {
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|e| MomentumError::StoreWriteFailed(e.into()))?;

        let item = self
            .complete_work_item(id, now)
            .map_err(MomentumError::StoreWriteFailed)?;
        let credited = credit(&item)?;

        tx.commit()
            .map_err(|e| MomentumError::StoreWriteFailed(e.into()))?;
        Ok((item, credited))
    }
}

impl LedgerStore for Database {
    fn get(&self, user_id: &str) -> Result<Option<MomentumLedger>, StoreError> {
        let sql = format!("SELECT {LEDGER_COLUMNS} FROM momentum_ledgers WHERE user_id = ?1");
        Ok(self
            .conn
            .query_row(&sql, params![user_id], ledger_from_row)
            .optional()?)
    }

    fn insert(&self, ledger: &MomentumLedger) -> Result<(), StoreError> {
        let result = self.conn.execute(
            &format!(
                "INSERT INTO momentum_ledgers ({LEDGER_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
            ),
            params![
                ledger.user_id,
                ledger.current_value,
                ledger.max_value,
                ledger.decay_rate_per_period,
                ledger.last_decay_at.to_rfc3339(),
                ledger.last_action_date.map(|d| d.format(DATE_FORMAT).to_string()),
                ledger.current_streak,
                ledger.longest_streak,
                ledger.total_completed_count,
                version_to_sql(ledger.version),
                ledger.created_at.to_rfc3339(),
                ledger.updated_at.to_rfc3339(),
            ],
        );
        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::AlreadyExists(ledger.user_id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn update(
        &self,
        user_id: &str,
        expected_version: u64,
        patch: &LedgerPatch,
    ) -> Result<u64, StoreError> {
        let mut assignments: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(v) = patch.current_value {
            assignments.push("current_value = ?");
            values.push(Value::Integer(i64::from(v)));
        }
        if let Some(v) = patch.max_value {
            assignments.push("max_value = ?");
            values.push(Value::Integer(i64::from(v)));
        }
        if let Some(v) = patch.decay_rate_per_period {
            assignments.push("decay_rate_per_period = ?");
            values.push(Value::Real(v));
        }
        if let Some(v) = patch.last_decay_at {
            assignments.push("last_decay_at = ?");
            values.push(Value::Text(v.to_rfc3339()));
        }
        if let Some(v) = patch.last_action_date {
            assignments.push("last_action_date = ?");
            values.push(Value::Text(v.format(DATE_FORMAT).to_string()));
        }
        if let Some(v) = patch.current_streak {
            assignments.push("current_streak = ?");
            values.push(Value::Integer(i64::from(v)));
        }
        if let Some(v) = patch.longest_streak {
            assignments.push("longest_streak = ?");
            values.push(Value::Integer(i64::from(v)));
        }
        if let Some(v) = patch.total_completed_count {
            assignments.push("total_completed_count = ?");
            values.push(Value::Integer(i64::from(v)));
        }
        assignments.push("version = version + 1");
        assignments.push("updated_at = ?");
        values.push(Value::Text(Utc::now().to_rfc3339()));

        values.push(Value::Text(user_id.to_string()));
        values.push(Value::Integer(version_to_sql(expected_version)));

        let sql = format!(
            "UPDATE momentum_ledgers SET {} WHERE user_id = ? AND version = ?",
            assignments.join(", ")
        );
        let changed = self.conn.execute(&sql, params_from_iter(values))?;
        if changed == 1 {
            return Ok(expected_version + 1);
        }

        let actual: Option<i64> = self
            .conn
            .query_row(
                "SELECT version FROM momentum_ledgers WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()?;
        match actual {
            None => Err(StoreError::NotFound(user_id.to_string())),
            Some(actual) => Err(StoreError::Conflict {
                user_id: user_id.to_string(),
                expected: expected_version,
                actual: version_from_sql(actual),
            }),
        }
    }
}

impl WorkItemSource for Database {
    fn list(&self, filter: &WorkItemFilter) -> Result<Vec<WorkItem>, StoreError> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();
        if let Some(user_id) = &filter.user_id {
            clauses.push("user_id = ?");
            values.push(Value::Text(user_id.clone()));
        }
        if let Some(status) = filter.status {
            clauses.push("status = ?");
            values.push(Value::Text(status.as_str().to_string()));
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };
        let sql = format!("SELECT {WORK_ITEM_COLUMNS} FROM work_items {where_clause} ORDER BY rowid");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), work_item_from_row)?;
        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok(items)
    }
}

fn version_to_sql(version: u64) -> i64 {
    i64::try_from(version).unwrap_or(i64::MAX)
}

fn version_from_sql(version: i64) -> u64 {
    u64::try_from(version).unwrap_or(0)
}

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn parse_optional_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| conversion_error(idx, e))
    })
    .transpose()
}

fn ledger_from_row(row: &Row<'_>) -> rusqlite::Result<MomentumLedger> {
    let last_action_date: Option<String> = row.get(5)?;
    let last_action_date = last_action_date
        .map(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT).map_err(|e| conversion_error(5, e)))
        .transpose()?;

    Ok(MomentumLedger {
        user_id: row.get(0)?,
        current_value: row.get(1)?,
        max_value: row.get(2)?,
        decay_rate_per_period: row.get(3)?,
        last_decay_at: parse_timestamp(row, 4)?,
        last_action_date,
        current_streak: row.get(6)?,
        longest_streak: row.get(7)?,
        total_completed_count: row.get(8)?,
        version: version_from_sql(row.get(9)?),
        created_at: parse_timestamp(row, 10)?,
        updated_at: parse_timestamp(row, 11)?,
    })
}

fn work_item_from_row(row: &Row<'_>) -> rusqlite::Result<WorkItem> {
    let status: String = row.get(3)?;
    let status = status.parse::<WorkItemStatus>().map_err(|e| {
        conversion_error(3, std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })?;
    let depends_on: String = row.get(5)?;
    let depends_on: Vec<String> =
        serde_json::from_str(&depends_on).map_err(|e| conversion_error(5, e))?;

    Ok(WorkItem {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        status,
        momentum_weight: row.get(4)?,
        depends_on,
        sequence_order: row.get(6)?,
        created_at: parse_timestamp(row, 7)?,
        completed_at: parse_optional_timestamp(row, 8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{CapConfig, DecayConfig};
    use chrono::Duration;

    fn ledger(user: &str) -> MomentumLedger {
        MomentumLedger::new(user, Utc::now(), &CapConfig::default(), &DecayConfig::default())
    }

    #[test]
    fn ledger_insert_and_get() {
        let db = Database::open_memory().unwrap();
        assert!(db.get("u1").unwrap().is_none());

        let mut l = ledger("u1");
        l.last_action_date = NaiveDate::from_ymd_opt(2024, 3, 10);
        l.decay_rate_per_period = 2.5;
        db.insert(&l).unwrap();

        let loaded = db.get("u1").unwrap().unwrap();
        assert_eq!(loaded.last_action_date, l.last_action_date);
        assert_eq!(loaded.decay_rate_per_period, 2.5);
        assert_eq!(loaded.max_value, 100);
        assert_eq!(loaded.version, 0);
        // RFC 3339 keeps sub-second precision
        assert_eq!(loaded.last_decay_at, l.last_decay_at);
    }

    #[test]
    fn duplicate_ledger_rejected() {
        let db = Database::open_memory().unwrap();
        db.insert(&ledger("u1")).unwrap();
        assert!(matches!(db.insert(&ledger("u1")), Err(StoreError::AlreadyExists(_))));
    }

    #[test]
    fn update_applies_patch_and_bumps_version() {
        let db = Database::open_memory().unwrap();
        db.insert(&ledger("u1")).unwrap();

        let when = Utc::now() + Duration::hours(12);
        let patch = LedgerPatch {
            current_value: Some(42),
            last_decay_at: Some(when),
            last_action_date: NaiveDate::from_ymd_opt(2024, 3, 11),
            current_streak: Some(3),
            ..Default::default()
        };
        assert_eq!(db.update("u1", 0, &patch).unwrap(), 1);

        let loaded = db.get("u1").unwrap().unwrap();
        assert_eq!(loaded.current_value, 42);
        assert_eq!(loaded.last_decay_at, when);
        assert_eq!(loaded.current_streak, 3);
        assert_eq!(loaded.longest_streak, 0);
        assert_eq!(loaded.version, 1);
    }

    #[test]
    fn stale_version_conflicts() {
        let db = Database::open_memory().unwrap();
        db.insert(&ledger("u1")).unwrap();
        let patch = LedgerPatch {
            current_value: Some(1),
            ..Default::default()
        };
        db.update("u1", 0, &patch).unwrap();

        let err = db.update("u1", 0, &patch).unwrap_err();
        assert!(matches!(err, StoreError::Conflict { expected: 0, actual: 1, .. }));
        assert!(matches!(db.update("nobody", 0, &patch), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn work_items_round_trip_and_filter() {
        let db = Database::open_memory().unwrap();
        let mut first = WorkItem::new("alice", "Pitch playlist curators", 4);
        first.depends_on = vec!["x".into(), "y".into()];
        first.sequence_order = Some(2);
        let second = WorkItem::new("alice", "Email press list", 2);
        let other = WorkItem::new("bob", "Book rehearsal", 1);
        for item in [&first, &second, &other] {
            db.create_work_item(item).unwrap();
        }

        let alice = db.list(&WorkItemFilter::for_user("alice")).unwrap();
        assert_eq!(alice.len(), 2);
        assert_eq!(alice[0].id, first.id);
        assert_eq!(alice[0].depends_on, vec!["x", "y"]);
        assert_eq!(alice[0].sequence_order, Some(2));
        assert_eq!(alice[1].id, second.id);

        assert_eq!(db.list(&WorkItemFilter::default()).unwrap().len(), 3);
    }

    #[test]
    fn complete_work_item_once() {
        let db = Database::open_memory().unwrap();
        let item = WorkItem::new("alice", "Master single", 5);
        db.create_work_item(&item).unwrap();

        let done = db.complete_work_item(&item.id, Utc::now()).unwrap();
        assert_eq!(done.status, WorkItemStatus::Done);
        assert!(done.completed_at.is_some());

        let pending = db
            .list(&WorkItemFilter::for_user("alice").with_status(WorkItemStatus::Pending))
            .unwrap();
        assert!(pending.is_empty());

        assert!(matches!(
            db.complete_work_item(&item.id, Utc::now()),
            Err(StoreError::InvalidState(_))
        ));
        assert!(matches!(
            db.complete_work_item("missing", Utc::now()),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn failed_credit_leaves_item_pending() {
        let db = Database::open_memory().unwrap();
        let item = WorkItem::new("alice", "Book studio", 4);
        db.create_work_item(&item).unwrap();

        let err = db
            .complete_work_item_with(&item.id, Utc::now(), |_| -> Result<(), MomentumError> {
                Err(MomentumError::StoreWriteFailed(StoreError::Locked))
            })
            .unwrap_err();
        assert!(matches!(err, MomentumError::StoreWriteFailed(StoreError::Locked)));
        assert_eq!(db.get_work_item(&item.id).unwrap().unwrap().status, WorkItemStatus::Pending);

        let (done, weight) = db
            .complete_work_item_with(&item.id, Utc::now(), |done| Ok(done.momentum_weight))
            .unwrap();
        assert_eq!(done.status, WorkItemStatus::Done);
        assert_eq!(weight, 4);
        assert_eq!(db.get_work_item(&item.id).unwrap().unwrap().status, WorkItemStatus::Done);
    }
}
