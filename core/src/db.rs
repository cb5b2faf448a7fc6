use std::path::Path;

use chrono::{Local, NaiveDate};
use rusqlite::{Connection, params};

use crate::models::{
    DeleteOutcome, Entry, NewEntry, NewVariety, ReconcileOutcome, RowFailure, StoreError, Variety,
    validate_caffeine_mg, validate_cups, validate_entry_date, validate_variety_name,
};
use crate::reconcile::{ReconcilePlan, SnapshotRow, diff};

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Apply forward schema migrations, staged by `PRAGMA user_version`.
    ///
    /// Any failure here propagates to the caller; the schema check is never
    /// silently skipped.
    fn migrate(&self) -> Result<(), StoreError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            tracing::debug!("applying schema migration v1");
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS varieties (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL UNIQUE,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS consumption (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    date TEXT NOT NULL,
                    cups INTEGER NOT NULL,
                    variety_id INTEGER NOT NULL REFERENCES varieties(id),
                    created_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_consumption_date ON consumption(date);
                CREATE INDEX IF NOT EXISTS idx_consumption_variety ON consumption(variety_id);

                PRAGMA user_version = 1;",
            )?;
        }

        if version < 2 {
            // Caffeine tracking arrived after the first release; older
            // databases gain the column with a 0 default.
            tracing::debug!("applying schema migration v2");
            self.conn.execute_batch(
                "ALTER TABLE varieties ADD COLUMN caffeine_mg INTEGER NOT NULL DEFAULT 0;
                 PRAGMA user_version = 2;",
            )?;
        }

        Ok(())
    }

    // --- Row mapping helpers ---

    fn variety_from_row(row: &rusqlite::Row) -> rusqlite::Result<Variety> {
        Ok(Variety {
            id: row.get(0)?,
            name: row.get(1)?,
            caffeine_mg: row.get(2)?,
            created_at: row.get(3)?,
        })
    }

    // Expects columns:
    // 0: c.id, 1: c.date, 2: c.cups, 3: c.variety_id, 4: c.created_at,
    // 5: v.name, 6: v.caffeine_mg
    fn entry_from_row(row: &rusqlite::Row) -> rusqlite::Result<Entry> {
        let date_str: String = row.get(1)?;
        let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|err| {
            rusqlite::Error::FromSqlConversionFailure(
                1,
                rusqlite::types::Type::Text,
                Box::new(err),
            )
        })?;
        Ok(Entry {
            id: row.get(0)?,
            date,
            cups: row.get(2)?,
            variety_id: row.get(3)?,
            created_at: row.get(4)?,
            variety: row.get(5)?,
            caffeine_mg: row.get(6)?,
        })
    }

    // --- Varieties ---

    pub fn insert_variety(&self, variety: &NewVariety) -> Result<Variety, StoreError> {
        let name = validate_variety_name(&variety.name)?;
        validate_caffeine_mg(variety.caffeine_mg)?;
        if self.get_variety_by_name(&name)?.is_some() {
            return Err(StoreError::DuplicateName(name));
        }

        let now = Local::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO varieties (name, caffeine_mg, created_at) VALUES (?1, ?2, ?3)",
            params![name, variety.caffeine_mg, now],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_variety(id)
    }

    pub fn get_variety(&self, id: i64) -> Result<Variety, StoreError> {
        self.conn
            .query_row(
                "SELECT id, name, caffeine_mg, created_at FROM varieties WHERE id = ?1",
                params![id],
                Self::variety_from_row,
            )
            .map_err(|err| match err {
                rusqlite::Error::QueryReturnedNoRows => {
                    StoreError::NotFound(format!("variety {id}"))
                }
                other => StoreError::Sqlite(other),
            })
    }

    pub fn get_variety_by_name(&self, name: &str) -> Result<Option<Variety>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, caffeine_mg, created_at FROM varieties WHERE name = ?1",
        )?;
        let mut rows = stmt.query(params![name])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::variety_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn list_varieties(&self) -> Result<Vec<Variety>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, caffeine_mg, created_at FROM varieties ORDER BY name",
        )?;
        let varieties = stmt
            .query_map([], Self::variety_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(varieties)
    }

    /// Overwrite a variety's per-cup caffeine value in place.
    pub fn update_caffeine(&self, id: i64, caffeine_mg: i64) -> Result<Variety, StoreError> {
        validate_caffeine_mg(caffeine_mg)?;
        let rows = self.conn.execute(
            "UPDATE varieties SET caffeine_mg = ?1 WHERE id = ?2",
            params![caffeine_mg, id],
        )?;
        if rows == 0 {
            return Err(StoreError::NotFound(format!("variety {id}")));
        }
        self.get_variety(id)
    }

    /// Delete varieties by name, each attempted independently.
    ///
    /// A variety still referenced by consumption entries is left in place
    /// and reported as a conflict; deleting it would orphan ledger rows.
    pub fn delete_varieties(&self, names: &[String]) -> Result<DeleteOutcome, StoreError> {
        let mut outcome = DeleteOutcome::default();
        for name in names {
            match self.delete_variety_by_name(name) {
                Ok(()) => outcome.deleted.push(name.clone()),
                Err(err) => outcome.failures.push(RowFailure::new(name.clone(), &err)),
            }
        }
        tracing::debug!(
            deleted = outcome.deleted.len(),
            failed = outcome.failures.len(),
            "variety deletion finished"
        );
        Ok(outcome)
    }

    fn delete_variety_by_name(&self, name: &str) -> Result<(), StoreError> {
        let Some(variety) = self.get_variety_by_name(name)? else {
            return Err(StoreError::NotFound(format!("variety '{name}'")));
        };
        let references = self.entry_count_for_variety(variety.id)?;
        if references > 0 {
            return Err(StoreError::Conflict(format!(
                "variety '{name}' is referenced by {references} consumption entries"
            )));
        }
        self.conn
            .execute("DELETE FROM varieties WHERE id = ?1", params![variety.id])?;
        Ok(())
    }

    fn entry_count_for_variety(&self, variety_id: i64) -> Result<i64, StoreError> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM consumption WHERE variety_id = ?1",
            params![variety_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // --- Consumption entries ---

    pub fn insert_entry(&self, entry: &NewEntry) -> Result<Entry, StoreError> {
        self.insert_entry_at(entry, Local::now().date_naive())
    }

    /// Insert with an explicit "today" for the future-date check.
    pub fn insert_entry_at(&self, entry: &NewEntry, today: NaiveDate) -> Result<Entry, StoreError> {
        validate_cups(entry.cups)?;
        validate_entry_date(entry.date, today)?;
        // Resolve the reference before writing so a dangling id surfaces as
        // NotFound rather than a constraint error.
        self.get_variety(entry.variety_id)?;

        let now = Local::now().to_rfc3339();
        let date_str = entry.date.format("%Y-%m-%d").to_string();
        self.conn.execute(
            "INSERT INTO consumption (date, cups, variety_id, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![date_str, entry.cups, entry.variety_id, now],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_entry(id)
    }

    pub fn get_entry(&self, id: i64) -> Result<Entry, StoreError> {
        self.conn
            .query_row(
                "SELECT c.id, c.date, c.cups, c.variety_id, c.created_at, v.name, v.caffeine_mg
                 FROM consumption c
                 JOIN varieties v ON c.variety_id = v.id
                 WHERE c.id = ?1",
                params![id],
                Self::entry_from_row,
            )
            .map_err(|err| match err {
                rusqlite::Error::QueryReturnedNoRows => {
                    StoreError::NotFound(format!("entry {id}"))
                }
                other => StoreError::Sqlite(other),
            })
    }

    pub fn delete_entry(&self, id: i64) -> Result<(), StoreError> {
        let rows = self
            .conn
            .execute("DELETE FROM consumption WHERE id = ?1", params![id])?;
        if rows == 0 {
            return Err(StoreError::NotFound(format!("entry {id}")));
        }
        Ok(())
    }

    pub fn list_entries(&self) -> Result<Vec<Entry>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT c.id, c.date, c.cups, c.variety_id, c.created_at, v.name, v.caffeine_mg
             FROM consumption c
             JOIN varieties v ON c.variety_id = v.id
             ORDER BY c.date, c.id",
        )?;
        let entries = stmt
            .query_map([], Self::entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn entries_for_date(&self, date: NaiveDate) -> Result<Vec<Entry>, StoreError> {
        let date_str = date.format("%Y-%m-%d").to_string();
        let mut stmt = self.conn.prepare(
            "SELECT c.id, c.date, c.cups, c.variety_id, c.created_at, v.name, v.caffeine_mg
             FROM consumption c
             JOIN varieties v ON c.variety_id = v.id
             WHERE c.date = ?1
             ORDER BY c.id",
        )?;
        let entries = stmt
            .query_map(params![date_str], Self::entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    // --- Bulk-edit reconciliation ---

    /// Reconcile an edited snapshot against the current ledger.
    pub fn reconcile(&self, edited: &[SnapshotRow]) -> Result<ReconcileOutcome, StoreError> {
        let original: Vec<SnapshotRow> =
            self.list_entries()?.iter().map(SnapshotRow::from).collect();
        let plan = diff(&original, edited);
        self.apply_reconcile_at(&plan, Local::now().date_naive())
    }

    /// Apply a reconciliation plan with row-level isolation: every row is
    /// attempted, each via a single statement, and failures are collected
    /// rather than aborting the pass.
    pub fn apply_reconcile_at(
        &self,
        plan: &ReconcilePlan,
        today: NaiveDate,
    ) -> Result<ReconcileOutcome, StoreError> {
        let mut outcome = ReconcileOutcome {
            unchanged: plan.unchanged,
            ..ReconcileOutcome::default()
        };

        for id in &plan.remove {
            match self.delete_entry(*id) {
                Ok(()) => outcome.deleted += 1,
                Err(err) => outcome
                    .failures
                    .push(RowFailure::new(format!("entry {id}"), &err)),
            }
        }

        for row in &plan.update {
            match self.apply_update(row, today) {
                Ok(()) => outcome.updated += 1,
                Err(err) => outcome
                    .failures
                    .push(RowFailure::new(format!("entry {}", row.id), &err)),
            }
        }

        for row in &plan.insert {
            match self.apply_insert(row, today) {
                Ok(()) => outcome.inserted += 1,
                Err(err) => outcome
                    .failures
                    .push(RowFailure::new(format!("new row ({})", row.variety), &err)),
            }
        }

        tracing::debug!(
            deleted = outcome.deleted,
            updated = outcome.updated,
            inserted = outcome.inserted,
            unchanged = outcome.unchanged,
            failed = outcome.failures.len(),
            "reconcile finished"
        );
        Ok(outcome)
    }

    /// Overwrite all editable fields of one stored entry in a single
    /// statement; the row is either fully updated or untouched.
    fn apply_update(&self, row: &SnapshotRow, today: NaiveDate) -> Result<(), StoreError> {
        validate_cups(row.cups)?;
        validate_entry_date(row.date, today)?;
        let variety = self
            .get_variety_by_name(&row.variety)?
            .ok_or_else(|| StoreError::NotFound(format!("variety '{}'", row.variety)))?;

        let date_str = row.date.format("%Y-%m-%d").to_string();
        let rows = self.conn.execute(
            "UPDATE consumption SET date = ?1, cups = ?2, variety_id = ?3 WHERE id = ?4",
            params![date_str, row.cups, variety.id, row.id],
        )?;
        if rows == 0 {
            return Err(StoreError::NotFound(format!("entry {}", row.id)));
        }
        Ok(())
    }

    fn apply_insert(&self, row: &SnapshotRow, today: NaiveDate) -> Result<(), StoreError> {
        let variety = self
            .get_variety_by_name(&row.variety)?
            .ok_or_else(|| StoreError::NotFound(format!("variety '{}'", row.variety)))?;
        self.insert_entry_at(
            &NewEntry {
                date: row.date,
                cups: row.cups,
                variety_id: variety.id,
            },
            today,
        )?;
        Ok(())
    }
}
