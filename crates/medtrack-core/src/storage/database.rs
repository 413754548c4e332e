//! SQLite-based storage for the medication catalogue and the dose ledger.
//!
//! Timestamps are stored as RFC3339 UTC text so that `ORDER BY` on the
//! column yields chronological order; the model exposes them in the local
//! timezone, which is what day-boundary filtering operates on.

use chrono::{DateTime, Local, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use super::data_dir;
use crate::catalog::Medication;
use crate::ledger::DoseEvent;

/// Parse datetime from RFC3339 string with fallback to current time
fn parse_datetime_fallback(dt_str: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(dt_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Build a Medication from a database row
fn row_to_medication(row: &rusqlite::Row) -> Result<Medication, rusqlite::Error> {
    let created_at_str: String = row.get(11)?;
    Ok(Medication {
        id: row.get(0)?,
        name: row.get(1)?,
        generic_name: row.get(2)?,
        category: row.get(3)?,
        form: row.get(4)?,
        strength: row.get(5)?,
        notes: row.get(6)?,
        is_builtin: row.get(7)?,
        is_favorite: row.get(8)?,
        doses_per_day: row.get(9)?,
        interval_days: row.get(10)?,
        created_at: parse_datetime_fallback(&created_at_str),
    })
}

/// Build a DoseEvent from a database row
fn row_to_dose_event(row: &rusqlite::Row) -> Result<DoseEvent, rusqlite::Error> {
    let timestamp_str: String = row.get(1)?;
    Ok(DoseEvent {
        id: row.get(0)?,
        timestamp: parse_datetime_fallback(&timestamp_str).with_timezone(&Local),
        name: row.get(2)?,
        amount: row.get(3)?,
        is_completed: row.get(4)?,
    })
}

const MEDICATION_COLUMNS: &str = "id, name, generic_name, category, form, strength, notes, \
     is_builtin, is_favorite, doses_per_day, interval_days, created_at";

const DOSE_EVENT_COLUMNS: &str = "id, timestamp, name, amount, is_completed";

/// SQLite database holding both record kinds.
///
/// Only one logical writer exists (the caller's thread); the stores built
/// on top of this handle do not introduce concurrent writers.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `~/.config/medtrack/medtrack.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let path = data_dir()?.join("medtrack.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open the database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests and ephemeral use).
    pub fn open_memory() -> Result<Self, rusqlite::Error> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS medications (
                id            TEXT PRIMARY KEY,
                name          TEXT NOT NULL,
                generic_name  TEXT NOT NULL DEFAULT '',
                category      TEXT NOT NULL DEFAULT '',
                form          TEXT NOT NULL DEFAULT '',
                strength      TEXT NOT NULL DEFAULT '',
                notes         TEXT NOT NULL DEFAULT '',
                is_builtin    INTEGER NOT NULL DEFAULT 0,
                is_favorite   INTEGER NOT NULL DEFAULT 0,
                doses_per_day INTEGER NOT NULL DEFAULT 1,
                interval_days INTEGER NOT NULL DEFAULT 1,
                created_at    TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS dose_events (
                id           TEXT PRIMARY KEY,
                timestamp    TEXT NOT NULL,
                name         TEXT NOT NULL DEFAULT '',
                amount       TEXT NOT NULL DEFAULT '',
                is_completed INTEGER NOT NULL DEFAULT 0
            );

            -- Create indexes for the common query patterns
            CREATE INDEX IF NOT EXISTS idx_medications_category_name
                ON medications(category, name);
            CREATE INDEX IF NOT EXISTS idx_dose_events_timestamp
                ON dose_events(timestamp);",
        )?;
        Ok(())
    }

    // === Medication rows ===

    /// Insert a medication row.
    pub fn insert_medication(&self, medication: &Medication) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT INTO medications (id, name, generic_name, category, form, strength, notes,
                 is_builtin, is_favorite, doses_per_day, interval_days, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                medication.id,
                medication.name,
                medication.generic_name,
                medication.category,
                medication.form,
                medication.strength,
                medication.notes,
                medication.is_builtin,
                medication.is_favorite,
                medication.doses_per_day,
                medication.interval_days,
                medication.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// List all medications sorted by (category, name) ascending.
    pub fn list_medications(&self) -> Result<Vec<Medication>, rusqlite::Error> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {MEDICATION_COLUMNS} FROM medications ORDER BY category ASC, name ASC"
        ))?;
        let rows = stmt.query_map([], row_to_medication)?;
        rows.collect()
    }

    /// Look up a medication by id.
    pub fn get_medication(&self, id: &str) -> Result<Option<Medication>, rusqlite::Error> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {MEDICATION_COLUMNS} FROM medications WHERE id = ?1"
        ))?;
        stmt.query_row(params![id], row_to_medication).optional()
    }

    /// Look up a medication by exact (case-sensitive) name.
    ///
    /// Name uniqueness is soft; when several rows share a name the oldest
    /// one wins, which is the row the reconciliation flow targets.
    pub fn find_medication_by_name(&self, name: &str) -> Result<Option<Medication>, rusqlite::Error> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {MEDICATION_COLUMNS} FROM medications
             WHERE name = ?1 ORDER BY created_at ASC LIMIT 1"
        ))?;
        stmt.query_row(params![name], row_to_medication).optional()
    }

    /// Update every mutable field of a medication row (`is_builtin` is
    /// immutable after creation and deliberately not written).
    pub fn update_medication(&self, medication: &Medication) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "UPDATE medications
             SET name = ?2, generic_name = ?3, category = ?4, form = ?5, strength = ?6,
                 notes = ?7, is_favorite = ?8, doses_per_day = ?9, interval_days = ?10
             WHERE id = ?1",
            params![
                medication.id,
                medication.name,
                medication.generic_name,
                medication.category,
                medication.form,
                medication.strength,
                medication.notes,
                medication.is_favorite,
                medication.doses_per_day,
                medication.interval_days,
            ],
        )?;
        Ok(())
    }

    /// Delete medication rows by id; returns the number of rows removed.
    pub fn delete_medications(&self, ids: &[String]) -> Result<usize, rusqlite::Error> {
        let mut deleted = 0;
        for id in ids {
            deleted += self
                .conn
                .execute("DELETE FROM medications WHERE id = ?1", params![id])?;
        }
        Ok(deleted)
    }

    /// Count medication rows.
    pub fn count_medications(&self) -> Result<i64, rusqlite::Error> {
        self.conn
            .query_row("SELECT COUNT(*) FROM medications", [], |row| row.get(0))
    }

    // === Dose event rows ===

    /// Insert a dose event row.
    pub fn insert_dose_event(&self, event: &DoseEvent) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT INTO dose_events (id, timestamp, name, amount, is_completed)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                event.id,
                event.timestamp.with_timezone(&Utc).to_rfc3339(),
                event.name,
                event.amount,
                event.is_completed,
            ],
        )?;
        Ok(())
    }

    /// List all dose events sorted ascending by timestamp.
    pub fn list_dose_events(&self) -> Result<Vec<DoseEvent>, rusqlite::Error> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {DOSE_EVENT_COLUMNS} FROM dose_events ORDER BY timestamp ASC"
        ))?;
        let rows = stmt.query_map([], row_to_dose_event)?;
        rows.collect()
    }

    /// Look up a dose event by id.
    pub fn get_dose_event(&self, id: &str) -> Result<Option<DoseEvent>, rusqlite::Error> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {DOSE_EVENT_COLUMNS} FROM dose_events WHERE id = ?1"
        ))?;
        stmt.query_row(params![id], row_to_dose_event).optional()
    }

    /// Set the completion flag of a dose event; returns true if a row matched.
    pub fn set_dose_completed(&self, id: &str, completed: bool) -> Result<bool, rusqlite::Error> {
        let changed = self.conn.execute(
            "UPDATE dose_events SET is_completed = ?2 WHERE id = ?1",
            params![id, completed],
        )?;
        Ok(changed > 0)
    }

    /// Delete dose event rows by id; returns the number of rows removed.
    pub fn delete_dose_events(&self, ids: &[String]) -> Result<usize, rusqlite::Error> {
        let mut deleted = 0;
        for id in ids {
            deleted += self
                .conn
                .execute("DELETE FROM dose_events WHERE id = ?1", params![id])?;
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn medication(name: &str, category: &str) -> Medication {
        Medication {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            generic_name: String::new(),
            category: category.to_string(),
            form: String::new(),
            strength: String::new(),
            notes: String::new(),
            is_builtin: false,
            is_favorite: false,
            doses_per_day: 1,
            interval_days: 1,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn medication_roundtrip() {
        let db = Database::open_memory().unwrap();
        let med = medication("二甲双胍", "糖尿病");
        db.insert_medication(&med).unwrap();

        let fetched = db.get_medication(&med.id).unwrap().unwrap();
        assert_eq!(fetched.name, "二甲双胍");
        assert_eq!(fetched.category, "糖尿病");
        assert!(!fetched.is_builtin);
        assert_eq!(fetched.doses_per_day, 1);

        assert_eq!(db.delete_medications(&[med.id]).unwrap(), 1);
        assert_eq!(db.count_medications().unwrap(), 0);
    }

    #[test]
    fn medications_sorted_by_category_then_name() {
        let db = Database::open_memory().unwrap();
        db.insert_medication(&medication("b", "z")).unwrap();
        db.insert_medication(&medication("b", "a")).unwrap();
        db.insert_medication(&medication("a", "z")).unwrap();

        let names: Vec<(String, String)> = db
            .list_medications()
            .unwrap()
            .into_iter()
            .map(|m| (m.category, m.name))
            .collect();
        assert_eq!(
            names,
            vec![
                ("a".to_string(), "b".to_string()),
                ("z".to_string(), "a".to_string()),
                ("z".to_string(), "b".to_string()),
            ]
        );
    }

    #[test]
    fn dose_event_roundtrip() {
        let db = Database::open_memory().unwrap();
        let event = DoseEvent {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Local.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap(),
            name: "阿司匹林".to_string(),
            amount: "1 片".to_string(),
            is_completed: false,
        };
        db.insert_dose_event(&event).unwrap();

        let fetched = db.get_dose_event(&event.id).unwrap().unwrap();
        assert_eq!(fetched.timestamp, event.timestamp);
        assert_eq!(fetched.name, "阿司匹林");

        assert!(db.set_dose_completed(&event.id, true).unwrap());
        assert!(db.get_dose_event(&event.id).unwrap().unwrap().is_completed);
    }
}
