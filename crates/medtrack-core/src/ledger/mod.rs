//! Dose ledger: owns the DoseEvent lifecycle.

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{DatabaseError, Result};
use crate::events::{Event, EventSubscriber};
use crate::storage::Database;

/// One scheduled or completed instance of taking a medication.
///
/// `timestamp` is both the schedule key and the sort key. Duplicate
/// `(name, timestamp)` pairs are permitted; `name` is free text and
/// independent of the catalogue's Medication lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoseEvent {
    pub id: String,
    pub timestamp: DateTime<Local>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub is_completed: bool,
}

/// The set of dose events, sorted ascending by timestamp.
///
/// Every mutation re-fetches and republishes the full sorted list so
/// dependent views stay consistent.
pub struct DoseLedger {
    db: Database,
    on_event: Option<EventSubscriber>,
}

impl DoseLedger {
    /// Open the ledger over the shared on-disk database.
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self::new(Database::open()?))
    }

    /// Build the ledger over an existing database handle.
    pub fn new(db: Database) -> Self {
        Self { db, on_event: None }
    }

    /// Register a callback invoked after each successful mutation.
    pub fn set_subscriber(&mut self, subscriber: EventSubscriber) {
        self.on_event = Some(subscriber);
    }

    fn publish_changed(&self) -> Result<()> {
        if let Some(on_event) = &self.on_event {
            on_event(&Event::LedgerChanged {
                events: self.db.list_dose_events()?,
            });
        }
        Ok(())
    }

    pub(crate) fn publish(&self, event: &Event) {
        if let Some(on_event) = &self.on_event {
            on_event(event);
        }
    }

    /// Persist a new dose event. Creation is funnelled through the
    /// scheduler; the ledger only owns the record afterwards.
    pub(crate) fn insert(&self, event: &DoseEvent) -> Result<()> {
        self.db.insert_dose_event(event)?;
        self.publish(&Event::DoseScheduled {
            event: event.clone(),
        });
        self.publish_changed()?;
        Ok(())
    }

    /// All dose events, ascending by timestamp.
    pub fn list_all(&self) -> Result<Vec<DoseEvent>> {
        Ok(self.db.list_dose_events()?)
    }

    /// Dose events whose timestamp falls on the given local calendar day.
    ///
    /// Day-boundary semantics, not a 24h rolling window.
    pub fn list_for_day(&self, day: NaiveDate) -> Result<Vec<DoseEvent>> {
        Ok(self
            .db
            .list_dose_events()?
            .into_iter()
            .filter(|e| e.timestamp.date_naive() == day)
            .collect())
    }

    /// Look up a dose event by id.
    pub fn get(&self, id: &str) -> Result<Option<DoseEvent>> {
        Ok(self.db.get_dose_event(id)?)
    }

    /// Flip the completion flag and persist.
    pub fn toggle_completed(&self, id: &str) -> Result<DoseEvent> {
        let mut event = self
            .db
            .get_dose_event(id)?
            .ok_or_else(|| DatabaseError::NotFound(id.to_string()))?;
        event.is_completed = !event.is_completed;
        self.db.set_dose_completed(id, event.is_completed)?;
        self.publish_changed()?;
        Ok(event)
    }

    /// Delete one or many dose events; returns the number removed.
    pub fn delete(&self, ids: &[String]) -> Result<usize> {
        let deleted = self.db.delete_dose_events(ids)?;
        if deleted > 0 {
            self.publish_changed()?;
        }
        Ok(deleted)
    }

    /// Delete every dose event on the given local calendar day.
    pub fn delete_for_day(&self, day: NaiveDate) -> Result<usize> {
        let ids: Vec<String> = self
            .list_for_day(day)?
            .into_iter()
            .map(|e| e.id)
            .collect();
        self.delete(&ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn ledger() -> DoseLedger {
        DoseLedger::new(Database::open_memory().unwrap())
    }

    fn event(y: i32, m: u32, d: u32, h: u32, min: u32) -> DoseEvent {
        DoseEvent {
            id: Uuid::new_v4().to_string(),
            timestamp: Local.with_ymd_and_hms(y, m, d, h, min, 0).unwrap(),
            name: "阿司匹林".to_string(),
            amount: "1 片".to_string(),
            is_completed: false,
        }
    }

    #[test]
    fn list_all_is_sorted_ascending() {
        let ledger = ledger();
        ledger.insert(&event(2025, 3, 11, 9, 0)).unwrap();
        ledger.insert(&event(2025, 3, 10, 20, 0)).unwrap();
        ledger.insert(&event(2025, 3, 10, 8, 0)).unwrap();

        let all = ledger.list_all().unwrap();
        let timestamps: Vec<_> = all.iter().map(|e| e.timestamp).collect();
        let mut sorted = timestamps.clone();
        sorted.sort();
        assert_eq!(timestamps, sorted);
    }

    #[test]
    fn day_filter_uses_calendar_day_boundaries() {
        let ledger = ledger();
        ledger.insert(&event(2025, 3, 10, 8, 0)).unwrap();

        let day = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        assert_eq!(ledger.list_for_day(day).unwrap().len(), 1);

        let next = NaiveDate::from_ymd_opt(2025, 3, 11).unwrap();
        assert!(ledger.list_for_day(next).unwrap().is_empty());
    }

    #[test]
    fn toggle_twice_restores_original() {
        let ledger = ledger();
        let e = event(2025, 3, 10, 8, 0);
        ledger.insert(&e).unwrap();

        assert!(ledger.toggle_completed(&e.id).unwrap().is_completed);
        assert!(!ledger.toggle_completed(&e.id).unwrap().is_completed);
    }

    #[test]
    fn delete_for_day_removes_only_that_day() {
        let ledger = ledger();
        ledger.insert(&event(2025, 3, 10, 8, 0)).unwrap();
        ledger.insert(&event(2025, 3, 10, 20, 0)).unwrap();
        ledger.insert(&event(2025, 3, 11, 8, 0)).unwrap();

        let day = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        assert_eq!(ledger.delete_for_day(day).unwrap(), 2);
        assert_eq!(ledger.list_all().unwrap().len(), 1);
    }
}
