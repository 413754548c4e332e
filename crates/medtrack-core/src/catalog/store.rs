//! Catalogue store: owns the Medication lifecycle.

use chrono::Utc;
use uuid::Uuid;

use super::{Medication, MedicationDraft, BUILTIN_MEDICATIONS};
use crate::error::{DatabaseError, Result, ValidationError};
use crate::events::{Event, EventSubscriber};
use crate::storage::Database;

/// The set of known medications: built-in seed data plus user-added
/// entries, with favourite flagging, search and category grouping.
///
/// All reads return the `(category, name)`-ascending order; every
/// mutation republishes the full sorted list through the subscriber.
pub struct CatalogStore {
    db: Database,
    on_event: Option<EventSubscriber>,
}

impl CatalogStore {
    /// Open the store over the shared on-disk database.
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self::new(Database::open()?))
    }

    /// Build the store over an existing database handle.
    pub fn new(db: Database) -> Self {
        Self { db, on_event: None }
    }

    /// Register a callback invoked after each successful mutation.
    pub fn set_subscriber(&mut self, subscriber: EventSubscriber) {
        self.on_event = Some(subscriber);
    }

    fn publish_changed(&self) -> Result<()> {
        if let Some(on_event) = &self.on_event {
            on_event(&Event::CatalogChanged {
                medications: self.db.list_medications()?,
            });
        }
        Ok(())
    }

    /// List the catalogue sorted by `(category, name)` ascending.
    ///
    /// `filter` is a case-insensitive substring matched against name,
    /// generic name or category.
    pub fn list(&self, filter: Option<&str>) -> Result<Vec<Medication>> {
        let medications = self.db.list_medications()?;
        match filter {
            None => Ok(medications),
            Some(filter) => {
                let needle = filter.to_lowercase();
                Ok(medications
                    .into_iter()
                    .filter(|m| {
                        m.name.to_lowercase().contains(&needle)
                            || m.generic_name.to_lowercase().contains(&needle)
                            || m.category.to_lowercase().contains(&needle)
                    })
                    .collect())
            }
        }
    }

    /// List favourites only, same sort as [`list`](Self::list).
    pub fn list_favorites(&self) -> Result<Vec<Medication>> {
        Ok(self
            .db
            .list_medications()?
            .into_iter()
            .filter(|m| m.is_favorite)
            .collect())
    }

    /// Look up an entry by id.
    pub fn get(&self, id: &str) -> Result<Option<Medication>> {
        Ok(self.db.get_medication(id)?)
    }

    /// Look up an entry by exact (case-sensitive) name.
    pub fn find_by_name(&self, name: &str) -> Result<Option<Medication>> {
        Ok(self.db.find_medication_by_name(name)?)
    }

    /// Add a user entry. `is_builtin` is always false; whether it starts
    /// as a favourite depends on where the add happened, so the caller
    /// decides.
    pub fn add(&self, draft: MedicationDraft, favorite: bool) -> Result<Medication> {
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyField { field: "name" }.into());
        }

        let medication = Medication {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            generic_name: draft.generic_name,
            category: draft.category,
            form: draft.form,
            strength: draft.strength,
            notes: draft.notes,
            is_builtin: false,
            is_favorite: favorite,
            doses_per_day: 1,
            interval_days: 1,
            created_at: Utc::now(),
        };
        self.db.insert_medication(&medication)?;
        self.publish_changed()?;
        Ok(medication)
    }

    /// Reconcile a free-text name against the catalogue.
    ///
    /// If an entry with exactly this name exists, its descriptive fields
    /// are overwritten from the draft and it becomes a favourite; the row
    /// count never grows on a hit. Otherwise a new favourite entry is
    /// created.
    pub fn reconcile_by_name(&self, name: &str, draft: MedicationDraft) -> Result<Medication> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyField { field: "name" }.into());
        }

        match self.db.find_medication_by_name(name)? {
            Some(mut existing) => {
                existing.generic_name = draft.generic_name;
                existing.category = draft.category;
                existing.form = draft.form;
                existing.strength = draft.strength;
                existing.notes = draft.notes;
                existing.is_favorite = true;
                self.db.update_medication(&existing)?;
                self.publish_changed()?;
                Ok(existing)
            }
            None => self.add(
                MedicationDraft {
                    name: name.to_string(),
                    ..draft
                },
                true,
            ),
        }
    }

    /// Flip the favourite flag.
    pub fn toggle_favorite(&self, id: &str) -> Result<Medication> {
        let mut medication = self.require(id)?;
        medication.is_favorite = !medication.is_favorite;
        self.db.update_medication(&medication)?;
        self.publish_changed()?;
        Ok(medication)
    }

    /// Set the favourite flag. Used by the selection flow when a
    /// catalogue entry is picked for scheduling.
    pub fn mark_favorite(&self, id: &str) -> Result<Medication> {
        let mut medication = self.require(id)?;
        if !medication.is_favorite {
            medication.is_favorite = true;
            self.db.update_medication(&medication)?;
            self.publish_changed()?;
        }
        Ok(medication)
    }

    /// Update the usage plan; both values must be at least 1.
    pub fn set_usage_plan(&self, id: &str, doses_per_day: i64, interval_days: i64) -> Result<Medication> {
        if doses_per_day < 1 {
            return Err(ValidationError::InvalidValue {
                field: "doses_per_day",
                message: format!("must be at least 1, got {doses_per_day}"),
            }
            .into());
        }
        if interval_days < 1 {
            return Err(ValidationError::InvalidValue {
                field: "interval_days",
                message: format!("must be at least 1, got {interval_days}"),
            }
            .into());
        }

        let mut medication = self.require(id)?;
        medication.doses_per_day = doses_per_day;
        medication.interval_days = interval_days;
        self.db.update_medication(&medication)?;
        self.publish_changed()?;
        Ok(medication)
    }

    /// Delete one or many entries; returns the number of rows removed.
    /// Dose events referencing a deleted medication are untouched.
    pub fn delete(&self, ids: &[String]) -> Result<usize> {
        let deleted = self.db.delete_medications(ids)?;
        if deleted > 0 {
            self.publish_changed()?;
        }
        Ok(deleted)
    }

    /// Insert the built-in seed list if the catalogue is empty.
    ///
    /// Idempotent: acts only when the store has zero rows at call time.
    /// The check-then-insert is unguarded because only one logical writer
    /// exists; introducing concurrent writers requires a lock or a unique
    /// constraint here. Returns the number of rows inserted.
    pub fn ensure_seeded(&self) -> Result<usize> {
        if self.db.count_medications()? > 0 {
            return Ok(0);
        }

        let now = Utc::now();
        for (name, generic_name, category, form, strength, notes) in BUILTIN_MEDICATIONS {
            self.db.insert_medication(&Medication {
                id: Uuid::new_v4().to_string(),
                name: name.to_string(),
                generic_name: generic_name.to_string(),
                category: category.to_string(),
                form: form.to_string(),
                strength: strength.to_string(),
                notes: notes.to_string(),
                is_builtin: true,
                is_favorite: false,
                doses_per_day: 1,
                interval_days: 1,
                created_at: now,
            })?;
        }
        self.publish_changed()?;
        Ok(BUILTIN_MEDICATIONS.len())
    }

    fn require(&self, id: &str) -> Result<Medication> {
        self.db
            .get_medication(id)?
            .ok_or_else(|| DatabaseError::NotFound(id.to_string()).into())
    }
}
