//! The scheduling-session state machine.
//!
//! One `SelectionFlow` exists per "add a dose" session. It owns only
//! transient state (current step, chosen name, in-progress fields); all
//! persistent side effects go through the catalogue store and the
//! scheduler passed into the transitions.
//!
//! ## State Transitions
//!
//! ```text
//! SelectMedication -> SetSchedule -> Finished
//!        ^                |
//!        +---- back ------+
//! (cancel from either active step -> Cancelled)
//! ```
//!
//! Side effects committed while selecting (favourite flagging, catalogue
//! reconciliation) are NOT rolled back on cancel. That matches the
//! observed behaviour of the original application and is pinned by tests;
//! changing it is a product decision, not a bug fix.

use chrono::{Local, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogStore, Medication, MedicationDraft};
use crate::error::{FlowError, Result, ValidationError};
use crate::ledger::DoseEvent;
use crate::scheduler::DoseScheduler;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowStep {
    /// Pick a medication from the catalogue or enter one as free text.
    SelectMedication,
    /// Collect date, time and amount for the chosen medication.
    SetSchedule,
    /// The dose was scheduled; the session is closed.
    Finished,
    /// The session was aborted; already-committed side effects remain.
    Cancelled,
}

/// A two-step scheduling session.
pub struct SelectionFlow {
    step: FlowStep,
    name: String,
    date: NaiveDate,
    time: NaiveTime,
    amount: String,
}

impl SelectionFlow {
    /// Start a session for the given day (the day currently shown in the
    /// ledger view). The time defaults to now.
    pub fn new(initial_date: NaiveDate) -> Self {
        Self {
            step: FlowStep::SelectMedication,
            name: String::new(),
            date: initial_date,
            time: Local::now().time(),
            amount: String::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn step(&self) -> FlowStep {
        self.step
    }

    /// The chosen medication name; kept across `back()`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn time(&self) -> NaiveTime {
        self.time
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    /// Mirrors the disabled state of the confirm control: both name and
    /// amount must be non-empty.
    pub fn can_confirm(&self) -> bool {
        !self.name.trim().is_empty() && !self.amount.trim().is_empty()
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// Pick a catalogue entry. Marks it favourite immediately as a side
    /// effect and advances to the schedule step.
    pub fn choose(&mut self, catalog: &CatalogStore, id: &str) -> Result<Medication> {
        self.ensure_step(FlowStep::SelectMedication)?;
        let medication = catalog.mark_favorite(id)?;
        self.name = medication.name.clone();
        self.step = FlowStep::SetSchedule;
        Ok(medication)
    }

    /// Submit a free-text medication name. An exact match in the
    /// catalogue becomes a favourite; otherwise a new favourite entry is
    /// inserted. Advances to the schedule step.
    pub fn submit_name(&mut self, catalog: &CatalogStore, text: &str) -> Result<Medication> {
        self.ensure_step(FlowStep::SelectMedication)?;
        let name = text.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyField { field: "name" }.into());
        }

        let medication = match catalog.find_by_name(name)? {
            Some(existing) => catalog.mark_favorite(&existing.id)?,
            None => catalog.add(MedicationDraft::named(name), true)?,
        };
        self.name = medication.name.clone();
        self.step = FlowStep::SetSchedule;
        Ok(medication)
    }

    pub fn set_date(&mut self, date: NaiveDate) {
        self.date = date;
    }

    pub fn set_time(&mut self, time: NaiveTime) {
        self.time = time;
    }

    pub fn set_amount(&mut self, amount: &str) {
        self.amount = amount.to_string();
    }

    /// Return to medication selection without discarding the chosen name.
    pub fn back(&mut self) -> Result<()> {
        self.ensure_step(FlowStep::SetSchedule)?;
        self.step = FlowStep::SelectMedication;
        Ok(())
    }

    /// Confirm the schedule: delegates to the scheduler and closes the
    /// session.
    pub fn confirm(&mut self, scheduler: &DoseScheduler) -> Result<DoseEvent> {
        self.ensure_step(FlowStep::SetSchedule)?;
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyField { field: "name" }.into());
        }
        if self.amount.trim().is_empty() {
            return Err(ValidationError::EmptyField { field: "amount" }.into());
        }

        let event = scheduler.schedule(&self.name, self.date, self.time, &self.amount)?;
        self.step = FlowStep::Finished;
        Ok(event)
    }

    /// Abort the session. Side effects already committed while selecting
    /// are not rolled back.
    pub fn cancel(&mut self) -> Result<()> {
        match self.step {
            FlowStep::SelectMedication | FlowStep::SetSchedule => {
                self.step = FlowStep::Cancelled;
                Ok(())
            }
            FlowStep::Finished | FlowStep::Cancelled => Err(FlowError::Closed.into()),
        }
    }

    fn ensure_step(&self, expected: FlowStep) -> Result<(), FlowError> {
        if self.step == expected {
            return Ok(());
        }
        match self.step {
            FlowStep::Finished | FlowStep::Cancelled => Err(FlowError::Closed),
            _ if expected == FlowStep::SelectMedication => Err(FlowError::NotSelecting),
            _ => Err(FlowError::NotScheduling),
        }
    }
}
