use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::catalog::Medication;
use crate::ledger::DoseEvent;

/// Every successful mutation republishes an Event carrying the full
/// refreshed view. A GUI subscribes to these instead of diffing; there is
/// no incremental update.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// The catalogue changed; carries the full (category, name)-sorted list.
    CatalogChanged { medications: Vec<Medication> },
    /// The dose ledger changed; carries the full timestamp-sorted list.
    LedgerChanged { events: Vec<DoseEvent> },
    /// A new dose event was created by the scheduler.
    DoseScheduled { event: DoseEvent },
    /// A local notification was requested for a scheduled dose.
    NotificationRequested {
        identifier: String,
        fire_at: DateTime<Local>,
    },
}

/// Callback invoked with each published event.
pub type EventSubscriber = Box<dyn Fn(&Event)>;
