//! # MedTrack Core Library
//!
//! This library provides the core business logic for MedTrack, a single-user
//! medication tracker. All operations are available through this library and
//! the standalone CLI binary; any graphical shell is expected to be a thin
//! layer over the same core.
//!
//! ## Architecture
//!
//! - **Catalogue**: the set of known medications (built-in seed data plus
//!   user-added entries) with favourites, search and category grouping
//! - **Ledger**: scheduled and completed dose events, sorted by timestamp
//! - **Scheduler**: turns a medication name, a date, a time and an amount
//!   into a persisted dose event plus a local notification request
//! - **Selection flow**: a two-step state machine coordinating
//!   "pick a medication, then confirm the schedule"
//! - **Storage**: SQLite-based persistence and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`CatalogStore`]: medication lifecycle and seeding
//! - [`DoseLedger`]: dose event lifecycle and per-day views
//! - [`DoseScheduler`]: dose scheduling and notification requests
//! - [`SelectionFlow`]: the scheduling-session state machine
//! - [`Notifier`]: seam for the platform notification subsystem

pub mod catalog;
pub mod error;
pub mod events;
pub mod flow;
pub mod ledger;
pub mod notify;
pub mod scheduler;
pub mod storage;

pub use catalog::{CatalogStore, Medication, MedicationDraft};
pub use error::{
    ConfigError, CoreError, DatabaseError, FlowError, NotifyError, Result, ValidationError,
};
pub use events::Event;
pub use flow::{FlowStep, SelectionFlow};
pub use ledger::{DoseEvent, DoseLedger};
pub use notify::{
    AuthorizationStatus, MemoryNotifier, NotificationRequest, Notifier, NullNotifier,
};
pub use scheduler::DoseScheduler;
pub use storage::{Config, Database};
