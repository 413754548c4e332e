//! Dose scheduling: turns a medication selection, a date and a time into a
//! persisted dose event plus a local notification request.

use chrono::{DateTime, Duration, Local, LocalResult, NaiveDate, NaiveTime, TimeZone, Timelike};
use uuid::Uuid;

use crate::error::{Result, ValidationError};
use crate::events::Event;
use crate::ledger::{DoseEvent, DoseLedger};
use crate::notify::{NotificationRequest, Notifier};
use crate::storage::NotificationsConfig;

/// Notification identifier for a dose: `med-<name>-<seconds since epoch>`.
///
/// Two doses of the same medication scheduled for the exact same second
/// share an identifier; the later request replaces the pending one.
pub fn notification_identifier(name: &str, timestamp: DateTime<Local>) -> String {
    format!("med-{}-{}", name, timestamp.timestamp())
}

/// Compose a wall-clock timestamp from the date's y/m/d and the time's
/// hour/minute, seconds truncated to zero.
///
/// An unresolvable local time (DST gap) falls back to the date at
/// midnight.
fn compose_timestamp(date: NaiveDate, time: NaiveTime) -> DateTime<Local> {
    let truncated = time
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(time);
    match Local.from_local_datetime(&date.and_time(truncated)) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt,
        LocalResult::None => Local
            .from_local_datetime(&date.and_time(NaiveTime::MIN))
            .earliest()
            .unwrap_or_else(Local::now),
    }
}

/// Schedules doses: persists the event through the ledger, then requests a
/// notification, conditional on configuration and permission status.
///
/// Persistence failures are surfaced; notification delivery stays
/// best-effort and never fails the call.
pub struct DoseScheduler<'a> {
    ledger: &'a DoseLedger,
    notifier: &'a dyn Notifier,
    settings: NotificationsConfig,
}

impl<'a> DoseScheduler<'a> {
    pub fn new(ledger: &'a DoseLedger, notifier: &'a dyn Notifier) -> Self {
        Self {
            ledger,
            notifier,
            settings: NotificationsConfig::default(),
        }
    }

    /// Override the default notification settings.
    pub fn with_settings(mut self, settings: NotificationsConfig) -> Self {
        self.settings = settings;
        self
    }

    /// Schedule one dose.
    ///
    /// Persists exactly one dose event and requests at most one
    /// notification. The event is persisted even when no notification can
    /// fire (permission denied, notifications disabled, backend failure).
    pub fn schedule(
        &self,
        name: &str,
        date: NaiveDate,
        time: NaiveTime,
        amount: &str,
    ) -> Result<DoseEvent> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyField { field: "name" }.into());
        }
        let amount = amount.trim();
        if amount.is_empty() {
            return Err(ValidationError::EmptyField { field: "amount" }.into());
        }

        let timestamp = compose_timestamp(date, time);
        let event = DoseEvent {
            id: Uuid::new_v4().to_string(),
            timestamp,
            name: name.to_string(),
            amount: amount.to_string(),
            is_completed: false,
        };
        self.ledger.insert(&event)?;

        if self.settings.enabled && self.notifier.authorization_status().allows_delivery() {
            let identifier = notification_identifier(name, timestamp);
            let request = NotificationRequest {
                identifier: identifier.clone(),
                title: "服药提醒".to_string(),
                body: format!("请按时服用：{name}，剂量 {amount}"),
                fire_at: timestamp - Duration::minutes(self.settings.lead_minutes),
            };
            if self.notifier.schedule(request).is_ok() {
                self.ledger.publish(&Event::NotificationRequested {
                    identifier,
                    fire_at: timestamp - Duration::minutes(self.settings.lead_minutes),
                });
            }
        }

        Ok(event)
    }
}
