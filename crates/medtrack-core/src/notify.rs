//! Seam for the platform's local notification subsystem.
//!
//! The delivery subsystem itself is an external collaborator; the core only
//! needs "what is the current permission status" and "register a request
//! for wall-clock time T". Implementations here cover the two cases the
//! core ships with: a backend that is simply absent ([`NullNotifier`]) and
//! an in-memory pending set ([`MemoryNotifier`]) used by tests and the CLI.

use std::cell::RefCell;
use std::collections::HashMap;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::NotifyError;

/// Current notification permission status, as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorizationStatus {
    Authorized,
    Provisional,
    Denied,
    NotDetermined,
}

impl AuthorizationStatus {
    /// Whether the status permits delivering a notification.
    pub fn allows_delivery(self) -> bool {
        matches!(self, Self::Authorized | Self::Provisional)
    }
}

/// A calendar-triggered local notification request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    /// Stable identifier; a request reusing a pending identifier replaces it.
    pub identifier: String,
    pub title: String,
    pub body: String,
    pub fire_at: DateTime<Local>,
}

/// Interface to the local notification subsystem.
pub trait Notifier {
    fn authorization_status(&self) -> AuthorizationStatus;

    /// Register a calendar-triggered notification.
    ///
    /// Requests with an identifier equal to a pending one replace it.
    fn schedule(&self, request: NotificationRequest) -> Result<(), NotifyError>;

    /// Withdraw a pending request; unknown identifiers are not an error.
    fn cancel(&self, identifier: &str) -> Result<(), NotifyError>;
}

/// Notifier for environments without a notification backend.
///
/// Reports `Denied` so callers skip scheduling entirely.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn authorization_status(&self) -> AuthorizationStatus {
        AuthorizationStatus::Denied
    }

    fn schedule(&self, _request: NotificationRequest) -> Result<(), NotifyError> {
        Ok(())
    }

    fn cancel(&self, _identifier: &str) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// In-memory notifier keeping the pending set keyed by identifier.
///
/// Always reports `Authorized`. Same-identifier requests overwrite the
/// pending entry, which is the decision taken for the same-second
/// collision case.
#[derive(Default)]
pub struct MemoryNotifier {
    pending: RefCell<HashMap<String, NotificationRequest>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pending requests ordered by fire time.
    pub fn pending(&self) -> Vec<NotificationRequest> {
        let mut requests: Vec<NotificationRequest> =
            self.pending.borrow().values().cloned().collect();
        requests.sort_by_key(|r| r.fire_at);
        requests
    }
}

impl Notifier for MemoryNotifier {
    fn authorization_status(&self) -> AuthorizationStatus {
        AuthorizationStatus::Authorized
    }

    fn schedule(&self, request: NotificationRequest) -> Result<(), NotifyError> {
        self.pending
            .borrow_mut()
            .insert(request.identifier.clone(), request);
        Ok(())
    }

    fn cancel(&self, identifier: &str) -> Result<(), NotifyError> {
        self.pending.borrow_mut().remove(identifier);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn request(identifier: &str, body: &str) -> NotificationRequest {
        NotificationRequest {
            identifier: identifier.to_string(),
            title: "服药提醒".to_string(),
            body: body.to_string(),
            fire_at: Local.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap(),
        }
    }

    #[test]
    fn same_identifier_replaces_pending() {
        let notifier = MemoryNotifier::new();
        notifier.schedule(request("med-a-1", "first")).unwrap();
        notifier.schedule(request("med-a-1", "second")).unwrap();

        let pending = notifier.pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].body, "second");
    }

    #[test]
    fn cancel_is_idempotent() {
        let notifier = MemoryNotifier::new();
        notifier.schedule(request("med-a-1", "x")).unwrap();
        notifier.cancel("med-a-1").unwrap();
        notifier.cancel("med-a-1").unwrap();
        assert!(notifier.pending().is_empty());
    }

    #[test]
    fn null_notifier_denies() {
        assert!(!NullNotifier.authorization_status().allows_delivery());
    }
}
