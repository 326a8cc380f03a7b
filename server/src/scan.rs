//! Ticket verification: a decoded QR string is looked up as a registration id
//! and accepted only for a form registration of the event being scanned.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::Registration;
use crate::store::DocumentStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    CheckedIn {
        registration: Registration,
        /// False when the ticket had already been used; `checked_in_at` is left untouched.
        first_scan: bool,
    },
    DifferentEvent,
    NotFound,
    SystemError,
}

/// Reads the store directly rather than the catalog cache so tickets issued
/// by other sessions still verify.
pub async fn verify_ticket(
    store: &dyn DocumentStore,
    decoded: &str,
    event_id: &str,
    now: DateTime<Utc>,
) -> ScanOutcome {
    let ticket = decoded.trim();
    if ticket.is_empty() {
        return ScanOutcome::NotFound;
    }

    let registration = match store.find_registration(ticket).await {
        Ok(Some(registration)) if registration.is_guest() => registration,
        // Shared-link visit records are not tickets
        Ok(_) => return ScanOutcome::NotFound,
        Err(e) => {
            tracing::error!(error = %e, ticket, "Ticket lookup failed");
            return ScanOutcome::SystemError;
        }
    };

    if registration.event_id != event_id {
        tracing::info!(ticket, event_id, ticket_event = %registration.event_id, "Ticket scanned at the wrong event");
        return ScanOutcome::DifferentEvent;
    }

    if registration.checked_in {
        tracing::info!(ticket, event_id, "Ticket scanned again after check-in");
        return ScanOutcome::CheckedIn {
            registration,
            first_scan: false,
        };
    }

    match store.check_in(ticket, now).await {
        Ok(Some(registration)) => ScanOutcome::CheckedIn {
            registration,
            first_scan: true,
        },
        // Lost a race with another scanner
        Ok(None) => match store.find_registration(ticket).await {
            Ok(Some(registration)) => ScanOutcome::CheckedIn {
                registration,
                first_scan: false,
            },
            Ok(None) => ScanOutcome::NotFound,
            Err(e) => {
                tracing::error!(error = %e, ticket, "Ticket lookup failed");
                ScanOutcome::SystemError
            }
        },
        Err(e) => {
            tracing::error!(error = %e, ticket, "Check-in failed");
            ScanOutcome::SystemError
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    Success,
    Error,
    NotFound,
}

/// Scan result as shown to the door staff.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub status: ScanStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration: Option<Registration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub already_checked_in: Option<bool>,
}

impl From<ScanOutcome> for ScanReport {
    fn from(outcome: ScanOutcome) -> Self {
        match outcome {
            ScanOutcome::CheckedIn {
                registration,
                first_scan,
            } => Self {
                status: ScanStatus::Success,
                message: if first_scan {
                    format!("Ticket verified. Welcome, {}!", registration.name)
                } else {
                    format!("{} has already checked in.", registration.name)
                },
                registration: Some(registration),
                already_checked_in: Some(!first_scan),
            },
            ScanOutcome::DifferentEvent => Self::failure(
                ScanStatus::Error,
                "This ticket is for a different event.",
            ),
            ScanOutcome::NotFound => Self::failure(
                ScanStatus::NotFound,
                "No registration matches this ticket.",
            ),
            ScanOutcome::SystemError => Self::failure(
                ScanStatus::Error,
                "A system error occurred while verifying the ticket. Please try again.",
            ),
        }
    }
}

impl ScanReport {
    fn failure(status: ScanStatus, message: &str) -> Self {
        Self {
            status,
            message: message.to_string(),
            registration: None,
            already_checked_in: None,
        }
    }
}
