//! Upcoming events for the dashboard calendar strip.
//!
//! Events come out in patient order, with each patient's completion, kit-return and payment
//! events in that order. Nothing is sorted or deduplicated.

use crate::constants::{COMPLETION_WINDOW_SESSIONS, DEFAULT_LIVE_SESSIONS_AVAILABLE};
use crate::records::{Cohort, Patient};
use crate::stages::{KitStage, WorkflowStage};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Completion,
    KitReturn,
    Payment,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Completion => "completion",
            EventKind::KitReturn => "kit_return",
            EventKind::Payment => "payment",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub patient_id: String,
    /// Display label: a relative phrase or the stored due date.
    pub date: String,
    pub message: String,
    pub detail: String,
}

/// Derives upcoming events for `patients`.
///
/// `_cohorts` is accepted so callers can pass the schedule alongside the roster; no event reads
/// it yet.
pub fn get_upcoming_events(patients: &[Patient], _cohorts: &[Cohort]) -> Vec<UpcomingEvent> {
    let mut events = Vec::new();

    for patient in patients {
        if patient.in_active_program() {
            let remaining = remaining_live_sessions(patient);
            if remaining > 0 && remaining <= COMPLETION_WINDOW_SESSIONS {
                events.push(UpcomingEvent {
                    kind: EventKind::Completion,
                    patient_id: patient.id.to_string(),
                    date: "This week".to_string(),
                    message: format!("{} completing program", patient.name),
                    detail: format!("{remaining} sessions remaining"),
                });
            }
        }

        if patient.kit_stage == Some(KitStage::Delivered)
            && patient.program_stage == Some(WorkflowStage::Completed)
        {
            events.push(UpcomingEvent {
                kind: EventKind::KitReturn,
                patient_id: patient.id.to_string(),
                date: "Pending".to_string(),
                message: format!("{} - Kit return needed", patient.name),
                detail: patient.kit_id.clone().unwrap_or_default(),
            });
        }

        if patient.in_active_maintenance() {
            if let Some(next) = patient.unpaid_payments().next() {
                events.push(UpcomingEvent {
                    kind: EventKind::Payment,
                    patient_id: patient.id.to_string(),
                    date: next
                        .started
                        .map(|d| d.format("%Y-%m-%d").to_string())
                        .unwrap_or_else(|| "TBD".to_string()),
                    message: format!("Payment due - {}", patient.name),
                    detail: format!("${}", next.amount),
                });
            }
        }
    }

    events
}

/// Live sessions left in the program, from raw session counts.
///
/// A missing or zero `liveSessionsAvailable` means the standard program length.
pub fn remaining_live_sessions(patient: &Patient) -> i64 {
    let available = patient
        .live_sessions_available
        .filter(|&n| n > 0)
        .unwrap_or(DEFAULT_LIVE_SESSIONS_AVAILABLE);
    let attended = patient.live_sessions_attended.unwrap_or(0);
    i64::from(available) - i64::from(attended)
}
