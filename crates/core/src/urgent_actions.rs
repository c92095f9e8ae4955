//! Urgent actions for the care team.
//!
//! Each patient is checked against five independent rules (risk, deferral, kit delivery,
//! payment, attendance), so one patient may raise several actions or none. Actions are returned
//! most urgent first; within a priority they keep patient order and then rule order.

use crate::clock::Clock;
use crate::constants::{
    KIT_DELIVERY_GRACE_DAYS, LAST_CONTACT_CAP_DAYS, LOW_ATTENDANCE_THRESHOLD, NO_CONTACT_DAYS,
    RISK_ESCALATION_DAYS,
};
use crate::health_score::whole_percent;
use crate::records::Patient;
use crate::tickets::{find_active, DeferralTicket, RiskTicket};
use crate::PrmError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    /// Sort rank, 0 being most urgent.
    pub fn rank(self) -> u8 {
        match self {
            Priority::Critical => 0,
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = PrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "critical" => Ok(Priority::Critical),
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            _ => Err(PrmError::InvalidInput(format!("unknown priority: {s:?}"))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Risk,
    Deferral,
    Kit,
    Payment,
    Attendance,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Risk => "risk",
            ActionKind::Deferral => "deferral",
            ActionKind::Kit => "kit",
            ActionKind::Payment => "payment",
            ActionKind::Attendance => "attendance",
        }
    }

    /// Patient detail tab the action links to.
    pub fn tab(self) -> &'static str {
        match self {
            ActionKind::Risk => "risk",
            ActionKind::Deferral => "deferral",
            ActionKind::Kit => "kit",
            ActionKind::Payment => "maintenance",
            ActionKind::Attendance => "program",
        }
    }
}

/// Something a staff member should do for a patient.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UrgentAction<'a> {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub priority: Priority,
    pub patient: &'a Patient,
    pub message: String,
    pub detail: String,
    /// Button label.
    pub action: &'static str,
    pub link: String,
}

impl<'a> UrgentAction<'a> {
    fn new(
        kind: ActionKind,
        priority: Priority,
        patient: &'a Patient,
        message: String,
        detail: String,
        action: &'static str,
    ) -> Self {
        Self {
            kind,
            priority,
            patient,
            message,
            detail,
            action,
            link: format!("/patient/{}?tab={}", patient.id, kind.tab()),
        }
    }
}

/// Derives the urgent actions across `patients`, most urgent first.
pub fn get_urgent_actions<'a>(
    patients: &'a [Patient],
    risk_tickets: &[RiskTicket],
    deferral_tickets: &[DeferralTicket],
    clock: &dyn Clock,
) -> Vec<UrgentAction<'a>> {
    let mut actions = Vec::new();

    for patient in patients {
        if let Some(action) = risk_action(patient, risk_tickets, clock) {
            actions.push(action);
        }
        if let Some(action) = deferral_action(patient, deferral_tickets) {
            actions.push(action);
        }
        if let Some(action) = kit_action(patient, clock) {
            actions.push(action);
        }
        if let Some(action) = payment_action(patient) {
            actions.push(action);
        }
        if let Some(action) = attendance_action(patient) {
            actions.push(action);
        }
    }

    // Stable: equal priorities keep patient order, then rule order.
    actions.sort_by_key(|a| a.priority.rank());

    tracing::debug!(
        patients = patients.len(),
        actions = actions.len(),
        "derived urgent actions"
    );
    actions
}

fn risk_action<'a>(
    patient: &'a Patient,
    risk_tickets: &[RiskTicket],
    clock: &dyn Clock,
) -> Option<UrgentAction<'a>> {
    if !patient.has_active_risk() {
        return None;
    }

    let days_since_attempt = find_active(risk_tickets, &patient.id)
        .and_then(|t| t.mitigation_attempted)
        .map(|date| clock.days_since(date))
        .unwrap_or(NO_CONTACT_DAYS);

    let priority = if days_since_attempt > RISK_ESCALATION_DAYS {
        Priority::Critical
    } else {
        Priority::High
    };
    let message = match patient.last_risk_type.as_deref() {
        Some(risk_type) => format!("Active {risk_type} Risk"),
        None => "Active Risk".to_string(),
    };
    let detail = if days_since_attempt > LAST_CONTACT_CAP_DAYS {
        "Last contact: 10+ days ago".to_string()
    } else {
        format!("Last contact: {days_since_attempt} days ago")
    };

    Some(UrgentAction::new(
        ActionKind::Risk,
        priority,
        patient,
        message,
        detail,
        "Take Action",
    ))
}

fn deferral_action<'a>(
    patient: &'a Patient,
    deferral_tickets: &[DeferralTicket],
) -> Option<UrgentAction<'a>> {
    if !patient.has_active_deferral() {
        return None;
    }

    let message = match patient.last_deferral_category.as_deref() {
        Some(category) => format!("Active Deferral ({category})"),
        None => "Active Deferral".to_string(),
    };
    let detail = match find_active(deferral_tickets, &patient.id).and_then(|t| t.ended) {
        Some(date) => format!("Return date: {}", date.format("%Y-%m-%d")),
        None => "Return date TBD".to_string(),
    };

    Some(UrgentAction::new(
        ActionKind::Deferral,
        Priority::Medium,
        patient,
        message,
        detail,
        "Schedule Return",
    ))
}

fn kit_action<'a>(patient: &'a Patient, clock: &dyn Clock) -> Option<UrgentAction<'a>> {
    let shipped = match (patient.outbound_shipped, patient.outbound_delivered) {
        (Some(shipped), None) => shipped,
        _ => return None,
    };

    let days_since_shipped = clock.days_since(shipped);
    if days_since_shipped <= KIT_DELIVERY_GRACE_DAYS {
        return None;
    }

    Some(UrgentAction::new(
        ActionKind::Kit,
        Priority::High,
        patient,
        "Kit Not Delivered".to_string(),
        format!("{days_since_shipped} days since shipped"),
        "Track Shipment",
    ))
}

fn payment_action(patient: &Patient) -> Option<UrgentAction<'_>> {
    if !patient.in_active_maintenance() {
        return None;
    }

    let mut unpaid = patient.unpaid_payments();
    let first = unpaid.next()?;
    let count = 1 + unpaid.count();

    Some(UrgentAction::new(
        ActionKind::Payment,
        Priority::High,
        patient,
        format!("{count} Unpaid Payment(s)"),
        format!("Month {} - ${}", first.month, first.amount),
        "Send Reminder",
    ))
}

fn attendance_action(patient: &Patient) -> Option<UrgentAction<'_>> {
    // An active risk already raises its own action.
    if !patient.in_active_program() || patient.has_active_risk() {
        return None;
    }

    let average = patient.average_attendance();
    if average >= LOW_ATTENDANCE_THRESHOLD {
        return None;
    }

    Some(UrgentAction::new(
        ActionKind::Attendance,
        Priority::Medium,
        patient,
        "Low Attendance".to_string(),
        format!("Average: {}", whole_percent(average)),
        "Create Risk Ticket",
    ))
}

/// Actions at exactly `priority`, or all of them when `None`, keeping their order.
pub fn with_priority<'s, 'a>(
    actions: &'s [UrgentAction<'a>],
    priority: Option<Priority>,
) -> impl Iterator<Item = &'s UrgentAction<'a>> + 's {
    actions
        .iter()
        .filter(move |a| priority.map_or(true, |p| a.priority == p))
}
