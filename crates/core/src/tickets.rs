//! Risk and deferral tickets.
//!
//! Tickets are workflow records keyed by patient. A patient's `lastRiskStage` /
//! `lastDeferralStage` summarise the newest ticket; the tickets themselves carry the milestone
//! dates.

use crate::records::lenient_date;
use crate::stages::WorkflowStage;
use chrono::NaiveDate;
use prm_types::NonEmptyText;
use serde::{Deserialize, Serialize};

/// An open or historical problem flagged for a patient.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskTicket {
    pub id: NonEmptyText,
    pub patient_id: NonEmptyText,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub risk_type: Option<String>,
    pub stage: WorkflowStage,
    #[serde(
        default,
        deserialize_with = "lenient_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub triggered: Option<NaiveDate>,
    /// Last time staff tried to reach the patient about this risk.
    #[serde(
        default,
        deserialize_with = "lenient_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub mitigation_attempted: Option<NaiveDate>,
    #[serde(
        default,
        deserialize_with = "lenient_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub mitigation_completed: Option<NaiveDate>,
    #[serde(
        default,
        deserialize_with = "lenient_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub clinic_assistance_requested: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A paused-enrolment period for a patient.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeferralTicket {
    pub id: NonEmptyText,
    pub patient_id: NonEmptyText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub stage: WorkflowStage,
    #[serde(
        default,
        deserialize_with = "lenient_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub initiated: Option<NaiveDate>,
    /// Planned or actual return date.
    #[serde(
        default,
        deserialize_with = "lenient_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub ended: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Access shared by both ticket kinds.
pub trait Ticket {
    fn patient_id(&self) -> &NonEmptyText;
    fn stage(&self) -> &WorkflowStage;
}

impl Ticket for RiskTicket {
    fn patient_id(&self) -> &NonEmptyText {
        &self.patient_id
    }

    fn stage(&self) -> &WorkflowStage {
        &self.stage
    }
}

impl Ticket for DeferralTicket {
    fn patient_id(&self) -> &NonEmptyText {
        &self.patient_id
    }

    fn stage(&self) -> &WorkflowStage {
        &self.stage
    }
}

/// First active ticket for `patient_id`, in stored order.
pub fn find_active<'a, T: Ticket>(tickets: &'a [T], patient_id: &NonEmptyText) -> Option<&'a T> {
    tickets
        .iter()
        .find(|t| t.patient_id() == patient_id && t.stage().is_active())
}

/// All tickets for `patient_id`, in stored order.
pub fn for_patient<'a, 'b, T: Ticket>(
    tickets: &'a [T],
    patient_id: &'b NonEmptyText,
) -> impl Iterator<Item = &'a T> + 'b
where
    'a: 'b,
{
    tickets.iter().filter(move |t| t.patient_id() == patient_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn risk(id: &str, patient: &str, stage: &str) -> RiskTicket {
        RiskTicket {
            id: NonEmptyText::new(id).unwrap(),
            patient_id: NonEmptyText::new(patient).unwrap(),
            risk_type: Some("Engagement".into()),
            stage: WorkflowStage::from(stage),
            triggered: None,
            mitigation_attempted: None,
            mitigation_completed: None,
            clinic_assistance_requested: None,
            notes: None,
        }
    }

    #[test]
    fn parses_risk_ticket() {
        let input = r#"{
            "id": "R001",
            "patientId": "P003",
            "type": "Medical",
            "stage": "Active",
            "triggered": "2024-10-28",
            "mitigationAttempted": "2024-11-01",
            "mitigationCompleted": ""
        }"#;
        let ticket: RiskTicket = serde_json::from_str(input).expect("parse ticket");
        assert_eq!(ticket.risk_type.as_deref(), Some("Medical"));
        assert!(ticket.stage.is_active());
        assert_eq!(ticket.mitigation_attempted, NaiveDate::from_ymd_opt(2024, 11, 1));
        assert_eq!(ticket.mitigation_completed, None);
    }

    #[test]
    fn find_active_skips_closed_and_foreign_tickets() {
        let tickets = vec![
            risk("R1", "P1", "Resolved"),
            risk("R2", "P2", "Active"),
            risk("R3", "P1", "Active"),
            risk("R4", "P1", "Active"),
        ];
        let p1 = NonEmptyText::new("P1").unwrap();
        let found = find_active(&tickets, &p1).expect("active ticket");
        assert_eq!(found.id.as_str(), "R3");
        assert_eq!(for_patient(&tickets, &p1).count(), 3);
    }

    #[test]
    fn find_active_returns_none_without_match() {
        let tickets = vec![risk("R1", "P1", "Resolved")];
        let p1 = NonEmptyText::new("P1").unwrap();
        assert!(find_active(&tickets, &p1).is_none());
    }
}
