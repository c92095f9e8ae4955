//! Patient, payment and cohort records.
//!
//! Records mirror the dashboard's fixture shape (camelCase keys). Every field other than the
//! patient's identity is optional; an absent value is `None` and never triggers a score
//! deduction or an action on its own. Fields the dashboard shows but no derivation reads are kept
//! in `extra` so they survive a load and can be served back unchanged.

use crate::stages::{is_active, CareStage, KitStage, WorkflowStage};
use chrono::NaiveDate;
use prm_types::{lenient_percent, NonEmptyText, Percent};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One month of a maintenance subscription.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenancePayment {
    /// Month of the subscription, 1-based. Absent reads as 0.
    #[serde(default)]
    pub month: u32,
    /// Amount due in dollars. Absent reads as 0.
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub paid: bool,
    /// Day the billing period starts; also its due date.
    #[serde(default, deserialize_with = "lenient_date")]
    pub started: Option<NaiveDate>,
}

/// A patient as tracked by the care team.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: NonEmptyText,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mrn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_stage: Option<CareStage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program_stage: Option<WorkflowStage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance_stage: Option<WorkflowStage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kit_stage: Option<KitStage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_risk_stage: Option<WorkflowStage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_risk_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_deferral_stage: Option<WorkflowStage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_deferral_category: Option<String>,

    /// Share of live sessions attended, as already computed upstream.
    #[serde(
        default,
        deserialize_with = "lenient_percent",
        skip_serializing_if = "Option::is_none"
    )]
    pub live_session_attendance: Option<Percent>,
    /// Share of solo sessions completed, as already computed upstream.
    #[serde(
        default,
        deserialize_with = "lenient_percent",
        skip_serializing_if = "Option::is_none"
    )]
    pub solo_session_attendance: Option<Percent>,
    /// Raw count of live sessions attended.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_sessions_attended: Option<u32>,
    /// Raw count of live sessions offered in the program.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_sessions_available: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kit_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub outbound_shipped: Option<NaiveDate>,
    #[serde(
        default,
        deserialize_with = "lenient_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub outbound_delivered: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cohort_id: Option<String>,

    #[serde(default)]
    pub maintenance_payments: Vec<MaintenancePayment>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Patient {
    /// A patient with only identity set; every optional field is absent.
    pub fn new(id: NonEmptyText, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            mrn: None,
            state: None,
            current_stage: None,
            program_stage: None,
            maintenance_stage: None,
            kit_stage: None,
            last_risk_stage: None,
            last_risk_type: None,
            last_deferral_stage: None,
            last_deferral_category: None,
            live_session_attendance: None,
            solo_session_attendance: None,
            live_sessions_attended: None,
            live_sessions_available: None,
            kit_id: None,
            outbound_shipped: None,
            outbound_delivered: None,
            cohort_id: None,
            maintenance_payments: Vec::new(),
            extra: BTreeMap::new(),
        }
    }

    /// Whether the patient's latest risk ticket is still open.
    ///
    /// # Returns
    ///
    /// `true` only for an `Active` `lastRiskStage`; absent or unrecognised stages are `false`.
    pub fn has_active_risk(&self) -> bool {
        is_active(self.last_risk_stage.as_ref())
    }

    /// Whether the patient's enrolment is currently paused by an open deferral.
    pub fn has_active_deferral(&self) -> bool {
        is_active(self.last_deferral_stage.as_ref())
    }

    /// Whether the patient is attending program sessions right now.
    pub fn in_active_program(&self) -> bool {
        is_active(self.program_stage.as_ref())
    }

    /// Whether the patient is in a paid maintenance period.
    pub fn in_active_maintenance(&self) -> bool {
        is_active(self.maintenance_stage.as_ref())
    }

    /// Whether the kit shipment is delayed or lost.
    pub fn has_kit_issue(&self) -> bool {
        self.kit_stage
            .as_ref()
            .is_some_and(KitStage::has_delivery_issue)
    }

    /// Mean of live and solo attendance; a missing figure counts as 0%.
    pub fn average_attendance(&self) -> f64 {
        Percent::average(
            self.live_session_attendance.unwrap_or(Percent::ZERO),
            self.solo_session_attendance.unwrap_or(Percent::ZERO),
        )
    }

    /// Unpaid maintenance payments in stored order.
    pub fn unpaid_payments(&self) -> impl Iterator<Item = &MaintenancePayment> {
        self.maintenance_payments.iter().filter(|p| !p.paid)
    }

    /// Whether the patient is assigned to `cohort_id`.
    pub fn in_cohort(&self, cohort_id: &str) -> bool {
        self.cohort_id.as_deref().map(str::trim) == Some(cohort_id.trim())
    }

    /// Whether the patient still needs a cohort: none assigned and the program not completed.
    pub fn awaiting_cohort(&self) -> bool {
        let unassigned = self
            .cohort_id
            .as_deref()
            .map_or(true, |id| id.trim().is_empty());
        unassigned && self.program_stage != Some(WorkflowStage::Completed)
    }

    /// Matches against name, MRN or id, ignoring case.
    ///
    /// # Arguments
    ///
    /// * `needle` - Substring to look for; callers trim it and skip blank searches.
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self
                .mrn
                .as_deref()
                .is_some_and(|mrn| mrn.to_lowercase().contains(&needle))
            || self.id.as_str().to_lowercase().contains(&needle)
    }
}

/// A scheduled group of patients going through the program together.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cohort {
    pub id: NonEmptyText,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub cohort_type: Option<String>,
    /// Seat capacity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    /// Length label for live sessions, e.g. `60 MIN`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_session_type: Option<String>,
    /// Weekday codes joined by `-`, e.g. `M-W`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_days: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solo_days: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solo_time: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Cohort {
    /// A cohort with only its id set.
    pub fn new(id: NonEmptyText) -> Self {
        Self {
            id,
            cohort_type: None,
            size: None,
            live_session_type: None,
            live_days: None,
            live_time: None,
            solo_days: None,
            solo_time: None,
            extra: BTreeMap::new(),
        }
    }
}

/// Deserialises an optional calendar date, tolerating blanks and timestamps.
///
/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp (the date part is kept). Anything else,
/// including empty strings, becomes `None`.
pub(crate) fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_date))
}

pub(crate) fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().or_else(|| {
        chrono::DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.date_naive())
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn patient(id: &str) -> Patient {
        Patient::new(NonEmptyText::new(id).expect("id"), format!("Patient {id}"))
    }

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    pub fn payment(month: u32, amount: f64, paid: bool) -> MaintenancePayment {
        MaintenancePayment {
            month,
            amount,
            paid,
            started: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn parses_dashboard_shaped_record() {
        let input = r#"{
            "id": "P001",
            "name": "Maria Garcia",
            "mrn": "MRN-1001",
            "state": "CA",
            "currentStage": "Program",
            "programStage": "Active",
            "kitStage": "Delivered",
            "lastRiskStage": "",
            "liveSessionAttendance": "85%",
            "soloSessionAttendance": "70",
            "liveSessionsAttended": 12,
            "liveSessionsAvailable": 18,
            "outboundShipped": "2024-09-01",
            "outboundDelivered": "",
            "rampOnTime": "3 days",
            "maintenancePayments": [
                { "month": 1, "amount": 199, "paid": true, "started": "2024-10-01" }
            ]
        }"#;

        let patient: Patient = serde_json::from_str(input).expect("parse patient");
        assert_eq!(patient.id.as_str(), "P001");
        assert_eq!(patient.current_stage, Some(CareStage::Program));
        assert!(patient.in_active_program());
        assert!(!patient.has_active_risk());
        assert_eq!(patient.live_session_attendance, Some(Percent::new(85)));
        assert_eq!(patient.outbound_shipped, Some(date(2024, 9, 1)));
        assert_eq!(patient.outbound_delivered, None);
        assert_eq!(patient.maintenance_payments[0].started, Some(date(2024, 10, 1)));
        assert_eq!(
            patient.extra.get("rampOnTime"),
            Some(&serde_json::Value::String("3 days".into()))
        );
    }

    #[test]
    fn payment_without_amount_defaults_to_zero() {
        let input = r#"{"id":"P1","name":"x","maintenancePayments":[{"paid":false}]}"#;
        let patient: Patient = serde_json::from_str(input).expect("parse patient");
        let due = &patient.maintenance_payments[0];
        assert_eq!(due.month, 0);
        assert_eq!(due.amount, 0.0);
        assert_eq!(patient.unpaid_payments().count(), 1);
    }

    #[test]
    fn rejects_blank_id() {
        let err = serde_json::from_str::<Patient>(r#"{"id":"  ","name":"x"}"#)
            .expect_err("blank id");
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn missing_attendance_averages_as_zero() {
        let mut p = patient("P1");
        p.live_session_attendance = Some(Percent::new(80));
        assert_eq!(p.average_attendance(), 40.0);
    }

    #[test]
    fn unpaid_payments_keep_stored_order() {
        let mut p = patient("P1");
        p.maintenance_payments = vec![
            payment(3, 199.0, false),
            payment(1, 199.0, true),
            payment(2, 149.0, false),
        ];
        let months: Vec<u32> = p.unpaid_payments().map(|pm| pm.month).collect();
        assert_eq!(months, vec![3, 2]);
    }

    #[test]
    fn search_covers_name_mrn_and_id() {
        let mut p = patient("P042");
        p.name = "James Wilson".into();
        p.mrn = Some("MRN-2042".into());
        assert!(p.matches_search("wilson"));
        assert!(p.matches_search("mrn-20"));
        assert!(p.matches_search("p04"));
        assert!(!p.matches_search("garcia"));
    }

    #[test]
    fn parse_date_accepts_timestamps() {
        assert_eq!(parse_date("2024-11-03T09:15:00Z"), Some(date(2024, 11, 3)));
        assert_eq!(parse_date("Nov 3"), None);
        assert_eq!(parse_date(""), None);
    }
}
