//! Patient funnel browsing: search, filters and quick views.

use crate::constants::{AT_RISK_SCORE_CEILING, HEALTHY_SCORE_FLOOR};
use crate::health_score::{calculate_health_score, HealthLevel};
use crate::records::Patient;
use crate::stages::CareStage;
use crate::PrmError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Preset filters offered above the funnel table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuickView {
    /// Low score or an active risk.
    Urgent,
    Risks,
    Deferrals,
    Payments,
    Healthy,
}

impl QuickView {
    pub const ALL: [QuickView; 5] = [
        QuickView::Urgent,
        QuickView::Risks,
        QuickView::Deferrals,
        QuickView::Payments,
        QuickView::Healthy,
    ];

    pub fn id(self) -> &'static str {
        match self {
            QuickView::Urgent => "urgent",
            QuickView::Risks => "risks",
            QuickView::Deferrals => "deferrals",
            QuickView::Payments => "payments",
            QuickView::Healthy => "healthy",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            QuickView::Urgent => "Needs Attention",
            QuickView::Risks => "Active Risks",
            QuickView::Deferrals => "Deferred",
            QuickView::Payments => "Payment Issues",
            QuickView::Healthy => "Healthy",
        }
    }

    pub fn matches(self, patient: &Patient) -> bool {
        match self {
            QuickView::Urgent => {
                patient.has_active_risk()
                    || calculate_health_score(patient).score <= AT_RISK_SCORE_CEILING
            }
            QuickView::Risks => patient.has_active_risk(),
            QuickView::Deferrals => patient.has_active_deferral(),
            // Any stage: a patient who left maintenance can still owe.
            QuickView::Payments => patient.unpaid_payments().next().is_some(),
            QuickView::Healthy => calculate_health_score(patient).score >= HEALTHY_SCORE_FLOOR,
        }
    }
}

impl fmt::Display for QuickView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for QuickView {
    type Err = PrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        QuickView::ALL
            .into_iter()
            .find(|view| view.id() == wanted)
            .ok_or_else(|| PrmError::InvalidInput(format!("unknown quick view: {s:?}")))
    }
}

/// Funnel filter. Unset criteria match everything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PatientFilter {
    /// Case-insensitive substring of name, MRN or id.
    pub search: Option<String>,
    pub stage: Option<CareStage>,
    pub state: Option<String>,
    pub health: Option<HealthLevel>,
    pub view: Option<QuickView>,
    /// Cohort id the patient must be assigned to.
    pub cohort: Option<String>,
}

impl PatientFilter {
    pub fn matches(&self, patient: &Patient) -> bool {
        let search = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        if let Some(needle) = search {
            if !patient.matches_search(needle) {
                return false;
            }
        }

        if let Some(stage) = &self.stage {
            if patient.current_stage.as_ref() != Some(stage) {
                return false;
            }
        }

        if let Some(state) = &self.state {
            if patient.state.as_deref() != Some(state.as_str()) {
                return false;
            }
        }

        if let Some(cohort) = &self.cohort {
            if !patient.in_cohort(cohort) {
                return false;
            }
        }

        if let Some(level) = self.health {
            if calculate_health_score(patient).level != level {
                return false;
            }
        }

        self.view.map_or(true, |view| view.matches(patient))
    }
}

/// Patients matching `filter`, in input order.
pub fn filter_patients<'a>(patients: &'a [Patient], filter: &PatientFilter) -> Vec<&'a Patient> {
    patients.iter().filter(|p| filter.matches(p)).collect()
}

/// Sorted distinct states for the state dropdown.
pub fn distinct_states(patients: &[Patient]) -> Vec<String> {
    patients
        .iter()
        .filter_map(|p| p.state.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::test_support::{patient, payment};
    use crate::stages::{KitStage, WorkflowStage};

    fn roster() -> Vec<Patient> {
        let mut maria = patient("P001");
        maria.name = "Maria Garcia".into();
        maria.mrn = Some("MRN-1001".into());
        maria.state = Some("TX".into());
        maria.current_stage = Some(CareStage::Program);

        let mut james = patient("P002");
        james.name = "James Wilson".into();
        james.state = Some("CA".into());
        james.current_stage = Some(CareStage::Program);
        james.last_risk_stage = Some(WorkflowStage::Active);

        let mut ana = patient("P003");
        ana.name = "Ana Lopez".into();
        ana.state = Some("CA".into());
        ana.current_stage = Some(CareStage::Maintenance);
        ana.last_risk_stage = Some(WorkflowStage::Active);
        ana.last_deferral_stage = Some(WorkflowStage::Active);
        ana.maintenance_payments = vec![payment(1, 199.0, false)];

        let mut kit = patient("P004");
        kit.name = "Lee Chen".into();
        kit.current_stage = Some(CareStage::Kit);
        kit.kit_stage = Some(KitStage::Lost);

        vec![maria, james, ana, kit]
    }

    fn ids(found: &[&Patient]) -> Vec<String> {
        found.iter().map(|p| p.id.to_string()).collect()
    }

    #[test]
    fn empty_filter_keeps_everyone_in_order() {
        let patients = roster();
        let found = filter_patients(&patients, &PatientFilter::default());
        assert_eq!(ids(&found), vec!["P001", "P002", "P003", "P004"]);
    }

    #[test]
    fn search_and_basic_filters_combine() {
        let patients = roster();
        let filter = PatientFilter {
            search: Some("mrn-10".into()),
            ..Default::default()
        };
        assert_eq!(ids(&filter_patients(&patients, &filter)), vec!["P001"]);

        let filter = PatientFilter {
            stage: Some(CareStage::Program),
            state: Some("CA".into()),
            ..Default::default()
        };
        assert_eq!(ids(&filter_patients(&patients, &filter)), vec!["P002"]);

        let filter = PatientFilter {
            search: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(filter_patients(&patients, &filter).len(), 4);
    }

    #[test]
    fn cohort_filter() {
        let mut patients = roster();
        patients[0].cohort_id = Some("C-1".into());
        patients[2].cohort_id = Some("C-2".into());
        let filter = PatientFilter {
            cohort: Some("C-1".into()),
            ..Default::default()
        };
        assert_eq!(ids(&filter_patients(&patients, &filter)), vec!["P001"]);
    }

    #[test]
    fn health_level_filter() {
        let patients = roster();
        let filter = PatientFilter {
            health: Some(HealthLevel::NeedsAttention),
            ..Default::default()
        };
        assert_eq!(ids(&filter_patients(&patients, &filter)), vec!["P002"]);
    }

    #[test]
    fn quick_views() {
        let patients = roster();
        let by_view = |view: QuickView| {
            let filter = PatientFilter {
                view: Some(view),
                ..Default::default()
            };
            ids(&filter_patients(&patients, &filter))
        };

        assert_eq!(by_view(QuickView::Urgent), vec!["P002", "P003"]);
        assert_eq!(by_view(QuickView::Risks), vec!["P002", "P003"]);
        assert_eq!(by_view(QuickView::Deferrals), vec!["P003"]);
        assert_eq!(by_view(QuickView::Payments), vec!["P003"]);
        assert_eq!(by_view(QuickView::Healthy), vec!["P001", "P004"]);
    }

    #[test]
    fn urgent_includes_every_risk() {
        let patients = roster();
        for p in &patients {
            if QuickView::Risks.matches(p) {
                assert!(QuickView::Urgent.matches(p));
            }
        }
    }

    #[test]
    fn quick_view_ids_parse() {
        assert_eq!("Payments".parse::<QuickView>().unwrap(), QuickView::Payments);
        assert!("overdue".parse::<QuickView>().is_err());
        assert_eq!(QuickView::Urgent.label(), "Needs Attention");
    }

    #[test]
    fn states_are_sorted_and_unique() {
        assert_eq!(distinct_states(&roster()), vec!["CA", "TX"]);
    }
}
