//! Headline numbers for the dashboard.

use crate::constants::AT_RISK_SCORE_CEILING;
use crate::health_score::calculate_health_score;
use crate::records::Patient;
use crate::stages::CareStage;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_patients: usize,
    /// Patients in Ramp On, Program or Maintenance.
    pub active_patients: usize,
    /// Patients scoring 2 or lower.
    pub at_risk_patients: usize,
    /// Unpaid maintenance payments across every patient, whatever their stage.
    pub unpaid_payments: usize,
    pub stage_distribution: Vec<StageCount>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StageCount {
    pub stage: CareStage,
    pub count: usize,
}

pub fn summarize(patients: &[Patient]) -> DashboardSummary {
    let active_patients = patients
        .iter()
        .filter(|p| p.current_stage.as_ref().is_some_and(CareStage::is_enrolled))
        .count();

    let at_risk_patients = patients
        .iter()
        .filter(|p| calculate_health_score(p).score <= AT_RISK_SCORE_CEILING)
        .count();

    let unpaid_payments = patients.iter().map(|p| p.unpaid_payments().count()).sum();

    DashboardSummary {
        total_patients: patients.len(),
        active_patients,
        at_risk_patients,
        unpaid_payments,
        stage_distribution: stage_distribution(patients),
    }
}

/// Patient count per funnel stage, every stage listed in funnel order.
///
/// Patients without a stage, or with an unrecognised one, are not counted.
pub fn stage_distribution(patients: &[Patient]) -> Vec<StageCount> {
    CareStage::ALL
        .into_iter()
        .map(|stage| {
            let count = patients
                .iter()
                .filter(|p| p.current_stage.as_ref() == Some(&stage))
                .count();
            StageCount { stage, count }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::test_support::{patient, payment};
    use crate::stages::WorkflowStage;

    fn at_stage(id: &str, stage: CareStage) -> Patient {
        let mut p = patient(id);
        p.current_stage = Some(stage);
        p
    }

    #[test]
    fn empty_roster_lists_every_stage() {
        let summary = summarize(&[]);
        assert_eq!(summary.total_patients, 0);
        assert_eq!(summary.stage_distribution.len(), 5);
        assert!(summary.stage_distribution.iter().all(|s| s.count == 0));
        assert_eq!(summary.stage_distribution[1].stage, CareStage::RampOn);
    }

    #[test]
    fn counts_enrolled_at_risk_and_unpaid() {
        let mut risky = at_stage("P1", CareStage::Program);
        risky.last_risk_stage = Some(WorkflowStage::Active);
        risky.last_deferral_stage = Some(WorkflowStage::Active);

        let mut paying = at_stage("P2", CareStage::Maintenance);
        paying.maintenance_payments = vec![payment(1, 99.0, false), payment(2, 99.0, false)];

        let mut exiting = at_stage("P3", CareStage::RampOff);
        exiting.maintenance_payments = vec![payment(1, 99.0, false)];

        let kit = at_stage("P4", CareStage::Kit);
        let unknown = at_stage("P5", CareStage::Other("Waitlist".into()));

        let summary = summarize(&[risky, paying, exiting, kit, unknown]);
        assert_eq!(summary.total_patients, 5);
        assert_eq!(summary.active_patients, 2);
        assert_eq!(summary.at_risk_patients, 1);
        assert_eq!(summary.unpaid_payments, 3);

        let counts: Vec<usize> = summary.stage_distribution.iter().map(|s| s.count).collect();
        assert_eq!(counts, vec![1, 0, 1, 1, 1]);
    }
}
