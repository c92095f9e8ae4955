//! Patient health score.
//!
//! A patient starts at 5 and loses points for each concern found on their record. Every
//! concern is checked on its own and all deductions are summed before the result is clamped to
//! 1..=5, so the order of the checks never matters. Each deduction is reported as a
//! [`HealthFactor`] so the score can be explained.

use crate::constants::{
    ACTIVE_DEFERRAL_IMPACT, ACTIVE_RISK_IMPACT, BASELINE_HEALTH_SCORE,
    BELOW_TARGET_ATTENDANCE_IMPACT, KIT_ISSUE_IMPACT, LOW_ATTENDANCE_IMPACT,
    LOW_ATTENDANCE_THRESHOLD, MAX_HEALTH_SCORE, MIN_HEALTH_SCORE, TARGET_ATTENDANCE_THRESHOLD,
    UNPAID_PAYMENT_IMPACT,
};
use crate::records::Patient;
use crate::PrmError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Health score with its explanation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthScore {
    /// Always within 1..=5.
    pub score: u8,
    pub level: HealthLevel,
    pub color: HealthColor,
    pub factors: Vec<HealthFactor>,
}

/// A single deduction and why it applied.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthFactor {
    #[serde(rename = "type")]
    pub kind: FactorKind,
    pub impact: i32,
    pub reason: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactorKind {
    Risk,
    Deferral,
    Attendance,
    Payment,
    Kit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthLevel {
    Healthy,
    #[serde(rename = "Needs Attention")]
    NeedsAttention,
    #[serde(rename = "At Risk")]
    AtRisk,
    Critical,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthColor {
    Green,
    Yellow,
    Orange,
    Red,
}

impl HealthLevel {
    /// Maps a 1..=5 score to its band: 4-5 healthy, 3 needs attention, 2 at risk, else critical.
    pub fn from_score(score: u8) -> Self {
        match score {
            4.. => HealthLevel::Healthy,
            3 => HealthLevel::NeedsAttention,
            2 => HealthLevel::AtRisk,
            _ => HealthLevel::Critical,
        }
    }

    /// Display label, as shown on the dashboard and accepted by the funnel filter.
    pub fn as_str(self) -> &'static str {
        match self {
            HealthLevel::Healthy => "Healthy",
            HealthLevel::NeedsAttention => "Needs Attention",
            HealthLevel::AtRisk => "At Risk",
            HealthLevel::Critical => "Critical",
        }
    }
}

impl fmt::Display for HealthLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HealthLevel {
    type Err = PrmError;

    /// Accepts display labels as well as kebab/snake-case forms, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .flat_map(char::to_lowercase)
            .collect();
        match normalised.as_str() {
            "healthy" => Ok(HealthLevel::Healthy),
            "needsattention" => Ok(HealthLevel::NeedsAttention),
            "atrisk" => Ok(HealthLevel::AtRisk),
            "critical" => Ok(HealthLevel::Critical),
            _ => Err(PrmError::InvalidInput(format!("unknown health level: {s:?}"))),
        }
    }
}

impl HealthColor {
    /// Colour used for a score; same bands as [`HealthLevel::from_score`].
    pub fn from_score(score: u8) -> Self {
        match score {
            4.. => HealthColor::Green,
            3 => HealthColor::Yellow,
            2 => HealthColor::Orange,
            _ => HealthColor::Red,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HealthColor::Green => "green",
            HealthColor::Yellow => "yellow",
            HealthColor::Orange => "orange",
            HealthColor::Red => "red",
        }
    }
}

impl FactorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FactorKind::Risk => "risk",
            FactorKind::Deferral => "deferral",
            FactorKind::Attendance => "attendance",
            FactorKind::Payment => "payment",
            FactorKind::Kit => "kit",
        }
    }
}

/// Scores a patient.
///
/// # Arguments
///
/// * `patient` - The record to score. Missing fields never deduct points.
///
/// # Returns
///
/// A [`HealthScore`] with the clamped score, its level and colour, and one
/// [`HealthFactor`] per deduction in check order (risk, deferral, attendance, payment, kit).
pub fn calculate_health_score(patient: &Patient) -> HealthScore {
    let mut factors = Vec::new();

    if patient.has_active_risk() {
        factors.push(factor(FactorKind::Risk, ACTIVE_RISK_IMPACT, "Active risk ticket"));
    }

    if patient.has_active_deferral() {
        factors.push(factor(FactorKind::Deferral, ACTIVE_DEFERRAL_IMPACT, "Active deferral"));
    }

    if patient.in_active_program() {
        let average = patient.average_attendance();
        if average < LOW_ATTENDANCE_THRESHOLD {
            factors.push(factor(
                FactorKind::Attendance,
                LOW_ATTENDANCE_IMPACT,
                format!("Low attendance ({})", whole_percent(average)),
            ));
        } else if average < TARGET_ATTENDANCE_THRESHOLD {
            factors.push(factor(
                FactorKind::Attendance,
                BELOW_TARGET_ATTENDANCE_IMPACT,
                format!("Below target attendance ({})", whole_percent(average)),
            ));
        }
    }

    if patient.in_active_maintenance() {
        let unpaid = patient.unpaid_payments().count();
        if unpaid > 0 {
            factors.push(factor(
                FactorKind::Payment,
                UNPAID_PAYMENT_IMPACT,
                format!("{unpaid} unpaid payment(s)"),
            ));
        }
    }

    if patient.has_kit_issue() {
        factors.push(factor(FactorKind::Kit, KIT_ISSUE_IMPACT, "Kit delivery issue"));
    }

    let raw = BASELINE_HEALTH_SCORE + factors.iter().map(|f| f.impact).sum::<i32>();
    // Clamped to 1..=5, so the cast cannot truncate.
    let score = raw.clamp(MIN_HEALTH_SCORE, MAX_HEALTH_SCORE) as u8;

    if !factors.is_empty() {
        tracing::debug!(
            patient = %patient.id,
            score,
            deductions = factors.len(),
            "scored patient"
        );
    }

    HealthScore {
        score,
        level: HealthLevel::from_score(score),
        color: HealthColor::from_score(score),
        factors,
    }
}

/// Five-dot meter for a score, e.g. `●●●○○` for 3.
///
/// Scores outside 1..=5 render as empty.
pub fn health_icon(score: u8) -> &'static str {
    match score {
        5 => "●●●●●",
        4 => "●●●●○",
        3 => "●●●○○",
        2 => "●●○○○",
        1 => "●○○○○",
        _ => "○○○○○",
    }
}

/// Rounds an attendance average for display, halves away from zero.
pub(crate) fn whole_percent(average: f64) -> String {
    format!("{}%", average.round() as i64)
}

fn factor(kind: FactorKind, impact: i32, reason: impl Into<String>) -> HealthFactor {
    HealthFactor {
        kind,
        impact,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::test_support::{patient, payment};
    use crate::stages::{KitStage, WorkflowStage};
    use prm_types::Percent;

    fn in_program(live: &str, solo: &str) -> Patient {
        let mut p = patient("P1");
        p.program_stage = Some(WorkflowStage::Active);
        p.live_session_attendance = Percent::parse_lenient(live);
        p.solo_session_attendance = Percent::parse_lenient(solo);
        p
    }

    #[test]
    fn neutral_patient_is_fully_healthy() {
        let health = calculate_health_score(&patient("P1"));
        assert_eq!(health.score, 5);
        assert_eq!(health.level, HealthLevel::Healthy);
        assert_eq!(health.color, HealthColor::Green);
        assert!(health.factors.is_empty());
    }

    #[test]
    fn kit_issue_alone_stays_healthy() {
        let mut p = patient("P1");
        p.kit_stage = Some(KitStage::Delayed);
        let health = calculate_health_score(&p);
        assert_eq!(health.score, 4);
        assert_eq!(health.level, HealthLevel::Healthy);
        assert_eq!(health.factors[0].reason, "Kit delivery issue");

        p.kit_stage = Some(KitStage::Lost);
        assert_eq!(calculate_health_score(&p).score, 4);

        p.kit_stage = Some(KitStage::InTransit);
        assert_eq!(calculate_health_score(&p).score, 5);
    }

    #[test]
    fn attendance_at_fifty_is_below_target_not_low() {
        let health = calculate_health_score(&in_program("40", "60"));
        assert_eq!(health.score, 4);
        assert_eq!(health.factors.len(), 1);
        assert_eq!(health.factors[0].impact, -1);
        assert_eq!(health.factors[0].reason, "Below target attendance (50%)");
    }

    #[test]
    fn attendance_bands() {
        assert_eq!(calculate_health_score(&in_program("30", "40")).score, 3);
        assert_eq!(
            calculate_health_score(&in_program("30", "40")).factors[0].reason,
            "Low attendance (35%)"
        );
        assert_eq!(calculate_health_score(&in_program("75", "75")).score, 5);
        assert_eq!(calculate_health_score(&in_program("74", "75")).score, 4);
    }

    #[test]
    fn unparseable_attendance_counts_as_zero() {
        let health = calculate_health_score(&in_program("N/A", ""));
        assert_eq!(health.score, 3);
        assert_eq!(health.factors[0].reason, "Low attendance (0%)");
    }

    #[test]
    fn attendance_ignored_outside_active_program() {
        let mut p = in_program("0", "0");
        p.program_stage = Some(WorkflowStage::Completed);
        assert_eq!(calculate_health_score(&p).score, 5);
    }

    #[test]
    fn unpaid_payments_deduct_once() {
        let mut p = patient("P1");
        p.maintenance_stage = Some(WorkflowStage::Active);
        p.maintenance_payments = vec![
            payment(1, 199.0, true),
            payment(2, 199.0, false),
            payment(3, 199.0, false),
        ];
        let health = calculate_health_score(&p);
        assert_eq!(health.score, 4);
        assert_eq!(health.factors[0].reason, "2 unpaid payment(s)");

        p.maintenance_stage = Some(WorkflowStage::Completed);
        assert_eq!(calculate_health_score(&p).score, 5);
    }

    #[test]
    fn stacked_deductions_clamp_to_one() {
        let mut p = in_program("10", "20");
        p.last_risk_stage = Some(WorkflowStage::Active);
        p.last_deferral_stage = Some(WorkflowStage::Active);
        let health = calculate_health_score(&p);
        assert_eq!(health.score, 1);
        assert_eq!(health.level, HealthLevel::Critical);
        assert_eq!(health.color, HealthColor::Red);
        let impacts: Vec<i32> = health.factors.iter().map(|f| f.impact).collect();
        assert_eq!(impacts, vec![-2, -1, -2]);
    }

    #[test]
    fn every_combination_stays_in_range_and_is_explained() {
        for mask in 0u8..32 {
            let mut p = patient("P1");
            if mask & 1 != 0 {
                p.last_risk_stage = Some(WorkflowStage::Active);
            }
            if mask & 2 != 0 {
                p.last_deferral_stage = Some(WorkflowStage::Active);
            }
            if mask & 4 != 0 {
                p.program_stage = Some(WorkflowStage::Active);
            }
            if mask & 8 != 0 {
                p.maintenance_stage = Some(WorkflowStage::Active);
                p.maintenance_payments = vec![payment(1, 99.0, false)];
            }
            if mask & 16 != 0 {
                p.kit_stage = Some(KitStage::Lost);
            }

            let health = calculate_health_score(&p);
            assert!((1..=5).contains(&health.score), "mask {mask}");
            let total: i32 = health.factors.iter().map(|f| f.impact).sum();
            assert_eq!(i32::from(health.score), (5 + total).max(1), "mask {mask}");
            assert_eq!(health, calculate_health_score(&p), "mask {mask}");
        }
    }

    #[test]
    fn level_and_color_follow_score() {
        let expected = [
            (5, HealthLevel::Healthy, HealthColor::Green),
            (4, HealthLevel::Healthy, HealthColor::Green),
            (3, HealthLevel::NeedsAttention, HealthColor::Yellow),
            (2, HealthLevel::AtRisk, HealthColor::Orange),
            (1, HealthLevel::Critical, HealthColor::Red),
        ];
        for (score, level, color) in expected {
            assert_eq!(HealthLevel::from_score(score), level);
            assert_eq!(HealthColor::from_score(score), color);
        }
    }

    #[test]
    fn parses_level_labels() {
        assert_eq!("Needs Attention".parse::<HealthLevel>().unwrap(), HealthLevel::NeedsAttention);
        assert_eq!("at-risk".parse::<HealthLevel>().unwrap(), HealthLevel::AtRisk);
        assert_eq!("CRITICAL".parse::<HealthLevel>().unwrap(), HealthLevel::Critical);
        assert!("fine".parse::<HealthLevel>().is_err());
    }

    #[test]
    fn icons() {
        assert_eq!(health_icon(4), "●●●●○");
        assert_eq!(health_icon(1), "●○○○○");
        assert_eq!(health_icon(0), "○○○○○");
    }

    #[test]
    fn serializes_with_dashboard_labels() {
        let mut p = patient("P1");
        p.last_risk_stage = Some(WorkflowStage::Active);
        let json = serde_json::to_value(calculate_health_score(&p)).unwrap();
        assert_eq!(json["level"], "Needs Attention");
        assert_eq!(json["color"], "yellow");
        assert_eq!(json["factors"][0]["type"], "risk");
    }
}
