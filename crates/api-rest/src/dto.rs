//! Wire types for the REST API.
//!
//! Handlers translate core values into these flat, documented shapes so the OpenAPI schema
//! stays independent of the core data model.

use prm_core::cohorts::weekday_name;
use prm_core::{
    calculate_health_score, health_icon, CohortSummary, DashboardSummary, HealthScore, Patient,
    PatientFilter, Priority, PrmError, ScheduleDay, ScheduledSession, UpcomingEvent, UrgentAction,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthFactorRes {
    #[serde(rename = "type")]
    pub kind: String,
    pub impact: i32,
    pub reason: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthScoreRes {
    pub score: u8,
    pub level: String,
    pub color: String,
    pub icon: String,
    pub factors: Vec<HealthFactorRes>,
}

impl From<HealthScore> for HealthScoreRes {
    fn from(health: HealthScore) -> Self {
        Self {
            score: health.score,
            level: health.level.to_string(),
            color: health.color.as_str().to_string(),
            icon: health_icon(health.score).to_string(),
            factors: health
                .factors
                .into_iter()
                .map(|f| HealthFactorRes {
                    kind: f.kind.as_str().to_string(),
                    impact: f.impact,
                    reason: f.reason,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatientSummaryRes {
    pub id: String,
    pub name: String,
    pub mrn: Option<String>,
    pub state: Option<String>,
    pub current_stage: Option<String>,
    pub health: HealthScoreRes,
}

impl PatientSummaryRes {
    pub fn new(patient: &Patient, health: HealthScore) -> Self {
        Self {
            id: patient.id.to_string(),
            name: patient.name.clone(),
            mrn: patient.mrn.clone(),
            state: patient.state.clone(),
            current_stage: patient.current_stage.as_ref().map(ToString::to_string),
            health: health.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListPatientsRes {
    pub patients: Vec<PatientSummaryRes>,
    /// Distinct states across the whole roster, for filter dropdowns.
    pub states: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatientDetailRes {
    /// The full patient record as loaded.
    #[schema(value_type = Object)]
    pub patient: serde_json::Value,
    pub health: HealthScoreRes,
    #[schema(value_type = Vec<Object>)]
    pub risk_tickets: Vec<serde_json::Value>,
    #[schema(value_type = Vec<Object>)]
    pub deferral_tickets: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UrgentActionRes {
    #[serde(rename = "type")]
    pub kind: String,
    pub priority: String,
    pub patient_id: String,
    pub patient_name: String,
    pub message: String,
    pub detail: String,
    pub action: String,
    pub link: String,
}

impl From<&UrgentAction<'_>> for UrgentActionRes {
    fn from(action: &UrgentAction<'_>) -> Self {
        Self {
            kind: action.kind.as_str().to_string(),
            priority: action.priority.to_string(),
            patient_id: action.patient.id.to_string(),
            patient_name: action.patient.name.clone(),
            message: action.message.clone(),
            detail: action.detail.clone(),
            action: action.action.to_string(),
            link: action.link.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListActionsRes {
    pub actions: Vec<UrgentActionRes>,
    /// Number of actions before `limit` was applied.
    pub total: usize,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingEventRes {
    #[serde(rename = "type")]
    pub kind: String,
    pub patient_id: String,
    pub date: String,
    pub message: String,
    pub detail: String,
}

impl From<UpcomingEvent> for UpcomingEventRes {
    fn from(event: UpcomingEvent) -> Self {
        Self {
            kind: event.kind.as_str().to_string(),
            patient_id: event.patient_id,
            date: event.date,
            message: event.message,
            detail: event.detail,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListEventsRes {
    pub events: Vec<UpcomingEventRes>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StageCountRes {
    pub stage: String,
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRes {
    /// Date the figures were computed for (YYYY-MM-DD).
    pub today: String,
    pub total_patients: usize,
    pub active_patients: usize,
    pub at_risk_patients: usize,
    pub unpaid_payments: usize,
    pub urgent_actions: usize,
    pub stage_distribution: Vec<StageCountRes>,
}

impl SummaryRes {
    pub fn new(today: String, summary: DashboardSummary, urgent_actions: usize) -> Self {
        Self {
            today,
            total_patients: summary.total_patients,
            active_patients: summary.active_patients,
            at_risk_patients: summary.at_risk_patients,
            unpaid_payments: summary.unpaid_payments,
            urgent_actions,
            stage_distribution: summary
                .stage_distribution
                .into_iter()
                .map(|s| StageCountRes {
                    stage: s.stage.to_string(),
                    count: s.count,
                })
                .collect(),
        }
    }
}

/// Funnel filters accepted by `GET /patients`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PatientQuery {
    /// Case-insensitive match on name, MRN or id.
    pub search: Option<String>,
    /// Funnel stage, e.g. `Program` or `Ramp On`.
    pub stage: Option<String>,
    /// Two-letter state code.
    pub state: Option<String>,
    /// Health level, e.g. `Healthy` or `at-risk`.
    pub health: Option<String>,
    /// Quick view id: urgent, risks, deferrals, payments or healthy.
    pub view: Option<String>,
    /// Cohort id.
    pub cohort: Option<String>,
}

impl TryFrom<PatientQuery> for PatientFilter {
    type Error = PrmError;

    fn try_from(query: PatientQuery) -> Result<Self, Self::Error> {
        Ok(PatientFilter {
            search: non_blank(query.search),
            stage: non_blank(query.stage).map(Into::into),
            state: non_blank(query.state),
            health: non_blank(query.health).map(|h| h.parse()).transpose()?,
            view: non_blank(query.view).map(|v| v.parse()).transpose()?,
            cohort: non_blank(query.cohort),
        })
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ActionsQuery {
    /// Maximum number of actions to return, most urgent first.
    pub limit: Option<usize>,
    /// Only actions at this priority: critical, high, medium or low.
    pub priority: Option<String>,
}

impl ActionsQuery {
    pub fn priority(&self) -> Result<Option<Priority>, PrmError> {
        non_blank(self.priority.clone()).map(|p| p.parse()).transpose()
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CohortRes {
    pub id: String,
    #[serde(rename = "type")]
    pub cohort_type: Option<String>,
    pub size: Option<u32>,
    pub enrolled: usize,
    /// Seats taken as a whole percent; absent when the cohort has no size.
    pub fill_percent: Option<u32>,
    pub live_session_type: Option<String>,
    pub live_days: Option<String>,
    pub live_time: Option<String>,
    pub solo_days: Option<String>,
    pub solo_time: Option<String>,
    pub patients: Vec<PatientSummaryRes>,
}

impl From<&CohortSummary<'_>> for CohortRes {
    fn from(summary: &CohortSummary<'_>) -> Self {
        let cohort = summary.cohort;
        Self {
            id: cohort.id.to_string(),
            cohort_type: cohort.cohort_type.clone(),
            size: cohort.size,
            enrolled: summary.enrolled(),
            fill_percent: summary.fill_percent(),
            live_session_type: cohort.live_session_type.clone(),
            live_days: cohort.live_days.clone(),
            live_time: cohort.live_time.clone(),
            solo_days: cohort.solo_days.clone(),
            solo_time: cohort.solo_time.clone(),
            patients: summary.patients.iter().map(|p| patient_summary(p)).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListCohortsRes {
    pub cohorts: Vec<CohortRes>,
    /// Patients with no cohort whose program has not completed.
    pub unassigned: Vec<PatientSummaryRes>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CohortQuery {
    /// Case-insensitive match on cohort id or member name.
    pub search: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionRes {
    pub cohort_id: String,
    /// live or solo.
    #[serde(rename = "type")]
    pub kind: String,
    pub time: String,
    pub duration: String,
    pub patient_count: usize,
}

impl From<ScheduledSession> for SessionRes {
    fn from(session: ScheduledSession) -> Self {
        Self {
            cohort_id: session.cohort_id,
            kind: session.kind.as_str().to_string(),
            time: session.time,
            duration: session.duration,
            patient_count: session.patient_count,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ScheduleDayRes {
    pub day: String,
    pub sessions: Vec<SessionRes>,
}

impl From<ScheduleDay> for ScheduleDayRes {
    fn from(day: ScheduleDay) -> Self {
        Self {
            day: weekday_name(day.day).to_string(),
            sessions: day.sessions.into_iter().map(SessionRes::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ScheduleRes {
    pub days: Vec<ScheduleDayRes>,
}

/// Summary row for `patient` with a freshly computed health score.
pub fn patient_summary(patient: &Patient) -> PatientSummaryRes {
    PatientSummaryRes::new(patient, calculate_health_score(patient))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
