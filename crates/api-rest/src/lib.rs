//! # API REST
//!
//! Read-only REST API over the PRM dashboard derivations.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, query parsing, CORS)
//!
//! All scoring and prioritisation lives in `prm-core`; handlers only translate.

#![warn(rust_2018_idioms)]

pub mod dto;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use dto::{
    patient_summary, ActionsQuery, CohortQuery, CohortRes, HealthFactorRes, HealthRes,
    HealthScoreRes, ListActionsRes, ListCohortsRes, ListEventsRes, ListPatientsRes,
    PatientDetailRes, PatientQuery, PatientSummaryRes, ScheduleDayRes, ScheduleRes, SessionRes,
    StageCountRes, SummaryRes, UpcomingEventRes, UrgentActionRes,
};
use prm_core::{calculate_health_score, with_priority, PatientFilter, PatientRoster, PrmError};

type ApiError = (StatusCode, &'static str);

/// Application state shared across REST API handlers
///
/// Holds the loaded roster. The roster is immutable, so handlers share it without locking.
#[derive(Clone)]
pub struct AppState {
    roster: Arc<PatientRoster>,
}

impl AppState {
    pub fn new(roster: Arc<PatientRoster>) -> Self {
        Self { roster }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        list_patients,
        get_patient,
        get_patient_health,
        dashboard_summary,
        urgent_actions,
        upcoming_events,
        list_cohorts,
        get_cohort,
        weekly_schedule,
    ),
    components(schemas(
        HealthRes,
        HealthFactorRes,
        HealthScoreRes,
        PatientSummaryRes,
        ListPatientsRes,
        PatientDetailRes,
        UrgentActionRes,
        ListActionsRes,
        UpcomingEventRes,
        ListEventsRes,
        StageCountRes,
        SummaryRes,
        CohortRes,
        ListCohortsRes,
        SessionRes,
        ScheduleDayRes,
        ScheduleRes,
    ))
)]
pub struct ApiDoc;

/// Builds the REST router with Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/patients", get(list_patients))
        .route("/patients/:id", get(get_patient))
        .route("/patients/:id/health", get(get_patient_health))
        .route("/dashboard/summary", get(dashboard_summary))
        .route("/dashboard/actions", get(urgent_actions))
        .route("/dashboard/events", get(upcoming_events))
        .route("/cohorts", get(list_cohorts))
        .route("/cohorts/:id", get(get_cohort))
        .route("/schedule", get(weekly_schedule))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Reports liveness of the service, not patient health.
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "PRM dashboard is alive".into(),
    })
}

#[utoipa::path(
    get,
    path = "/patients",
    params(PatientQuery),
    responses(
        (status = 200, description = "Patients matching the funnel filters", body = ListPatientsRes),
        (status = 400, description = "Unknown health level or quick view")
    )
)]
/// List patients with their health scores
///
/// Applies the funnel search, stage/state/health/cohort filters and quick view. Patients keep
/// roster order.
async fn list_patients(
    State(state): State<AppState>,
    Query(query): Query<PatientQuery>,
) -> Result<Json<ListPatientsRes>, ApiError> {
    let filter = PatientFilter::try_from(query).map_err(|e| {
        tracing::debug!("rejected patient filter: {e}");
        (StatusCode::BAD_REQUEST, "Invalid filter")
    })?;

    let patients = state
        .roster
        .filter(&filter)
        .into_iter()
        .map(patient_summary)
        .collect();

    Ok(Json(ListPatientsRes {
        patients,
        states: state.roster.states(),
    }))
}

#[utoipa::path(
    get,
    path = "/patients/{id}",
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Patient record with score and tickets", body = PatientDetailRes),
        (status = 404, description = "Patient not found"),
        (status = 500, description = "Internal server error")
    )
)]
/// Fetch a patient's full record
///
/// Returns the record as loaded, its health score and the patient's risk and deferral tickets.
async fn get_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PatientDetailRes>, ApiError> {
    let roster = &state.roster;
    let patient = roster.patient(&id).map_err(not_found)?;

    let to_json = |value: serde_json::Result<serde_json::Value>| {
        value.map_err(|e| {
            tracing::error!("Serialize patient {id} error: {e:?}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
        })
    };

    let record = to_json(serde_json::to_value(patient))?;
    let risk_tickets = roster
        .risk_tickets_for(patient)
        .into_iter()
        .map(|t| to_json(serde_json::to_value(t)))
        .collect::<Result<Vec<_>, _>>()?;
    let deferral_tickets = roster
        .deferral_tickets_for(patient)
        .into_iter()
        .map(|t| to_json(serde_json::to_value(t)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(PatientDetailRes {
        patient: record,
        health: calculate_health_score(patient).into(),
        risk_tickets,
        deferral_tickets,
    }))
}

#[utoipa::path(
    get,
    path = "/patients/{id}/health",
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Health score with contributing factors", body = HealthScoreRes),
        (status = 404, description = "Patient not found")
    )
)]
/// Fetch a patient's health score
async fn get_patient_health(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<HealthScoreRes>, ApiError> {
    let health = state.roster.health_score(&id).map_err(not_found)?;
    Ok(Json(health.into()))
}

#[utoipa::path(
    get,
    path = "/dashboard/summary",
    responses(
        (status = 200, description = "Headline counts and stage distribution", body = SummaryRes)
    )
)]
/// Dashboard headline numbers
async fn dashboard_summary(State(state): State<AppState>) -> Json<SummaryRes> {
    let roster = &state.roster;
    Json(SummaryRes::new(
        roster.today().format("%Y-%m-%d").to_string(),
        roster.summary(),
        roster.urgent_actions().len(),
    ))
}

#[utoipa::path(
    get,
    path = "/dashboard/actions",
    params(ActionsQuery),
    responses(
        (status = 200, description = "Urgent actions, most urgent first", body = ListActionsRes),
        (status = 400, description = "Unknown priority")
    )
)]
/// Urgent actions across the roster
///
/// `priority` keeps only actions at that priority. `limit` truncates the list after sorting;
/// `total` reports the count before truncation.
async fn urgent_actions(
    State(state): State<AppState>,
    Query(query): Query<ActionsQuery>,
) -> Result<Json<ListActionsRes>, ApiError> {
    let priority = query.priority().map_err(|e| {
        tracing::debug!("rejected action filter: {e}");
        (StatusCode::BAD_REQUEST, "Invalid priority")
    })?;

    let actions = state.roster.urgent_actions();
    let matching: Vec<_> = with_priority(&actions, priority).collect();
    let total = matching.len();
    let limit = query.limit.unwrap_or(total);

    Ok(Json(ListActionsRes {
        actions: matching
            .into_iter()
            .take(limit)
            .map(UrgentActionRes::from)
            .collect(),
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/dashboard/events",
    responses(
        (status = 200, description = "Upcoming events in roster order", body = ListEventsRes)
    )
)]
/// Upcoming completions, kit returns and payments
async fn upcoming_events(State(state): State<AppState>) -> Json<ListEventsRes> {
    Json(ListEventsRes {
        events: state
            .roster
            .upcoming_events()
            .into_iter()
            .map(UpcomingEventRes::from)
            .collect(),
    })
}

#[utoipa::path(
    get,
    path = "/cohorts",
    params(CohortQuery),
    responses(
        (status = 200, description = "Cohorts with members, plus patients awaiting a cohort", body = ListCohortsRes)
    )
)]
/// List cohorts with enrolment and fill
///
/// `search` keeps cohorts whose id or any member's name matches. The unassigned list is never
/// filtered.
async fn list_cohorts(
    State(state): State<AppState>,
    Query(query): Query<CohortQuery>,
) -> Json<ListCohortsRes> {
    let roster = &state.roster;
    let needle = query.search.unwrap_or_default();

    Json(ListCohortsRes {
        cohorts: roster
            .cohort_summaries()
            .iter()
            .filter(|c| c.matches_search(&needle))
            .map(CohortRes::from)
            .collect(),
        unassigned: roster
            .unassigned_patients()
            .into_iter()
            .map(patient_summary)
            .collect(),
    })
}

#[utoipa::path(
    get,
    path = "/cohorts/{id}",
    params(("id" = String, Path, description = "Cohort id")),
    responses(
        (status = 200, description = "Cohort with its members", body = CohortRes),
        (status = 404, description = "Cohort not found")
    )
)]
/// Fetch one cohort
async fn get_cohort(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CohortRes>, ApiError> {
    let summary = state.roster.cohort(&id).map_err(not_found)?;
    Ok(Json(CohortRes::from(&summary)))
}

#[utoipa::path(
    get,
    path = "/schedule",
    responses(
        (status = 200, description = "Monday to Friday cohort sessions", body = ScheduleRes)
    )
)]
/// Weekly session schedule
///
/// Each weekday lists live and solo sessions by start time.
async fn weekly_schedule(State(state): State<AppState>) -> Json<ScheduleRes> {
    Json(ScheduleRes {
        days: state
            .roster
            .weekly_schedule()
            .into_iter()
            .map(ScheduleDayRes::from)
            .collect(),
    })
}

fn not_found(err: PrmError) -> ApiError {
    match err {
        PrmError::PatientNotFound(_) => (StatusCode::NOT_FOUND, "Patient not found"),
        PrmError::CohortNotFound(_) => (StatusCode::NOT_FOUND, "Cohort not found"),
        other => {
            tracing::error!("Patient lookup error: {:?}", other);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use prm_core::fixtures::{parse_dataset, DataFormat};
    use prm_core::FixedClock;
    use tower::ServiceExt;

    const SAMPLE: &str = include_str!("../../../fixtures/patients.json");

    fn app() -> Router {
        let dataset = parse_dataset(SAMPLE, DataFormat::Json).expect("sample dataset");
        let today = chrono::NaiveDate::from_ymd_opt(2024, 11, 10).unwrap();
        let roster = PatientRoster::new(dataset, Arc::new(FixedClock::at_date(today)));
        router(AppState::new(Arc::new(roster)))
    }

    async fn get_json(uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .expect("response");
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (status, body) = get_json("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn lists_patients_with_filters() {
        let (status, body) = get_json("/patients?view=urgent").await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<&str> = body["patients"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["P002", "P007"]);
        assert_eq!(body["patients"][0]["health"]["level"], "Critical");
        assert_eq!(body["states"].as_array().unwrap().len(), 5);

        let (_, body) = get_json("/patients?stage=Program&state=NY").await;
        assert_eq!(body["patients"][0]["id"], "P008");
        assert_eq!(body["patients"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rejects_unknown_quick_view() {
        let (status, _) = get_json("/patients?view=overdue").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn patient_detail_includes_tickets() {
        let (status, body) = get_json("/patients/P002").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["patient"]["name"], "James Wilson");
        assert_eq!(body["riskTickets"].as_array().unwrap().len(), 2);
        assert_eq!(body["health"]["score"], 1);
        assert_eq!(body["health"]["icon"], "●○○○○");
    }

    #[tokio::test]
    async fn unknown_patient_is_404() {
        let (status, _) = get_json("/patients/P999/health").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn actions_respect_limit() {
        let (status, body) = get_json("/dashboard/actions?limit=2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 6);
        let actions = body["actions"].as_array().unwrap();
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0]["priority"], "critical");
        assert_eq!(actions[0]["link"], "/patient/P002?tab=risk");
    }

    #[tokio::test]
    async fn actions_filter_by_priority() {
        let (status, body) = get_json("/dashboard/actions?priority=high").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 3);
        assert!(body["actions"]
            .as_array()
            .unwrap()
            .iter()
            .all(|a| a["priority"] == "high"));

        let (status, _) = get_json("/dashboard/actions?priority=urgent").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn cohorts_with_fill_and_unassigned() {
        let (status, body) = get_json("/cohorts").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cohorts"][0]["id"], "C-2024-09A");
        assert_eq!(body["cohorts"][0]["enrolled"], 2);
        assert_eq!(body["cohorts"][0]["fillPercent"], 17);
        assert_eq!(body["cohorts"][1]["patients"][0]["id"], "P007");
        assert_eq!(body["unassigned"].as_array().unwrap().len(), 2);

        let (_, body) = get_json("/cohorts?search=sarah").await;
        let cohorts = body["cohorts"].as_array().unwrap();
        assert_eq!(cohorts.len(), 1);
        assert_eq!(cohorts[0]["id"], "C-2024-10B");

        let (status, body) = get_json("/cohorts/C-2024-10B").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["fillPercent"], 25);

        let (status, _) = get_json("/cohorts/C-0000").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn schedule_lists_weekdays() {
        let (status, body) = get_json("/schedule").await;
        assert_eq!(status, StatusCode::OK);
        let days = body["days"].as_array().unwrap();
        assert_eq!(days.len(), 5);
        assert_eq!(days[0]["day"], "Monday");
        assert_eq!(days[0]["sessions"][0]["type"], "solo");
        assert_eq!(days[0]["sessions"][1]["time"], "6:00 PM");
        assert_eq!(days[0]["sessions"][1]["patientCount"], 2);
    }

    #[tokio::test]
    async fn patients_filter_by_cohort() {
        let (_, body) = get_json("/patients?cohort=C-2024-09A").await;
        let ids: Vec<&str> = body["patients"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["P001", "P002"]);
    }

    #[tokio::test]
    async fn summary_and_events() {
        let (_, summary) = get_json("/dashboard/summary").await;
        assert_eq!(summary["today"], "2024-11-10");
        assert_eq!(summary["urgentActions"], 6);
        assert_eq!(summary["stageDistribution"][2]["stage"], "Program");
        assert_eq!(summary["stageDistribution"][2]["count"], 4);

        let (_, events) = get_json("/dashboard/events").await;
        assert_eq!(events["events"][0]["type"], "completion");
        assert_eq!(events["events"][0]["date"], "This week");
    }
}
