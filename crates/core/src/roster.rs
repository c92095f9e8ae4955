//! Patient roster service.
//!
//! [`PatientRoster`] owns a loaded [`Dataset`] and a clock, and runs the scoring and
//! prioritisation functions against them. It never mutates the data; cloning the `Arc` it is
//! usually held in is enough to share it between request handlers.

use crate::clock::Clock;
use crate::cohorts::{
    cohort_patients, summarize_cohorts, unassigned_patients, weekly_schedule, CohortSummary,
    ScheduleDay,
};
use crate::config::CoreConfig;
use crate::dashboard::{summarize, DashboardSummary};
use crate::fixtures::{load_dataset, Dataset};
use crate::funnel::{distinct_states, filter_patients, PatientFilter};
use crate::health_score::{calculate_health_score, HealthScore};
use crate::records::{Cohort, Patient};
use crate::tickets::{for_patient, DeferralTicket, RiskTicket};
use crate::upcoming_events::{get_upcoming_events, UpcomingEvent};
use crate::urgent_actions::{get_urgent_actions, UrgentAction};
use crate::{PrmError, PrmResult};
use chrono::NaiveDate;
use std::sync::Arc;

/// Read-only patient data operations - no API concerns
#[derive(Clone)]
pub struct PatientRoster {
    dataset: Dataset,
    clock: Arc<dyn Clock>,
}

impl PatientRoster {
    /// Creates a roster over an already loaded dataset.
    ///
    /// # Arguments
    ///
    /// * `dataset` - Patients, tickets and cohorts to serve.
    /// * `clock` - Time source for day-based rules.
    pub fn new(dataset: Dataset, clock: Arc<dyn Clock>) -> Self {
        Self { dataset, clock }
    }

    /// Loads the configured data file and attaches the configured clock.
    ///
    /// # Errors
    ///
    /// Returns a `PrmError` if the data file cannot be read or does not parse.
    pub fn from_config(cfg: &CoreConfig) -> PrmResult<Self> {
        let dataset = load_dataset(cfg.data_file())?;
        Ok(Self::new(dataset, cfg.clock()))
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn patients(&self) -> &[Patient] {
        &self.dataset.patients
    }

    pub fn cohorts(&self) -> &[Cohort] {
        &self.dataset.cohorts
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Looks up a patient by id.
    ///
    /// # Errors
    ///
    /// Returns [`PrmError::PatientNotFound`] if no patient has this id.
    pub fn patient(&self, id: &str) -> PrmResult<&Patient> {
        let id = id.trim();
        self.dataset
            .patients
            .iter()
            .find(|p| p.id.as_str() == id)
            .ok_or_else(|| PrmError::PatientNotFound(id.to_string()))
    }

    /// Risk tickets for `patient`, in stored order, open and closed.
    pub fn risk_tickets_for(&self, patient: &Patient) -> Vec<&RiskTicket> {
        for_patient(&self.dataset.risk_tickets, &patient.id).collect()
    }

    pub fn deferral_tickets_for(&self, patient: &Patient) -> Vec<&DeferralTicket> {
        for_patient(&self.dataset.deferral_tickets, &patient.id).collect()
    }

    /// Scores the patient with this id.
    ///
    /// # Errors
    ///
    /// Returns [`PrmError::PatientNotFound`] if no patient has this id.
    pub fn health_score(&self, id: &str) -> PrmResult<HealthScore> {
        Ok(calculate_health_score(self.patient(id)?))
    }

    /// Urgent actions across the roster, most urgent first, as of the roster's clock.
    pub fn urgent_actions(&self) -> Vec<UrgentAction<'_>> {
        get_urgent_actions(
            &self.dataset.patients,
            &self.dataset.risk_tickets,
            &self.dataset.deferral_tickets,
            self.clock.as_ref(),
        )
    }

    pub fn upcoming_events(&self) -> Vec<UpcomingEvent> {
        get_upcoming_events(&self.dataset.patients, &self.dataset.cohorts)
    }

    pub fn summary(&self) -> DashboardSummary {
        summarize(&self.dataset.patients)
    }

    pub fn filter(&self, filter: &PatientFilter) -> Vec<&Patient> {
        filter_patients(&self.dataset.patients, filter)
    }

    pub fn states(&self) -> Vec<String> {
        distinct_states(&self.dataset.patients)
    }

    /// Every cohort with its members, in dataset order.
    pub fn cohort_summaries(&self) -> Vec<CohortSummary<'_>> {
        summarize_cohorts(&self.dataset.cohorts, &self.dataset.patients)
    }

    /// Looks up a cohort by id, with its members.
    ///
    /// # Errors
    ///
    /// Returns [`PrmError::CohortNotFound`] if no cohort has this id.
    pub fn cohort(&self, id: &str) -> PrmResult<CohortSummary<'_>> {
        let id = id.trim();
        let cohort = self
            .dataset
            .cohorts
            .iter()
            .find(|c| c.id.as_str() == id)
            .ok_or_else(|| PrmError::CohortNotFound(id.to_string()))?;
        Ok(CohortSummary {
            cohort,
            patients: cohort_patients(&self.dataset.patients, id),
        })
    }

    pub fn unassigned_patients(&self) -> Vec<&Patient> {
        unassigned_patients(&self.dataset.patients)
    }

    pub fn weekly_schedule(&self) -> Vec<ScheduleDay> {
        weekly_schedule(&self.dataset.cohorts, &self.dataset.patients)
    }
}

impl std::fmt::Debug for PatientRoster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatientRoster")
            .field("patients", &self.dataset.patients.len())
            .field("today", &self.today())
            .finish()
    }
}
