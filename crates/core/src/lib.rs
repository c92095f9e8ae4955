//! # PRM Core
//!
//! Core business logic for the PRM dashboard.
//!
//! This crate contains the patient data model and the pure derivations the dashboard shows:
//! - Health score per patient ([`health_score`])
//! - Prioritised urgent actions across the roster ([`urgent_actions`])
//! - Upcoming events ([`upcoming_events`])
//! - Summary counts and funnel filtering ([`dashboard`], [`funnel`])
//! - Cohort membership and the weekly session schedule ([`cohorts`])
//! - Loading a fixture dataset from JSON or YAML ([`fixtures`])
//!
//! Derivations are synchronous and side-effect free. Anything that depends on "now" takes a
//! [`Clock`], so results are reproducible for a fixed date.
//!
//! **No API concerns**: HTTP servers and CLIs belong in `api-rest` and `prm-cli`.

pub mod clock;
pub mod cohorts;
pub mod config;
pub mod constants;
pub mod dashboard;
pub mod error;
pub mod fixtures;
pub mod funnel;
pub mod health_score;
pub mod records;
pub mod roster;
pub mod stages;
pub mod tickets;
pub mod upcoming_events;
pub mod urgent_actions;

pub use clock::{Clock, FixedClock, SystemClock};
pub use cohorts::{CohortSummary, ScheduleDay, ScheduledSession, SessionKind};
pub use config::CoreConfig;
pub use constants::DEFAULT_DATA_FILE;
pub use dashboard::{DashboardSummary, StageCount};
pub use error::{PrmError, PrmResult};
pub use fixtures::{DataFormat, Dataset};
pub use funnel::{PatientFilter, QuickView};
pub use health_score::{calculate_health_score, health_icon, HealthLevel, HealthScore};
pub use records::{Cohort, MaintenancePayment, Patient};
pub use roster::PatientRoster;
pub use stages::{CareStage, KitStage, WorkflowStage};
pub use tickets::{DeferralTicket, RiskTicket};
pub use upcoming_events::{get_upcoming_events, EventKind, UpcomingEvent};
pub use urgent_actions::{get_urgent_actions, with_priority, ActionKind, Priority, UrgentAction};

// Re-export the validated primitives used on records.
pub use prm_types::{NonEmptyText, Percent};
