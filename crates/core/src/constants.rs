//! Constants used throughout the PRM core crate.
//!
//! Scoring weights and thresholds live here so the calculators and their tests agree.

/// Default fixture file when no explicit data file is configured.
pub const DEFAULT_DATA_FILE: &str = "fixtures/patients.json";

/// Score a patient starts from before deductions.
pub const BASELINE_HEALTH_SCORE: i32 = 5;

/// Lowest score a patient can be given.
pub const MIN_HEALTH_SCORE: i32 = 1;

/// Highest score a patient can be given.
pub const MAX_HEALTH_SCORE: i32 = 5;

/// Deduction for an active risk ticket.
pub const ACTIVE_RISK_IMPACT: i32 = -2;

/// Deduction for an active deferral.
pub const ACTIVE_DEFERRAL_IMPACT: i32 = -1;

/// Deduction when average attendance is below [`LOW_ATTENDANCE_THRESHOLD`].
pub const LOW_ATTENDANCE_IMPACT: i32 = -2;

/// Deduction when average attendance is below [`TARGET_ATTENDANCE_THRESHOLD`].
pub const BELOW_TARGET_ATTENDANCE_IMPACT: i32 = -1;

/// Deduction for one or more unpaid maintenance payments.
pub const UNPAID_PAYMENT_IMPACT: i32 = -1;

/// Deduction for a delayed or lost kit.
pub const KIT_ISSUE_IMPACT: i32 = -1;

/// Average attendance (percent) below which attendance is "low".
pub const LOW_ATTENDANCE_THRESHOLD: f64 = 50.0;

/// Average attendance (percent) below which attendance is "below target".
pub const TARGET_ATTENDANCE_THRESHOLD: f64 = 75.0;

/// Days since the last mitigation attempt after which an active risk becomes critical.
pub const RISK_ESCALATION_DAYS: i64 = 3;

/// Stand-in day count when no mitigation attempt has been recorded.
pub const NO_CONTACT_DAYS: i64 = 999;

/// Above this many days the last-contact detail is shown as "10+ days ago".
pub const LAST_CONTACT_CAP_DAYS: i64 = 10;

/// Days after shipping beyond which an undelivered kit is flagged.
pub const KIT_DELIVERY_GRACE_DAYS: i64 = 7;

/// Live sessions in a full program when a record does not say otherwise.
pub const DEFAULT_LIVE_SESSIONS_AVAILABLE: u32 = 18;

/// Remaining live sessions at or below which completion is imminent.
pub const COMPLETION_WINDOW_SESSIONS: i64 = 3;

/// Health scores at or below this count a patient as at risk on the dashboard.
pub const AT_RISK_SCORE_CEILING: u8 = 2;

/// Health scores at or above this count a patient as healthy in the funnel.
pub const HEALTHY_SCORE_FLOOR: u8 = 4;

/// Length label shown for solo sessions on the weekly schedule.
pub const SOLO_SESSION_DURATION: &str = "30 MIN";
