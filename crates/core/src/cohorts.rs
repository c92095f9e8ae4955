//! Cohort membership and the weekly session schedule.
//!
//! A patient belongs to the cohort named by their `cohortId`. Cohorts publish their live and
//! solo sessions as weekday codes (`M-W`, `T-Th`) plus a display time; the schedule expands
//! those into one row per weekday, Monday to Friday.

use crate::constants::SOLO_SESSION_DURATION;
use crate::records::{Cohort, Patient};
use chrono::{NaiveTime, Weekday};
use serde::Serialize;

/// Weekdays shown on the schedule, in display order.
pub const SCHEDULE_DAYS: [Weekday; 5] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
];

/// A cohort together with the patients assigned to it.
#[derive(Clone, Debug, PartialEq)]
pub struct CohortSummary<'a> {
    pub cohort: &'a Cohort,
    /// Members in roster order.
    pub patients: Vec<&'a Patient>,
}

impl CohortSummary<'_> {
    pub fn enrolled(&self) -> usize {
        self.patients.len()
    }

    /// Share of seats taken, as a whole percent rounded half away from zero.
    ///
    /// # Returns
    ///
    /// `None` when the cohort has no recorded size (or a size of 0).
    pub fn fill_percent(&self) -> Option<u32> {
        let size = self.cohort.size.filter(|&n| n > 0)?;
        let ratio = self.enrolled() as f64 * 100.0 / f64::from(size);
        Some(ratio.round() as u32)
    }

    /// Matches the cohort id or any member's name, ignoring case.
    ///
    /// A blank needle matches every cohort.
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.cohort.id.as_str().to_lowercase().contains(&needle)
            || self
                .patients
                .iter()
                .any(|p| p.name.to_lowercase().contains(&needle))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    Live,
    Solo,
}

impl SessionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionKind::Live => "live",
            SessionKind::Solo => "solo",
        }
    }
}

/// One cohort session on a given weekday.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledSession {
    pub cohort_id: String,
    pub kind: SessionKind,
    /// Time as recorded on the cohort, e.g. `6:00 PM`.
    pub time: String,
    /// Parsed start time; `None` for labels such as `Anytime`.
    pub starts: Option<NaiveTime>,
    pub duration: String,
    /// Patients assigned to the cohort.
    pub patient_count: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ScheduleDay {
    pub day: Weekday,
    /// Sessions by start time; sessions without a parseable time go last.
    pub sessions: Vec<ScheduledSession>,
}

/// Patients assigned to `cohort_id`, in roster order.
pub fn cohort_patients<'a>(patients: &'a [Patient], cohort_id: &str) -> Vec<&'a Patient> {
    patients.iter().filter(|p| p.in_cohort(cohort_id)).collect()
}

/// Every cohort with its members, in dataset order.
pub fn summarize_cohorts<'a>(
    cohorts: &'a [Cohort],
    patients: &'a [Patient],
) -> Vec<CohortSummary<'a>> {
    cohorts
        .iter()
        .map(|cohort| CohortSummary {
            cohort,
            patients: cohort_patients(patients, cohort.id.as_str()),
        })
        .collect()
}

/// Patients waiting for a cohort: no assignment and a program that has not completed.
pub fn unassigned_patients(patients: &[Patient]) -> Vec<&Patient> {
    patients.iter().filter(|p| p.awaiting_cohort()).collect()
}

/// Expands cohort session days into a Monday-to-Friday schedule.
///
/// # Arguments
///
/// * `cohorts` - Cohorts whose `liveDays`/`soloDays` codes are expanded.
/// * `patients` - Roster used for each session's patient count.
///
/// # Returns
///
/// Five [`ScheduleDay`]s, Monday first, each present even when empty. A cohort missing its
/// days for a session kind contributes no sessions of that kind; unknown or weekend codes are
/// skipped.
pub fn weekly_schedule(cohorts: &[Cohort], patients: &[Patient]) -> Vec<ScheduleDay> {
    let mut days: Vec<ScheduleDay> = SCHEDULE_DAYS
        .into_iter()
        .map(|day| ScheduleDay {
            day,
            sessions: Vec::new(),
        })
        .collect();

    for cohort in cohorts {
        let patient_count = cohort_patients(patients, cohort.id.as_str()).len();
        let kinds = [
            (
                SessionKind::Live,
                cohort.live_days.as_deref(),
                cohort.live_time.as_deref(),
                cohort.live_session_type.clone().unwrap_or_default(),
            ),
            (
                SessionKind::Solo,
                cohort.solo_days.as_deref(),
                cohort.solo_time.as_deref(),
                SOLO_SESSION_DURATION.to_string(),
            ),
        ];

        for (kind, codes, time, duration) in kinds {
            let Some(codes) = codes else { continue };
            let time = time.unwrap_or_default();
            for weekday in parse_day_codes(codes) {
                if let Some(slot) = days.iter_mut().find(|d| d.day == weekday) {
                    slot.sessions.push(ScheduledSession {
                        cohort_id: cohort.id.to_string(),
                        kind,
                        time: time.to_string(),
                        starts: parse_session_time(time),
                        duration: duration.clone(),
                        patient_count,
                    });
                }
            }
        }
    }

    for day in &mut days {
        day.sessions.sort_by_key(|s| (s.starts.is_none(), s.starts));
    }
    days
}

/// Parses weekday codes such as `M-W`, `T-Th` or `Mon/Wed/Fri`.
///
/// Codes are case-insensitive and separated by `-` or `/`. Unrecognised codes are dropped.
pub fn parse_day_codes(codes: &str) -> Vec<Weekday> {
    codes
        .split(['-', '/'])
        .filter_map(|code| match code.trim().to_ascii_lowercase().as_str() {
            "m" | "mo" | "mon" | "monday" => Some(Weekday::Mon),
            "t" | "tu" | "tue" | "tues" | "tuesday" => Some(Weekday::Tue),
            "w" | "we" | "wed" | "wednesday" => Some(Weekday::Wed),
            "th" | "thu" | "thur" | "thurs" | "thursday" => Some(Weekday::Thu),
            "f" | "fr" | "fri" | "friday" => Some(Weekday::Fri),
            "sa" | "sat" | "saturday" => Some(Weekday::Sat),
            "su" | "sun" | "sunday" => Some(Weekday::Sun),
            _ => None,
        })
        .collect()
}

/// Parses a session time written as `6:00 PM`, `6:00PM` or `18:00`.
pub fn parse_session_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    ["%I:%M %p", "%I:%M%p", "%H:%M"]
        .into_iter()
        .find_map(|fmt| NaiveTime::parse_from_str(raw, fmt).ok())
}

/// Full English name of a weekday.
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
