//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and passed into the roster. Binaries read
//! environment variables; the core only sees the parsed values.

use crate::clock::{Clock, FixedClock, SystemClock};
use crate::constants::DEFAULT_DATA_FILE;
use crate::{PrmError, PrmResult};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_file: PathBuf,
    pinned_date: Option<NaiveDate>,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// `pinned_date` freezes the clock at midnight UTC of that day; `None` uses the wall clock.
    pub fn new(data_file: PathBuf, pinned_date: Option<NaiveDate>) -> PrmResult<Self> {
        if data_file.as_os_str().is_empty() {
            return Err(PrmError::InvalidInput("data file path cannot be empty".into()));
        }

        Ok(Self {
            data_file,
            pinned_date,
        })
    }

    pub fn data_file(&self) -> &Path {
        &self.data_file
    }

    pub fn pinned_date(&self) -> Option<NaiveDate> {
        self.pinned_date
    }

    /// The time source derivations should use.
    pub fn clock(&self) -> Arc<dyn Clock> {
        match self.pinned_date {
            Some(date) => Arc::new(FixedClock::at_date(date)),
            None => Arc::new(SystemClock),
        }
    }
}

/// Resolve the data file path from an optional override.
///
/// Blank overrides fall back to [`DEFAULT_DATA_FILE`].
pub fn data_file_from_env_value(value: Option<String>) -> PathBuf {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_FILE))
}

/// Parse a pinned "today" from an optional `YYYY-MM-DD` string.
///
/// If `value` is `None` or empty/whitespace, the wall clock is used.
pub fn pinned_date_from_env_value(value: Option<String>) -> PrmResult<Option<NaiveDate>> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    value
        .map(|v| {
            NaiveDate::parse_from_str(&v, "%Y-%m-%d").map_err(|_| {
                PrmError::InvalidInput(format!("expected a YYYY-MM-DD date, got {v:?}"))
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_data_file() {
        let err = CoreConfig::new(PathBuf::new(), None).expect_err("empty path");
        assert!(matches!(err, PrmError::InvalidInput(_)));
    }

    #[test]
    fn blank_data_file_override_uses_default() {
        assert_eq!(
            data_file_from_env_value(Some("   ".into())),
            PathBuf::from(DEFAULT_DATA_FILE)
        );
        assert_eq!(
            data_file_from_env_value(Some("/tmp/data.yaml".into())),
            PathBuf::from("/tmp/data.yaml")
        );
        assert_eq!(data_file_from_env_value(None), PathBuf::from(DEFAULT_DATA_FILE));
    }

    #[test]
    fn parses_pinned_date() {
        let date = pinned_date_from_env_value(Some("2024-11-10".into())).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 11, 10));
        assert_eq!(pinned_date_from_env_value(Some("".into())).unwrap(), None);
        assert_eq!(pinned_date_from_env_value(None).unwrap(), None);
    }

    #[test]
    fn rejects_malformed_pinned_date() {
        let err = pinned_date_from_env_value(Some("10/11/2024".into())).expect_err("bad date");
        match err {
            PrmError::InvalidInput(msg) => assert!(msg.contains("10/11/2024")),
            other => panic!("expected InvalidInput error, got {other:?}"),
        }
    }

    #[test]
    fn pinned_config_uses_fixed_clock() {
        let date = NaiveDate::from_ymd_opt(2024, 11, 10).unwrap();
        let cfg = CoreConfig::new(PathBuf::from("data.json"), Some(date)).unwrap();
        assert_eq!(cfg.clock().today(), date);
    }
}
