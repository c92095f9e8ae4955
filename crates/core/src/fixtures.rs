//! Dataset loading.
//!
//! The dashboard runs on a fixture dataset: one JSON or YAML document holding patients, risk
//! tickets, deferral tickets and cohorts. The document is read once and never written back.
//!
//! Parsing goes through `serde_path_to_error`, so a schema mismatch names the failing field
//! (for example `patients[3].maintenancePayments[0].amount`).

use crate::records::{Cohort, Patient};
use crate::tickets::{DeferralTicket, RiskTicket, Ticket};
use crate::{PrmError, PrmResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Everything the dashboard shows.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Dataset {
    #[serde(default)]
    pub patients: Vec<Patient>,
    #[serde(default)]
    pub risk_tickets: Vec<RiskTicket>,
    #[serde(default)]
    pub deferral_tickets: Vec<DeferralTicket>,
    #[serde(default)]
    pub cohorts: Vec<Cohort>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataFormat {
    Json,
    Yaml,
}

impl DataFormat {
    /// Picks the format from a file extension.
    pub fn from_path(path: &Path) -> PrmResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("json") => Ok(DataFormat::Json),
            Some("yaml" | "yml") => Ok(DataFormat::Yaml),
            _ => Err(PrmError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// Reads and validates a dataset file.
pub fn load_dataset(path: &Path) -> PrmResult<Dataset> {
    let format = DataFormat::from_path(path)?;
    let text = std::fs::read_to_string(path).map_err(|source| PrmError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let dataset = parse_dataset(&text, format)?;
    tracing::info!(
        path = %path.display(),
        patients = dataset.patients.len(),
        risk_tickets = dataset.risk_tickets.len(),
        deferral_tickets = dataset.deferral_tickets.len(),
        cohorts = dataset.cohorts.len(),
        "loaded dataset"
    );
    Ok(dataset)
}

/// Parses and validates a dataset document.
///
/// # Errors
///
/// Returns [`PrmError::Schema`] if the document does not match the dataset shape (unknown
/// top-level keys included), or [`PrmError::InvalidInput`] if two patients share an id.
pub fn parse_dataset(text: &str, format: DataFormat) -> PrmResult<Dataset> {
    let dataset = match format {
        DataFormat::Json => {
            let mut deserializer = serde_json::Deserializer::from_str(text);
            serde_path_to_error::deserialize::<_, Dataset>(&mut deserializer)
                .map_err(|err| schema_error(err.path().to_string(), err.into_inner()))?
        }
        DataFormat::Yaml => {
            let deserializer = serde_yaml::Deserializer::from_str(text);
            serde_path_to_error::deserialize::<_, Dataset>(deserializer)
                .map_err(|err| schema_error(err.path().to_string(), err.into_inner()))?
        }
    };

    validate(&dataset)?;
    Ok(dataset)
}

fn schema_error(path: String, source: impl std::fmt::Display) -> PrmError {
    let path = if path.is_empty() || path == "." {
        "<root>".to_string()
    } else {
        path
    };
    PrmError::Schema {
        path,
        message: source.to_string(),
    }
}

fn validate(dataset: &Dataset) -> PrmResult<()> {
    let mut seen = HashSet::new();
    for patient in &dataset.patients {
        if !seen.insert(patient.id.as_str()) {
            return Err(PrmError::InvalidInput(format!(
                "duplicate patient id: {}",
                patient.id
            )));
        }
    }

    warn_orphans("risk", &dataset.risk_tickets, &seen);
    warn_orphans("deferral", &dataset.deferral_tickets, &seen);
    Ok(())
}

/// Tickets for unknown patients are kept but can never surface.
fn warn_orphans<T: Ticket>(kind: &str, tickets: &[T], known: &HashSet<&str>) {
    for ticket in tickets {
        if !known.contains(ticket.patient_id().as_str()) {
            tracing::warn!(
                kind,
                patient_id = %ticket.patient_id(),
                "ticket references unknown patient"
            );
        }
    }
}
