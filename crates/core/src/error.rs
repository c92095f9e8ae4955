use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PrmError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("patient not found: {0}")]
    PatientNotFound(String),
    #[error("cohort not found: {0}")]
    CohortNotFound(String),
    #[error("failed to read data file {path}: {source}", path = path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported data file format (expected .json, .yaml or .yml): {}", .0.display())]
    UnsupportedFormat(PathBuf),
    #[error("data file schema mismatch at {path}: {message}")]
    Schema { path: String, message: String },
}

pub type PrmResult<T> = std::result::Result<T, PrmError>;
