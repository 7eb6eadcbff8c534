use thiserror::Error;

#[derive(Error, Debug)]
pub enum RedlineError {
    #[error("Invalid score: {0} (expected 1 to 5)")]
    InvalidScore(i64),

    #[error("Duplicate record id: {0}")]
    DuplicateId(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Unknown severity band: {0}")]
    UnknownBand(String),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IPC error: {0}")]
    Ipc(String),
}

impl RedlineError {
    /// True for errors caused by caller-supplied input rather than the service.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            RedlineError::InvalidScore(_)
                | RedlineError::InvalidRecord(_)
                | RedlineError::UnknownCategory(_)
                | RedlineError::UnknownBand(_)
                | RedlineError::Json(_)
        )
    }
}
