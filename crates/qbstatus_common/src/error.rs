//! Error types for qbstatus.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatusError {
    #[error("Invalid report mode: {0} (expected 'queue' or 'mirror')")]
    InvalidMode(String),

    #[error("Queue job {queue_id} has unmapped status code '{code}'")]
    UnmappedStatusCode { queue_id: String, code: String },

    #[error("Data source error: {0}")]
    Source(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl StatusError {
    pub fn code(&self) -> i32 {
        match self {
            StatusError::InvalidMode(_) => -32001,
            StatusError::UnmappedStatusCode { .. } => -32002,
            StatusError::Source(_) => -32003,
            StatusError::Config(_) => -32004,
            StatusError::Io(_) => -32006,
            StatusError::Json(_) => -32700,
            StatusError::Toml(_) => -32701,
        }
    }

    /// Structural misuse by the caller or a contract violation by the
    /// data source, as opposed to an environmental failure.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            StatusError::InvalidMode(_) | StatusError::UnmappedStatusCode { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, StatusError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct() {
        let errors = [
            StatusError::InvalidMode("x".into()),
            StatusError::UnmappedStatusCode { queue_id: "1".into(), code: "z".into() },
            StatusError::Source("down".into()),
            StatusError::Config("bad".into()),
        ];
        let mut codes: Vec<i32> = errors.iter().map(|e| e.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_contract_violation_classification() {
        assert!(StatusError::InvalidMode("xml".into()).is_contract_violation());
        assert!(!StatusError::Source("timeout".into()).is_contract_violation());
    }

    #[test]
    fn test_display_mentions_mode() {
        let err = StatusError::InvalidMode("xml".into());
        assert!(err.to_string().contains("xml"));
    }
}
