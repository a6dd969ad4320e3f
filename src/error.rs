//! Error types for the finance query consensus engine

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for request-level operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Request-fatal errors.
///
/// Anything that goes wrong inside a single trial is a [`TrialError`] instead
/// and never surfaces here.
#[derive(Error, Debug)]
pub enum EngineError {

    // =============================
    // Core Pipeline Errors
    // =============================

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Document error: {0}")]
    DocumentError(String),

    #[error("Invalid question: {0}")]
    InvalidQuestion(String),

    #[error("Collaborator setup error: {0}")]
    CollaboratorSetup(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Why a single trial failed.
///
/// Serialized as `{"kind": "...", "message": "..."}` so failures can be shown
/// next to successful trials in API responses.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum TrialError {
    /// Network failure, timeout or non-success status from the collaborator
    #[error("Collaborator error: {0}")]
    CollaboratorError(String),

    /// Envelope parsed but carried no usable choice or message content
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("Candidate query is empty after sanitization")]
    EmptyCandidate,

    /// Syntax error or runtime failure while evaluating the candidate
    #[error("Query execution error: {0}")]
    QueryExecutionError(String),
}

impl TrialError {
    pub fn kind(&self) -> &'static str {
        match self {
            TrialError::CollaboratorError(_) => "collaborator_error",
            TrialError::MalformedEnvelope(_) => "malformed_envelope",
            TrialError::EmptyCandidate => "empty_candidate",
            TrialError::QueryExecutionError(_) => "query_execution_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trial_error_serialization() {
        let err = TrialError::QueryExecutionError("unknown function: avg2".to_string());
        let json = serde_json::to_value(&err).unwrap();

        assert_eq!(json["kind"], "query_execution_error");
        assert_eq!(json["message"], "unknown function: avg2");
        assert_eq!(err.kind(), "query_execution_error");
    }

    #[test]
    fn test_empty_candidate_has_no_message() {
        let json = serde_json::to_value(TrialError::EmptyCandidate).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "empty_candidate" }));
    }
}
