//! Error types for the event impact engine

use thiserror::Error;

/// Result type for event impact operations
pub type Result<T> = std::result::Result<T, AnalyticsError>;

/// Errors that can occur while reading inputs or running analyses.
///
/// Insufficient data is not an error: it is reported through
/// [`crate::correlation::AnalysisOutcome::NoResult`] and zero-valued projections.
#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Data source failure for subject {subject_id}: {message}")]
    Source { subject_id: i32, message: String },

    #[error("Subject not found: {0}")]
    UnknownSubject(i32),

    #[error("Invalid position: {0}")]
    InvalidPosition(String),

    #[error("No scheduled matchup {index} for subject {subject_id}")]
    UnknownMatchup { subject_id: i32, index: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AnalyticsError {
    /// Build an upstream data-source failure for one subject
    pub fn source_failure(subject_id: i32, message: impl Into<String>) -> Self {
        AnalyticsError::Source { subject_id, message: message.into() }
    }

    /// Whether this failure is scoped to a single subject and a sweep may continue past it
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AnalyticsError::Source { .. } | AnalyticsError::UnknownSubject(_))
    }
}

impl From<config::ConfigError> for AnalyticsError {
    fn from(err: config::ConfigError) -> Self {
        AnalyticsError::Config(err.to_string())
    }
}
