//! Error types for Moodtrace

use thiserror::Error;

/// Errors that can occur at the boundaries of an analysis pass.
///
/// The engine itself (correlation, pattern detection, aggregates) never fails;
/// these variants come from parsing, configuration and ordering checks.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Failed to parse records: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Event sequence is not in chronological order at index {index}")]
    UnsortedSequence { index: usize },

    #[error("Insight generation failed: {0}")]
    InsightError(String),
}
