//! Error types for fraud engine

use thiserror::Error;

/// Fraud engine error
#[derive(Debug, Clone, Error, PartialEq)]
pub enum Error {
    /// A pure rule predicate failed; the whole evaluation is aborted
    #[error("Error evaluating rule {rule_id}: {reason}")]
    RuleEvaluation {
        /// Rule that failed
        rule_id: String,
        /// Underlying cause
        reason: String,
    },

    /// Backing data for a data-dependent rule could not be fetched
    #[error("Fraud data unavailable: {0}")]
    DataUnavailable(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
