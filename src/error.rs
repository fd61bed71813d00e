//! Error types for evaluation and auto-tuning
//!
//! Only two conditions are surfaced to callers as "real" failures: there is
//! nothing to analyze, or a tuning state write could not be made safely.
//! Numerically degenerate inputs are resolved inside the statistics engine
//! and malformed records are counted, never raised.

use thiserror::Error;

/// Errors that can occur during analysis, tuning, or persistence
#[derive(Error, Debug)]
pub enum EvalError {
    #[error("No usable outcome records to analyze ({skipped} malformed entries skipped)")]
    EmptyDataset { skipped: usize },

    #[error("Could not acquire exclusive tuning state lock after {attempts} attempts")]
    ConcurrentTuningConflict { attempts: u32 },

    #[error("Tuning state store error: {0}")]
    Store(String),

    #[error("Deployment trigger failed: {0}")]
    Deployment(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl EvalError {
    /// Whether the caller may simply retry the same operation later
    ///
    /// A missed tuning cycle is acceptable; everything else needs attention.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EvalError::ConcurrentTuningConflict { .. })
    }
}

/// Result type for evaluation and tuning operations
pub type Result<T> = std::result::Result<T, EvalError>;
