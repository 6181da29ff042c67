use thiserror::Error;

/// Common error types used across the engine.
///
/// Derived-metric failures are never masked with a default value; callers
/// treat the failed indicator as unavailable and exclude it from evaluation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Input series shorter than the requested window. Recoverable by
    /// fetching more history.
    #[error("Insufficient data: required {required} points, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// A denominator evaluated to zero, leaving the metric undefined.
    #[error("Division by zero: {0}")]
    Division(String),

    /// A snapshot value is not a finite number where a numeric comparison
    /// is required.
    #[error("Type mismatch for indicator '{name}': {detail}")]
    TypeMismatch { name: String, detail: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),
}
