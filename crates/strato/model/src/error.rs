//! Error types for the model crate.

use thiserror::Error;

/// Errors raised while validating or interrogating the application model.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A required configuration value is missing.
    #[error("missing configuration: {0}")]
    MissingConfiguration(String),

    /// Configuration values are mutually inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// An event reference could not be resolved to (context, event).
    #[error("unresolvable event reference: {0}")]
    BadEventRef(String),

    /// A service names a context the application model does not define.
    #[error("unknown context: {0}")]
    UnknownContext(String),

    /// A repository does not support the requested capability.
    #[error("schema migration unsupported for entity {0}")]
    MigrationUnsupported(String),

    /// Repository lookup or migration failure.
    #[error("repository error: {0}")]
    Repository(String),
}

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;
