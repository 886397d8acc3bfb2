//! Error types for template construction and rendering.

use thiserror::Error;

/// Errors raised while building or rendering templates.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// A logical id was referenced but never added to the template.
    #[error("unknown logical id: {0}")]
    UnknownLogicalId(String),

    /// Serialization to the wire format failed.
    #[error("render failed: {0}")]
    Render(#[from] serde_json::Error),
}

/// Result type for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;
