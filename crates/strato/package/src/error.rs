//! Error types for artifact packaging.

use thiserror::Error;

/// Errors raised while packaging or publishing an artifact.
#[derive(Debug, Error)]
pub enum PackageError {
    #[error("staging io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("build tooling failed: {0}")]
    Tooling(String),

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("config serialization failed: {0}")]
    Config(#[from] serde_json::Error),

    #[error(transparent)]
    Cloud(#[from] strato_cloud::CloudError),
}

/// Result type for packaging operations.
pub type PackageResult<T> = Result<T, PackageError>;
