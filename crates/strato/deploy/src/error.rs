//! Error types for reconciliation and orchestration.

use thiserror::Error;

/// Errors that abort a deployment run.
///
/// The two tolerated control-plane outcomes (stack-not-found during the
/// existence probe, no-updates during an update) never surface here —
/// the reconciler folds them into normal control flow.
#[derive(Debug, Error)]
pub enum DeployError {
    /// Invalid or missing configuration, detected before any resource
    /// work.
    #[error("configuration error: {0}")]
    Configuration(#[from] strato_model::ModelError),

    /// Fatal control-plane failure. Already-reconciled stacks from this
    /// run stay deployed; there is no rollback.
    #[error(transparent)]
    Cloud(#[from] strato_cloud::CloudError),

    #[error(transparent)]
    Package(#[from] strato_package::PackageError),

    #[error(transparent)]
    Template(#[from] strato_template::TemplateError),

    /// The optional reconciliation deadline elapsed while the stack was
    /// still in progress.
    #[error("timed out waiting for stack {stack} after {waited_secs}s")]
    WaitTimeout { stack: String, waited_secs: u64 },
}

/// Result type for deployment operations.
pub type DeployResult<T> = Result<T, DeployError>;
