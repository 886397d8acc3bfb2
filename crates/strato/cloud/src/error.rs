//! Typed cloud errors and provider-text classification.
//!
//! The modeled control plane reports "stack does not exist" and "no
//! updates are to be performed" as generic client errors distinguishable
//! only by message text. Matching on that text is fragile, so it happens
//! exactly once, here; everything downstream sees typed variants.

use thiserror::Error;

/// Errors from the cloud client boundaries.
#[derive(Debug, Error)]
pub enum CloudError {
    /// The named stack does not exist. Tolerated during the existence
    /// probe; it selects the create path.
    #[error("stack not found: {0}")]
    StackNotFound(String),

    /// An update was issued against a stack that already matches the
    /// submitted template. Tolerated; treated as a settled no-op.
    #[error("no updates are to be performed")]
    NoUpdatesToPerform,

    /// The named topic does not exist. Tolerated during foreign-topic
    /// discovery; it triggers topic bootstrap.
    #[error("topic not found: {0}")]
    TopicNotFound(String),

    /// The named object does not exist in storage.
    #[error("object not found: {bucket}/{key}")]
    ObjectNotFound { bucket: String, key: String },

    /// Any other provider failure. Fatal to the deployment run.
    #[error("provider error: {0}")]
    Provider(String),
}

impl CloudError {
    /// Whether this error is tolerated control flow rather than a failure.
    pub fn is_tolerated(&self) -> bool {
        matches!(
            self,
            CloudError::StackNotFound(_)
                | CloudError::NoUpdatesToPerform
                | CloudError::TopicNotFound(_)
        )
    }
}

/// Result type for cloud operations.
pub type CloudResult<T> = Result<T, CloudError>;

/// Classify raw provider error text into a typed [`CloudError`].
///
/// Real client implementations call this at the boundary with the
/// provider's message; the containment patterns mirror the provider's
/// actual error reporting.
pub fn classify_provider_error(subject: &str, text: &str) -> CloudError {
    if text.contains("does not exist") {
        CloudError::StackNotFound(subject.to_string())
    } else if text.contains("No updates are to be performed") {
        CloudError::NoUpdatesToPerform
    } else {
        CloudError::Provider(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_exists_text_classifies_as_not_found() {
        let err = classify_provider_error(
            "acme-staging-billing",
            "Stack with id acme-staging-billing does not exist",
        );
        assert!(matches!(err, CloudError::StackNotFound(name) if name == "acme-staging-billing"));
    }

    #[test]
    fn no_updates_text_classifies_as_no_op() {
        let err = classify_provider_error("acme-staging", "No updates are to be performed.");
        assert!(matches!(err, CloudError::NoUpdatesToPerform));
        assert!(err.is_tolerated());
    }

    #[test]
    fn other_text_is_a_provider_error() {
        let err = classify_provider_error("acme-staging", "Rate exceeded");
        assert!(matches!(err, CloudError::Provider(_)));
        assert!(!err.is_tolerated());
    }
}
