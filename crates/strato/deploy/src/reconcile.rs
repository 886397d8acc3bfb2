//! The stack reconciler.
//!
//! One state machine per stack: probe existence by name, branch to
//! create or update, then poll until the stack leaves its in-progress
//! state. A not-found probe selects the create path; a no-updates
//! response to an update is a successful no-op. Everything else is fatal.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use strato_cloud::{Capability, CloudError, ControlPlane};

use crate::error::{DeployError, DeployResult};

/// Capabilities acknowledged on every create and update: stacks carry
/// IAM roles.
const CAPABILITIES: &[Capability] = &[Capability::Iam];

/// Polling behavior for the post-submit wait.
#[derive(Clone, Debug)]
pub struct ReconcileConfig {
    /// Fixed interval between status polls.
    pub poll_interval: Duration,
    /// Optional deadline on the wait. `None` preserves the unbounded
    /// default: a stuck control-plane operation blocks the run.
    pub max_wait: Option<Duration>,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            max_wait: None,
        }
    }
}

/// How a reconciliation settled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The stack did not exist and was created.
    Created,
    /// The stack existed and was updated.
    Updated,
    /// The stack already matched the submitted template.
    NoChange,
}

/// Idempotent create-or-update against the control plane.
pub struct StackReconciler {
    control_plane: Arc<dyn ControlPlane>,
    config: ReconcileConfig,
}

impl StackReconciler {
    pub fn new(control_plane: Arc<dyn ControlPlane>) -> Self {
        Self::with_config(control_plane, ReconcileConfig::default())
    }

    pub fn with_config(control_plane: Arc<dyn ControlPlane>, config: ReconcileConfig) -> Self {
        Self {
            control_plane,
            config,
        }
    }

    /// Bring the named stack to the submitted template, creating or
    /// updating as needed, and block until it settles.
    pub async fn reconcile(
        &self,
        stack_name: &str,
        template_location: &str,
    ) -> DeployResult<ReconcileOutcome> {
        match self.control_plane.describe_stack(stack_name).await {
            Ok(_) => match self
                .control_plane
                .update_stack(stack_name, template_location, CAPABILITIES)
                .await
            {
                Ok(()) => {
                    info!(stack = %stack_name, "updating stack");
                    self.wait_for_stack(stack_name).await?;
                    Ok(ReconcileOutcome::Updated)
                }
                Err(CloudError::NoUpdatesToPerform) => {
                    info!(stack = %stack_name, "stack already current");
                    Ok(ReconcileOutcome::NoChange)
                }
                Err(err) => Err(err.into()),
            },
            Err(CloudError::StackNotFound(_)) => {
                info!(stack = %stack_name, "creating stack");
                self.control_plane
                    .create_stack(stack_name, template_location, CAPABILITIES)
                    .await?;
                self.wait_for_stack(stack_name).await?;
                Ok(ReconcileOutcome::Created)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Poll until the stack's status no longer ends in the in-progress
    /// suffix. Bounded only when a deadline is configured.
    async fn wait_for_stack(&self, stack_name: &str) -> DeployResult<()> {
        let started = tokio::time::Instant::now();
        loop {
            let description = self.control_plane.describe_stack(stack_name).await?;
            if !description.status.is_in_progress() {
                return Ok(());
            }
            if let Some(max_wait) = self.config.max_wait {
                if started.elapsed() >= max_wait {
                    return Err(DeployError::WaitTimeout {
                        stack: stack_name.to_string(),
                        waited_secs: started.elapsed().as_secs(),
                    });
                }
            }
            info!(stack = %stack_name, status = %description.status.as_str(), "waiting for stack");
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strato_cloud::InMemoryControlPlane;

    fn fast_config() -> ReconcileConfig {
        ReconcileConfig {
            poll_interval: Duration::from_millis(2),
            max_wait: None,
        }
    }

    #[tokio::test]
    async fn missing_stack_is_created_not_updated() {
        let cp = Arc::new(InMemoryControlPlane::with_in_progress_polls(1));
        let reconciler = StackReconciler::with_config(cp.clone(), fast_config());

        let outcome = reconciler
            .reconcile("acme-staging-billing", "mem://b/t.json?etag=1")
            .await
            .unwrap();
        assert_eq!(outcome, ReconcileOutcome::Created);
        assert!(cp.stack_exists("acme-staging-billing"));
    }

    #[tokio::test]
    async fn existing_stack_is_updated() {
        let cp = Arc::new(InMemoryControlPlane::with_in_progress_polls(0));
        let reconciler = StackReconciler::with_config(cp.clone(), fast_config());

        reconciler
            .reconcile("s", "mem://b/t.json?etag=1")
            .await
            .unwrap();
        let outcome = reconciler
            .reconcile("s", "mem://b/t.json?etag=2")
            .await
            .unwrap();
        assert_eq!(outcome, ReconcileOutcome::Updated);
        assert_eq!(
            cp.deployed_template("s").as_deref(),
            Some("mem://b/t.json?etag=2")
        );
    }

    #[tokio::test]
    async fn unchanged_template_settles_as_no_op() {
        let cp = Arc::new(InMemoryControlPlane::with_in_progress_polls(0));
        let reconciler = StackReconciler::with_config(cp, fast_config());

        reconciler
            .reconcile("s", "mem://b/t.json?etag=1")
            .await
            .unwrap();
        let outcome = reconciler
            .reconcile("s", "mem://b/t.json?etag=1")
            .await
            .unwrap();
        assert_eq!(outcome, ReconcileOutcome::NoChange);
    }

    #[tokio::test]
    async fn wait_drains_in_progress_polls() {
        let cp = Arc::new(InMemoryControlPlane::with_in_progress_polls(3));
        let reconciler = StackReconciler::with_config(cp.clone(), fast_config());

        reconciler
            .reconcile("s", "mem://b/t.json?etag=1")
            .await
            .unwrap();
        // the wait consumed every in-progress poll
        let desc = cp.describe_stack("s").await.unwrap();
        assert!(!desc.status.is_in_progress());
    }

    #[tokio::test]
    async fn deadline_turns_stuck_wait_into_error() {
        // far more in-progress polls than the deadline allows
        let cp = Arc::new(InMemoryControlPlane::with_in_progress_polls(u32::MAX));
        let reconciler = StackReconciler::with_config(
            cp,
            ReconcileConfig {
                poll_interval: Duration::from_millis(2),
                max_wait: Some(Duration::ZERO),
            },
        );

        let err = reconciler
            .reconcile("s", "mem://b/t.json?etag=1")
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::WaitTimeout { .. }));
    }
}
