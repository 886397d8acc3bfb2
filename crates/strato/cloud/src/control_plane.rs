//! Stack control-plane boundary.
//!
//! Three operations: describe, create, update. The control plane is
//! eventually consistent — after a create or update, a stack reports an
//! in-progress status for some time before settling. The simulated
//! implementation reproduces that shape so the reconciler's polling wait
//! is exercised for real.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::{CloudError, CloudResult};

/// Capability acknowledgments required by stack operations that create
/// IAM resources.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capability {
    Iam,
    NamedIam,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Iam => "CAPABILITY_IAM",
            Capability::NamedIam => "CAPABILITY_NAMED_IAM",
        }
    }
}

/// A stack's reported status.
///
/// Statuses are provider strings; the reconciler only cares whether one
/// still ends in the in-progress suffix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StackStatus(pub String);

impl StackStatus {
    pub const CREATE_IN_PROGRESS: &'static str = "CREATE_IN_PROGRESS";
    pub const CREATE_COMPLETE: &'static str = "CREATE_COMPLETE";
    pub const UPDATE_IN_PROGRESS: &'static str = "UPDATE_IN_PROGRESS";
    pub const UPDATE_COMPLETE: &'static str = "UPDATE_COMPLETE";

    pub fn is_in_progress(&self) -> bool {
        self.0.ends_with("_IN_PROGRESS")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Description of an existing stack.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StackDescription {
    pub name: String,
    pub status: StackStatus,
}

/// Stack reconciliation operations.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Current state of the named stack. [`CloudError::StackNotFound`]
    /// when it has never been created.
    async fn describe_stack(&self, name: &str) -> CloudResult<StackDescription>;

    async fn create_stack(
        &self,
        name: &str,
        template_location: &str,
        capabilities: &[Capability],
    ) -> CloudResult<()>;

    /// [`CloudError::NoUpdatesToPerform`] when the submitted template
    /// matches the deployed one.
    async fn update_stack(
        &self,
        name: &str,
        template_location: &str,
        capabilities: &[Capability],
    ) -> CloudResult<()>;
}

struct SimStack {
    template_location: String,
    operation: &'static str,
    polls_remaining: u32,
}

/// Simulated control plane.
///
/// Each create/update leaves the stack in progress for a configurable
/// number of describes before it settles, and an update whose template
/// location matches the deployed one reports the no-op outcome. Template
/// locations from the in-memory object store are content-addressed, so
/// "same location" means "same rendered document".
pub struct InMemoryControlPlane {
    stacks: DashMap<String, SimStack>,
    in_progress_polls: u32,
}

impl InMemoryControlPlane {
    pub fn new() -> Self {
        Self::with_in_progress_polls(2)
    }

    /// A control plane whose operations stay in progress for `polls`
    /// describes before settling.
    pub fn with_in_progress_polls(polls: u32) -> Self {
        Self {
            stacks: DashMap::new(),
            in_progress_polls: polls,
        }
    }

    pub fn stack_exists(&self, name: &str) -> bool {
        self.stacks.contains_key(name)
    }

    pub fn stack_count(&self) -> usize {
        self.stacks.len()
    }

    /// Template location currently deployed for `name`.
    pub fn deployed_template(&self, name: &str) -> Option<String> {
        self.stacks.get(name).map(|s| s.template_location.clone())
    }
}

impl Default for InMemoryControlPlane {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ControlPlane for InMemoryControlPlane {
    async fn describe_stack(&self, name: &str) -> CloudResult<StackDescription> {
        let mut entry = self
            .stacks
            .get_mut(name)
            .ok_or_else(|| CloudError::StackNotFound(name.to_string()))?;

        let status = if entry.polls_remaining > 0 {
            entry.polls_remaining -= 1;
            StackStatus(format!("{}_IN_PROGRESS", entry.operation))
        } else {
            StackStatus(format!("{}_COMPLETE", entry.operation))
        };

        Ok(StackDescription {
            name: name.to_string(),
            status,
        })
    }

    async fn create_stack(
        &self,
        name: &str,
        template_location: &str,
        _capabilities: &[Capability],
    ) -> CloudResult<()> {
        if self.stacks.contains_key(name) {
            return Err(CloudError::Provider(format!(
                "Stack [{name}] already exists"
            )));
        }
        self.stacks.insert(
            name.to_string(),
            SimStack {
                template_location: template_location.to_string(),
                operation: "CREATE",
                polls_remaining: self.in_progress_polls,
            },
        );
        Ok(())
    }

    async fn update_stack(
        &self,
        name: &str,
        template_location: &str,
        _capabilities: &[Capability],
    ) -> CloudResult<()> {
        let mut entry = self
            .stacks
            .get_mut(name)
            .ok_or_else(|| CloudError::StackNotFound(name.to_string()))?;

        if entry.template_location == template_location {
            return Err(CloudError::NoUpdatesToPerform);
        }

        entry.template_location = template_location.to_string();
        entry.operation = "UPDATE";
        entry.polls_remaining = self.in_progress_polls;
        Ok(())
    }
}
