//! Pre/post deployment hooks.
//!
//! Callers inject extra behavior around each service's reconciliation
//! without modifying the orchestrator: the pre hook may mutate the built
//! topology before it is rendered, the post hook observes it after the
//! stack settles. Hooks are an explicit ordered list held by the
//! orchestrator, injected at construction.

use strato_model::Context;
use strato_topology::ResourceTopology;

/// A callback pair run around one service's stack reconciliation.
pub trait DeploymentHook: Send + Sync {
    /// Runs after the topology is built, before rendering. May inject or
    /// adjust resources.
    fn before_deploy(&self, _topology: &mut ResourceTopology, _context: &Context, _env: &str) {}

    /// Runs after the stack has settled.
    fn after_deploy(&self, _topology: &ResourceTopology, _context: &Context, _env: &str) {}

    /// Name of this hook for logging.
    fn name(&self) -> &str;
}
