//! Persistence boundary — repositories and the schema-migration capability.
//!
//! The orchestrator never talks to storage directly; after a context's
//! stack settles it offers each aggregate root's repository the chance to
//! migrate its schema. Not every backend is capable of (or requires)
//! migration, so support is modeled as a capability probe rather than a
//! type hierarchy: implementations return `Some` from
//! [`Repository::as_schema_migratable`] to opt in.

use std::sync::Arc;

use crate::error::ModelResult;

/// Capability: a persistence backend that can evolve its own schema.
pub trait SchemaMigratable: Send + Sync {
    /// Bring the backing schema up to date for the repository's entity.
    fn migrate_schema(&self) -> ModelResult<()>;
}

/// A repository backing one entity type.
pub trait Repository: Send + Sync {
    /// Name of the entity this repository backs.
    fn entity(&self) -> &str;

    /// Capability probe: `Some` when the backend supports schema
    /// migration, `None` otherwise. Default is no support.
    fn as_schema_migratable(&self) -> Option<&dyn SchemaMigratable> {
        None
    }
}

/// Resolves entities to their configured repositories.
pub trait RepositoryRegistry: Send + Sync {
    /// Repository for `entity`, if one is registered.
    fn repository(&self, entity: &str) -> Option<Arc<dyn Repository>>;
}
