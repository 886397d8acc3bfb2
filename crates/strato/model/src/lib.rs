//! # strato-model
//!
//! The declarative application model consumed by the deployment
//! orchestrator, plus the deployment-wide configuration.
//!
//! A `Context` is a bounded domain module owning entities, command handlers
//! (optionally carrying timers) and event-listener registrations. A
//! `Service` is the deployable unit belonging to one context. A
//! `DeploymentRequest` names the target environment and the ordered list of
//! services to deploy.
//!
//! Everything here is read-only input to the orchestrator: constructed by
//! the application before a deployment run and never mutated by it.

pub mod config;
pub mod context;
pub mod deployment;
pub mod error;
pub mod persistence;

pub use config::{AlertConfig, DeployConfig, VpcConfig};
pub use context::{CommandHandlerDef, Context, EntityDef, EventRef, Service, TimerDef};
pub use deployment::{DeploymentRequest, RunId};
pub use error::{ModelError, ModelResult};
pub use persistence::{Repository, RepositoryRegistry, SchemaMigratable};
