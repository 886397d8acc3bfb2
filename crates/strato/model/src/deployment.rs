//! The deployment request and run identity.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::Service;

/// Unique identifier for one orchestrator run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run:{}", self.0)
    }
}

/// The top-level deploy request: target environment, optional dependency
/// manifest and the ordered list of services to deploy.
///
/// Created once per invocation and never persisted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeploymentRequest {
    /// Target environment name (e.g. "staging", "prod").
    pub environment: String,
    /// Path to the dependency manifest consumed by the artifact packager.
    /// `None` falls back to the packager's conventional default.
    pub manifest_path: Option<PathBuf>,
    /// Services to deploy, in order.
    pub services: Vec<Service>,
}

impl DeploymentRequest {
    pub fn new(environment: impl Into<String>, services: Vec<Service>) -> Self {
        Self {
            environment: environment.into(),
            manifest_path: None,
            services,
        }
    }

    pub fn with_manifest(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest_path = Some(path.into());
        self
    }

    /// Whether `context` is part of this deployment batch.
    pub fn deploys_context(&self, context: &str) -> bool {
        self.services.iter().any(|s| s.context == context)
    }
}
