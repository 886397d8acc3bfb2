//! Deployment-wide configuration.
//!
//! `DeployConfig` carries everything the topology builder and orchestrator
//! need beyond the application model: project identity, account/region,
//! the deployment bucket, compute sizing defaults, optional VPC placement,
//! optional container-image mode and optional error alerting.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// VPC placement for the compute endpoints. A configuration defines both
/// subnet and security-group identifiers or neither; partial VPC config is
/// rejected by [`DeployConfig::validate`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VpcConfig {
    pub subnet_ids: Vec<String>,
    pub security_group_ids: Vec<String>,
}

impl VpcConfig {
    fn is_complete(&self) -> bool {
        !self.subnet_ids.is_empty() && !self.security_group_ids.is_empty()
    }
}

/// Error alerting: an alert topic plus one e-mail subscription per
/// recipient. Absence of this config yields no alerting resources.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertConfig {
    pub email_recipients: Vec<String>,
}

/// Global deployment configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Project name; the first component of every resource name.
    pub project: String,
    pub region: String,
    pub account_id: String,
    /// Deployment bucket for artifacts and rendered templates. Required;
    /// its absence aborts a run before any resource work.
    pub bucket: String,
    /// Memory size shared by both compute endpoints.
    pub memory_size: u32,
    /// Timeout for the gateway-triggered endpoint, seconds.
    pub gateway_timeout_secs: u32,
    /// Timeout for the queue-triggered endpoint, seconds.
    pub async_timeout_secs: u32,
    /// Runtime identifier for archive-mode endpoints.
    pub runtime: String,
    /// Entry-point handler for archive-mode endpoints.
    pub handler: String,
    pub vpc: Option<VpcConfig>,
    /// When set, both endpoints pull this container image instead of a code
    /// archive, and artifact packaging is skipped entirely.
    pub image_uri: Option<String>,
    pub alerts: Option<AlertConfig>,
    /// External error-reporting URL surfaced into endpoint environments.
    pub error_report_url: Option<String>,
}

impl DeployConfig {
    pub fn new(
        project: impl Into<String>,
        region: impl Into<String>,
        account_id: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            region: region.into(),
            account_id: account_id.into(),
            bucket: bucket.into(),
            ..Default::default()
        }
    }

    /// Overlay the error-reporting URL from the orchestrator's own process
    /// environment, if present.
    pub fn with_process_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("ERROR_REPORT_URL") {
            self.error_report_url = Some(url);
        }
        self
    }

    /// Validate the configuration before any resource work.
    ///
    /// A missing bucket is fatal. A VPC block naming subnets without
    /// security groups (or the reverse) is an invalid state.
    pub fn validate(&self) -> ModelResult<()> {
        if self.bucket.is_empty() {
            return Err(ModelError::MissingConfiguration(
                "deployment bucket".into(),
            ));
        }
        if let Some(vpc) = &self.vpc {
            if !vpc.is_complete() {
                return Err(ModelError::InvalidConfiguration(
                    "vpc requires both subnet_ids and security_group_ids".into(),
                ));
            }
        }
        Ok(())
    }

    /// VPC placement, only when completely configured.
    pub fn vpc_placement(&self) -> Option<&VpcConfig> {
        self.vpc.as_ref().filter(|v| v.is_complete())
    }
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            project: String::new(),
            region: String::new(),
            account_id: String::new(),
            bucket: String::new(),
            memory_size: 3008,
            gateway_timeout_secs: 30,
            async_timeout_secs: 900,
            runtime: "provided.al2023".into(),
            handler: "bootstrap".into(),
            vpc: None,
            image_uri: None,
            alerts: None,
            error_report_url: None,
        }
    }
}
