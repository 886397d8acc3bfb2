//! The deployment orchestrator.
//!
//! Drives one run end to end: validate configuration, ensure the shared
//! project stack, then deploy each service in order — package, build
//! topology, bootstrap missing foreign topics, render, publish,
//! reconcile — and finally offer schema migration to each aggregate
//! root's repository. A fatal error stops the remaining services;
//! whatever already reconciled stays deployed.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use strato_cloud::{CloudError, ControlPlane, ObjectStore, TopicLookup};
use strato_model::{
    Context, DeployConfig, DeploymentRequest, ModelError, RepositoryRegistry, RunId,
};
use strato_package::{ArtifactPackager, BuildTooling};
use strato_template::{JsonRenderer, Template, TemplateRenderer};
use strato_topology::{
    build_project_template, build_topic_template, ResourceNames, TopologyBuilder,
};

use crate::error::{DeployError, DeployResult};
use crate::hooks::DeploymentHook;
use crate::reconcile::{ReconcileConfig, ReconcileOutcome, StackReconciler};

/// Outcome of one service's deployment.
#[derive(Clone, Debug)]
pub struct ServiceReport {
    pub service: String,
    pub context: String,
    pub stack: String,
    pub outcome: ReconcileOutcome,
    /// Key of the uploaded code artifact; `None` in image mode.
    pub artifact_key: Option<String>,
}

/// Outcome of a whole run.
#[derive(Clone, Debug)]
pub struct RunReport {
    pub run_id: RunId,
    pub project_outcome: ReconcileOutcome,
    pub services: Vec<ServiceReport>,
}

/// Top-level driver for deployment runs.
pub struct Orchestrator {
    config: DeployConfig,
    contexts: BTreeMap<String, Context>,
    store: Arc<dyn ObjectStore>,
    topics: Arc<dyn TopicLookup>,
    renderer: Arc<dyn TemplateRenderer>,
    packager: ArtifactPackager,
    reconciler: StackReconciler,
    registry: Option<Arc<dyn RepositoryRegistry>>,
    hooks: Vec<Arc<dyn DeploymentHook>>,
}

impl Orchestrator {
    pub fn new(
        config: DeployConfig,
        contexts: BTreeMap<String, Context>,
        store: Arc<dyn ObjectStore>,
        control_plane: Arc<dyn ControlPlane>,
        topics: Arc<dyn TopicLookup>,
        tooling: Arc<dyn BuildTooling>,
    ) -> Self {
        let packager = ArtifactPackager::new(store.clone(), tooling, "build/staging");
        Self {
            config,
            contexts,
            store,
            topics,
            renderer: Arc::new(JsonRenderer),
            packager,
            reconciler: StackReconciler::new(control_plane),
            registry: None,
            hooks: Vec::new(),
        }
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn TemplateRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_reconciler(mut self, control_plane: Arc<dyn ControlPlane>, config: ReconcileConfig) -> Self {
        self.reconciler = StackReconciler::with_config(control_plane, config);
        self
    }

    pub fn with_registry(mut self, registry: Arc<dyn RepositoryRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Ordered hook list run around every service deployment.
    pub fn with_hooks(mut self, hooks: Vec<Arc<dyn DeploymentHook>>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_staging_dir(mut self, staging_dir: impl Into<PathBuf>, tooling: Arc<dyn BuildTooling>) -> Self {
        self.packager = ArtifactPackager::new(self.store.clone(), tooling, staging_dir);
        self
    }

    /// Execute one deployment run.
    pub async fn run(&self, request: &DeploymentRequest) -> DeployResult<RunReport> {
        self.config.validate().map_err(DeployError::Configuration)?;

        let run_id = RunId::generate();
        let names = ResourceNames::from_config(&self.config, &request.environment);
        info!(run = %run_id, environment = %request.environment, "starting deployment");

        let project_template = build_project_template(&self.config, &names);
        let project_outcome = self
            .publish_and_reconcile(&names, &project_template, None)
            .await?;

        let builder = TopologyBuilder::new(&self.config, request.environment.clone());
        let mut services = Vec::new();

        for service in &request.services {
            let context = self
                .contexts
                .get(&service.context)
                .ok_or_else(|| ModelError::UnknownContext(service.context.clone()))
                .map_err(DeployError::Configuration)?;

            let artifact_key = self.package_artifact(&names, request, context, service).await?;

            let mut topology = builder.build(context, service, artifact_key.as_deref())?;

            for hook in &self.hooks {
                debug!(hook = %hook.name(), service = %service.name, "running pre-deployment hook");
                hook.before_deploy(&mut topology, context, &request.environment);
            }

            for foreign in &topology.subscribed_contexts {
                if !request.deploys_context(foreign) {
                    self.ensure_topic(&names, foreign).await?;
                }
            }

            let outcome = self
                .publish_and_reconcile(&names, &topology.template, Some(&context.name))
                .await?;

            for hook in &self.hooks {
                debug!(hook = %hook.name(), service = %service.name, "running post-deployment hook");
                hook.after_deploy(&topology, context, &request.environment);
            }

            self.migrate_schema(context);

            let stack = names.stack_name(Some(&context.name));
            info!(service = %service.name, stack = %stack, "service deployed");
            services.push(ServiceReport {
                service: service.name.clone(),
                context: context.name.clone(),
                stack,
                outcome,
                artifact_key,
            });
        }

        info!(run = %run_id, services = services.len(), "deployment complete");
        Ok(RunReport {
            run_id,
            project_outcome,
            services,
        })
    }

    /// Package and upload a service's code artifact. Skipped entirely in
    /// container-image mode.
    async fn package_artifact(
        &self,
        names: &ResourceNames,
        request: &DeploymentRequest,
        context: &Context,
        service: &strato_model::Service,
    ) -> DeployResult<Option<String>> {
        if self.config.image_uri.is_some() {
            return Ok(None);
        }

        let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%S%.3f").to_string();
        let key = names.code_key(&service.name, &timestamp);
        let effective_config = serde_json::json!({
            "project": self.config.project,
            "environment": request.environment,
            "region": self.config.region,
            "account_id": self.config.account_id,
            "bucket": self.config.bucket,
            "context": context.name,
        });

        self.packager
            .package(
                &self.config.bucket,
                &names.code_prefix(&service.name),
                &key,
                request.manifest_path.as_deref(),
                &effective_config,
            )
            .await?;
        Ok(Some(key))
    }

    /// Render a template, publish it to object storage and reconcile its
    /// stack against the presigned location.
    async fn publish_and_reconcile(
        &self,
        names: &ResourceNames,
        template: &Template,
        context: Option<&str>,
    ) -> DeployResult<ReconcileOutcome> {
        let document = self.renderer.render(template)?;
        let key = names.template_key(context);
        info!(key = %key, "publishing rendered template");
        self.store
            .put(&self.config.bucket, &key, document.into_bytes())
            .await?;
        let location = self.store.presigned_url(&self.config.bucket, &key).await?;
        self.reconciler
            .reconcile(&names.stack_name(context), &location)
            .await
    }

    /// Ensure a foreign context's topic exists, deploying a minimal
    /// single-topic stack when it does not. This is what lets contexts
    /// deploy in any order without a pre-declared dependency graph.
    async fn ensure_topic(&self, names: &ResourceNames, context: &str) -> DeployResult<()> {
        let arn = names.topic_arn(context);
        match self.topics.topic_attributes(&arn).await {
            Ok(_) => Ok(()),
            Err(CloudError::TopicNotFound(_)) => {
                info!(context = %context, "bootstrapping topic for undeployed context");
                let template = build_topic_template(names, context);
                self.publish_and_reconcile(names, &template, Some(context))
                    .await?;
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Offer schema migration to each aggregate root's repository.
    /// Backends without the capability (or without a registered
    /// repository) are expected, not exceptional.
    fn migrate_schema(&self, context: &Context) {
        let Some(registry) = &self.registry else {
            return;
        };
        for entity in context.aggregate_roots() {
            match registry.repository(&entity.name) {
                Some(repository) => match repository.as_schema_migratable() {
                    Some(migratable) => {
                        if let Err(err) = migratable.migrate_schema() {
                            debug!(entity = %entity.name, error = %err, "schema migration failed");
                        }
                    }
                    None => {
                        debug!(entity = %entity.name, "repository does not support schema migration")
                    }
                },
                None => debug!(entity = %entity.name, "no repository registered"),
            }
        }
    }
}
