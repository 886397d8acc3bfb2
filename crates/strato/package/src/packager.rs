//! The artifact packager.
//!
//! Sequences one packaging run: clean staging directory, dependency
//! install, entry point, effective configuration, shrink, archive,
//! upload — each failure aborts the deployment for that service — then
//! prunes old artifacts down to the retention count.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use strato_cloud::ObjectStore;

use crate::error::PackageResult;
use crate::tooling::BuildTooling;

/// Retention kicks in once at least this many artifacts exist under a
/// context's code prefix. Below the threshold nothing is deleted, which
/// protects the only artifact during a context's very first deployments.
pub const RETENTION_THRESHOLD: usize = 3;

/// How many of the newest artifacts survive a cleanup.
pub const RETENTION_KEEP: usize = 2;

/// Conventional dependency manifest used when the deployment names none.
pub const DEFAULT_MANIFEST: &str = "dependencies.txt";

/// Packages and publishes code artifacts, then enforces retention.
pub struct ArtifactPackager {
    store: Arc<dyn ObjectStore>,
    tooling: Arc<dyn BuildTooling>,
    staging_dir: PathBuf,
}

impl ArtifactPackager {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        tooling: Arc<dyn BuildTooling>,
        staging_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            tooling,
            staging_dir: staging_dir.into(),
        }
    }

    /// Build, publish and retain one artifact.
    ///
    /// `code_key` must live under `code_prefix`; the effective merged
    /// configuration is written into the bundle so the running endpoint
    /// self-configures without a separate config fetch.
    pub async fn package(
        &self,
        bucket: &str,
        code_prefix: &str,
        code_key: &str,
        manifest: Option<&Path>,
        effective_config: &serde_json::Value,
    ) -> PackageResult<()> {
        info!(tooling = %self.tooling.name(), staging = %self.staging_dir.display(), "preparing staging directory");
        if self.staging_dir.is_dir() {
            fs::remove_dir_all(&self.staging_dir)?;
        }
        fs::create_dir_all(&self.staging_dir)?;

        let default_manifest = PathBuf::from(DEFAULT_MANIFEST);
        let manifest = manifest.unwrap_or(&default_manifest);

        info!(manifest = %manifest.display(), "installing dependencies");
        self.tooling
            .install_dependencies(manifest, &self.staging_dir)?;
        self.tooling.write_entrypoint(&self.staging_dir)?;

        fs::write(
            self.staging_dir.join("app-config.json"),
            serde_json::to_vec_pretty(effective_config)?,
        )?;

        self.tooling.shrink(&self.staging_dir)?;

        info!(key = %code_key, "packaging artifact");
        let archive = self.tooling.archive(&self.staging_dir)?;

        info!(key = %code_key, bytes = archive.len(), "uploading artifact");
        self.store.put(bucket, code_key, archive).await?;

        self.clean_up_old_artifacts(bucket, code_prefix).await
    }

    /// Keep the newest [`RETENTION_KEEP`] artifacts under `code_prefix`,
    /// delete the rest — only once [`RETENTION_THRESHOLD`] exist.
    pub async fn clean_up_old_artifacts(
        &self,
        bucket: &str,
        code_prefix: &str,
    ) -> PackageResult<()> {
        let mut objects = self.store.list(bucket, code_prefix).await?;
        if objects.len() < RETENTION_THRESHOLD {
            return Ok(());
        }

        objects.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
        for stale in &objects[RETENTION_KEEP..] {
            info!(key = %stale.key, "deleting expired artifact");
            self.store.delete(bucket, &stale.key).await?;
        }
        Ok(())
    }
}
