//! # strato-package
//!
//! Produces one versioned, environment-embedded code archive per context
//! and publishes it, then enforces artifact retention. The mechanics of
//! dependency installation, bundle shrinking and archive creation sit
//! behind the [`BuildTooling`] boundary; the packager owns the sequence
//! and the retention policy.

pub mod error;
pub mod packager;
pub mod tooling;

pub use error::{PackageError, PackageResult};
pub use packager::{ArtifactPackager, RETENTION_KEEP, RETENTION_THRESHOLD};
pub use tooling::{BuildCommands, BuildTooling, CommandBuildTooling, SimulatedBuildTooling};
