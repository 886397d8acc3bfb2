//! Build-tooling boundary — trait, command-driven implementation and a
//! simulated implementation for tests.
//!
//! The contract is deliberately thin: materialize dependencies into a
//! directory, drop in the entry point, shrink the bundle, archive the
//! directory. Everything else about the application's build system stays
//! outside the orchestrator.

use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::error::{PackageError, PackageResult};

/// Operations the packager delegates to the application's build system.
pub trait BuildTooling: Send + Sync {
    /// Materialize third-party dependencies from `manifest` into `target`.
    fn install_dependencies(&self, manifest: &Path, target: &Path) -> PackageResult<()>;

    /// Place the fixed entry-point handler into `target`.
    fn write_entrypoint(&self, target: &Path) -> PackageResult<()>;

    /// Reduce bundle size: strip compiled shared objects, drop caches and
    /// test directories, re-compress known large packages.
    fn shrink(&self, target: &Path) -> PackageResult<()>;

    /// Archive `target` into a single deployable blob.
    fn archive(&self, target: &Path) -> PackageResult<Vec<u8>>;

    /// Name of this tooling for logging.
    fn name(&self) -> &str;
}

// ── Command-driven tooling ─────────────────────────────────────────────

/// Commands and knobs driving [`CommandBuildTooling`]. Placeholders
/// `{manifest}` and `{target}` are substituted before execution.
#[derive(Clone, Debug)]
pub struct BuildCommands {
    /// Dependency-install command line.
    pub install: Vec<String>,
    /// Entry-point source file copied into the bundle.
    pub entrypoint_source: PathBuf,
    /// Strip command run per matching file, `{file}` substituted.
    pub strip: Option<Vec<String>>,
    /// File extensions handed to the strip command.
    pub strip_extensions: Vec<String>,
    /// Directory names pruned from the bundle.
    pub prune_dirs: Vec<String>,
    /// Large third-party packages re-compressed in place.
    pub shrink_packages: Vec<String>,
}

impl Default for BuildCommands {
    fn default() -> Self {
        Self {
            install: Vec::new(),
            entrypoint_source: PathBuf::from("handlers/main"),
            strip: None,
            strip_extensions: vec!["so".into()],
            prune_dirs: vec!["tests".into(), "__pycache__".into()],
            shrink_packages: Vec::new(),
        }
    }
}

fn substitute(arg: &str, manifest: &Path, target: &Path) -> String {
    arg.replace("{manifest}", &manifest.to_string_lossy())
        .replace("{target}", &target.to_string_lossy())
}

/// Build tooling that shells out to the application's configured
/// commands and produces real zip archives.
pub struct CommandBuildTooling {
    commands: BuildCommands,
}

impl CommandBuildTooling {
    pub fn new(commands: BuildCommands) -> Self {
        Self { commands }
    }

    fn run(&self, args: &[String]) -> PackageResult<()> {
        let Some((program, rest)) = args.split_first() else {
            return Ok(());
        };
        let status = Command::new(program)
            .args(rest)
            .status()
            .map_err(|e| PackageError::Tooling(format!("{program}: {e}")))?;
        if !status.success() {
            return Err(PackageError::Tooling(format!(
                "{program} exited with {status}"
            )));
        }
        Ok(())
    }
}

impl BuildTooling for CommandBuildTooling {
    fn install_dependencies(&self, manifest: &Path, target: &Path) -> PackageResult<()> {
        let args: Vec<String> = self
            .commands
            .install
            .iter()
            .map(|a| substitute(a, manifest, target))
            .collect();
        self.run(&args)
    }

    fn write_entrypoint(&self, target: &Path) -> PackageResult<()> {
        let source = &self.commands.entrypoint_source;
        let file_name = source
            .file_name()
            .ok_or_else(|| PackageError::Tooling("entrypoint source has no file name".into()))?;
        fs::copy(source, target.join(file_name))?;
        Ok(())
    }

    fn shrink(&self, target: &Path) -> PackageResult<()> {
        // Prune test directories and caches first so nothing below
        // operates on files about to disappear.
        let pruned: Vec<PathBuf> = WalkDir::new(target)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.file_type().is_dir()
                    && e.file_name()
                        .to_str()
                        .map(|n| self.commands.prune_dirs.iter().any(|p| p == n))
                        .unwrap_or(false)
            })
            .map(|e| e.into_path())
            .collect();
        for dir in pruned {
            if dir.exists() {
                fs::remove_dir_all(&dir)?;
            }
        }

        if let Some(strip) = &self.commands.strip {
            for entry in WalkDir::new(target).into_iter().filter_map(|e| e.ok()) {
                if !entry.file_type().is_file() {
                    continue;
                }
                let matches = entry
                    .path()
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|ext| self.commands.strip_extensions.iter().any(|s| s == ext))
                    .unwrap_or(false);
                if matches {
                    let args: Vec<String> = strip
                        .iter()
                        .map(|a| a.replace("{file}", &entry.path().to_string_lossy()))
                        .collect();
                    self.run(&args)?;
                }
            }
        }

        for package in &self.commands.shrink_packages {
            let dir = target.join(package);
            if dir.is_dir() {
                debug!(package = %package, "re-compressing package");
                let bytes = zip_directory(&dir)?;
                fs::write(target.join(format!("{package}.zip")), bytes)?;
                fs::remove_dir_all(&dir)?;
            }
        }

        Ok(())
    }

    fn archive(&self, target: &Path) -> PackageResult<Vec<u8>> {
        zip_directory(target)
    }

    fn name(&self) -> &str {
        "command"
    }
}

/// Zip a directory tree into memory. Entries are sorted so identical
/// trees archive identically.
fn zip_directory(root: &Path) -> PackageResult<Vec<u8>> {
    let mut paths: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect();
    paths.sort();

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for path in paths {
        let relative = path
            .strip_prefix(root)
            .map_err(|e| PackageError::Tooling(e.to_string()))?;
        writer.start_file(relative.to_string_lossy(), options)?;
        let mut file = fs::File::open(&path)?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;
        writer.write_all(&buf)?;
    }
    let cursor = writer.finish()?;
    Ok(cursor.into_inner())
}

// ── Simulated tooling ──────────────────────────────────────────────────

/// Simulated build tooling for tests: writes marker files instead of
/// running real build commands, and archives to a deterministic listing.
pub struct SimulatedBuildTooling {
    should_succeed: bool,
}

impl SimulatedBuildTooling {
    pub fn succeeding() -> Self {
        Self {
            should_succeed: true,
        }
    }

    pub fn failing() -> Self {
        Self {
            should_succeed: false,
        }
    }

    fn check(&self, operation: &str) -> PackageResult<()> {
        if self.should_succeed {
            Ok(())
        } else {
            Err(PackageError::Tooling(format!(
                "simulated {operation} failure"
            )))
        }
    }
}

impl BuildTooling for SimulatedBuildTooling {
    fn install_dependencies(&self, manifest: &Path, target: &Path) -> PackageResult<()> {
        self.check("install")?;
        fs::create_dir_all(target.join("vendor"))?;
        fs::write(
            target.join("vendor").join("MANIFEST"),
            manifest.to_string_lossy().as_bytes(),
        )?;
        Ok(())
    }

    fn write_entrypoint(&self, target: &Path) -> PackageResult<()> {
        self.check("entrypoint")?;
        fs::write(target.join("bootstrap"), b"#!simulated\n")?;
        Ok(())
    }

    fn shrink(&self, _target: &Path) -> PackageResult<()> {
        self.check("shrink")
    }

    fn archive(&self, target: &Path) -> PackageResult<Vec<u8>> {
        self.check("archive")?;
        let mut names: Vec<String> = WalkDir::new(target)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path().to_string_lossy().into_owned())
            .collect();
        names.sort();
        Ok(names.join("\n").into_bytes())
    }

    fn name(&self) -> &str {
        "simulated"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitute_fills_placeholders() {
        let out = substitute(
            "install -r {manifest} -t {target}",
            Path::new("deps.txt"),
            Path::new("/tmp/staging"),
        );
        assert_eq!(out, "install -r deps.txt -t /tmp/staging");
    }

    #[test]
    fn zip_directory_produces_archive() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"alpha").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("b.txt"), b"beta").unwrap();

        let bytes = zip_directory(dir.path()).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn zip_directory_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"alpha").unwrap();
        fs::write(dir.path().join("b.txt"), b"beta").unwrap();
        assert_eq!(
            zip_directory(dir.path()).unwrap(),
            zip_directory(dir.path()).unwrap()
        );
    }

    #[test]
    fn shrink_prunes_test_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("pkg").join("tests")).unwrap();
        fs::write(dir.path().join("pkg").join("tests").join("t.txt"), b"x").unwrap();
        fs::write(dir.path().join("pkg").join("lib.rs"), b"y").unwrap();

        let tooling = CommandBuildTooling::new(BuildCommands::default());
        tooling.shrink(dir.path()).unwrap();

        assert!(!dir.path().join("pkg").join("tests").exists());
        assert!(dir.path().join("pkg").join("lib.rs").exists());
    }

    #[test]
    fn shrink_recompresses_configured_packages() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("bigpkg")).unwrap();
        fs::write(dir.path().join("bigpkg").join("data.bin"), vec![0u8; 256]).unwrap();

        let tooling = CommandBuildTooling::new(BuildCommands {
            shrink_packages: vec!["bigpkg".into()],
            ..Default::default()
        });
        tooling.shrink(dir.path()).unwrap();

        assert!(!dir.path().join("bigpkg").exists());
        assert!(dir.path().join("bigpkg.zip").exists());
    }

    #[test]
    fn simulated_tooling_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let tooling = SimulatedBuildTooling::failing();
        assert!(tooling
            .install_dependencies(Path::new("deps.txt"), dir.path())
            .is_err());
    }
}
