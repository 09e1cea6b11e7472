use crate::config::LintConfig;
use crate::lint::{lint, LintReport};
use crate::CoreError;
use pipspec_schema::{
    compute_manifest_digest, parse_manifest_file, LockDrift, LockFile, ManifestIdentity,
    NormalizedPipfile, Pipfile,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Entry point for file-level manifest operations.
///
/// Holds the lint policy and ties manifest parsing, linting, digesting, and
/// lock verification together for the CLI.
pub struct Engine {
    config: LintConfig,
}

/// Outcome of linting a manifest file.
pub struct CheckResult {
    pub manifest: Pipfile,
    pub report: LintReport,
}

/// Outcome of checking a lock file against its manifest.
pub struct LockCheckResult {
    pub lock_path: PathBuf,
    pub identity: ManifestIdentity,
    pub drift: Vec<LockDrift>,
}

impl Engine {
    pub fn new(config: LintConfig) -> Self {
        Self { config }
    }

    /// Build an engine from a config file, or from the default config
    /// location when `path` is `None`.
    pub fn from_config_file(path: Option<&Path>) -> Result<Self, CoreError> {
        let config = match path {
            Some(p) => LintConfig::load(p)?,
            None => LintConfig::load_default()?,
        };
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &LintConfig {
        &self.config
    }

    pub fn load(&self, manifest_path: &Path) -> Result<Pipfile, CoreError> {
        debug!("reading manifest {}", manifest_path.display());
        Ok(parse_manifest_file(manifest_path)?)
    }

    pub fn load_normalized(&self, manifest_path: &Path) -> Result<NormalizedPipfile, CoreError> {
        Ok(self.load(manifest_path)?.normalize()?)
    }

    pub fn check(&self, manifest_path: &Path) -> Result<CheckResult, CoreError> {
        info!("checking {}", manifest_path.display());
        let manifest = self.load(manifest_path)?;
        let report = lint(&manifest, &self.config);
        info!(
            "{}: {} error(s), {} warning(s)",
            manifest_path.display(),
            report.errors(),
            report.warnings()
        );
        Ok(CheckResult { manifest, report })
    }

    pub fn digest(&self, manifest_path: &Path) -> Result<ManifestIdentity, CoreError> {
        let normalized = self.load_normalized(manifest_path)?;
        let identity = compute_manifest_digest(&normalized);
        debug!("{} digest {}", manifest_path.display(), identity.digest);
        Ok(identity)
    }

    /// Compare a lock file with its manifest. When `lock_path` is `None` the
    /// lock is looked up next to the manifest as `<manifest>.lock`.
    pub fn verify_lock(
        &self,
        manifest_path: &Path,
        lock_path: Option<&Path>,
    ) -> Result<LockCheckResult, CoreError> {
        let lock_path = lock_path.map_or_else(|| default_lock_path(manifest_path), Path::to_path_buf);
        info!(
            "verifying {} against {}",
            lock_path.display(),
            manifest_path.display()
        );
        let normalized = self.load_normalized(manifest_path)?;
        let lock = LockFile::read_from_file(&lock_path)?;
        let drift = lock.drift(&normalized);
        Ok(LockCheckResult {
            lock_path,
            identity: compute_manifest_digest(&normalized),
            drift,
        })
    }
}

/// `Pipfile` -> `Pipfile.lock`, alongside the manifest.
pub fn default_lock_path(manifest_path: &Path) -> PathBuf {
    let mut name = manifest_path
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_else(|| "Pipfile".into());
    name.push(".lock");
    manifest_path.with_file_name(name)
}
