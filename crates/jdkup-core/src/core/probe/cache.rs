use std::collections::{BTreeMap, HashMap};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use fs4::FileExt;
use jdkup_domain::{
    matches, InstallationLocation, JvmInstallationMetadata, JvmMetadata, OperatingSystem,
    ToolchainSpec,
};
use tempfile::NamedTempFile;

use super::{java_executable, JvmMetadataDetector};

/// Memoises successful probes per java home for the lifetime of the process.
pub struct CachingMetadataDetector {
    inner: Arc<dyn JvmMetadataDetector>,
    probed: Mutex<HashMap<PathBuf, JvmMetadata>>,
}

impl CachingMetadataDetector {
    #[must_use]
    pub fn new(inner: Arc<dyn JvmMetadataDetector>) -> Self {
        Self {
            inner,
            probed: Mutex::new(HashMap::new()),
        }
    }
}

impl JvmMetadataDetector for CachingMetadataDetector {
    fn metadata(&self, location: &InstallationLocation) -> JvmInstallationMetadata {
        if let Ok(probed) = self.probed.lock() {
            if let Some(hit) = probed.get(&location.path) {
                return JvmInstallationMetadata::Valid(hit.clone());
            }
        }
        let metadata = self.inner.metadata(location);
        if let Some(valid) = metadata.valid() {
            if let Ok(mut probed) = self.probed.lock() {
                probed.insert(location.path.clone(), valid.clone());
            }
        }
        metadata
    }
}

/// Launcher-side record of the JVM last selected for each language version,
/// stored as JSON next to the JDK cache.
#[derive(Debug, Clone)]
pub struct DaemonJvmMetadataCache {
    path: PathBuf,
    os: OperatingSystem,
}

impl DaemonJvmMetadataCache {
    pub const FILE_NAME: &'static str = "daemon-jvm-metadata.json";

    #[must_use]
    pub fn new(home: &Path, os: OperatingSystem) -> Self {
        Self {
            path: home.join(Self::FILE_NAME),
            os,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cached metadata for `spec`, if its home still has a launcher and still matches.
    #[must_use]
    pub fn lookup(&self, spec: &ToolchainSpec) -> Option<JvmMetadata> {
        let version = spec.language_version?;
        let entries = match self.read() {
            Ok(entries) => entries,
            Err(err) => {
                tracing::debug!(error = %err, "ignoring unreadable metadata cache");
                return None;
            }
        };
        let cached = entries.get(&version.as_u32())?;
        if !java_executable(&cached.java_home, self.os).is_file() {
            tracing::debug!(home = %cached.java_home.display(), "cached installation disappeared");
            return None;
        }
        matches(cached, spec).then(|| cached.clone())
    }

    /// Records `metadata` under its language version.
    ///
    /// # Errors
    /// Returns an error if the cache file cannot be locked or written.
    pub fn record(&self, metadata: &JvmMetadata) -> Result<()> {
        let parent = self
            .path
            .parent()
            .context("metadata cache path has no parent directory")?;
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
        let lock_path = self.path.with_extension("json.lock");
        let lock = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .with_context(|| format!("failed to open {}", lock_path.display()))?;
        lock.lock_exclusive()
            .with_context(|| format!("failed to lock {}", lock_path.display()))?;

        let mut entries = self.read().unwrap_or_default();
        entries.insert(metadata.language_version.as_u32(), metadata.clone());
        let mut staged = NamedTempFile::new_in(parent)
            .with_context(|| format!("failed to stage {}", self.path.display()))?;
        serde_json::to_writer_pretty(staged.as_file_mut(), &entries)?;
        staged.as_file_mut().flush()?;
        staged
            .persist(&self.path)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        let _ = lock.unlock();
        Ok(())
    }

    fn read(&self) -> Result<BTreeMap<u32, JvmMetadata>> {
        match fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("failed to parse {}", self.path.display())),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err).with_context(|| format!("failed to read {}", self.path.display())),
        }
    }
}
