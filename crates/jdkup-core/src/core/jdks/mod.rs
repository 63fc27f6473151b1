//! The JDK cache directory: provisioned installations, their markers and the
//! locks that serialize writers.

mod install;
mod lock;
mod marker;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use jdkup_domain::OperatingSystem;

use crate::fs::prune_stale_entries;
use crate::ToolchainError;

pub use install::{install_folder_name, name_without_extensions, JdkInstaller};
pub use lock::{lock_path, WriteLock};
pub use marker::{
    all_marked_locations, is_marked, mark_as_ready, marked_location, resolve_effective_home,
    InstallState, MARKER_FILE,
};

/// Prefix of in-flight downloads and unpack staging directories.
pub(crate) const STAGING_PREFIX: &str = ".staging-";

/// Leftovers younger than this may belong to a running install.
pub const DEFAULT_PRUNE_AGE: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone)]
pub struct JdkCacheDirectory {
    root: PathBuf,
    os: OperatingSystem,
}

impl JdkCacheDirectory {
    /// Opens the cache at `root`, creating it when missing.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created.
    pub fn new(root: impl Into<PathBuf>, os: OperatingSystem) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .with_context(|| format!("failed to create JDK cache at {}", root.display()))?;
        Ok(Self { root, os })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn os(&self) -> OperatingSystem {
        self.os
    }

    /// Where an archive named `file_name` is downloaded to.
    #[must_use]
    pub fn archive_path(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }

    /// Java homes of every ready installation. Takes no lock.
    #[must_use]
    pub fn list_java_homes(&self) -> Vec<PathBuf> {
        self.children()
            .iter()
            .flat_map(|child| all_marked_locations(child))
            .map(|marked| resolve_effective_home(&marked, self.os))
            .collect()
    }

    /// State of every directory in the cache.
    #[must_use]
    pub fn install_states(&self) -> Vec<(PathBuf, InstallState)> {
        self.children()
            .into_iter()
            .map(|child| {
                let state = InstallState::of(&child);
                (child, state)
            })
            .collect()
    }

    /// Blocks until the writer lock for `target` is held.
    ///
    /// # Errors
    /// Returns [`ToolchainError::Lock`] if locking fails.
    pub fn acquire_write_lock(
        &self,
        target: &Path,
        operation: &str,
    ) -> Result<WriteLock, ToolchainError> {
        WriteLock::acquire(target, operation)
    }

    /// Deletes unmarked directories and abandoned staging files older than `max_age`.
    pub fn prune_stale_leftovers(&self, max_age: Duration) -> Vec<PathBuf> {
        let removed = prune_stale_entries(&self.root, max_age, |path| {
            let staging = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(STAGING_PREFIX));
            staging || InstallState::of(path) == InstallState::Unpacking
        });
        for path in &removed {
            tracing::info!(path = %path.display(), "pruned stale cache entry");
        }
        removed
    }

    fn children(&self) -> Vec<PathBuf> {
        let Ok(entries) = fs::read_dir(&self.root) else {
            return Vec::new();
        };
        let mut children: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .filter(|path| {
                !path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with(STAGING_PREFIX))
            })
            .collect();
        children.sort();
        children
    }
}
