use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use jdkup_domain::{
    matches, InstallationLocation, JvmInstallationMetadata, JvmMetadata, OperatingSystem,
    ToolchainSpec,
};
use url::Url;

use super::marker::{is_marked, mark_as_ready, marked_location, resolve_effective_home};
use crate::fs::{copy_dir_all, is_non_empty_dir, remove_dir_all_writable};
use crate::probe::JvmMetadataDetector;
use crate::transfer::unpack;
use crate::ToolchainError;

/// Moves a downloaded archive into its final, marked install folder.
pub struct JdkInstaller {
    detector: Arc<dyn JvmMetadataDetector>,
    os: OperatingSystem,
}

impl JdkInstaller {
    #[must_use]
    pub fn new(detector: Arc<dyn JvmMetadataDetector>, os: OperatingSystem) -> Self {
        Self { detector, os }
    }

    /// Unpacks `archive` under `jdks_root`, validates it against `spec` and
    /// installs it into its canonical folder, returning the java home.
    ///
    /// The unpack folder is removed on every path; the install folder is
    /// removed again when anything after naming it fails.
    ///
    /// # Errors
    /// Returns [`ToolchainError::InvalidInstallation`] or
    /// [`ToolchainError::SpecMismatch`] for unusable archives, and I/O errors.
    pub fn install(
        &self,
        jdks_root: &Path,
        spec: &ToolchainSpec,
        archive: &Path,
        uri: &Url,
    ) -> Result<PathBuf> {
        let file_name = archive
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .with_context(|| format!("{} has no file name", archive.display()))?;
        let unpack_folder = jdks_root.join(name_without_extensions(&file_name));
        let _cleanup = RemoveOnDrop(unpack_folder.clone());

        unpack(archive, &unpack_folder)?;
        let marked = marked_location(&unpack_folder)?;
        mark_as_ready(&marked)?;

        let metadata = self.probe(&resolve_effective_home(&marked, self.os))?;
        if !matches(&metadata, spec) {
            return Err(ToolchainError::SpecMismatch {
                uri: uri.clone(),
                spec: *spec,
                metadata: Box::new(metadata),
            }
            .into());
        }

        let install_folder = jdks_root.join(install_folder_name(&metadata, self.os));
        let installed = self.replace_install_folder(&marked, &install_folder);
        if installed.is_err() {
            if let Err(err) = remove_dir_all_writable(&install_folder) {
                tracing::warn!(
                    path = %install_folder.display(),
                    error = %err,
                    "failed to roll back partial installation"
                );
            }
        }
        let home = installed?;
        tracing::info!(
            home = %home.display(),
            version = %metadata.language_version,
            vendor = %metadata.vendor.display_name(),
            "installed toolchain"
        );
        Ok(home)
    }

    fn probe(&self, home: &Path) -> Result<JvmMetadata> {
        let location = InstallationLocation::auto_provisioned(home, "provisioned toolchain");
        match self.detector.metadata(&location) {
            JvmInstallationMetadata::Valid(metadata) => Ok(metadata),
            invalid => Err(ToolchainError::InvalidInstallation {
                path: home.to_path_buf(),
                message: invalid.error_message().unwrap_or_default(),
            }
            .into()),
        }
    }

    fn replace_install_folder(&self, marked: &Path, install_folder: &Path) -> Result<PathBuf> {
        if is_non_empty_dir(install_folder) && is_marked(install_folder) {
            tracing::warn!(
                path = %install_folder.display(),
                existing = %self.describe(install_folder),
                "overwriting existing installation"
            );
        }
        remove_dir_all_writable(install_folder)?;
        copy_dir_all(marked, install_folder)?;
        Ok(resolve_effective_home(install_folder, self.os))
    }

    fn describe(&self, install_folder: &Path) -> String {
        let home = resolve_effective_home(install_folder, self.os);
        let location = InstallationLocation::auto_provisioned(home, "existing installation");
        self.detector
            .metadata(&location)
            .into_valid()
            .map_or_else(
                || "could not be determined".to_string(),
                |metadata| metadata.display_name(),
            )
    }
}

struct RemoveOnDrop(PathBuf);

impl Drop for RemoveOnDrop {
    fn drop(&mut self) {
        if let Err(err) = remove_dir_all_writable(&self.0) {
            tracing::warn!(path = %self.0.display(), error = %err, "failed to clean up unpacked archive");
        }
    }
}

/// `OpenJDK17U-jdk_x64_linux_hotspot_17.0.9_9.tar.gz` ->
/// `OpenJDK17U-jdk_x64_linux_hotspot_17`: everything after the first dot goes.
/// Leading dots belong to the name, so `.hidden.zip` becomes `.hidden` and the
/// unpack folder never ends up empty.
#[must_use]
pub fn name_without_extensions(file_name: &str) -> &str {
    let leading = file_name.len() - file_name.trim_start_matches('.').len();
    match file_name[leading..].find('.') {
        Some(dot) => &file_name[..leading + dot],
        None => file_name,
    }
}

/// `vendor-major-arch-osfamily`, lower-cased with anything outside
/// `[a-z0-9-]` replaced by `_`.
#[must_use]
pub fn install_folder_name(metadata: &JvmMetadata, os: OperatingSystem) -> String {
    let vendor = if metadata.jvm_vendor.trim().is_empty() {
        metadata.vendor.raw.as_str()
    } else {
        metadata.jvm_vendor.as_str()
    };
    let raw = format!(
        "{vendor}-{}-{}-{}",
        metadata.language_version,
        metadata.architecture,
        os.family_name()
    );
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}
