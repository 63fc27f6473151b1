//! Downloading and installing a toolchain for the current platform.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use jdkup_domain::{BuildPlatform, ToolchainSpec};
use url::Url;

use crate::config::Config;
use crate::jdks::{JdkCacheDirectory, JdkInstaller};
use crate::repository::ToolchainRepositoriesResolver;
use crate::transfer::{is_complete_archive, ArchiveKind, Cancellation, ResourceFetcher};
use crate::ToolchainError;

pub trait ToolchainProvisioningService: Send + Sync {
    /// Installs a toolchain satisfying `spec` and returns its java home.
    ///
    /// # Errors
    /// Returns the typed reason provisioning was impossible or failed.
    fn try_install(&self, spec: &ToolchainSpec) -> Result<PathBuf, ToolchainError>;
}

/// Which provisioning switches are on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvisioningPolicy {
    pub online: bool,
    pub auto_download: bool,
}

impl ProvisioningPolicy {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            online: config.network().online,
            auto_download: config.provisioning().auto_download,
        }
    }

    fn check(self) -> Result<(), ToolchainError> {
        if !self.online {
            return Err(ToolchainError::ProvisioningDisabled {
                reason: "jdkup is running offline".to_string(),
            });
        }
        if !self.auto_download {
            return Err(ToolchainError::ProvisioningDisabled {
                reason: "JDKUP_AUTO_DOWNLOAD is disabled".to_string(),
            });
        }
        Ok(())
    }
}

pub struct DefaultToolchainProvisioningService {
    guard: Mutex<()>,
    policy: ProvisioningPolicy,
    platform: Option<BuildPlatform>,
    resolver: Arc<ToolchainRepositoriesResolver>,
    fetcher: Arc<dyn ResourceFetcher>,
    cache: JdkCacheDirectory,
    installer: JdkInstaller,
    cancellation: Cancellation,
}

impl DefaultToolchainProvisioningService {
    #[must_use]
    pub fn new(
        policy: ProvisioningPolicy,
        platform: Option<BuildPlatform>,
        resolver: Arc<ToolchainRepositoriesResolver>,
        fetcher: Arc<dyn ResourceFetcher>,
        cache: JdkCacheDirectory,
        installer: JdkInstaller,
    ) -> Self {
        Self {
            guard: Mutex::new(()),
            policy,
            platform,
            resolver,
            fetcher,
            cache,
            installer,
            cancellation: Cancellation::new(),
        }
    }

    /// Handle that aborts in-flight downloads of this service.
    #[must_use]
    pub fn cancellation(&self) -> Cancellation {
        self.cancellation.clone()
    }

    fn download_and_install(&self, spec: &ToolchainSpec, uri: &Url) -> Result<PathBuf> {
        let resource = self.fetcher.resource_metadata(uri)?;
        ArchiveKind::from_file_name(&resource.file_name)?;
        let archive = self.cache.archive_path(&resource.file_name);
        let _lock = self
            .cache
            .acquire_write_lock(&archive, "toolchain provisioning")?;
        if is_complete_archive(&archive) {
            tracing::info!(archive = %archive.display(), "toolchain archive already downloaded");
        } else {
            self.fetcher
                .download(&resource.location, &archive, &self.cancellation)?;
        }
        self.installer
            .install(self.cache.root(), spec, &archive, uri)
    }
}

impl ToolchainProvisioningService for DefaultToolchainProvisioningService {
    fn try_install(&self, spec: &ToolchainSpec) -> Result<PathBuf, ToolchainError> {
        let _guard = self
            .guard
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        self.policy.check()?;
        let platform = self.platform.ok_or_else(|| ToolchainError::UnsupportedPlatform {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        })?;
        let uri = self
            .resolver
            .resolve_download_url(spec, platform)?
            .ok_or(ToolchainError::NoDownloadUrl {
                spec: *spec,
                platform,
            })?;
        tracing::info!(%spec, %uri, "provisioning toolchain");
        self.download_and_install(spec, &uri).map_err(|cause| {
            if let Some(ToolchainError::UnsupportedArchive { file_name }) =
                cause.downcast_ref::<ToolchainError>()
            {
                return ToolchainError::UnsupportedArchive {
                    file_name: file_name.clone(),
                };
            }
            ToolchainError::DownloadFailed {
                spec: *spec,
                uri: uri.clone(),
                cause,
            }
        })
    }
}
