use std::path::PathBuf;

use jdkup_domain::{BuildPlatform, JvmMetadata, ToolchainSpec};
use url::Url;

/// Failures surfaced by discovery, resolution and provisioning.
#[derive(Debug, thiserror::Error)]
pub enum ToolchainError {
    #[error("Toolchain download repositories have not been configured.")]
    UnconfiguredRepositories,

    #[error("Toolchain auto-provisioning is not enabled: {reason}")]
    ProvisioningDisabled { reason: String },

    #[error("Toolchain auto-provisioning is not supported on this platform ({os} on {arch}).")]
    UnsupportedPlatform { os: String, arch: String },

    #[error("Cannot download toolchain archive '{file_name}': only .zip, .tar.gz and .tgz archives are supported.")]
    UnsupportedArchive { file_name: String },

    #[error("No toolchain download URL is known for {spec} on {platform}.")]
    NoDownloadUrl {
        spec: ToolchainSpec,
        platform: BuildPlatform,
    },

    #[error("Cannot find a Java installation on your machine matching the requirements: {spec} for {platform}.")]
    NoMatchingToolchain {
        spec: ToolchainSpec,
        platform: BuildPlatform,
        #[source]
        cause: Option<Box<ToolchainError>>,
    },

    #[error("Toolchain repository '{repository}' failed to resolve a download for {platform}: {cause:#}")]
    RepositoryQuery {
        repository: String,
        platform: BuildPlatform,
        cause: anyhow::Error,
    },

    #[error("Unable to download toolchain matching the requirements ({spec}) from '{uri}', due to: {cause:#}")]
    DownloadFailed {
        spec: ToolchainSpec,
        uri: Url,
        cause: anyhow::Error,
    },

    #[error(
        "Toolchain provisioned from '{uri}' doesn't satisfy the specification: {spec}. Found {}.",
        metadata.display_name()
    )]
    SpecMismatch {
        uri: Url,
        spec: ToolchainSpec,
        metadata: Box<JvmMetadata>,
    },

    #[error("Toolchain installation '{path}' could not be probed: {message}")]
    InvalidInstallation { path: PathBuf, message: String },

    #[error("failed to lock {path}")]
    Lock {
        path: PathBuf,
        #[source]
        cause: std::io::Error,
    },

    #[error("download cancelled")]
    Cancelled,
}

impl ToolchainError {
    /// Configuration problems and resolution misses the user can act on.
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        match self {
            Self::UnconfiguredRepositories
            | Self::ProvisioningDisabled { .. }
            | Self::UnsupportedPlatform { .. }
            | Self::UnsupportedArchive { .. }
            | Self::NoDownloadUrl { .. }
            | Self::SpecMismatch { .. } => true,
            Self::NoMatchingToolchain { cause, .. } => {
                cause.as_deref().map_or(true, Self::is_user_error)
            }
            Self::RepositoryQuery { .. }
            | Self::DownloadFailed { .. }
            | Self::InvalidInstallation { .. }
            | Self::Lock { .. }
            | Self::Cancelled => false,
        }
    }

    /// Short machine-readable reason used in command details.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::UnconfiguredRepositories => "repositories_not_configured",
            Self::ProvisioningDisabled { .. } => "provisioning_disabled",
            Self::UnsupportedPlatform { .. } => "unsupported_platform",
            Self::UnsupportedArchive { .. } => "unsupported_archive",
            Self::NoDownloadUrl { .. } => "no_download_url",
            Self::NoMatchingToolchain { .. } => "no_matching_toolchain",
            Self::RepositoryQuery { .. } => "repository_query_failed",
            Self::DownloadFailed { .. } => "download_failed",
            Self::SpecMismatch { .. } => "specification_mismatch",
            Self::InvalidInstallation { .. } => "invalid_installation",
            Self::Lock { .. } => "lock_failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// A suggestion for fixing the problem, when one exists.
    #[must_use]
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::UnconfiguredRepositories => Some(
                "set JDKUP_REPOSITORIES (e.g. `foojay`) or record download URLs with `jdkup update`",
            ),
            Self::ProvisioningDisabled { .. } => {
                Some("unset JDKUP_ONLINE/JDKUP_AUTO_DOWNLOAD or pass --online")
            }
            Self::NoDownloadUrl { .. } => Some(
                "add a repository that serves this platform or install a matching JDK manually",
            ),
            Self::NoMatchingToolchain { cause, .. } => cause.as_deref().and_then(Self::hint),
            Self::UnsupportedArchive { .. } => {
                Some("point the repository at a .zip or .tar.gz distribution")
            }
            _ => None,
        }
    }

    /// Innermost typed cause, looking through `NoMatchingToolchain` and `DownloadFailed`.
    #[must_use]
    pub fn root(&self) -> &ToolchainError {
        match self {
            Self::NoMatchingToolchain {
                cause: Some(cause), ..
            } => cause.root(),
            Self::DownloadFailed { cause, .. } => cause
                .downcast_ref::<ToolchainError>()
                .map_or(self, ToolchainError::root),
            _ => self,
        }
    }
}
