//! Toolchain repositories map a specification and platform to a download URL.

mod foojay;
mod template;

use std::collections::HashMap;

use anyhow::Result;
use jdkup_domain::{toolchain_supported_platforms, BuildPlatform, ToolchainSpec};
use url::Url;

use crate::ToolchainError;

pub use foojay::FoojayRepository;
pub use template::{PlatformUrlRepository, UrlTemplateRepository};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolchainRequest {
    pub spec: ToolchainSpec,
    pub platform: BuildPlatform,
}

pub trait ToolchainRepository: Send + Sync {
    fn name(&self) -> &str;

    /// Download URL for `request`, `None` when this repository has no match.
    ///
    /// # Errors
    /// Returns an error when the repository cannot be queried.
    fn resolve(&self, request: &ToolchainRequest) -> Result<Option<Url>>;
}

/// Queries repositories in priority order; the first URL wins.
pub struct ToolchainRepositoriesResolver {
    repositories: Vec<Box<dyn ToolchainRepository>>,
}

impl ToolchainRepositoriesResolver {
    #[must_use]
    pub fn new(repositories: Vec<Box<dyn ToolchainRepository>>) -> Self {
        Self { repositories }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.repositories.iter().map(|repo| repo.name()).collect()
    }

    /// One entry per supported platform, `None` where nobody answered.
    ///
    /// # Errors
    /// [`ToolchainError::UnconfiguredRepositories`] when no repository is
    /// configured; [`ToolchainError::RepositoryQuery`] when one fails.
    pub fn resolve_download_urls(
        &self,
        spec: &ToolchainSpec,
    ) -> Result<HashMap<BuildPlatform, Option<Url>>, ToolchainError> {
        self.ensure_configured()?;
        toolchain_supported_platforms()
            .into_iter()
            .map(|platform| Ok((platform, self.query(spec, platform)?)))
            .collect()
    }

    /// # Errors
    /// Same as [`Self::resolve_download_urls`].
    pub fn resolve_download_url(
        &self,
        spec: &ToolchainSpec,
        platform: BuildPlatform,
    ) -> Result<Option<Url>, ToolchainError> {
        self.ensure_configured()?;
        self.query(spec, platform)
    }

    fn ensure_configured(&self) -> Result<(), ToolchainError> {
        if self.repositories.is_empty() {
            return Err(ToolchainError::UnconfiguredRepositories);
        }
        Ok(())
    }

    fn query(
        &self,
        spec: &ToolchainSpec,
        platform: BuildPlatform,
    ) -> Result<Option<Url>, ToolchainError> {
        let request = ToolchainRequest {
            spec: *spec,
            platform,
        };
        for repository in &self.repositories {
            let resolved =
                repository
                    .resolve(&request)
                    .map_err(|cause| ToolchainError::RepositoryQuery {
                        repository: repository.name().to_string(),
                        platform,
                        cause,
                    })?;
            if let Some(url) = resolved {
                tracing::debug!(
                    repository = repository.name(),
                    %platform,
                    %url,
                    "resolved toolchain download"
                );
                return Ok(Some(url));
            }
        }
        Ok(None)
    }
}
