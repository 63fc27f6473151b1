//! Wires the engine together from a [`Config`].

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use jdkup_domain::{BuildPlatform, DaemonJvmProperties, InstallationComparator, OperatingSystem};
use reqwest::blocking::Client;

use crate::config::{Config, RepositoryEntry};
use crate::discovery::{
    AutoProvisionedSupplier, ChildDirectorySupplier, CurrentInstallationSupplier,
    EnvironmentVariableListSupplier, InstallationSupplier, JavaInstallationRegistry,
    LocationListSupplier,
};
use crate::jdks::{JdkCacheDirectory, JdkInstaller};
use crate::net::build_http_client;
use crate::probe::{
    CachingMetadataDetector, DaemonJvmMetadataCache, JvmMetadataDetector, ProcessMetadataDetector,
};
use crate::provision::{DefaultToolchainProvisioningService, ProvisioningPolicy};
use crate::query::ToolchainQueryService;
use crate::repository::{
    FoojayRepository, PlatformUrlRepository, ToolchainRepositoriesResolver, ToolchainRepository,
    UrlTemplateRepository,
};
use crate::transfer::HttpResourceFetcher;

pub struct ToolchainServices {
    os: OperatingSystem,
    platform: Option<BuildPlatform>,
    cache: JdkCacheDirectory,
    registry: Arc<JavaInstallationRegistry>,
    resolver: ToolchainRepositoriesResolver,
    provisioning: Arc<DefaultToolchainProvisioningService>,
    query: ToolchainQueryService,
    metadata_cache: DaemonJvmMetadataCache,
}

impl ToolchainServices {
    /// # Errors
    /// Returns an error if the HTTP client, the JDK cache directory or a
    /// repository cannot be set up.
    pub fn from_config(config: &Config) -> Result<Self> {
        let platform = BuildPlatform::current();
        let os = OperatingSystem::current().unwrap_or(OperatingSystem::Unix);
        let client = build_http_client(config.network())?;
        let cache = JdkCacheDirectory::new(config.jdks_dir(), os)?;
        let detector: Arc<dyn JvmMetadataDetector> = Arc::new(CachingMetadataDetector::new(
            Arc::new(ProcessMetadataDetector::new(os)),
        ));

        let current = CurrentInstallationSupplier::new(
            config.discovery().host.java_home.clone(),
            which::which(os.executable_name("java")).ok(),
        );
        let comparator = InstallationComparator::new(current.current_home());
        let registry = Arc::new(JavaInstallationRegistry::new(
            suppliers(config, &cache, current, os),
            Arc::clone(&detector),
        ));

        let mut provisioning_repositories = Vec::new();
        if let Some(recorded) = recorded_platform_urls(config.properties_file()) {
            provisioning_repositories.push(Box::new(recorded) as Box<dyn ToolchainRepository>);
        }
        provisioning_repositories.extend(configured_repositories(config, &client)?);
        let provisioning = Arc::new(DefaultToolchainProvisioningService::new(
            ProvisioningPolicy::from_config(config),
            platform,
            Arc::new(ToolchainRepositoriesResolver::new(provisioning_repositories)),
            Arc::new(HttpResourceFetcher::new(client.clone())),
            cache.clone(),
            JdkInstaller::new(Arc::clone(&detector), os),
        ));
        let query = ToolchainQueryService::new(
            Arc::clone(&registry),
            detector,
            provisioning.clone(),
            comparator,
            platform,
        );

        Ok(Self {
            os,
            platform,
            metadata_cache: DaemonJvmMetadataCache::new(&config.home().path, os),
            cache,
            registry,
            resolver: ToolchainRepositoriesResolver::new(configured_repositories(config, &client)?),
            provisioning,
            query,
        })
    }

    #[must_use]
    pub fn os(&self) -> OperatingSystem {
        self.os
    }

    #[must_use]
    pub fn platform(&self) -> Option<BuildPlatform> {
        self.platform
    }

    #[must_use]
    pub fn cache(&self) -> &JdkCacheDirectory {
        &self.cache
    }

    #[must_use]
    pub fn registry(&self) -> &JavaInstallationRegistry {
        &self.registry
    }

    /// Repositories from `JDKUP_REPOSITORIES`, without recorded criteria URLs.
    #[must_use]
    pub fn resolver(&self) -> &ToolchainRepositoriesResolver {
        &self.resolver
    }

    #[must_use]
    pub fn provisioning(&self) -> &DefaultToolchainProvisioningService {
        &self.provisioning
    }

    #[must_use]
    pub fn query(&self) -> &ToolchainQueryService {
        &self.query
    }

    #[must_use]
    pub fn metadata_cache(&self) -> &DaemonJvmMetadataCache {
        &self.metadata_cache
    }
}

fn suppliers(
    config: &Config,
    cache: &JdkCacheDirectory,
    current: CurrentInstallationSupplier,
    os: OperatingSystem,
) -> Vec<Box<dyn InstallationSupplier>> {
    let discovery = config.discovery();
    let mut suppliers: Vec<Box<dyn InstallationSupplier>> = vec![
        Box::new(AutoProvisionedSupplier::new(cache.clone())),
        Box::new(LocationListSupplier::new(discovery.installation_paths.clone())),
        Box::new(EnvironmentVariableListSupplier::new(
            discovery.environment_values(),
        )),
    ];
    if !discovery.auto_detect {
        return suppliers;
    }
    let host = &discovery.host;
    suppliers.push(Box::new(current));
    if let Some(dir) = &host.asdf_data_dir {
        suppliers.push(Box::new(ChildDirectorySupplier::asdf(dir.clone(), os)));
    }
    if let Some(dir) = &host.sdkman_candidates_dir {
        suppliers.push(Box::new(ChildDirectorySupplier::sdkman(dir.clone(), os)));
    }
    if let Some(dir) = &host.jabba_home {
        suppliers.push(Box::new(ChildDirectorySupplier::jabba(dir.clone(), os)));
    }
    if let Some(home) = &host.user_home {
        suppliers.push(Box::new(ChildDirectorySupplier::intellij(home, os)));
        suppliers.push(Box::new(ChildDirectorySupplier::macos(home, os)));
    }
    suppliers.push(Box::new(ChildDirectorySupplier::linux(os)));
    suppliers.push(Box::new(ChildDirectorySupplier::windows(
        host.program_files.clone(),
        os,
    )));
    suppliers
}

fn configured_repositories(
    config: &Config,
    client: &Client,
) -> Result<Vec<Box<dyn ToolchainRepository>>> {
    let repositories = config.repositories();
    repositories
        .entries
        .iter()
        .map(|entry| -> Result<Box<dyn ToolchainRepository>> {
            Ok(match entry {
                RepositoryEntry::Foojay => Box::new(FoojayRepository::new(
                    client.clone(),
                    &repositories.foojay_url,
                )?),
                RepositoryEntry::Template(template) => {
                    Box::new(UrlTemplateRepository::new(template.clone()))
                }
            })
        })
        .collect()
}

/// Download URLs recorded in the criteria file, bound to the criteria they were recorded for.
fn recorded_platform_urls(path: &Path) -> Option<PlatformUrlRepository> {
    let properties = match DaemonJvmProperties::load(path) {
        Ok(properties) => properties,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "ignoring unreadable daemon JVM criteria");
            return None;
        }
    };
    let spec = match properties.toolchain_spec(path) {
        Ok(spec) if spec.is_configured() => spec,
        Ok(_) => return None,
        Err(err) => {
            tracing::warn!("{err}");
            return None;
        }
    };
    let repository = PlatformUrlRepository::new(spec, properties.download_urls());
    (!repository.is_empty()).then_some(repository)
}
