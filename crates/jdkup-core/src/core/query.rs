//! Answering "which JVM should run this?" from the host or by provisioning.

use std::sync::Arc;

use jdkup_domain::{
    BuildPlatform, InstallationComparator, InstallationLocation, JvmInstallationMetadata,
    JvmMetadata, JvmToolchain, ToolchainSpec,
};
use serde::Serialize;

use crate::discovery::JavaInstallationRegistry;
use crate::probe::JvmMetadataDetector;
use crate::provision::ToolchainProvisioningService;
use crate::ToolchainError;

/// The selected JVM and whether it came out of the JDK cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolchainMatch {
    pub metadata: JvmMetadata,
    pub auto_provisioned: bool,
    pub provisioned_now: bool,
}

pub struct ToolchainQueryService {
    registry: Arc<JavaInstallationRegistry>,
    detector: Arc<dyn JvmMetadataDetector>,
    provisioning: Arc<dyn ToolchainProvisioningService>,
    comparator: InstallationComparator,
    platform: Option<BuildPlatform>,
}

impl ToolchainQueryService {
    #[must_use]
    pub fn new(
        registry: Arc<JavaInstallationRegistry>,
        detector: Arc<dyn JvmMetadataDetector>,
        provisioning: Arc<dyn ToolchainProvisioningService>,
        comparator: InstallationComparator,
        platform: Option<BuildPlatform>,
    ) -> Self {
        Self {
            registry,
            detector,
            provisioning,
            comparator,
            platform,
        }
    }

    /// Best installed match for `spec`, provisioning one when none exists.
    ///
    /// # Errors
    /// [`ToolchainError::NoMatchingToolchain`] wrapping the provisioning
    /// failure, or [`ToolchainError::InvalidInstallation`] when the
    /// provisioned home cannot be probed.
    pub fn find_matching_toolchain(
        &self,
        spec: &ToolchainSpec,
    ) -> Result<ToolchainMatch, ToolchainError> {
        let toolchains = self.registry.toolchains();
        let best = self
            .comparator
            .select_best(toolchains.iter().filter_map(JvmToolchain::valid), spec)
            .cloned();
        if let Some(metadata) = best {
            let auto_provisioned = toolchains.iter().any(|toolchain| {
                toolchain.location.auto_provisioned
                    && toolchain
                        .valid()
                        .is_some_and(|valid| valid.java_home == metadata.java_home)
            });
            tracing::debug!(home = %metadata.java_home.display(), %spec, "found matching installation");
            return Ok(ToolchainMatch {
                metadata,
                auto_provisioned,
                provisioned_now: false,
            });
        }

        tracing::debug!(%spec, "no installed toolchain matches, trying to provision one");
        let home = self.provisioning.try_install(spec).map_err(|cause| {
            match self.platform {
                Some(platform) => ToolchainError::NoMatchingToolchain {
                    spec: *spec,
                    platform,
                    cause: Some(Box::new(cause)),
                },
                None => cause,
            }
        })?;
        let location = InstallationLocation::auto_provisioned(&home, "provisioned toolchain");
        match self.detector.metadata(&location) {
            JvmInstallationMetadata::Valid(metadata) => Ok(ToolchainMatch {
                metadata,
                auto_provisioned: true,
                provisioned_now: true,
            }),
            invalid => Err(ToolchainError::InvalidInstallation {
                path: home,
                message: invalid.error_message().unwrap_or_default(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::{InstallationSupplier, LocationListSupplier};
    use crate::test_support::{write_fake_jdk, ReleaseFileDetector};
    use jdkup_domain::{
        Architecture, JavaLanguageVersion, JvmVendorSpec, KnownJvmVendor, OperatingSystem,
    };
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::tempdir;

    const LINUX: BuildPlatform = BuildPlatform::new(Architecture::X86_64, OperatingSystem::Linux);

    /// Provisions by writing a fake JDK into a fixed directory.
    struct FakeProvisioning {
        home: PathBuf,
        version: &'static str,
        calls: AtomicUsize,
        fail: Mutex<Option<ToolchainError>>,
    }

    impl FakeProvisioning {
        fn new(home: &Path, version: &'static str) -> Self {
            Self {
                home: home.to_path_buf(),
                version,
                calls: AtomicUsize::new(0),
                fail: Mutex::new(None),
            }
        }
    }

    impl ToolchainProvisioningService for FakeProvisioning {
        fn try_install(&self, _spec: &ToolchainSpec) -> Result<std::path::PathBuf, ToolchainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(err) = self.fail.lock().expect("lock").take() {
                return Err(err);
            }
            write_fake_jdk(&self.home, self.version, "Eclipse Adoptium").expect("fake jdk");
            Ok(self.home.clone())
        }
    }

    fn service(
        installed: Vec<PathBuf>,
        current: Option<PathBuf>,
        provisioning: Arc<FakeProvisioning>,
    ) -> ToolchainQueryService {
        let suppliers: Vec<Box<dyn InstallationSupplier>> =
            vec![Box::new(LocationListSupplier::new(installed))];
        let detector: Arc<dyn JvmMetadataDetector> = Arc::new(ReleaseFileDetector);
        ToolchainQueryService::new(
            Arc::new(JavaInstallationRegistry::new(suppliers, Arc::clone(&detector))),
            detector,
            provisioning,
            InstallationComparator::new(current),
            Some(LINUX),
        )
    }

    fn spec(version: u32) -> ToolchainSpec {
        ToolchainSpec::new(JavaLanguageVersion::of(version).expect("version"))
    }

    #[test]
    fn prefers_running_jvm_then_path_order() {
        let temp = tempdir().expect("tempdir");
        let a = temp.path().join("a-jdk17");
        let b = temp.path().join("b-jdk17");
        write_fake_jdk(&a, "17.0.8", "Eclipse Adoptium").expect("a");
        write_fake_jdk(&b, "17.0.9", "Azul Systems, Inc.").expect("b");
        let provisioning = Arc::new(FakeProvisioning::new(&temp.path().join("p"), "17.0.1"));

        let plain = service(vec![b.clone(), a.clone()], None, Arc::clone(&provisioning));
        let found = plain.find_matching_toolchain(&spec(17)).expect("match");
        assert_eq!(found.metadata.java_home, a);
        assert!(!found.provisioned_now);

        let running = service(vec![a.clone(), b.clone()], Some(b.clone()), Arc::clone(&provisioning));
        assert_eq!(
            running
                .find_matching_toolchain(&spec(17))
                .expect("match")
                .metadata
                .java_home,
            b
        );

        let azul = spec(17).with_vendor(JvmVendorSpec::Known(KnownJvmVendor::Azul));
        assert_eq!(
            plain.find_matching_toolchain(&azul).expect("match").metadata.java_home,
            b
        );
        assert_eq!(provisioning.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn provisions_once_on_miss() {
        let temp = tempdir().expect("tempdir");
        let installed = temp.path().join("jdk11");
        write_fake_jdk(&installed, "11.0.21", "Eclipse Adoptium").expect("jdk11");
        let home = temp.path().join("provisioned");
        let provisioning = Arc::new(FakeProvisioning::new(&home, "21.0.1"));

        let found = service(vec![installed], None, Arc::clone(&provisioning))
            .find_matching_toolchain(&spec(21))
            .expect("provisioned");
        assert_eq!(found.metadata.java_home, home);
        assert!(found.auto_provisioned);
        assert!(found.provisioned_now);
        assert_eq!(provisioning.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn provisioning_failure_becomes_no_matching_toolchain() {
        let temp = tempdir().expect("tempdir");
        let provisioning = Arc::new(FakeProvisioning::new(&temp.path().join("p"), "21.0.1"));
        *provisioning.fail.lock().expect("lock") = Some(ToolchainError::UnconfiguredRepositories);

        let err = service(Vec::new(), None, Arc::clone(&provisioning))
            .find_matching_toolchain(&spec(21))
            .expect_err("no match");
        assert!(matches!(
            &err,
            ToolchainError::NoMatchingToolchain { cause: Some(cause), .. }
                if matches!(**cause, ToolchainError::UnconfiguredRepositories)
        ));
        assert!(err.is_user_error());
        assert_eq!(provisioning.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unprobeable_provisioned_home_is_invalid() {
        struct EmptyHome(PathBuf);
        impl ToolchainProvisioningService for EmptyHome {
            fn try_install(&self, _spec: &ToolchainSpec) -> Result<PathBuf, ToolchainError> {
                std::fs::create_dir_all(&self.0).expect("dir");
                Ok(self.0.clone())
            }
        }
        let temp = tempdir().expect("tempdir");
        let detector: Arc<dyn JvmMetadataDetector> = Arc::new(ReleaseFileDetector);
        let query = ToolchainQueryService::new(
            Arc::new(JavaInstallationRegistry::new(Vec::new(), Arc::clone(&detector))),
            detector,
            Arc::new(EmptyHome(temp.path().join("empty"))),
            InstallationComparator::default(),
            Some(LINUX),
        );
        assert!(matches!(
            query.find_matching_toolchain(&spec(17)),
            Err(ToolchainError::InvalidInstallation { .. })
        ));
    }
}
