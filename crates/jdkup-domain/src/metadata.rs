use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::spec::{JavaLanguageVersion, JvmImplementation};
use crate::vendor::JvmVendor;

/// A candidate JVM home together with the discovery source that produced it.
///
/// Equality and hashing only consider the path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallationLocation {
    pub path: PathBuf,
    pub source: String,
    #[serde(default)]
    pub auto_provisioned: bool,
}

impl InstallationLocation {
    #[must_use]
    pub fn user_defined(path: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
            auto_provisioned: false,
        }
    }

    #[must_use]
    pub fn auto_provisioned(path: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
            auto_provisioned: true,
        }
    }

    #[must_use]
    pub fn display_name(&self) -> String {
        format!("'{}' ({})", self.path.display(), self.source)
    }
}

impl PartialEq for InstallationLocation {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for InstallationLocation {}

impl Hash for InstallationLocation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

/// Facts reported by a working JVM installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JvmMetadata {
    pub java_home: PathBuf,
    pub language_version: JavaLanguageVersion,
    /// Full `java.version`, e.g. `17.0.9`.
    pub runtime_version: String,
    pub vendor: JvmVendor,
    /// `java.vm.vendor`; may differ from the distribution vendor.
    pub jvm_vendor: String,
    pub jvm_name: String,
    pub implementation: JvmImplementation,
    /// `os.arch`, e.g. `amd64` or `aarch64`.
    pub architecture: String,
}

impl JvmMetadata {
    #[must_use]
    pub fn display_name(&self) -> String {
        format!(
            "{} JDK {} ({})",
            self.vendor.display_name(),
            self.language_version,
            self.runtime_version
        )
    }
}

/// Outcome of probing a location. Invalid installations carry the reason and
/// never reach matching, ordering or caching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum JvmInstallationMetadata {
    Valid(JvmMetadata),
    Invalid {
        java_home: PathBuf,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cause: Option<String>,
    },
}

impl JvmInstallationMetadata {
    #[must_use]
    pub fn failure(java_home: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Invalid {
            java_home: java_home.into(),
            message: message.into(),
            cause: None,
        }
    }

    #[must_use]
    pub fn failure_with_cause(
        java_home: impl Into<PathBuf>,
        message: impl Into<String>,
        cause: impl Into<String>,
    ) -> Self {
        Self::Invalid {
            java_home: java_home.into(),
            message: message.into(),
            cause: Some(cause.into()),
        }
    }

    #[must_use]
    pub fn is_valid_installation(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    #[must_use]
    pub fn java_home(&self) -> &Path {
        match self {
            Self::Valid(metadata) => &metadata.java_home,
            Self::Invalid { java_home, .. } => java_home,
        }
    }

    #[must_use]
    pub fn valid(&self) -> Option<&JvmMetadata> {
        match self {
            Self::Valid(metadata) => Some(metadata),
            Self::Invalid { .. } => None,
        }
    }

    #[must_use]
    pub fn into_valid(self) -> Option<JvmMetadata> {
        match self {
            Self::Valid(metadata) => Some(metadata),
            Self::Invalid { .. } => None,
        }
    }

    /// Reason the installation is unusable, with its cause when one was captured.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        match self {
            Self::Valid(_) => None,
            Self::Invalid {
                message,
                cause: Some(cause),
                ..
            } => Some(format!("{message}: {cause}")),
            Self::Invalid { message, .. } => Some(message.clone()),
        }
    }
}

/// A discovered location and what probing it revealed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JvmToolchain {
    pub location: InstallationLocation,
    pub metadata: JvmInstallationMetadata,
}

impl JvmToolchain {
    #[must_use]
    pub fn valid(&self) -> Option<&JvmMetadata> {
        self.metadata.valid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn locations_compare_by_path_only() {
        let first = InstallationLocation::user_defined("/opt/jdk-17", "env var 'JAVA_HOME'");
        let second = InstallationLocation::auto_provisioned("/opt/jdk-17", "provisioned toolchain");
        assert_eq!(first, second);
        let set: HashSet<_> = [first, second].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn invalid_metadata_reports_message_and_cause() {
        let metadata = JvmInstallationMetadata::failure_with_cause(
            "/opt/broken",
            "No java executable found",
            "bin/java is missing",
        );
        assert!(!metadata.is_valid_installation());
        assert!(metadata.valid().is_none());
        assert_eq!(metadata.java_home(), Path::new("/opt/broken"));
        assert_eq!(
            metadata.error_message().as_deref(),
            Some("No java executable found: bin/java is missing")
        );
    }
}
