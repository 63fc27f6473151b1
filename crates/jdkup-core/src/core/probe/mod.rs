//! Probing JVM installations for version, vendor and architecture.

mod cache;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use jdkup_domain::{
    InstallationLocation, JavaLanguageVersion, JvmImplementation, JvmInstallationMetadata,
    JvmMetadata, JvmVendor, OperatingSystem,
};

pub use cache::{CachingMetadataDetector, DaemonJvmMetadataCache};

/// Produces metadata for an installation. Never fails: unusable installations
/// are reported as [`JvmInstallationMetadata::Invalid`].
pub trait JvmMetadataDetector: Send + Sync {
    fn metadata(&self, location: &InstallationLocation) -> JvmInstallationMetadata;
}

/// Path of the `java` launcher inside `java_home`.
#[must_use]
pub fn java_executable(java_home: &Path, os: OperatingSystem) -> PathBuf {
    java_home.join("bin").join(os.executable_name("java"))
}

/// Runs `<home>/bin/java -XshowSettings:properties -version` and reads the
/// reported system properties.
#[derive(Debug, Clone)]
pub struct ProcessMetadataDetector {
    os: OperatingSystem,
}

impl ProcessMetadataDetector {
    #[must_use]
    pub fn new(os: OperatingSystem) -> Self {
        Self { os }
    }
}

impl JvmMetadataDetector for ProcessMetadataDetector {
    fn metadata(&self, location: &InstallationLocation) -> JvmInstallationMetadata {
        let java_home = location.path.as_path();
        if !java_home.is_dir() {
            return JvmInstallationMetadata::failure(java_home, "No such directory");
        }
        let java = java_executable(java_home, self.os);
        if !java.is_file() {
            return JvmInstallationMetadata::failure(
                java_home,
                format!("No java executable found at {}", java.display()),
            );
        }
        tracing::debug!(java = %java.display(), source = %location.source, "probing installation");
        let output = Command::new(&java)
            .args(["-XshowSettings:properties", "-version"])
            .env_remove("JAVA_TOOL_OPTIONS")
            .env_remove("_JAVA_OPTIONS")
            .env_remove("JDK_JAVA_OPTIONS")
            .stdin(Stdio::null())
            .output();
        let output = match output {
            Ok(output) => output,
            Err(err) => {
                return JvmInstallationMetadata::failure_with_cause(
                    java_home,
                    "Could not run the java executable",
                    err.to_string(),
                )
            }
        };
        let mut text = String::from_utf8_lossy(&output.stderr).into_owned();
        text.push('\n');
        text.push_str(&String::from_utf8_lossy(&output.stdout));
        if !output.status.success() {
            return JvmInstallationMetadata::failure_with_cause(
                java_home,
                format!("java exited with {}", output.status),
                first_lines(&text, 3),
            );
        }
        metadata_from_properties(java_home, &parse_settings_output(&text))
    }
}

/// Extracts `key = value` lines from `-XshowSettings:properties` output.
pub(crate) fn parse_settings_output(output: &str) -> HashMap<String, String> {
    output
        .lines()
        .filter_map(|line| {
            let (key, value) = line.split_once(" = ")?;
            let key = key.trim();
            if key.is_empty() || key.contains(char::is_whitespace) {
                return None;
            }
            Some((key.to_string(), value.trim().to_string()))
        })
        .collect()
}

pub(crate) fn metadata_from_properties(
    java_home: &Path,
    properties: &HashMap<String, String>,
) -> JvmInstallationMetadata {
    let Some(runtime_version) = properties.get("java.version") else {
        return JvmInstallationMetadata::failure(
            java_home,
            "java did not report the java.version property",
        );
    };
    let language_version = JavaLanguageVersion::from_runtime_version(runtime_version).or_else(|| {
        properties
            .get("java.specification.version")
            .and_then(|raw| JavaLanguageVersion::from_runtime_version(raw))
    });
    let Some(language_version) = language_version else {
        return JvmInstallationMetadata::failure(
            java_home,
            format!("Cannot determine the language version from '{runtime_version}'"),
        );
    };
    let property = |key: &str| properties.get(key).cloned().unwrap_or_default();
    let jvm_name = property("java.vm.name");
    JvmInstallationMetadata::Valid(JvmMetadata {
        java_home: java_home.to_path_buf(),
        language_version,
        runtime_version: runtime_version.clone(),
        vendor: JvmVendor::from_raw(property("java.vendor")),
        jvm_vendor: property("java.vm.vendor"),
        implementation: JvmImplementation::from_vm_name(&jvm_name),
        jvm_name,
        architecture: property("os.arch"),
    })
}

fn first_lines(text: &str, count: usize) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(count)
        .collect::<Vec<_>>()
        .join(" | ")
}
