//! Matching installations against a specification and ranking the matches.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use crate::metadata::JvmMetadata;
use crate::spec::{JvmImplementation, ToolchainSpec};

/// Returns true when `metadata` satisfies every criterion of `spec`.
#[must_use]
pub fn matches(metadata: &JvmMetadata, spec: &ToolchainSpec) -> bool {
    let version_matches = spec
        .language_version
        .map_or(true, |version| version == metadata.language_version);
    let implementation_matches = match spec.implementation {
        JvmImplementation::VendorSpecific => true,
        requested => requested == metadata.implementation,
    };
    version_matches && spec.vendor.matches(&metadata.vendor) && implementation_matches
}

/// Ranks installations: the running JVM first, then newer language versions,
/// then by path.
#[derive(Debug, Clone, Default)]
pub struct InstallationComparator {
    current_java_home: Option<PathBuf>,
}

impl InstallationComparator {
    #[must_use]
    pub fn new(current_java_home: Option<PathBuf>) -> Self {
        Self { current_java_home }
    }

    fn is_current(&self, home: &Path) -> bool {
        self.current_java_home
            .as_deref()
            .is_some_and(|current| current == home)
    }

    #[must_use]
    pub fn compare(&self, left: &JvmMetadata, right: &JvmMetadata) -> Ordering {
        let left_current = self.is_current(&left.java_home);
        let right_current = self.is_current(&right.java_home);
        right_current
            .cmp(&left_current)
            .then_with(|| right.language_version.cmp(&left.language_version))
            .then_with(|| left.java_home.cmp(&right.java_home))
    }

    /// Picks the best installation satisfying `spec`.
    pub fn select_best<'a, I>(&self, candidates: I, spec: &ToolchainSpec) -> Option<&'a JvmMetadata>
    where
        I: IntoIterator<Item = &'a JvmMetadata>,
    {
        candidates
            .into_iter()
            .filter(|metadata| matches(metadata, spec))
            .min_by(|left, right| self.compare(left, right))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::JavaLanguageVersion;
    use crate::vendor::{JvmVendor, JvmVendorSpec, KnownJvmVendor};

    fn metadata(home: &str, version: u32, vendor: &str) -> JvmMetadata {
        JvmMetadata {
            java_home: PathBuf::from(home),
            language_version: JavaLanguageVersion::of(version).expect("version"),
            runtime_version: format!("{version}.0.1"),
            vendor: JvmVendor::from_raw(vendor),
            jvm_vendor: vendor.to_string(),
            jvm_name: "OpenJDK 64-Bit Server VM".to_string(),
            implementation: JvmImplementation::VendorSpecific,
            architecture: "amd64".to_string(),
        }
    }

    fn spec(version: u32) -> ToolchainSpec {
        ToolchainSpec::new(JavaLanguageVersion::of(version).expect("version"))
    }

    #[test]
    fn any_vendor_matches_every_vendor_of_the_version() {
        let requested = spec(17);
        assert!(matches(&metadata("/a", 17, "Eclipse Adoptium"), &requested));
        assert!(matches(&metadata("/b", 17, "Azul Systems, Inc."), &requested));
        assert!(matches(&metadata("/c", 17, "Someone Else"), &requested));
        assert!(!matches(&metadata("/d", 21, "Eclipse Adoptium"), &requested));
    }

    #[test]
    fn known_vendor_and_implementation_must_agree() {
        let azul = spec(17).with_vendor(JvmVendorSpec::Known(KnownJvmVendor::Azul));
        assert!(matches(&metadata("/a", 17, "Azul Systems, Inc."), &azul));
        assert!(!matches(&metadata("/b", 17, "Eclipse Adoptium"), &azul));

        let j9 = spec(17).with_implementation(JvmImplementation::J9);
        let mut openj9 = metadata("/c", 17, "IBM Corporation");
        assert!(!matches(&openj9, &j9));
        openj9.implementation = JvmImplementation::J9;
        assert!(matches(&openj9, &j9));
    }

    #[test]
    fn unconfigured_spec_matches_any_version() {
        let requested = ToolchainSpec::default();
        assert!(matches(&metadata("/a", 8, "Oracle Corporation"), &requested));
        assert!(matches(&metadata("/b", 21, "Oracle Corporation"), &requested));
    }

    #[test]
    fn current_home_wins_over_newer_versions() {
        let comparator = InstallationComparator::new(Some(PathBuf::from("/jdks/11")));
        let candidates = [
            metadata("/jdks/21", 21, "Eclipse Adoptium"),
            metadata("/jdks/11", 11, "Eclipse Adoptium"),
            metadata("/jdks/17", 17, "Eclipse Adoptium"),
        ];
        let best = comparator.select_best(candidates.iter(), &ToolchainSpec::default());
        assert_eq!(best.map(|m| m.java_home.as_path()), Some(Path::new("/jdks/11")));
    }

    #[test]
    fn ties_break_on_version_then_path() {
        let comparator = InstallationComparator::default();
        let mut candidates = vec![
            metadata("/z/17", 17, "Eclipse Adoptium"),
            metadata("/a/17", 17, "Eclipse Adoptium"),
            metadata("/m/21", 21, "Eclipse Adoptium"),
        ];
        candidates.sort_by(|left, right| comparator.compare(left, right));
        let homes: Vec<_> = candidates
            .iter()
            .map(|m| m.java_home.to_string_lossy().into_owned())
            .collect();
        assert_eq!(homes, vec!["/m/21", "/a/17", "/z/17"]);
    }
}
