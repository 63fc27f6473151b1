use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::vendor::JvmVendorSpec;

/// A Java feature release such as 8, 17 or 21.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct JavaLanguageVersion(NonZeroU32);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LanguageVersionError {
    #[error("Java language version must be a positive integer, got `{0}`")]
    Invalid(String),
}

impl JavaLanguageVersion {
    /// # Errors
    /// Returns an error when `version` is zero.
    pub fn of(version: u32) -> Result<Self, LanguageVersionError> {
        NonZeroU32::new(version)
            .map(Self)
            .ok_or_else(|| LanguageVersionError::Invalid(version.to_string()))
    }

    #[must_use]
    pub fn as_u32(self) -> u32 {
        self.0.get()
    }

    /// Derives the feature release from a full runtime version: `1.8.0_392` is 8,
    /// `17.0.9+9` is 17 and `21-ea` is 21.
    #[must_use]
    pub fn from_runtime_version(version: &str) -> Option<Self> {
        let mut parts = version
            .trim()
            .split(|c: char| !c.is_ascii_digit())
            .filter(|part| !part.is_empty());
        let first: u32 = parts.next()?.parse().ok()?;
        let major = if first == 1 {
            parts.next()?.parse().ok()?
        } else {
            first
        };
        Self::of(major).ok()
    }
}

impl TryFrom<u32> for JavaLanguageVersion {
    type Error = LanguageVersionError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::of(value)
    }
}

impl From<JavaLanguageVersion> for u32 {
    fn from(value: JavaLanguageVersion) -> Self {
        value.as_u32()
    }
}

impl FromStr for JavaLanguageVersion {
    type Err = LanguageVersionError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if trimmed.is_empty() || !trimmed.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(LanguageVersionError::Invalid(trimmed.to_string()));
        }
        Self::from_runtime_version(trimmed)
            .ok_or_else(|| LanguageVersionError::Invalid(trimmed.to_string()))
    }
}

impl fmt::Display for JavaLanguageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JvmImplementation {
    #[default]
    VendorSpecific,
    J9,
}

impl JvmImplementation {
    /// Name persisted in criteria files.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::VendorSpecific => "VENDOR_SPECIFIC",
            Self::J9 => "J9",
        }
    }

    /// Classifies an installation from its `java.vm.name`.
    #[must_use]
    pub fn from_vm_name(vm_name: &str) -> Self {
        if vm_name.to_ascii_lowercase().contains("j9") {
            Self::J9
        } else {
            Self::VendorSpecific
        }
    }
}

impl fmt::Display for JvmImplementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VendorSpecific => f.write_str("vendor-specific"),
            Self::J9 => f.write_str("J9"),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown JVM implementation `{0}`")]
pub struct UnknownImplementationError(pub String);

impl FromStr for JvmImplementation {
    type Err = UnknownImplementationError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let normalized = input.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "vendor_specific" => Ok(Self::VendorSpecific),
            "j9" => Ok(Self::J9),
            _ => Err(UnknownImplementationError(input.trim().to_string())),
        }
    }
}

/// Requested JVM: language version, vendor and implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ToolchainSpec {
    pub language_version: Option<JavaLanguageVersion>,
    pub vendor: JvmVendorSpec,
    pub implementation: JvmImplementation,
}

impl ToolchainSpec {
    #[must_use]
    pub fn new(language_version: JavaLanguageVersion) -> Self {
        Self {
            language_version: Some(language_version),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_vendor(mut self, vendor: JvmVendorSpec) -> Self {
        self.vendor = vendor;
        self
    }

    #[must_use]
    pub fn with_implementation(mut self, implementation: JvmImplementation) -> Self {
        self.implementation = implementation;
        self
    }

    /// A specification without a language version cannot drive provisioning.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.language_version.is_some()
    }

    /// Unconfigured specifications are only valid when they carry the defaults.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_configured()
            || (self.vendor.is_any() && self.implementation == JvmImplementation::VendorSpecific)
    }
}

impl fmt::Display for ToolchainSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{languageVersion=")?;
        match self.language_version {
            Some(version) => write!(f, "{version}")?,
            None => f.write_str("unspecified")?,
        }
        write!(
            f,
            ", vendor={}, implementation={}}}",
            self.vendor, self.implementation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vendor::KnownJvmVendor;

    #[test]
    fn language_version_rejects_zero() {
        assert!(JavaLanguageVersion::of(0).is_err());
        assert_eq!(JavaLanguageVersion::of(17).map(JavaLanguageVersion::as_u32), Ok(17));
    }

    #[test]
    fn language_version_parses_legacy_and_modern_forms() {
        let parse = |raw: &str| raw.parse::<JavaLanguageVersion>().map(JavaLanguageVersion::as_u32);
        assert_eq!(parse("17"), Ok(17));
        assert_eq!(parse("1.8"), Ok(8));
        assert_eq!(parse("1.8.0_392"), Ok(8));
        assert_eq!(parse("21.0.1+12"), Ok(21));
        assert_eq!(parse("22-ea"), Ok(22));
        assert!(parse("latest").is_err());
        assert!(parse("").is_err());
    }

    #[test]
    fn spec_without_version_is_valid_only_with_defaults() {
        let bare = ToolchainSpec::default();
        assert!(!bare.is_configured());
        assert!(bare.is_valid());

        let vendor_only =
            ToolchainSpec::default().with_vendor(JvmVendorSpec::Known(KnownJvmVendor::Azul));
        assert!(!vendor_only.is_valid());

        let j9_only = ToolchainSpec::default().with_implementation(JvmImplementation::J9);
        assert!(!j9_only.is_valid());
    }

    #[test]
    fn display_names_every_criterion() {
        let version = JavaLanguageVersion::of(17).expect("version");
        let spec = ToolchainSpec::new(version);
        assert_eq!(
            spec.to_string(),
            "{languageVersion=17, vendor=any, implementation=vendor-specific}"
        );
        let ibm = spec
            .with_vendor(JvmVendorSpec::Known(KnownJvmVendor::Ibm))
            .with_implementation(JvmImplementation::J9);
        assert_eq!(
            ibm.to_string(),
            "{languageVersion=17, vendor=IBM, implementation=J9}"
        );
    }

    #[test]
    fn implementation_parses_persisted_names() {
        assert_eq!("VENDOR_SPECIFIC".parse::<JvmImplementation>(), Ok(JvmImplementation::VendorSpecific));
        assert_eq!("vendor-specific".parse::<JvmImplementation>(), Ok(JvmImplementation::VendorSpecific));
        assert_eq!("j9".parse::<JvmImplementation>(), Ok(JvmImplementation::J9));
        assert!("hotspot".parse::<JvmImplementation>().is_err());
        assert_eq!(
            JvmImplementation::from_vm_name("Eclipse OpenJ9 VM"),
            JvmImplementation::J9
        );
    }
}
