use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Vendors jdkup can recognise from a JVM's reported vendor string.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum KnownJvmVendor {
    Adoptium,
    #[strum(serialize = "ADOPTOPENJDK")]
    #[serde(rename = "ADOPTOPENJDK")]
    AdoptOpenJdk,
    Amazon,
    Apple,
    Azul,
    #[strum(serialize = "BELLSOFT")]
    #[serde(rename = "BELLSOFT")]
    BellSoft,
    GraalVm,
    HewlettPackard,
    Ibm,
    #[strum(serialize = "JETBRAINS")]
    #[serde(rename = "JETBRAINS")]
    JetBrains,
    Microsoft,
    Oracle,
    Sap,
    Tencent,
    Unknown,
}

impl KnownJvmVendor {
    /// Name persisted in criteria files, e.g. `ADOPTIUM`.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.into()
    }

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Adoptium => "Eclipse Temurin",
            Self::AdoptOpenJdk => "AdoptOpenJDK",
            Self::Amazon => "Amazon Corretto",
            Self::Apple => "Apple",
            Self::Azul => "Azul Zulu",
            Self::BellSoft => "BellSoft Liberica",
            Self::GraalVm => "GraalVM Community",
            Self::HewlettPackard => "HP-UX",
            Self::Ibm => "IBM",
            Self::JetBrains => "JetBrains",
            Self::Microsoft => "Microsoft",
            Self::Oracle => "Oracle",
            Self::Sap => "SAP SapMachine",
            Self::Tencent => "Tencent",
            Self::Unknown => "Unknown Vendor",
        }
    }

    fn indicators(self) -> &'static [&'static str] {
        match self {
            Self::Adoptium => &["temurin", "adoptium", "eclipse foundation"],
            Self::AdoptOpenJdk => &["adoptopenjdk", "aoj"],
            Self::Amazon => &["amazon", "corretto"],
            Self::Apple => &["apple"],
            Self::Azul => &["azul", "zulu"],
            Self::BellSoft => &["bellsoft", "liberica"],
            Self::GraalVm => &["graalvm", "graal"],
            Self::HewlettPackard => &["hewlett", "hewlett-packard"],
            Self::Ibm => &["ibm", "semeru", "international business machines"],
            Self::JetBrains => &["jetbrains"],
            Self::Microsoft => &["microsoft"],
            Self::Oracle => &["oracle"],
            Self::Sap => &["sap se", "sapmachine"],
            Self::Tencent => &["tencent", "kona"],
            Self::Unknown => &[],
        }
    }

    /// Classifies a raw `java.vendor` string.
    #[must_use]
    pub fn from_raw_vendor(raw: &str) -> Self {
        let lowered = raw.trim().to_ascii_lowercase();
        if lowered.is_empty() {
            return Self::Unknown;
        }
        if lowered == "hp" {
            return Self::HewlettPackard;
        }
        if lowered == "sap" {
            return Self::Sap;
        }
        Self::iter()
            .find(|vendor| {
                vendor
                    .indicators()
                    .iter()
                    .any(|indicator| lowered.contains(indicator))
            })
            .unwrap_or(Self::Unknown)
    }
}

impl fmt::Display for KnownJvmVendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// The vendor reported by an installation: the raw string plus its classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JvmVendor {
    pub raw: String,
    pub known: KnownJvmVendor,
}

impl JvmVendor {
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let known = KnownJvmVendor::from_raw_vendor(&raw);
        Self { raw, known }
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.known == KnownJvmVendor::Unknown {
            &self.raw
        } else {
            self.known.display_name()
        }
    }
}

/// Vendor requirement of a toolchain specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum JvmVendorSpec {
    #[default]
    Any,
    Known(KnownJvmVendor),
}

impl JvmVendorSpec {
    #[must_use]
    pub fn is_any(self) -> bool {
        matches!(self, Self::Any)
    }

    #[must_use]
    pub fn matches(self, vendor: &JvmVendor) -> bool {
        match self {
            Self::Any => true,
            Self::Known(known) => vendor.known == known,
        }
    }

    #[must_use]
    pub fn known(self) -> Option<KnownJvmVendor> {
        match self {
            Self::Any => None,
            Self::Known(known) => Some(known),
        }
    }
}

impl fmt::Display for JvmVendorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::Known(known) => f.write_str(known.display_name()),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown JVM vendor `{0}`")]
pub struct UnknownVendorError(pub String);

impl FromStr for JvmVendorSpec {
    type Err = UnknownVendorError;

    /// Accepts `any`, a vendor name such as `ADOPTIUM`, or a raw vendor string
    /// such as `Eclipse Adoptium`.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if trimmed.eq_ignore_ascii_case("any") {
            return Ok(Self::Any);
        }
        if let Ok(known) = KnownJvmVendor::from_str(trimmed) {
            return Ok(Self::Known(known));
        }
        match KnownJvmVendor::from_raw_vendor(trimmed) {
            KnownJvmVendor::Unknown => Err(UnknownVendorError(trimmed.to_string())),
            known => Ok(Self::Known(known)),
        }
    }
}
