use std::env;
use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "snake_case")]
pub enum Architecture {
    X86,
    X86_64,
    Aarch64,
}

impl Architecture {
    #[must_use]
    pub fn current() -> Option<Self> {
        Self::from_name(env::consts::ARCH)
    }

    /// Maps the names reported by `std::env::consts::ARCH` and the JVM's `os.arch`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "x86" | "i386" | "i486" | "i586" | "i686" => Some(Self::X86),
            "x86_64" | "amd64" | "x64" => Some(Self::X86_64),
            "aarch64" | "arm64" => Some(Self::Aarch64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::X86 => "x86",
            Self::X86_64 => "x86_64",
            Self::Aarch64 => "aarch64",
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "snake_case")]
pub enum OperatingSystem {
    Linux,
    Unix,
    Windows,
    MacOs,
    Solaris,
    FreeBsd,
}

impl OperatingSystem {
    #[must_use]
    pub fn current() -> Option<Self> {
        match env::consts::OS {
            "linux" => Some(Self::Linux),
            "windows" => Some(Self::Windows),
            "macos" => Some(Self::MacOs),
            "solaris" | "illumos" => Some(Self::Solaris),
            "freebsd" => Some(Self::FreeBsd),
            "netbsd" | "openbsd" | "dragonfly" | "aix" => Some(Self::Unix),
            _ => None,
        }
    }

    /// Family name used in install folder names, e.g. `mac_os` or `free_bsd`.
    #[must_use]
    pub fn family_name(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Unix => "unix",
            Self::Windows => "windows",
            Self::MacOs => "mac_os",
            Self::Solaris => "solaris",
            Self::FreeBsd => "free_bsd",
        }
    }

    /// Name used inside criteria-file keys: the family name without underscores.
    #[must_use]
    pub fn property_name(self) -> String {
        self.family_name().replace('_', "")
    }

    #[must_use]
    pub fn is_macos(self) -> bool {
        matches!(self, Self::MacOs)
    }

    #[must_use]
    pub fn is_windows(self) -> bool {
        matches!(self, Self::Windows)
    }

    #[must_use]
    pub fn executable_name(self, name: &str) -> String {
        if self.is_windows() {
            format!("{name}.exe")
        } else {
            name.to_string()
        }
    }

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Linux => "Linux",
            Self::Unix => "Unix",
            Self::Windows => "Windows",
            Self::MacOs => "Mac OS X",
            Self::Solaris => "Solaris",
            Self::FreeBsd => "FreeBSD",
        }
    }
}

impl fmt::Display for OperatingSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// An (architecture, operating system) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BuildPlatform {
    pub architecture: Architecture,
    pub operating_system: OperatingSystem,
}

impl BuildPlatform {
    #[must_use]
    pub const fn new(architecture: Architecture, operating_system: OperatingSystem) -> Self {
        Self {
            architecture,
            operating_system,
        }
    }

    /// The platform of the running process, when it is one jdkup knows about.
    #[must_use]
    pub fn current() -> Option<Self> {
        Some(Self::new(Architecture::current()?, OperatingSystem::current()?))
    }
}

impl fmt::Display for BuildPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {}", self.operating_system, self.architecture)
    }
}

/// Every platform a toolchain download URL can be recorded for.
#[must_use]
pub fn toolchain_supported_platforms() -> Vec<BuildPlatform> {
    [Architecture::Aarch64, Architecture::X86_64]
        .into_iter()
        .flat_map(|architecture| {
            OperatingSystem::iter().map(move |os| BuildPlatform::new(architecture, os))
        })
        .collect()
}
