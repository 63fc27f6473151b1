#![deny(clippy::all)]

//! Value types shared by the jdkup engine and CLI: platforms, toolchain
//! specifications, probed installation metadata and the daemon JVM criteria file.

pub mod daemon_jvm;
pub mod metadata;
pub mod platform;
pub mod selection;
pub mod spec;
pub mod vendor;

pub use daemon_jvm::{
    properties_path, toolchain_url_property, DaemonJvmProperties, InvalidPropertyError,
    DAEMON_JVM_PROPERTIES_FILE,
};
pub use metadata::{InstallationLocation, JvmInstallationMetadata, JvmMetadata, JvmToolchain};
pub use platform::{toolchain_supported_platforms, Architecture, BuildPlatform, OperatingSystem};
pub use selection::{matches, InstallationComparator};
pub use spec::{
    JavaLanguageVersion, JvmImplementation, LanguageVersionError, ToolchainSpec,
    UnknownImplementationError,
};
pub use vendor::{JvmVendor, JvmVendorSpec, KnownJvmVendor, UnknownVendorError};
