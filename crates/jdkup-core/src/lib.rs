#![deny(clippy::all)]

mod core;

pub(crate) use crate::core::{
    config, discovery, fs, jdks, net, probe, provision, query, repository, services, tooling,
    transfer,
};
#[cfg(test)]
pub(crate) use crate::core::test_support;

pub use crate::core::config::context::{CommandContext, CommandGroup, CommandInfo};
pub use crate::core::config::{Config, GlobalOptions, HomeLocation, NetworkConfig};
pub use crate::core::errors::ToolchainError;
pub use crate::core::tooling::outcome::{CommandStatus, ExecutionOutcome};
pub use crate::core::tooling::{format_status_message, to_json_response};

pub use crate::core::commands::{
    cache_list, cache_prune, toolchain_find, toolchain_install, toolchain_list, toolchain_update,
    CacheListRequest, CachePruneRequest, ToolchainCriteria, ToolchainFindRequest,
    ToolchainInstallRequest, ToolchainListRequest, ToolchainUpdateRequest,
};
pub use crate::core::jdks::{InstallState, JdkCacheDirectory, MARKER_FILE};
pub use crate::core::query::ToolchainMatch;
pub use crate::core::services::ToolchainServices;
