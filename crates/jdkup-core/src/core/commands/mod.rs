//! Command handlers behind the `jdkup` CLI.
//!
//! Each handler takes the shared [`CommandContext`] plus a request struct and
//! reports an [`ExecutionOutcome`]; only unexpected plumbing failures surface
//! as `Err`.

mod cache;
mod toolchain;

pub use cache::{cache_list, cache_prune, CacheListRequest, CachePruneRequest};
pub use toolchain::{
    toolchain_find, toolchain_install, toolchain_list, toolchain_update, ToolchainCriteria,
    ToolchainFindRequest, ToolchainInstallRequest, ToolchainListRequest, ToolchainUpdateRequest,
};
