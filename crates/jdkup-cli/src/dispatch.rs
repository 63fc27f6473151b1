use color_eyre::Result;
use jdkup_core::{
    CachePruneRequest, CommandContext, CommandGroup, CommandInfo, ExecutionOutcome,
    ToolchainCriteria, ToolchainFindRequest, ToolchainInstallRequest, ToolchainUpdateRequest,
};

use crate::cli::{CacheCommand, CommandGroupCli, CriteriaArgs};

pub fn dispatch_command(
    ctx: &CommandContext,
    group: &CommandGroupCli,
) -> Result<(CommandInfo, ExecutionOutcome)> {
    match group {
        CommandGroupCli::Find(args) => {
            let info = CommandInfo::new(CommandGroup::Find, "find");
            let request = ToolchainFindRequest {
                criteria: criteria_from_args(args),
            };
            core_call(info, || jdkup_core::toolchain_find(ctx, &request))
        }
        CommandGroupCli::List => {
            let info = CommandInfo::new(CommandGroup::List, "list");
            core_call(info, || {
                jdkup_core::toolchain_list(ctx, &jdkup_core::ToolchainListRequest)
            })
        }
        CommandGroupCli::Install(args) => {
            let info = CommandInfo::new(CommandGroup::Install, "install");
            let request = ToolchainInstallRequest {
                criteria: criteria_from_args(args),
            };
            core_call(info, || jdkup_core::toolchain_install(ctx, &request))
        }
        CommandGroupCli::Update(args) => {
            let info = CommandInfo::new(CommandGroup::Update, "update");
            let request = ToolchainUpdateRequest {
                criteria: criteria_from_args(args),
            };
            core_call(info, || jdkup_core::toolchain_update(ctx, &request))
        }
        CommandGroupCli::Cache(CacheCommand::List) => {
            let info = CommandInfo::new(CommandGroup::Cache, "list");
            core_call(info, || {
                jdkup_core::cache_list(ctx, &jdkup_core::CacheListRequest)
            })
        }
        CommandGroupCli::Cache(CacheCommand::Prune(args)) => {
            let info = CommandInfo::new(CommandGroup::Cache, "prune");
            let request = CachePruneRequest {
                max_age_hours: args.max_age_hours,
            };
            core_call(info, || jdkup_core::cache_prune(ctx, &request))
        }
    }
}

fn criteria_from_args(args: &CriteriaArgs) -> ToolchainCriteria {
    ToolchainCriteria {
        version: args.version,
        vendor: args.vendor.clone(),
        implementation: args.implementation.clone(),
    }
}

/// Turns unexpected handler errors into a failure outcome so they still
/// render through the normal output path.
fn core_call<F>(info: CommandInfo, action: F) -> Result<(CommandInfo, ExecutionOutcome)>
where
    F: FnOnce() -> anyhow::Result<ExecutionOutcome>,
{
    match action() {
        Ok(outcome) => Ok((info, outcome)),
        Err(err) => {
            if let Some(toolchain) = err.downcast_ref::<jdkup_core::ToolchainError>() {
                return Ok((info, ExecutionOutcome::from_toolchain_error(toolchain)));
            }
            let issues: Vec<String> = err.chain().map(std::string::ToString::to_string).collect();
            Ok((
                info,
                ExecutionOutcome::failure(
                    err.to_string(),
                    serde_json::json!({
                        "reason": "internal_error",
                        "error": format!("{err:#}"),
                        "issues": issues,
                        "hint": "Re-run with `-vv` for more detail.",
                    }),
                ),
            ))
        }
    }
}
