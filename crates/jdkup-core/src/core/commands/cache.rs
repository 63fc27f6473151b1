use std::time::Duration;

use anyhow::Result;
use serde_json::{json, Value};

use crate::jdks::{InstallState, DEFAULT_PRUNE_AGE};
use crate::{CommandContext, ExecutionOutcome};

#[derive(Clone, Debug, Default)]
pub struct CacheListRequest;

#[derive(Clone, Debug, Default)]
pub struct CachePruneRequest {
    /// Minimum age of a leftover before it is removed; defaults to a day.
    pub max_age_hours: Option<u64>,
}

/// Lists the directories of the JDK cache and whether each finished installing.
///
/// # Errors
/// Returns an error if the cache directory cannot be opened.
pub fn cache_list(ctx: &CommandContext, _request: &CacheListRequest) -> Result<ExecutionOutcome> {
    let cache = ctx.services()?.cache();
    let root = cache.root().display().to_string();
    let states = cache.install_states();
    let entries: Vec<Value> = states
        .iter()
        .map(|(path, state)| {
            json!({
                "path": path.display().to_string(),
                "state": state.as_str(),
            })
        })
        .collect();
    if states.is_empty() {
        return Ok(ExecutionOutcome::success(
            format!("JDK cache at {root} is empty"),
            json!({ "root": root, "entries": entries }),
        ));
    }
    let ready = states
        .iter()
        .filter(|(_, state)| *state == InstallState::Ready)
        .count();
    let lines = states
        .iter()
        .map(|(path, state)| format!("{:<9} {}", state.as_str(), path.display()))
        .collect::<Vec<_>>()
        .join("\n");
    Ok(ExecutionOutcome::success(
        format!("{ready} ready in {root}:\n{lines}"),
        json!({ "root": root, "entries": entries }),
    ))
}

/// Removes abandoned downloads and half-unpacked installations.
///
/// # Errors
/// Returns an error if the cache directory cannot be opened.
pub fn cache_prune(ctx: &CommandContext, request: &CachePruneRequest) -> Result<ExecutionOutcome> {
    let max_age = request
        .max_age_hours
        .map_or(DEFAULT_PRUNE_AGE, |hours| {
            Duration::from_secs(hours.saturating_mul(60 * 60))
        });
    let cache = ctx.services()?.cache();
    let removed = cache.prune_stale_leftovers(max_age);
    let paths: Vec<String> = removed
        .iter()
        .map(|path| path.display().to_string())
        .collect();
    let message = if removed.is_empty() {
        "nothing to prune".to_string()
    } else {
        format!("removed {} stale entries", removed.len())
    };
    Ok(ExecutionOutcome::success(
        message,
        json!({
            "removed": paths,
            "max_age_hours": max_age.as_secs() / 3600,
        }),
    ))
}
