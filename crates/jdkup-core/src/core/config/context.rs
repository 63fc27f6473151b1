use std::fmt;
use std::sync::OnceLock;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::config::{Config, GlobalOptions};
use crate::services::ToolchainServices;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommandGroup {
    Find,
    List,
    Install,
    Update,
    Cache,
}

impl fmt::Display for CommandGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommandGroup::Find => "find",
            CommandGroup::List => "list",
            CommandGroup::Install => "install",
            CommandGroup::Update => "update",
            CommandGroup::Cache => "cache",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct CommandInfo {
    pub group: CommandGroup,
    pub name: &'static str,
}

impl CommandInfo {
    #[must_use]
    pub const fn new(group: CommandGroup, name: &'static str) -> Self {
        Self { group, name }
    }
}

pub struct CommandContext<'a> {
    pub global: &'a GlobalOptions,
    config: Config,
    services: OnceLock<ToolchainServices>,
}

impl<'a> CommandContext<'a> {
    /// Creates a new command context with the provided global options.
    ///
    /// `online` overrides `JDKUP_ONLINE` for this invocation.
    ///
    /// # Errors
    /// Returns an error if the configuration cannot be prepared.
    pub fn new(global: &'a GlobalOptions, online: Option<bool>) -> Result<Self> {
        let mut config = Config::from_env()?;
        if let Some(online) = online {
            config.force_online(online);
        }
        Ok(Self::with_config(global, config))
    }

    #[must_use]
    pub fn with_config(global: &'a GlobalOptions, config: Config) -> Self {
        Self {
            global,
            config,
            services: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Engine services, wired on first use.
    ///
    /// # Errors
    /// Returns an error if the HTTP client or cache directory cannot be prepared.
    pub fn services(&self) -> Result<&ToolchainServices> {
        if let Some(services) = self.services.get() {
            return Ok(services);
        }
        let services = ToolchainServices::from_config(&self.config)?;
        Ok(self.services.get_or_init(|| services))
    }
}
