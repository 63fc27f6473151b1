use clap::{ArgAction, Args, Parser, Subcommand};

pub const JDKUP_HELP_TEMPLATE: &str =
    "{before-help}\nUsage:\n    {usage}\n\nGlobal options:\n{options}\n";

pub const JDKUP_BEFORE_HELP: &str = concat!(
    "jdkup ",
    env!("CARGO_PKG_VERSION"),
    " – JVM toolchains for build daemons\n\n",
    "\x1b[1;36mToolchains\x1b[0m\n",
    "  find             Select the installed JVM matching the criteria, provisioning one if needed.\n",
    "  list             Show every detected Java installation, usable or not.\n",
    "  install          Download a toolchain into the JDK cache.\n",
    "  update           Record download URLs for every platform in the criteria file.\n\n",
    "\x1b[1;36mMaintenance\x1b[0m\n",
    "  cache            Inspect or prune the JDK cache (list/prune).\n",
);

#[derive(Parser, Debug)]
#[command(
    name = "jdkup",
    author,
    version,
    propagate_version = false,
    disable_help_subcommand = true,
    before_help = JDKUP_BEFORE_HELP,
    help_template = JDKUP_HELP_TEMPLATE
)]
#[allow(clippy::struct_excessive_bools)]
pub struct JdkupCli {
    #[arg(
        short,
        long,
        help = "Suppress human output (errors still print to stderr)",
        global = true
    )]
    pub quiet: bool,
    #[arg(
        short,
        long,
        action = ArgAction::Count,
        help = "Increase logging (-vv reaches trace)",
        global = true
    )]
    pub verbose: u8,
    #[arg(long, help = "Force trace logging regardless of -v/-q", global = true)]
    pub trace: bool,
    #[arg(
        long,
        help = "Emit {status,message,details} JSON envelopes",
        global = true
    )]
    pub json: bool,
    #[arg(long, help = "Disable colored human output", global = true)]
    pub no_color: bool,
    #[arg(
        long,
        help = "Never download toolchains in this invocation (sets JDKUP_ONLINE=0)",
        conflicts_with = "online",
        global = true
    )]
    pub offline: bool,
    #[arg(
        long,
        help = "Allow downloads even if JDKUP_ONLINE=0",
        conflicts_with = "offline",
        global = true
    )]
    pub online: bool,
    #[command(subcommand)]
    pub command: CommandGroupCli,
}

impl JdkupCli {
    /// `--online`/`--offline` override for `JDKUP_ONLINE`.
    pub fn online_override(&self) -> Option<bool> {
        if self.offline {
            Some(false)
        } else if self.online {
            Some(true)
        } else {
            None
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum CommandGroupCli {
    #[command(
        about = "Select the JVM matching the criteria, provisioning one when none is installed.",
        override_usage = "jdkup find [--version N] [--vendor V] [--implementation I]"
    )]
    Find(CriteriaArgs),
    #[command(about = "List every detected Java installation, including unusable ones.")]
    List,
    #[command(
        about = "Download and install a toolchain into the JDK cache.",
        override_usage = "jdkup install [--version N] [--vendor V] [--implementation I]"
    )]
    Install(CriteriaArgs),
    #[command(
        about = "Resolve download URLs for every platform and rewrite the criteria file.",
        override_usage = "jdkup update [--version N] [--vendor V] [--implementation I]"
    )]
    Update(CriteriaArgs),
    #[command(subcommand, about = "Inspect or prune the JDK cache.")]
    Cache(CacheCommand),
}

#[derive(Args, Debug, Clone, Default)]
pub struct CriteriaArgs {
    #[arg(
        long,
        value_name = "N",
        help = "Java language version, e.g. 17 (defaults to the criteria file)"
    )]
    pub version: Option<u32>,
    #[arg(
        long,
        value_name = "VENDOR",
        help = "Vendor such as ADOPTIUM, azul or `any`"
    )]
    pub vendor: Option<String>,
    #[arg(
        long,
        value_name = "IMPL",
        help = "JVM implementation: vendor-specific or j9"
    )]
    pub implementation: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    #[command(about = "Show installations in the JDK cache and whether they finished.")]
    List,
    #[command(about = "Remove abandoned downloads and half-unpacked installations.")]
    Prune(CachePruneArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CachePruneArgs {
    #[arg(
        long,
        value_name = "HOURS",
        help = "Only remove leftovers at least this old (default: 24)"
    )]
    pub max_age_hours: Option<u64>,
}
