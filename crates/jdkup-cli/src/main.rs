use atty::Stream;
use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use jdkup_core::{CommandContext, CommandInfo, CommandStatus, ExecutionOutcome, GlobalOptions};
use serde_json::Value;

mod cli;
mod dispatch;
mod style;

use cli::JdkupCli;
use style::Style;

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = JdkupCli::parse();
    init_tracing(cli.trace, cli.verbose);

    let global = GlobalOptions {
        quiet: cli.quiet,
        verbose: cli.verbose,
        trace: cli.trace,
        json: cli.json,
    };

    let ctx = CommandContext::new(&global, cli.online_override())
        .map_err(|err| eyre!("{err:#}"))?;
    let (info, outcome) = dispatch::dispatch_command(&ctx, &cli.command)?;
    let code = emit_output(&cli, info, &outcome)?;

    if code == 0 {
        Ok(())
    } else {
        std::process::exit(code);
    }
}

fn init_tracing(trace: bool, verbose: u8) {
    let level = if trace {
        "trace"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = format!("jdkup={level},jdkup_core={level},jdkup_domain={level},jdkup_cli={level}");
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn emit_output(cli: &JdkupCli, info: CommandInfo, outcome: &ExecutionOutcome) -> Result<i32> {
    let code = match outcome.status {
        CommandStatus::Ok => 0,
        CommandStatus::UserError => 1,
        CommandStatus::Failure => 2,
    };

    if cli.json {
        let payload = jdkup_core::to_json_response(info, outcome, code);
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else if !cli.quiet || code != 0 {
        let message = jdkup_core::format_status_message(info, &outcome.message);
        let hint = hint_from_details(&outcome.details);
        if code == 0 {
            let style = Style::new(cli.no_color, atty::is(Stream::Stdout));
            println!("{}", style.outcome(&outcome.status, &message));
            if let Some(hint) = hint {
                println!("{}", style.hint(hint));
            }
        } else {
            let style = Style::new(cli.no_color, atty::is(Stream::Stderr));
            eprintln!("{}", style.outcome(&outcome.status, &message));
            if let Some(hint) = hint {
                eprintln!("{}", style.hint(hint));
            }
        }
    }

    Ok(code)
}

fn hint_from_details(details: &Value) -> Option<&str> {
    details
        .as_object()
        .and_then(|map| map.get("hint"))
        .and_then(Value::as_str)
}
