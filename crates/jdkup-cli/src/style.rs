use std::env;

use color_eyre::owo_colors::OwoColorize;
use jdkup_core::CommandStatus;

/// Terminal colouring for human-readable outcomes; a no-op when piped or
/// when `NO_COLOR` / `--no-color` is in effect.
pub struct Style {
    colored: bool,
}

impl Style {
    pub fn new(no_color: bool, is_tty: bool) -> Self {
        Self {
            colored: is_tty && !no_color && env::var_os("NO_COLOR").is_none(),
        }
    }

    /// Marks the headline with the status symbol; continuation lines such as
    /// cache entries are dimmed.
    pub fn outcome(&self, status: &CommandStatus, message: &str) -> String {
        let symbol = match status {
            CommandStatus::Ok => "✔",
            CommandStatus::UserError => "✗",
            CommandStatus::Failure => "✖",
        };
        let mut lines = message.lines();
        let headline = format!("{symbol} {}", lines.next().unwrap_or_default());
        let mut rendered = if self.colored {
            match status {
                CommandStatus::Ok => headline.green().bold().to_string(),
                CommandStatus::UserError => headline.yellow().bold().to_string(),
                CommandStatus::Failure => headline.red().bold().to_string(),
            }
        } else {
            headline
        };
        for line in lines {
            rendered.push_str("\n  ");
            if self.colored {
                rendered.push_str(&line.dimmed().to_string());
            } else {
                rendered.push_str(line);
            }
        }
        rendered
    }

    pub fn hint(&self, hint: &str) -> String {
        let line = format!("Hint: {hint}");
        if self.colored {
            line.cyan().to_string()
        } else {
            line
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_output_indents_continuation_lines() {
        let style = Style::new(true, true);
        assert_eq!(
            style.outcome(
                &CommandStatus::Ok,
                "jdkup cache list: 1 ready in /jdks:\nready     /jdks/a"
            ),
            "✔ jdkup cache list: 1 ready in /jdks:\n  ready     /jdks/a"
        );
        assert_eq!(style.hint("set toolchainVersion"), "Hint: set toolchainVersion");
    }
}
