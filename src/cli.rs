//! Command line interface: run the bot or manage the database schema.

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "shoplist-bot")]
#[command(author, version, about = "Telegram bot that keeps a shopping list per chat", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Run the bot (the default when no command is given)
    Run,

    /// Manage schema migrations
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
pub enum MigrateAction {
    /// Apply all pending migrations
    Up,

    /// Revert migrations newer than a version
    Down {
        /// Version to go back to, or "zero" to revert everything
        #[arg(value_parser = parse_down_target)]
        target: i64,
    },

    /// Show the current migration version
    Version,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The command to execute, `run` when none was given
    pub fn into_command(self) -> Commands {
        self.command.unwrap_or(Commands::Run)
    }
}

fn parse_down_target(value: &str) -> Result<i64, String> {
    if value == "zero" {
        return Ok(0);
    }
    match value.parse::<i64>() {
        Ok(version) if version >= 1 => Ok(version),
        _ => Err(format!(
            "expected a positive version or \"zero\" to revert all migrations, got {value:?}"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Commands, clap::Error> {
        Cli::try_parse_from(std::iter::once("shoplist-bot").chain(args.iter().copied()))
            .map(Cli::into_command)
    }

    #[test]
    fn test_run_is_the_default() {
        assert_eq!(parse(&[]).unwrap(), Commands::Run);
        assert_eq!(parse(&["run"]).unwrap(), Commands::Run);
    }

    #[test]
    fn test_migrate_commands() {
        assert_eq!(
            parse(&["migrate", "up"]).unwrap(),
            Commands::Migrate { action: MigrateAction::Up }
        );
        assert_eq!(
            parse(&["migrate", "version"]).unwrap(),
            Commands::Migrate { action: MigrateAction::Version }
        );
        assert_eq!(
            parse(&["migrate", "down", "zero"]).unwrap(),
            Commands::Migrate { action: MigrateAction::Down { target: 0 } }
        );
        assert_eq!(
            parse(&["migrate", "down", "20240601120000"]).unwrap(),
            Commands::Migrate { action: MigrateAction::Down { target: 20240601120000 } }
        );
    }

    #[test]
    fn test_migrate_down_needs_a_valid_target() {
        let rejected: [&[&str]; 5] = [
            &["migrate", "down"],
            &["migrate", "down", "0"],
            &["migrate", "down", "-3"],
            &["migrate", "down", "latest"],
            &["migrate", "sideways"],
        ];
        for args in rejected {
            assert!(parse(args).is_err(), "{args:?} should be rejected");
        }
    }
}
