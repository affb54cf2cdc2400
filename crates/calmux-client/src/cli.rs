//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// calmux - all your calendars in one feed
#[derive(Debug, Parser)]
#[command(name = "calmux")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the settings file
    #[arg(long, short, global = true, env = "CALMUX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the merged events of every source
    Events {
        /// Number of days ahead to show (zero or less uses the default of 4)
        #[arg(long, short, allow_negative_numbers = true)]
        days: Option<i64>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Manage configured sources
    Sources {
        #[command(subcommand)]
        action: SourcesAction,
    },
}

/// Source management actions.
#[derive(Debug, Subcommand)]
pub enum SourcesAction {
    /// List configured sources
    List {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show source names and colours
    Names,

    /// Add a source
    Add(AddArgs),

    /// Change the name, colour or feed URLs of a source
    Update(UpdateArgs),

    /// Remove a source
    Remove {
        /// Source id
        id: String,
    },
}

/// Arguments of `sources add`.
#[derive(Debug, Args)]
pub struct AddArgs {
    /// Display name
    #[arg(long)]
    pub name: String,

    /// Provider (`iCal` or `Google`)
    #[arg(long, default_value = "iCal")]
    pub provider: String,

    /// Display colour
    #[arg(long)]
    pub colour: String,

    /// Feed URL (repeat to merge several feeds into one source)
    #[arg(long, action = clap::ArgAction::Append)]
    pub url: Vec<String>,

    /// Authorization code for Google sources
    #[arg(long, env = "CALMUX_AUTH_CODE")]
    pub auth_code: Option<String>,
}

/// Arguments of `sources update`.
#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Source id
    pub id: String,

    /// New display name
    #[arg(long)]
    pub name: Option<String>,

    /// New colour
    #[arg(long)]
    pub colour: Option<String>,

    /// Replacement feed URL (repeat for several)
    #[arg(long, action = clap::ArgAction::Append)]
    pub url: Vec<String>,
}

/// Joins repeated `--url` values into the newline separated form.
pub fn join_urls(urls: &[String]) -> Option<String> {
    if urls.is_empty() {
        None
    } else {
        Some(urls.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn events_accepts_negative_days() {
        let cli = Cli::try_parse_from(["calmux", "events", "--days", "-1", "--json"]).unwrap();
        match cli.command {
            Command::Events { days, json } => {
                assert_eq!(days, Some(-1));
                assert!(json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn add_collects_urls() {
        let cli = Cli::try_parse_from([
            "calmux",
            "sources",
            "add",
            "--name",
            "Holidays",
            "--colour",
            "red",
            "--url",
            "https://a.example.com/a.ics",
            "--url",
            "https://b.example.com/b.ics",
        ])
        .unwrap();

        let Command::Sources {
            action: SourcesAction::Add(args),
        } = cli.command
        else {
            panic!("expected sources add");
        };
        assert_eq!(args.provider, "iCal");
        assert_eq!(
            join_urls(&args.url).as_deref(),
            Some("https://a.example.com/a.ics\nhttps://b.example.com/b.ics")
        );
    }

    #[test]
    fn no_urls_join_to_none() {
        assert_eq!(join_urls(&[]), None);
    }
}
