// Command-line interface

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

#[derive(Parser, Debug)]
#[command(name = "courtbook")]
#[command(version, about = "Books venue court slots the moment they are released", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.courtbook/config.toml)
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Debug-level logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Wait for each trigger time and book every task, forever
    Run {
        /// Reservation matrix (overrides [paths] matrix)
        #[arg(long, short)]
        matrix: Option<PathBuf>,
    },
    /// Book every task right now, once
    Once {
        #[arg(long, short)]
        matrix: Option<PathBuf>,
    },
    /// Show the tasks compiled from the matrix
    Tasks {
        #[arg(long, short)]
        matrix: Option<PathBuf>,
    },
    /// Show upcoming trigger times
    Next {
        #[arg(long, short = 'n', default_value_t = 3)]
        count: usize,
    },
    /// Write a blank reservation matrix
    Template {
        /// Destination (default: [paths] matrix)
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Summarize one day of the outcome journal
    Report {
        /// Day to report, YYYY-MM-DD (default: today)
        #[arg(long, short)]
        date: Option<NaiveDate>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["courtbook", "once", "-m", "week.csv", "--verbose"]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Once { matrix } => assert_eq!(matrix, Some(PathBuf::from("week.csv"))),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_report_date() {
        let cli = Cli::parse_from(["courtbook", "--config", "c.toml", "report", "--date", "2025-03-10"]);
        assert_eq!(cli.config, Some(PathBuf::from("c.toml")));
        match cli.command {
            Commands::Report { date } => {
                assert_eq!(date, NaiveDate::from_ymd_opt(2025, 3, 10));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_next_default_count() {
        let cli = Cli::parse_from(["courtbook", "next"]);
        assert!(matches!(cli.command, Commands::Next { count: 3 }));
    }
}
