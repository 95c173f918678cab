//! This module contains the command-line interface [`Cli`] parser for managing student records.

use clap::{ArgAction, Parser, Subcommand};

/// The command line configuration struct, where the command-line interface parser is automatically
/// derived by [`clap::Parser`].
#[derive(Parser, Debug)]
#[command(name = "records", version, about = "Student records management")]
pub struct Cli {
    /// Path of the SQLite database, overriding the configured one.
    #[arg(long, global = true)]
    pub database: Option<String>,

    /// Increase log verbosity (-v for info, -vv for debug).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// What to do. Starts the interactive menu if omitted.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the interactive numbered menu.
    Menu,

    /// Serve the web interface.
    Serve {
        /// Socket address to listen on, overriding the configured one.
        #[arg(long)]
        address: Option<String>,
    },

    /// Add the example students and attendance records.
    Seed,

    /// Seed the example data and print every report.
    Demo,
}

impl Cli {
    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        }
    }
}
