//! Imports a roster of students from a CSV file with a `name,grade` header.
//!
//! Every row is validated before anything is written, and the rows are inserted in one
//! transaction. With `--replace`, the current roster and all attendance records are deleted in
//! that same transaction.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use student_records::settings::Settings;
use student_records::{display, roster};

#[derive(Parser, Debug)]
#[command(name = "import-roster", version, about = "Import students from a CSV roster")]
struct Args {
    /// The CSV file to import.
    roster: PathBuf,

    /// Path of the SQLite database, overriding the configured one.
    #[arg(long)]
    database: Option<String>,

    /// Delete the current roster before importing.
    #[arg(long)]
    replace: bool,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = Args::parse();
    let entries = roster::read_roster(&args.roster)
        .with_context(|| format!("failed to read roster {}", args.roster.display()))?;

    let settings = Settings::load().context("failed to load settings")?;
    let mut manager = student_records::create_default_manager(&settings, args.database.as_deref())?;

    let new_students: Vec<_> = entries.iter().map(|entry| entry.as_new_student()).collect();
    let added = if args.replace {
        let (dropped, added) = manager.replace_roster(&new_students)?;
        println!("Students dropped: {}", dropped.len());
        added
    } else {
        manager.insert_students(&new_students)?
    };
    println!("Students added:\n{}", display::roster(&added));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_args() {
        Args::command().debug_assert();
    }
}
