//! Reading a roster of students from a CSV file with a `name,grade` header.

use crate::error::Result;
use crate::models::NewStudent;
use serde::Deserialize;
use std::io;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RosterEntry {
    pub name: String,
    pub grade: f64,
}

impl RosterEntry {
    pub fn as_new_student(&self) -> NewStudent<'_> {
        NewStudent {
            name: &self.name,
            grade: self.grade,
        }
    }
}

/// Reads every entry of a roster file.
pub fn read_roster(path: &Path) -> Result<Vec<RosterEntry>> {
    let reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
    collect_entries(reader)
}

/// Reads every entry of a roster from any reader.
pub fn parse_roster<R: io::Read>(input: R) -> Result<Vec<RosterEntry>> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(input);
    collect_entries(reader)
}

fn collect_entries<R: io::Read>(mut reader: csv::Reader<R>) -> Result<Vec<RosterEntry>> {
    Ok(reader
        .deserialize()
        .collect::<std::result::Result<Vec<RosterEntry>, _>>()?)
}
