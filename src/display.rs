//! Terminal tables for the text menu and the demo.

use crate::models::{AttendanceRecord, StatusCount, Student, StudentAttendanceRow};
use tabled::{Table, Tabled, settings::Style};

fn table<T: Tabled>(rows: &[T]) -> Table {
    let mut table = Table::new(rows);
    table.with(Style::modern());
    table
}

/// Renders the roster, or a hint if it is empty.
pub fn roster(students: &[Student]) -> String {
    if students.is_empty() {
        return "No students found.".to_string();
    }
    table(students).to_string()
}

pub fn attendance(records: &[AttendanceRecord]) -> String {
    if records.is_empty() {
        return "No attendance records found.".to_string();
    }
    table(records).to_string()
}

pub fn students_with_attendance(rows: &[StudentAttendanceRow]) -> String {
    if rows.is_empty() {
        return "No students found.".to_string();
    }
    table(rows).to_string()
}

pub fn summary(counts: &[StatusCount]) -> String {
    if counts.is_empty() {
        return "No attendance records found.".to_string();
    }
    table(counts).to_string()
}

/// The average grade with two decimals.
pub fn average_grade(average: Option<f64>) -> String {
    match average {
        Some(average) => format!("Average Grade: {average:.2}"),
        None => "Average Grade: none (no students)".to_string(),
    }
}
