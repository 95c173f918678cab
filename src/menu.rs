//! The interactive numbered menu and the non-interactive demo.
//!
//! Both are generic over their input and output so they can be driven by scripted input.

use crate::display;
use crate::error::Error;
use crate::manager::RecordsManager;
use crate::models::{Status, StudentChanges};
use chrono::NaiveDate;
use std::fmt::Display;
use std::io::{self, BufRead, Write};
use std::str::FromStr;

const MENU: &str = "
Student Records Management System
1. Add Student
2. View Students
3. Update Student
4. Delete Student
5. Add Attendance
6. View Attendance
7. Update Attendance
8. Delete Attendance
9. View Students with Attendance
10. Attendance Summary
11. Average Grade
12. Filter Attendance by Date
13. Seed Example Data
14. Exit";

#[derive(Debug, thiserror::Error)]
pub enum MenuError {
    #[error("end of input")]
    EndOfInput,

    #[error("invalid input {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Records(#[from] Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

enum Flow {
    Continue,
    Exit,
}

pub struct Menu<'a, R, W> {
    manager: &'a mut RecordsManager,
    input: R,
    output: W,
}

impl<'a, R: BufRead, W: Write> Menu<'a, R, W> {
    pub fn new(manager: &'a mut RecordsManager, input: R, output: W) -> Self {
        Self {
            manager,
            input,
            output,
        }
    }

    /// Shows the menu and handles choices until the user exits or the input ends.
    ///
    /// Failed operations and invalid input are reported and the menu is shown again.
    pub fn run(&mut self) -> io::Result<()> {
        loop {
            writeln!(self.output, "{MENU}")?;
            match self.step() {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit) | Err(MenuError::EndOfInput) => return Ok(()),
                Err(MenuError::Io(err)) => return Err(err),
                Err(err) => {
                    log::debug!("Menu choice failed: {err:?}");
                    writeln!(self.output, "Error: {err}")?;
                }
            }
        }
    }

    fn step(&mut self) -> Result<Flow, MenuError> {
        let choice = self.prompt("Enter choice: ")?;
        match choice.as_str() {
            "1" => {
                let name = self.prompt("Name: ")?;
                let grade = self.parse("Grade: ")?;
                self.manager.add_student(&name, grade)?;
                self.say("Student added.")?;
            }
            "2" => {
                let students = self.manager.get_roster()?;
                self.say(display::roster(&students))?;
            }
            "3" => {
                let student_id = self.parse("Student ID: ")?;
                let name = self.prompt("New Name (leave blank to skip): ")?;
                let grade = self.parse_optional("New Grade (leave blank to skip): ")?;
                let changes = StudentChanges {
                    name: Some(name.as_str()).filter(|name| !name.is_empty()),
                    grade,
                };
                self.manager.update_student(student_id, changes)?;
                self.say("Student updated.")?;
            }
            "4" => {
                let student_id = self.parse("Student ID: ")?;
                self.manager.delete_student(student_id)?;
                self.say("Student deleted.")?;
            }
            "5" => {
                let student_id = self.parse("Student ID: ")?;
                let date: NaiveDate = self.parse("Date (YYYY-MM-DD): ")?;
                let status: Status = self.parse("Status (Present/Absent): ")?;
                self.manager.add_attendance(student_id, date, status)?;
                self.say("Attendance added.")?;
            }
            "6" => {
                let records = self.manager.get_attendance()?;
                self.say(display::attendance(&records))?;
            }
            "7" => {
                let record_id = self.parse("Attendance ID: ")?;
                let status = self.parse("New Status: ")?;
                self.manager.update_attendance(record_id, status)?;
                self.say("Attendance updated.")?;
            }
            "8" => {
                let record_id = self.parse("Attendance ID: ")?;
                self.manager.delete_attendance(record_id)?;
                self.say("Attendance deleted.")?;
            }
            "9" => {
                let rows = self.manager.students_with_attendance()?;
                self.say(display::students_with_attendance(&rows))?;
            }
            "10" => {
                let summary = self.manager.attendance_summary()?;
                self.say(display::summary(&summary))?;
            }
            "11" => {
                let average = self.manager.average_grade()?;
                self.say(display::average_grade(average))?;
            }
            "12" => {
                let start = self.parse("Start Date (YYYY-MM-DD): ")?;
                let end = self.parse("End Date (YYYY-MM-DD): ")?;
                let records = self.manager.attendance_between(start, end)?;
                self.say(display::attendance(&records))?;
            }
            "13" => {
                self.manager.seed()?;
                self.say("Example data seeded.")?;
            }
            "14" => return Ok(Flow::Exit),
            _ => self.say("Invalid choice.")?,
        }
        Ok(Flow::Continue)
    }

    fn say(&mut self, text: impl Display) -> io::Result<()> {
        writeln!(self.output, "{text}")
    }

    /// Reads one trimmed line.
    fn prompt(&mut self, label: &str) -> Result<String, MenuError> {
        write!(self.output, "{label}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(MenuError::EndOfInput);
        }
        Ok(line.trim().to_string())
    }

    fn parse<T>(&mut self, label: &str) -> Result<T, MenuError>
    where
        T: FromStr,
        T::Err: Display,
    {
        let value = self.prompt(label)?;
        value
            .parse()
            .map_err(|err| MenuError::InvalidInput(format!("'{value}': {err}")))
    }

    /// Like [`Self::parse`], but a blank line yields `None`.
    fn parse_optional<T>(&mut self, label: &str) -> Result<Option<T>, MenuError>
    where
        T: FromStr,
        T::Err: Display,
    {
        let value = self.prompt(label)?;
        if value.is_empty() {
            return Ok(None);
        }
        value
            .parse()
            .map(Some)
            .map_err(|err| MenuError::InvalidInput(format!("'{value}': {err}")))
    }
}

/// Seeds the example data and prints every listing and report.
pub fn run_demo<W: Write>(manager: &mut RecordsManager, mut out: W) -> anyhow::Result<()> {
    writeln!(out, "Running demo...")?;
    manager.seed()?;
    writeln!(out, "Seeded data.")?;

    writeln!(out, "\nStudents:\n{}", display::roster(&manager.get_roster()?))?;
    writeln!(
        out,
        "\nAttendance:\n{}",
        display::attendance(&manager.get_attendance()?)
    )?;
    writeln!(
        out,
        "\nStudents with Attendance:\n{}",
        display::students_with_attendance(&manager.students_with_attendance()?)
    )?;
    writeln!(
        out,
        "\nAttendance Summary:\n{}",
        display::summary(&manager.attendance_summary()?)
    )?;
    writeln!(out, "\n{}", display::average_grade(manager.average_grade()?))?;

    let day = NaiveDate::from_ymd_opt(2023, 9, 1)
        .ok_or_else(|| anyhow::anyhow!("invalid demo date"))?;
    writeln!(
        out,
        "\nAttendance from {day} to {day}:\n{}",
        display::attendance(&manager.attendance_between(day, day)?)
    )?;

    writeln!(out, "Demo completed.")?;
    Ok(())
}
