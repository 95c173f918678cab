use crate::schema::{attendance, students};
use chrono::NaiveDate;
use diesel::backend::Backend;
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::prelude::*;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use diesel::sqlite::Sqlite;
use std::fmt;
use std::str::FromStr;
use tabled::Tabled;

/// Label shown for a (student, date) pair that has no attendance record.
pub const NOT_RECORDED: &str = "Not Recorded";

/// A stored attendance status.
///
/// "Not recorded" is not a status: it is the absence of a row, modelled as `Option<Status>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
pub enum Status {
    Present,
    Absent,
}

impl Status {
    pub const ALL: [Status; 2] = [Status::Present, Status::Absent];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Present => "Present",
            Status::Absent => "Absent",
        }
    }

    /// Parses a grid cell, where [`NOT_RECORDED`] maps to `None`.
    pub fn parse_cell(s: &str) -> Result<Option<Status>, ParseStatusError> {
        if s.trim().eq_ignore_ascii_case(NOT_RECORDED) {
            Ok(None)
        } else {
            s.parse().map(Some)
        }
    }
}

/// The label of a grid cell.
pub fn cell_label(cell: Option<Status>) -> &'static str {
    cell.map_or(NOT_RECORDED, Status::as_str)
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown attendance status '{0}', expected Present or Absent")]
pub struct ParseStatusError(String);

impl FromStr for Status {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Status::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseStatusError(trimmed.to_string()))
    }
}

impl ToSql<Text, Sqlite> for Status {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
        out.set_value(self.as_str());
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Sqlite> for Status {
    fn from_sql(bytes: <Sqlite as Backend>::RawValue<'_>) -> deserialize::Result<Self> {
        let value = <String as FromSql<Text, Sqlite>>::from_sql(bytes)?;
        Ok(value.parse()?)
    }
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Tabled)]
#[diesel(table_name = students)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Student {
    #[tabled(rename = "ID")]
    pub id: i32,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Grade")]
    pub grade: f64,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = students)]
pub struct NewStudent<'a> {
    pub name: &'a str,
    pub grade: f64,
}

/// The fields of a student to rewrite. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, AsChangeset)]
#[diesel(table_name = students)]
pub struct StudentChanges<'a> {
    pub name: Option<&'a str>,
    pub grade: Option<f64>,
}

impl StudentChanges<'_> {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.grade.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Tabled)]
#[diesel(table_name = attendance)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AttendanceRecord {
    #[tabled(rename = "ID")]
    pub id: i32,
    #[tabled(rename = "Student ID")]
    pub student_id: i32,
    #[tabled(rename = "Date")]
    pub date: NaiveDate,
    #[tabled(rename = "Status")]
    pub status: Status,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = attendance)]
pub struct NewAttendance {
    pub student_id: i32,
    pub date: NaiveDate,
    pub status: Status,
}

/// One row of the students-with-attendance report.
#[derive(Debug, Clone, PartialEq, Queryable, Tabled)]
pub struct StudentAttendanceRow {
    #[tabled(rename = "Student ID")]
    pub student_id: i32,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Grade")]
    pub grade: f64,
    #[tabled(rename = "Date", display = "display_date")]
    pub date: Option<NaiveDate>,
    #[tabled(rename = "Status", display = "display_cell")]
    pub status: Option<Status>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Queryable, Tabled)]
pub struct StatusCount {
    #[tabled(rename = "Status")]
    pub status: Status,
    #[tabled(rename = "Count")]
    pub count: i64,
}

fn display_date(date: &Option<NaiveDate>) -> String {
    date.map_or_else(|| "-".to_string(), |date| date.to_string())
}

fn display_cell(cell: &Option<Status>) -> String {
    cell_label(*cell).to_string()
}
