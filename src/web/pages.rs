//! HTML rendering of the four views.

use super::form::cell_field;
use crate::matrix::{AttendanceMatrix, DateRange};
use crate::models::{
    AttendanceRecord, NOT_RECORDED, Status, StatusCount, Student, StudentAttendanceRow,
    cell_label,
};
use std::collections::HashMap;

/// Grid field prefix of the edited cells.
pub const CELL_PREFIX: &str = "cell:";
/// Grid field prefix of the cells as they were rendered.
pub const SNAPSHOT_PREFIX: &str = "was:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Students,
    Attendance,
    Reports,
    Seed,
}

impl View {
    pub const ALL: [View; 4] = [View::Students, View::Attendance, View::Reports, View::Seed];

    pub fn path(self) -> &'static str {
        match self {
            View::Students => "/students",
            View::Attendance => "/attendance",
            View::Reports => "/reports",
            View::Seed => "/seed",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            View::Students => "Students",
            View::Attendance => "Attendance",
            View::Reports => "Reports",
            View::Seed => "Seed Data",
        }
    }
}

pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Wraps a view's body into the page with the navigation bar.
pub fn layout(view: View, notice: Option<&str>, body: &str) -> String {
    let nav: String = View::ALL
        .iter()
        .map(|&item| {
            let class = if item == view { " class=\"active\"" } else { "" };
            format!(
                "<a href=\"{}\"{class}>{}</a>",
                item.path(),
                item.title()
            )
        })
        .collect::<Vec<_>>()
        .join(" | ");
    let notice = notice
        .map(|notice| format!("<p class=\"notice\">{}</p>", escape(notice)))
        .unwrap_or_default();

    format!(
        "<!DOCTYPE html>
<html>
<head><meta charset=\"utf-8\"><title>{title} - Student Records Management</title></head>
<body>
<h1>Student Records Management System</h1>
<nav>{nav}</nav>
{notice}
<h2>{title}</h2>
{body}
</body>
</html>
",
        title = view.title()
    )
}

pub fn error_page(status: u16, message: &str) -> String {
    format!(
        "<!DOCTYPE html>
<html>
<head><meta charset=\"utf-8\"><title>Error {status}</title></head>
<body>
<h1>Error {status}</h1>
<p>{}</p>
<p><a href=\"/students\">Back to students</a></p>
</body>
</html>
",
        escape(message)
    )
}

fn table(headers: &[&str], rows: Vec<Vec<String>>) -> String {
    let head: String = headers
        .iter()
        .map(|header| format!("<th>{}</th>", escape(header)))
        .collect();
    let body: String = rows
        .into_iter()
        .map(|row| {
            let cells: String = row
                .iter()
                .map(|cell| format!("<td>{}</td>", escape(cell)))
                .collect();
            format!("<tr>{cells}</tr>\n")
        })
        .collect();
    format!("<table>\n<thead><tr>{head}</tr></thead>\n<tbody>\n{body}</tbody>\n</table>")
}

fn info(message: &str) -> String {
    format!("<p class=\"info\">{}</p>", escape(message))
}

fn student_options(students: &[Student]) -> String {
    students
        .iter()
        .map(|student| {
            format!(
                "<option value=\"{}\">{} - {}</option>",
                student.id,
                student.id,
                escape(&student.name)
            )
        })
        .collect()
}

fn record_options(records: &[AttendanceRecord]) -> String {
    records
        .iter()
        .map(|record| {
            format!(
                "<option value=\"{id}\">ID {id} - Student {} - {} ({})</option>",
                record.student_id,
                record.date,
                record.status,
                id = record.id
            )
        })
        .collect()
}

fn status_options(selected: Option<Status>, with_not_recorded: bool) -> String {
    let not_recorded = with_not_recorded.then_some(None);
    not_recorded
        .into_iter()
        .chain(Status::ALL.into_iter().map(Some))
        .map(|cell| {
            let label = cell_label(cell);
            let attr = if cell == selected { " selected" } else { "" };
            format!("<option value=\"{label}\"{attr}>{label}</option>")
        })
        .collect()
}

fn records_table(records: &[AttendanceRecord]) -> String {
    table(
        &["ID", "Student ID", "Date", "Status"],
        records
            .iter()
            .map(|record| {
                vec![
                    record.id.to_string(),
                    record.student_id.to_string(),
                    record.date.to_string(),
                    record.status.to_string(),
                ]
            })
            .collect(),
    )
}

pub fn students(students: &[Student]) -> String {
    let listing = if students.is_empty() {
        info("No students found. Add some below!")
    } else {
        table(
            &["ID", "Name", "Grade"],
            students
                .iter()
                .map(|student| {
                    vec![
                        student.id.to_string(),
                        student.name.clone(),
                        student.grade.to_string(),
                    ]
                })
                .collect(),
        )
    };

    let add = "<h3>Add New Student</h3>
<form method=\"post\" action=\"/students/add\">
<label>Student Name <input type=\"text\" name=\"name\" required></label>
<label>Grade <input type=\"number\" name=\"grade\" min=\"0\" max=\"100\" step=\"0.1\" value=\"0\" required></label>
<button type=\"submit\">Add Student</button>
</form>";

    let manage = if students.is_empty() {
        String::new()
    } else {
        let options = student_options(students);
        format!(
            "<h3>Update Student</h3>
<form method=\"post\" action=\"/students/update\">
<label>Student <select name=\"student_id\">{options}</select></label>
<label>New Name <input type=\"text\" name=\"name\" placeholder=\"leave blank to keep\"></label>
<label>New Grade <input type=\"number\" name=\"grade\" min=\"0\" max=\"100\" step=\"0.1\" placeholder=\"leave blank to keep\"></label>
<button type=\"submit\">Update Student</button>
</form>
<h3>Delete Student</h3>
<form method=\"post\" action=\"/students/delete\">
<label>Student <select name=\"student_id\">{options}</select></label>
<button type=\"submit\">Delete Student</button>
</form>"
        )
    };

    format!("<h3>Current Students</h3>\n{listing}\n{add}\n{manage}")
}

fn range_fields(range: DateRange) -> String {
    format!(
        "<input type=\"hidden\" name=\"start\" value=\"{}\"><input type=\"hidden\" name=\"end\" value=\"{}\">",
        range.start, range.end
    )
}

fn attendance_grid(range: DateRange, students: &[Student], matrix: &AttendanceMatrix) -> String {
    let names: HashMap<i32, &str> = students
        .iter()
        .map(|student| (student.id, student.name.as_str()))
        .collect();

    let head: String = matrix
        .dates()
        .iter()
        .map(|date| format!("<th>{date}</th>"))
        .collect();
    let rows: String = matrix
        .student_ids()
        .map(|student_id| {
            let name = names.get(&student_id).copied().unwrap_or_default();
            let cells: String = matrix
                .dates()
                .iter()
                .map(|&date| {
                    let cell = matrix.get(student_id, date);
                    format!(
                        "<td><select name=\"{}\">{}</select><input type=\"hidden\" name=\"{}\" value=\"{}\"></td>",
                        escape(&cell_field(CELL_PREFIX, student_id, date)),
                        status_options(cell, true),
                        escape(&cell_field(SNAPSHOT_PREFIX, student_id, date)),
                        cell_label(cell)
                    )
                })
                .collect();
            format!(
                "<tr><td>{} (ID: {student_id})</td>{cells}</tr>\n",
                escape(name)
            )
        })
        .collect();

    format!(
        "<form method=\"post\" action=\"/attendance/save\">
{}
<table>
<thead><tr><th>Student</th>{head}</tr></thead>
<tbody>
{rows}</tbody>
</table>
<button type=\"submit\">Save Attendance</button>
</form>",
        range_fields(range)
    )
}

pub fn attendance(
    range: DateRange,
    students: &[Student],
    matrix: &AttendanceMatrix,
    records: &[AttendanceRecord],
) -> String {
    let picker = format!(
        "<form method=\"get\" action=\"/attendance\">
<label>From <input type=\"date\" name=\"start\" value=\"{}\"></label>
<label>To <input type=\"date\" name=\"end\" value=\"{}\"></label>
<button type=\"submit\">Show</button>
</form>",
        range.start, range.end
    );

    if students.is_empty() {
        return format!(
            "{picker}\n{}",
            info("Please add students first before managing attendance.")
        );
    }

    let title = if range.start == range.end {
        format!("Attendance for {}", range.start)
    } else {
        format!("Attendance from {} to {}", range.start, range.end)
    };
    let grid = if range.is_empty() {
        info("The start date lies after the end date.")
    } else {
        attendance_grid(range, students, matrix)
    };

    let bulk: String = [
        ("present", "Mark All Present"),
        ("absent", "Mark All Absent"),
        ("clear", "Clear All"),
    ]
    .iter()
    .map(|(action, label)| {
        format!(
            "<form method=\"post\" action=\"/attendance/bulk\" class=\"inline\">{}<input type=\"hidden\" name=\"action\" value=\"{action}\"><button type=\"submit\">{label}</button></form>\n",
            range_fields(range)
        )
    })
    .collect();

    let listing = if records.is_empty() {
        info("No attendance records found.")
    } else {
        records_table(records)
    };
    let options = student_options(students);
    let add = format!(
        "<h4>Add Attendance Record</h4>
<form method=\"post\" action=\"/attendance/add\">
{}
<label>Student <select name=\"student_id\">{options}</select></label>
<label>Date <input type=\"date\" name=\"date\" value=\"{}\" required></label>
<label>Status <select name=\"status\">{}</select></label>
<button type=\"submit\">Add Attendance</button>
</form>",
        range_fields(range),
        range.start,
        status_options(Some(Status::Present), false)
    );
    let manage = if records.is_empty() {
        String::new()
    } else {
        let options = record_options(records);
        format!(
            "<h4>Update Attendance Record</h4>
<form method=\"post\" action=\"/attendance/update\">
{fields}
<label>Record <select name=\"record_id\">{options}</select></label>
<label>New Status <select name=\"status\">{}</select></label>
<button type=\"submit\">Update Attendance</button>
</form>
<h4>Delete Attendance Record</h4>
<form method=\"post\" action=\"/attendance/delete\">
{fields}
<label>Record <select name=\"record_id\">{options}</select></label>
<button type=\"submit\">Delete Attendance</button>
</form>",
            status_options(Some(Status::Present), false),
            fields = range_fields(range)
        )
    };

    format!(
        "{picker}
<h3>{title}</h3>
{grid}
<p>Cells set back to {NOT_RECORDED} are kept; use Clear All to remove records.</p>
<h3>Bulk Actions</h3>
{bulk}<details>
<summary>Advanced: Individual Record Management</summary>
<h4>Current Attendance Records</h4>
{listing}
{add}
{manage}
</details>"
    )
}

/// Outcome of the date range filter on the reports view.
#[derive(Debug, Clone, PartialEq)]
pub enum RangeFilter {
    NotRequested,
    /// The start date lies after the end date.
    Rejected(DateRange),
    Applied(DateRange, Vec<AttendanceRecord>),
}

pub fn reports(
    rows: &[StudentAttendanceRow],
    summary: &[StatusCount],
    average: Option<f64>,
    filter: &RangeFilter,
) -> String {
    let joined = if rows.is_empty() {
        info("No joined data available.")
    } else {
        table(
            &["Student ID", "Name", "Grade", "Date", "Status"],
            rows.iter()
                .map(|row| {
                    vec![
                        row.student_id.to_string(),
                        row.name.clone(),
                        row.grade.to_string(),
                        row.date.map(|date| date.to_string()).unwrap_or_default(),
                        cell_label(row.status).to_string(),
                    ]
                })
                .collect(),
        )
    };

    let summary = if summary.is_empty() {
        info("No attendance summary available.")
    } else {
        table(
            &["Status", "Count"],
            summary
                .iter()
                .map(|entry| vec![entry.status.to_string(), entry.count.to_string()])
                .collect(),
        )
    };

    let average = match average {
        Some(average) => format!("<p class=\"metric\">Average Student Grade: {average:.2}</p>"),
        None => info("No grades available."),
    };

    let (start, end) = match filter {
        RangeFilter::NotRequested => (String::new(), String::new()),
        RangeFilter::Rejected(range) | RangeFilter::Applied(range, _) => {
            (range.start.to_string(), range.end.to_string())
        }
    };
    let filtered = match filter {
        RangeFilter::NotRequested => String::new(),
        RangeFilter::Rejected(_) => info("The start date must not lie after the end date."),
        RangeFilter::Applied(_, records) if records.is_empty() => {
            info("No records found in the selected date range.")
        }
        RangeFilter::Applied(_, records) => records_table(records),
    };

    format!(
        "<h3>Students with Attendance Records</h3>
{joined}
<h3>Attendance Summary</h3>
{summary}
<h3>Average Grade</h3>
{average}
<h3>Filter Attendance by Date Range</h3>
<form method=\"get\" action=\"/reports\">
<label>Start Date <input type=\"date\" name=\"start\" value=\"{start}\" required></label>
<label>End Date <input type=\"date\" name=\"end\" value=\"{end}\" required></label>
<button type=\"submit\">Filter</button>
</form>
{filtered}"
    )
}

pub fn seed() -> String {
    format!(
        "<p>Click the button below to add example students and attendance records to the database.</p>
<form method=\"post\" action=\"/seed\"><button type=\"submit\">Seed Data</button></form>
{}",
        info("This will add 3 students and 6 attendance records for demonstration purposes.")
    )
}
