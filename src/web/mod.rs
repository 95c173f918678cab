//! The web interface: four form-and-table views served by a synchronous [`tiny_http`] server.
//!
//! Requests are handled one at a time on the calling thread. Every mutating action is a POST that
//! is answered with a redirect back to its view, which is then drawn from scratch.

pub mod form;
pub mod pages;

use self::form::Form;
use self::pages::{CELL_PREFIX, RangeFilter, SNAPSHOT_PREFIX, View};
use crate::error::{Error, Result};
use crate::manager::RecordsManager;
use crate::matrix::{self, DateRange};
use crate::models::{Status, StudentChanges};
use chrono::{Local, NaiveDate};
use std::io::Cursor;
use tiny_http::{Header, Method, Response, Server};

/// The answer to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Page { status: u16, html: String },
    /// `303 See Other` to the given location.
    Redirect(String),
}

impl Reply {
    fn page(view: View, query: &Form, body: &str) -> Self {
        Self::Page {
            status: 200,
            html: pages::layout(view, query.get("notice"), body),
        }
    }

    fn redirect(view: View, params: &[(&str, &str)]) -> Self {
        if params.is_empty() {
            return Self::Redirect(view.path().to_string());
        }
        Self::Redirect(format!("{}?{}", view.path(), form::encode(params)))
    }

    fn redirect_with_notice(view: View, notice: &str) -> Self {
        Self::redirect(view, &[("notice", notice)])
    }

    fn error(status: u16, message: &str) -> Self {
        Self::Page {
            status,
            html: pages::error_page(status, message),
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            Self::Page { status, .. } => *status,
            Self::Redirect(_) => 303,
        }
    }

    fn into_response(self) -> Response<Cursor<Vec<u8>>> {
        match self {
            Self::Page { status, html } => with_header(
                Response::from_string(html).with_status_code(status),
                "Content-Type",
                "text/html; charset=utf-8",
            ),
            Self::Redirect(location) => with_header(
                Response::from_string(String::new()).with_status_code(303),
                "Location",
                &location,
            ),
        }
    }
}

fn with_header(
    response: Response<Cursor<Vec<u8>>>,
    name: &str,
    value: &str,
) -> Response<Cursor<Vec<u8>>> {
    match Header::from_bytes(name.as_bytes(), value.as_bytes()) {
        Ok(header) => response.with_header(header),
        Err(()) => {
            log::warn!("Dropping invalid header {name}: {value}");
            response
        }
    }
}

fn status_of(err: &Error) -> u16 {
    match err {
        Error::NotFound { .. } => 404,
        Error::Validation(_) | Error::Csv(_) => 400,
        Error::StorageUnavailable(_) | Error::Query(_) => 500,
    }
}

/// Listens on `address` and serves requests until the process is stopped.
pub fn serve(manager: &mut RecordsManager, address: &str) -> anyhow::Result<()> {
    let server = Server::http(address)
        .map_err(|err| anyhow::anyhow!("failed to listen on {address}: {err}"))?;
    log::info!("Listening on http://{address}");

    for mut request in server.incoming_requests() {
        let mut body = String::new();
        let reply = match request.as_reader().read_to_string(&mut body) {
            Ok(_) => handle(manager, request.method(), request.url(), &body),
            Err(err) => Reply::error(400, &format!("unreadable request body: {err}")),
        };
        log::debug!(
            "{} {} -> {}",
            request.method(),
            request.url(),
            reply.status()
        );
        if let Err(err) = request.respond(reply.into_response()) {
            log::warn!("Failed to send response: {err}");
        }
    }
    Ok(())
}

/// Handles one request. Errors are turned into error pages.
pub fn handle(manager: &mut RecordsManager, method: &Method, url: &str, body: &str) -> Reply {
    match route(manager, method, url, body) {
        Ok(reply) => reply,
        Err(err) => {
            let status = status_of(&err);
            if status >= 500 {
                log::error!("{method} {url} failed: {err}");
            } else {
                log::warn!("{method} {url} rejected: {err}");
            }
            Reply::error(status, &err.to_string())
        }
    }
}

fn route(manager: &mut RecordsManager, method: &Method, url: &str, body: &str) -> Result<Reply> {
    let (path, query) = url.split_once('?').unwrap_or((url, ""));
    let query = Form::parse(query);
    let form = Form::parse(body);

    match (method, path) {
        (Method::Get, "/") => Ok(Reply::redirect(View::Students, &[])),
        (Method::Get, "/students") => students_view(manager, &query),
        (Method::Post, "/students/add") => add_student(manager, &form),
        (Method::Post, "/students/update") => update_student(manager, &form),
        (Method::Post, "/students/delete") => delete_student(manager, &form),
        (Method::Get, "/attendance") => attendance_view(manager, &query),
        (Method::Post, "/attendance/save") => save_attendance(manager, &form),
        (Method::Post, "/attendance/bulk") => bulk_attendance(manager, &form),
        (Method::Post, "/attendance/add") => add_attendance(manager, &form),
        (Method::Post, "/attendance/update") => update_attendance(manager, &form),
        (Method::Post, "/attendance/delete") => delete_attendance(manager, &form),
        (Method::Get, "/reports") => reports_view(manager, &query),
        (Method::Get, "/seed") => Ok(Reply::page(View::Seed, &query, &pages::seed())),
        (Method::Post, "/seed") => {
            manager.seed()?;
            Ok(Reply::redirect_with_notice(
                View::Seed,
                "Example data seeded successfully!",
            ))
        }
        _ => Ok(Reply::error(404, &format!("no page at {method} {path}"))),
    }
}

fn students_view(manager: &mut RecordsManager, query: &Form) -> Result<Reply> {
    let roster = manager.get_roster()?;
    Ok(Reply::page(View::Students, query, &pages::students(&roster)))
}

fn add_student(manager: &mut RecordsManager, form: &Form) -> Result<Reply> {
    let student = manager.add_student(form.required("name")?, form.parse_required("grade")?)?;
    Ok(Reply::redirect_with_notice(
        View::Students,
        &format!("Student '{}' added successfully!", student.name),
    ))
}

fn update_student(manager: &mut RecordsManager, form: &Form) -> Result<Reply> {
    let student_id = form.parse_required("student_id")?;
    let changes = StudentChanges {
        name: form.get("name"),
        grade: form.parse_optional("grade")?,
    };
    let notice = if changes.is_empty() {
        "Nothing to update."
    } else {
        "Student updated successfully!"
    };
    manager.update_student(student_id, changes)?;
    Ok(Reply::redirect_with_notice(View::Students, notice))
}

fn delete_student(manager: &mut RecordsManager, form: &Form) -> Result<Reply> {
    let student = manager.delete_student(form.parse_required("student_id")?)?;
    Ok(Reply::redirect_with_notice(
        View::Students,
        &format!("Student '{}' deleted successfully!", student.name),
    ))
}

/// The range given by the `start` and `end` fields. The start defaults to today and the end to
/// the start.
fn date_range(fields: &Form) -> Result<DateRange> {
    let start = fields
        .parse_optional::<NaiveDate>("start")?
        .unwrap_or_else(|| Local::now().date_naive());
    let end = fields.parse_optional::<NaiveDate>("end")?.unwrap_or(start);
    Ok(DateRange::new(start, end))
}

fn back_to_attendance(range: DateRange, notice: &str) -> Reply {
    Reply::redirect(
        View::Attendance,
        &[
            ("start", range.start.to_string().as_str()),
            ("end", range.end.to_string().as_str()),
            ("notice", notice),
        ],
    )
}

fn attendance_view(manager: &mut RecordsManager, query: &Form) -> Result<Reply> {
    let range = date_range(query)?;
    let roster = manager.get_roster()?;
    let matrix = manager.attendance_matrix(range)?;
    let records = manager.get_attendance()?;
    Ok(Reply::page(
        View::Attendance,
        query,
        &pages::attendance(range, &roster, &matrix, &records),
    ))
}

fn save_attendance(manager: &mut RecordsManager, form: &Form) -> Result<Reply> {
    let range = date_range(form)?;
    let snapshot = form.matrix(SNAPSHOT_PREFIX)?;
    let edited = form.matrix(CELL_PREFIX)?;

    let writes = matrix::reconcile(&snapshot, &edited);
    let applied = manager.apply_writes(&writes)?;
    Ok(back_to_attendance(
        range,
        &format!("Saved {applied} attendance changes."),
    ))
}

fn bulk_attendance(manager: &mut RecordsManager, form: &Form) -> Result<Reply> {
    let range = date_range(form)?;
    let notice = match form.required("action")? {
        "present" => {
            let changed = manager.mark_range(range, Status::Present)?;
            format!("All students marked as Present ({changed} changes).")
        }
        "absent" => {
            let changed = manager.mark_range(range, Status::Absent)?;
            format!("All students marked as Absent ({changed} changes).")
        }
        "clear" => {
            let cleared = manager.clear_range(range)?;
            format!("Cleared {cleared} attendance records.")
        }
        other => {
            return Err(Error::validation(format!("unknown bulk action '{other}'")));
        }
    };
    Ok(back_to_attendance(range, &notice))
}

fn add_attendance(manager: &mut RecordsManager, form: &Form) -> Result<Reply> {
    let range = date_range(form)?;
    manager.add_attendance(
        form.parse_required("student_id")?,
        form.parse_required("date")?,
        form.parse_required("status")?,
    )?;
    Ok(back_to_attendance(
        range,
        "Attendance record added successfully!",
    ))
}

fn update_attendance(manager: &mut RecordsManager, form: &Form) -> Result<Reply> {
    let range = date_range(form)?;
    manager.update_attendance(
        form.parse_required("record_id")?,
        form.parse_required("status")?,
    )?;
    Ok(back_to_attendance(range, "Attendance updated successfully!"))
}

fn delete_attendance(manager: &mut RecordsManager, form: &Form) -> Result<Reply> {
    let range = date_range(form)?;
    manager.delete_attendance(form.parse_required("record_id")?)?;
    Ok(back_to_attendance(
        range,
        "Attendance record deleted successfully!",
    ))
}

fn reports_view(manager: &mut RecordsManager, query: &Form) -> Result<Reply> {
    let rows = manager.students_with_attendance()?;
    let summary = manager.attendance_summary()?;
    let average = manager.average_grade()?;

    let filter = match (
        query.parse_optional::<NaiveDate>("start")?,
        query.parse_optional::<NaiveDate>("end")?,
    ) {
        (Some(start), Some(end)) => {
            let range = DateRange::new(start, end);
            if range.is_empty() {
                RangeFilter::Rejected(range)
            } else {
                RangeFilter::Applied(range, manager.attendance_between(start, end)?)
            }
        }
        _ => RangeFilter::NotRequested,
    };

    Ok(Reply::page(
        View::Reports,
        query,
        &pages::reports(&rows, &summary, average, &filter),
    ))
}
