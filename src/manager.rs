use crate::error::{Error, Result};
use crate::matrix::{AttendanceMatrix, DateRange, StagedWrite, WriteKind};
use crate::models::{
    AttendanceRecord, NewAttendance, NewStudent, Status, StatusCount, Student,
    StudentAttendanceRow, StudentChanges,
};
use crate::schema::{self, attendance, students};
use chrono::NaiveDate;
use diesel::connection::SimpleConnection;
use diesel::dsl::{avg, count_star};
use diesel::prelude::*;
use std::collections::HashMap;

/// The manager for recording, modifying, and retrieving student and attendance data.
///
/// Owns a single SQLite connection for its whole lifetime.
pub struct RecordsManager {
    db: SqliteConnection,
}

impl RecordsManager {
    /// Connects to the SQLite database at `database_url` and creates the tables if needed.
    ///
    /// `":memory:"` opens a private in-memory database.
    pub fn open(database_url: &str) -> Result<Self> {
        log::debug!("Opening database {database_url}");
        let mut db = SqliteConnection::establish(database_url)?;
        db.batch_execute(schema::CREATE_TABLES)?;
        Ok(Self { db })
    }

    fn validate_name(name: &str) -> Result<&str> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::validation("student name must not be empty"));
        }
        Ok(name)
    }

    fn validate_grade(grade: f64) -> Result<f64> {
        if !(0.0..=100.0).contains(&grade) {
            return Err(Error::validation(format!(
                "grade {grade} is outside of 0 to 100"
            )));
        }
        Ok(grade)
    }

    // Roster

    /// Adds a student and returns it with its newly assigned ID.
    pub fn add_student(&mut self, name: &str, grade: f64) -> Result<Student> {
        let new_student = NewStudent {
            name: Self::validate_name(name)?,
            grade: Self::validate_grade(grade)?,
        };

        let student = diesel::insert_into(students::table)
            .values(&new_student)
            .returning(Student::as_returning())
            .get_result(&mut self.db)?;

        log::info!("Added student {} '{}'", student.id, student.name);
        Ok(student)
    }

    fn validate_students<'a>(new_students: &[NewStudent<'a>]) -> Result<Vec<NewStudent<'a>>> {
        new_students
            .iter()
            .map(|student| {
                Ok(NewStudent {
                    name: Self::validate_name(student.name)?,
                    grade: Self::validate_grade(student.grade)?,
                })
            })
            .collect()
    }

    fn insert_validated(
        conn: &mut SqliteConnection,
        new_students: &[NewStudent<'_>],
    ) -> Result<Vec<Student>> {
        new_students
            .iter()
            .map(|student| {
                diesel::insert_into(students::table)
                    .values(student)
                    .returning(Student::as_returning())
                    .get_result(conn)
                    .map_err(Error::from)
            })
            .collect()
    }

    /// Inserts a batch of students in one transaction. Either all of them are added or none.
    pub fn insert_students(&mut self, new_students: &[NewStudent<'_>]) -> Result<Vec<Student>> {
        let validated = Self::validate_students(new_students)?;
        let inserted = self
            .db
            .transaction::<_, Error, _>(|conn| Self::insert_validated(conn, &validated))?;

        log::info!("Inserted {} students", inserted.len());
        Ok(inserted)
    }

    /// Replaces the whole roster, and drops every attendance record, in one transaction.
    ///
    /// Returns the removed and the inserted students. If any new student is invalid, nothing
    /// changes.
    pub fn replace_roster(
        &mut self,
        new_students: &[NewStudent<'_>],
    ) -> Result<(Vec<Student>, Vec<Student>)> {
        let validated = Self::validate_students(new_students)?;
        let (removed, inserted) = self.db.transaction::<_, Error, _>(|conn| {
            diesel::delete(attendance::table).execute(conn)?;
            let removed = diesel::delete(students::table)
                .returning(Student::as_returning())
                .get_results(conn)?;
            let inserted = Self::insert_validated(conn, &validated)?;
            Ok((removed, inserted))
        })?;

        log::info!(
            "Replaced the roster of {} students with {} students",
            removed.len(),
            inserted.len()
        );
        Ok((removed, inserted))
    }

    /// Retrieves all students on the roster, in the order they were added.
    pub fn get_roster(&mut self) -> Result<Vec<Student>> {
        Ok(students::table
            .select(Student::as_select())
            .order_by(students::id)
            .load(&mut self.db)?)
    }

    /// Returns the total number of students on the roster.
    pub fn num_students(&mut self) -> Result<usize> {
        let count: i64 = students::table.count().get_result(&mut self.db)?;
        Ok(count as usize)
    }

    /// Retrieves a specific student from the roster based on their ID.
    pub fn get_student(&mut self, student_id: i32) -> Result<Student> {
        students::table
            .find(student_id)
            .select(Student::as_select())
            .first(&mut self.db)
            .optional()?
            .ok_or_else(|| Error::student_not_found(student_id))
    }

    /// Rewrites the supplied fields of a student. Supplying no field at all does nothing.
    pub fn update_student(&mut self, student_id: i32, changes: StudentChanges<'_>) -> Result<()> {
        if changes.is_empty() {
            log::debug!("Nothing to update for student {student_id}");
            return Ok(());
        }
        let changes = StudentChanges {
            name: changes.name.map(Self::validate_name).transpose()?,
            grade: changes.grade.map(Self::validate_grade).transpose()?,
        };

        let updated = diesel::update(students::table.find(student_id))
            .set(&changes)
            .execute(&mut self.db)?;
        if updated == 0 {
            return Err(Error::student_not_found(student_id));
        }

        log::info!("Updated student {student_id}");
        Ok(())
    }

    /// Removes and returns a student, together with all of their attendance records.
    pub fn delete_student(&mut self, student_id: i32) -> Result<Student> {
        let (student, removed_records) = self.db.transaction::<_, Error, _>(|conn| {
            let removed_records =
                diesel::delete(attendance::table.filter(attendance::student_id.eq(student_id)))
                    .execute(conn)?;
            let student = diesel::delete(students::table.find(student_id))
                .returning(Student::as_returning())
                .get_result(conn)
                .optional()?
                .ok_or_else(|| Error::student_not_found(student_id))?;
            Ok((student, removed_records))
        })?;

        log::info!(
            "Deleted student {student_id} and {removed_records} attendance records"
        );
        Ok(student)
    }

    /// Removes and returns all students, clearing every attendance record along the way.
    pub fn delete_roster(&mut self) -> Result<Vec<Student>> {
        let removed = self.db.transaction::<_, Error, _>(|conn| {
            diesel::delete(attendance::table).execute(conn)?;
            Ok(diesel::delete(students::table)
                .returning(Student::as_returning())
                .get_results(conn)?)
        })?;

        log::info!("Deleted the roster of {} students", removed.len());
        Ok(removed)
    }

    // Attendance

    /// Records a status for a student on a date.
    ///
    /// This always inserts a new record, even if one already exists for the same date.
    pub fn add_attendance(
        &mut self,
        student_id: i32,
        date: NaiveDate,
        status: Status,
    ) -> Result<AttendanceRecord> {
        let record = diesel::insert_into(attendance::table)
            .values(&NewAttendance {
                student_id,
                date,
                status,
            })
            .returning(AttendanceRecord::as_returning())
            .get_result(&mut self.db)?;

        log::debug!(
            "Recorded student {student_id} as {status} on {date} (record {})",
            record.id
        );
        Ok(record)
    }

    /// Retrieves all attendance records.
    pub fn get_attendance(&mut self) -> Result<Vec<AttendanceRecord>> {
        Ok(attendance::table
            .select(AttendanceRecord::as_select())
            .order_by(attendance::id)
            .load(&mut self.db)?)
    }

    /// Rewrites the status of one attendance record.
    pub fn update_attendance(&mut self, record_id: i32, new_status: Status) -> Result<()> {
        let updated = diesel::update(attendance::table.find(record_id))
            .set(attendance::status.eq(new_status))
            .execute(&mut self.db)?;
        if updated == 0 {
            return Err(Error::record_not_found(record_id));
        }

        log::debug!("Updated attendance record {record_id} to {new_status}");
        Ok(())
    }

    /// Deletes one attendance record.
    pub fn delete_attendance(&mut self, record_id: i32) -> Result<()> {
        let deleted = diesel::delete(attendance::table.find(record_id)).execute(&mut self.db)?;
        if deleted == 0 {
            return Err(Error::record_not_found(record_id));
        }

        log::debug!("Deleted attendance record {record_id}");
        Ok(())
    }

    /// Deletes every record of a student on a date and returns how many there were.
    pub fn delete_attendance_for(&mut self, student_id: i32, date: NaiveDate) -> Result<usize> {
        let deleted = diesel::delete(
            attendance::table
                .filter(attendance::student_id.eq(student_id))
                .filter(attendance::date.eq(date)),
        )
        .execute(&mut self.db)?;

        log::debug!("Cleared {deleted} records of student {student_id} on {date}");
        Ok(deleted)
    }

    /// Sets the status of every record of a student on a date and returns how many there were.
    pub fn set_status_on(
        &mut self,
        student_id: i32,
        date: NaiveDate,
        status: Status,
    ) -> Result<usize> {
        let updated = diesel::update(
            attendance::table
                .filter(attendance::student_id.eq(student_id))
                .filter(attendance::date.eq(date)),
        )
        .set(attendance::status.eq(status))
        .execute(&mut self.db)?;

        log::debug!("Set {updated} records of student {student_id} on {date} to {status}");
        Ok(updated)
    }

    /// Maps student IDs to their status on a date.
    ///
    /// If a student has several records on that date, the most recently added one wins.
    pub fn attendance_on(&mut self, date: NaiveDate) -> Result<HashMap<i32, Status>> {
        let records: Vec<(i32, Status)> = attendance::table
            .filter(attendance::date.eq(date))
            .order_by(attendance::id)
            .select((attendance::student_id, attendance::status))
            .load(&mut self.db)?;

        Ok(records.into_iter().collect())
    }

    // Matrix

    /// Builds the attendance grid of the whole roster over a date range.
    pub fn attendance_matrix(&mut self, range: DateRange) -> Result<AttendanceMatrix> {
        range.check_len()?;
        let roster = self.get_roster()?;
        let records = self.attendance_between(range.start, range.end)?;

        Ok(AttendanceMatrix::build(
            roster.iter().map(|student| student.id),
            range,
            &records,
        ))
    }

    /// Applies staged writes one after the other and returns how many were applied.
    ///
    /// An update rewrites every record of the student on that date, so duplicates all end up with
    /// the new status.
    ///
    /// The writes are not applied atomically: if one fails, the ones before it stay applied.
    pub fn apply_writes(&mut self, writes: &[StagedWrite]) -> Result<usize> {
        for write in writes {
            if write.kind == WriteKind::Update
                && self.set_status_on(write.student_id, write.date, write.status)? > 0
            {
                continue;
            }
            if write.kind == WriteKind::Update {
                log::warn!(
                    "No record of student {} on {} left to update, inserting instead",
                    write.student_id,
                    write.date
                );
            }
            self.add_attendance(write.student_id, write.date, write.status)?;
        }

        log::info!("Applied {} attendance changes", writes.len());
        Ok(writes.len())
    }

    /// Sets every student to `status` on every date of the range.
    pub fn mark_range(&mut self, range: DateRange, status: Status) -> Result<usize> {
        let matrix = self.attendance_matrix(range)?;
        self.apply_writes(&crate::matrix::mark_all(&matrix, status))
    }

    /// Deletes every record of the roster within the range and returns how many were removed.
    ///
    /// Like [`Self::apply_writes`], this is not atomic.
    pub fn clear_range(&mut self, range: DateRange) -> Result<usize> {
        let matrix = self.attendance_matrix(range)?;
        let recorded: Vec<(i32, NaiveDate)> = matrix
            .cells()
            .filter(|(_, _, cell)| cell.is_some())
            .map(|(student_id, date, _)| (student_id, date))
            .collect();

        let mut cleared = 0;
        for (student_id, date) in recorded {
            cleared += self.delete_attendance_for(student_id, date)?;
        }

        log::info!(
            "Cleared {cleared} attendance records from {} to {}",
            range.start,
            range.end
        );
        Ok(cleared)
    }

    // Reports

    /// Pairs every student with each of their records. Students without any record appear
    /// once, without date and status.
    pub fn students_with_attendance(&mut self) -> Result<Vec<StudentAttendanceRow>> {
        Ok(students::table
            .left_join(attendance::table)
            .select((
                students::id,
                students::name,
                students::grade,
                attendance::date.nullable(),
                attendance::status.nullable(),
            ))
            .order_by((
                students::id.asc(),
                attendance::date.nullable().asc(),
                attendance::id.nullable().asc(),
            ))
            .load(&mut self.db)?)
    }

    /// Counts the attendance records per status.
    pub fn attendance_summary(&mut self) -> Result<Vec<StatusCount>> {
        Ok(attendance::table
            .group_by(attendance::status)
            .select((attendance::status, count_star()))
            .order_by(attendance::status)
            .load(&mut self.db)?)
    }

    /// The mean grade of the roster, or `None` if the roster is empty.
    pub fn average_grade(&mut self) -> Result<Option<f64>> {
        Ok(students::table
            .select(avg(students::grade))
            .first(&mut self.db)?)
    }

    /// Retrieves the attendance records dated within `start..=end`.
    pub fn attendance_between(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>> {
        if start > end {
            return Ok(Vec::new());
        }
        Ok(attendance::table
            .filter(attendance::date.between(start, end))
            .select(AttendanceRecord::as_select())
            .order_by(attendance::id)
            .load(&mut self.db)?)
    }

    /// Adds the example roster of three students and six attendance records.
    pub fn seed(&mut self) -> Result<()> {
        let first = NaiveDate::from_ymd_opt(2023, 9, 1).ok_or_else(invalid_seed_date)?;
        let second = NaiveDate::from_ymd_opt(2023, 9, 2).ok_or_else(invalid_seed_date)?;

        let alice = self.add_student("Alice Johnson", 85.5)?;
        let bob = self.add_student("Bob Smith", 92.0)?;
        let charlie = self.add_student("Charlie Brown", 78.3)?;

        for (student, date, status) in [
            (&alice, first, Status::Present),
            (&alice, second, Status::Absent),
            (&bob, first, Status::Present),
            (&bob, second, Status::Present),
            (&charlie, first, Status::Absent),
            (&charlie, second, Status::Present),
        ] {
            self.add_attendance(student.id, date, status)?;
        }

        log::info!("Seeded example data");
        Ok(())
    }
}

fn invalid_seed_date() -> Error {
    Error::validation("invalid seed date")
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn manager() -> RecordsManager {
        RecordsManager::open(":memory:").unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn add_then_list() {
        let mut manager = manager();
        let first = manager.add_student("Ada", 91.0).unwrap();
        let second = manager.add_student("  Grace  ", 88.5).unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(second.name, "Grace");
        assert_eq!(manager.get_roster().unwrap(), vec![first, second]);
        assert_eq!(manager.num_students().unwrap(), 2);
    }

    #[test]
    fn add_rejects_invalid_values() {
        let mut manager = manager();
        assert!(matches!(
            manager.add_student("Ada", 100.5),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            manager.add_student("Ada", f64::NAN),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            manager.add_student("   ", 50.0),
            Err(Error::Validation(_))
        ));
        assert_eq!(manager.num_students().unwrap(), 0);
    }

    #[test]
    fn update_rewrites_supplied_fields_only() {
        let mut manager = manager();
        let student = manager.add_student("Ada", 91.0).unwrap();

        manager
            .update_student(
                student.id,
                StudentChanges {
                    grade: Some(0.0),
                    ..Default::default()
                },
            )
            .unwrap();
        let updated = manager.get_student(student.id).unwrap();
        assert_eq!((updated.name.as_str(), updated.grade), ("Ada", 0.0));

        manager
            .update_student(
                student.id,
                StudentChanges {
                    name: Some("Ada Lovelace"),
                    ..Default::default()
                },
            )
            .unwrap();
        let updated = manager.get_student(student.id).unwrap();
        assert_eq!((updated.name.as_str(), updated.grade), ("Ada Lovelace", 0.0));
    }

    #[test]
    fn update_without_fields_is_a_no_op() {
        let mut manager = manager();
        // Not even the missing student is reported.
        manager.update_student(42, StudentChanges::default()).unwrap();
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let mut manager = manager();
        let changes = StudentChanges {
            name: Some("Nobody"),
            ..Default::default()
        };
        assert!(matches!(
            manager.update_student(7, changes),
            Err(Error::NotFound { id: 7, .. })
        ));
        assert!(matches!(
            manager.delete_student(7),
            Err(Error::NotFound { .. })
        ));
        assert!(matches!(
            manager.update_attendance(3, Status::Absent),
            Err(Error::NotFound { .. })
        ));
        assert!(matches!(
            manager.delete_attendance(3),
            Err(Error::NotFound { .. })
        ));
        assert!(matches!(manager.get_student(1), Err(Error::NotFound { .. })));
    }

    #[test]
    fn delete_student_cascades_to_attendance() {
        let mut manager = manager();
        let ada = manager.add_student("Ada", 91.0).unwrap();
        let grace = manager.add_student("Grace", 88.0).unwrap();
        manager
            .add_attendance(ada.id, date("2024-01-08"), Status::Present)
            .unwrap();
        manager
            .add_attendance(ada.id, date("2024-01-09"), Status::Absent)
            .unwrap();
        manager
            .add_attendance(grace.id, date("2024-01-08"), Status::Present)
            .unwrap();

        let removed = manager.delete_student(ada.id).unwrap();
        assert_eq!(removed, ada);
        assert_eq!(manager.get_roster().unwrap(), vec![grace.clone()]);

        let remaining = manager.get_attendance().unwrap();
        assert_eq!(remaining.len(), 1);
        assert!(remaining.iter().all(|record| record.student_id == grace.id));
    }

    #[test]
    fn adding_twice_creates_duplicates() {
        let mut manager = manager();
        let ada = manager.add_student("Ada", 91.0).unwrap();
        let day = date("2024-01-08");
        manager.add_attendance(ada.id, day, Status::Present).unwrap();
        let second = manager.add_attendance(ada.id, day, Status::Absent).unwrap();

        assert_eq!(manager.get_attendance().unwrap().len(), 2);
        assert_eq!(
            manager.attendance_on(day).unwrap(),
            HashMap::from([(ada.id, second.status)])
        );

        assert_eq!(manager.delete_attendance_for(ada.id, day).unwrap(), 2);
        assert!(manager.attendance_on(day).unwrap().is_empty());
    }

    #[test]
    fn attendance_on_a_date() {
        let mut manager = manager();
        let ada = manager.add_student("Ada", 91.0).unwrap();
        let grace = manager.add_student("Grace", 88.0).unwrap();
        let day = date("2024-01-08");
        assert!(manager.attendance_on(day).unwrap().is_empty());

        manager.add_attendance(ada.id, day, Status::Present).unwrap();
        manager.add_attendance(grace.id, day, Status::Absent).unwrap();
        manager
            .add_attendance(grace.id, date("2024-01-09"), Status::Present)
            .unwrap();

        assert_eq!(
            manager.attendance_on(day).unwrap(),
            HashMap::from([(ada.id, Status::Present), (grace.id, Status::Absent)])
        );
    }

    #[test]
    fn update_and_delete_single_record() {
        let mut manager = manager();
        let ada = manager.add_student("Ada", 91.0).unwrap();
        let record = manager
            .add_attendance(ada.id, date("2024-01-08"), Status::Present)
            .unwrap();

        manager.update_attendance(record.id, Status::Absent).unwrap();
        assert_eq!(manager.get_attendance().unwrap()[0].status, Status::Absent);

        manager.delete_attendance(record.id).unwrap();
        assert!(manager.get_attendance().unwrap().is_empty());
    }

    #[test]
    fn average_of_empty_roster_is_none() {
        let mut manager = manager();
        assert_eq!(manager.average_grade().unwrap(), None);
        manager.add_student("Ada", 90.0).unwrap();
        manager.add_student("Grace", 80.0).unwrap();
        assert_eq!(manager.average_grade().unwrap(), Some(85.0));
    }

    #[test]
    fn seeded_reports() {
        let mut manager = manager();
        manager.seed().unwrap();

        let average = manager.average_grade().unwrap().unwrap();
        assert!((average - (85.5 + 92.0 + 78.3) / 3.0).abs() < 1e-9);

        let summary = manager.attendance_summary().unwrap();
        assert_eq!(
            summary,
            vec![
                StatusCount {
                    status: Status::Absent,
                    count: 2
                },
                StatusCount {
                    status: Status::Present,
                    count: 4
                },
            ]
        );
        let total: i64 = summary.iter().map(|entry| entry.count).sum();
        assert_eq!(total as usize, manager.get_attendance().unwrap().len());
    }

    #[test]
    fn join_keeps_students_without_records() {
        let mut manager = manager();
        manager.seed().unwrap();
        let dana = manager.add_student("Dana Scully", 99.0).unwrap();

        let rows = manager.students_with_attendance().unwrap();
        assert_eq!(rows.len(), 7);

        let last = rows.last().unwrap();
        assert_eq!(last.student_id, dana.id);
        assert_eq!((last.date, last.status), (None, None));

        let alice: Vec<_> = rows.iter().filter(|row| row.name == "Alice Johnson").collect();
        assert_eq!(alice.len(), 2);
        assert_eq!(alice[0].date, Some(date("2023-09-01")));
        assert_eq!(alice[1].status, Some(Status::Absent));
    }

    #[test]
    fn date_range_filter_is_inclusive() {
        let mut manager = manager();
        manager.seed().unwrap();

        let first_day = manager
            .attendance_between(date("2023-09-01"), date("2023-09-01"))
            .unwrap();
        assert_eq!(first_day.len(), 3);
        assert!(first_day.iter().all(|record| record.date == date("2023-09-01")));

        let both = manager
            .attendance_between(date("2023-08-31"), date("2023-09-02"))
            .unwrap();
        assert_eq!(both.len(), 6);

        let reversed = manager
            .attendance_between(date("2023-09-02"), date("2023-09-01"))
            .unwrap();
        assert!(reversed.is_empty());
    }

    #[test]
    fn saving_an_edited_matrix() {
        let mut manager = manager();
        let ada = manager.add_student("Ada", 91.0).unwrap();
        let grace = manager.add_student("Grace", 88.0).unwrap();
        let range = DateRange::new(date("2024-01-08"), date("2024-01-09"));
        manager
            .add_attendance(grace.id, date("2024-01-08"), Status::Present)
            .unwrap();

        let snapshot = manager.attendance_matrix(range).unwrap();
        let mut edited = snapshot.clone();
        edited.set(ada.id, date("2024-01-09"), Some(Status::Present));
        edited.set(grace.id, date("2024-01-08"), Some(Status::Absent));

        let writes = crate::matrix::reconcile(&snapshot, &edited);
        assert_eq!(manager.apply_writes(&writes).unwrap(), 2);
        assert_eq!(manager.attendance_matrix(range).unwrap(), edited);
        assert_eq!(manager.get_attendance().unwrap().len(), 2);

        // Clearing a cell in the grid leaves the record in place.
        let snapshot = edited;
        let mut edited = snapshot.clone();
        edited.set(grace.id, date("2024-01-08"), None);
        let writes = crate::matrix::reconcile(&snapshot, &edited);
        assert_eq!(manager.apply_writes(&writes).unwrap(), 0);
        assert_eq!(manager.get_attendance().unwrap().len(), 2);
    }

    #[test]
    fn stale_update_falls_back_to_insert() {
        let mut manager = manager();
        let ada = manager.add_student("Ada", 91.0).unwrap();
        let day = date("2024-01-08");
        let write = StagedWrite {
            student_id: ada.id,
            date: day,
            status: Status::Absent,
            kind: WriteKind::Update,
        };

        manager.apply_writes(&[write]).unwrap();
        assert_eq!(
            manager.attendance_on(day).unwrap(),
            HashMap::from([(ada.id, Status::Absent)])
        );
    }

    #[test]
    fn mark_and_clear_range() {
        let mut manager = manager();
        let ada = manager.add_student("Ada", 91.0).unwrap();
        let grace = manager.add_student("Grace", 88.0).unwrap();
        let range = DateRange::new(date("2024-01-08"), date("2024-01-10"));
        manager
            .add_attendance(ada.id, date("2024-01-09"), Status::Absent)
            .unwrap();
        // Outside the range.
        manager
            .add_attendance(grace.id, date("2024-01-11"), Status::Absent)
            .unwrap();

        assert_eq!(manager.mark_range(range, Status::Present).unwrap(), 6);
        let matrix = manager.attendance_matrix(range).unwrap();
        assert!(
            matrix
                .cells()
                .all(|(_, _, cell)| cell == Some(Status::Present))
        );
        // The existing record was updated rather than duplicated.
        assert_eq!(manager.get_attendance().unwrap().len(), 7);

        assert_eq!(manager.mark_range(range, Status::Present).unwrap(), 0);

        assert_eq!(manager.clear_range(range).unwrap(), 6);
        let remaining = manager.get_attendance().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].date, date("2024-01-11"));
    }

    #[test]
    fn insert_students_is_all_or_nothing() {
        let mut manager = manager();
        let batch = [
            NewStudent {
                name: "Ada",
                grade: 91.0,
            },
            NewStudent {
                name: "Grace",
                grade: 101.0,
            },
        ];
        assert!(manager.insert_students(&batch).is_err());
        assert_eq!(manager.num_students().unwrap(), 0);

        let inserted = manager.insert_students(&batch[..1]).unwrap();
        assert_eq!(inserted.len(), 1);
        assert_eq!(manager.get_roster().unwrap(), inserted);
    }

    #[test]
    fn delete_roster_removes_everything() {
        let mut manager = manager();
        manager.seed().unwrap();

        let removed = manager.delete_roster().unwrap();
        assert_eq!(removed.len(), 3);
        assert_eq!(manager.num_students().unwrap(), 0);
        assert!(manager.get_attendance().unwrap().is_empty());
    }

    #[test]
    fn replace_roster_with_an_invalid_row_changes_nothing() {
        let mut manager = manager();
        manager.seed().unwrap();
        let batch = [
            NewStudent {
                name: "Ada",
                grade: 91.0,
            },
            NewStudent {
                name: "Bad",
                grade: 150.0,
            },
        ];

        assert!(matches!(
            manager.replace_roster(&batch),
            Err(Error::Validation(_))
        ));
        assert_eq!(manager.num_students().unwrap(), 3);
        assert_eq!(manager.get_attendance().unwrap().len(), 6);

        let (removed, inserted) = manager.replace_roster(&batch[..1]).unwrap();
        assert_eq!(removed.len(), 3);
        assert_eq!(manager.get_roster().unwrap(), inserted);
        assert!(manager.get_attendance().unwrap().is_empty());
    }

    #[test]
    fn saving_over_duplicates_updates_the_shown_cell() {
        let mut manager = manager();
        let ada = manager.add_student("Ada", 91.0).unwrap();
        let day = date("2024-01-08");
        let range = DateRange::single(day);
        manager.add_attendance(ada.id, day, Status::Present).unwrap();
        manager.add_attendance(ada.id, day, Status::Absent).unwrap();

        let snapshot = manager.attendance_matrix(range).unwrap();
        assert_eq!(snapshot.get(ada.id, day), Some(Status::Absent));
        let mut edited = snapshot.clone();
        edited.set(ada.id, day, Some(Status::Present));

        let writes = crate::matrix::reconcile(&snapshot, &edited);
        assert_eq!(manager.apply_writes(&writes).unwrap(), 1);
        assert_eq!(manager.attendance_matrix(range).unwrap(), edited);
        assert!(
            manager
                .get_attendance()
                .unwrap()
                .iter()
                .all(|record| record.status == Status::Present)
        );
    }

    #[test]
    fn marking_over_duplicates_converges() {
        let mut manager = manager();
        let ada = manager.add_student("Ada", 91.0).unwrap();
        let day = date("2024-01-08");
        let range = DateRange::single(day);
        manager.add_attendance(ada.id, day, Status::Present).unwrap();
        manager.add_attendance(ada.id, day, Status::Absent).unwrap();

        assert_eq!(manager.mark_range(range, Status::Present).unwrap(), 1);
        assert_eq!(
            manager.attendance_matrix(range).unwrap().get(ada.id, day),
            Some(Status::Present)
        );
        assert_eq!(manager.mark_range(range, Status::Present).unwrap(), 0);
        assert_eq!(manager.get_attendance().unwrap().len(), 2);
    }
}
