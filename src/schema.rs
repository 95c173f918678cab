/// Creates both tables if they do not exist yet.
///
/// The foreign key on `attendance.student_id` is declared but SQLite only enforces it when
/// `PRAGMA foreign_keys` is enabled, which it is not. Removing a student's attendance is the
/// job of [`RecordsManager::delete_student`](crate::manager::RecordsManager::delete_student).
pub const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS students (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    grade REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS attendance (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    student_id INTEGER NOT NULL,
    date TEXT NOT NULL,
    status TEXT NOT NULL,
    FOREIGN KEY (student_id) REFERENCES students (id)
);
"#;

diesel::table! {
    attendance (id) {
        id -> Integer,
        student_id -> Integer,
        date -> Date,
        status -> Text,
    }
}

diesel::table! {
    students (id) {
        id -> Integer,
        name -> Text,
        grade -> Double,
    }
}

diesel::joinable!(attendance -> students (student_id));

diesel::allow_tables_to_appear_in_same_query!(attendance, students,);
