use std::sync::{Mutex, MutexGuard, OnceLock};

use sqlx::PgPool;
use time::macros::date;

use crate::core::config::{SchoolSettings, Settings};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::StudentResultRow;
use crate::services::grading;

/// Serializes tests that read or write process environment variables.
pub(crate) fn env_lock() -> MutexGuard<'static, ()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(())).lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// State over a lazy pool; no connection is made until a query runs, so
/// router tests that never touch the database need no server.
pub(crate) fn build_state(settings: Settings) -> AppState {
    let db = sqlx::PgPool::connect_lazy(&settings.database().database_url()).expect("lazy pool");
    AppState::new(settings, db)
}

pub(crate) fn school_settings() -> SchoolSettings {
    SchoolSettings {
        default_exam_type: "Mid-term".to_string(),
        default_academic_year: "2025-26".to_string(),
    }
}

pub(crate) async fn seed_student(pool: &PgPool, id: &str, class_name: &str) {
    let now = primitive_now_utc();
    sqlx::query(
        "INSERT INTO students (id, full_name, roll_no, class_name, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(id)
    .bind(format!("Student {id}"))
    .bind("01")
    .bind(class_name)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .expect("seed student");
}

/// A `sqlx::Error` carrying SQLSTATE 23505, as Postgres reports when the
/// duplicate-prevention index rejects a write.
pub(crate) fn unique_violation() -> sqlx::Error {
    sqlx::Error::Database(Box::new(UniqueViolation))
}

#[derive(Debug)]
struct UniqueViolation;

impl std::fmt::Display for UniqueViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("duplicate key value violates unique constraint")
    }
}

impl std::error::Error for UniqueViolation {}

impl sqlx::error::DatabaseError for UniqueViolation {
    fn message(&self) -> &str {
        "duplicate key value violates unique constraint"
    }

    fn code(&self) -> Option<std::borrow::Cow<'_, str>> {
        Some("23505".into())
    }

    fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self
    }

    fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
        self
    }

    fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
        self
    }

    fn kind(&self) -> sqlx::error::ErrorKind {
        sqlx::error::ErrorKind::UniqueViolation
    }
}

pub(crate) fn sample_row(
    id: &str,
    student_id: &str,
    class_name: &str,
    subject: &str,
    marks: f64,
    max_marks: f64,
) -> StudentResultRow {
    StudentResultRow {
        id: id.to_string(),
        student_id: student_id.to_string(),
        student_name: format!("Student {student_id}"),
        roll_no: "01".to_string(),
        class_name: class_name.to_string(),
        subject: subject.to_string(),
        marks,
        max_marks,
        grade: grading::grade_for(marks, max_marks).to_string(),
        exam_type: "Mid-term".to_string(),
        remarks: String::new(),
        academic_year: "2025-26".to_string(),
        date: date!(2026 - 03 - 10),
        uploaded_by: "System".to_string(),
    }
}
