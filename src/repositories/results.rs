use sqlx::PgPool;
use time::{Date, PrimitiveDateTime};

use crate::db::models::{ResultRecord, StudentResultRow};

pub(crate) const COLUMNS: &str = "\
    id, student_id, subject, marks, max_marks, grade, exam_type, remarks, \
    academic_year, date, uploaded_by, created_at, updated_at";

// Joined projection; list order is insertion order so in-memory filtering
// preserves the relative order callers saw on upload.
const ROW_SELECT: &str = "\
    SELECT r.id,
           r.student_id,
           s.full_name AS student_name,
           s.roll_no,
           s.class_name,
           r.subject,
           r.marks,
           r.max_marks,
           r.grade,
           r.exam_type,
           r.remarks,
           r.academic_year,
           r.date,
           r.uploaded_by
    FROM results r
    JOIN students s ON s.id = r.student_id";

pub(crate) struct CreateResult<'a> {
    pub id: &'a str,
    pub student_id: &'a str,
    pub subject: &'a str,
    pub marks: f64,
    pub max_marks: f64,
    pub grade: &'a str,
    pub exam_type: &'a str,
    pub remarks: &'a str,
    pub academic_year: &'a str,
    pub date: Date,
    pub uploaded_by: &'a str,
    pub created_at: PrimitiveDateTime,
    pub updated_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateResult<'_>,
) -> Result<ResultRecord, sqlx::Error> {
    sqlx::query_as::<_, ResultRecord>(&format!(
        "INSERT INTO results (
            id, student_id, subject, marks, max_marks, grade, exam_type,
            remarks, academic_year, date, uploaded_by, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.student_id)
    .bind(params.subject)
    .bind(params.marks)
    .bind(params.max_marks)
    .bind(params.grade)
    .bind(params.exam_type)
    .bind(params.remarks)
    .bind(params.academic_year)
    .bind(params.date)
    .bind(params.uploaded_by)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<ResultRecord>, sqlx::Error> {
    sqlx::query_as::<_, ResultRecord>(&format!("SELECT {COLUMNS} FROM results WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Existence check for the duplicate-prevention key. Subject and exam type
/// are compared case-insensitively, matching the filter convention and the
/// unique index.
pub(crate) async fn exists_for_key(
    pool: &PgPool,
    student_id: &str,
    subject: &str,
    exam_type: &str,
    academic_year: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(
            SELECT 1 FROM results
            WHERE student_id = $1
              AND LOWER(subject) = LOWER($2)
              AND LOWER(exam_type) = LOWER($3)
              AND academic_year = $4
        )",
    )
    .bind(student_id)
    .bind(subject)
    .bind(exam_type)
    .bind(academic_year)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list_all_with_students(
    pool: &PgPool,
) -> Result<Vec<StudentResultRow>, sqlx::Error> {
    sqlx::query_as::<_, StudentResultRow>(&format!(
        "{ROW_SELECT} ORDER BY r.created_at, r.id"
    ))
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_by_student(
    pool: &PgPool,
    student_id: &str,
) -> Result<Vec<StudentResultRow>, sqlx::Error> {
    sqlx::query_as::<_, StudentResultRow>(&format!(
        "{ROW_SELECT} WHERE r.student_id = $1 ORDER BY r.created_at, r.id"
    ))
    .bind(student_id)
    .fetch_all(pool)
    .await
}

/// Persists the mutable fields of an already-merged record.
pub(crate) async fn update_record(
    pool: &PgPool,
    record: &ResultRecord,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE results SET
            student_id = $1,
            subject = $2,
            marks = $3,
            max_marks = $4,
            grade = $5,
            exam_type = $6,
            remarks = $7,
            academic_year = $8,
            date = $9,
            updated_at = $10
         WHERE id = $11",
    )
    .bind(&record.student_id)
    .bind(&record.subject)
    .bind(record.marks)
    .bind(record.max_marks)
    .bind(&record.grade)
    .bind(&record.exam_type)
    .bind(&record.remarks)
    .bind(&record.academic_year)
    .bind(record.date)
    .bind(record.updated_at)
    .bind(&record.id)
    .execute(pool)
    .await?;
    Ok(())
}

/// True when the error is a unique-index violation (SQLSTATE 23505), i.e.
/// an insert or update lost the race against the duplicate-prevention key.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

/// Returns the number of rows removed; zero means the id did not exist.
pub(crate) async fn delete_by_id(pool: &PgPool, id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM results WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected())
}
