use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, PrimitiveDateTime};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Student {
    pub(crate) id: String,
    pub(crate) full_name: String,
    pub(crate) roll_no: String,
    pub(crate) class_name: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// One academic result. `grade` is derived from `marks`/`max_marks` and is
/// recomputed on every create and update; it is never set independently.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct ResultRecord {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) subject: String,
    pub(crate) marks: f64,
    pub(crate) max_marks: f64,
    pub(crate) grade: String,
    pub(crate) exam_type: String,
    pub(crate) remarks: String,
    pub(crate) academic_year: String,
    pub(crate) date: Date,
    pub(crate) uploaded_by: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// Result joined with the owning student, as returned by list queries.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct StudentResultRow {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) student_name: String,
    pub(crate) roll_no: String,
    pub(crate) class_name: String,
    pub(crate) subject: String,
    pub(crate) marks: f64,
    pub(crate) max_marks: f64,
    pub(crate) grade: String,
    pub(crate) exam_type: String,
    pub(crate) remarks: String,
    pub(crate) academic_year: String,
    pub(crate) date: Date,
    pub(crate) uploaded_by: String,
}
