use std::collections::HashMap;

use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use time::Date;
use validator::Validate;

use crate::core::time::{format_date, parse_date};
use crate::db::models::StudentResultRow;
use crate::services::grading;
use crate::services::result_stats::ResultStatistics;

/// A single result submission. Required: student reference, subject, marks.
/// Everything else is defaulted at ingestion time.
#[derive(Debug, Clone, Deserialize, Validate)]
pub(crate) struct ResultUpload {
    #[serde(alias = "studentId")]
    #[validate(length(min = 1, message = "student_id must not be empty"))]
    pub(crate) student_id: String,
    #[validate(length(min = 1, message = "subject must not be empty"))]
    pub(crate) subject: String,
    #[validate(range(min = 0.0, message = "marks must be non-negative"))]
    pub(crate) marks: f64,
    #[serde(default = "default_max_marks", alias = "maxMarks")]
    #[validate(range(exclusive_min = 0.0, message = "max_marks must be positive"))]
    pub(crate) max_marks: f64,
    #[serde(default, alias = "examType")]
    #[validate(length(min = 1, message = "exam_type must not be empty"))]
    pub(crate) exam_type: Option<String>,
    #[serde(default)]
    pub(crate) remarks: Option<String>,
    #[serde(default, alias = "academicYear")]
    #[validate(length(min = 1, message = "academic_year must not be empty"))]
    pub(crate) academic_year: Option<String>,
    #[serde(default, deserialize_with = "deserialize_option_date")]
    pub(crate) date: Option<Date>,
}

/// Partial update; only supplied fields change. A new marks or max_marks
/// value triggers grade recomputation downstream.
#[derive(Debug, Default, Deserialize, Validate)]
pub(crate) struct ResultUpdate {
    #[serde(default, alias = "studentId")]
    #[validate(length(min = 1, message = "student_id must not be empty"))]
    pub(crate) student_id: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, message = "subject must not be empty"))]
    pub(crate) subject: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "marks must be non-negative"))]
    pub(crate) marks: Option<f64>,
    #[serde(default, alias = "maxMarks")]
    #[validate(range(exclusive_min = 0.0, message = "max_marks must be positive"))]
    pub(crate) max_marks: Option<f64>,
    #[serde(default, alias = "examType")]
    #[validate(length(min = 1, message = "exam_type must not be empty"))]
    pub(crate) exam_type: Option<String>,
    #[serde(default)]
    pub(crate) remarks: Option<String>,
    #[serde(default, alias = "academicYear")]
    #[validate(length(min = 1, message = "academic_year must not be empty"))]
    pub(crate) academic_year: Option<String>,
    #[serde(default, deserialize_with = "deserialize_option_date")]
    pub(crate) date: Option<Date>,
}

// Responses serialize camelCase for the frontend consumers.

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ResultUploadResponse {
    pub(crate) message: String,
    pub(crate) result_id: String,
    pub(crate) grade: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BulkUploadResponse {
    pub(crate) message: String,
    pub(crate) total_records: usize,
    pub(crate) success_count: usize,
    pub(crate) fail_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(crate) errors: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ResultResponse {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) student_name: String,
    pub(crate) roll_no: String,
    pub(crate) class_name: String,
    pub(crate) subject: String,
    pub(crate) marks: f64,
    pub(crate) max_marks: f64,
    pub(crate) percentage: String,
    pub(crate) grade: String,
    pub(crate) exam_type: String,
    pub(crate) remarks: String,
    pub(crate) academic_year: String,
    pub(crate) date: String,
    pub(crate) uploaded_by: String,
}

impl ResultResponse {
    pub(crate) fn from_row(row: StudentResultRow) -> Self {
        let percentage =
            grading::format_percentage(grading::percentage(row.marks, row.max_marks));
        Self {
            id: row.id,
            student_id: row.student_id,
            student_name: row.student_name,
            roll_no: row.roll_no,
            class_name: row.class_name,
            subject: row.subject,
            marks: row.marks,
            max_marks: row.max_marks,
            percentage,
            grade: row.grade,
            exam_type: row.exam_type,
            remarks: row.remarks,
            academic_year: row.academic_year,
            date: format_date(row.date),
            uploaded_by: row.uploaded_by,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ClassStatisticsResponse {
    pub(crate) total_results: usize,
    pub(crate) average_percentage: String,
    pub(crate) highest_marks: f64,
    pub(crate) lowest_marks: f64,
    pub(crate) pass_count: usize,
    pub(crate) fail_count: usize,
    pub(crate) grade_distribution: HashMap<String, usize>,
}

impl From<ResultStatistics> for ClassStatisticsResponse {
    fn from(stats: ResultStatistics) -> Self {
        Self {
            total_results: stats.total_results,
            average_percentage: stats.average_percentage,
            highest_marks: stats.highest_marks,
            lowest_marks: stats.lowest_marks,
            pass_count: stats.pass_count,
            fail_count: stats.fail_count,
            grade_distribution: stats.grade_distribution,
        }
    }
}

/// Statistics endpoint payload: either the aggregate metrics or the
/// "no data" sentinel, both delivered with HTTP 200.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(crate) enum StatisticsResponse {
    NoData { message: String },
    Statistics(ClassStatisticsResponse),
}

#[derive(Debug, Serialize)]
pub(crate) struct MessageResponse {
    pub(crate) message: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct UpdateResultResponse {
    pub(crate) message: String,
    pub(crate) grade: String,
}

fn default_max_marks() -> f64 {
    100.0
}

fn deserialize_option_date<'de, D>(deserializer: D) -> Result<Option<Date>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw {
        Some(value) => parse_date(&value)
            .ok_or_else(|| D::Error::custom(format!("invalid date: {value}")))
            .map(Some),
        None => Ok(None),
    }
}
