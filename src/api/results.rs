use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use time::Date;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::ActingUser;
use crate::core::state::AppState;
use crate::core::time::{parse_date, primitive_now_utc};
use crate::db::models::{ResultRecord, StudentResultRow};
use crate::repositories::{results, students};
use crate::schemas::result::{
    BulkUploadResponse, MessageResponse, ResultResponse, ResultUpdate, ResultUpload,
    ResultUploadResponse, StatisticsResponse, UpdateResultResponse,
};
use crate::services::result_filters::ResultFilters;
use crate::services::result_ingest::{self, IngestError};
use crate::services::{grading, result_filters, result_stats};

#[derive(Debug, Deserialize)]
pub(crate) struct ListResultsQuery {
    #[serde(default, alias = "className")]
    class_name: Option<String>,
    #[serde(default)]
    subject: Option<String>,
    #[serde(default, alias = "examType")]
    exam_type: Option<String>,
    #[serde(default, alias = "academicYear")]
    academic_year: Option<String>,
    #[serde(default, alias = "dateFrom")]
    date_from: Option<String>,
    #[serde(default, alias = "dateTo")]
    date_to: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatisticsQuery {
    #[serde(default)]
    subject: Option<String>,
    #[serde(default, alias = "examType")]
    exam_type: Option<String>,
    #[serde(default, alias = "academicYear")]
    academic_year: Option<String>,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload_result))
        .route("/upload-bulk", post(upload_results_bulk))
        .route("/all", get(list_results))
        .route("/student/:student_id", get(list_student_results))
        .route("/class/:class_name", get(list_class_results))
        .route("/statistics/:class_name", get(class_statistics))
        .route("/:result_id", put(update_result).delete(delete_result))
}

async fn upload_result(
    State(state): State<AppState>,
    ActingUser(uploaded_by): ActingUser,
    Json(payload): Json<ResultUpload>,
) -> Result<(StatusCode, Json<ResultUploadResponse>), ApiError> {
    let record =
        result_ingest::ingest_result(state.db(), payload, state.settings().school(), &uploaded_by)
            .await
            .map_err(ingest_error_to_api)?;

    tracing::info!(result_id = %record.id, student_id = %record.student_id, "Result uploaded");

    Ok((
        StatusCode::CREATED,
        Json(ResultUploadResponse {
            message: "Result uploaded successfully".to_string(),
            result_id: record.id,
            grade: record.grade,
        }),
    ))
}

/// Bulk uploads always answer 200; per-record failures are tallied in the
/// response body rather than failing the batch.
async fn upload_results_bulk(
    State(state): State<AppState>,
    ActingUser(uploaded_by): ActingUser,
    Json(records): Json<Vec<serde_json::Value>>,
) -> Json<BulkUploadResponse> {
    let outcome = result_ingest::ingest_batch(
        state.db(),
        records,
        state.settings().school(),
        &uploaded_by,
    )
    .await;

    tracing::info!(
        total = outcome.total_records,
        succeeded = outcome.success_count,
        failed = outcome.fail_count,
        "Bulk upload completed"
    );

    Json(BulkUploadResponse {
        message: "Bulk upload completed".to_string(),
        total_records: outcome.total_records,
        success_count: outcome.success_count,
        fail_count: outcome.fail_count,
        errors: outcome.errors,
    })
}

async fn list_results(
    State(state): State<AppState>,
    Query(query): Query<ListResultsQuery>,
) -> Result<Json<Vec<ResultResponse>>, ApiError> {
    let filters = query_to_filters(query)?;
    let rows = results::list_all_with_students(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list results"))?;

    let rows = result_filters::apply(rows, &filters);
    Ok(Json(rows.into_iter().map(ResultResponse::from_row).collect()))
}

// An unknown student id yields an empty list, same as a student with no
// results; existence is only enforced on writes.
async fn list_student_results(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> Result<Json<Vec<ResultResponse>>, ApiError> {
    let rows = results::list_by_student(state.db(), &student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list student results"))?;

    Ok(Json(rows.into_iter().map(ResultResponse::from_row).collect()))
}

async fn list_class_results(
    State(state): State<AppState>,
    Path(class_name): Path<String>,
) -> Result<Json<Vec<ResultResponse>>, ApiError> {
    let rows = class_rows(&state, class_name).await?;
    Ok(Json(rows.into_iter().map(ResultResponse::from_row).collect()))
}

async fn class_statistics(
    State(state): State<AppState>,
    Path(class_name): Path<String>,
    Query(query): Query<StatisticsQuery>,
) -> Result<Json<StatisticsResponse>, ApiError> {
    let rows = class_rows(&state, class_name).await?;
    let filters = ResultFilters {
        subject: query.subject,
        exam_type: query.exam_type,
        academic_year: query.academic_year,
        ..ResultFilters::default()
    };
    let rows = result_filters::apply(rows, &filters);

    let response = match result_stats::compute(&rows) {
        Some(stats) => StatisticsResponse::Statistics(stats.into()),
        None => StatisticsResponse::NoData { message: "No results found".to_string() },
    };
    Ok(Json(response))
}

async fn update_result(
    State(state): State<AppState>,
    Path(result_id): Path<String>,
    Json(payload): Json<ResultUpdate>,
) -> Result<Json<UpdateResultResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let mut record = results::find_by_id(state.db(), &result_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load result"))?
        .ok_or_else(|| ApiError::NotFound(format!("Result with ID {result_id} not found")))?;

    if let Some(student_id) = &payload.student_id {
        let student = students::find_by_id(state.db(), student_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load student"))?;
        if student.is_none() {
            return Err(ApiError::NotFound(format!("Student ID {student_id} not found")));
        }
    }

    apply_update(&mut record, payload);
    if record.marks > record.max_marks {
        return Err(ApiError::BadRequest("marks cannot exceed max_marks".to_string()));
    }
    record.updated_at = primitive_now_utc();

    results::update_record(state.db(), &record).await.map_err(update_storage_error)?;

    tracing::info!(result_id = %record.id, "Result updated");

    Ok(Json(UpdateResultResponse {
        message: "Result updated successfully".to_string(),
        grade: record.grade,
    }))
}

async fn delete_result(
    State(state): State<AppState>,
    Path(result_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let removed = results::delete_by_id(state.db(), &result_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete result"))?;

    if removed == 0 {
        return Err(ApiError::NotFound(format!("Result with ID {result_id} not found")));
    }

    tracing::info!(result_id = %result_id, "Result deleted");

    Ok(Json(MessageResponse { message: "Result deleted successfully".to_string() }))
}

async fn class_rows(
    state: &AppState,
    class_name: String,
) -> Result<Vec<StudentResultRow>, ApiError> {
    let rows = results::list_all_with_students(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list results"))?;
    let filters =
        ResultFilters { class_name: Some(class_name), ..ResultFilters::default() };
    Ok(result_filters::apply(rows, &filters))
}

/// Merges the supplied fields into the stored record. The grade is always
/// recomputed from the merged marks so it can never drift from them.
fn apply_update(record: &mut ResultRecord, update: ResultUpdate) {
    if let Some(student_id) = update.student_id {
        record.student_id = student_id;
    }
    if let Some(subject) = update.subject {
        record.subject = subject;
    }
    if let Some(marks) = update.marks {
        record.marks = marks;
    }
    if let Some(max_marks) = update.max_marks {
        record.max_marks = max_marks;
    }
    if let Some(exam_type) = update.exam_type {
        record.exam_type = exam_type;
    }
    if let Some(remarks) = update.remarks {
        record.remarks = remarks;
    }
    if let Some(academic_year) = update.academic_year {
        record.academic_year = academic_year;
    }
    if let Some(date) = update.date {
        record.date = date;
    }
    record.grade = grading::grade_for(record.marks, record.max_marks).to_string();
}

fn query_to_filters(query: ListResultsQuery) -> Result<ResultFilters, ApiError> {
    Ok(ResultFilters {
        class_name: query.class_name,
        subject: query.subject,
        exam_type: query.exam_type,
        academic_year: query.academic_year,
        date_from: parse_query_date("date_from", query.date_from)?,
        date_to: parse_query_date("date_to", query.date_to)?,
    })
}

fn parse_query_date(field: &str, value: Option<String>) -> Result<Option<Date>, ApiError> {
    match value {
        Some(raw) => parse_date(&raw)
            .map(Some)
            .ok_or_else(|| ApiError::BadRequest(format!("invalid {field}: {raw}"))),
        None => Ok(None),
    }
}

// Moving a record onto another record's (student, subject, exam type,
// academic year) key trips the same unique index as a duplicate upload.
fn update_storage_error(err: sqlx::Error) -> ApiError {
    if results::is_unique_violation(&err) {
        ApiError::Conflict(
            "Result already exists for this student, subject, and exam type".to_string(),
        )
    } else {
        ApiError::internal(err, "Failed to update result")
    }
}

fn ingest_error_to_api(err: IngestError) -> ApiError {
    match err {
        IngestError::Validation(message) => ApiError::BadRequest(message),
        IngestError::StudentNotFound(student_id) => {
            ApiError::NotFound(format!("Student ID {student_id} not found"))
        }
        IngestError::Duplicate => ApiError::Conflict(
            "Result already exists for this student, subject, and exam type".to_string(),
        ),
        IngestError::Storage(err) => ApiError::internal(err, "Failed to store result"),
    }
}
