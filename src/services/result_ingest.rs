use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::core::config::SchoolSettings;
use crate::core::time::{primitive_now_utc, today_utc};
use crate::db::models::ResultRecord;
use crate::repositories::{results, students};
use crate::schemas::result::ResultUpload;
use crate::services::grading;

#[derive(Debug, thiserror::Error)]
pub(crate) enum IngestError {
    #[error("{0}")]
    Validation(String),
    #[error("Student ID {0} not found")]
    StudentNotFound(String),
    #[error("Result already exists for this student, subject, and exam type")]
    Duplicate,
    #[error(transparent)]
    Storage(#[from] sqlx::Error),
}

/// Validates, defaults, and persists a single submission. The pre-flight
/// existence check gives the friendly duplicate message; the unique index
/// remains authoritative under concurrent submissions, so a 23505 from the
/// insert itself also maps to `Duplicate`.
pub(crate) async fn ingest_result(
    pool: &PgPool,
    payload: ResultUpload,
    school: &SchoolSettings,
    uploaded_by: &str,
) -> Result<ResultRecord, IngestError> {
    payload.validate().map_err(|err| IngestError::Validation(err.to_string()))?;
    if payload.marks > payload.max_marks {
        return Err(IngestError::Validation("marks cannot exceed max_marks".to_string()));
    }

    let student = students::find_by_id(pool, &payload.student_id)
        .await?
        .ok_or_else(|| IngestError::StudentNotFound(payload.student_id.clone()))?;

    let exam_type =
        payload.exam_type.unwrap_or_else(|| school.default_exam_type.clone());
    let academic_year =
        payload.academic_year.unwrap_or_else(|| school.default_academic_year.clone());
    let remarks = payload.remarks.unwrap_or_default();
    let date = payload.date.unwrap_or_else(today_utc);

    if results::exists_for_key(pool, &student.id, &payload.subject, &exam_type, &academic_year)
        .await?
    {
        return Err(IngestError::Duplicate);
    }

    let now = primitive_now_utc();
    let created = results::create(
        pool,
        results::CreateResult {
            id: &Uuid::new_v4().to_string(),
            student_id: &student.id,
            subject: &payload.subject,
            marks: payload.marks,
            max_marks: payload.max_marks,
            grade: grading::grade_for(payload.marks, payload.max_marks),
            exam_type: &exam_type,
            remarks: &remarks,
            academic_year: &academic_year,
            date,
            uploaded_by,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|err| {
        if results::is_unique_violation(&err) {
            IngestError::Duplicate
        } else {
            IngestError::Storage(err)
        }
    })?;

    Ok(created)
}

#[derive(Debug, Default)]
pub(crate) struct BulkOutcome {
    pub(crate) total_records: usize,
    pub(crate) success_count: usize,
    pub(crate) fail_count: usize,
    pub(crate) errors: Vec<String>,
}

impl BulkOutcome {
    fn record_success(&mut self) {
        self.total_records += 1;
        self.success_count += 1;
    }

    fn record_failure(&mut self, reason: String) {
        self.total_records += 1;
        self.fail_count += 1;
        self.errors.push(reason);
    }
}

/// Processes every record in order and never aborts early; each failure is
/// tallied with a reason and the rest of the batch continues. Records are
/// taken as raw JSON so one malformed entry cannot poison its neighbours.
pub(crate) async fn ingest_batch(
    pool: &PgPool,
    records: Vec<serde_json::Value>,
    school: &SchoolSettings,
    uploaded_by: &str,
) -> BulkOutcome {
    let mut outcome = BulkOutcome::default();

    for record in records {
        let payload = match serde_json::from_value::<ResultUpload>(record) {
            Ok(payload) => payload,
            Err(err) => {
                outcome.record_failure(format!("Error processing record: {err}"));
                continue;
            }
        };

        let student_id = payload.student_id.clone();
        let subject = payload.subject.clone();
        match ingest_result(pool, payload, school, uploaded_by).await {
            Ok(_) => outcome.record_success(),
            Err(err) => outcome.record_failure(failure_message(&err, &student_id, &subject)),
        }
    }

    outcome
}

fn failure_message(err: &IngestError, student_id: &str, subject: &str) -> String {
    match err {
        IngestError::Duplicate => {
            format!("Duplicate entry for Student ID: {student_id}, Subject: {subject}")
        }
        other => format!("Error processing record: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sqlx::PgPool;

    use crate::test_support;

    #[test]
    fn outcome_counts_stay_consistent() {
        let mut outcome = BulkOutcome::default();
        outcome.record_success();
        outcome.record_failure("Error processing record: boom".to_string());
        outcome.record_success();

        assert_eq!(outcome.total_records, 3);
        assert_eq!(outcome.success_count, 2);
        assert_eq!(outcome.fail_count, 1);
        assert_eq!(outcome.success_count + outcome.fail_count, outcome.total_records);
        assert_eq!(outcome.errors.len(), 1);
    }

    #[test]
    fn duplicate_failures_use_the_entry_format() {
        let message = failure_message(&IngestError::Duplicate, "s1", "Math");
        assert_eq!(message, "Duplicate entry for Student ID: s1, Subject: Math");
    }

    #[test]
    fn other_failures_use_the_processing_format() {
        let message =
            failure_message(&IngestError::StudentNotFound("s9".to_string()), "s9", "Math");
        assert_eq!(message, "Error processing record: Student ID s9 not found");

        let message = failure_message(
            &IngestError::Validation("marks cannot exceed max_marks".to_string()),
            "s1",
            "Math",
        );
        assert_eq!(message, "Error processing record: marks cannot exceed max_marks");
    }

    #[sqlx::test]
    async fn second_submission_for_same_key_is_rejected(pool: PgPool) {
        test_support::seed_student(&pool, "s1", "10-A").await;
        let school = test_support::school_settings();
        let payload: ResultUpload = serde_json::from_value(json!({
            "studentId": "s1",
            "subject": "Math",
            "marks": 88.0
        }))
        .expect("payload");

        ingest_result(&pool, payload.clone(), &school, "System").await.expect("first upload");
        let err = ingest_result(&pool, payload, &school, "System").await.expect_err("duplicate");
        assert!(matches!(err, IngestError::Duplicate));
    }

    #[sqlx::test]
    async fn duplicate_key_matches_case_insensitively(pool: PgPool) {
        test_support::seed_student(&pool, "s1", "10-A").await;
        let school = test_support::school_settings();
        let first: ResultUpload = serde_json::from_value(json!({
            "studentId": "s1",
            "subject": "Math",
            "marks": 88.0
        }))
        .expect("payload");
        ingest_result(&pool, first, &school, "System").await.expect("first upload");

        // Same key up to casing: defaults resolve examType to "Mid-term".
        let recased: ResultUpload = serde_json::from_value(json!({
            "studentId": "s1",
            "subject": "MATH",
            "examType": "MID-TERM",
            "marks": 70.0
        }))
        .expect("payload");
        let err = ingest_result(&pool, recased, &school, "System").await.expect_err("duplicate");
        assert!(matches!(err, IngestError::Duplicate));
    }

    #[sqlx::test]
    async fn batch_continues_past_failures_and_tallies(pool: PgPool) {
        test_support::seed_student(&pool, "s1", "10-A").await;
        let school = test_support::school_settings();
        let records = vec![
            json!({"studentId": "s1", "subject": "Math", "marks": 88.0}),
            json!({"studentId": "s1", "subject": "Math", "marks": 70.0}),
            json!({"studentId": "s1", "subject": "Science", "marks": "ninety"}),
            json!({"studentId": "s9", "subject": "History", "marks": 50.0}),
        ];

        let outcome = ingest_batch(&pool, records, &school, "System").await;

        assert_eq!(outcome.total_records, 4);
        assert_eq!(outcome.success_count, 1);
        assert_eq!(outcome.fail_count, 3);
        assert_eq!(outcome.success_count + outcome.fail_count, outcome.total_records);
        assert_eq!(outcome.errors[0], "Duplicate entry for Student ID: s1, Subject: Math");
        assert!(outcome.errors[1].starts_with("Error processing record:"));
        assert_eq!(outcome.errors[2], "Error processing record: Student ID s9 not found");
    }

    #[test]
    fn validation_failures_carry_field_messages() {
        let payload: ResultUpload = serde_json::from_value(json!({
            "studentId": "",
            "subject": "",
            "marks": 50.0
        }))
        .expect("deserialize");
        let message = payload.validate().expect_err("invalid").to_string();
        assert!(message.contains("student_id must not be empty"));
        assert!(message.contains("subject must not be empty"));
    }
}
