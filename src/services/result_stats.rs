use std::collections::HashMap;

use crate::db::models::StudentResultRow;
use crate::services::grading;

/// Summary metrics over a (typically filtered) result set.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ResultStatistics {
    pub(crate) total_results: usize,
    pub(crate) average_percentage: String,
    pub(crate) highest_marks: f64,
    pub(crate) lowest_marks: f64,
    pub(crate) pass_count: usize,
    pub(crate) fail_count: usize,
    pub(crate) grade_distribution: HashMap<String, usize>,
}

/// Returns `None` for an empty input so callers surface a "no data"
/// payload instead of degenerate statistics.
pub(crate) fn compute(rows: &[StudentResultRow]) -> Option<ResultStatistics> {
    if rows.is_empty() {
        return None;
    }

    let mut percentage_sum = 0.0;
    let mut highest_marks = f64::NEG_INFINITY;
    let mut lowest_marks = f64::INFINITY;
    let mut pass_count = 0;
    let mut grade_distribution: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let percentage = grading::percentage(row.marks, row.max_marks);
        percentage_sum += percentage;
        highest_marks = highest_marks.max(row.marks);
        lowest_marks = lowest_marks.min(row.marks);
        if percentage >= grading::PASS_MARK_PERCENTAGE {
            pass_count += 1;
        }
        *grade_distribution.entry(row.grade.clone()).or_insert(0) += 1;
    }

    let average = percentage_sum / rows.len() as f64;

    Some(ResultStatistics {
        total_results: rows.len(),
        average_percentage: grading::format_percentage(average),
        highest_marks,
        lowest_marks,
        pass_count,
        fail_count: rows.len() - pass_count,
        grade_distribution,
    })
}
