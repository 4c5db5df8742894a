use time::Date;

use crate::db::models::StudentResultRow;

/// Optional filter criteria composed with logical AND. Absent criteria
/// impose no constraint; filtering preserves the input's relative order.
#[derive(Debug, Default, Clone)]
pub(crate) struct ResultFilters {
    pub(crate) class_name: Option<String>,
    pub(crate) subject: Option<String>,
    pub(crate) exam_type: Option<String>,
    pub(crate) academic_year: Option<String>,
    pub(crate) date_from: Option<Date>,
    pub(crate) date_to: Option<Date>,
}

impl ResultFilters {
    pub(crate) fn matches(&self, row: &StudentResultRow) -> bool {
        if let Some(class_name) = &self.class_name {
            if row.class_name != *class_name {
                return false;
            }
        }

        if let Some(subject) = &self.subject {
            if !eq_ignore_case(&row.subject, subject) {
                return false;
            }
        }

        if let Some(exam_type) = &self.exam_type {
            if !eq_ignore_case(&row.exam_type, exam_type) {
                return false;
            }
        }

        if let Some(academic_year) = &self.academic_year {
            if row.academic_year != *academic_year {
                return false;
            }
        }

        if let Some(date_from) = self.date_from {
            if row.date < date_from {
                return false;
            }
        }

        if let Some(date_to) = self.date_to {
            if row.date > date_to {
                return false;
            }
        }

        true
    }
}

pub(crate) fn apply(rows: Vec<StudentResultRow>, filters: &ResultFilters) -> Vec<StudentResultRow> {
    rows.into_iter().filter(|row| filters.matches(row)).collect()
}

// Same folding Postgres LOWER() applies in the duplicate-key index.
fn eq_ignore_case(left: &str, right: &str) -> bool {
    left.to_lowercase() == right.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_row;
    use time::macros::date;

    #[test]
    fn no_criteria_passes_everything_through() {
        let rows = vec![
            sample_row("r1", "s1", "10-A", "Math", 95.0, 100.0),
            sample_row("r2", "s2", "10-B", "Science", 45.0, 100.0),
        ];
        let filtered = apply(rows, &ResultFilters::default());
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn academic_year_is_exact_and_order_preserving() {
        let mut current = sample_row("r1", "s1", "10-A", "Math", 95.0, 100.0);
        current.academic_year = "2025-26".to_string();
        let mut previous = sample_row("r2", "s2", "10-A", "Math", 45.0, 100.0);
        previous.academic_year = "2024-25".to_string();
        let mut current_again = sample_row("r3", "s3", "10-A", "Math", 20.0, 100.0);
        current_again.academic_year = "2025-26".to_string();

        let filters = ResultFilters {
            academic_year: Some("2025-26".to_string()),
            ..ResultFilters::default()
        };
        let filtered = apply(vec![current, previous, current_again], &filters);

        let ids: Vec<&str> = filtered.iter().map(|row| row.id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "r3"]);
    }

    #[test]
    fn subject_and_exam_type_match_case_insensitively() {
        let rows = vec![
            sample_row("r1", "s1", "10-A", "MATH", 95.0, 100.0),
            sample_row("r2", "s2", "10-A", "Science", 45.0, 100.0),
        ];

        let filters =
            ResultFilters { subject: Some("math".to_string()), ..ResultFilters::default() };
        let filtered = apply(rows, &filters);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "r1");

        let rows = vec![sample_row("r1", "s1", "10-A", "Math", 95.0, 100.0)];
        let filters =
            ResultFilters { exam_type: Some("mid-TERM".to_string()), ..ResultFilters::default() };
        assert_eq!(apply(rows, &filters).len(), 1);
    }

    #[test]
    fn class_name_is_case_sensitive_exact_match() {
        let rows = vec![sample_row("r1", "s1", "10-A", "Math", 95.0, 100.0)];
        let filters =
            ResultFilters { class_name: Some("10-a".to_string()), ..ResultFilters::default() };
        assert!(apply(rows, &filters).is_empty());
    }

    #[test]
    fn date_bounds_are_inclusive() {
        let mut row = sample_row("r1", "s1", "10-A", "Math", 95.0, 100.0);
        row.date = date!(2026 - 03 - 15);

        let filters = ResultFilters {
            date_from: Some(date!(2026 - 03 - 15)),
            date_to: Some(date!(2026 - 03 - 15)),
            ..ResultFilters::default()
        };
        assert!(filters.matches(&row));

        let filters =
            ResultFilters { date_from: Some(date!(2026 - 03 - 16)), ..ResultFilters::default() };
        assert!(!filters.matches(&row));

        let filters =
            ResultFilters { date_to: Some(date!(2026 - 03 - 14)), ..ResultFilters::default() };
        assert!(!filters.matches(&row));
    }

    #[test]
    fn criteria_compose_with_and() {
        let rows = vec![
            sample_row("r1", "s1", "10-A", "Math", 95.0, 100.0),
            sample_row("r2", "s2", "10-A", "Science", 45.0, 100.0),
            sample_row("r3", "s3", "10-B", "Math", 20.0, 100.0),
        ];

        let filters = ResultFilters {
            class_name: Some("10-A".to_string()),
            subject: Some("Math".to_string()),
            ..ResultFilters::default()
        };
        let filtered = apply(rows, &filters);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "r1");
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let filters =
            ResultFilters { subject: Some("Math".to_string()), ..ResultFilters::default() };
        assert!(apply(Vec::new(), &filters).is_empty());
    }
}
