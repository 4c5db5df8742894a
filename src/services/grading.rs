/// Percentage at or above which a result counts as a pass (grade D or better).
pub(crate) const PASS_MARK_PERCENTAGE: f64 = 33.0;

// Ordered grade bands, inclusive lower bounds, evaluated top-down.
const GRADE_BANDS: &[(f64, &str)] = &[
    (90.0, "A+"),
    (80.0, "A"),
    (70.0, "B+"),
    (60.0, "B"),
    (50.0, "C+"),
    (40.0, "C"),
    (PASS_MARK_PERCENTAGE, "D"),
];

pub(crate) fn percentage(marks: f64, max_marks: f64) -> f64 {
    marks / max_marks * 100.0
}

pub(crate) fn grade_for_percentage(percentage: f64) -> &'static str {
    for (lower_bound, grade) in GRADE_BANDS {
        if percentage >= *lower_bound {
            return grade;
        }
    }
    "F"
}

pub(crate) fn grade_for(marks: f64, max_marks: f64) -> &'static str {
    grade_for_percentage(percentage(marks, max_marks))
}

pub(crate) fn format_percentage(value: f64) -> String {
    format!("{value:.2}")
}
