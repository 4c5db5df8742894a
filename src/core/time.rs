use time::{macros::format_description, Date, OffsetDateTime, PrimitiveDateTime};

const DATE_FORMAT: &[time::format_description::FormatItem<'static>] =
    format_description!("[year]-[month]-[day]");

pub(crate) fn primitive_now_utc() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}

pub(crate) fn today_utc() -> Date {
    OffsetDateTime::now_utc().date()
}

pub(crate) fn format_date(value: Date) -> String {
    value.format(&DATE_FORMAT).unwrap_or_else(|_| value.to_string())
}

pub(crate) fn parse_date(raw: &str) -> Option<Date> {
    Date::parse(raw, &DATE_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Month;

    #[test]
    fn format_date_is_calendar_text() {
        let date = Date::from_calendar_date(2025, Month::September, 5).unwrap();
        assert_eq!(format_date(date), "2025-09-05");
    }

    #[test]
    fn parse_date_roundtrip() {
        let parsed = parse_date("2025-09-05").expect("date");
        assert_eq!(parsed, Date::from_calendar_date(2025, Month::September, 5).unwrap());
        assert!(parse_date("2025-9-5").is_none());
        assert!(parse_date("not-a-date").is_none());
    }
}
