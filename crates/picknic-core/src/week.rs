//! Week arithmetic. Meal plans and shopping lists are keyed by the Monday
//! that starts their week, in UTC.

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};

/// The Monday on or before `date`. Sunday belongs to the week that started
/// six days earlier.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = u64::from(date.weekday().num_days_from_monday());
    date.checked_sub_days(Days::new(offset)).unwrap_or(date)
}

/// The Monday starting the UTC week that contains `at`.
pub fn week_start_utc(at: DateTime<Utc>) -> NaiveDate {
    week_start(at.date_naive())
}

/// Format a date the way HTML date inputs and the API expect (`YYYY-MM-DD`).
pub fn format_date_input_value(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a user-supplied date: `YYYY-MM-DD` or a full RFC 3339 timestamp
/// (converted to UTC).
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().or_else(|| {
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc).date_naive())
    })
}

/// Resolve an optional `weekStart` parameter to a week's Monday.
///
/// Any date inside the week is accepted. Missing or unparseable input falls
/// back to the week containing `today`.
pub fn resolve_week_start(param: Option<&str>, today: NaiveDate) -> NaiveDate {
    week_start(param.and_then(parse_date).unwrap_or(today))
}

/// Display name of the shopping list generated for a week.
pub fn shopping_list_name(week_start: NaiveDate) -> String {
    format!("Week of {}", format_date_input_value(week_start))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn monday_for_mid_week_date() {
        let at = DateTime::parse_from_rfc3339("2026-02-18T15:20:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(week_start_utc(at), date("2026-02-16"));
    }

    #[test]
    fn monday_for_sunday_date() {
        assert_eq!(week_start(date("2026-02-22")), date("2026-02-16"));
    }

    #[test]
    fn monday_is_its_own_week_start() {
        assert_eq!(week_start(date("2026-02-16")), date("2026-02-16"));
    }

    #[test]
    fn week_start_crosses_month_and_year() {
        assert_eq!(week_start(date("2026-01-01")), date("2025-12-29"));
    }

    #[test]
    fn formats_as_yyyy_mm_dd() {
        assert_eq!(format_date_input_value(date("2026-02-18")), "2026-02-18");
        assert_eq!(shopping_list_name(date("2026-02-16")), "Week of 2026-02-16");
    }

    #[test]
    fn parses_plain_dates_and_timestamps() {
        assert_eq!(parse_date("2026-02-18"), Some(date("2026-02-18")));
        assert_eq!(
            parse_date("2026-02-18T23:30:00-05:00"),
            Some(date("2026-02-19"))
        );
        assert_eq!(parse_date("next tuesday"), None);
    }

    #[test]
    fn resolve_falls_back_to_current_week() {
        let today = date("2026-03-05");
        assert_eq!(resolve_week_start(None, today), date("2026-03-02"));
        assert_eq!(resolve_week_start(Some("garbage"), today), date("2026-03-02"));
        assert_eq!(
            resolve_week_start(Some("2026-02-20"), today),
            date("2026-02-16")
        );
    }
}
