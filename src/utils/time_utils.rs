use chrono::{DateTime, Days, Local, NaiveDate, NaiveDateTime};

use crate::config::DASHBOARD;

pub use web_time::Instant as AppInstant;

pub struct TimeUtils;

impl TimeUtils {
    pub const STANDARD_TIME_FORMAT: &'static str = "%Y-%m-%d";
    pub const DATETIME_INPUT_FORMAT: &'static str = "%Y-%m-%dT%H:%M:%S";
}

/// Why a raw date string was refused at the input boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateInputError {
    Empty,
    Unparseable(String),
}

impl std::fmt::Display for DateInputError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            DateInputError::Empty => write!(f, "empty date input"),
            DateInputError::Unparseable(raw) => write!(f, "unparseable date input: {:?}", raw),
        }
    }
}

impl std::error::Error for DateInputError {}

// Date helper functions

pub fn today_local() -> NaiveDate {
    Local::now().date_naive()
}

/// Latest day the rate API reliably has data for (today's set may not be published yet).
pub fn yesterday(today: NaiveDate) -> NaiveDate {
    today.pred_opt().unwrap_or(today)
}

/// Rolling lower bound, `DASHBOARD.dates.rolling_min_days` before `today`.
pub fn min_date(today: NaiveDate) -> NaiveDate {
    today
        .checked_sub_days(Days::new(DASHBOARD.dates.rolling_min_days.unsigned_abs()))
        .unwrap_or(NaiveDate::MIN)
}

pub fn earliest_supported_date() -> NaiveDate {
    NaiveDate::parse_from_str(
        DASHBOARD.dates.earliest_supported_date,
        TimeUtils::STANDARD_TIME_FORMAT,
    )
    .unwrap_or(NaiveDate::MIN)
}

pub fn clamp_date(date: NaiveDate, min: NaiveDate, max: NaiveDate) -> NaiveDate {
    if date < min {
        return min;
    }
    if date > max {
        return max;
    }
    date
}

/// YYYY-MM-DD for date inputs. `None` (an invalid date upstream) formats to an empty string.
pub fn format_date_for_input(date: Option<NaiveDate>) -> String {
    match date {
        Some(d) => d.format(TimeUtils::STANDARD_TIME_FORMAT).to_string(),
        None => String::new(),
    }
}

/// Accepts `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS` or RFC 3339. Time-of-day is discarded.
pub fn parse_date_input(raw: &str) -> Result<NaiveDate, DateInputError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DateInputError::Empty);
    }

    if let Ok(d) = NaiveDate::parse_from_str(trimmed, TimeUtils::STANDARD_TIME_FORMAT) {
        return Ok(d);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, TimeUtils::DATETIME_INPUT_FORMAT) {
        return Ok(dt.date());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.date_naive());
    }

    Err(DateInputError::Unparseable(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn yesterday_crosses_month_and_year() {
        assert_eq!(yesterday(ymd(2025, 11, 22)), ymd(2025, 11, 21));
        assert_eq!(yesterday(ymd(2025, 3, 1)), ymd(2025, 2, 28));
        assert_eq!(yesterday(ymd(2025, 1, 1)), ymd(2024, 12, 31));
    }

    #[test]
    fn min_date_is_ninety_days_back() {
        assert_eq!(min_date(ymd(2025, 11, 22)), ymd(2025, 8, 24));
        assert_eq!(min_date(ymd(2025, 2, 15)), ymd(2024, 11, 17));
    }

    #[test]
    fn clamp_date_respects_bounds() {
        let min = ymd(2024, 4, 1);
        let max = ymd(2025, 11, 22);
        assert_eq!(clamp_date(ymd(2025, 6, 15), min, max), ymd(2025, 6, 15));
        assert_eq!(clamp_date(ymd(2024, 1, 1), min, max), min);
        assert_eq!(clamp_date(ymd(2026, 1, 1), min, max), max);

        let single = ymd(2025, 6, 15);
        assert_eq!(clamp_date(ymd(2025, 6, 14), single, single), single);
        assert_eq!(clamp_date(ymd(2025, 6, 16), single, single), single);
    }

    #[test]
    fn format_pads_and_handles_missing_date() {
        assert_eq!(format_date_for_input(Some(ymd(2025, 3, 5))), "2025-03-05");
        assert_eq!(format_date_for_input(None), "");
    }

    #[test]
    fn parse_discards_time_of_day() {
        let morning = parse_date_input("2025-11-22T08:00:00").unwrap();
        let evening = parse_date_input("2025-11-22T20:00:00Z").unwrap();
        assert_eq!(morning, evening);
        assert_eq!(morning, ymd(2025, 11, 22));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(parse_date_input("   "), Err(DateInputError::Empty));
        assert!(matches!(
            parse_date_input("2025-13-40"),
            Err(DateInputError::Unparseable(_))
        ));
        assert!(parse_date_input("invalid").is_err());
    }

    #[test]
    fn earliest_supported_date_parses_constant() {
        assert_eq!(earliest_supported_date(), ymd(2024, 4, 1));
    }

    #[quickcheck_macros::quickcheck]
    fn format_round_trips_valid_dates(offset: u16) -> bool {
        let date = ymd(2024, 4, 1) + chrono::Duration::days(i64::from(offset % 2000));
        let text = format_date_for_input(Some(date));
        format_date_for_input(parse_date_input(&text).ok()) == text
    }
}
