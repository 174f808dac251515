use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::utils::{DateInputError, TimeUtils, parse_date_input};

/// Canonical calendar-day identifier. Two date-like values map to the same key
/// iff they fall on the same calendar day; time-of-day never participates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayKey(NaiveDate);

impl DayKey {
    /// Key of any chrono date-like value (`NaiveDate`, `NaiveDateTime`, `DateTime<Tz>`).
    pub fn of<D: Datelike>(date: &D) -> Self {
        // Datelike guarantees a valid (year, ordinal) pair.
        match NaiveDate::from_yo_opt(date.year(), date.ordinal()) {
            Some(d) => Self(d),
            None => Self(NaiveDate::MIN),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    /// Day before, saturating at the calendar minimum.
    pub fn pred(&self) -> Self {
        Self(self.0.pred_opt().unwrap_or(self.0))
    }

    pub fn succ(&self) -> Self {
        Self(self.0.succ_opt().unwrap_or(self.0))
    }
}

impl From<NaiveDate> for DayKey {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl std::str::FromStr for DayKey {
    type Err = DateInputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_date_input(s).map(Self)
    }
}

impl std::fmt::Display for DayKey {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0.format(TimeUtils::STANDARD_TIME_FORMAT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, TimeZone, Utc};

    #[test]
    fn time_of_day_is_discarded() {
        let date = NaiveDate::from_ymd_opt(2025, 11, 22).unwrap();
        let morning = date.and_time(NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        let evening = Utc.with_ymd_and_hms(2025, 11, 22, 20, 0, 0).unwrap();

        assert_eq!(DayKey::of(&morning), DayKey::of(&evening));
        assert_eq!(DayKey::of(&morning), DayKey::from(date));
    }

    #[test]
    fn key_formats_as_iso_date() {
        let key: DayKey = "2025-03-05".parse().unwrap();
        assert_eq!(key.to_string(), "2025-03-05");
        assert_eq!((key.year(), key.month(), key.day()), (2025, 3, 5));
    }

    #[test]
    fn distinct_days_have_distinct_keys() {
        let key: DayKey = "2024-12-31".parse().unwrap();
        assert_ne!(key, key.succ());
        assert_eq!(key.succ().to_string(), "2025-01-01");
        assert_eq!(key.succ().pred(), key);
    }
}
