use chrono::Datelike;

use crate::config::DASHBOARD;
use crate::domain::DayKey;
use crate::utils::parse_date_input;

/// Consecutive calendar days ending at (and including) an anchor day, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DateWindow {
    days: Vec<DayKey>,
}

impl DateWindow {
    /// Window of `DASHBOARD.window_days` days ending on the anchor's calendar day.
    pub fn expand<D: Datelike>(anchor: &D) -> Self {
        Self::expand_with_len(anchor, DASHBOARD.window_days)
    }

    pub fn expand_with_len<D: Datelike>(anchor: &D, len: usize) -> Self {
        let last = DayKey::of(anchor);
        let mut days = Vec::with_capacity(len);
        let mut current = last;
        for _ in 0..len {
            days.push(current);
            current = current.pred();
        }
        days.reverse();
        Self { days }
    }

    pub fn days(&self) -> &[DayKey] {
        &self.days
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn first(&self) -> Option<DayKey> {
        self.days.first().copied()
    }

    /// The anchor day.
    pub fn last(&self) -> Option<DayKey> {
        self.days.last().copied()
    }

    pub fn contains(&self, day: &DayKey) -> bool {
        self.days.contains(day)
    }

    /// "<first> to <last>", or an empty string for an empty window.
    pub fn range_label(&self) -> String {
        match (self.first(), self.last()) {
            (Some(first), Some(last)) => format!("{} to {}", first, last),
            _ => String::new(),
        }
    }
}

/// Canonical key of a date-like value.
pub fn key_of<D: Datelike>(date: &D) -> DayKey {
    DayKey::of(date)
}

pub fn range_label<D: Datelike>(anchor: &D) -> String {
    DateWindow::expand(anchor).range_label()
}

/// Range label for raw input; unparseable input yields an empty string instead of an error.
pub fn range_label_for_input(raw: &str) -> String {
    parse_date_input(raw)
        .map(|anchor| range_label(&anchor))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn labels(window: &DateWindow) -> Vec<String> {
        window.days().iter().map(|d| d.to_string()).collect()
    }

    #[test]
    fn expands_seven_days_ending_on_anchor() {
        let anchor = NaiveDate::from_ymd_opt(2025, 11, 22).unwrap();
        let window = DateWindow::expand(&anchor);
        assert_eq!(
            labels(&window),
            vec![
                "2025-11-16",
                "2025-11-17",
                "2025-11-18",
                "2025-11-19",
                "2025-11-20",
                "2025-11-21",
                "2025-11-22"
            ]
        );
    }

    #[test]
    fn crosses_year_boundary() {
        let anchor = NaiveDate::from_ymd_opt(2025, 1, 3).unwrap();
        let window = DateWindow::expand(&anchor);
        assert_eq!(window.first().unwrap().to_string(), "2024-12-28");
        assert_eq!(window.last().unwrap().to_string(), "2025-01-03");
        assert_eq!(window.len(), 7);
    }

    #[test]
    fn crosses_month_boundary_in_leap_year() {
        let anchor = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let window = DateWindow::expand(&anchor);
        assert_eq!(window.range_label(), "2024-02-25 to 2024-03-02");
        assert!(window.contains(&"2024-02-29".parse().unwrap()));
    }

    #[test]
    fn range_label_tolerates_bad_input() {
        assert_eq!(range_label_for_input("2025-11-22"), "2025-11-16 to 2025-11-22");
        assert_eq!(range_label_for_input("2025-11-05"), "2025-10-30 to 2025-11-05");
        assert_eq!(range_label_for_input("not a date"), "");
    }

    #[test]
    fn key_of_matches_window_days() {
        let anchor = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let window = DateWindow::expand(&anchor);
        assert_eq!(window.last(), Some(key_of(&anchor)));
    }

    #[quickcheck_macros::quickcheck]
    fn windows_are_contiguous_and_ascending(offset: u16) -> bool {
        let anchor = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
            + chrono::Duration::days(i64::from(offset));
        let window = DateWindow::expand(&anchor);
        let days = window.days();
        days.len() == 7
            && days.last() == Some(&DayKey::from(anchor))
            && days.windows(2).all(|pair| pair[0].succ() == pair[1])
    }
}
