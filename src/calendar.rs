//! Calendar helpers for date-range downloads
//!
//! Dates are `NaiveDate` values stepped one calendar day at a time, so the
//! host timezone and its DST transitions never affect the sequence.

use chrono::{Local, NaiveDate};

/// Every calendar date from `start` to `end`, inclusive.
///
/// Returns an empty list when `start` is after `end`.
pub fn enumerate_dates(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    if start > end {
        return Vec::new();
    }
    start.iter_days().take_while(|date| *date <= end).collect()
}

/// The day before `today`
pub fn day_before(today: NaiveDate) -> NaiveDate {
    today.pred_opt().unwrap_or(today)
}

/// Yesterday in the local calendar of the invoking process
pub fn yesterday() -> NaiveDate {
    day_before(Local::now().date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_inclusive_range() {
        let dates = enumerate_dates(date(2025, 1, 1), date(2025, 1, 3));
        let formatted: Vec<String> = dates.iter().map(|d| d.to_string()).collect();
        assert_eq!(formatted, vec!["2025-01-01", "2025-01-02", "2025-01-03"]);
    }

    #[test]
    fn test_single_day_and_empty_range() {
        assert_eq!(enumerate_dates(date(2025, 1, 1), date(2025, 1, 1)), vec![date(2025, 1, 1)]);
        assert!(enumerate_dates(date(2025, 1, 2), date(2025, 1, 1)).is_empty());
    }

    #[test]
    fn test_no_gaps_across_dst_and_leap_day() {
        // US and EU DST switches in March, plus a leap day
        let dates = enumerate_dates(date(2024, 2, 27), date(2024, 4, 2));
        assert_eq!(dates.len(), 36);
        for pair in dates.windows(2) {
            assert_eq!(pair[1], pair[0].succ_opt().unwrap());
        }
        assert!(dates.contains(&date(2024, 2, 29)));
    }

    #[test]
    fn test_year_boundary() {
        let dates = enumerate_dates(date(2024, 12, 30), date(2025, 1, 2));
        assert_eq!(dates.len(), 4);
        assert_eq!(day_before(date(2025, 1, 1)), date(2024, 12, 31));
    }

    #[test]
    fn test_yesterday_is_before_today() {
        assert!(yesterday() < Local::now().date_naive());
    }
}
