//! Calendar template and date helpers shared by the OSR crates.
//!
//! Every per-year series is keyed on a [`CalendarDay`] (month and day, no
//! year) so that decades of observations can be overlaid on one axis.
//!
//! ```
//! use osr_calendar::{build_calendar, CalendarDay};
//!
//! let common = build_calendar(false);
//! assert_eq!(common.len(), 365);
//! assert!(!common.contains(&CalendarDay::LEAP_DAY));
//! ```

pub mod calendar_day;
pub mod date_range;

pub use calendar_day::{
    build_calendar, calendar_for_year, CalendarDay, COMMON_REFERENCE_YEAR, LEAP_REFERENCE_YEAR,
};
pub use date_range::DateRange;

/// Date utility functions
pub mod dates {
    use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};

    const MONTH_ABBREVIATIONS: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];

    /// Format a NaiveDate as "YYYY-MM-DD"
    pub fn format_date(date: &NaiveDate) -> String {
        date.format("%Y-%m-%d").to_string()
    }

    /// Parse a date string in "YYYY-MM-DD" format
    pub fn parse_date(s: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
    }

    pub fn is_leap(year: i32) -> bool {
        NaiveDate::from_ymd_opt(year, 2, 29).is_some()
    }

    /// Day of the year counted from Jan 1 = 1. Feb 29 is counted like any
    /// other day, so dates after it sit one higher in leap years.
    pub fn day_of_year(date: &NaiveDate) -> u32 {
        date.ordinal()
    }

    /// Three-letter English abbreviation for a 1-based month.
    pub fn month_abbrev(month: u32) -> &'static str {
        match month {
            1..=12 => MONTH_ABBREVIATIONS[(month - 1) as usize],
            _ => "???",
        }
    }

    /// Parse a three-letter month abbreviation ("Apr", "apr", "APR").
    pub fn parse_month_abbrev(s: &str) -> Option<u32> {
        let s = s.trim();
        MONTH_ABBREVIATIONS
            .iter()
            .position(|abbrev| abbrev.eq_ignore_ascii_case(s))
            .map(|index| index as u32 + 1)
    }

    /// Parse a US-style slash date, "M/D/YYYY" or "M/D", returning the month
    /// and day. The year part, if any, is returned separately so the caller
    /// can check it against the file's year.
    pub fn parse_slash_date(s: &str) -> Option<(u32, u32, Option<i32>)> {
        let mut parts = s.trim().split('/');
        let month = parts.next()?.trim().parse::<u32>().ok()?;
        let day = parts.next()?.trim().parse::<u32>().ok()?;
        let year = match parts.next() {
            Some(y) => Some(y.trim().parse::<i32>().ok()?),
            None => None,
        };
        if parts.next().is_some() {
            return None;
        }
        Some((month, day, year))
    }

    /// Parse a sighting timestamp.
    ///
    /// Accepts ISO-8601 with a `T` separator, optional fractional seconds and
    /// a trailing `Z` ("2021-05-03T12:34:56.789Z"), the space separated form
    /// with or without seconds, and a bare date (read as midnight).
    pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
        let cleaned = s.trim().replace('T', " ").replace('Z', "");
        let cleaned = match cleaned.split_once('.') {
            Some((head, _fraction)) => head.to_string(),
            None => cleaned,
        };
        NaiveDateTime::parse_from_str(&cleaned, "%Y-%m-%d %H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(&cleaned, "%Y-%m-%d %H:%M"))
            .ok()
            .or_else(|| parse_date(&cleaned).map(|date| date.and_time(NaiveTime::MIN)))
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use chrono::NaiveDate;

        #[test]
        fn test_is_leap() {
            assert!(is_leap(2020));
            assert!(is_leap(2000));
            assert!(!is_leap(1900));
            assert!(!is_leap(2023));
        }

        #[test]
        fn test_day_of_year_is_one_based() {
            let jan1 = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
            assert_eq!(day_of_year(&jan1), 1);
            let mar1_leap = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
            assert_eq!(day_of_year(&mar1_leap), 61);
            let mar1 = NaiveDate::from_ymd_opt(2023, 3, 1).unwrap();
            assert_eq!(day_of_year(&mar1), 60);
        }

        #[test]
        fn test_month_abbrev_round_trip() {
            for month in 1..=12 {
                assert_eq!(parse_month_abbrev(month_abbrev(month)), Some(month));
            }
            assert_eq!(parse_month_abbrev("sep"), Some(9));
            assert_eq!(parse_month_abbrev(" AUG "), Some(8));
            assert_eq!(parse_month_abbrev("Sept"), None);
        }

        #[test]
        fn test_parse_slash_date() {
            assert_eq!(parse_slash_date("6/15/2024"), Some((6, 15, Some(2024))));
            assert_eq!(parse_slash_date("6/15"), Some((6, 15, None)));
            assert_eq!(parse_slash_date("June 15"), None);
            assert_eq!(parse_slash_date("6/15/2024/1"), None);
        }

        #[test]
        fn test_parse_timestamp_variants() {
            let expected = NaiveDate::from_ymd_opt(2021, 5, 3)
                .unwrap()
                .and_hms_opt(12, 34, 56)
                .unwrap();
            assert_eq!(parse_timestamp("2021-05-03T12:34:56.789Z"), Some(expected));
            assert_eq!(parse_timestamp("2021-05-03 12:34:56"), Some(expected));
            assert_eq!(
                parse_timestamp("2021-05-03 12:34"),
                NaiveDate::from_ymd_opt(2021, 5, 3).unwrap().and_hms_opt(12, 34, 0)
            );
            assert_eq!(
                parse_timestamp("2021-05-03"),
                NaiveDate::from_ymd_opt(2021, 5, 3).unwrap().and_hms_opt(0, 0, 0)
            );
            assert_eq!(parse_timestamp("yesterday"), None);
        }

        #[test]
        fn test_format_and_parse() {
            let date = NaiveDate::from_ymd_opt(2023, 6, 15).unwrap();
            let formatted = format_date(&date);
            assert_eq!(formatted, "2023-06-15");
            assert_eq!(parse_date(&formatted), Some(date));
        }
    }
}
