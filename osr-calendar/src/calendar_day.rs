use crate::date_range::DateRange;
use crate::dates::month_abbrev;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::fmt;

/// Reference year used to lay out the 366-day template.
pub const LEAP_REFERENCE_YEAR: i32 = 2020;

/// Reference year used to lay out the 365-day template.
pub const COMMON_REFERENCE_YEAR: i32 = 2021;

/// A month/day pair with no year attached, the join key shared by every
/// per-year series.
///
/// Only pairs that exist in at least one Gregorian calendar variant can be
/// constructed, so Feb 29 is valid but Feb 30 is not. Ordering follows the
/// calendar (month first, then day).
#[derive(Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Copy, Clone, Serialize)]
pub struct CalendarDay {
    month: u32,
    day: u32,
}

impl CalendarDay {
    /// Feb 29, present only in the leap template.
    pub const LEAP_DAY: CalendarDay = CalendarDay { month: 2, day: 29 };

    /// Create a CalendarDay, returning `None` if the pair does not exist in
    /// the leap reference year.
    pub fn from_md_opt(month: u32, day: u32) -> Option<CalendarDay> {
        NaiveDate::from_ymd_opt(LEAP_REFERENCE_YEAR, month, day).map(|_| CalendarDay { month, day })
    }

    /// Create a CalendarDay from a pair known to be valid.
    ///
    /// # Panics
    ///
    /// Panics if the pair is not a Gregorian month/day. Callers parsing
    /// untrusted input should use [`CalendarDay::from_md_opt`].
    pub fn new(month: u32, day: u32) -> CalendarDay {
        match CalendarDay::from_md_opt(month, day) {
            Some(calendar_day) => calendar_day,
            None => panic!("invalid calendar day: {month}/{day}"),
        }
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn is_leap_day(&self) -> bool {
        *self == CalendarDay::LEAP_DAY
    }

    /// 1-based position in the 366-day template.
    pub fn ordinal_leap(&self) -> u32 {
        self.reference_date(LEAP_REFERENCE_YEAR)
            .map(|date| date.ordinal())
            .unwrap_or_default()
    }

    /// 1-based position in the 365-day template; `None` for Feb 29.
    pub fn ordinal_nonleap(&self) -> Option<u32> {
        self.reference_date(COMMON_REFERENCE_YEAR)
            .map(|date| date.ordinal())
    }

    /// Place this month/day in a concrete year. `None` for Feb 29 of a
    /// common year.
    pub fn in_year(&self, year: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, self.month, self.day)
    }

    fn reference_date(&self, reference_year: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(reference_year, self.month, self.day)
    }
}

impl From<NaiveDate> for CalendarDay {
    fn from(value: NaiveDate) -> Self {
        CalendarDay {
            month: value.month(),
            day: value.day(),
        }
    }
}

impl From<&NaiveDate> for CalendarDay {
    fn from(value: &NaiveDate) -> Self {
        (*value).into()
    }
}

/// Renders as `Apr-15`, the label used on chart axes.
impl fmt::Display for CalendarDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", month_abbrev(self.month), self.day)
    }
}

/// Build the canonical Jan 1 - Dec 31 sequence of calendar days.
///
/// With `include_leap_day` the sequence has 366 entries, otherwise 365 with
/// Feb 29 left out. The layout comes from fixed reference years so the result
/// never depends on today's date.
pub fn build_calendar(include_leap_day: bool) -> Vec<CalendarDay> {
    let reference_year = if include_leap_day {
        LEAP_REFERENCE_YEAR
    } else {
        COMMON_REFERENCE_YEAR
    };
    DateRange::calendar_year(reference_year)
        .map(|range| range.map(CalendarDay::from).collect())
        .unwrap_or_default()
}

/// The template matching `year`'s leap-ness.
pub fn calendar_for_year(year: i32) -> Vec<CalendarDay> {
    build_calendar(crate::dates::is_leap(year))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::is_leap;

    #[test]
    fn test_build_calendar_lengths() {
        assert_eq!(build_calendar(true).len(), 366);
        assert_eq!(build_calendar(false).len(), 365);
    }

    #[test]
    fn test_common_calendar_has_no_leap_day() {
        let calendar = build_calendar(false);
        assert!(!calendar.contains(&CalendarDay::LEAP_DAY));
        assert!(build_calendar(true).contains(&CalendarDay::LEAP_DAY));
    }

    #[test]
    fn test_calendar_matches_leapness_for_every_year() {
        for year in 1900..=2100 {
            let calendar = calendar_for_year(year);
            let expected = if is_leap(year) { 366 } else { 365 };
            assert_eq!(calendar.len(), expected, "year {year}");
            assert_eq!(calendar.contains(&CalendarDay::LEAP_DAY), is_leap(year));
        }
    }

    #[test]
    fn test_calendar_is_sorted_and_unique() {
        let calendar = build_calendar(true);
        assert!(calendar.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(calendar.first(), Some(&CalendarDay::new(1, 1)));
        assert_eq!(calendar.last(), Some(&CalendarDay::new(12, 31)));
    }

    #[test]
    fn test_ordinals() {
        let march_first = CalendarDay::new(3, 1);
        assert_eq!(march_first.ordinal_leap(), 61);
        assert_eq!(march_first.ordinal_nonleap(), Some(60));
        assert_eq!(CalendarDay::LEAP_DAY.ordinal_leap(), 60);
        assert_eq!(CalendarDay::LEAP_DAY.ordinal_nonleap(), None);
    }

    #[test]
    fn test_from_md_opt_rejects_impossible_days() {
        assert!(CalendarDay::from_md_opt(2, 30).is_none());
        assert!(CalendarDay::from_md_opt(13, 1).is_none());
        assert!(CalendarDay::from_md_opt(4, 31).is_none());
        assert!(CalendarDay::from_md_opt(2, 29).is_some());
    }

    #[test]
    #[should_panic(expected = "invalid calendar day")]
    fn test_new_panics_on_invalid_pair() {
        let _ = CalendarDay::new(6, 31);
    }

    #[test]
    fn test_in_year_and_label() {
        assert!(CalendarDay::LEAP_DAY.in_year(2023).is_none());
        assert_eq!(
            CalendarDay::new(4, 15).in_year(2023),
            NaiveDate::from_ymd_opt(2023, 4, 15)
        );
        assert_eq!(CalendarDay::new(4, 5).to_string(), "Apr-5");
    }
}
