use crate::site::Site;
use chrono::NaiveDate;
use osr_calendar::CalendarDay;
use serde::Serialize;
use std::collections::BTreeMap;

/// One parsed row: the calendar day it was observed on and its value.
/// A `None` value is a day the source reported without a number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub day: CalendarDay,
    pub value: Option<f64>,
}

/// Whether the source file for a (site, year) could be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Availability {
    Available,
    Unavailable { reason: String },
}

/// A row dropped during parsing, kept so the caller can report it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowIssue {
    /// 1-based line in the source file.
    pub line: u64,
    pub reason: String,
}

/// One year of daily values for one site, in source row order.
///
/// Built once by the loader and never mutated. Row order is preserved
/// because peak tie-breaking depends on it.
#[derive(Debug, Clone, PartialEq)]
pub struct YearSeries {
    site: Site,
    year: i32,
    points: Vec<SeriesPoint>,
    availability: Availability,
    issues: Vec<RowIssue>,
}

impl YearSeries {
    pub fn new(site: Site, year: i32, points: Vec<SeriesPoint>, issues: Vec<RowIssue>) -> Self {
        YearSeries {
            site,
            year,
            points,
            availability: Availability::Available,
            issues,
        }
    }

    /// An all-null series standing in for a year whose file is missing.
    pub fn unavailable(site: Site, year: i32, reason: impl Into<String>) -> Self {
        YearSeries {
            site,
            year,
            points: Vec::new(),
            availability: Availability::Unavailable {
                reason: reason.into(),
            },
            issues: Vec::new(),
        }
    }

    pub fn site(&self) -> Site {
        self.site
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    pub fn availability(&self) -> &Availability {
        &self.availability
    }

    pub fn is_available(&self) -> bool {
        self.availability == Availability::Available
    }

    pub fn issues(&self) -> &[RowIssue] {
        &self.issues
    }

    /// Value on `day`. When a file repeats a day the first row wins.
    pub fn value_on(&self, day: CalendarDay) -> Option<f64> {
        self.points
            .iter()
            .find(|point| point.day == day)
            .and_then(|point| point.value)
    }

    /// Points placed in this series' year, in row order.
    pub fn dated_points(&self) -> impl Iterator<Item = (NaiveDate, Option<f64>)> + '_ {
        self.points
            .iter()
            .filter_map(|point| point.day.in_year(self.year).map(|date| (date, point.value)))
    }

    /// Non-null observations in row order.
    pub fn observations(&self) -> Vec<(NaiveDate, f64)> {
        self.dated_points()
            .filter_map(|(date, value)| value.map(|v| (date, v)))
            .collect()
    }

    /// Sum of the non-null values, `None` when there are none.
    pub fn total(&self) -> Option<f64> {
        let values: Vec<f64> = self.points.iter().filter_map(|point| point.value).collect();
        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum())
        }
    }
}

/// Per-year series for one site keyed by year number.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct YearArena {
    years: BTreeMap<i32, YearSeries>,
}

impl YearArena {
    pub fn new() -> Self {
        YearArena::default()
    }

    /// Insert a series, replacing any earlier series for the same year.
    pub fn insert(&mut self, series: YearSeries) {
        self.years.insert(series.year(), series);
    }

    pub fn get(&self, year: i32) -> Option<&YearSeries> {
        self.years.get(&year)
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.years.keys().copied()
    }

    /// Series in ascending year order.
    pub fn iter(&self) -> impl Iterator<Item = &YearSeries> {
        self.years.values()
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }
}

impl FromIterator<YearSeries> for YearArena {
    fn from_iter<T: IntoIterator<Item = YearSeries>>(iter: T) -> Self {
        let mut arena = YearArena::new();
        for series in iter {
            arena.insert(series);
        }
        arena
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(month: u32, day: u32, value: Option<f64>) -> SeriesPoint {
        SeriesPoint {
            day: CalendarDay::new(month, day),
            value,
        }
    }

    #[test]
    fn test_value_on_prefers_first_row() {
        let series = YearSeries::new(
            Site::AlbionCpue,
            2021,
            vec![point(4, 15, Some(1.0)), point(4, 15, Some(9.0))],
            Vec::new(),
        );
        assert_eq!(series.value_on(CalendarDay::new(4, 15)), Some(1.0));
        assert_eq!(series.value_on(CalendarDay::new(4, 16)), None);
    }

    #[test]
    fn test_unavailable_series_is_empty() {
        let series = YearSeries::unavailable(Site::BonnevilleCount, 1950, "missing");
        assert!(!series.is_available());
        assert!(series.points().is_empty());
        assert_eq!(series.total(), None);
    }

    #[test]
    fn test_observations_skip_nulls() {
        let series = YearSeries::new(
            Site::LakeCount,
            2024,
            vec![point(7, 1, Some(3.0)), point(7, 2, None), point(7, 3, Some(4.0))],
            Vec::new(),
        );
        let observations = series.observations();
        assert_eq!(observations.len(), 2);
        assert_eq!(observations[1].0, NaiveDate::from_ymd_opt(2024, 7, 3).unwrap());
        assert_eq!(series.total(), Some(7.0));
    }

    #[test]
    fn test_arena_orders_by_year() {
        let arena: YearArena = [2021, 2019, 2020]
            .into_iter()
            .map(|year| YearSeries::new(Site::AlbionCpue, year, Vec::new(), Vec::new()))
            .collect();
        assert_eq!(arena.years().collect::<Vec<_>>(), vec![2019, 2020, 2021]);
        assert_eq!(arena.len(), 3);
    }
}
