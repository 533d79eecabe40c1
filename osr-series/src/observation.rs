//! Parsers for the three daily gauge tables.
//!
//! Each parser takes the raw CSV text of one per-year file and produces a
//! [`YearSeries`]. Rows that fail validation are dropped and recorded as
//! [`RowIssue`]s; only a file that cannot be read as a table at all (no
//! header, missing required column) is an error.

use crate::error::{Result, SeriesError};
use crate::site::Site;
use crate::year_series::{RowIssue, SeriesPoint, YearSeries};
use chrono::{Datelike, NaiveDate};
use csv::{ReaderBuilder, StringRecord};
use log::{info, warn};
use osr_calendar::dates::{parse_date, parse_month_abbrev, parse_slash_date};
use osr_calendar::CalendarDay;

/// Catch-rate table columns: day of month, month abbreviation, CPUE.
pub const ALBION_COLUMNS: [&str; 3] = ["day", "mon", "cpue1"];

/// Dam table columns: project name, ISO date, Chinook count.
pub const BONNEVILLE_COLUMNS: [&str; 3] = ["Project", "Date", "Chin"];

/// The dam export lists several projects; only this one is kept.
pub const BONNEVILLE_PROJECT: &str = "Bonneville";

/// Lake table columns: slash date, daily count.
pub const LAKE_COLUMNS: [&str; 2] = ["Date", "Daily Count"];

/// Cell values read as "reported, no number".
const NULL_MARKERS: [&str; 5] = ["", "NaN", "nan", "NA", "---"];

/// Parse one per-year table for `site`.
///
/// Fails only when the header row lacks a required column or the text is
/// not CSV at all; the loader turns that into an unavailable year.
pub fn parse_year_table(site: Site, year: i32, csv_data: &str) -> Result<YearSeries> {
    match site {
        Site::AlbionCpue => parse_table(site, year, csv_data, &ALBION_COLUMNS, albion_row),
        Site::BonnevilleCount => {
            parse_table(site, year, csv_data, &BONNEVILLE_COLUMNS, bonneville_row)
        }
        Site::LakeCount => parse_table(site, year, csv_data, &LAKE_COLUMNS, lake_row),
    }
}

type RowParser = fn(&StringRecord, &[usize], i32, u64) -> Result<Option<SeriesPoint>>;

fn parse_table(
    site: Site,
    year: i32,
    csv_data: &str,
    required: &[&str],
    row_parser: RowParser,
) -> Result<YearSeries> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_data.as_bytes());
    let columns = column_indices(rdr.headers()?, required)?;

    let mut points = Vec::new();
    let mut issues = Vec::new();
    for result in rdr.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                issues.push(RowIssue {
                    line: e.position().map(|p| p.line()).unwrap_or_default(),
                    reason: e.to_string(),
                });
                continue;
            }
        };
        let line = line_of(&record);
        match row_parser(&record, &columns, year, line) {
            Ok(Some(point)) => points.push(point),
            Ok(None) => {}
            Err(SeriesError::MalformedRow { line, reason }) => {
                issues.push(RowIssue { line, reason })
            }
            Err(e) => return Err(e),
        }
    }

    if !issues.is_empty() {
        warn!(
            "loader: {} {}: dropped {} malformed rows",
            site,
            year,
            issues.len()
        );
    }
    info!("loader: {} {}: loaded {} rows", site, year, points.len());
    Ok(YearSeries::new(site, year, points, issues))
}

fn albion_row(
    record: &StringRecord,
    columns: &[usize],
    year: i32,
    line: u64,
) -> Result<Option<SeriesPoint>> {
    let day_field = field(record, columns[0]);
    let month_field = field(record, columns[1]);
    let day: u32 = day_field
        .parse()
        .map_err(|_| malformed(line, format!("day is not a number: {day_field:?}")))?;
    let month = parse_month_abbrev(month_field)
        .ok_or_else(|| malformed(line, format!("unknown month: {month_field:?}")))?;
    let date = NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| malformed(line, format!("no such date in {year}: {month}/{day}")))?;
    let value = parse_value(field(record, columns[2]), line)?;
    Ok(Some(SeriesPoint {
        day: date.into(),
        value,
    }))
}

fn bonneville_row(
    record: &StringRecord,
    columns: &[usize],
    year: i32,
    line: u64,
) -> Result<Option<SeriesPoint>> {
    if field(record, columns[0]) != BONNEVILLE_PROJECT {
        return Ok(None);
    }
    let date_field = field(record, columns[1]);
    let date = parse_date(date_field)
        .ok_or_else(|| malformed(line, format!("unparseable date: {date_field:?}")))?;
    check_year(date.year(), year, line)?;
    let value = parse_value(field(record, columns[2]), line)?.map(|count| count.max(0.0));
    Ok(Some(SeriesPoint {
        day: date.into(),
        value,
    }))
}

fn lake_row(
    record: &StringRecord,
    columns: &[usize],
    year: i32,
    line: u64,
) -> Result<Option<SeriesPoint>> {
    let date_field = field(record, columns[0]);
    let (month, day, date_year) = parse_slash_date(date_field)
        .ok_or_else(|| malformed(line, format!("unparseable date: {date_field:?}")))?;
    if let Some(date_year) = date_year {
        check_year(date_year, year, line)?;
    }
    let date = NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| malformed(line, format!("no such date in {year}: {month}/{day}")))?;
    let value = parse_value(field(record, columns[1]), line)?;
    Ok(Some(SeriesPoint {
        day: CalendarDay::from(date),
        value,
    }))
}

/// Locate `required` columns in the header row.
pub(crate) fn column_indices(headers: &StringRecord, required: &[&str]) -> Result<Vec<usize>> {
    required
        .iter()
        .map(|name| {
            headers
                .iter()
                .position(|header| header.trim() == *name)
                .ok_or_else(|| malformed(1, format!("missing required column {name:?}")))
        })
        .collect()
}

/// Locate an optional column in the header row.
pub(crate) fn optional_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|header| header.trim() == name)
}

pub(crate) fn field(record: &StringRecord, index: usize) -> &str {
    record.get(index).unwrap_or("").trim()
}

pub(crate) fn line_of(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or_default()
}

pub(crate) fn malformed(line: u64, reason: String) -> SeriesError {
    SeriesError::MalformedRow { line, reason }
}

/// Parse a numeric cell. Null markers give `Ok(None)`; anything else that
/// is not a number is a malformed row.
pub(crate) fn parse_value(s: &str, line: u64) -> Result<Option<f64>> {
    if NULL_MARKERS.contains(&s) {
        return Ok(None);
    }
    match s.replace(',', "").parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        Ok(_) => Ok(None),
        Err(_) => Err(malformed(line, format!("value is not a number: {s:?}"))),
    }
}

fn check_year(found: i32, expected: i32, line: u64) -> Result<()> {
    if found != expected {
        return Err(malformed(
            line,
            format!("row dated {found} in the {expected} file"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALBION_2021: &str = "\
day,mon,year,netlen,catch1,sets1,effort1,cpue1,catch2,sets2,effort2,cpue2
15,Apr,2021,100,1,2,3,0.52,0,0,0,0
16,Apr,2021,100,1,2,3,,0,0,0,0
17,apr,2021,100,1,2,3,1.25,0,0,0,0
29,Feb,2021,100,1,2,3,9.9,0,0,0,0
18,Apx,2021,100,1,2,3,1.0,0,0,0,0
19,Apr,2021,100,1,2,3,lots,0,0,0,0
";

    #[test]
    fn test_parse_albion_table() {
        let series = parse_year_table(Site::AlbionCpue, 2021, ALBION_2021).unwrap();
        assert!(series.is_available());
        assert_eq!(series.points().len(), 3);
        assert_eq!(series.value_on(CalendarDay::new(4, 15)), Some(0.52));
        assert_eq!(series.value_on(CalendarDay::new(4, 16)), None);
        assert_eq!(series.value_on(CalendarDay::new(4, 17)), Some(1.25));
        // Feb 29 in a common year, bad month and bad value are all dropped
        assert_eq!(series.issues().len(), 3);
        assert_eq!(series.issues()[0].line, 5);
    }

    #[test]
    fn test_parse_bonneville_filters_project_and_clamps() {
        let csv = "\
Project,Date,Chin,JChin,Stlhd
Bonneville,2023-06-01,1200,10,5
The Dalles,2023-06-01,900,3,1
Bonneville,2023-06-02,-4,0,0
Bonneville,2023-06-03,,0,0
Bonneville,2022-12-31,5,0,0
";
        let series = parse_year_table(Site::BonnevilleCount, 2023, csv).unwrap();
        assert_eq!(series.points().len(), 3);
        assert_eq!(series.value_on(CalendarDay::new(6, 1)), Some(1200.0));
        assert_eq!(series.value_on(CalendarDay::new(6, 2)), Some(0.0));
        assert_eq!(series.value_on(CalendarDay::new(6, 3)), None);
        assert_eq!(series.issues().len(), 1);
    }

    #[test]
    fn test_parse_lake_table() {
        let csv = "\
Date,Daily Count,Cumulative
6/15/2024,12,12
6/16,30,42
2/29/2024,1,43
";
        let series = parse_year_table(Site::LakeCount, 2024, csv).unwrap();
        assert_eq!(series.points().len(), 3);
        assert_eq!(series.value_on(CalendarDay::new(6, 16)), Some(30.0));
        assert_eq!(series.value_on(CalendarDay::LEAP_DAY), Some(1.0));
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let csv = "day,mon,catch1\n1,Jan,3\n";
        assert!(parse_year_table(Site::AlbionCpue, 2021, csv).is_err());
    }

    #[test]
    fn test_parse_is_deterministic() {
        let first = parse_year_table(Site::AlbionCpue, 2021, ALBION_2021).unwrap();
        let second = parse_year_table(Site::AlbionCpue, 2021, ALBION_2021).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_parse_value_markers() {
        assert_eq!(parse_value("", 1).unwrap(), None);
        assert_eq!(parse_value("NaN", 1).unwrap(), None);
        assert_eq!(parse_value("1,234", 1).unwrap(), Some(1234.0));
        assert!(parse_value("abc", 1).is_err());
    }
}
