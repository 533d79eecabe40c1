//! Peak day and percentile-exceedance days per year.

use crate::aggregate::{daily_counts_in_stream_order, CountingMode, SightingFilter};
use crate::error::{EngineError, Result};
use crate::stats::percentile_linear;
use chrono::NaiveDate;
use log::{debug, info};
use osr_calendar::dates::day_of_year;
use osr_series::sighting::SightingLog;
use osr_series::site::Site;
use osr_series::year_series::YearArena;
use osr_series::SeriesError;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Label used for peaks computed from the sighting logs.
pub const SIGHTINGS_LABEL: &str = "sightings";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakOptions {
    /// Percentile whose value a day must reach to count as an exceedance.
    pub percentile: f64,
}

impl Default for PeakOptions {
    fn default() -> Self {
        PeakOptions { percentile: 95.0 }
    }
}

impl PeakOptions {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.percentile) {
            return Err(EngineError::InvalidPercentile(self.percentile));
        }
        Ok(())
    }
}

/// The day holding a year's maximum.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakRecord {
    pub series: String,
    pub year: i32,
    pub date: NaiveDate,
    pub day_of_year: u32,
    pub value: f64,
}

/// A day at or above its year's percentile value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PercentileExceedanceRecord {
    pub series: String,
    pub year: i32,
    pub percentile: f64,
    pub threshold: f64,
    pub date: NaiveDate,
    pub day_of_year: u32,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeakReport {
    pub peaks: Vec<PeakRecord>,
    pub exceedances: Vec<PercentileExceedanceRecord>,
}

impl PeakReport {
    fn push_year(
        &mut self,
        series: &str,
        year: i32,
        observations: &[(NaiveDate, f64)],
        options: &PeakOptions,
    ) {
        let Some(peak) = first_maximum(observations) else {
            debug!("peaks: {series} {year}: no observations");
            return;
        };
        self.peaks.push(PeakRecord {
            series: series.to_string(),
            year,
            date: peak.0,
            day_of_year: day_of_year(&peak.0),
            value: peak.1,
        });

        let values: Vec<f64> = observations.iter().map(|(_, v)| *v).collect();
        if let Some(threshold) = percentile_linear(&values, options.percentile) {
            self.exceedances.extend(
                observations
                    .iter()
                    .filter(|(_, v)| *v >= threshold)
                    .map(|(date, value)| PercentileExceedanceRecord {
                        series: series.to_string(),
                        year,
                        percentile: options.percentile,
                        threshold,
                        date: *date,
                        day_of_year: day_of_year(date),
                        value: *value,
                    }),
            );
        }
    }
}

/// The first observation, in order, holding the maximum value.
pub fn first_maximum(observations: &[(NaiveDate, f64)]) -> Option<(NaiveDate, f64)> {
    let mut best: Option<(NaiveDate, f64)> = None;
    for &(date, value) in observations {
        match best {
            Some((_, top)) if value <= top => {}
            _ => best = Some((date, value)),
        }
    }
    best
}

/// Peaks and exceedances for `site` over `years`.
///
/// Years missing from the arena, unavailable, or holding only nulls are
/// skipped.
pub fn extract_peaks(
    site: Site,
    arena: &YearArena,
    years: RangeInclusive<i32>,
    options: &PeakOptions,
) -> Result<PeakReport> {
    options.validate()?;
    check_range(&years)?;
    site.check_year(*years.start())?;
    site.check_year(*years.end())?;

    let mut report = PeakReport::default();
    for year in years {
        if let Some(series) = arena.get(year) {
            report.push_year(site.key(), year, &series.observations(), options);
        }
    }
    info!(
        "peaks: {site}: {} peaks, {} exceedance days",
        report.peaks.len(),
        report.exceedances.len()
    );
    Ok(report)
}

/// Peaks and exceedances of the daily report counts in each log.
///
/// Each log is counted as loaded, so a changeover year that concatenates
/// both providers is counted over both. Ties go to the date reported first.
pub fn extract_sighting_peaks(
    logs: &[SightingLog],
    filter: &SightingFilter,
    options: &PeakOptions,
) -> Result<PeakReport> {
    options.validate()?;
    let mut report = PeakReport::default();
    for log in logs {
        let observations: Vec<(NaiveDate, f64)> =
            daily_counts_in_stream_order(&log.records, filter, CountingMode::ReportCount)?
                .into_iter()
                .map(|count| (count.date, count.count))
                .collect();
        report.push_year(SIGHTINGS_LABEL, log.year, &observations, options);
    }
    info!(
        "peaks: {SIGHTINGS_LABEL}: {} peaks, {} exceedance days",
        report.peaks.len(),
        report.exceedances.len()
    );
    Ok(report)
}

fn check_range(years: &RangeInclusive<i32>) -> Result<()> {
    if years.is_empty() {
        return Err(SeriesError::Configuration(format!(
            "empty year range {}..={}",
            years.start(),
            years.end()
        ))
        .into());
    }
    Ok(())
}
