//! Lag-aligned merge of several year series onto one calendar.
//!
//! A series observed downstream (or upstream) of another sees the same fish
//! some days apart. Shifting it back by that travel time lines the two
//! curves up. A value recorded on date `d` is moved to `d - lag`.

use crate::baseline::HistoricalSeries;
use crate::error::{EngineError, Result};
use chrono::{Datelike, Duration, NaiveDate};
use log::debug;
use osr_calendar::{calendar_for_year, dates::is_leap, CalendarDay};
use std::collections::HashMap;

/// Longest lag accepted, in days.
pub const MAX_LAG_DAYS: i64 = 364;

/// What happens to a value whose shifted date leaves the target year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LagScope {
    /// Keep it by rotating around the target year's calendar, so
    /// early-January values land at the end of December.
    WrapCalendar,
    /// Drop it; it belongs to another year.
    TargetYearOnly,
}

/// One series to place on the aligned frame.
#[derive(Debug, Clone, Copy)]
pub struct LagInput<'a> {
    pub series: &'a HistoricalSeries,
    pub lag_days: i64,
    pub scope: LagScope,
}

impl<'a> LagInput<'a> {
    pub fn new(series: &'a HistoricalSeries, lag_days: i64, scope: LagScope) -> Self {
        LagInput {
            series,
            lag_days,
            scope,
        }
    }

    /// `alb2023`-style name of the year column.
    pub fn value_column(&self) -> String {
        format!(
            "{}{}",
            self.series.site().column_prefix(),
            self.series.year()
        )
    }

    /// `alb_hist`-style name of the baseline column.
    pub fn baseline_column(&self) -> String {
        format!("{}_hist", self.series.site().column_prefix())
    }
}

/// One calendar day of an [`AlignedFrame`]. `values` follows the frame's
/// column order.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedRow {
    pub day: CalendarDay,
    pub date: NaiveDate,
    pub values: Vec<Option<f64>>,
}

/// Several series merged on the target year's calendar. Every day of the
/// year appears exactly once, in calendar order.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedFrame {
    target_year: i32,
    columns: Vec<String>,
    rows: Vec<AlignedRow>,
}

impl AlignedFrame {
    pub fn target_year(&self) -> i32 {
        self.target_year
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[AlignedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// All values of one column in calendar order.
    pub fn column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row.values[index]).collect())
    }

    pub fn value(&self, day: CalendarDay, name: &str) -> Option<f64> {
        let index = self.column_index(name)?;
        self.rows
            .iter()
            .find(|row| row.day == day)
            .and_then(|row| row.values[index])
    }
}

pub fn check_lag(lag_days: i64) -> Result<()> {
    if !(0..=MAX_LAG_DAYS).contains(&lag_days) {
        return Err(EngineError::InvalidLag(lag_days));
    }
    Ok(())
}

/// Merge `inputs` onto `target_year`'s calendar.
///
/// Each input contributes its year column and its baseline column, shifted
/// together by the input's lag. Every input must be a view of
/// `target_year`. Days with nothing shifted onto them are `None`.
pub fn merge_aligned(target_year: i32, inputs: &[LagInput<'_>]) -> Result<AlignedFrame> {
    let mut columns = Vec::with_capacity(inputs.len() * 2);
    let mut shifted = Vec::with_capacity(inputs.len());
    for input in inputs {
        check_lag(input.lag_days)?;
        if input.series.year() != target_year {
            return Err(EngineError::Configuration(format!(
                "{} series is for {}, not {target_year}",
                input.series.site(),
                input.series.year()
            )));
        }
        columns.push(input.value_column());
        columns.push(input.baseline_column());
        shifted.push(shift(target_year, input));
    }

    let rows = calendar_for_year(target_year)
        .into_iter()
        .filter_map(|day| {
            let date = day.in_year(target_year)?;
            let values = shifted
                .iter()
                .flat_map(|by_day| match by_day.get(&day) {
                    Some((value, baseline)) => [*value, *baseline],
                    None => [None, None],
                })
                .collect();
            Some(AlignedRow { day, date, values })
        })
        .collect();

    Ok(AlignedFrame {
        target_year,
        columns,
        rows,
    })
}

/// Merge a catch-rate style series and a dam style series for one year.
///
/// `series_a` wraps across the year boundary; `series_b` keeps only values
/// whose shifted date is still in `target_year`. A lag of 0 leaves both
/// untouched.
pub fn lagged_merge(
    target_year: i32,
    series_a: &HistoricalSeries,
    lag_a_days: i64,
    series_b: &HistoricalSeries,
    lag_b_days: i64,
) -> Result<AlignedFrame> {
    merge_aligned(
        target_year,
        &[
            LagInput::new(series_a, lag_a_days, LagScope::WrapCalendar),
            LagInput::new(series_b, lag_b_days, LagScope::TargetYearOnly),
        ],
    )
}

type Shifted = HashMap<CalendarDay, (Option<f64>, Option<f64>)>;

fn shift(target_year: i32, input: &LagInput<'_>) -> Shifted {
    let calendar = calendar_for_year(target_year);
    let leap = is_leap(target_year);
    let length = calendar.len() as i64;
    let mut by_day = Shifted::new();
    let mut dropped = 0usize;
    for row in input.series.rows() {
        // Feb 29 has no place in a common target year
        let ordinal = if leap {
            Some(row.day.ordinal_leap())
        } else {
            row.day.ordinal_nonleap()
        };
        let (Some(date), Some(ordinal)) = (row.day.in_year(target_year), ordinal) else {
            continue;
        };
        let key = if input.lag_days == 0 {
            row.day
        } else {
            match input.scope {
                // rotate around the target calendar so no two days share a slot
                LagScope::WrapCalendar => {
                    let moved = (i64::from(ordinal) - 1 - input.lag_days).rem_euclid(length);
                    calendar[moved as usize]
                }
                LagScope::TargetYearOnly => {
                    let moved = date - Duration::days(input.lag_days);
                    if moved.year() != target_year {
                        dropped += 1;
                        continue;
                    }
                    CalendarDay::from(moved)
                }
            }
        };
        by_day.insert(key, (row.value, row.baseline));
    }
    if dropped > 0 {
        debug!(
            "lagged: {} {target_year}: {dropped} days shifted out of the year",
            input.series.site()
        );
    }
    by_day
}
