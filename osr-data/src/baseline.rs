//! Historical baselines: for each calendar day, the mean of the values seen
//! on that day in earlier years.

use crate::stats::round_to;
use log::debug;
use osr_calendar::calendar_day::build_calendar;
use osr_calendar::CalendarDay;
use osr_series::site::Site;
use osr_series::year_series::YearArena;
use serde::{Deserialize, Serialize};

/// Which earlier years feed a baseline.
///
/// Years strictly before `as_of_year - recent_excluded` qualify. With
/// `trailing_years` set, only that many of the latest qualifying years are
/// used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineWindow {
    pub recent_excluded: i32,
    pub trailing_years: Option<u32>,
}

impl Default for BaselineWindow {
    fn default() -> Self {
        BaselineWindow::history()
    }
}

impl BaselineWindow {
    /// Long-run average leaving out the two most recent prior years.
    pub fn history() -> Self {
        BaselineWindow {
            recent_excluded: 2,
            trailing_years: None,
        }
    }

    /// Every year before the one being viewed.
    pub fn through_last_year() -> Self {
        BaselineWindow {
            recent_excluded: 0,
            trailing_years: None,
        }
    }

    pub fn excluding(recent_excluded: i32) -> Self {
        BaselineWindow {
            recent_excluded,
            trailing_years: None,
        }
    }

    pub fn trailing(mut self, years: u32) -> Self {
        self.trailing_years = Some(years);
        self
    }

    pub fn qualifies(&self, year: i32, as_of_year: i32) -> bool {
        let end = as_of_year.saturating_sub(self.recent_excluded);
        if year >= end {
            return false;
        }
        // a window reaching past i32::MIN covers every year
        match self.trailing_years {
            Some(n) => i32::try_from(n)
                .ok()
                .and_then(|n| end.checked_sub(n))
                .map_or(true, |start| year >= start),
            None => true,
        }
    }
}

/// One calendar day of a [`HistoricalSeries`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistoricalRow {
    pub day: CalendarDay,
    /// The as-of year's own value.
    pub value: Option<f64>,
    pub baseline: Option<f64>,
}

/// A year's values beside their baseline, one row per day of the
/// leap-year calendar.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalSeries {
    site: Site,
    year: i32,
    window: BaselineWindow,
    baseline_years: Vec<i32>,
    rows: Vec<HistoricalRow>,
}

impl HistoricalSeries {
    pub fn site(&self) -> Site {
        self.site
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn window(&self) -> BaselineWindow {
        self.window
    }

    /// Years that contributed at least one value to the baseline.
    pub fn baseline_years(&self) -> &[i32] {
        &self.baseline_years
    }

    pub fn rows(&self) -> &[HistoricalRow] {
        &self.rows
    }

    pub fn row(&self, day: CalendarDay) -> Option<&HistoricalRow> {
        // rows follow the leap calendar, so the ordinal is the index
        self.rows.get((day.ordinal_leap() as usize).checked_sub(1)?)
    }

    pub fn value_on(&self, day: CalendarDay) -> Option<f64> {
        self.row(day).and_then(|row| row.value)
    }

    pub fn baseline_on(&self, day: CalendarDay) -> Option<f64> {
        self.row(day).and_then(|row| row.baseline)
    }
}

/// Pair `as_of_year`'s values with the baseline from the years `window`
/// selects.
///
/// Baselines are rounded to the site's precision. A day with no
/// qualifying value has a `None` baseline, never zero.
pub fn with_baseline(
    site: Site,
    arena: &YearArena,
    as_of_year: i32,
    window: BaselineWindow,
) -> HistoricalSeries {
    let current = arena.get(as_of_year);
    let history: Vec<_> = arena
        .iter()
        .filter(|series| window.qualifies(series.year(), as_of_year))
        .collect();
    let precision = site.precision();

    let mut baseline_years: Vec<i32> = Vec::new();
    let rows = build_calendar(true)
        .into_iter()
        .map(|day| {
            let mut sum = 0.0;
            let mut count = 0usize;
            for series in &history {
                if let Some(v) = series.value_on(day) {
                    sum += v;
                    count += 1;
                    if !baseline_years.contains(&series.year()) {
                        baseline_years.push(series.year());
                    }
                }
            }
            HistoricalRow {
                day,
                value: current.and_then(|series| series.value_on(day)),
                baseline: (count > 0).then(|| round_to(sum / count as f64, precision)),
            }
        })
        .collect();
    baseline_years.sort_unstable();

    if baseline_years.is_empty() {
        debug!("baseline: {site} {as_of_year}: no qualifying history");
    } else {
        debug!(
            "baseline: {site} {as_of_year}: {} years from {:?}",
            baseline_years.len(),
            baseline_years
        );
    }

    HistoricalSeries {
        site,
        year: as_of_year,
        window,
        baseline_years,
        rows,
    }
}

/// Sum of one available year's values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnnualTotal {
    pub site: Site,
    pub year: i32,
    pub total: f64,
    pub observed_days: usize,
}

/// Per-year totals in year order. Unavailable years are left out.
pub fn annual_totals(arena: &YearArena) -> Vec<AnnualTotal> {
    arena
        .iter()
        .filter(|series| series.is_available())
        .map(|series| AnnualTotal {
            site: series.site(),
            year: series.year(),
            total: series.total().unwrap_or(0.0),
            observed_days: series.observations().len(),
        })
        .collect()
}
