//! Daily sighting counts by pod and region.

use crate::error::{EngineError, Result};
use chrono::NaiveDate;
use osr_calendar::{dates::day_of_year, DateRange};
use osr_series::changeover::ProviderEra;
use osr_series::sighting::{Pod, Region, SightingRecord};
use osr_series::SeriesError;
use serde::Serialize;
use std::collections::HashMap;
use std::{fmt, str::FromStr};

/// How the reports on one day turn into one number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CountingMode {
    /// Number of reports.
    ReportCount,
    /// Mean of the reported group sizes. Every report must carry one.
    MeanOfReportedGroupSize,
}

impl CountingMode {
    /// The old provider never records group size, so any era that reads
    /// from it counts reports.
    pub fn for_era(era: ProviderEra) -> CountingMode {
        match era {
            ProviderEra::Old | ProviderEra::Both => CountingMode::ReportCount,
            ProviderEra::New => CountingMode::MeanOfReportedGroupSize,
        }
    }
}

impl fmt::Display for CountingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountingMode::ReportCount => f.write_str("reports"),
            CountingMode::MeanOfReportedGroupSize => f.write_str("mean-group-size"),
        }
    }
}

impl FromStr for CountingMode {
    type Err = SeriesError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reports" | "report-count" | "count" => Ok(CountingMode::ReportCount),
            "mean-group-size" | "mean" => Ok(CountingMode::MeanOfReportedGroupSize),
            other => Err(SeriesError::Configuration(format!(
                "unknown counting mode: {other}"
            ))),
        }
    }
}

/// Which reports a count includes, by pod.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SubgroupFilter {
    Pod(Pod),
    /// At least one pod flagged.
    AnyPod,
    /// Every report, flagged or not.
    All,
}

impl SubgroupFilter {
    pub fn matches(&self, record: &SightingRecord) -> bool {
        match self {
            SubgroupFilter::Pod(pod) => record.pods.contains(*pod),
            SubgroupFilter::AnyPod => !record.pods.is_empty(),
            SubgroupFilter::All => true,
        }
    }
}

impl FromStr for SubgroupFilter {
    type Err = SeriesError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "any" | "any-pod" => Ok(SubgroupFilter::AnyPod),
            "all" => Ok(SubgroupFilter::All),
            other => other.parse().map(SubgroupFilter::Pod),
        }
    }
}

/// Pod and optional region restriction applied before counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SightingFilter {
    pub subgroup: SubgroupFilter,
    pub region: Option<Region>,
}

impl Default for SightingFilter {
    fn default() -> Self {
        SightingFilter {
            subgroup: SubgroupFilter::AnyPod,
            region: None,
        }
    }
}

impl SightingFilter {
    pub fn new(subgroup: SubgroupFilter) -> Self {
        SightingFilter {
            subgroup,
            region: None,
        }
    }

    pub fn in_region(mut self, region: Region) -> Self {
        self.region = Some(region);
        self
    }

    pub fn matches(&self, record: &SightingRecord) -> bool {
        self.subgroup.matches(record)
            && self.region.map_or(true, |region| record.region() == region)
    }
}

/// One day's aggregated value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub day_of_year: u32,
    pub count: f64,
}

/// Count the filtered records per day, in date order.
///
/// Asking for group-size means over records that lack a group size is an
/// error rather than a silent fallback to report counts.
pub fn aggregate_by_day(
    records: &[SightingRecord],
    filter: &SightingFilter,
    mode: CountingMode,
) -> Result<Vec<DailyCount>> {
    let mut counts = daily_counts_in_stream_order(records, filter, mode)?;
    counts.sort_by_key(|count| count.date);
    Ok(counts)
}

/// Per-day values in the order each date first appears in `records`.
pub fn daily_counts_in_stream_order(
    records: &[SightingRecord],
    filter: &SightingFilter,
    mode: CountingMode,
) -> Result<Vec<DailyCount>> {
    let selected: Vec<&SightingRecord> = records.iter().filter(|r| filter.matches(r)).collect();
    if mode == CountingMode::MeanOfReportedGroupSize {
        let missing = selected.iter().filter(|r| r.group_size.is_none()).count();
        if missing > 0 {
            return Err(EngineError::UnsupportedCountingMode {
                mode: mode.to_string(),
                missing,
            });
        }
    }

    let mut order: Vec<NaiveDate> = Vec::new();
    let mut totals: HashMap<NaiveDate, (f64, usize)> = HashMap::new();
    for record in selected {
        let date = record.date();
        let entry = totals.entry(date).or_insert_with(|| {
            order.push(date);
            (0.0, 0)
        });
        entry.0 += record.group_size.unwrap_or(0.0);
        entry.1 += 1;
    }

    Ok(order
        .into_iter()
        .filter_map(|date| {
            let (sum, reports) = totals.get(&date)?;
            let count = match mode {
                CountingMode::ReportCount => *reports as f64,
                CountingMode::MeanOfReportedGroupSize => sum / *reports as f64,
            };
            Some(DailyCount {
                date,
                day_of_year: day_of_year(&date),
                count,
            })
        })
        .collect())
}

/// Per-day pod report counts with presence flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PresenceRow {
    pub year: i32,
    pub day_of_year: u32,
    pub date: NaiveDate,
    pub j_count: u32,
    pub k_count: u32,
    pub l_count: u32,
    pub all_count: u32,
    pub j_present: u8,
    pub k_present: u8,
    pub l_present: u8,
    pub any_present: u8,
}

/// One row for every day of `year`, counting reports that flag each pod.
/// Records dated in other years, or outside `region` when one is given,
/// are ignored.
pub fn pod_presence(
    year: i32,
    records: &[SightingRecord],
    region: Option<Region>,
) -> Vec<PresenceRow> {
    let Some(range) = DateRange::calendar_year(year) else {
        return Vec::new();
    };
    let mut by_date: HashMap<NaiveDate, [u32; 3]> = HashMap::new();
    for record in records {
        if !range.contains(&record.date())
            || region.is_some_and(|region| record.region() != region)
        {
            continue;
        }
        let counts = by_date.entry(record.date()).or_default();
        for (slot, pod) in Pod::ALL.iter().enumerate() {
            if record.pods.contains(*pod) {
                counts[slot] += 1;
            }
        }
    }

    range
        .map(|date| {
            let [j, k, l] = by_date.get(&date).copied().unwrap_or_default();
            let all_count = j + k + l;
            PresenceRow {
                year,
                day_of_year: day_of_year(&date),
                date,
                j_count: j,
                k_count: k,
                l_count: l,
                all_count,
                j_present: u8::from(j > 0),
                k_present: u8::from(k > 0),
                l_present: u8::from(l > 0),
                any_present: u8::from(all_count > 0),
            }
        })
        .collect()
}
