//! Peak and percentile-exceedance export.

use crate::load::{load_site_years, load_sighting_years};
use crate::output::{write_records, OutputFormat};
use crate::DataArgs;
use log::info;
use osr_data::aggregate::{SightingFilter, SubgroupFilter};
use osr_data::peaks::{extract_peaks, extract_sighting_peaks, PeakOptions};
use osr_series::sighting::Region;
use osr_series::site::Site;
use osr_series::SeriesError;
use std::ops::RangeInclusive;
use std::path::Path;
use std::str::FromStr;

/// A gauge site or the combined sighting logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeakSeries {
    Site(Site),
    Sightings,
}

impl FromStr for PeakSeries {
    type Err = SeriesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sightings" | "orca" => Ok(PeakSeries::Sightings),
            other => other.parse().map(PeakSeries::Site),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PeakRequest {
    pub series: PeakSeries,
    pub years: RangeInclusive<i32>,
    pub percentile: f64,
    pub pod: SubgroupFilter,
    pub region: Option<Region>,
}

pub async fn run_peaks(
    data: &DataArgs,
    request: PeakRequest,
    peaks_csv: &Path,
    exceedances_csv: &Path,
) -> anyhow::Result<()> {
    let options = PeakOptions {
        percentile: request.percentile,
    };
    options.validate()?;
    if request.years.is_empty() {
        anyhow::bail!(
            "empty year range {}..={}",
            request.years.start(),
            request.years.end()
        );
    }

    let report = match request.series {
        PeakSeries::Site(site) => {
            site.check_year(*request.years.start())?;
            site.check_year(*request.years.end())?;
            let arena = load_site_years(data.source(), site, request.years.clone()).await?;
            extract_peaks(site, &arena, request.years.clone(), &options)?
        }
        PeakSeries::Sightings => {
            let logs =
                load_sighting_years(data.source(), data.cutoffs()?, request.years.clone()).await?;
            let filter = SightingFilter {
                subgroup: request.pod,
                region: request.region,
            };
            extract_sighting_peaks(&logs, &filter, &options)?
        }
    };

    write_records(&report.peaks, Some(peaks_csv), OutputFormat::Csv)?;
    write_records(&report.exceedances, Some(exceedances_csv), OutputFormat::Csv)?;
    info!(
        "Peaks complete. {} years with a peak, {} exceedance days",
        report.peaks.len(),
        report.exceedances.len()
    );
    Ok(())
}
