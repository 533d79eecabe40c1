//! Command implementations for the OSR CLI.
//!
//! Each subcommand loads the per-year tables it needs from a data directory,
//! runs one engine operation and writes the result as CSV or JSON.

use clap::{Args, Subcommand};
use log::debug;
use osr_data::aggregate::{CountingMode, SubgroupFilter};
use osr_series::changeover::ChangeoverCutoffs;
use osr_series::sighting::Region;
use osr_series::site::Site;
use osr_series::store::{DataLayout, DataStore, YearSource};
use output::OutputFormat;
use std::path::PathBuf;
use std::sync::Arc;

pub mod aligned;
pub mod load;
pub mod output;
pub mod peaks;
pub mod sightings;
pub mod totals;

/// Where the per-year tables live and how the sighting logs change hands.
#[derive(Args, Debug, Clone)]
pub struct DataArgs {
    /// Root directory holding the per-year tables
    #[arg(short = 'd', long, default_value = "data")]
    pub data_dir: PathBuf,

    /// First year covered by both sighting providers
    #[arg(long, default_value_t = 2018)]
    pub both_from: i32,

    /// First year covered only by the newer sighting provider
    #[arg(long, default_value_t = 2022)]
    pub new_from: i32,

    #[command(flatten)]
    pub layout: LayoutArgs,
}

impl DataArgs {
    pub fn source(&self) -> Arc<dyn YearSource> {
        let store = DataStore::with_layout(&self.data_dir, self.layout.resolve());
        debug!("Reading tables under {}", store.root().display());
        Arc::new(store)
    }

    pub fn cutoffs(&self) -> anyhow::Result<ChangeoverCutoffs> {
        Ok(ChangeoverCutoffs::new(self.both_from, self.new_from)?)
    }

    #[cfg(test)]
    pub(crate) fn for_dir(data_dir: &std::path::Path) -> DataArgs {
        DataArgs {
            data_dir: data_dir.to_path_buf(),
            both_from: 2018,
            new_from: 2022,
            layout: LayoutArgs::default(),
        }
    }
}

/// File name patterns relative to the data directory. `{year}` is replaced
/// with the four-digit year; unset patterns keep the standard layout.
#[derive(Args, Debug, Clone, Default)]
pub struct LayoutArgs {
    /// Catch-rate tables, e.g. "foschinook/fos{year}.csv"
    #[arg(long)]
    pub albion_pattern: Option<String>,

    /// Dam count tables, e.g. "bonchinook/bon{year}.csv"
    #[arg(long)]
    pub bonneville_pattern: Option<String>,

    /// Lake count tables, e.g. "lakewash/{year}.csv"
    #[arg(long)]
    pub lake_pattern: Option<String>,

    /// Older sighting logs, e.g. "twm/twm{year}.csv"
    #[arg(long)]
    pub old_sightings_pattern: Option<String>,

    /// Newer sighting logs, e.g. "acartia/srkw_{year}.csv"
    #[arg(long)]
    pub new_sightings_pattern: Option<String>,
}

impl LayoutArgs {
    pub fn resolve(&self) -> DataLayout {
        let mut layout = DataLayout::default();
        let overrides = [
            (&self.albion_pattern, &mut layout.albion),
            (&self.bonneville_pattern, &mut layout.bonneville),
            (&self.lake_pattern, &mut layout.lake),
            (&self.old_sightings_pattern, &mut layout.provider_old),
            (&self.new_sightings_pattern, &mut layout.provider_new),
        ];
        for (pattern, slot) in overrides {
            if let Some(pattern) = pattern {
                *slot = pattern.clone();
            }
        }
        layout
    }
}

#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Output path; stdout when omitted
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Command {
    /// Peak day and percentile-exceedance days per year
    Peaks {
        #[command(flatten)]
        data: DataArgs,

        /// albion, bonneville, lake or sightings
        #[arg(short = 's', long)]
        series: peaks::PeakSeries,

        #[arg(long)]
        from: i32,

        #[arg(long)]
        to: i32,

        #[arg(long, default_value_t = 95.0)]
        percentile: f64,

        /// Pod filter for sightings: j, k, l, any or all
        #[arg(long, default_value = "any")]
        pod: SubgroupFilter,

        /// Region filter for sightings: central-salish or puget-sound
        #[arg(long)]
        region: Option<Region>,

        /// Output path for the per-year peak CSV
        #[arg(long)]
        peaks_csv: PathBuf,

        /// Output path for the percentile-exceedance CSV
        #[arg(long)]
        exceedances_csv: PathBuf,
    },

    /// Catch-rate and dam series for one year, lag-aligned, with baselines
    Aligned {
        #[command(flatten)]
        data: DataArgs,

        #[arg(short = 'y', long)]
        year: i32,

        /// Days to shift the catch-rate series back
        #[arg(long, default_value_t = 0)]
        albion_lag: i64,

        /// Days to shift the dam series back
        #[arg(long, default_value_t = 0)]
        bonneville_lag: i64,

        /// Most recent prior years left out of the baseline
        #[arg(long, default_value_t = 2)]
        exclude_recent: i32,

        /// Use only this many years for the baseline
        #[arg(long)]
        trailing_years: Option<u32>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Daily sighting counts for one year
    Sightings {
        #[command(flatten)]
        data: DataArgs,

        #[arg(short = 'y', long)]
        year: i32,

        /// j, k, l, any or all
        #[arg(long, default_value = "any")]
        pod: SubgroupFilter,

        /// central-salish or puget-sound
        #[arg(long)]
        region: Option<Region>,

        /// reports or mean-group-size; defaults to the year's provider era
        #[arg(long)]
        mode: Option<CountingMode>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Per-day pod presence over a range of years
    Presence {
        #[command(flatten)]
        data: DataArgs,

        #[arg(long)]
        from: i32,

        #[arg(long)]
        to: i32,

        /// central-salish or puget-sound; every report when omitted
        #[arg(long)]
        region: Option<Region>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Annual totals for a site
    Totals {
        #[command(flatten)]
        data: DataArgs,

        /// albion, bonneville or lake
        #[arg(short = 's', long)]
        site: Site,

        /// Defaults to the first year of the site's record
        #[arg(long)]
        from: Option<i32>,

        #[arg(long)]
        to: i32,

        #[command(flatten)]
        output: OutputArgs,
    },
}

pub async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Peaks {
            data,
            series,
            from,
            to,
            percentile,
            pod,
            region,
            peaks_csv,
            exceedances_csv,
        } => {
            let request = peaks::PeakRequest {
                series,
                years: from..=to,
                percentile,
                pod,
                region,
            };
            peaks::run_peaks(&data, request, &peaks_csv, &exceedances_csv).await
        }
        Command::Aligned {
            data,
            year,
            albion_lag,
            bonneville_lag,
            exclude_recent,
            trailing_years,
            output,
        } => {
            let request = aligned::AlignedRequest {
                year,
                albion_lag,
                bonneville_lag,
                exclude_recent,
                trailing_years,
            };
            aligned::run_aligned(&data, request, &output).await
        }
        Command::Sightings {
            data,
            year,
            pod,
            region,
            mode,
            output,
        } => sightings::run_sightings(&data, year, pod, region, mode, &output).await,
        Command::Presence {
            data,
            from,
            to,
            region,
            output,
        } => sightings::run_presence(&data, from..=to, region, &output).await,
        Command::Totals {
            data,
            site,
            from,
            to,
            output,
        } => totals::run_totals(&data, site, from, to, &output).await,
    }
}
