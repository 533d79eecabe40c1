//! Sighting count and pod presence exports.

use crate::load::load_sighting_years;
use crate::output::write_records;
use crate::{DataArgs, OutputArgs};
use log::{info, warn};
use osr_data::aggregate::{aggregate_by_day, pod_presence, CountingMode, SightingFilter, SubgroupFilter};
use osr_series::sighting::Region;
use std::ops::RangeInclusive;

pub async fn run_sightings(
    data: &DataArgs,
    year: i32,
    pod: SubgroupFilter,
    region: Option<Region>,
    mode: Option<CountingMode>,
    output: &OutputArgs,
) -> anyhow::Result<()> {
    let logs = load_sighting_years(data.source(), data.cutoffs()?, year..=year).await?;
    let Some(log) = logs.into_iter().next() else {
        anyhow::bail!("no sighting log loaded for {year}");
    };
    if !log.is_available() {
        warn!("No sightings available for {year}");
    }

    let filter = SightingFilter {
        subgroup: pod,
        region,
    };
    let mode = mode.unwrap_or_else(|| CountingMode::for_era(log.era));
    let counts = aggregate_by_day(&log.records, &filter, mode)?;
    write_records(&counts, output.output.as_deref(), output.format)?;
    info!(
        "Sightings {year} ({:?} era, counted as {mode}): {} days",
        log.era,
        counts.len()
    );
    Ok(())
}

pub async fn run_presence(
    data: &DataArgs,
    years: RangeInclusive<i32>,
    region: Option<Region>,
    output: &OutputArgs,
) -> anyhow::Result<()> {
    if years.is_empty() {
        anyhow::bail!("empty year range {}..={}", years.start(), years.end());
    }
    let logs = load_sighting_years(data.source(), data.cutoffs()?, years).await?;
    let mut rows = Vec::new();
    for log in &logs {
        if !log.is_available() {
            warn!("Skipping {}: no sightings available", log.year);
            continue;
        }
        rows.extend(pod_presence(log.year, &log.records, region));
    }
    write_records(&rows, output.output.as_deref(), output.format)?;
    info!("Presence complete: {} rows", rows.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use osr_series::sighting::Pod;
    use std::fs;
    use tempfile::TempDir;

    fn data_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("twm")).unwrap();
        fs::create_dir_all(dir.path().join("acartia")).unwrap();
        fs::write(
            dir.path().join("twm/twm2020.csv"),
            "SightDate,Time1,latitude,longitude,Comments\n\
             2020-06-01,08:00,48.5,-123.1,J pod\n\
             2020-06-01,09:30,47.5,-122.4,Ks southbound\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("acartia/srkw_2020.csv"),
            "created,latitude,longitude,no_sighted,J,K,L\n\
             2020-06-01T08:00:00Z,48.5,-123.1,12,1,0,0\n\
             2020-06-02T10:00:00Z,48.5,-123.1,8,1,0,0\n",
        )
        .unwrap();
        dir
    }

    fn data_args(dir: &TempDir) -> DataArgs {
        DataArgs::for_dir(dir.path())
    }

    #[tokio::test]
    async fn test_overlap_year_counts_both_providers() {
        let dir = data_dir();
        let out = dir.path().join("counts.csv");
        let output = OutputArgs {
            output: Some(out.clone()),
            format: OutputFormat::Csv,
        };
        run_sightings(&data_args(&dir), 2020, SubgroupFilter::AnyPod, None, None, &output)
            .await
            .unwrap();
        let text = fs::read_to_string(&out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "date,day_of_year,count");
        // Jun 1: two old reports, the new duplicate dropped
        assert_eq!(lines[1], "2020-06-01,153,2.0");
        assert_eq!(lines[2], "2020-06-02,154,1.0");
    }

    #[tokio::test]
    async fn test_forced_mean_mode_fails_on_old_records() {
        let dir = data_dir();
        let output = OutputArgs {
            output: Some(dir.path().join("counts.csv")),
            format: OutputFormat::Csv,
        };
        let result = run_sightings(
            &data_args(&dir),
            2020,
            SubgroupFilter::Pod(Pod::J),
            None,
            Some(CountingMode::MeanOfReportedGroupSize),
            &output,
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_presence_skips_unavailable_years() {
        let dir = data_dir();
        let out = dir.path().join("presence.json");
        let output = OutputArgs {
            output: Some(out.clone()),
            format: OutputFormat::Json,
        };
        run_presence(&data_args(&dir), 2019..=2020, None, &output)
            .await
            .unwrap();
        let rows: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        let rows = rows.as_array().unwrap();
        assert_eq!(rows.len(), 366);
        let june_1 = rows.iter().find(|row| row["date"] == "2020-06-01").unwrap();
        assert_eq!(june_1["j_count"], 1);
        assert_eq!(june_1["k_count"], 1);
        assert_eq!(june_1["any_present"], 1);
    }

    #[tokio::test]
    async fn test_presence_region_keeps_central_salish_only() {
        let dir = data_dir();
        let out = dir.path().join("presence.json");
        let output = OutputArgs {
            output: Some(out.clone()),
            format: OutputFormat::Json,
        };
        run_presence(&data_args(&dir), 2020..=2020, Some(Region::CentralSalish), &output)
            .await
            .unwrap();
        let rows: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        let june_1 = rows
            .as_array()
            .unwrap()
            .iter()
            .find(|row| row["date"] == "2020-06-01")
            .unwrap();
        // the K report at 47.5 is in Puget Sound
        assert_eq!(june_1["j_count"], 1);
        assert_eq!(june_1["k_count"], 0);
    }

    #[tokio::test]
    async fn test_new_era_year_defaults_to_mean_group_size() {
        let dir = data_dir();
        fs::write(
            dir.path().join("acartia/srkw_2023.csv"),
            "created,latitude,longitude,no_sighted,J,K,L\n\
             2023-07-01T08:00:00Z,48.5,-123.1,10,1,0,0\n\
             2023-07-01T12:00:00Z,48.6,-123.2,20,0,1,0\n\
             2023-07-03T09:00:00Z,48.5,-123.1,7,0,0,1\n",
        )
        .unwrap();
        let out = dir.path().join("counts.csv");
        let output = OutputArgs {
            output: Some(out.clone()),
            format: OutputFormat::Csv,
        };
        run_sightings(&data_args(&dir), 2023, SubgroupFilter::AnyPod, None, None, &output)
            .await
            .unwrap();
        let text = fs::read_to_string(&out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec!["date,day_of_year,count", "2023-07-01,182,15.0", "2023-07-03,184,7.0"]
        );
    }

    #[tokio::test]
    async fn test_mode_flag_overrides_era_default() {
        let dir = data_dir();
        fs::write(
            dir.path().join("acartia/srkw_2023.csv"),
            "created,latitude,longitude,no_sighted,J,K,L\n\
             2023-07-01T08:00:00Z,48.5,-123.1,10,1,0,0\n\
             2023-07-01T12:00:00Z,48.6,-123.2,20,0,1,0\n",
        )
        .unwrap();
        let out = dir.path().join("counts.csv");
        let output = OutputArgs {
            output: Some(out.clone()),
            format: OutputFormat::Csv,
        };
        run_sightings(
            &data_args(&dir),
            2023,
            SubgroupFilter::AnyPod,
            None,
            Some(CountingMode::ReportCount),
            &output,
        )
        .await
        .unwrap();
        let text = fs::read_to_string(&out).unwrap();
        assert_eq!(text.lines().nth(1), Some("2023-07-01,182,2.0"));
    }
}
