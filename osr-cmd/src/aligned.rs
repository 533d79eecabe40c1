//! Lag-aligned catch-rate and dam export.

use crate::load::load_site_years;
use crate::output::{format_value, open_output, OutputFormat};
use crate::{DataArgs, OutputArgs};
use log::info;
use osr_calendar::dates::format_date;
use osr_data::baseline::{with_baseline, BaselineWindow};
use osr_data::lagged::{check_lag, lagged_merge, AlignedFrame};
use osr_series::site::Site;
use serde_json::{Map, Value};
use std::io::Write;

#[derive(Debug, Clone, Copy)]
pub struct AlignedRequest {
    pub year: i32,
    pub albion_lag: i64,
    pub bonneville_lag: i64,
    pub exclude_recent: i32,
    pub trailing_years: Option<u32>,
}

impl AlignedRequest {
    fn window(&self) -> BaselineWindow {
        let window = BaselineWindow::excluding(self.exclude_recent);
        match self.trailing_years {
            Some(n) => window.trailing(n),
            None => window,
        }
    }

    /// Earliest year the baseline can reach for `site`.
    fn first_year(&self, site: Site) -> i32 {
        match self.trailing_years {
            Some(n) => self
                .year
                .saturating_sub(self.exclude_recent)
                .saturating_sub(i32::try_from(n).unwrap_or(i32::MAX))
                .max(site.first_year()),
            None => site.first_year(),
        }
    }
}

pub async fn run_aligned(
    data: &DataArgs,
    request: AlignedRequest,
    output: &OutputArgs,
) -> anyhow::Result<()> {
    check_lag(request.albion_lag)?;
    check_lag(request.bonneville_lag)?;
    if request.exclude_recent < 0 {
        anyhow::bail!("exclude-recent must not be negative");
    }
    Site::AlbionCpue.check_year(request.year)?;
    Site::BonnevilleCount.check_year(request.year)?;

    let source = data.source();
    let (albion, bonneville) = tokio::try_join!(
        load_site_years(
            source.clone(),
            Site::AlbionCpue,
            request.first_year(Site::AlbionCpue)..=request.year,
        ),
        load_site_years(
            source.clone(),
            Site::BonnevilleCount,
            request.first_year(Site::BonnevilleCount)..=request.year,
        ),
    )?;

    let window = request.window();
    let albion = with_baseline(Site::AlbionCpue, &albion, request.year, window);
    let bonneville = with_baseline(Site::BonnevilleCount, &bonneville, request.year, window);
    let frame = lagged_merge(
        request.year,
        &albion,
        request.albion_lag,
        &bonneville,
        request.bonneville_lag,
    )?;

    write_frame(&frame, output)?;
    info!(
        "Aligned {} complete: {} days, lags {}/{}",
        request.year,
        frame.len(),
        request.albion_lag,
        request.bonneville_lag
    );
    Ok(())
}

fn write_frame(frame: &AlignedFrame, output: &OutputArgs) -> anyhow::Result<()> {
    let mut writer = open_output(output.output.as_deref())?;
    match output.format {
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(writer);
            let mut header = vec!["date".to_string(), "day".to_string()];
            header.extend(frame.columns().iter().cloned());
            wtr.write_record(&header)?;
            for row in frame.rows() {
                let mut record = vec![format_date(&row.date), row.day.to_string()];
                record.extend(row.values.iter().map(|v| format_value(*v)));
                wtr.write_record(&record)?;
            }
            wtr.flush()?;
        }
        OutputFormat::Json => {
            let rows: Vec<Map<String, Value>> = frame
                .rows()
                .iter()
                .map(|row| {
                    let mut object = Map::new();
                    object.insert("date".to_string(), Value::from(format_date(&row.date)));
                    object.insert("day".to_string(), Value::from(row.day.to_string()));
                    for (column, value) in frame.columns().iter().zip(&row.values) {
                        object.insert(column.clone(), value.map_or(Value::Null, Value::from));
                    }
                    object
                })
                .collect();
            serde_json::to_writer_pretty(&mut writer, &rows)?;
            writeln!(writer)?;
            writer.flush()?;
        }
    }
    Ok(())
}
