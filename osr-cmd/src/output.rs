//! CSV and JSON writers for command output.

use clap::ValueEnum;
use log::info;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

/// Open `path` for writing, or stdout when there is no path.
pub fn open_output(path: Option<&Path>) -> anyhow::Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout())),
    })
}

/// Write serializable records with a header row (CSV) or as a JSON array.
pub fn write_records<T: Serialize>(
    records: &[T],
    path: Option<&Path>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let writer = open_output(path)?;
    match format {
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(writer);
            for record in records {
                wtr.serialize(record)?;
            }
            wtr.flush()?;
        }
        OutputFormat::Json => {
            let mut writer = writer;
            serde_json::to_writer_pretty(&mut writer, records)?;
            writeln!(writer)?;
            writer.flush()?;
        }
    }
    if let Some(path) = path {
        info!("Wrote {} records to {}", records.len(), path.display());
    }
    Ok(())
}

/// Empty string for a missing value, as the rendering layer expects.
pub fn format_value(value: Option<f64>) -> String {
    value.map_or(String::new(), |v| v.to_string())
}
