//! Annual totals export.

use crate::load::load_site_years;
use crate::output::write_records;
use crate::{DataArgs, OutputArgs};
use log::info;
use osr_data::baseline::annual_totals;
use osr_series::site::Site;

pub async fn run_totals(
    data: &DataArgs,
    site: Site,
    from: Option<i32>,
    to: i32,
    output: &OutputArgs,
) -> anyhow::Result<()> {
    let from = from.unwrap_or_else(|| site.first_year());
    if from > to {
        anyhow::bail!("empty year range {from}..={to}");
    }
    site.check_year(from)?;
    site.check_year(to)?;

    let arena = load_site_years(data.source(), site, from..=to).await?;
    let totals = annual_totals(&arena);
    write_records(&totals, output.output.as_deref(), output.format)?;
    info!("Totals for {site}: {} years", totals.len());
    Ok(())
}
