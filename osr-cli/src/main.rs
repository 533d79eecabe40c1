//! OSR CLI - Command line tool for aligning salmon run series and extracting
//! orca sighting peaks.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "osr-cli",
    version,
    about = "Align salmon run series and find orca sighting peaks",
    long_about = "Reads per-year Chinook catch-rate, dam count and lake count tables, \
                  and southern resident orca sighting logs from two providers, from a \
                  data directory. Lines the salmon series up by travel lag against a \
                  multi-year baseline, counts sightings per day by pod and region, and \
                  reports each year's peak day and the days above a percentile. Set \
                  RUST_LOG=info to see which years were skipped."
)]
struct Cli {
    #[command(subcommand)]
    command: osr_cmd::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    log::debug!("osr-cli {}", env!("CARGO_PKG_VERSION"));
    osr_cmd::run(cli.command).await
}
