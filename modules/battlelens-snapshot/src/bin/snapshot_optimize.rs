use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use battlelens_snapshot::optimize::{optimize_snapshot, OptimizeOptions};

#[derive(Parser)]
#[command(
    name = "snapshot-optimize",
    about = "Split a property snapshot into table and detail files"
)]
struct Cli {
    /// Input CSV, plain or gzip-compressed
    input: PathBuf,

    /// Directory for table_data.csv.gz, detail_data.csv.gz and data_index.json
    #[arg(long, default_value = "./optimized_data")]
    output_dir: PathBuf,

    /// Rows kept in the detail file; larger inputs are sampled
    #[arg(long, default_value_t = 10_000)]
    max_detail_rows: usize,

    /// Seed for the detail sample
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if !cli.input.exists() {
        anyhow::bail!("Input file {} not found", cli.input.display());
    }

    let options = OptimizeOptions {
        max_detail_rows: cli.max_detail_rows,
        sample_seed: cli.seed,
    };
    let report = optimize_snapshot(&cli.input, &cli.output_dir, &options)?;

    let pct = |bytes: u64| {
        if report.input_bytes == 0 {
            0.0
        } else {
            bytes as f64 / report.input_bytes as f64 * 100.0
        }
    };
    tracing::info!(
        table = %report.table_file.display(),
        detail = %report.detail_file.display(),
        index = %report.index_file.display(),
        table_pct_of_input = %format!("{:.1}", pct(report.table_bytes)),
        detail_pct_of_input = %format!("{:.1}", pct(report.detail_bytes)),
        total_rows = report.index.total_rows,
        detail_rows = report.index.detail_rows,
        "Wrote optimized snapshot"
    );
    Ok(())
}
