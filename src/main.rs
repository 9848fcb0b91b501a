use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hdbresale::{cache, HousingProcessor, ProcessorConfig};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Parser)]
#[command(author, version, about = "HDB resale price data: fetch, clean, cache and query")]
struct Args {
    /// YAML config file; `HDB_*` environment variables override it.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, PartialEq, Subcommand)]
enum Command {
    /// Row, town and month counts plus the load source (default).
    Summary,
    /// Distinct towns.
    Towns,
    /// Distinct flat types.
    FlatTypes,
    /// Monthly averages for one town.
    Town { name: String },
    /// Median price per sqm by town and flat type.
    Heatmap,
    /// Write the table to a Parquet or CSV file.
    Export { path: PathBuf },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    std::panic::set_hook(Box::new(|info| {
        eprintln!("panic: {:?}", info);
    }));

    // ─── 2) args + config ────────────────────────────────────────────
    let args = Args::parse();
    let config = ProcessorConfig::load(args.config.as_deref())
        .with_context(|| format!("loading config {:?}", args.config))?;
    info!(
        use_network = config.use_network,
        cache = %config.cache_path.display(),
        "startup"
    );

    // ─── 3) build the table ──────────────────────────────────────────
    let processor = HousingProcessor::build(config).await;

    // ─── 4) answer ───────────────────────────────────────────────────
    match args.command.unwrap_or(Command::Summary) {
        Command::Summary => print_json(&processor.summary())?,
        Command::Towns => print_json(&processor.list_towns())?,
        Command::FlatTypes => print_json(&processor.list_flat_types())?,
        Command::Town { name } => print_json(&processor.town_series(&name))?,
        Command::Heatmap => print_json(&processor.heatmap())?,
        Command::Export { path } => {
            let table = processor.table().context("no table loaded")?;
            cache::save(table, &path).with_context(|| format!("exporting to {:?}", path))?;
            info!(path = %path.display(), rows = table.num_rows(), "exported");
        }
    }
    Ok(())
}
