//! OpenAlpha CLI — simulation, synthetic data and store inspection commands.
//!
//! Commands:
//! - `run` — simulate every alpha in a TOML file and write per-alpha reports
//! - `synth` — generate a seeded synthetic market into a Parquet store
//! - `data status` — report the calendar and datasets held by a store

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use openalpha_core::data::{
    generate_market, DataProvider, DatasetKind, ParquetStore, SyntheticConfig, DATE, SYMBOL,
};
use openalpha_runner::{run_from_config, RunOutcome, SimulationConfig};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Store files that hold the calendar rather than a panel.
const CALENDAR_FILES: [&str; 2] = [DATE, SYMBOL];

#[derive(Parser)]
#[command(
    name = "openalpha",
    about = "OpenAlpha CLI — cross-sectional alpha simulation engine"
)]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate every alpha in a TOML config file.
    Run {
        /// Path to the simulation TOML file.
        #[arg(long)]
        config: PathBuf,
    },
    /// Generate a synthetic market and write it to a Parquet store.
    Synth {
        /// Store directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        cache_dir: PathBuf,

        /// Number of business days.
        #[arg(long, default_value_t = 252)]
        dates: usize,

        /// Number of symbols.
        #[arg(long, default_value_t = 100)]
        symbols: usize,

        /// Number of sectors.
        #[arg(long, default_value_t = 8)]
        sectors: usize,

        /// RNG seed.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// First calendar date (YYYY-MM-DD).
        #[arg(long, default_value = "2020-01-01")]
        start: String,

        /// Probability that a single close is missing.
        #[arg(long, default_value_t = 0.0)]
        missing_rate: f64,
    },
    /// Inspect the data store.
    Data {
        #[command(subcommand)]
        action: DataAction,
    },
}

#[derive(Subcommand)]
enum DataAction {
    /// Report calendar dimensions and every dataset in the store.
    Status {
        /// Store directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        cache_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run { config } => run_simulation_cmd(&config),
        Commands::Synth {
            cache_dir,
            dates,
            symbols,
            sectors,
            seed,
            start,
            missing_rate,
        } => {
            let config = SyntheticConfig {
                num_dates: dates,
                num_symbols: symbols,
                num_sectors: sectors,
                start: parse_date(&start)?,
                seed,
                missing_rate,
            };
            run_synth(&cache_dir, &config)
        }
        Commands::Data { action } => match action {
            DataAction::Status { cache_dir } => run_data_status(&cache_dir),
        },
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{s}': expected YYYY-MM-DD"))
}

fn run_simulation_cmd(config_path: &Path) -> Result<()> {
    let config = SimulationConfig::from_file(config_path)?;
    if config.alphas.is_empty() {
        bail!("{} defines no alphas", config_path.display());
    }
    let outcome = run_from_config(&config)?;
    print_outcome(&outcome, &config);
    Ok(())
}

fn print_outcome(outcome: &RunOutcome, config: &SimulationConfig) {
    println!();
    println!(
        "{:<20} {:>6} {:>10} {:>10} {:>8} {:>10} {:>10}",
        "Alpha", "Days", "Ann. Ret", "Ann. Vol", "Sharpe", "Turnover", "Max DD"
    );
    println!("{}", "-".repeat(80));
    for written in &outcome.reports {
        let m = &written.summary.metrics;
        println!(
            "{:<20} {:>6} {:>9.2}% {:>9.2}% {:>8.3} {:>9.2}% {:>9.2}%",
            written.summary.alpha,
            m.trading_days,
            m.annualized_return * 100.0,
            m.annualized_volatility * 100.0,
            m.sharpe,
            m.mean_turnover * 100.0,
            m.max_drawdown * 100.0,
        );
    }

    if !outcome.skipped.is_empty() {
        println!();
        println!("Skipped {} alpha(s):", outcome.skipped.len());
        for (name, reason) in &outcome.skipped {
            println!("  {name}: {reason}");
        }
    }

    println!();
    println!("Reports written to: {}", config.store_path.display());
}

fn run_synth(cache_dir: &Path, config: &SyntheticConfig) -> Result<()> {
    if !(0.0..1.0).contains(&config.missing_rate) {
        bail!("--missing-rate must be in [0, 1), got {}", config.missing_rate);
    }
    let market = generate_market(config)?;
    let store = ParquetStore::new(cache_dir);
    market.write_to(&store)?;

    println!(
        "Wrote {} datasets ({} dates x {} symbols) to {}",
        market.datasets.len(),
        market.calendar.num_dates(),
        market.calendar.num_symbols(),
        cache_dir.display()
    );
    Ok(())
}

fn run_data_status(cache_dir: &Path) -> Result<()> {
    if !cache_dir.exists() {
        println!("Store directory does not exist: {}", cache_dir.display());
        return Ok(());
    }

    let store = ParquetStore::new(cache_dir);
    let names: Vec<String> = store
        .list()?
        .into_iter()
        .filter(|name| !CALENDAR_FILES.contains(&name.as_str()))
        .collect();

    println!("Store: {}", cache_dir.display());
    match store.calendar() {
        Ok(calendar) => {
            let first = calendar.dates.first().map(i64::to_string);
            let last = calendar.dates.last().map(i64::to_string);
            println!(
                "Calendar: {} dates x {} symbols ({} to {})",
                calendar.num_dates(),
                calendar.num_symbols(),
                first.as_deref().unwrap_or("-"),
                last.as_deref().unwrap_or("-"),
            );
        }
        Err(e) => println!("Calendar: unavailable ({e})"),
    }

    if names.is_empty() {
        println!("No datasets.");
        return Ok(());
    }

    println!();
    println!("{:<20} {:<6} {:<14}", "Dataset", "Kind", "Shape");
    println!("{}", "-".repeat(42));
    for name in &names {
        match store.get(name) {
            Ok(dataset) => {
                let kind = match dataset.kind() {
                    DatasetKind::Float => "float",
                    DatasetKind::Int => "int",
                };
                println!(
                    "{:<20} {:<6} {:<14}",
                    name,
                    kind,
                    format!("{}x{}", dataset.num_dates(), dataset.num_symbols())
                );
            }
            Err(e) => println!("{name:<20} error: {e}"),
        }
    }
    Ok(())
}
