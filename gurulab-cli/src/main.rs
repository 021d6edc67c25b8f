//! GuruLab CLI: run, sweep and synthetic-data commands.
//!
//! Commands:
//! - `run`: execute a backtest from a TOML config file and save its artifacts
//! - `sweep`: run a config over a grid of profit/loss factors
//! - `synth`: write a seeded synthetic signal/execution CSV pair
//!
//! Log verbosity is read from `GURULAB_LOG` (default `info`).

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use gurulab_core::data::PriceSeriesProvider;
use gurulab_runner::{
    generate, run_backtest, save_artifacts, write_bars, BacktestConfig, BacktestResult,
    CsvProvider, ParamGrid, ParamSweep, SweepResults, SyntheticSpec,
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "gurulab",
    about = "GuruLab CLI: bracket-exit backtester over signal and execution series"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest from a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Output directory for the result JSON and trade CSV.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Run a config once per profit/loss factor combination.
    Sweep {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Comma-separated profit factors, e.g. 1,1.5,2.
        #[arg(long, value_delimiter = ',', required = true)]
        profit_factors: Vec<f64>,

        /// Comma-separated loss factors, e.g. -1,-0.5.
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
        loss_factors: Vec<f64>,

        /// Worker threads. Defaults to one per core.
        #[arg(long)]
        threads: Option<usize>,
    },
    /// Write a synthetic signal.csv / execution.csv pair.
    Synth {
        /// Directory to write into (created if missing).
        #[arg(long)]
        out_dir: PathBuf,

        /// RNG seed.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Number of signal bars (hours).
        #[arg(long, default_value_t = 500)]
        hours: usize,

        /// First execution bar timestamp (RFC 3339). Defaults to 2024-01-01T00:00:00Z.
        #[arg(long)]
        start: Option<String>,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, output_dir } => run_cmd(config, output_dir),
        Commands::Sweep {
            config,
            profit_factors,
            loss_factors,
            threads,
        } => sweep_cmd(config, profit_factors, loss_factors, threads),
        Commands::Synth {
            out_dir,
            seed,
            hours,
            start,
        } => synth_cmd(out_dir, seed, hours, start),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("GURULAB_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_cmd(config_path: PathBuf, output_dir: PathBuf) -> Result<()> {
    let config = BacktestConfig::from_file(&config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    info!(config = %config_path.display(), strategy = config.strategy.name(), "loaded config");
    let result = run_backtest(&config)?;

    print_summary(&result);

    let paths = save_artifacts(&result, &output_dir)?;
    println!("Result saved to: {}", paths.json.display());
    println!("Trades saved to: {}", paths.trades_csv.display());
    Ok(())
}

fn sweep_cmd(
    config_path: PathBuf,
    profit_factors: Vec<f64>,
    loss_factors: Vec<f64>,
    threads: Option<usize>,
) -> Result<()> {
    if threads == Some(0) {
        bail!("--threads must be at least 1");
    }
    let config = BacktestConfig::from_file(&config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    let series = CsvProvider::from_config(&config.data).load()?;
    info!(
        signal_bars = series.signal.len(),
        execution_bars = series.execution.len(),
        "loaded series"
    );

    let grid = ParamGrid {
        profit_factors,
        loss_factors,
    };
    let mut sweep = ParamSweep::new();
    if let Some(n) = threads {
        sweep = sweep.with_threads(n);
    }
    let results = sweep.run(&series, &config.simulation, &config.strategy, &grid)?;

    print_sweep(&config, &results);
    Ok(())
}

fn synth_cmd(out_dir: PathBuf, seed: u64, hours: usize, start: Option<String>) -> Result<()> {
    let mut spec = SyntheticSpec {
        seed,
        signal_bars: hours,
        ..SyntheticSpec::default()
    };
    if let Some(s) = start {
        spec.start = DateTime::parse_from_rfc3339(&s)
            .with_context(|| format!("invalid --start '{s}'"))?
            .with_timezone(&Utc);
    }

    let series = generate(&spec)?;
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;
    let signal_path = out_dir.join("signal.csv");
    let exec_path = out_dir.join("execution.csv");
    write_bars(&signal_path, series.signal.bars())?;
    write_bars(&exec_path, series.execution.bars())?;

    println!(
        "Wrote {} signal bars to {}",
        series.signal.len(),
        signal_path.display()
    );
    println!(
        "Wrote {} execution bars to {}",
        series.execution.len(),
        exec_path.display()
    );
    Ok(())
}

fn print_summary(result: &BacktestResult) {
    let m = &result.metrics;
    println!();
    println!("=== Backtest Result ===");
    println!("Run:            {}", result.run_id);
    println!("Instrument:     {}", result.instrument());
    println!("Strategy:       {}", result.strategy());
    if let (Some(start), Some(end)) = (result.start, result.end) {
        println!("Period:         {start} to {end}");
    }
    println!(
        "Bars:           {} signal / {} execution",
        result.stats.signal_bars, result.stats.execution_bars
    );
    println!(
        "Signals:        {} decisions ({} skipped: no bar, {} skipped: unit)",
        result.stats.decisions,
        result.stats.skipped_no_execution_bar,
        result.stats.skipped_invalid_unit
    );
    println!("Trades:         {}", m.trade_count);
    println!();
    println!("--- Performance ---");
    println!("Total Result:   {:.5}", m.total_result);
    println!("Avg Result:     {:.5}", m.avg_result);
    println!("Win Rate:       {:.1}%", m.win_rate * 100.0);
    println!("Profit Factor:  {:.2}", m.profit_factor);
    println!("Max Drawdown:   {:.5}", m.max_drawdown);
    println!("Max Consec Win: {}", m.max_consecutive_wins);
    println!("Max Consec Loss:{}", m.max_consecutive_losses);
    println!("Avg Bars Held:  {:.1}", m.avg_bars_held);
    println!(
        "Exits:          {} take / {} stop / {} reversal / {} end of data",
        m.by_reason.take, m.by_reason.stop, m.by_reason.reversal, m.by_reason.end_of_data
    );
    println!(
        "Direction:      {} buy / {} sell",
        m.by_direction.buy, m.by_direction.sell
    );
    println!();
}

fn print_sweep(config: &BacktestConfig, results: &SweepResults) {
    println!();
    println!(
        "=== Sweep: {} on {} ({} runs) ===",
        config.strategy.name(),
        config.data.instrument,
        results.len()
    );
    println!(
        "{:>8} {:>8} {:>7} {:>12} {:>8} {:>8} {:>12}",
        "Profit", "Loss", "Trades", "Total", "Win%", "PF", "MaxDD"
    );
    println!("{}", "-".repeat(71));
    for entry in results.sorted_by_total_result() {
        let m = &entry.result.metrics;
        println!(
            "{:>8.2} {:>8.2} {:>7} {:>12.5} {:>7.1}% {:>8.2} {:>12.5}",
            entry.profit_factor,
            entry.loss_factor,
            m.trade_count,
            m.total_result,
            m.win_rate * 100.0,
            m.profit_factor,
            m.max_drawdown
        );
    }
    println!();
}
