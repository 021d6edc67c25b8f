//! GuruLab Runner: backtest orchestration around `gurulab-core`.
//!
//! This crate provides:
//! - TOML backtest configs naming the data files, simulation settings and strategy
//! - A CSV-backed `PriceSeriesProvider` and a seeded synthetic series generator
//! - Single-run orchestration with indicator annotation and run fingerprints
//! - Trade-level performance metrics
//! - Parallel sweeps over the bracket factors
//! - JSON and CSV export of results

pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod runner;
pub mod sweep;
pub mod synthetic;

pub use config::{BacktestConfig, BarStamp, ConfigError, DataConfig, StrategyConfig};
pub use data_loader::{read_series, write_bars, CsvProvider, LoadError};
pub use export::{export_json, export_trades_csv, import_json, save_artifacts, ArtifactPaths};
pub use metrics::PerformanceMetrics;
pub use runner::{
    run_backtest, run_with_evaluator, run_with_series, BacktestResult, RunError, SCHEMA_VERSION,
};
pub use sweep::{ParamGrid, ParamSweep, SweepEntry, SweepResults};
pub use synthetic::{generate, SyntheticError, SyntheticSpec};
