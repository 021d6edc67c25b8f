//! Backtest runner: wires together data, indicator annotation, the simulator
//! and metrics.
//!
//! Entry points:
//! - `run_backtest()`: loads the CSV series named by a `BacktestConfig`. Used by the CLI.
//! - `run_with_series()`: pre-loaded series + strategy config. Used by sweeps.
//! - `run_with_evaluator()`: pre-loaded series + any `SignalEvaluator`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use gurulab_core::data::{BarSeries, PriceSeries, PriceSeriesProvider, SeriesError};
use gurulab_core::domain::Trade;
use gurulab_core::engine::{DistanceUnit, RunStats, SimConfig, SimError, Simulator};
use gurulab_core::fingerprint::{EvaluatorConfig, RunFingerprint};
use gurulab_core::indicators::{annotate_all, Indicator};
use gurulab_core::signals::SignalEvaluator;
use gurulab_core::Summary;

use crate::config::{BacktestConfig, ConfigError, StrategyConfig};
use crate::data_loader::{CsvProvider, LoadError};
use crate::metrics::PerformanceMetrics;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("indicator annotation failed: {0}")]
    Annotation(#[from] SeriesError),
    #[error("simulation failed: {0}")]
    Simulation(#[from] SimError),
    #[error("failed to fingerprint run: {0}")]
    Fingerprint(#[from] serde_json::Error),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Short id of `fingerprint`, used for artifact names.
    pub run_id: String,
    pub fingerprint: RunFingerprint,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub summary: Summary,
    pub metrics: PerformanceMetrics,
    pub stats: RunStats,
    pub trades: Vec<Trade>,
}

/// Default schema version for serde deserialization of older JSON without the field.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl BacktestResult {
    pub fn instrument(&self) -> &str {
        &self.fingerprint.instrument
    }

    pub fn strategy(&self) -> &str {
        &self.fingerprint.evaluator.name
    }
}

/// Run the backtest a config file describes, reading both CSV series.
pub fn run_backtest(config: &BacktestConfig) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let provider = CsvProvider::from_config(&config.data);
    let series = provider.load()?;
    run_with_series(&series, &config.simulation, &config.strategy)
}

/// Run a built-in strategy over pre-loaded series. No I/O.
pub fn run_with_series(
    series: &PriceSeries,
    sim: &SimConfig,
    strategy: &StrategyConfig,
) -> Result<BacktestResult, RunError> {
    strategy.validate()?;
    let evaluator = strategy.build();
    run_with_evaluator(series, sim, evaluator.as_ref(), strategy.evaluator_config())
}

/// Run any evaluator over pre-loaded series. `identity` names the evaluator
/// in the run fingerprint.
pub fn run_with_evaluator(
    series: &PriceSeries,
    sim: &SimConfig,
    evaluator: &dyn SignalEvaluator,
    identity: EvaluatorConfig,
) -> Result<BacktestResult, RunError> {
    let simulator = Simulator::new(sim.clone())?;
    let signal = annotate_for(&series.signal, evaluator, &sim.unit)?;
    let fingerprint =
        RunFingerprint::new(&series.instrument, sim, identity, &signal, &series.execution)?;
    let run_id = fingerprint.id();

    info!(
        run_id = %run_id,
        instrument = %series.instrument,
        evaluator = evaluator.name(),
        "starting backtest"
    );

    let outcome = simulator.run_test(&signal, &series.execution, evaluator)?;
    let summary = outcome.summary();
    let trades = outcome.trades.into_trades();
    let metrics = PerformanceMetrics::compute(&trades);

    info!(
        run_id = %run_id,
        trades = summary.count,
        total_result = summary.total_result,
        "backtest finished"
    );

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id,
        fingerprint,
        start: series.signal.first_timestamp(),
        end: series.signal.last_timestamp(),
        summary,
        metrics,
        stats: outcome.stats,
        trades,
    })
}

/// Attach every indicator the evaluator and the distance unit read, skipping
/// columns the series already carries.
pub fn annotate_for(
    signal: &BarSeries,
    evaluator: &dyn SignalEvaluator,
    unit: &DistanceUnit,
) -> Result<BarSeries, SeriesError> {
    let mut needed: Vec<Box<dyn Indicator>> = Vec::new();
    for ind in evaluator
        .required_indicators()
        .into_iter()
        .chain(unit.required_indicator())
    {
        let duplicate = needed.iter().any(|n| n.name() == ind.name());
        if !duplicate && !signal.has_column(ind.name()) {
            needed.push(ind);
        }
    }
    annotate_all(signal, &needed)
}
