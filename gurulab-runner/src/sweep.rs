//! Parameter sweeps over the bracket factors.
//!
//! Every grid point is an independent run with its own `Simulator` and result
//! set, so points run in parallel on the rayon pool. Results come back in grid
//! order whatever the thread count.

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use gurulab_core::data::PriceSeries;
use gurulab_core::engine::SimConfig;

use crate::config::StrategyConfig;
use crate::runner::{annotate_for, run_with_evaluator, BacktestResult};

/// Profit and loss factors to combine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamGrid {
    pub profit_factors: Vec<f64>,
    pub loss_factors: Vec<f64>,
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self {
            profit_factors: vec![1.0, 1.5, 2.0, 3.0],
            loss_factors: vec![-0.5, -1.0, -1.5],
        }
    }
}

impl ParamGrid {
    pub fn size(&self) -> usize {
        self.profit_factors.len() * self.loss_factors.len()
    }

    /// One `SimConfig` per combination, profit factor major.
    pub fn configs(&self, base: &SimConfig) -> Vec<SimConfig> {
        let mut configs = Vec::with_capacity(self.size());
        for &profit_factor in &self.profit_factors {
            for &loss_factor in &self.loss_factors {
                configs.push(SimConfig {
                    profit_factor,
                    loss_factor,
                    ..base.clone()
                });
            }
        }
        configs
    }
}

/// Sweep executor.
#[derive(Debug, Clone, Default)]
pub struct ParamSweep {
    /// Worker threads; `None` uses the global rayon pool.
    threads: Option<usize>,
}

impl ParamSweep {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Run `strategy` over `series` once per grid point.
    ///
    /// Indicators are computed once and shared by every run.
    pub fn run(
        &self,
        series: &PriceSeries,
        base: &SimConfig,
        strategy: &StrategyConfig,
        grid: &ParamGrid,
    ) -> Result<SweepResults> {
        strategy.validate()?;
        let evaluator = strategy.build();
        let annotated = PriceSeries {
            instrument: series.instrument.clone(),
            signal: annotate_for(&series.signal, evaluator.as_ref(), &base.unit)?,
            execution: series.execution.clone(),
        };
        let configs = grid.configs(base);
        info!(points = configs.len(), strategy = strategy.name(), "starting sweep");

        let run_all = || -> Result<Vec<SweepEntry>> {
            configs
                .par_iter()
                .map(|sim| -> Result<SweepEntry> {
                    let result = run_with_evaluator(
                        &annotated,
                        sim,
                        evaluator.as_ref(),
                        strategy.evaluator_config(),
                    )
                    .with_context(|| {
                        format!(
                            "run with profit_factor={} loss_factor={} failed",
                            sim.profit_factor, sim.loss_factor
                        )
                    })?;
                    Ok(SweepEntry {
                        profit_factor: sim.profit_factor,
                        loss_factor: sim.loss_factor,
                        result,
                    })
                })
                .collect()
        };

        let entries = match self.threads {
            Some(n) => rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .context("failed to build sweep thread pool")?
                .install(run_all)?,
            None => run_all()?,
        };
        Ok(SweepResults { entries })
    }
}

/// One grid point and its run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepEntry {
    pub profit_factor: f64,
    pub loss_factor: f64,
    pub result: BacktestResult,
}

impl SweepEntry {
    pub fn total_result(&self) -> f64 {
        self.result.summary.total_result
    }
}

/// Sweep output in grid order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepResults {
    entries: Vec<SweepEntry>,
}

impl SweepResults {
    pub fn all(&self) -> &[SweepEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries by total result, best first. Ties keep grid order.
    pub fn sorted_by_total_result(&self) -> Vec<&SweepEntry> {
        let mut sorted: Vec<_> = self.entries.iter().collect();
        sorted.sort_by(|a, b| b.total_result().total_cmp(&a.total_result()));
        sorted
    }

    /// Entry with the highest total result; the earliest in grid order on ties.
    pub fn best(&self) -> Option<&SweepEntry> {
        self.sorted_by_total_result().into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::{generate, SyntheticSpec};

    fn series() -> PriceSeries {
        generate(&SyntheticSpec {
            signal_bars: 150,
            ..SyntheticSpec::default()
        })
        .unwrap()
    }

    fn grid() -> ParamGrid {
        ParamGrid {
            profit_factors: vec![1.0, 2.0],
            loss_factors: vec![-0.5, -1.0, -2.0],
        }
    }

    #[test]
    fn grid_is_profit_major() {
        let configs = grid().configs(&SimConfig::default());
        assert_eq!(configs.len(), 6);
        assert_eq!(
            (configs[0].profit_factor, configs[0].loss_factor),
            (1.0, -0.5)
        );
        assert_eq!(
            (configs[1].profit_factor, configs[1].loss_factor),
            (1.0, -1.0)
        );
        assert_eq!(
            (configs[5].profit_factor, configs[5].loss_factor),
            (2.0, -2.0)
        );
    }

    #[test]
    fn results_follow_grid_order() {
        let results = ParamSweep::new()
            .run(
                &series(),
                &SimConfig::default(),
                &StrategyConfig::default(),
                &grid(),
            )
            .unwrap();
        assert_eq!(results.len(), 6);
        let order: Vec<(f64, f64)> = results
            .all()
            .iter()
            .map(|e| (e.profit_factor, e.loss_factor))
            .collect();
        let expected: Vec<(f64, f64)> = grid()
            .configs(&SimConfig::default())
            .iter()
            .map(|c| (c.profit_factor, c.loss_factor))
            .collect();
        assert_eq!(order, expected);
    }

    #[test]
    fn thread_count_does_not_change_results() {
        let s = series();
        let run = |sweep: ParamSweep| {
            sweep
                .run(&s, &SimConfig::default(), &StrategyConfig::default(), &grid())
                .unwrap()
        };
        assert_eq!(
            run(ParamSweep::new().with_threads(1)),
            run(ParamSweep::new().with_threads(4))
        );
    }

    #[test]
    fn sweep_matches_single_runs() {
        let s = series();
        let results = ParamSweep::new()
            .run(&s, &SimConfig::default(), &StrategyConfig::default(), &grid())
            .unwrap();
        let entry = &results.all()[3];
        let sim = SimConfig {
            profit_factor: entry.profit_factor,
            loss_factor: entry.loss_factor,
            ..SimConfig::default()
        };
        let single =
            crate::runner::run_with_series(&s, &sim, &StrategyConfig::default()).unwrap();
        assert_eq!(entry.result, single);
    }

    #[test]
    fn best_has_highest_total() {
        let results = ParamSweep::new()
            .run(
                &series(),
                &SimConfig::default(),
                &StrategyConfig::default(),
                &grid(),
            )
            .unwrap();
        let best = results.best().unwrap();
        assert!(results
            .all()
            .iter()
            .all(|e| e.total_result() <= best.total_result()));
    }

    #[test]
    fn invalid_factor_fails_sweep() {
        let bad = ParamGrid {
            profit_factors: vec![1.0],
            loss_factors: vec![0.5],
        };
        let err = ParamSweep::new().run(
            &series(),
            &SimConfig::default(),
            &StrategyConfig::default(),
            &bad,
        );
        assert!(err.is_err());
    }
}
