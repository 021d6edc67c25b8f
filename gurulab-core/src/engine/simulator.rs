//! Trade simulator: walks the signal series, opens bracketed trades on the
//! execution series and closes them on stop, take, reversal or end of data.
//!
//! The walk per decision:
//! 1. Evaluate signal bar i. NONE → next bar.
//! 2. Locate the first execution bar at or after `time(i) + entry_delay`.
//!    Enter at its close (ask for BUY, bid for SELL).
//! 3. Check each later execution bar against the bracket, stop first.
//!    Under a reversal policy, opposite signals located at or before the bar
//!    close (and possibly reverse) the trade at the bar's close.
//! 4. Record the trade and resume at the first signal bar located strictly
//!    after the close.

use super::bracket::check_bracket;
use super::config::{ReversalPolicy, SimConfig};
use super::error::{SeriesRole, SimError};
use super::state::{Exit, OpenTrade, RunResult, RunStats, SimState};
use crate::aggregator::ResultSet;
use crate::data::{BarSeries, Quote, SignalBar};
use crate::domain::{Bar, CloseReason, Direction, IdGen, Signal, Trade};
use crate::signals::SignalEvaluator;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

/// Caller-level bound on loop steps.
#[derive(Debug)]
struct Budget {
    limit: Option<u64>,
    used: u64,
}

impl Budget {
    fn tick(&mut self) -> Result<(), SimError> {
        self.used += 1;
        match self.limit {
            Some(budget) if self.used > budget => Err(SimError::IterationBudgetExceeded { budget }),
            _ => Ok(()),
        }
    }
}

/// Mutable state of one `run_test` invocation.
struct Run<'a> {
    signal: &'a BarSeries,
    exec: &'a BarSeries,
    evaluator: &'a dyn SignalEvaluator,
    state: SimState,
    ids: IdGen,
    results: ResultSet,
    stats: RunStats,
    budget: Budget,
}

/// Bracket-exit trade simulator. Immutable once built; every `run_test`
/// starts from a fresh state.
#[derive(Debug, Clone)]
pub struct Simulator {
    config: SimConfig,
}

impl Simulator {
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Validate raw bar sequences, then run.
    pub fn run_bars(
        &self,
        signal: Vec<Bar>,
        execution: Vec<Bar>,
        evaluator: &dyn SignalEvaluator,
    ) -> Result<RunResult, SimError> {
        let signal =
            BarSeries::new(signal).map_err(|e| SimError::from_series(SeriesRole::Signal, e))?;
        let execution = BarSeries::new(execution)
            .map_err(|e| SimError::from_series(SeriesRole::Execution, e))?;
        self.run_test(&signal, &execution, evaluator)
    }

    /// Run one simulation. Deterministic: the same inputs always produce the
    /// same trades and stats.
    pub fn run_test(
        &self,
        signal: &BarSeries,
        exec: &BarSeries,
        evaluator: &dyn SignalEvaluator,
    ) -> Result<RunResult, SimError> {
        info!(
            evaluator = evaluator.name(),
            signal_bars = signal.len(),
            execution_bars = exec.len(),
            "starting simulation"
        );
        if signal.is_empty() {
            info!("signal series is empty; nothing to simulate");
            return Ok(RunResult {
                trades: ResultSet::new(),
                stats: RunStats {
                    execution_bars: exec.len(),
                    ..RunStats::default()
                },
            });
        }
        check_coverage(signal, exec)?;

        let mut run = Run {
            signal,
            exec,
            evaluator,
            state: SimState::Flat,
            ids: IdGen::default(),
            results: ResultSet::new(),
            stats: RunStats {
                signal_bars: signal.len(),
                execution_bars: exec.len(),
                ..RunStats::default()
            },
            budget: Budget {
                limit: self.config.max_iterations,
                used: 0,
            },
        };

        let mut i = 0;
        while i < signal.len() {
            run.budget.tick()?;
            let Some(bar) = signal.bar(i) else { break };
            let Some(direction) = run.evaluate(&bar).direction() else {
                i += 1;
                continue;
            };
            let Some(trade) = self.try_open(&mut run, &bar, direction, None) else {
                i += 1;
                continue;
            };
            run.state.open(trade);

            let close_time = self.manage_open_trade(&mut run, i)?;
            let resume = close_time
                .checked_sub_signed(self.config.entry_delay())
                .map_or(i + 1, |t| signal.first_after(t));
            i = resume.max(i + 1);
        }

        debug_assert!(run.state.is_flat());
        run.stats.iterations = run.budget.used;
        let summary = run.results.summary();
        info!(
            trades = summary.count,
            total_result = summary.total_result,
            win_rate = summary.win_rate,
            "simulation finished"
        );
        Ok(RunResult {
            trades: run.results,
            stats: run.stats,
        })
    }

    /// Build a trade for a decision on `bar`, or log why none can be opened.
    ///
    /// `at` pins the entry to a known execution bar (reversals); otherwise
    /// the entry bar is located from the signal time.
    fn try_open(
        &self,
        run: &mut Run<'_>,
        bar: &SignalBar<'_>,
        direction: Direction,
        at: Option<(usize, f64)>,
    ) -> Option<OpenTrade> {
        let exec = run.exec;
        let (entry, price) = match at {
            Some(pinned) => pinned,
            None => {
                let located = bar
                    .timestamp()
                    .checked_add_signed(self.config.entry_delay())
                    .and_then(|t| exec.locate_at_or_after(t));
                let Some(entry) = located else {
                    warn!(
                        signal_bar = bar.index(),
                        time = %bar.timestamp(),
                        %direction,
                        "no execution bar at or after signal; skipping"
                    );
                    run.stats.skipped_no_execution_bar += 1;
                    return None;
                };
                let exec_bar = &exec.bars()[entry];
                let quote = Quote::new(exec_bar, self.config.use_spread);
                (entry, quote.entry_side(exec_bar, direction).close)
            }
        };

        let Some(unit) = self.config.unit.resolve(bar) else {
            warn!(
                signal_bar = bar.index(),
                time = %bar.timestamp(),
                unit = ?self.config.unit,
                "distance unit undefined or non-positive; skipping"
            );
            run.stats.skipped_invalid_unit += 1;
            return None;
        };

        let trade = OpenTrade::new(
            run.ids.next_trade_id(),
            direction,
            bar.timestamp(),
            exec.bars()[entry].timestamp,
            entry,
            price,
            unit,
            self.config.profit_factor,
            self.config.loss_factor,
        );
        run.stats.trades_opened += 1;
        debug!(
            id = %trade.id,
            %direction,
            open_time = %trade.open_time,
            open_price = trade.open_price,
            stop = trade.stop_price,
            take = trade.take_price,
            unit,
            "opened trade"
        );
        Some(trade)
    }

    /// Drive the open trade (and any trades it reverses into) to a close.
    /// Returns the close time of the last trade.
    fn manage_open_trade(
        &self,
        run: &mut Run<'_>,
        signal_index: usize,
    ) -> Result<DateTime<Utc>, SimError> {
        let (signal, exec) = (run.signal, run.exec);
        // Next signal bar a reversal scan would look at.
        let mut pending = signal_index + 1;
        loop {
            let (exit, reversing) = self.walk(run, &mut pending)?;
            let trade = run.state.take_open();
            let direction = trade.direction;
            let close_time = exec.bars()[exit.bar].timestamp;
            let closed = trade.close(exit, close_time, self.config.trade_units);
            self.record(run, closed);

            let Some(k) = reversing else {
                return Ok(close_time);
            };
            run.stats.reversals += 1;
            if self.config.reversal != ReversalPolicy::Reverse {
                return Ok(close_time);
            }
            let Some(bar) = signal.bar(k) else {
                return Ok(close_time);
            };
            let reopened =
                self.try_open(run, &bar, direction.opposite(), Some((exit.bar, exit.price)));
            match reopened {
                Some(trade) => run.state.open(trade),
                None => return Ok(close_time),
            }
        }
    }

    /// Scan execution bars after the entry of the open trade for its exit.
    ///
    /// Returns the exit and, for reversals, the index of the signal bar that
    /// triggered it.
    fn walk(
        &self,
        run: &mut Run<'_>,
        pending: &mut usize,
    ) -> Result<(Exit, Option<usize>), SimError> {
        let Some(trade) = run.state.open_trade().cloned() else {
            panic!("invariant violated: walking execution bars while flat");
        };
        let (signal, exec) = (run.signal, run.exec);
        let delay = self.config.entry_delay();
        let bars = exec.bars();

        for (j, bar) in bars.iter().enumerate().skip(trade.open_bar + 1) {
            run.budget.tick()?;
            let quote = Quote::new(bar, self.config.use_spread);
            let side = quote.exit_side(bar, trade.direction);
            if let Some(exit) = check_bracket(&trade, &side, j) {
                return Ok((exit, None));
            }
            if self.config.reversal == ReversalPolicy::Ignore {
                continue;
            }
            while let Some(sig_bar) = signal.bar(*pending) {
                match sig_bar.timestamp().checked_add_signed(delay) {
                    Some(t) if t <= bar.timestamp => {}
                    _ => break,
                }
                *pending += 1;
                run.budget.tick()?;
                if run.evaluate(&sig_bar).direction() == Some(trade.direction.opposite()) {
                    let exit = Exit {
                        reason: CloseReason::Reversal,
                        bar: j,
                        price: side.close,
                    };
                    return Ok((exit, Some(sig_bar.index())));
                }
            }
        }

        // Reached only when the trade outlives the data.
        let last = bars.len() - 1;
        let bar = &bars[last];
        let quote = Quote::new(bar, self.config.use_spread);
        let exit = Exit {
            reason: CloseReason::EndOfData,
            bar: last,
            price: quote.exit_side(bar, trade.direction).close,
        };
        Ok((exit, None))
    }

    fn record(&self, run: &mut Run<'_>, trade: Trade) {
        run.stats.trades_closed += 1;
        debug!(
            id = %trade.id,
            direction = %trade.direction,
            reason = %trade.close_reason,
            close_time = %trade.close_time,
            close_price = trade.close_price,
            result = trade.result,
            "closed trade"
        );
        run.results.record(trade);
    }
}

impl Run<'_> {
    fn evaluate(&mut self, bar: &SignalBar<'_>) -> Signal {
        self.stats.signals_evaluated += 1;
        let signal = self.evaluator.evaluate(bar);
        if !signal.is_none() {
            self.stats.decisions += 1;
        }
        signal
    }
}

/// The execution series must span the signal series.
fn check_coverage(signal: &BarSeries, exec: &BarSeries) -> Result<(), SimError> {
    let (Some(sig_first), Some(sig_last)) = (signal.first_timestamp(), signal.last_timestamp())
    else {
        return Ok(());
    };
    let (Some(exec_first), Some(exec_last)) = (exec.first_timestamp(), exec.last_timestamp())
    else {
        return Err(SimError::InsufficientData(format!(
            "execution series is empty but signal series has {} bars",
            signal.len()
        )));
    };
    if exec_first > sig_first {
        return Err(SimError::InsufficientData(format!(
            "execution series starts at {exec_first}, after first signal bar at {sig_first}"
        )));
    }
    if exec_last < sig_last {
        return Err(SimError::InsufficientData(format!(
            "execution series ends at {exec_last}, before last signal bar at {sig_last}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_support::hourly_bars;
    use crate::engine::config::DistanceUnit;
    use crate::signals::FnEvaluator;

    fn always(signal: Signal) -> impl SignalEvaluator {
        FnEvaluator::new("always", move |_: &SignalBar<'_>| signal)
    }

    fn fixed_unit(unit: f64) -> SimConfig {
        SimConfig {
            unit: DistanceUnit::Fixed { value: unit },
            use_spread: false,
            ..SimConfig::default()
        }
    }

    #[test]
    fn rejects_invalid_config() {
        let err = Simulator::new(SimConfig {
            loss_factor: 1.0,
            ..SimConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, SimError::InvalidConfig(_)));
    }

    #[test]
    fn empty_signal_series_is_empty_result() {
        let sim = Simulator::new(fixed_unit(0.01)).unwrap();
        let exec = BarSeries::new(hourly_bars(&[1.0, 1.1])).unwrap();
        let result = sim
            .run_test(&BarSeries::default(), &exec, &always(Signal::Buy))
            .unwrap();
        assert!(result.trades.is_empty());
        assert_eq!(result.summary().count, 0);
    }

    #[test]
    fn empty_execution_series_is_insufficient() {
        let sim = Simulator::new(fixed_unit(0.01)).unwrap();
        let signal = BarSeries::new(hourly_bars(&[1.0, 1.1])).unwrap();
        let err = sim
            .run_test(&signal, &BarSeries::default(), &always(Signal::Buy))
            .unwrap_err();
        assert!(matches!(err, SimError::InsufficientData(_)));
    }

    #[test]
    fn short_execution_series_is_insufficient() {
        let sim = Simulator::new(fixed_unit(0.01)).unwrap();
        let signal = BarSeries::new(hourly_bars(&[1.0, 1.1, 1.2])).unwrap();
        let exec = BarSeries::new(hourly_bars(&[1.0, 1.1])).unwrap();
        let err = sim
            .run_test(&signal, &exec, &always(Signal::None))
            .unwrap_err();
        assert!(matches!(err, SimError::InsufficientData(_)));
    }

    #[test]
    fn run_bars_reports_ordering() {
        let sim = Simulator::new(fixed_unit(0.01)).unwrap();
        let mut exec = hourly_bars(&[1.0, 1.1, 1.2]);
        exec.swap(1, 2);
        let err = sim
            .run_bars(hourly_bars(&[1.0]), exec, &always(Signal::None))
            .unwrap_err();
        assert!(matches!(
            err,
            SimError::Ordering {
                role: SeriesRole::Execution,
                ..
            }
        ));
    }

    #[test]
    fn unbounded_entry_delay_is_rejected() {
        let err = Simulator::new(SimConfig {
            entry_delay_secs: i64::MAX,
            ..fixed_unit(0.01)
        })
        .unwrap_err();
        assert!(matches!(err, SimError::InvalidConfig(_)));
    }

    #[test]
    fn longest_delay_skips_signals() {
        let sim = Simulator::new(SimConfig {
            entry_delay_secs: crate::engine::MAX_ENTRY_DELAY_SECS,
            reversal: ReversalPolicy::Close,
            ..fixed_unit(0.01)
        })
        .unwrap();
        let series = BarSeries::new(hourly_bars(&[1.0, 1.1, 1.2, 1.3])).unwrap();
        let result = sim
            .run_test(&series, &series, &always(Signal::Buy))
            .unwrap();
        assert!(result.trades.is_empty());
        assert_eq!(result.stats.skipped_no_execution_bar, 4);
    }

    #[test]
    fn delay_past_the_last_representable_time_skips_signals() {
        let end = DateTime::<Utc>::MAX_UTC;
        let bars = vec![
            Bar::new(end - chrono::Duration::hours(1), 1.0, 1.0, 1.0, 1.0),
            Bar::new(end, 1.0, 1.0, 1.0, 1.0),
        ];
        let sim = Simulator::new(SimConfig {
            entry_delay_secs: 3600,
            reversal: ReversalPolicy::Reverse,
            ..fixed_unit(0.01)
        })
        .unwrap();
        let result = sim
            .run_bars(bars.clone(), bars, &always(Signal::Sell))
            .unwrap();
        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.stats.skipped_no_execution_bar, 1);
        assert_eq!(result.trades.trades()[0].close_reason, CloseReason::EndOfData);
    }

    #[test]
    fn budget_exceeded() {
        let sim = Simulator::new(SimConfig {
            max_iterations: Some(2),
            ..fixed_unit(0.01)
        })
        .unwrap();
        let series = BarSeries::new(hourly_bars(&[1.0, 1.1, 1.2, 1.3])).unwrap();
        let err = sim
            .run_test(&series, &series, &always(Signal::None))
            .unwrap_err();
        assert_eq!(err, SimError::IterationBudgetExceeded { budget: 2 });
    }

    #[test]
    fn entry_on_last_bar_closes_end_of_data_same_bar() {
        let sim = Simulator::new(fixed_unit(1.0)).unwrap();
        let series = BarSeries::new(hourly_bars(&[1.0, 1.1])).unwrap();
        let eval = FnEvaluator::new("last", |b: &SignalBar<'_>| {
            if b.index() == 1 {
                Signal::Buy
            } else {
                Signal::None
            }
        });
        let result = sim.run_test(&series, &series, &eval).unwrap();
        let trade = &result.trades.trades()[0];
        assert_eq!(trade.close_reason, CloseReason::EndOfData);
        assert_eq!(trade.bars_held, 0);
        assert_eq!(trade.close_price, trade.open_price);
        assert_eq!(trade.result, 0.0);
    }
}
