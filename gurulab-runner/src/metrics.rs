//! Performance metrics: pure functions over a closed-trade list.
//!
//! Results are price deltas times traded units, so every amount here is in
//! the same units as `Trade::result`. Drawdown is measured on the cumulative
//! result curve, not on an account balance.

use gurulab_core::domain::{CloseReason, Direction, Trade};
use serde::{Deserialize, Serialize};

/// Aggregate statistics of one run's trades.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub trade_count: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub total_result: f64,
    pub avg_result: f64,
    pub gross_profit: f64,
    pub gross_loss: f64,
    pub profit_factor: f64,
    /// Largest peak-to-trough fall of the cumulative result, as a negative amount.
    pub max_drawdown: f64,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,
    pub avg_bars_held: f64,
    pub by_reason: ReasonCounts,
    pub by_direction: DirectionCounts,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasonCounts {
    pub stop: usize,
    pub take: usize,
    pub end_of_data: usize,
    pub reversal: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionCounts {
    pub buy: usize,
    pub sell: usize,
}

impl PerformanceMetrics {
    pub fn compute(trades: &[Trade]) -> Self {
        let wins = trades.iter().filter(|t| t.is_winner()).count();
        let losses = trades.iter().filter(|t| t.result < 0.0).count();
        let total_result = total_result(trades);
        Self {
            trade_count: trades.len(),
            wins,
            losses,
            win_rate: win_rate(trades),
            total_result,
            avg_result: if trades.is_empty() {
                0.0
            } else {
                total_result / trades.len() as f64
            },
            gross_profit: gross_profit(trades),
            gross_loss: gross_loss(trades),
            profit_factor: profit_factor(trades),
            max_drawdown: max_drawdown(&cumulative_results(trades)),
            max_consecutive_wins: max_consecutive_wins(trades),
            max_consecutive_losses: max_consecutive_losses(trades),
            avg_bars_held: avg_bars_held(trades),
            by_reason: reason_counts(trades),
            by_direction: direction_counts(trades),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

pub fn total_result(trades: &[Trade]) -> f64 {
    trades.iter().map(|t| t.result).sum()
}

/// Fraction of trades with a positive result. 0.0 for no trades.
pub fn win_rate(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    winners as f64 / trades.len() as f64
}

pub fn gross_profit(trades: &[Trade]) -> f64 {
    trades.iter().map(|t| t.result).filter(|r| *r > 0.0).sum()
}

/// Sum of losing results as a positive amount.
pub fn gross_loss(trades: &[Trade]) -> f64 {
    trades
        .iter()
        .map(|t| t.result)
        .filter(|r| *r < 0.0)
        .map(f64::abs)
        .sum()
}

/// Gross profit / gross loss.
///
/// Capped at 100.0 for edge cases (all winners, zero losses).
pub fn profit_factor(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let profit = gross_profit(trades);
    let loss = gross_loss(trades);
    if loss < 1e-12 {
        return if profit > 0.0 { 100.0 } else { 0.0 };
    }
    (profit / loss).min(100.0)
}

/// Running sum of results, starting from zero before the first trade.
pub fn cumulative_results(trades: &[Trade]) -> Vec<f64> {
    let mut curve = Vec::with_capacity(trades.len() + 1);
    let mut acc = 0.0;
    curve.push(acc);
    for t in trades {
        acc += t.result;
        curve.push(acc);
    }
    curve
}

/// Largest fall from a running peak, as a non-positive amount.
pub fn max_drawdown(curve: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;
    for &v in curve {
        peak = peak.max(v);
        max_dd = max_dd.min(v - peak);
    }
    max_dd
}

pub fn max_consecutive_wins(trades: &[Trade]) -> usize {
    max_consecutive(trades, true)
}

/// Breakeven trades count as losses here, as in `win_rate`.
pub fn max_consecutive_losses(trades: &[Trade]) -> usize {
    max_consecutive(trades, false)
}

pub fn avg_bars_held(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().map(|t| t.bars_held).sum::<usize>() as f64 / trades.len() as f64
}

pub fn reason_counts(trades: &[Trade]) -> ReasonCounts {
    let mut counts = ReasonCounts::default();
    for t in trades {
        match t.close_reason {
            CloseReason::Stop => counts.stop += 1,
            CloseReason::Take => counts.take += 1,
            CloseReason::EndOfData => counts.end_of_data += 1,
            CloseReason::Reversal => counts.reversal += 1,
        }
    }
    counts
}

pub fn direction_counts(trades: &[Trade]) -> DirectionCounts {
    let mut counts = DirectionCounts::default();
    for t in trades {
        match t.direction {
            Direction::Buy => counts.buy += 1,
            Direction::Sell => counts.sell += 1,
        }
    }
    counts
}

fn max_consecutive(trades: &[Trade], winners: bool) -> usize {
    let mut max_streak = 0;
    let mut current = 0;
    for trade in trades {
        if trade.is_winner() == winners {
            current += 1;
            max_streak = max_streak.max(current);
        } else {
            current = 0;
        }
    }
    max_streak
}
