//! Trade state machine, run statistics and run result.

use crate::aggregator::{ResultSet, Summary};
use crate::domain::{CloseReason, Direction, Trade, TradeId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The single in-flight trade of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenTrade {
    pub id: TradeId,
    pub direction: Direction,
    pub signal_time: DateTime<Utc>,
    pub open_time: DateTime<Utc>,
    pub open_bar: usize,
    pub open_price: f64,
    pub stop_price: f64,
    pub take_price: f64,
    pub unit: f64,
}

impl OpenTrade {
    /// Bracket levels: `open + sign * factor * unit`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: TradeId,
        direction: Direction,
        signal_time: DateTime<Utc>,
        open_time: DateTime<Utc>,
        open_bar: usize,
        open_price: f64,
        unit: f64,
        profit_factor: f64,
        loss_factor: f64,
    ) -> Self {
        let sign = direction.sign();
        Self {
            id,
            direction,
            signal_time,
            open_time,
            open_bar,
            open_price,
            stop_price: open_price + sign * loss_factor * unit,
            take_price: open_price + sign * profit_factor * unit,
            unit,
        }
    }

    pub fn close(self, exit: Exit, close_time: DateTime<Utc>, trade_units: f64) -> Trade {
        let result = self.direction.sign() * (exit.price - self.open_price) * trade_units;
        Trade {
            id: self.id,
            direction: self.direction,
            signal_time: self.signal_time,
            open_time: self.open_time,
            open_bar: self.open_bar,
            open_price: self.open_price,
            stop_price: self.stop_price,
            take_price: self.take_price,
            unit: self.unit,
            close_time,
            close_bar: exit.bar,
            close_price: exit.price,
            close_reason: exit.reason,
            result,
            bars_held: exit.bar - self.open_bar,
        }
    }
}

/// Where and why an open trade leaves the market.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Exit {
    pub reason: CloseReason,
    /// Execution-series index of the exit bar.
    pub bar: usize,
    pub price: f64,
}

/// FLAT / OPEN. Illegal transitions are programmer errors and panic.
#[derive(Debug, Default)]
pub enum SimState {
    #[default]
    Flat,
    Open(OpenTrade),
}

impl SimState {
    pub fn is_flat(&self) -> bool {
        matches!(self, SimState::Flat)
    }

    /// FLAT → OPEN.
    pub fn open(&mut self, trade: OpenTrade) {
        assert!(
            self.is_flat(),
            "invariant violated: opening trade {} while another trade is open",
            trade.id
        );
        *self = SimState::Open(trade);
    }

    /// OPEN → FLAT, handing back the trade.
    pub fn take_open(&mut self) -> OpenTrade {
        match std::mem::take(self) {
            SimState::Open(trade) => trade,
            SimState::Flat => panic!("invariant violated: closing a trade while flat"),
        }
    }

    pub fn open_trade(&self) -> Option<&OpenTrade> {
        match self {
            SimState::Open(trade) => Some(trade),
            SimState::Flat => None,
        }
    }
}

/// Counters describing what a run did besides producing trades.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub signal_bars: usize,
    pub execution_bars: usize,
    /// Calls to the evaluator.
    pub signals_evaluated: usize,
    /// Evaluations that returned BUY or SELL.
    pub decisions: usize,
    pub skipped_no_execution_bar: usize,
    pub skipped_invalid_unit: usize,
    pub trades_opened: usize,
    pub trades_closed: usize,
    pub reversals: usize,
    pub iterations: u64,
}

/// Output of `Simulator::run_test`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunResult {
    pub trades: ResultSet,
    pub stats: RunStats,
}

impl RunResult {
    pub fn summary(&self) -> Summary {
        self.trades.summary()
    }
}
