//! Trade: one closed round trip with its bracket levels and exit reason.

use super::ids::TradeId;
use super::signal::Direction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a trade was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CloseReason {
    Stop,
    Take,
    EndOfData,
    Reversal,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CloseReason::Stop => "STOP",
            CloseReason::Take => "TAKE",
            CloseReason::EndOfData => "END_OF_DATA",
            CloseReason::Reversal => "REVERSAL",
        };
        f.write_str(s)
    }
}

/// A closed trade.
///
/// `stop_price` and `take_price` are fixed when the trade opens. `result` is the
/// signed price delta times the traded units: positive for a winner regardless
/// of direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub direction: Direction,

    // ── Entry ──
    /// Timestamp of the signal-series bar that produced the decision.
    pub signal_time: DateTime<Utc>,
    pub open_time: DateTime<Utc>,
    /// Execution-series index of the entry bar.
    pub open_bar: usize,
    pub open_price: f64,

    // ── Bracket ──
    pub stop_price: f64,
    pub take_price: f64,
    /// Distance unit the bracket was scaled by.
    pub unit: f64,

    // ── Exit ──
    pub close_time: DateTime<Utc>,
    /// Execution-series index of the exit bar.
    pub close_bar: usize,
    pub close_price: f64,
    pub close_reason: CloseReason,

    pub result: f64,
    /// Execution bars between entry and exit.
    pub bars_held: usize,
}

impl Trade {
    pub fn is_winner(&self) -> bool {
        self.result > 0.0
    }

    /// Signed price move in pips for an instrument whose pip is `10^pip_location`
    /// (e.g. -4 for EUR_USD, -2 for USD_JPY). Independent of traded units.
    pub fn pips(&self, pip_location: i32) -> f64 {
        self.direction.sign() * (self.close_price - self.open_price) / 10f64.powi(pip_location)
    }
}
