//! Result aggregation: the ordered set of closed trades of one run.

use crate::domain::Trade;
use serde::{Deserialize, Serialize};

/// Closed trades in close order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    trades: Vec<Trade>,
}

/// Headline numbers of a result set.
///
/// An empty set has count 0, total_result 0 and win_rate 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub count: usize,
    pub total_result: f64,
    /// Fraction of trades with result > 0.
    pub win_rate: f64,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a closed trade.
    pub fn record(&mut self, trade: Trade) {
        debug_assert!(
            self.trades
                .last()
                .map_or(true, |prev| prev.close_time <= trade.open_time),
            "trade {} opens before the previous trade closed",
            trade.id
        );
        self.trades.push(trade);
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn into_trades(self) -> Vec<Trade> {
        self.trades
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Trade> {
        self.trades.iter()
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    pub fn summary(&self) -> Summary {
        let count = self.trades.len();
        let total_result = self.trades.iter().map(|t| t.result).sum();
        let wins = self.trades.iter().filter(|t| t.is_winner()).count();
        let win_rate = if count == 0 {
            0.0
        } else {
            wins as f64 / count as f64
        };
        Summary {
            count,
            total_result,
            win_rate,
        }
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a Trade;
    type IntoIter = std::slice::Iter<'a, Trade>;

    fn into_iter(self) -> Self::IntoIter {
        self.trades.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CloseReason, Direction, TradeId};
    use chrono::{Duration, TimeZone, Utc};

    fn trade(id: u64, result: f64) -> Trade {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap() + Duration::hours(id as i64);
        Trade {
            id: TradeId(id),
            direction: Direction::Buy,
            signal_time: t0,
            open_time: t0,
            open_bar: 0,
            open_price: 1.0,
            stop_price: 0.99,
            take_price: 1.015,
            unit: 0.01,
            close_time: t0 + Duration::minutes(30),
            close_bar: 6,
            close_price: 1.0 + result,
            close_reason: if result > 0.0 {
                CloseReason::Take
            } else {
                CloseReason::Stop
            },
            result,
            bars_held: 6,
        }
    }

    #[test]
    fn empty_summary_is_zero() {
        let summary = ResultSet::new().summary();
        assert_eq!(
            summary,
            Summary {
                count: 0,
                total_result: 0.0,
                win_rate: 0.0
            }
        );
    }

    #[test]
    fn record_keeps_order_and_summarises() {
        let mut set = ResultSet::new();
        set.record(trade(1, 0.015));
        set.record(trade(2, -0.01));
        set.record(trade(3, 0.015));
        set.record(trade(4, 0.0));
        let ids: Vec<u64> = set.iter().map(|t| t.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);

        let summary = set.summary();
        assert_eq!(summary.count, 4);
        assert!((summary.total_result - 0.02).abs() < 1e-12);
        // zero result is not a win
        assert!((summary.win_rate - 0.5).abs() < 1e-12);
    }

    #[test]
    fn summary_is_pure() {
        let mut set = ResultSet::new();
        set.record(trade(1, 0.015));
        assert_eq!(set.summary(), set.summary());
        assert_eq!(set.len(), 1);
    }
}
