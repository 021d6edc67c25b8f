//! Relative Strength Index (RSI).
//!
//! Gains and losses of the close-to-close change are each smoothed with an
//! adjusted EWM, alpha = 1/period, min_periods = period (Wilder's RMA).
//! The first change is undefined and counts as a zero gain and zero loss.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss).
//! Edge cases: avg_loss == 0 → 100; both zero → NaN.
//! Lookback: period - 1.

use super::smoothing::ewm_mean;
use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Default for Rsi {
    fn default() -> Self {
        Self::new(14)
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut wins = Vec::with_capacity(n);
        let mut losses = Vec::with_capacity(n);
        for i in 0..n {
            let change = if i == 0 {
                f64::NAN
            } else {
                bars[i].close - bars[i - 1].close
            };
            // NaN compares false both ways, so an undefined change is 0/0
            wins.push(if change >= 0.0 { change } else { 0.0 });
            losses.push(if change < 0.0 { -change } else { 0.0 });
        }

        let alpha = 1.0 / self.period as f64;
        let wins_rma = ewm_mean(&wins, alpha, self.period);
        let losses_rma = ewm_mean(&losses, alpha, self.period);

        wins_rma
            .iter()
            .zip(&losses_rma)
            .map(|(w, l)| 100.0 - 100.0 / (1.0 + w / l))
            .collect()
    }
}
