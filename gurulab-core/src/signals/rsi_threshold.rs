//! RSI threshold mean reversion: BUY when oversold, SELL when overbought.

use super::{defined, SignalEvaluator};
use crate::data::SignalBar;
use crate::domain::Signal;
use crate::indicators::{Indicator, Rsi};

#[derive(Debug, Clone, PartialEq)]
pub struct RsiThreshold {
    /// RSI column to read, e.g. "rsi_14".
    pub column: String,
    pub oversold: f64,
    pub overbought: f64,
}

impl RsiThreshold {
    pub fn new(period: usize, oversold: f64, overbought: f64) -> Self {
        Self {
            column: Rsi::new(period).name().to_string(),
            oversold,
            overbought,
        }
    }

    /// RSI period parsed from a column named `rsi_{n}`.
    fn period(&self) -> Option<usize> {
        self.column.strip_prefix("rsi_")?.parse().ok()
    }
}

impl Default for RsiThreshold {
    fn default() -> Self {
        Self::new(14, 30.0, 70.0)
    }
}

impl SignalEvaluator for RsiThreshold {
    fn name(&self) -> &str {
        "rsi_threshold"
    }

    fn evaluate(&self, bar: &SignalBar<'_>) -> Signal {
        match defined(self.name(), bar, &self.column) {
            Some(rsi) if rsi < self.oversold => Signal::Buy,
            Some(rsi) if rsi > self.overbought => Signal::Sell,
            _ => Signal::None,
        }
    }

    fn required_indicators(&self) -> Vec<Box<dyn Indicator>> {
        match self.period() {
            Some(n) if n >= 1 => vec![Box::new(Rsi::new(n))],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_support::hourly_bars;
    use crate::data::BarSeries;

    #[test]
    fn thresholds_are_strict() {
        let series = BarSeries::new(hourly_bars(&[1.0; 7]))
            .unwrap()
            .with_column("rsi_14", vec![40.0, 25.0, 50.0, 75.0, 30.0, 70.0, f64::NAN])
            .unwrap();
        let eval = RsiThreshold::default();
        let out: Vec<Signal> = series.iter().map(|b| eval.evaluate(&b)).collect();
        assert_eq!(
            out,
            vec![
                Signal::None,
                Signal::Buy,
                Signal::None,
                Signal::Sell,
                Signal::None,
                Signal::None,
                Signal::None,
            ]
        );
    }

    #[test]
    fn missing_column_is_none() {
        let series = BarSeries::new(hourly_bars(&[1.0])).unwrap();
        let eval = RsiThreshold::default();
        assert_eq!(eval.evaluate(&series.bar(0).unwrap()), Signal::None);
    }

    #[test]
    fn requires_matching_rsi() {
        let eval = RsiThreshold::new(7, 20.0, 80.0);
        let inds = eval.required_indicators();
        assert_eq!(inds.len(), 1);
        assert_eq!(inds[0].name(), "rsi_7");

        let custom = RsiThreshold {
            column: "my_rsi".into(),
            ..RsiThreshold::default()
        };
        assert!(custom.required_indicators().is_empty());
    }
}
