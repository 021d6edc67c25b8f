//! MACD histogram momentum: BUY above `min_abs`, SELL below `-min_abs`.

use super::{defined, SignalEvaluator};
use crate::data::SignalBar;
use crate::domain::Signal;
use crate::indicators::{Indicator, Macd};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MacdMomentum {
    pub min_abs: f64,
}

impl MacdMomentum {
    pub fn new(min_abs: f64) -> Self {
        Self { min_abs }
    }
}

impl SignalEvaluator for MacdMomentum {
    fn name(&self) -> &str {
        "macd_momentum"
    }

    fn evaluate(&self, bar: &SignalBar<'_>) -> Signal {
        match defined(self.name(), bar, "macd_hist") {
            Some(h) if h > self.min_abs => Signal::Buy,
            Some(h) if h < -self.min_abs => Signal::Sell,
            _ => Signal::None,
        }
    }

    fn required_indicators(&self) -> Vec<Box<dyn Indicator>> {
        vec![
            Box::new(Macd::line()),
            Box::new(Macd::signal_line()),
            Box::new(Macd::histogram()),
        ]
    }
}
