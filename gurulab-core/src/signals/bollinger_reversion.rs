//! Bollinger band reversion: BUY below the lower band, SELL above the upper.

use super::{defined, SignalEvaluator};
use crate::data::SignalBar;
use crate::domain::Signal;
use crate::indicators::{Bollinger, Indicator};

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerReversion {
    pub period: usize,
    pub multiplier: f64,
    upper: String,
    lower: String,
}

impl BollingerReversion {
    pub fn new(period: usize, multiplier: f64) -> Self {
        Self {
            period,
            multiplier,
            upper: format!("bb_up_{period}"),
            lower: format!("bb_lw_{period}"),
        }
    }
}

impl Default for BollingerReversion {
    fn default() -> Self {
        Self::new(20, 2.0)
    }
}

impl SignalEvaluator for BollingerReversion {
    fn name(&self) -> &str {
        "bollinger_reversion"
    }

    fn evaluate(&self, bar: &SignalBar<'_>) -> Signal {
        let (Some(upper), Some(lower)) = (
            defined(self.name(), bar, &self.upper),
            defined(self.name(), bar, &self.lower),
        ) else {
            return Signal::None;
        };
        let close = bar.bar().close;
        if close < lower {
            Signal::Buy
        } else if close > upper {
            Signal::Sell
        } else {
            Signal::None
        }
    }

    fn required_indicators(&self) -> Vec<Box<dyn Indicator>> {
        Bollinger::bands(self.period, self.multiplier)
            .into_iter()
            .map(|b| Box::new(b) as Box<dyn Indicator>)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_support::hourly_bars;
    use crate::data::BarSeries;
    use crate::indicators::annotate_all;

    #[test]
    fn close_outside_bands() {
        let series = BarSeries::new(hourly_bars(&[1.00, 1.20, 1.10]))
            .unwrap()
            .with_column("bb_up_20", vec![1.15, 1.15, 1.15])
            .unwrap()
            .with_column("bb_lw_20", vec![1.05, 1.05, f64::NAN])
            .unwrap();
        let eval = BollingerReversion::default();
        let out: Vec<Signal> = series.iter().map(|b| eval.evaluate(&b)).collect();
        assert_eq!(out, vec![Signal::Buy, Signal::Sell, Signal::None]);
    }

    #[test]
    fn required_bands_annotate_expected_columns() {
        let eval = BollingerReversion::new(3, 2.0);
        let base = BarSeries::new(hourly_bars(&[1.0, 1.1, 1.2, 1.1])).unwrap();
        let annotated = annotate_all(&base, &eval.required_indicators()).unwrap();
        assert!(annotated.has_column("bb_up_3"));
        assert!(annotated.has_column("bb_lw_3"));
        assert!(annotated.has_column("bb_ma_3"));
    }
}
