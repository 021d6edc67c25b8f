//! Bollinger Bands on the typical price (close + high + low) / 3.
//!
//! Three bands (separate Indicator instances):
//! - Middle `bb_ma_{n}`: rolling mean of typical price
//! - Upper `bb_up_{n}`: middle + mult * sample stddev
//! - Lower `bb_lw_{n}`: middle - mult * sample stddev
//!
//! Lookback: period - 1.

use super::smoothing::{rolling_mean, rolling_std};
use super::Indicator;
use crate::domain::Bar;

/// Which band of the Bollinger Bands to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BollingerBand {
    Upper,
    Middle,
    Lower,
}

#[derive(Debug, Clone)]
pub struct Bollinger {
    period: usize,
    multiplier: f64,
    band: BollingerBand,
    name: String,
}

impl Bollinger {
    pub fn new(period: usize, multiplier: f64, band: BollingerBand) -> Self {
        assert!(period >= 2, "Bollinger period must be >= 2");
        let prefix = match band {
            BollingerBand::Upper => "bb_up",
            BollingerBand::Middle => "bb_ma",
            BollingerBand::Lower => "bb_lw",
        };
        Self {
            period,
            multiplier,
            band,
            name: format!("{prefix}_{period}"),
        }
    }

    pub fn upper(period: usize, multiplier: f64) -> Self {
        Self::new(period, multiplier, BollingerBand::Upper)
    }

    pub fn middle(period: usize, multiplier: f64) -> Self {
        Self::new(period, multiplier, BollingerBand::Middle)
    }

    pub fn lower(period: usize, multiplier: f64) -> Self {
        Self::new(period, multiplier, BollingerBand::Lower)
    }

    /// All three bands, middle first.
    pub fn bands(period: usize, multiplier: f64) -> [Bollinger; 3] {
        [
            Self::middle(period, multiplier),
            Self::upper(period, multiplier),
            Self::lower(period, multiplier),
        ]
    }
}

pub fn typical_price(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| (b.close + b.high + b.low) / 3.0).collect()
}

impl Indicator for Bollinger {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let tp = typical_price(bars);
        let mean = rolling_mean(&tp, self.period);
        if self.band == BollingerBand::Middle {
            return mean;
        }
        let std = rolling_std(&tp, self.period);
        let sign = if self.band == BollingerBand::Upper {
            1.0
        } else {
            -1.0
        };
        mean.iter()
            .zip(&std)
            .map(|(m, s)| m + sign * s * self.multiplier)
            .collect()
    }
}
