//! Keltner Channel: EWM of close +/- 2 * ATR.
//!
//! Three bands (separate Indicator instances):
//! - Middle `ke_ema_{n}`: EWM(close, span = ema_period)
//! - Upper `ke_up_{n}`: middle + 2 * ATR(atr_period)
//! - Lower `ke_lo_{n}`: middle - 2 * ATR(atr_period)
//!
//! Lookback: max(ema_period, atr_period) - 1.

use super::atr::Atr;
use super::smoothing::ewm_span;
use super::Indicator;
use crate::domain::Bar;

const ATR_MULTIPLIER: f64 = 2.0;

/// Which band of the Keltner Channel to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeltnerBand {
    Upper,
    Middle,
    Lower,
}

#[derive(Debug, Clone)]
pub struct Keltner {
    ema_period: usize,
    atr: Atr,
    band: KeltnerBand,
    name: String,
}

impl Keltner {
    pub fn new(ema_period: usize, atr_period: usize, band: KeltnerBand) -> Self {
        assert!(ema_period >= 1, "Keltner EMA period must be >= 1");
        let prefix = match band {
            KeltnerBand::Upper => "ke_up",
            KeltnerBand::Middle => "ke_ema",
            KeltnerBand::Lower => "ke_lo",
        };
        Self {
            ema_period,
            atr: Atr::new(atr_period),
            band,
            name: format!("{prefix}_{ema_period}"),
        }
    }

    pub fn upper(ema_period: usize, atr_period: usize) -> Self {
        Self::new(ema_period, atr_period, KeltnerBand::Upper)
    }

    pub fn middle(ema_period: usize, atr_period: usize) -> Self {
        Self::new(ema_period, atr_period, KeltnerBand::Middle)
    }

    pub fn lower(ema_period: usize, atr_period: usize) -> Self {
        Self::new(ema_period, atr_period, KeltnerBand::Lower)
    }
}

impl Indicator for Keltner {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        match self.band {
            KeltnerBand::Middle => self.ema_period - 1,
            _ => self.ema_period.max(self.atr.period()) - 1,
        }
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let ema = ewm_span(&closes, self.ema_period);
        let sign = match self.band {
            KeltnerBand::Middle => return ema,
            KeltnerBand::Upper => 1.0,
            KeltnerBand::Lower => -1.0,
        };
        let atr = self.atr.compute(bars);
        ema.iter()
            .zip(&atr)
            .map(|(e, a)| e + sign * ATR_MULTIPLIER * a)
            .collect()
    }
}
