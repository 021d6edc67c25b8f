//! Moving Average Convergence Divergence (MACD).
//!
//! - `macd`: EWM(close, fast) - EWM(close, slow)
//! - `macd_signal`: EWM(macd, signal)
//! - `macd_hist`: macd - macd_signal
//!
//! Each EWM uses alpha = 2 / (span + 1) and min_periods = span.
//! Lookback: slow - 1 for the line, slow + signal - 2 for signal and histogram.

use super::smoothing::ewm_span;
use super::Indicator;
use crate::domain::Bar;

/// Which MACD output to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdLine {
    Macd,
    Signal,
    Histogram,
}

#[derive(Debug, Clone)]
pub struct Macd {
    slow: usize,
    fast: usize,
    signal: usize,
    line: MacdLine,
    name: &'static str,
}

impl Macd {
    pub fn new(slow: usize, fast: usize, signal: usize, line: MacdLine) -> Self {
        assert!(
            fast >= 1 && slow > fast && signal >= 1,
            "MACD requires 1 <= fast < slow and signal >= 1"
        );
        let name = match line {
            MacdLine::Macd => "macd",
            MacdLine::Signal => "macd_signal",
            MacdLine::Histogram => "macd_hist",
        };
        Self {
            slow,
            fast,
            signal,
            line,
            name,
        }
    }

    /// MACD line with the standard 26/12/9 parameters.
    pub fn line() -> Self {
        Self::new(26, 12, 9, MacdLine::Macd)
    }

    pub fn signal_line() -> Self {
        Self::new(26, 12, 9, MacdLine::Signal)
    }

    pub fn histogram() -> Self {
        Self::new(26, 12, 9, MacdLine::Histogram)
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        self.name
    }

    fn lookback(&self) -> usize {
        match self.line {
            MacdLine::Macd => self.slow - 1,
            MacdLine::Signal | MacdLine::Histogram => self.slow + self.signal - 2,
        }
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let long = ewm_span(&closes, self.slow);
        let short = ewm_span(&closes, self.fast);
        let macd: Vec<f64> = short.iter().zip(&long).map(|(s, l)| s - l).collect();
        if self.line == MacdLine::Macd {
            return macd;
        }
        let signal = ewm_span(&macd, self.signal);
        if self.line == MacdLine::Signal {
            return signal;
        }
        macd.iter().zip(&signal).map(|(m, s)| m - s).collect()
    }
}
