//! Indicator annotation.
//!
//! Indicators are pure functions of a bar slice producing one value per bar,
//! NaN during warm-up. Annotating a `BarSeries` attaches the output as a named
//! column and returns a new series; the input series is never modified.
//!
//! Multi-band indicators (Bollinger, Keltner, MACD) are exposed as separate
//! named instances per band, keeping the single-output `Indicator` trait.

pub mod atr;
pub mod bollinger;
pub mod keltner;
pub mod macd;
pub mod rsi;
pub mod smoothing;

pub use atr::Atr;
pub use bollinger::{Bollinger, BollingerBand};
pub use keltner::{Keltner, KeltnerBand};
pub use macd::{Macd, MacdLine};
pub use rsi::Rsi;
pub use smoothing::{ewm_mean, ewm_span, rolling_mean, rolling_std};

use crate::data::{BarSeries, SeriesError};
use crate::domain::Bar;

/// Single-output indicator over a bar series.
///
/// # Look-ahead guard
/// No value at bar t may depend on bars after t. Every indicator passes the
/// truncated-vs-full series test.
pub trait Indicator: Send + Sync {
    /// Column name the output is stored under (e.g. "rsi_14", "bb_up_20").
    fn name(&self) -> &str;

    /// Index of the first bar that can carry a defined value.
    fn lookback(&self) -> usize;

    /// Compute one value per bar; same length as `bars`.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;

    /// Attach this indicator's output to `series` as a new column.
    fn annotate(&self, series: &BarSeries) -> Result<BarSeries, SeriesError> {
        series.with_column(self.name(), self.compute(series.bars()))
    }
}

/// Apply several indicators in order, each on the previous result.
pub fn annotate_all(
    series: &BarSeries,
    indicators: &[Box<dyn Indicator>],
) -> Result<BarSeries, SeriesError> {
    indicators
        .iter()
        .try_fold(series.clone(), |acc, ind| ind.annotate(&acc))
}

/// Synthetic hourly bars from close prices for tests.
///
/// open = prev_close (or close for the first bar), high = max(open, close) + 1,
/// low = min(open, close) - 1.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    use chrono::{Duration, TimeZone, Utc};
    let t0 = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar::new(
                t0 + Duration::hours(i as i64),
                open,
                open.max(close) + 1.0,
                open.min(close) - 1.0,
                close,
            )
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
