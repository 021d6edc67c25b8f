//! Seeded synthetic price series for demos, tests and benchmarks.
//!
//! The execution series is a bounded random walk of fine bars; the signal
//! series aggregates consecutive groups of them into coarse bars stamped at
//! the group's last bar. That bar carries the coarse close, so a decision on
//! a signal bar is located at the execution bar where its close is known.

use chrono::{DateTime, Duration, Utc};
use gurulab_core::data::{BarSeries, PriceSeries, SeriesError};
use gurulab_core::domain::Bar;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyntheticError {
    #[error("invalid synthetic spec: {0}")]
    InvalidSpec(String),

    #[error(transparent)]
    Series(#[from] SeriesError),
}

/// Shape of a generated series pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticSpec {
    pub instrument: String,
    pub start: DateTime<Utc>,
    /// Number of signal bars.
    pub signal_bars: usize,
    pub signal_minutes: i64,
    pub execution_minutes: i64,
    pub start_price: f64,
    /// Largest close-to-close move of one execution bar.
    pub step: f64,
    /// Spread attached to every bar; `None` leaves bars without spread.
    pub spread: Option<f64>,
    pub seed: u64,
}

impl Default for SyntheticSpec {
    fn default() -> Self {
        Self {
            instrument: "SYN_USD".into(),
            // 2024-01-01T00:00:00Z
            start: DateTime::UNIX_EPOCH + Duration::days(19_723),
            signal_bars: 500,
            signal_minutes: 60,
            execution_minutes: 5,
            start_price: 1.1,
            step: 0.0005,
            spread: Some(0.0001),
            seed: 42,
        }
    }
}

impl SyntheticSpec {
    pub fn validate(&self) -> Result<(), SyntheticError> {
        if self.execution_minutes <= 0 || self.signal_minutes <= 0 {
            return Err(SyntheticError::InvalidSpec(
                "bar lengths must be positive".into(),
            ));
        }
        if self.signal_minutes % self.execution_minutes != 0 {
            return Err(SyntheticError::InvalidSpec(format!(
                "signal_minutes ({}) must be a multiple of execution_minutes ({})",
                self.signal_minutes, self.execution_minutes
            )));
        }
        if !(self.start_price.is_finite() && self.start_price > 0.0) {
            return Err(SyntheticError::InvalidSpec(
                "start_price must be finite and > 0".into(),
            ));
        }
        if !(self.step.is_finite() && self.step > 0.0) {
            return Err(SyntheticError::InvalidSpec(
                "step must be finite and > 0".into(),
            ));
        }
        if let Some(s) = self.spread {
            if !(s.is_finite() && s >= 0.0) {
                return Err(SyntheticError::InvalidSpec(
                    "spread must be finite and >= 0".into(),
                ));
            }
        }
        Ok(())
    }

    fn per_signal(&self) -> usize {
        (self.signal_minutes / self.execution_minutes) as usize
    }
}

/// Generate the execution series and its aggregated signal series.
///
/// Same spec, same bars.
pub fn generate(spec: &SyntheticSpec) -> Result<PriceSeries, SyntheticError> {
    spec.validate()?;
    let execution = execution_bars(spec);
    let signal = aggregate(&execution, spec.per_signal());
    Ok(PriceSeries {
        instrument: spec.instrument.clone(),
        signal: BarSeries::new(signal)?,
        execution: BarSeries::new(execution)?,
    })
}

fn execution_bars(spec: &SyntheticSpec) -> Vec<Bar> {
    let mut rng = StdRng::seed_from_u64(spec.seed);
    let count = spec.signal_bars * spec.per_signal();
    let floor = spec.start_price * 0.1;

    let mut price = spec.start_price;
    let mut bars = Vec::with_capacity(count);
    for i in 0..count {
        let open = price;
        let close = (open + rng.gen_range(-1.0..=1.0) * spec.step).max(floor);
        let high = open.max(close) + rng.gen_range(0.0..=0.5) * spec.step;
        let low = (open.min(close) - rng.gen_range(0.0..=0.5) * spec.step).max(floor * 0.5);
        let timestamp = spec.start + Duration::minutes(spec.execution_minutes * i as i64);

        let mut bar = Bar::new(timestamp, open, high, low, close);
        bar.spread = spec.spread;
        bars.push(bar);
        price = close;
    }
    bars
}

/// OHLC of each consecutive group of `per_signal` bars, stamped at and taking
/// the spread of the group's last bar.
fn aggregate(bars: &[Bar], per_signal: usize) -> Vec<Bar> {
    bars.chunks(per_signal)
        .filter_map(|group| {
            let first = group.first()?;
            let last = group.last()?;
            let high = group.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
            let low = group.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
            let mut bar = Bar::new(last.timestamp, first.open, high, low, last.close);
            bar.spread = last.spread;
            Some(bar)
        })
        .collect()
}
