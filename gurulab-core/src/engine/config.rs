//! Simulation configuration.

use super::error::SimError;
use crate::data::SignalBar;
use crate::indicators::{Atr, Indicator};
use serde::{Deserialize, Serialize};

/// How the bracket distance unit of a trade is obtained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DistanceUnit {
    /// Same price distance for every trade.
    Fixed { value: f64 },
    /// One pip, `10^location` (e.g. -4 for EUR_USD).
    Pips { location: i32 },
    /// Read from a column of the signal bar that produced the decision,
    /// typically a volatility measure such as `atr_14`.
    Column { name: String },
}

impl Default for DistanceUnit {
    fn default() -> Self {
        DistanceUnit::Column {
            name: "atr_14".into(),
        }
    }
}

impl DistanceUnit {
    /// Unit for a decision on `bar`, if it is finite and positive.
    pub fn resolve(&self, bar: &SignalBar<'_>) -> Option<f64> {
        let unit = match self {
            DistanceUnit::Fixed { value } => *value,
            DistanceUnit::Pips { location } => 10f64.powi(*location),
            DistanceUnit::Column { name } => bar.value(name)?,
        };
        (unit.is_finite() && unit > 0.0).then_some(unit)
    }

    /// Indicator producing the unit column, for `atr_{n}` columns.
    pub fn required_indicator(&self) -> Option<Box<dyn Indicator>> {
        let DistanceUnit::Column { name } = self else {
            return None;
        };
        let period: usize = name.strip_prefix("atr_")?.parse().ok()?;
        (period >= 1).then(|| Box::new(Atr::new(period)) as Box<dyn Indicator>)
    }
}

/// What an open trade does when an opposite signal arrives before its
/// bracket is hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReversalPolicy {
    /// Keep the trade until its bracket or the end of data.
    #[default]
    Ignore,
    /// Close at the bar where the opposite signal is located.
    Close,
    /// Close, then open the opposite trade at the same bar and price.
    Reverse,
}

/// Longest accepted entry delay: 31 days, enough for monthly signal bars.
pub const MAX_ENTRY_DELAY_SECS: i64 = 31 * 24 * 60 * 60;

/// Parameters of a single simulation run.
///
/// Signal bars are located in the execution series at
/// `timestamp + entry_delay_secs`. With feeds that stamp bars at their start,
/// setting the delay to the signal granularity enters after the bar closes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    /// Take distance in units; positive.
    pub profit_factor: f64,
    /// Stop distance in units; negative.
    pub loss_factor: f64,
    /// Charge half the spread at entry and exit.
    pub use_spread: bool,
    pub unit: DistanceUnit,
    pub reversal: ReversalPolicy,
    pub entry_delay_secs: i64,
    /// Multiplier applied to the price delta of every trade.
    pub trade_units: f64,
    /// Upper bound on loop iterations (signal and execution bar steps).
    pub max_iterations: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            profit_factor: 1.5,
            loss_factor: -1.0,
            use_spread: true,
            unit: DistanceUnit::default(),
            reversal: ReversalPolicy::Ignore,
            entry_delay_secs: 0,
            trade_units: 1.0,
            max_iterations: None,
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), SimError> {
        if !self.profit_factor.is_finite() || self.profit_factor <= 0.0 {
            return Err(SimError::InvalidConfig(format!(
                "profit_factor must be finite and > 0, got {}",
                self.profit_factor
            )));
        }
        if !self.loss_factor.is_finite() || self.loss_factor >= 0.0 {
            return Err(SimError::InvalidConfig(format!(
                "loss_factor must be finite and < 0, got {}",
                self.loss_factor
            )));
        }
        if !self.trade_units.is_finite() || self.trade_units <= 0.0 {
            return Err(SimError::InvalidConfig(format!(
                "trade_units must be finite and > 0, got {}",
                self.trade_units
            )));
        }
        if !(0..=MAX_ENTRY_DELAY_SECS).contains(&self.entry_delay_secs) {
            return Err(SimError::InvalidConfig(format!(
                "entry_delay_secs must be in 0..={MAX_ENTRY_DELAY_SECS}, got {}",
                self.entry_delay_secs
            )));
        }
        match &self.unit {
            DistanceUnit::Fixed { value } if !value.is_finite() || *value <= 0.0 => {
                Err(SimError::InvalidConfig(format!(
                    "fixed unit must be finite and > 0, got {value}"
                )))
            }
            DistanceUnit::Column { name } if name.is_empty() => Err(SimError::InvalidConfig(
                "unit column name is empty".into(),
            )),
            _ => Ok(()),
        }
    }

    /// Entry delay as a duration, clamped to the accepted range.
    pub fn entry_delay(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.entry_delay_secs.clamp(0, MAX_ENTRY_DELAY_SECS))
    }
}
