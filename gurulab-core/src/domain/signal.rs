//! Directional decisions and trade direction.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Side of an open trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    /// +1.0 for a long trade, -1.0 for a short one.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Buy => 1.0,
            Direction::Sell => -1.0,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Buy => Direction::Sell,
            Direction::Sell => Direction::Buy,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Buy => write!(f, "BUY"),
            Direction::Sell => write!(f, "SELL"),
        }
    }
}

/// Decision attached to one signal-series bar. Encoded as +1 / -1 / 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Signal {
    Buy,
    Sell,
    #[default]
    None,
}

/// A raw decision value that does not map to any signal.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("undefined signal value {0}")]
pub struct UndefinedSignal(pub f64);

impl Signal {
    pub fn code(self) -> i8 {
        match self {
            Signal::Buy => 1,
            Signal::Sell => -1,
            Signal::None => 0,
        }
    }

    /// Decode a numeric decision value.
    ///
    /// Only exactly +1, -1 and 0 are defined. NaN (indicator warm-up) and
    /// any other value are reported as `UndefinedSignal`.
    pub fn decode(value: f64) -> Result<Signal, UndefinedSignal> {
        if value == 1.0 {
            Ok(Signal::Buy)
        } else if value == -1.0 {
            Ok(Signal::Sell)
        } else if value == 0.0 {
            Ok(Signal::None)
        } else {
            Err(UndefinedSignal(value))
        }
    }

    /// Direction of the trade this signal would open, if any.
    pub fn direction(self) -> Option<Direction> {
        match self {
            Signal::Buy => Some(Direction::Buy),
            Signal::Sell => Some(Direction::Sell),
            Signal::None => None,
        }
    }

    pub fn is_none(self) -> bool {
        matches!(self, Signal::None)
    }
}

impl From<Direction> for Signal {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Buy => Signal::Buy,
            Direction::Sell => Signal::Sell,
        }
    }
}
