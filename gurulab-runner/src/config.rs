//! TOML backtest configuration.
//!
//! ```toml
//! [data]
//! instrument = "EUR_USD"
//! signal = "data/eur_usd_h1.csv"
//! execution = "data/eur_usd_m5.csv"
//! signal_stamp = "open"
//!
//! [simulation]
//! profit_factor = 1.5
//! loss_factor = -1.0
//! use_spread = true
//! unit = { kind = "column", name = "atr_14" }
//!
//! [strategy]
//! type = "rsi_threshold"
//! period = 14
//! oversold = 30.0
//! overbought = 70.0
//! ```
//!
//! Relative data paths are resolved against the directory of the config file
//! when loaded through `from_file`.

use gurulab_core::engine::{SimConfig, SimError};
use gurulab_core::fingerprint::EvaluatorConfig;
use gurulab_core::signals::{BollingerReversion, MacdMomentum, RsiThreshold, SignalEvaluator};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid strategy: {0}")]
    Strategy(String),

    #[error("invalid simulation settings: {0}")]
    Simulation(#[from] SimError),
}

/// Complete description of one backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BacktestConfig {
    pub data: DataConfig,
    #[serde(default)]
    pub simulation: SimConfig,
    pub strategy: StrategyConfig,
}

/// Where the two series of the instrument come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataConfig {
    pub instrument: String,
    /// CSV of the coarse series the strategy reads.
    pub signal: PathBuf,
    /// CSV of the fine series trades are filled on.
    pub execution: PathBuf,
    /// What the `time` column of the signal file marks.
    #[serde(default)]
    pub signal_stamp: BarStamp,
}

/// Which end of its interval a bar's timestamp marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarStamp {
    /// Stamped at the execution bar that carries the close, as `synth` writes.
    #[default]
    Close,
    /// Stamped at the interval start, as most broker candle feeds are.
    /// Bars are moved to their close when loaded.
    Open,
}

/// Built-in strategies, selected by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategyConfig {
    RsiThreshold {
        #[serde(default = "default_rsi_period")]
        period: usize,
        #[serde(default = "default_oversold")]
        oversold: f64,
        #[serde(default = "default_overbought")]
        overbought: f64,
    },
    BollingerReversion {
        #[serde(default = "default_bb_period")]
        period: usize,
        #[serde(default = "default_bb_multiplier")]
        multiplier: f64,
    },
    MacdMomentum {
        #[serde(default)]
        min_abs: f64,
    },
}

fn default_rsi_period() -> usize {
    14
}

fn default_oversold() -> f64 {
    30.0
}

fn default_overbought() -> f64 {
    70.0
}

fn default_bb_period() -> usize {
    20
}

fn default_bb_multiplier() -> f64 {
    2.0
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig::RsiThreshold {
            period: default_rsi_period(),
            oversold: default_oversold(),
            overbought: default_overbought(),
        }
    }
}

impl StrategyConfig {
    pub fn name(&self) -> &'static str {
        match self {
            StrategyConfig::RsiThreshold { .. } => "rsi_threshold",
            StrategyConfig::BollingerReversion { .. } => "bollinger_reversion",
            StrategyConfig::MacdMomentum { .. } => "macd_momentum",
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            StrategyConfig::RsiThreshold {
                period,
                oversold,
                overbought,
            } => {
                if period == 0 {
                    return Err(ConfigError::Strategy("rsi period must be >= 1".into()));
                }
                if !(oversold < overbought) {
                    return Err(ConfigError::Strategy(format!(
                        "oversold ({oversold}) must be below overbought ({overbought})"
                    )));
                }
            }
            StrategyConfig::BollingerReversion { period, multiplier } => {
                if period < 2 {
                    return Err(ConfigError::Strategy(
                        "bollinger period must be >= 2".into(),
                    ));
                }
                if !multiplier.is_finite() || multiplier <= 0.0 {
                    return Err(ConfigError::Strategy(format!(
                        "bollinger multiplier must be finite and > 0, got {multiplier}"
                    )));
                }
            }
            StrategyConfig::MacdMomentum { min_abs } => {
                if !min_abs.is_finite() || min_abs < 0.0 {
                    return Err(ConfigError::Strategy(format!(
                        "min_abs must be finite and >= 0, got {min_abs}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Build the evaluator this config describes.
    pub fn build(&self) -> Box<dyn SignalEvaluator> {
        match *self {
            StrategyConfig::RsiThreshold {
                period,
                oversold,
                overbought,
            } => Box::new(RsiThreshold::new(period, oversold, overbought)),
            StrategyConfig::BollingerReversion { period, multiplier } => {
                Box::new(BollingerReversion::new(period, multiplier))
            }
            StrategyConfig::MacdMomentum { min_abs } => Box::new(MacdMomentum::new(min_abs)),
        }
    }

    /// Evaluator identity for run fingerprints.
    pub fn evaluator_config(&self) -> EvaluatorConfig {
        let config = EvaluatorConfig::new(self.name());
        match *self {
            StrategyConfig::RsiThreshold {
                period,
                oversold,
                overbought,
            } => config
                .with_param("period", period as f64)
                .with_param("oversold", oversold)
                .with_param("overbought", overbought),
            StrategyConfig::BollingerReversion { period, multiplier } => config
                .with_param("period", period as f64)
                .with_param("multiplier", multiplier),
            StrategyConfig::MacdMomentum { min_abs } => config.with_param("min_abs", min_abs),
        }
    }
}

impl BacktestConfig {
    /// Parse and validate a TOML document. Paths are kept as written.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: BacktestConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file, resolving relative data paths against its directory.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&content)?;
        if let Some(base) = path.parent() {
            config.data.signal = rebase(base, &config.data.signal);
            config.data.execution = rebase(base, &config.data.execution);
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.simulation.validate()?;
        self.strategy.validate()
    }
}

fn rebase(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
