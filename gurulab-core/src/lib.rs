//! GuruLab Core: bar series, indicators, signal evaluators and the bracket-exit
//! trade simulator.
//!
//! This crate contains the heart of the backtester:
//! - Domain types (bars, signals, trades, ids)
//! - Validated immutable bar series with indicator columns and spread quotes
//! - Indicator annotation (RSI, ATR, Bollinger, MACD, Keltner)
//! - The `SignalEvaluator` capability and built-in evaluators
//! - The FLAT/OPEN trade simulator and the result aggregator
//! - Run fingerprints
//!
//! No file, network or environment access happens here.

pub mod aggregator;
pub mod data;
pub mod domain;
pub mod engine;
pub mod fingerprint;
pub mod indicators;
pub mod signals;

pub use aggregator::{ResultSet, Summary};
pub use data::{BarSeries, PriceSeries, PriceSeriesProvider, SeriesError, SignalBar};
pub use domain::{Bar, CloseReason, Direction, Signal, Trade};
pub use engine::{DistanceUnit, ReversalPolicy, RunResult, RunStats, SimConfig, SimError, Simulator};
pub use signals::SignalEvaluator;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: types shared across sweep worker threads are
    /// Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::Trade>();
        require_sync::<domain::Trade>();
        require_send::<domain::Signal>();
        require_sync::<domain::Signal>();
        require_send::<domain::ConfigHash>();
        require_sync::<domain::ConfigHash>();
        require_send::<domain::DatasetHash>();
        require_sync::<domain::DatasetHash>();

        // Series
        require_send::<data::BarSeries>();
        require_sync::<data::BarSeries>();
        require_send::<data::PriceSeries>();
        require_sync::<data::PriceSeries>();

        // Engine
        require_send::<engine::Simulator>();
        require_sync::<engine::Simulator>();
        require_send::<engine::SimConfig>();
        require_sync::<engine::SimConfig>();
        require_send::<engine::RunResult>();
        require_sync::<engine::RunResult>();
        require_send::<aggregator::ResultSet>();
        require_sync::<aggregator::ResultSet>();

        // Evaluators
        require_send::<Box<dyn signals::SignalEvaluator>>();
        require_sync::<Box<dyn signals::SignalEvaluator>>();
        require_send::<Box<dyn indicators::Indicator>>();
        require_sync::<Box<dyn indicators::Indicator>>();

        // Fingerprint
        require_send::<fingerprint::RunFingerprint>();
        require_sync::<fingerprint::RunFingerprint>();
    }

    #[test]
    fn send_sync_compiles() {
        assert_send_sync();
    }
}
