//! Price series provider trait.
//!
//! Abstracts over where the two bar sequences of a run come from (CSV files,
//! a synthetic generator, fixtures) so the simulator never touches I/O.

use super::series::BarSeries;
use std::convert::Infallible;

/// The two aligned series of one instrument.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    pub instrument: String,
    /// Coarse series the evaluator reads (e.g. H1).
    pub signal: BarSeries,
    /// Fine series trades are filled and exited on (e.g. M5).
    pub execution: BarSeries,
}

/// Source of a signal/execution series pair for one instrument.
pub trait PriceSeriesProvider: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Load both series, sorted ascending and validated.
    fn load(&self) -> Result<PriceSeries, Self::Error>;
}

/// Provider over series already held in memory.
#[derive(Debug, Clone)]
pub struct InMemoryProvider {
    series: PriceSeries,
}

impl InMemoryProvider {
    pub fn new(series: PriceSeries) -> Self {
        Self { series }
    }
}

impl PriceSeriesProvider for InMemoryProvider {
    type Error = Infallible;

    fn name(&self) -> &str {
        "memory"
    }

    fn load(&self) -> Result<PriceSeries, Infallible> {
        Ok(self.series.clone())
    }
}
