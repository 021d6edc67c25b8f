//! Bar series, spread quotes and the series provider seam

pub mod provider;
pub mod quote;
pub mod series;

#[cfg(test)]
pub(crate) mod test_support;

pub use provider::{InMemoryProvider, PriceSeries, PriceSeriesProvider};
pub use quote::{Quote, SidePrices};
pub use series::{BarSeries, SeriesError, SignalBar};
