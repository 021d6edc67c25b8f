//! Immutable, validated bar series with named indicator columns.
//!
//! A `BarSeries` is built once from raw bars and never mutated. Indicator
//! annotation goes through `with_column`, which returns a new series sharing
//! the bar storage and every existing column with its parent.

use crate::domain::Bar;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while building or annotating a series.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("series has no bars")]
    Empty,

    #[error("bar {index} at {current} is not after bar {prev_index} at {previous}")]
    NotIncreasing {
        prev_index: usize,
        index: usize,
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
    },

    #[error("bar {index} at {timestamp} has malformed OHLC/spread values")]
    MalformedBar {
        index: usize,
        timestamp: DateTime<Utc>,
    },

    #[error("column '{name}' has {actual} values for {expected} bars")]
    ColumnLength {
        name: String,
        expected: usize,
        actual: usize,
    },
}

/// Ordered bar sequence plus indicator columns of the same length.
#[derive(Debug, Clone, Default)]
pub struct BarSeries {
    bars: Arc<[Bar]>,
    columns: BTreeMap<String, Arc<[f64]>>,
}

impl BarSeries {
    /// Validate and wrap a bar sequence.
    ///
    /// Timestamps must be strictly increasing and every bar must pass
    /// `Bar::is_sane`. An empty sequence is a valid (empty) series.
    pub fn new(bars: Vec<Bar>) -> Result<Self, SeriesError> {
        for (i, bar) in bars.iter().enumerate() {
            if !bar.is_sane() {
                return Err(SeriesError::MalformedBar {
                    index: i,
                    timestamp: bar.timestamp,
                });
            }
            if i > 0 && bars[i - 1].timestamp >= bar.timestamp {
                return Err(SeriesError::NotIncreasing {
                    prev_index: i - 1,
                    index: i,
                    previous: bars[i - 1].timestamp,
                    current: bar.timestamp,
                });
            }
        }
        Ok(Self {
            bars: bars.into(),
            columns: BTreeMap::new(),
        })
    }

    /// Return a new series with `values` attached as column `name`.
    ///
    /// A column with the same name is replaced in the returned series only.
    pub fn with_column(
        &self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<BarSeries, SeriesError> {
        let name = name.into();
        if values.len() != self.bars.len() {
            return Err(SeriesError::ColumnLength {
                name,
                expected: self.bars.len(),
                actual: values.len(),
            });
        }
        let mut columns = self.columns.clone();
        columns.insert(name, values.into());
        Ok(BarSeries {
            bars: Arc::clone(&self.bars),
            columns,
        })
    }

    /// Reject an empty series where at least one bar is required.
    pub fn require_non_empty(self) -> Result<Self, SeriesError> {
        if self.is_empty() {
            Err(SeriesError::Empty)
        } else {
            Ok(self)
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn get(&self, index: usize) -> Option<&Bar> {
        self.bars.get(index)
    }

    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.bars.first().map(|b| b.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.bars.last().map(|b| b.timestamp)
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(|v| &v[..])
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Column names in sorted order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// View of bar `index` together with its indicator values.
    pub fn bar(&self, index: usize) -> Option<SignalBar<'_>> {
        self.bars.get(index).map(|bar| SignalBar {
            index,
            bar,
            series: self,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = SignalBar<'_>> {
        (0..self.bars.len()).filter_map(move |i| self.bar(i))
    }

    /// Index of the first bar whose timestamp is at or after `ts`.
    pub fn locate_at_or_after(&self, ts: DateTime<Utc>) -> Option<usize> {
        let idx = self.bars.partition_point(|b| b.timestamp < ts);
        (idx < self.bars.len()).then_some(idx)
    }

    /// Index of the first bar strictly after `ts` (may equal `len()`).
    pub fn first_after(&self, ts: DateTime<Utc>) -> usize {
        self.bars.partition_point(|b| b.timestamp <= ts)
    }

    /// Feed every bar and column into a content hasher.
    pub fn hash_into(&self, hasher: &mut blake3::Hasher) {
        hasher.update(&(self.bars.len() as u64).to_le_bytes());
        for bar in self.bars.iter() {
            hasher.update(&bar.timestamp.timestamp_millis().to_le_bytes());
            for v in [bar.open, bar.high, bar.low, bar.close] {
                hasher.update(&v.to_bits().to_le_bytes());
            }
            match bar.spread {
                Some(s) => hasher.update(&s.to_bits().to_le_bytes()),
                None => hasher.update(&[0xff]),
            };
        }
        for (name, values) in &self.columns {
            hasher.update(name.as_bytes());
            for v in values.iter() {
                hasher.update(&v.to_bits().to_le_bytes());
            }
        }
    }
}

/// One bar of a series with access to its indicator values.
#[derive(Debug, Clone, Copy)]
pub struct SignalBar<'a> {
    index: usize,
    bar: &'a Bar,
    series: &'a BarSeries,
}

impl<'a> SignalBar<'a> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn bar(&self) -> &'a Bar {
        self.bar
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.bar.timestamp
    }

    /// Raw column value. `None` if the column does not exist; may be NaN.
    pub fn value(&self, column: &str) -> Option<f64> {
        self.series.column(column).map(|v| v[self.index])
    }

    /// Column value if it exists and is finite (warm-up NaNs read as `None`).
    pub fn finite(&self, column: &str) -> Option<f64> {
        self.value(column).filter(|v| v.is_finite())
    }
}
