//! CSV-backed price series.
//!
//! One file per series, with a header row. Required columns:
//! `time` (RFC 3339), `mid_o`, `mid_h`, `mid_l`, `mid_c`. Spread is taken from
//! a `spread` column when present, otherwise from `ask_c - bid_c` when both are
//! present, otherwise absent. Rows must already be in ascending time order.
//!
//! Signal files stamped at the interval start (`BarStamp::Open`) are moved to
//! the execution bar that carries their close, so a decision is never filled
//! before the bar it was made on has closed.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use gurulab_core::data::{BarSeries, PriceSeries, PriceSeriesProvider, SeriesError};
use gurulab_core::domain::Bar;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::config::{BarStamp, DataConfig};

/// Errors from the CSV data layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("'{path}' row {row}: {source}")]
    Row {
        path: PathBuf,
        row: usize,
        #[source]
        source: csv::Error,
    },

    #[error("'{path}' row {row}: invalid timestamp '{value}'")]
    Timestamp {
        path: PathBuf,
        row: usize,
        value: String,
    },

    #[error("'{path}': {source}")]
    Series {
        path: PathBuf,
        #[source]
        source: SeriesError,
    },

    #[error("'{path}': cannot move open-stamped bars to their close: {reason}")]
    Restamp { path: PathBuf, reason: String },

    #[error("failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

#[derive(Debug, Deserialize, Serialize)]
struct CsvBar {
    time: String,
    mid_o: f64,
    mid_h: f64,
    mid_l: f64,
    mid_c: f64,
    #[serde(default)]
    spread: Option<f64>,
    #[serde(default, skip_serializing)]
    bid_c: Option<f64>,
    #[serde(default, skip_serializing)]
    ask_c: Option<f64>,
}

impl CsvBar {
    fn spread(&self) -> Option<f64> {
        self.spread.or(match (self.bid_c, self.ask_c) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        })
    }
}

/// Read one CSV file into bars, in file order.
pub fn read_bars(path: &Path) -> Result<Vec<Bar>, LoadError> {
    let mut reader = csv::Reader::from_path(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let mut bars = Vec::new();
    for (i, record) in reader.deserialize::<CsvBar>().enumerate() {
        // Row numbers are 1-based and skip the header.
        let row = i + 2;
        let record = record.map_err(|source| LoadError::Row {
            path: path.to_path_buf(),
            row,
            source,
        })?;
        let timestamp = DateTime::parse_from_rfc3339(record.time.trim())
            .map_err(|_| LoadError::Timestamp {
                path: path.to_path_buf(),
                row,
                value: record.time.clone(),
            })?
            .with_timezone(&Utc);

        let mut bar = Bar::new(
            timestamp,
            record.mid_o,
            record.mid_h,
            record.mid_l,
            record.mid_c,
        );
        bar.spread = record.spread();
        bars.push(bar);
    }
    debug!(path = %path.display(), bars = bars.len(), "read bar file");
    Ok(bars)
}

/// Read and validate one series.
pub fn read_series(path: &Path) -> Result<BarSeries, LoadError> {
    BarSeries::new(read_bars(path)?).map_err(|source| LoadError::Series {
        path: path.to_path_buf(),
        source,
    })
}

/// Write bars in the same layout `read_bars` accepts.
pub fn write_bars(path: &Path, bars: &[Bar]) -> Result<(), LoadError> {
    let write_err = |source| LoadError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(write_err)?;
    for bar in bars {
        writer
            .serialize(CsvBar {
                time: bar.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
                mid_o: bar.open,
                mid_h: bar.high,
                mid_l: bar.low,
                mid_c: bar.close,
                spread: bar.spread,
                bid_c: None,
                ask_c: None,
            })
            .map_err(write_err)?;
    }
    writer
        .flush()
        .map_err(|e| write_err(csv::Error::from(e)))?;
    Ok(())
}

/// Provider reading the signal and execution series from two CSV files.
#[derive(Debug, Clone)]
pub struct CsvProvider {
    instrument: String,
    signal_path: PathBuf,
    execution_path: PathBuf,
    signal_stamp: BarStamp,
}

impl CsvProvider {
    pub fn new(
        instrument: impl Into<String>,
        signal_path: impl Into<PathBuf>,
        execution_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            instrument: instrument.into(),
            signal_path: signal_path.into(),
            execution_path: execution_path.into(),
            signal_stamp: BarStamp::Close,
        }
    }

    pub fn with_signal_stamp(mut self, stamp: BarStamp) -> Self {
        self.signal_stamp = stamp;
        self
    }

    pub fn from_config(data: &DataConfig) -> Self {
        Self::new(&data.instrument, &data.signal, &data.execution)
            .with_signal_stamp(data.signal_stamp)
    }

    /// Shift every signal bar by one signal step less one execution step,
    /// e.g. an H1 bar at 10:00 over M5 bars moves to 10:55.
    fn restamp_to_close(
        &self,
        signal: BarSeries,
        execution: &BarSeries,
    ) -> Result<BarSeries, LoadError> {
        if signal.is_empty() {
            return Ok(signal);
        }
        let fail = |reason: String| LoadError::Restamp {
            path: self.signal_path.clone(),
            reason,
        };
        let signal_step = bar_step(signal.bars())
            .ok_or_else(|| fail("at least two signal bars are needed to infer their length".into()))?;
        let exec_step = bar_step(execution.bars()).ok_or_else(|| {
            fail("at least two execution bars are needed to infer their length".into())
        })?;
        let shift = signal_step - exec_step;
        if shift < Duration::zero() {
            return Err(fail(format!(
                "signal step {signal_step} is shorter than execution step {exec_step}"
            )));
        }

        let mut bars = signal.bars().to_vec();
        for bar in &mut bars {
            let ts = bar.timestamp;
            bar.timestamp = ts
                .checked_add_signed(shift)
                .ok_or_else(|| fail(format!("{ts} + {shift} is out of range")))?;
        }
        debug!(
            path = %self.signal_path.display(),
            shift_secs = shift.num_seconds(),
            "moved open-stamped signal bars to their close"
        );
        BarSeries::new(bars).map_err(|source| LoadError::Series {
            path: self.signal_path.clone(),
            source,
        })
    }
}

/// Smallest gap between consecutive bars.
fn bar_step(bars: &[Bar]) -> Option<Duration> {
    bars.windows(2).map(|w| w[1].timestamp - w[0].timestamp).min()
}

impl PriceSeriesProvider for CsvProvider {
    type Error = LoadError;

    fn name(&self) -> &str {
        "csv"
    }

    fn load(&self) -> Result<PriceSeries, LoadError> {
        let execution = read_series(&self.execution_path)?;
        let mut signal = read_series(&self.signal_path)?;
        if self.signal_stamp == BarStamp::Open {
            signal = self.restamp_to_close(signal, &execution)?;
        }
        Ok(PriceSeries {
            instrument: self.instrument.clone(),
            signal,
            execution,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn reads_mid_columns_and_spread() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "m5.csv",
            "time,mid_o,mid_h,mid_l,mid_c,spread\n\
             2024-01-02T10:00:00Z,1.1000,1.1010,1.0990,1.1005,0.0002\n\
             2024-01-02T10:05:00Z,1.1005,1.1015,1.1000,1.1010,\n",
        );
        let bars = read_bars(&path).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 1.1005);
        assert_eq!(bars[0].spread, Some(0.0002));
        assert_eq!(bars[1].spread, None);
    }

    #[test]
    fn derives_spread_from_bid_ask() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "h1.csv",
            "time,mid_o,mid_h,mid_l,mid_c,bid_c,ask_c\n\
             2024-01-02T10:00:00.000000000Z,1.5,2.0,1.0,1.5,1.25,1.75\n",
        );
        let bars = read_bars(&path).unwrap();
        assert_eq!(bars[0].spread, Some(0.5));
    }

    #[test]
    fn rejects_bad_timestamp_with_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "bad.csv",
            "time,mid_o,mid_h,mid_l,mid_c\n\
             2024-01-02T10:00:00Z,1,1,1,1\n\
             yesterday,1,1,1,1\n",
        );
        let err = read_bars(&path).unwrap_err();
        assert!(matches!(err, LoadError::Timestamp { row: 3, .. }));
    }

    #[test]
    fn rejects_out_of_order_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "order.csv",
            "time,mid_o,mid_h,mid_l,mid_c\n\
             2024-01-02T11:00:00Z,1,1,1,1\n\
             2024-01-02T10:00:00Z,1,1,1,1\n",
        );
        let err = read_series(&path).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Series {
                source: SeriesError::NotIncreasing { .. },
                ..
            }
        ));
    }

    #[test]
    fn missing_file_is_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_bars(&dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Open { .. }));
    }

    #[test]
    fn write_then_read_preserves_bars() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let t = DateTime::parse_from_rfc3339("2024-01-02T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let bars = vec![
            Bar::new(t, 1.0, 1.5, 0.5, 1.25).with_spread(0.125),
            Bar::new(t + chrono::Duration::minutes(5), 1.25, 1.5, 1.0, 1.0),
        ];
        write_bars(&path, &bars).unwrap();
        assert_eq!(read_bars(&path).unwrap(), bars);
    }

    #[test]
    fn provider_loads_both_series() {
        let dir = tempfile::tempdir().unwrap();
        let content = "time,mid_o,mid_h,mid_l,mid_c\n2024-01-02T10:00:00Z,1,1,1,1\n";
        let signal = write_file(dir.path(), "h1.csv", content);
        let exec = write_file(dir.path(), "m5.csv", content);
        let provider = CsvProvider::new("EUR_USD", signal, exec);
        let series = provider.load().unwrap();
        assert_eq!(provider.name(), "csv");
        assert_eq!(series.instrument, "EUR_USD");
        assert_eq!(series.signal.len(), 1);
        assert_eq!(series.execution.len(), 1);
    }

    const M5: &str = "time,mid_o,mid_h,mid_l,mid_c\n\
        2024-01-02T10:00:00Z,1,1,1,1\n\
        2024-01-02T10:05:00Z,1,1,1,1\n\
        2024-01-02T10:10:00Z,1,1,1,1\n\
        2024-01-02T10:15:00Z,1,1,1,1\n\
        2024-01-02T10:20:00Z,1,1,1,1\n\
        2024-01-02T10:25:00Z,1,1,1,1\n";

    const M15_OPEN: &str = "time,mid_o,mid_h,mid_l,mid_c\n\
        2024-01-02T10:00:00Z,1,1,1,1\n\
        2024-01-02T10:15:00Z,1,1,1,1\n";

    #[test]
    fn open_stamped_signal_moves_to_last_execution_bar() {
        let dir = tempfile::tempdir().unwrap();
        let signal = write_file(dir.path(), "m15.csv", M15_OPEN);
        let exec = write_file(dir.path(), "m5.csv", M5);
        let series = CsvProvider::new("EUR_USD", signal, exec)
            .with_signal_stamp(BarStamp::Open)
            .load()
            .unwrap();
        let times: Vec<String> = series
            .signal
            .bars()
            .iter()
            .map(|b| b.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true))
            .collect();
        assert_eq!(times, vec!["2024-01-02T10:10:00Z", "2024-01-02T10:25:00Z"]);
    }

    #[test]
    fn close_stamped_signal_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let signal = write_file(dir.path(), "m15.csv", M15_OPEN);
        let exec = write_file(dir.path(), "m5.csv", M5);
        let series = CsvProvider::new("EUR_USD", &signal, exec).load().unwrap();
        assert_eq!(series.signal.bars(), read_bars(&signal).unwrap().as_slice());
    }

    #[test]
    fn open_stamp_needs_two_signal_bars() {
        let dir = tempfile::tempdir().unwrap();
        let signal = write_file(
            dir.path(),
            "m15.csv",
            "time,mid_o,mid_h,mid_l,mid_c\n2024-01-02T10:00:00Z,1,1,1,1\n",
        );
        let exec = write_file(dir.path(), "m5.csv", M5);
        let err = CsvProvider::new("EUR_USD", signal, exec)
            .with_signal_stamp(BarStamp::Open)
            .load()
            .unwrap_err();
        assert!(matches!(err, LoadError::Restamp { .. }));
    }
}
