//! Result export: JSON artifacts and CSV trade tapes.
//!
//! All persisted artifacts include a `schema_version` field. Newer versions
//! are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::SecondsFormat;
use gurulab_core::domain::Trade;

use crate::runner::{BacktestResult, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `BacktestResult` to pretty JSON.
pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a `BacktestResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Trade tape as CSV, one row per closed trade in close order.
pub fn export_trades_csv(trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "id",
        "direction",
        "signal_time",
        "open_time",
        "open_bar",
        "open_price",
        "stop_price",
        "take_price",
        "unit",
        "close_time",
        "close_bar",
        "close_price",
        "close_reason",
        "result",
        "bars_held",
    ])?;

    for t in trades {
        wtr.write_record([
            t.id.to_string(),
            t.direction.to_string(),
            t.signal_time.to_rfc3339_opts(SecondsFormat::Secs, true),
            t.open_time.to_rfc3339_opts(SecondsFormat::Secs, true),
            t.open_bar.to_string(),
            t.open_price.to_string(),
            t.stop_price.to_string(),
            t.take_price.to_string(),
            t.unit.to_string(),
            t.close_time.to_rfc3339_opts(SecondsFormat::Secs, true),
            t.close_bar.to_string(),
            t.close_price.to_string(),
            t.close_reason.to_string(),
            t.result.to_string(),
            t.bars_held.to_string(),
        ])?;
    }

    let bytes = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output is not UTF-8")
}

// ─── Artifact files ─────────────────────────────────────────────────

/// Paths of the files written by `save_artifacts`.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactPaths {
    pub json: PathBuf,
    pub trades_csv: PathBuf,
}

/// Write `<run_id>.json` and `<run_id>_trades.csv` into `output_dir`,
/// creating the directory if needed.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<ArtifactPaths> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    let paths = ArtifactPaths {
        json: output_dir.join(format!("{}.json", result.run_id)),
        trades_csv: output_dir.join(format!("{}_trades.csv", result.run_id)),
    };
    std::fs::write(&paths.json, export_json(result)?)
        .with_context(|| format!("failed to write {}", paths.json.display()))?;
    std::fs::write(&paths.trades_csv, export_trades_csv(&result.trades)?)
        .with_context(|| format!("failed to write {}", paths.trades_csv.display()))?;
    Ok(paths)
}
