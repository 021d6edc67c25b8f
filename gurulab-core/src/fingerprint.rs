//! Run fingerprinting: deterministic identity of a simulation run.
//!
//! - `EvaluatorConfig`: evaluator name and its numeric parameters.
//! - `ConfigHash`: BLAKE3 of the canonical JSON of `SimConfig` + evaluator.
//! - `DatasetHash`: BLAKE3 over both series' bars and indicator columns.
//! - `RunFingerprint`: all of the above plus the instrument.

use crate::data::BarSeries;
use crate::domain::{ConfigHash, DatasetHash};
use crate::engine::SimConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Evaluator identity. `BTreeMap` keeps parameter order stable for hashing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluatorConfig {
    pub name: String,
    pub params: BTreeMap<String, f64>,
}

impl EvaluatorConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: f64) -> Self {
        self.params.insert(key.into(), value);
        self
    }
}

/// Complete fingerprint of a single run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunFingerprint {
    pub instrument: String,
    pub sim: SimConfig,
    pub evaluator: EvaluatorConfig,

    // ── Derived hashes ──
    pub config_hash: ConfigHash,
    pub dataset_hash: DatasetHash,
}

#[derive(Serialize)]
struct HashedConfig<'a> {
    sim: &'a SimConfig,
    evaluator: &'a EvaluatorConfig,
}

impl RunFingerprint {
    pub fn new(
        instrument: impl Into<String>,
        sim: &SimConfig,
        evaluator: EvaluatorConfig,
        signal: &BarSeries,
        execution: &BarSeries,
    ) -> Result<Self, serde_json::Error> {
        let config_hash = config_hash(sim, &evaluator)?;
        Ok(Self {
            instrument: instrument.into(),
            sim: sim.clone(),
            evaluator,
            config_hash,
            dataset_hash: dataset_hash(signal, execution),
        })
    }

    /// Short identifier combining config and data, used for artifact names.
    pub fn id(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.instrument.as_bytes());
        hasher.update(self.config_hash.0.as_bytes());
        hasher.update(self.dataset_hash.0.as_bytes());
        hasher.finalize().to_hex()[..16].to_string()
    }
}

/// Hash of the canonical JSON of the simulation config and evaluator.
pub fn config_hash(
    sim: &SimConfig,
    evaluator: &EvaluatorConfig,
) -> Result<ConfigHash, serde_json::Error> {
    let json = serde_json::to_vec(&HashedConfig { sim, evaluator })?;
    Ok(ConfigHash::from_bytes(&json))
}

/// Hash over both series, signal first.
pub fn dataset_hash(signal: &BarSeries, execution: &BarSeries) -> DatasetHash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"signal");
    signal.hash_into(&mut hasher);
    hasher.update(b"execution");
    execution.hash_into(&mut hasher);
    DatasetHash::from_hasher(hasher)
}
