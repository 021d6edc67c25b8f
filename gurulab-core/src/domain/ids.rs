use serde::{Deserialize, Serialize};
use std::fmt;

/// Trade identifier, sequential from 1 within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TradeId(pub u64);

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Deterministic id generator for trades.
#[derive(Debug, Default)]
pub struct IdGen {
    next_trade: u64,
}

impl IdGen {
    pub fn next_trade_id(&mut self) -> TradeId {
        self.next_trade += 1;
        TradeId(self.next_trade)
    }
}

/// BLAKE3 hash of a simulation configuration (config + evaluator identity).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigHash(pub String);

impl ConfigHash {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes).to_hex().to_string())
    }
}

impl fmt::Display for ConfigHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Content hash of the input series (bars and indicator columns).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetHash(pub String);

impl DatasetHash {
    pub fn from_hasher(hasher: blake3::Hasher) -> Self {
        Self(hasher.finalize().to_hex().to_string())
    }
}

impl fmt::Display for DatasetHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trade_ids_are_sequential_from_one() {
        let mut gen = IdGen::default();
        assert_eq!(gen.next_trade_id(), TradeId(1));
        assert_eq!(gen.next_trade_id(), TradeId(2));
    }

    #[test]
    fn config_hash_deterministic() {
        let a = ConfigHash::from_bytes(b"profit=1.5;loss=-1.0");
        let b = ConfigHash::from_bytes(b"profit=1.5;loss=-1.0");
        let c = ConfigHash::from_bytes(b"profit=2.0;loss=-1.0");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
