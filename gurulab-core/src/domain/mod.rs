//! Domain types for GuruLab

pub mod bar;
pub mod ids;
pub mod signal;
pub mod trade;

pub use bar::Bar;
pub use ids::{ConfigHash, DatasetHash, IdGen, TradeId};
pub use signal::{Direction, Signal, UndefinedSignal};
pub use trade::{CloseReason, Trade};
