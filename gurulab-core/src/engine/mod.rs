//! Trade simulation engine.
//!
//! One run walks a signal series and an execution series of the same
//! instrument. At most one trade is open at a time; each trade carries a
//! stop/take bracket fixed at entry and is closed on the execution series.

pub mod bracket;
pub mod config;
pub mod error;
pub mod simulator;
pub mod state;

pub use bracket::check_bracket;
pub use config::{DistanceUnit, ReversalPolicy, SimConfig, MAX_ENTRY_DELAY_SECS};
pub use error::{SeriesRole, SimError};
pub use simulator::Simulator;
pub use state::{Exit, OpenTrade, RunResult, RunStats, SimState};
