//! Signal evaluators: one signal bar in, one decision out.
//!
//! Evaluators are pure and total. They read the bar and its indicator columns
//! and never see simulator or trade state. A bar whose inputs are undefined
//! (warm-up NaNs, missing columns) evaluates to `Signal::None`.

pub mod bollinger_reversion;
pub mod macd_momentum;
pub mod rsi_threshold;

pub use bollinger_reversion::BollingerReversion;
pub use macd_momentum::MacdMomentum;
pub use rsi_threshold::RsiThreshold;

use crate::data::SignalBar;
use crate::domain::Signal;
use crate::indicators::Indicator;
use tracing::debug;

/// Caller-supplied decision function over signal bars.
///
/// # Invariants
/// - `evaluate()` MUST NOT depend on anything but the bar view it is given
/// - `evaluate()` MUST be deterministic
pub trait SignalEvaluator: Send + Sync {
    /// Name for logs and run fingerprints.
    fn name(&self) -> &str {
        "custom"
    }

    fn evaluate(&self, bar: &SignalBar<'_>) -> Signal;

    /// Indicator columns this evaluator reads, so a runner can annotate the
    /// signal series before the simulation starts.
    fn required_indicators(&self) -> Vec<Box<dyn Indicator>> {
        Vec::new()
    }
}

/// Finite value of `column` on `bar`. Missing or NaN values (indicator
/// warm-up) are logged and read as `None`.
pub(crate) fn defined(evaluator: &str, bar: &SignalBar<'_>, column: &str) -> Option<f64> {
    let value = bar.finite(column);
    if value.is_none() {
        debug!(
            evaluator,
            bar = bar.index(),
            time = %bar.timestamp(),
            column,
            "undefined input; treating as NONE"
        );
    }
    value
}

/// Evaluator backed by a closure returning a `Signal`.
pub struct FnEvaluator<F> {
    name: String,
    f: F,
}

impl<F> FnEvaluator<F>
where
    F: Fn(&SignalBar<'_>) -> Signal + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> SignalEvaluator for FnEvaluator<F>
where
    F: Fn(&SignalBar<'_>) -> Signal + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, bar: &SignalBar<'_>) -> Signal {
        (self.f)(bar)
    }
}

/// Evaluator backed by a closure returning a numeric code (+1, -1, 0).
///
/// NaN or any other value is an undefined signal: it is logged and treated
/// as `Signal::None`.
pub struct CodeEvaluator<F> {
    name: String,
    f: F,
}

impl<F> CodeEvaluator<F>
where
    F: Fn(&SignalBar<'_>) -> f64 + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> SignalEvaluator for CodeEvaluator<F>
where
    F: Fn(&SignalBar<'_>) -> f64 + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, bar: &SignalBar<'_>) -> Signal {
        match Signal::decode((self.f)(bar)) {
            Ok(signal) => signal,
            Err(err) => {
                debug!(
                    evaluator = %self.name,
                    bar = bar.index(),
                    time = %bar.timestamp(),
                    "{err}; treating as NONE"
                );
                Signal::None
            }
        }
    }
}
