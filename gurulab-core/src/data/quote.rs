//! Bid/ask view of a mid-price bar.
//!
//! ask = mid + spread / 2, bid = mid - spread / 2. With spread disabled (or
//! absent from the feed) both sides equal the mid price.

use crate::domain::{Bar, Direction};

/// Price side of a bar for a given trade direction and spread setting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    half_spread: f64,
}

/// The four prices of one side of the book for a bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SidePrices {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Quote {
    pub fn new(bar: &Bar, use_spread: bool) -> Self {
        let half_spread = if use_spread {
            bar.spread_or_zero() / 2.0
        } else {
            0.0
        };
        Self { half_spread }
    }

    pub fn ask(&self, bar: &Bar) -> SidePrices {
        self.shifted(bar, self.half_spread)
    }

    pub fn bid(&self, bar: &Bar) -> SidePrices {
        self.shifted(bar, -self.half_spread)
    }

    /// Prices a trade in `direction` pays to enter: ask for BUY, bid for SELL.
    pub fn entry_side(&self, bar: &Bar, direction: Direction) -> SidePrices {
        match direction {
            Direction::Buy => self.ask(bar),
            Direction::Sell => self.bid(bar),
        }
    }

    /// Prices a trade in `direction` exits at: bid for BUY, ask for SELL.
    pub fn exit_side(&self, bar: &Bar, direction: Direction) -> SidePrices {
        self.entry_side(bar, direction.opposite())
    }

    fn shifted(&self, bar: &Bar, delta: f64) -> SidePrices {
        if delta == 0.0 {
            return SidePrices {
                open: bar.open,
                high: bar.high,
                low: bar.low,
                close: bar.close,
            };
        }
        SidePrices {
            open: bar.open + delta,
            high: bar.high + delta,
            low: bar.low + delta,
            close: bar.close + delta,
        }
    }
}
