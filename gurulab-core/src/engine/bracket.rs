//! Bracket exit check for one execution bar.
//!
//! Stops are checked before takes: when one bar's range touches both levels
//! the adverse outcome wins. A BUY trade exits on the bid side of the bar, a
//! SELL trade on the ask side.

use super::state::{Exit, OpenTrade};
use crate::data::SidePrices;
use crate::domain::{CloseReason, Direction};

/// Exit of `trade` on the exit-side prices of bar `index`, if its bracket is hit.
/// Fills are exactly at the bracket level.
pub fn check_bracket(trade: &OpenTrade, side: &SidePrices, index: usize) -> Option<Exit> {
    let (stop_hit, take_hit) = match trade.direction {
        Direction::Buy => (side.low <= trade.stop_price, side.high >= trade.take_price),
        Direction::Sell => (side.high >= trade.stop_price, side.low <= trade.take_price),
    };
    if stop_hit {
        Some(Exit {
            reason: CloseReason::Stop,
            bar: index,
            price: trade.stop_price,
        })
    } else if take_hit {
        Some(Exit {
            reason: CloseReason::Take,
            bar: index,
            price: trade.take_price,
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TradeId;
    use chrono::{TimeZone, Utc};

    fn trade(direction: Direction) -> OpenTrade {
        let t = Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap();
        // unit 0.0010 → BUY stop 1.0990 / take 1.1015
        OpenTrade::new(TradeId(1), direction, t, t, 0, 1.1000, 0.0010, 1.5, -1.0)
    }

    fn side(high: f64, low: f64) -> SidePrices {
        SidePrices {
            open: (high + low) / 2.0,
            high,
            low,
            close: (high + low) / 2.0,
        }
    }

    #[test]
    fn buy_take() {
        let exit = check_bracket(&trade(Direction::Buy), &side(1.1020, 1.0995), 4).unwrap();
        assert_eq!(exit.reason, CloseReason::Take);
        assert_eq!(exit.price, trade(Direction::Buy).take_price);
        assert_eq!(exit.bar, 4);
    }

    #[test]
    fn buy_stop_on_touch() {
        let t = trade(Direction::Buy);
        let exit = check_bracket(&t, &side(1.1005, t.stop_price), 1).unwrap();
        assert_eq!(exit.reason, CloseReason::Stop);
        assert_eq!(exit.price, t.stop_price);
    }

    #[test]
    fn stop_wins_tie() {
        let t = trade(Direction::Buy);
        let exit = check_bracket(&t, &side(1.1100, 1.0900), 1).unwrap();
        assert_eq!(exit.reason, CloseReason::Stop);

        let t = trade(Direction::Sell);
        let exit = check_bracket(&t, &side(1.1100, 1.0900), 1).unwrap();
        assert_eq!(exit.reason, CloseReason::Stop);
        assert_eq!(exit.price, t.stop_price);
    }

    #[test]
    fn sell_take() {
        let t = trade(Direction::Sell);
        let exit = check_bracket(&t, &side(1.0999, 1.0980), 2).unwrap();
        assert_eq!(exit.reason, CloseReason::Take);
        assert_eq!(exit.price, t.take_price);
    }

    #[test]
    fn inside_bracket_no_exit() {
        assert!(check_bracket(&trade(Direction::Buy), &side(1.1010, 1.0995), 1).is_none());
        assert!(check_bracket(&trade(Direction::Sell), &side(1.1005, 1.0990), 1).is_none());
    }
}
