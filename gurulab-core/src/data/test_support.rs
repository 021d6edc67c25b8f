//! Bar builders shared by unit tests.

use crate::domain::Bar;
use chrono::{Duration, TimeZone, Utc};

/// Hourly bars starting 2024-01-02 00:00 UTC. Each bar opens at the previous
/// close and its range pads open/close by 0.0005.
pub fn hourly_bars(closes: &[f64]) -> Vec<Bar> {
    let t0 = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar::new(
                t0 + Duration::hours(i as i64),
                open,
                open.max(close) + 0.0005,
                open.min(close) - 0.0005,
                close,
            )
        })
        .collect()
}
