//! Property tests for simulator invariants.
//!
//! Uses proptest over random execution paths and random signal codes to verify:
//! 1. Every opened trade is closed
//! 2. Closed trades never overlap and ids are sequential
//! 3. STOP/TAKE exits fill exactly at the bracket level
//! 4. Without spread, entries fill at the execution bar's mid close
//! 5. run_test is idempotent

use chrono::{DateTime, Duration, TimeZone, Utc};
use gurulab_core::data::{BarSeries, SignalBar};
use gurulab_core::domain::{Bar, CloseReason, TradeId};
use gurulab_core::engine::{DistanceUnit, ReversalPolicy, SimConfig, Simulator};
use gurulab_core::signals::CodeEvaluator;
use proptest::prelude::*;

const STEP: f64 = 1.0 / 1024.0;
const EXEC_PER_SIGNAL: usize = 12;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap()
}

/// Execution bars from integer step moves; each bar's range is widened by
/// `pad` steps on both sides.
fn exec_series(moves: &[i32], pads: &[u8], spread: f64) -> BarSeries {
    let mut price = 2.0;
    let bars = moves
        .iter()
        .zip(pads)
        .enumerate()
        .map(|(m, (&mv, &pad))| {
            let open = price;
            price += mv as f64 * STEP;
            let close = price;
            let pad = pad as f64 * STEP;
            Bar::new(
                t0() + Duration::minutes(5 * m as i64),
                open,
                open.max(close) + pad,
                open.min(close) - pad,
                close,
            )
            .with_spread(spread)
        })
        .collect();
    BarSeries::new(bars).unwrap()
}

/// One signal bar per EXEC_PER_SIGNAL execution bars, carrying `code`.
fn signal_series(exec: &BarSeries, codes: &[i8]) -> BarSeries {
    let bars: Vec<Bar> = exec
        .bars()
        .iter()
        .step_by(EXEC_PER_SIGNAL)
        .take(codes.len())
        .copied()
        .collect();
    let n = bars.len();
    BarSeries::new(bars)
        .unwrap()
        .with_column("code", codes[..n].iter().map(|&c| c as f64).collect())
        .unwrap()
}

fn arb_policy() -> impl Strategy<Value = ReversalPolicy> {
    prop_oneof![
        Just(ReversalPolicy::Ignore),
        Just(ReversalPolicy::Close),
        Just(ReversalPolicy::Reverse),
    ]
}

fn arb_case() -> impl Strategy<Value = (Vec<i32>, Vec<u8>, Vec<i8>)> {
    (4usize..10).prop_flat_map(|signals| {
        let exec_len = (signals - 1) * EXEC_PER_SIGNAL + 1;
        (
            prop::collection::vec(-3i32..=3, exec_len),
            prop::collection::vec(0u8..3, exec_len),
            prop::collection::vec(-1i8..=1, signals),
        )
    })
}

proptest! {
    #[test]
    fn simulator_invariants(
        (moves, pads, codes) in arb_case(),
        policy in arb_policy(),
        use_spread in any::<bool>(),
        unit_steps in 1u32..8,
        profit in prop_oneof![Just(0.5), Just(1.0), Just(1.5), Just(2.0)],
    ) {
        let exec = exec_series(&moves, &pads, 2.0 * STEP);
        let signal = signal_series(&exec, &codes);
        let config = SimConfig {
            profit_factor: profit,
            loss_factor: -1.0,
            use_spread,
            unit: DistanceUnit::Fixed { value: unit_steps as f64 * STEP },
            reversal: policy,
            ..SimConfig::default()
        };
        let sim = Simulator::new(config).unwrap();
        let eval = CodeEvaluator::new("code", |bar: &SignalBar<'_>| {
            bar.value("code").unwrap_or(f64::NAN)
        });

        let result = sim.run_test(&signal, &exec, &eval).unwrap();
        let trades = result.trades.trades();

        // 1. opens == closes
        prop_assert_eq!(result.stats.trades_opened, result.stats.trades_closed);
        prop_assert_eq!(result.stats.trades_closed, trades.len());

        for (k, trade) in trades.iter().enumerate() {
            // 2. sequential ids, no overlap
            prop_assert_eq!(trade.id, TradeId(k as u64 + 1));
            prop_assert!(trade.open_time <= trade.close_time);
            prop_assert!(trade.open_bar <= trade.close_bar);
            if k > 0 {
                prop_assert!(trades[k - 1].close_time <= trade.open_time);
            }

            // 3. bracket exits fill at the level
            match trade.close_reason {
                CloseReason::Stop => prop_assert_eq!(trade.close_price, trade.stop_price),
                CloseReason::Take => prop_assert_eq!(trade.close_price, trade.take_price),
                CloseReason::EndOfData => prop_assert_eq!(trade.close_bar, exec.len() - 1),
                CloseReason::Reversal => prop_assert!(policy != ReversalPolicy::Ignore),
            }

            // 4. mid-close entry without spread
            if !use_spread {
                prop_assert_eq!(trade.open_price, exec.bars()[trade.open_bar].close);
            }

            let sign = trade.direction.sign();
            prop_assert!((trade.result - sign * (trade.close_price - trade.open_price)).abs() < 1e-12);
        }

        // 5. idempotent
        let again = sim.run_test(&signal, &exec, &eval).unwrap();
        prop_assert_eq!(result, again);
    }

    /// The summary agrees with the trades it summarises.
    #[test]
    fn summary_matches_trades(
        (moves, pads, codes) in arb_case(),
    ) {
        let exec = exec_series(&moves, &pads, 0.0);
        let signal = signal_series(&exec, &codes);
        let sim = Simulator::new(SimConfig {
            unit: DistanceUnit::Fixed { value: 3.0 * STEP },
            ..SimConfig::default()
        }).unwrap();
        let eval = CodeEvaluator::new("code", |bar: &SignalBar<'_>| {
            bar.value("code").unwrap_or(f64::NAN)
        });
        let result = sim.run_test(&signal, &exec, &eval).unwrap();
        let summary = result.summary();
        let trades = result.trades.trades();

        prop_assert_eq!(summary.count, trades.len());
        let total: f64 = trades.iter().map(|t| t.result).sum();
        prop_assert!((summary.total_result - total).abs() < 1e-12);
        prop_assert!((0.0..=1.0).contains(&summary.win_rate));
        if trades.is_empty() {
            prop_assert_eq!(summary.win_rate, 0.0);
        }
    }
}
