//! Criterion benchmarks for TrendGate hot paths.
//!
//! Benchmarks:
//! 1. Bar loop (engine on_bar with an always-filling collaborator)
//! 2. Intent book operations (submit, acknowledge, retire)
//! 3. Feed adapter snapshot reads

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use trendgate_core::domain::{
    BarSnapshot, IndicatorSnapshot, IntentId, IntentRole, OrderIntent, OrderKind, OrderOutcome,
    OrderSide,
};
use trendgate_core::engine::{IntentBook, IntentStatus};
use trendgate_core::{DecisionEngine, FeedAdapter, FeedKeys, IndicatorValues, StrategyConfig};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_inputs(n: usize) -> Vec<(BarSnapshot, IndicatorSnapshot)> {
    let start = Utc.with_ymd_and_hms(2022, 2, 1, 0, 0, 0).unwrap();
    (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.1).sin() * 10.0;
            let bar = BarSnapshot::new(
                start + Duration::minutes(15 * i as i64),
                close,
                close + 1.5,
                close - 1.5,
                close,
            );
            let cross = match i % 17 {
                0 => 1.0,
                9 => -1.0,
                _ => 0.0,
            };
            let stop = if (i / 8) % 2 == 0 { close - 2.0 } else { close + 2.0 };
            (bar, IndicatorSnapshot::new(100.0, cross, stop))
        })
        .collect()
}

fn run_loop(inputs: &[(BarSnapshot, IndicatorSnapshot)]) -> usize {
    let Ok(mut engine) = DecisionEngine::new(StrategyConfig::default()) else {
        return 0;
    };
    for (bar, ind) in inputs {
        let Ok(out) = engine.on_bar(bar, ind) else {
            break;
        };
        for intent in out.intents {
            let _ = engine.on_order_outcome(&OrderOutcome::accepted(intent.id, intent.side));
            if matches!(intent.role, IntentRole::Entry | IntentRole::ForcedExit) {
                let _ = engine.on_order_outcome(&OrderOutcome::filled(
                    intent.id,
                    intent.side,
                    bar.close,
                ));
            }
        }
    }
    engine.trades().len()
}

// ── 1. Bar Loop ──────────────────────────────────────────────────────

fn bench_bar_loop(c: &mut Criterion) {
    let mut group = c.benchmark_group("bar_loop");

    for &bar_count in &[672, 2688, 35040] {
        let inputs = make_inputs(bar_count);
        group.bench_with_input(BenchmarkId::new("engine", bar_count), &inputs, |b, inputs| {
            b.iter(|| run_loop(black_box(inputs)));
        });
    }

    group.finish();
}

// ── 2. Intent Book Operations ────────────────────────────────────────

fn bench_intent_book(c: &mut Criterion) {
    let mut group = c.benchmark_group("intent_book");

    group.bench_function("submit_ack_retire_100", |b| {
        b.iter(|| {
            let mut book = IntentBook::new();
            for i in 0..100u64 {
                let intent = OrderIntent {
                    id: IntentId(i),
                    side: OrderSide::Sell,
                    kind: OrderKind::Limit { price: 110.0 },
                    size: 1.0,
                    linked: None,
                    role: IntentRole::TakeProfit,
                };
                let _ = book.submit(intent, i as usize);
                let _ = book.acknowledge(IntentId(i), i as usize);
                let _ = book.retire(IntentId(i), IntentStatus::Filled, i as usize, "filled");
            }
            black_box(book.live_count())
        });
    });

    group.finish();
}

// ── 3. Feed Snapshots ────────────────────────────────────────────────

fn bench_feed(c: &mut Criterion) {
    let n = 35040;
    let mut values = IndicatorValues::new();
    values.insert("trend_filter", (0..n).map(|i| 100.0 + i as f64 * 0.01).collect());
    values.insert("cross_signal", (0..n).map(|i| (i % 3) as f64 - 1.0).collect());
    values.insert("stop_level", (0..n).map(|i| 95.0 + i as f64 * 0.01).collect());
    let adapter = FeedAdapter::new(FeedKeys::default());

    c.bench_function("feed_snapshot_35040", |b| {
        b.iter(|| {
            let mut ready = 0usize;
            for i in 0..n {
                if let Ok(Some(_)) = adapter.snapshot(black_box(&values), i) {
                    ready += 1;
                }
            }
            ready
        });
    });
}

criterion_group!(benches, bench_bar_loop, bench_intent_book, bench_feed);
criterion_main!(benches);
