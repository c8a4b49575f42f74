//! Benchmarks for report encoding and rakeback lookup
//!
//! Both sit on the path of building a price update, once per feed.

use alloy_primitives::{B256, U256};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use ledger_submit::rakeback::tier_for;
use ledger_submit::report::{encode_report, FeedId, Report};

const PRICE: &str = "2310000000000000000000";

fn bench_encode_layouts(c: &mut Criterion) {
    let ts = Some(U256::from(1_700_000_000u64));
    let cases = [
        ("short", FeedId::Index(1), None),
        ("timestamped_index", FeedId::Index(1), ts),
        ("timestamped_legacy", FeedId::Id(B256::repeat_byte(0x42)), ts),
    ];

    let mut group = c.benchmark_group("encode_report");
    for (name, feed, timestamp) in cases {
        group.bench_with_input(BenchmarkId::from_parameter(name), &(feed, timestamp), |b, &(feed, timestamp)| {
            b.iter(|| encode_report(black_box(PRICE), feed, timestamp))
        });
    }
    group.finish();
}

fn bench_encode_prevalidated(c: &mut Criterion) {
    let report = match Report::new(PRICE, FeedId::Index(1), None) {
        Ok(report) => report,
        Err(e) => panic!("benchmark report rejected: {}", e),
    };
    c.bench_function("report_encode_only", |b| b.iter(|| black_box(&report).encode()));
}

fn bench_tier_for(c: &mut Criterion) {
    let scale = U256::from(1_000_000_000_000_000_000u64);
    let balances = [0u64, 499, 5_000, 1_249_999, 10_000_000].map(|whole| U256::from(whole) * scale);

    c.bench_function("tier_for", |b| {
        b.iter(|| {
            for balance in &balances {
                black_box(tier_for(black_box(*balance)));
            }
        })
    });
}

criterion_group!(benches, bench_encode_layouts, bench_encode_prevalidated, bench_tier_for);
criterion_main!(benches);
