//! Criterion benchmarks for the table hot paths.
//!
//! Benchmarks:
//! 1. Normalization of provider-shaped tables (index promotion, renames, null drop)
//! 2. CSV serialization of normalized tables

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use chrono::NaiveDate;
use pricepipe_core::data::{
    normalize, to_csv_bytes, PriceProvider, RawPriceTable, SyntheticProvider,
};
use pricepipe_core::{Period, Ticker};

// ── Helpers ──────────────────────────────────────────────────────────

fn raw_table(period: Period) -> RawPriceTable {
    let end = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
    SyntheticProvider::ending(end)
        .history(&Ticker::parse("BENCH").unwrap(), period)
        .unwrap()
}

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");

    for period in [Period::OneYear, Period::FiveYears, Period::Max] {
        let raw = raw_table(period);
        group.bench_with_input(
            BenchmarkId::new("synthetic", period.as_str()),
            &raw,
            |b, raw| {
                b.iter(|| normalize(black_box(raw.clone())).unwrap());
            },
        );
    }

    group.finish();
}

fn bench_csv(c: &mut Criterion) {
    let mut group = c.benchmark_group("to_csv_bytes");

    for period in [Period::OneYear, Period::Max] {
        let table = normalize(raw_table(period)).unwrap();
        group.bench_with_input(
            BenchmarkId::new("synthetic", period.as_str()),
            &table,
            |b, table| {
                b.iter(|| to_csv_bytes(black_box(table)).unwrap());
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_normalize, bench_csv);
criterion_main!(benches);
