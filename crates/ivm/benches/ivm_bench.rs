//! Benchmarks for rill-ivm.
//!
//! Target: single row incremental update well under a full recompute.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rill_core::{DocObject, DocValue, RowId};
use rill_expr::{CmpOp, DefaultEvaluator, Expr, Predicate};
use rill_ivm::{
    build_strategy, AccKind, Delta, DocRow, ExecutionMode, GroupSpec, Pipeline, SortSpec,
};

fn make_row(id: u64, value: f64) -> DocRow {
    let mut obj = DocObject::new();
    obj.insert("a", DocValue::Number(value));
    DocRow::new(RowId::source(id), DocValue::Object(obj))
}

fn sum_pipeline() -> Pipeline {
    Pipeline::builder()
        .filter(Predicate::cmp("a", CmpOp::Gt, 10))
        .group(GroupSpec::new(Expr::Literal(DocValue::Null)).acc(
            "total",
            AccKind::Sum,
            Expr::field("a"),
        ))
        .build()
}

fn topk_pipeline() -> Pipeline {
    Pipeline::builder()
        .sort(vec![SortSpec::desc("a")])
        .limit(10)
        .build()
}

fn bench_incremental_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("incremental_update");

    for size in [100, 1_000, 10_000] {
        group.bench_with_input(
            BenchmarkId::new("group_sum", size),
            &size,
            |b, &size| {
                let mut strategy = build_strategy(&sum_pipeline(), ExecutionMode::Stream);
                let seed: Vec<_> = (0..size)
                    .map(|i| Delta::insert(make_row(i, i as f64)))
                    .collect();
                strategy.apply(seed, &DefaultEvaluator);

                let mut next = size;
                b.iter(|| {
                    next += 1;
                    let batch = vec![Delta::insert(make_row(next, next as f64))];
                    black_box(strategy.apply(batch, &DefaultEvaluator));
                })
            },
        );
    }

    group.finish();
}

fn bench_recompute_baseline(c: &mut Criterion) {
    let mut group = c.benchmark_group("recompute_baseline");

    for size in [100, 1_000] {
        let rows: Vec<_> = (0..size)
            .map(|i| Delta::insert(make_row(i, i as f64)))
            .collect();

        group.bench_with_input(
            BenchmarkId::new("group_sum", size),
            &rows,
            |b, rows| {
                b.iter(|| {
                    // From-scratch evaluation of the same live set.
                    let mut strategy = build_strategy(&sum_pipeline(), ExecutionMode::Stream);
                    black_box(strategy.apply(rows.clone(), &DefaultEvaluator));
                })
            },
        );
    }

    group.finish();
}

fn bench_topk(c: &mut Criterion) {
    let mut group = c.benchmark_group("topk");

    for size in [1_000, 10_000] {
        group.bench_with_input(
            BenchmarkId::new("insert_outside_window", size),
            &size,
            |b, &size| {
                let mut strategy = build_strategy(&topk_pipeline(), ExecutionMode::Stream);
                let seed: Vec<_> = (0..size)
                    .map(|i| Delta::insert(make_row(i, i as f64)))
                    .collect();
                strategy.apply(seed, &DefaultEvaluator);

                let mut next = size;
                b.iter(|| {
                    next += 1;
                    // A row below the window exercises the bounded reject path.
                    let batch = vec![Delta::insert(make_row(next, -1.0))];
                    black_box(strategy.apply(batch, &DefaultEvaluator));
                })
            },
        );
    }

    group.finish();
}

fn bench_toggle_flips(c: &mut Criterion) {
    let mut group = c.benchmark_group("toggle");

    group.bench_function("remove_reinsert_1000", |b| {
        let mut strategy = build_strategy(&sum_pipeline(), ExecutionMode::Toggle);
        let seed: Vec<_> = (0..1_000)
            .map(|i| Delta::insert(make_row(i, i as f64)))
            .collect();
        strategy.apply(seed, &DefaultEvaluator);

        b.iter(|| {
            strategy.apply(vec![Delta::delete(make_row(500, 500.0))], &DefaultEvaluator);
            black_box(strategy.apply(
                vec![Delta::insert(make_row(500, 500.0))],
                &DefaultEvaluator,
            ));
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_incremental_update,
    bench_recompute_baseline,
    bench_topk,
    bench_toggle_flips
);
criterion_main!(benches);
