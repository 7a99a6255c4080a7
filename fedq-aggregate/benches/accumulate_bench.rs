//! Per-row accumulation throughput through the shared `add_input` path.

#![forbid(unsafe_code)]

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use rand::{rngs::SmallRng, Rng, SeedableRng};

use fedq_aggregate::{Aggregate, AggregateKind, AggregateSpec, EvalContext};
use fedq_types::{DataType, Value};

const N: usize = 100_000;

fn make_rows(n: usize) -> Vec<[Value; 2]> {
    let mut rng = SmallRng::seed_from_u64(0xC0FF_EE00_DADA_BEEF);
    (0..n)
        .map(|i| {
            let value = if i % 17 == 0 {
                Value::Null
            } else {
                Value::Integer(rng.random_range(-1_000..1_000))
            };
            [value, Value::from(",")]
        })
        .collect()
}

fn build(kind: AggregateKind, input_types: &[DataType]) -> Aggregate {
    let indexes = (0..input_types.len()).collect();
    AggregateSpec::new("bench", kind)
        .build(input_types, indexes)
        .unwrap()
}

fn bench_accumulators(c: &mut Criterion) {
    let rows = make_rows(N);
    let ctx = EvalContext::default();

    for (label, kind) in [
        ("count", AggregateKind::Count),
        ("sum_long", AggregateKind::Sum),
        ("avg_double", AggregateKind::Avg),
        ("stddev_samp", AggregateKind::from_name("STDDEV_SAMP").unwrap()),
        ("max", AggregateKind::Max),
    ] {
        c.bench_function(&format!("accumulate/{label}"), |b| {
            b.iter_batched(
                || build(kind.clone(), &[DataType::Integer]),
                |mut agg| {
                    for row in &rows {
                        agg.add_input(row, &ctx).unwrap();
                    }
                    black_box(agg.get_result(&ctx).unwrap());
                },
                BatchSize::SmallInput,
            );
        });
    }

    c.bench_function("accumulate/count_distinct", |b| {
        b.iter_batched(
            || {
                let spec = AggregateSpec::new("bench", AggregateKind::Count).with_distinct(true);
                spec.build(&[DataType::Integer], vec![0]).unwrap()
            },
            |mut agg| {
                for row in &rows {
                    agg.add_input(row, &ctx).unwrap();
                }
                black_box(agg.get_result(&ctx).unwrap());
            },
            BatchSize::SmallInput,
        );
    });

    c.bench_function("accumulate/string_agg_in_memory", |b| {
        let strings: Vec<[Value; 2]> = rows
            .iter()
            .map(|[v, d]| [Value::String(v.to_text().unwrap()), d.clone()])
            .collect();
        b.iter_batched(
            || build(AggregateKind::StringAgg, &[DataType::String, DataType::String]),
            |mut agg| {
                for row in &strings {
                    agg.add_input(row, &ctx).unwrap();
                }
                black_box(agg.get_result(&ctx).unwrap());
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_accumulators);
criterion_main!(benches);
