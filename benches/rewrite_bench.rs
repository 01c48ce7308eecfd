//! Benchmarks for the reshape passes on long chains
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use reshape_optimizer::builder::FunctionBuilder;
use reshape_optimizer::graph::Function;
use reshape_optimizer::tensor::{default_order, ElementType};
use reshape_optimizer::transformers::OptimizationPipeline;

const SHAPES: [&[usize]; 4] = [&[6, 4], &[24], &[4, 6], &[2, 3, 4]];

/// `length` default-order reshapes over a [2, 3, 4] parameter
fn reshape_chain(length: usize) -> Function {
    let mut builder = FunctionBuilder::with_capacity("chain", length + 3);
    let mut current = builder
        .parameter("x", ElementType::F32, vec![2, 3, 4])
        .expect("parameter");
    let mut rank = 3;
    for i in 0..length {
        let shape = SHAPES[i % SHAPES.len()];
        current = builder
            .reshape(current, default_order(rank), shape.to_vec())
            .expect("reshape");
        rank = shape.len();
    }
    let out = builder.relu(current).expect("relu");
    builder.build(&[out]).expect("build")
}

/// `pairs` back-to-back transpose pairs over a [8, 16] parameter
fn transpose_pairs(pairs: usize) -> Function {
    let mut builder = FunctionBuilder::with_capacity("pairs", 2 * pairs + 3);
    let mut current = builder
        .parameter("x", ElementType::F32, vec![8, 16])
        .expect("parameter");
    for _ in 0..pairs {
        let t = builder.transpose(current, vec![1, 0]).expect("transpose");
        current = builder.transpose(t, vec![1, 0]).expect("transpose");
        current = builder.negative(current).expect("negative");
    }
    builder.build(&[current]).expect("build")
}

fn chain_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("reshape_chain");
    for length in [16, 128, 1024] {
        group.bench_with_input(BenchmarkId::from_parameter(length), &length, |b, &length| {
            b.iter_batched(
                || reshape_chain(length),
                |mut function| {
                    let stats = OptimizationPipeline::recurrent_only()
                        .run(&mut function)
                        .expect("pipeline");
                    black_box(stats)
                },
                criterion::BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn pair_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("transpose_pairs");
    for pairs in [16, 256] {
        group.bench_with_input(BenchmarkId::from_parameter(pairs), &pairs, |b, &pairs| {
            b.iter_batched(
                || transpose_pairs(pairs),
                |mut function| {
                    let stats = OptimizationPipeline::default()
                        .run(&mut function)
                        .expect("pipeline");
                    black_box(stats)
                },
                criterion::BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, chain_benchmark, pair_benchmark);
criterion_main!(benches);
