//! Benchmarks for extraction and summarization
//!
//! Run with: `cargo bench --bench gamma_stats`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ln_gamma_stats::{analyze, summarize, Parameter};

/// GPT-2 shaped parameter list with `blocks` blocks of `width` gammas
fn gpt2_parameters(blocks: usize, width: usize) -> Vec<Parameter> {
    let gamma = |seed: usize| -> Vec<f32> {
        (0..width)
            .map(|i| 1.0 + ((i * 31 + seed * 17) % 97) as f32 / 97.0 - 0.5)
            .collect()
    };

    let mut params = Vec::with_capacity(blocks * 3 + 1);
    for layer in 0..blocks {
        params.push(Parameter::new(format!("h.{layer}.ln_1.weight"), gamma(layer * 2)));
        params.push(Parameter::new(format!("h.{layer}.ln_2.weight"), gamma(layer * 2 + 1)));
        params.push(Parameter::new(
            format!("h.{layer}.mlp.c_fc.weight"),
            vec![0.0; 16],
        ));
    }
    params.push(Parameter::new("ln_f.weight", gamma(blocks * 2)));
    params
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_summarize(c: &mut Criterion) {
    let mut group = c.benchmark_group("summarize");

    for &len in &[768usize, 19_200, 100_000] {
        let values: Vec<f32> = (0..len).map(|i| (i % 1000) as f32 / 500.0 - 0.5).collect();
        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &values, |b, values| {
            b.iter(|| summarize(black_box(values)));
        });
    }

    group.finish();
}

fn bench_analyze(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze");

    // gpt2, gpt2-medium, gpt2-large shapes
    for &(blocks, width) in &[(12usize, 768usize), (24, 1024), (36, 1280)] {
        let params = gpt2_parameters(blocks, width);
        group.bench_with_input(
            BenchmarkId::new("blocks", blocks),
            &params,
            |b, params| {
                b.iter(|| analyze(black_box(params)));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_summarize, bench_analyze);
criterion_main!(benches);
