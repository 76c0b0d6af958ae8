//! Layer normalisation over `(seq_len, d_model)` activations.
//! Run with: `cargo bench -p layers norm_throughput`

use candle_core::{DType, Device, Tensor};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use layers::norm::{layer_normalization, LayerNorm, NormConfig};

fn bench_layer_norm(c: &mut Criterion) {
    let device = Device::Cpu;
    let seq_len = 256usize;

    for &dtype in &[DType::F16, DType::F32] {
        let mut group = c.benchmark_group(format!("layer_norm/{dtype:?}"));
        for &d_model in &[64usize, 512, 2048] {
            let x = Tensor::randn(0f32, 1.0, (seq_len, d_model), &device)
                .and_then(|t| t.to_dtype(dtype))
                .expect("input");
            let gamma = Tensor::ones(d_model, dtype, &device).expect("gamma");
            let beta = Tensor::zeros(d_model, dtype, &device).expect("beta");
            let plain = LayerNorm::without_affine(NormConfig::new(d_model)).expect("norm");

            group.throughput(Throughput::Elements((seq_len * d_model) as u64));
            group.bench_with_input(BenchmarkId::new("gamma_beta", d_model), &x, |b, x| {
                b.iter(|| {
                    black_box(layer_normalization(black_box(x), &gamma, &beta, 1e-5).expect("norm"))
                });
            });
            group.bench_with_input(BenchmarkId::new("no_affine", d_model), &x, |b, x| {
                b.iter(|| black_box(plain.forward(black_box(x)).expect("norm")));
            });
        }
        group.finish();
    }
}

criterion_group!(benches, bench_layer_norm);
criterion_main!(benches);
