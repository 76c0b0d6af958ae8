//! Single-head and multi-head attention throughput on CPU.
//! Run with: `cargo bench -p attention throughput`

use attention::{build_causal_mask, multi_head_attend, Attention, Config, ExactAttention};
use candle_core::{DType, Device, Tensor};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

fn bench_exact(c: &mut Criterion) {
    let device = Device::Cpu;
    let kernel = ExactAttention::new();
    let config = Config::default();
    let head_dim = 64usize;

    for &dtype in &[DType::F32, DType::BF16] {
        let mut group = c.benchmark_group(format!("exact/{dtype:?}"));
        for &seq_len in &[64usize, 256, 1024] {
            let make = || {
                Tensor::randn(0f32, 1.0, (seq_len, head_dim), &device)
                    .and_then(|t| t.to_dtype(dtype))
                    .expect("input")
            };
            let (q, k, v) = (make(), make(), make());
            let mask = build_causal_mask(&device, seq_len, seq_len).expect("mask");

            group.throughput(Throughput::Elements((seq_len * seq_len) as u64));
            group.bench_with_input(
                BenchmarkId::new("causal", seq_len),
                &(q, k, v, mask),
                |b, (q, k, v, mask)| {
                    b.iter(|| {
                        let out = kernel
                            .attend(black_box(q), k, v, Some(mask), &config)
                            .expect("attend");
                        black_box(out);
                    });
                },
            );
        }
        group.finish();
    }
}

fn bench_multi_head(c: &mut Criterion) {
    let device = Device::Cpu;
    let d_model = 512usize;
    let mut group = c.benchmark_group("multi_head");
    for &n_heads in &[1usize, 8, 16] {
        let x = Tensor::randn(0f32, 1.0, (128, d_model), &device).expect("input");
        group.bench_with_input(BenchmarkId::from_parameter(n_heads), &x, |b, x| {
            b.iter(|| black_box(multi_head_attend(x, x, x, n_heads).expect("multi head")));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_exact, bench_multi_head);
criterion_main!(benches);
