use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use hibf::{HierarchicalBinning, PackConfig};

fn synthetic_counts(n: usize) -> (Vec<String>, Vec<u64>) {
    let names = (0..n).map(|i| format!("bin{i}")).collect();
    let counts = (0..n).map(|i| 100 + (i as u64 * 37) % 5000).collect();
    (names, counts)
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("hierarchical_binning");

    for &n in &[64usize, 256, 1024] {
        let (names, counts) = synthetic_counts(n);
        let config = PackConfig {
            bins: 64,
            ..PackConfig::default()
        };
        group.bench_with_input(BenchmarkId::new("layout", n), &n, |b, _| {
            b.iter(|| {
                let binning =
                    HierarchicalBinning::new(names.clone(), counts.clone(), config.clone())
                        .unwrap();
                binning.execute().unwrap()
            });
        });
    }

    group.finish();
}

fn bench_ibf_emplace(c: &mut Criterion) {
    use hibf::InterleavedBloomFilter;

    let mut group = c.benchmark_group("ibf_emplace");
    group.bench_function("emplace_10k", |b| {
        b.iter(|| {
            let mut ibf = InterleavedBloomFilter::new(64, 8192, 2);
            for i in 0..10_000u64 {
                ibf.emplace(i, (i % 64) as usize);
            }
        });
    });
    group.finish();
}

criterion_group!(benches, bench_layout, bench_ibf_emplace);
criterion_main!(benches);
