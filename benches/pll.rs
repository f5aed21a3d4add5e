use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ldcapture_core::efm::pll::Pll;

/// Synthesize a run of samples approximating an EFM-modulated square
/// wave at the nominal bit rate, so the PLL has real edges to track
/// rather than degenerating into worst-case all-hunt behavior.
fn synth_samples(len: usize, sample_rate_hz: f64, bit_rate_hz: f64) -> Vec<i16> {
    let samples_per_bit = sample_rate_hz / bit_rate_hz;
    (0..len)
        .map(|i| {
            let phase = (i as f64 / samples_per_bit).floor() as i64;
            if phase % 3 == 0 {
                16_000
            } else {
                -16_000
            }
        })
        .collect()
}

fn benchmark_pll_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("pll_process");
    for &len in &[4_096usize, 16_384, 65_536] {
        let samples = synth_samples(len, 40_000_000.0, 4_321_800.0);
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, _| {
            b.iter(|| {
                let mut pll = Pll::new(40_000_000.0, 4_321_800.0);
                black_box(pll.process(black_box(&samples)));
            })
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_pll_throughput);
criterion_main!(benches);
