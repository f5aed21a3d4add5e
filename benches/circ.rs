use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ldcapture_core::efm::circ::CircDecoder;
use ldcapture_core::efm::f3::{F3Frame, SubcodeMarker};
use ldcapture_core::efm::section::{Section, SECTION_LEN};

fn synth_section() -> Section {
    let frames = (0..SECTION_LEN)
        .map(|i| {
            let subcode = match i {
                0 => SubcodeMarker::Sync0,
                1 => SubcodeMarker::Sync1,
                _ => SubcodeMarker::Value((i % 64) as u8),
            };
            let mut data = [0u8; 32];
            for (j, b) in data.iter_mut().enumerate() {
                *b = ((i * 7 + j) % 256) as u8;
            }
            F3Frame {
                subcode,
                data,
                erasures: [false; 32],
            }
        })
        .collect();
    Section { frames }
}

fn benchmark_circ_decode(c: &mut Criterion) {
    let section = synth_section();
    c.bench_function("circ_decode_section", |b| {
        b.iter(|| {
            let mut decoder = CircDecoder::new();
            black_box(decoder.decode(black_box(&section)));
        })
    });
}

criterion_group!(benches, benchmark_circ_decode);
criterion_main!(benches);
