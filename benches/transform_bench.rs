//! Performance benchmarks for the transform engine

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use overtone_dsp::{cqt, AudioBuffer, CqtConfig, Spectrogram, StftConfig};

fn test_signal(seconds: usize) -> AudioBuffer {
    let sr = 44100;
    let samples: Vec<f32> = (0..sr * seconds)
        .map(|i| (i as f32 * 440.0 * 2.0 * std::f32::consts::PI / sr as f32).sin() * 0.5)
        .collect();
    AudioBuffer::from_vec(samples, sr as u32)
}

fn bench_stft(c: &mut Criterion) {
    let audio = test_signal(30);
    let config = StftConfig::default();

    c.bench_function("stft_30s", |b| {
        b.iter(|| {
            let _ = Spectrogram::compute(black_box(&audio), black_box(&config));
        });
    });
}

fn bench_cqt(c: &mut Criterion) {
    let audio = test_signal(30);
    let config = CqtConfig::default();

    c.bench_function("cqt_30s", |b| {
        b.iter(|| {
            let _ = cqt(black_box(&audio), black_box(&config));
        });
    });
}

criterion_group!(benches, bench_stft, bench_cqt);
criterion_main!(benches);
