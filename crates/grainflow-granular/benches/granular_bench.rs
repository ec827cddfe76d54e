//! Criterion benchmarks for grainflow-granular
//!
//! Run with: cargo bench -p grainflow-granular
#![allow(missing_docs)]

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use grainflow_core::StereoBuffer;
use grainflow_granular::{GrainSamplerVoice, GranularTimeStretch, NoteParameters, VoiceManager};

const SAMPLE_RATE: f32 = 48000.0;
const BLOCK_SIZES: &[usize] = &[64, 256, 1024];

/// One second of a 220 Hz sine on both channels.
fn source() -> Arc<StereoBuffer> {
    let samples: Vec<f32> = (0..SAMPLE_RATE as usize)
        .map(|i| libm::sinf(core::f32::consts::TAU * 220.0 * i as f32 / SAMPLE_RATE))
        .collect();
    Arc::new(StereoBuffer::from_mono(samples))
}

fn bench_time_stretch(c: &mut Criterion) {
    let source = source();
    let mut group = c.benchmark_group("GranularTimeStretch");

    for &block_size in BLOCK_SIZES {
        let mut ts = GranularTimeStretch::with_input(Arc::clone(&source), SAMPLE_RATE);
        ts.set_grain_size(25.0);
        ts.set_overlap(0.5);
        ts.set_stretch(2.0);
        ts.set_pitch(0.5);
        let mut block = StereoBuffer::new(block_size);

        group.bench_with_input(
            BenchmarkId::new("stretch_2x", block_size),
            &block_size,
            |b, _| {
                b.iter(|| {
                    block.clear();
                    ts.process(black_box(&mut block));
                });
            },
        );
    }

    group.finish();
}

fn bench_voice_manager(c: &mut Criterion) {
    let source = source();
    let params = NoteParameters {
        stretch: 1.5,
        ..NoteParameters::default()
    };
    let mut manager: VoiceManager<GrainSamplerVoice> = VoiceManager::new();
    for note in 0..16 {
        manager.add_voice(
            note,
            GrainSamplerVoice::new(Arc::clone(&source), &params, SAMPLE_RATE),
        );
    }
    let mut block = StereoBuffer::new(256);

    c.bench_function("voice_manager_16_voices_256", |b| {
        b.iter(|| {
            block.clear();
            manager.process(black_box(&mut block));
        });
    });
}

criterion_group!(benches, bench_time_stretch, bench_voice_manager);
criterion_main!(benches);
