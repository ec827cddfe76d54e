//! Integration tests for grainflow-granular.
//!
//! Grain mixing on ramp sources, time-stretch scheduling, and the voice
//! lifecycle from note-on to removal.

use std::sync::Arc;

use grainflow_core::StereoBuffer;
use grainflow_granular::envelope::{generate_window, hann, none};
use grainflow_granular::{
    Grain, GrainSamplerVoice, GrainStream, GrainWindow, GranularTimeStretch, NoteParameters,
    Voice, VoiceManager, VoiceState,
};

/// Stereo source with `sample[i] = i` on both channels.
fn ramp(frames: usize) -> Arc<StereoBuffer> {
    let samples: Vec<f32> = (0..frames).map(|i| i as f32).collect();
    Arc::new(StereoBuffer::from_mono(samples))
}

fn flat_window(size: usize) -> GrainWindow {
    GrainWindow::from_fn(none, size)
}

// ============================================================================
// 1. Grain streams
// ============================================================================

#[test]
fn delayed_grain_repeats_ramp_on_second_block() {
    const GRAIN_SIZE: usize = 5;
    let source = ramp(50);
    let mut stream = GrainStream::new();
    stream.add(Grain::new(Arc::clone(&source), flat_window(GRAIN_SIZE)));
    stream.add(Grain::new(source, flat_window(GRAIN_SIZE)).with_delay(GRAIN_SIZE));

    let mut out = StereoBuffer::new(GRAIN_SIZE);
    stream.process(&mut out);
    for i in 0..GRAIN_SIZE {
        assert_eq!(out.get_sample(i, 0), i as f32);
        assert_eq!(out.get_sample(i, 1), i as f32);
    }

    stream.process(&mut out);
    for i in 0..GRAIN_SIZE {
        assert_eq!(out.get_sample(i, 0), i as f32);
        assert_eq!(out.get_sample(i, 1), i as f32);
    }
    assert!(stream.is_empty());

    stream.process(&mut out);
    assert_eq!(out.peak(), 0.0);
}

#[test]
fn half_speed_grain_reads_half_ramp() {
    let mut stream = GrainStream::new();
    stream.add(Grain::new(ramp(50), flat_window(5)).with_speed(0.5));

    let mut out = StereoBuffer::new(5);
    stream.process(&mut out);
    for i in 0..5 {
        assert_eq!(out.get_sample(i, 0), i as f32 * 0.5);
    }
}

#[test]
fn overlapping_grains_sum() {
    let source = ramp(50);
    let mut stream = GrainStream::new();
    stream.add(Grain::new(Arc::clone(&source), flat_window(6)));
    stream.add(Grain::new(source, flat_window(6)).with_position(10.0).with_delay(3));

    let mut out = StereoBuffer::new(9);
    stream.process(&mut out);
    let expected = [0.0, 1.0, 2.0, 3.0 + 10.0, 4.0 + 11.0, 5.0 + 12.0, 13.0, 14.0, 15.0];
    for (i, want) in expected.into_iter().enumerate() {
        assert!((out.left[i] - want).abs() < 1e-5, "frame {i}: {} != {want}", out.left[i]);
    }
}

#[test]
fn windowed_grain_is_shaped() {
    let source = Arc::new(StereoBuffer::from_mono(vec![1.0; 64]));
    let table = generate_window(hann, 32);
    let mut stream = GrainStream::new();
    stream.add(Grain::new(source, GrainWindow::Table(table.clone().into())));

    let mut out = StereoBuffer::new(32);
    stream.process(&mut out);
    assert_eq!(out.left, table);
    assert_eq!(out.left[0], 0.0);
}

#[test]
fn mix_into_accumulates_over_existing_signal() {
    let mut stream = GrainStream::new();
    stream.add(Grain::new(ramp(10), flat_window(4)));

    let mut out = StereoBuffer::from_mono(vec![1.0; 4]);
    stream.mix_into(&mut out, 2.0);
    assert_eq!(out.left, vec![1.0, 3.0, 5.0, 7.0]);
}

// ============================================================================
// 2. Time-stretch
// ============================================================================

#[test]
fn non_looping_stretch_finishes_and_goes_silent() {
    let mut ts = GranularTimeStretch::with_input(ramp(100), 1000.0);
    ts.set_grain_size(20.0);
    ts.set_overlap(0.25);
    ts.set_stretch(1.5);
    ts.set_loop(false);

    let mut block = StereoBuffer::new(32);
    let mut blocks = 0;
    while !ts.has_finished() {
        block.clear();
        ts.process(&mut block);
        blocks += 1;
        assert!(blocks < 100, "stretch never finished");
    }

    block.clear();
    ts.process(&mut block);
    assert_eq!(block.peak(), 0.0);
}

#[test]
fn looping_stretch_never_finishes() {
    let mut ts = GranularTimeStretch::with_input(ramp(40), 1000.0);
    ts.set_grain_size_frames(10);
    let mut block = StereoBuffer::new(64);
    for _ in 0..50 {
        block.clear();
        ts.process(&mut block);
    }
    assert!(!ts.has_finished());
    assert!(ts.playback_position() < 40.0);
}

#[test]
fn reset_restarts_playback() {
    let mut ts = GranularTimeStretch::with_input(ramp(40), 1000.0);
    ts.set_grain_size_frames(10);
    ts.set_loop(false);
    let mut block = StereoBuffer::new(64);
    ts.process(&mut block);
    assert!(ts.has_finished());

    ts.reset();
    assert!(!ts.has_finished());
    let mut again = StereoBuffer::new(10);
    ts.process(&mut again);
    assert_eq!(again.left[9], 9.0);
}

// ============================================================================
// 3. Voice lifecycle
// ============================================================================

#[test]
fn voice_output_surfaces_then_voice_is_removed() {
    let params = NoteParameters {
        overlap: 0.0,
        grain_size_ms: 10.0,
        looping: false,
        ..NoteParameters::default()
    };
    let mut manager: VoiceManager<GrainSamplerVoice> = VoiceManager::new();
    manager.add_voice(60, GrainSamplerVoice::new(ramp(30), &params, 1000.0));

    let mut block = StereoBuffer::new(8);
    manager.process(&mut block);
    assert_eq!(block.left[7], 7.0);
    assert_eq!(
        manager.get_voice_for_note(60).map(Voice::state),
        Some(VoiceState::Active)
    );

    // The last grain retires at frame 29, inside the fourth block; the voice
    // reports finished there and is swept in the same call.
    let mut calls = 1;
    while manager.get_voice_for_note(60).is_some() {
        block.clear();
        manager.process(&mut block);
        calls += 1;
        assert!(calls < 20, "voice never finished");
    }
    assert_eq!(calls, 4);
    assert!(manager.is_empty());
}

#[test]
fn boxed_voices_share_a_manager() {
    let params = NoteParameters {
        amp: 0.5,
        overlap: 0.0,
        grain_size_ms: 10.0,
        ..NoteParameters::default()
    };
    let source = Arc::new(StereoBuffer::from_mono(vec![1.0; 100]));
    let mut manager: VoiceManager = VoiceManager::new();
    manager.add_voice(1, Box::new(GrainSamplerVoice::new(Arc::clone(&source), &params, 1000.0)));
    manager.add_voice(2, Box::new(GrainSamplerVoice::new(source, &params, 1000.0)));

    let mut block = StereoBuffer::new(16);
    manager.process(&mut block);
    assert!(block.left.iter().all(|&s| (s - 1.0).abs() < 1e-6));

    if let Some(voice) = manager.get_voice_for_note_mut(2) {
        voice.begin_release();
    }
    block.clear();
    manager.process(&mut block);
    assert_eq!(manager.active_notes().collect::<Vec<_>>(), vec![1]);
}
