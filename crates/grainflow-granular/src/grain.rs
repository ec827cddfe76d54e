//! Grains and the stream that mixes them.

use std::sync::Arc;

use grainflow_core::StereoBuffer;
use grainflow_core::math::interpolate_linear;

use crate::envelope::GrainWindow;

/// Initial room for concurrently playing grains.
const DEFAULT_GRAIN_CAPACITY: usize = 32;

/// A windowed slice of source audio.
///
/// A grain waits `delay` frames, then plays one window's worth of frames from
/// `source`, starting at `position` and advancing `speed` source frames per
/// output frame. Unit speed from the start of the source reads samples
/// directly; any other speed or start position reads with linear
/// interpolation.
#[derive(Debug, Clone)]
pub struct Grain {
    /// Source material, shared with other grains.
    pub source: Arc<StereoBuffer>,
    /// Gain curve; its length is the grain's length.
    pub window: GrainWindow,
    /// Read position in source frames.
    pub position: f64,
    /// Source frames advanced per output frame.
    pub speed: f32,
    /// Output frames to wait before playing.
    pub delay: usize,
    processed: usize,
    interpolate: bool,
}

impl Grain {
    /// Creates a grain reading `source` from frame 0 at unit speed.
    pub fn new(source: Arc<StereoBuffer>, window: GrainWindow) -> Self {
        Self {
            source,
            window,
            position: 0.0,
            speed: 1.0,
            delay: 0,
            processed: 0,
            interpolate: false,
        }
    }

    /// Sets the starting read position.
    pub fn with_position(mut self, position: f64) -> Self {
        self.position = position;
        self
    }

    /// Sets the playback rate.
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// Sets the start delay in output frames.
    pub fn with_delay(mut self, delay: usize) -> Self {
        self.delay = delay;
        self
    }

    /// Output frames already played.
    pub fn processed_frames(&self) -> usize {
        self.processed
    }

    /// Output frames left to play, excluding any remaining delay.
    pub fn remaining_frames(&self) -> usize {
        self.window.len() - self.processed
    }

    /// Advances one output frame. Returns the windowed contribution and
    /// whether the grain has finished.
    #[inline]
    fn tick(&mut self) -> ((f32, f32), bool) {
        if self.delay > 0 {
            self.delay -= 1;
            return ((0.0, 0.0), false);
        }

        let (l, r) = if self.interpolate {
            let frame = (
                interpolate_linear(&self.source.left, self.position),
                interpolate_linear(&self.source.right, self.position),
            );
            self.position += f64::from(self.speed);
            frame
        } else {
            self.source.frame(self.processed)
        };

        let gain = self.window.gain(self.processed);
        self.processed += 1;
        ((l * gain, r * gain), self.processed >= self.window.len())
    }
}

/// An unordered set of concurrently playing grains.
///
/// Mixing is purely additive; callers handle gain staging.
#[derive(Debug, Clone)]
pub struct GrainStream {
    grains: Vec<Grain>,
}

impl Default for GrainStream {
    fn default() -> Self {
        Self::new()
    }
}

impl GrainStream {
    /// Creates an empty stream.
    pub fn new() -> Self {
        Self {
            grains: Vec::with_capacity(DEFAULT_GRAIN_CAPACITY),
        }
    }

    /// Adds a grain.
    ///
    /// # Panics
    ///
    /// Panics if the grain's source or window is empty.
    pub fn add(&mut self, mut grain: Grain) {
        assert!(!grain.source.is_empty(), "grain source is empty");
        assert!(!grain.window.is_empty(), "grain window is empty");
        grain.interpolate = grain.speed != 1.0 || grain.position != 0.0;
        self.grains.push(grain);
    }

    /// Mixes every live grain for one output frame and retires finished ones.
    #[inline]
    pub fn next_frame(&mut self) -> (f32, f32) {
        let mut sum = (0.0, 0.0);
        self.grains.retain_mut(|grain| {
            let ((l, r), finished) = grain.tick();
            sum.0 += l;
            sum.1 += r;
            !finished
        });
        sum
    }

    /// Overwrites `target` with the next `target.len()` frames of the mix.
    pub fn process(&mut self, target: &mut StereoBuffer) {
        for i in 0..target.len() {
            let (l, r) = self.next_frame();
            target.left[i] = l;
            target.right[i] = r;
        }
    }

    /// Adds the next `target.len()` frames of the mix, scaled by `gain`, into `target`.
    pub fn mix_into(&mut self, target: &mut StereoBuffer, gain: f32) {
        for i in 0..target.len() {
            let (l, r) = self.next_frame();
            target.left[i] += l * gain;
            target.right[i] += r * gain;
        }
    }

    /// Live grains, including delayed ones.
    pub fn grains(&self) -> &[Grain] {
        &self.grains
    }

    /// Number of live grains.
    pub fn len(&self) -> usize {
        self.grains.len()
    }

    /// Returns true if no grains are live.
    pub fn is_empty(&self) -> bool {
        self.grains.is_empty()
    }

    /// Drops every grain.
    pub fn clear(&mut self) {
        self.grains.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{hann, none};

    fn ramp(frames: usize) -> Arc<StereoBuffer> {
        let samples: Vec<f32> = (0..frames).map(|i| i as f32).collect();
        Arc::new(StereoBuffer::from_mono(samples))
    }

    #[test]
    fn test_direct_read_applies_window() {
        let mut stream = GrainStream::new();
        stream.add(Grain::new(ramp(8), GrainWindow::from_fn(hann, 5)));
        let mut out = StereoBuffer::new(5);
        stream.process(&mut out);
        let window = crate::envelope::generate_window(hann, 5);
        for i in 0..5 {
            assert_eq!(out.left[i], i as f32 * window[i]);
        }
        assert!(stream.is_empty());
    }

    #[test]
    fn test_delay_holds_silence() {
        let mut stream = GrainStream::new();
        stream.add(Grain::new(ramp(8), GrainWindow::from_fn(none, 2)).with_delay(3));
        let mut out = StereoBuffer::new(6);
        stream.process(&mut out);
        assert_eq!(out.left, vec![0.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_offset_position_interpolates() {
        let mut stream = GrainStream::new();
        stream.add(Grain::new(ramp(16), GrainWindow::from_fn(none, 4)).with_position(2.5));
        let mut out = StereoBuffer::new(4);
        stream.process(&mut out);
        assert_eq!(out.left, vec![2.5, 3.5, 4.5, 5.5]);
    }

    #[test]
    fn test_reading_past_source_is_silent() {
        let mut stream = GrainStream::new();
        stream.add(Grain::new(ramp(2), GrainWindow::from_fn(none, 4)));
        let mut out = StereoBuffer::new(4);
        stream.process(&mut out);
        assert_eq!(out.left, vec![0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_mix_into_accumulates_with_gain() {
        let mut stream = GrainStream::new();
        stream.add(Grain::new(ramp(4), GrainWindow::from_fn(none, 4)));
        let mut out = StereoBuffer::from_mono(vec![1.0; 4]);
        stream.mix_into(&mut out, 0.5);
        assert_eq!(out.left, vec![1.0, 1.5, 2.0, 2.5]);
    }

    #[test]
    fn test_empty_stream_is_silent() {
        let mut stream = GrainStream::new();
        let mut out = StereoBuffer::from_mono(vec![3.0; 4]);
        stream.process(&mut out);
        assert_eq!(out.peak(), 0.0);
    }

    #[test]
    #[should_panic(expected = "grain window is empty")]
    fn test_empty_window_panics() {
        let mut stream = GrainStream::new();
        stream.add(Grain::new(ramp(4), GrainWindow::linear(0, 0, 0)));
    }
}
