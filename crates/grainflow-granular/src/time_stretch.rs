//! Granular time-stretching and pitch-shifting.
//!
//! [`GranularTimeStretch`] re-synthesizes a source buffer from a train of
//! trapezoid-windowed grains. Grains are spawned every `hop` output frames and
//! each one starts `hop / stretch` source frames after the previous, so a
//! stretch above 1 replays overlapping material and slows the result down.
//! Pitch is independent: it scales each grain's playback speed.
//!
//! Grain geometry follows from grain size and overlap fraction:
//!
//! ```text
//! overlap_frames = grain_size * overlap
//! sustain_frames = grain_size - 2 * overlap_frames
//! hop            = grain_size - overlap_frames
//! ```

use std::sync::Arc;

use grainflow_core::{StereoBuffer, ms_to_samples};

use crate::envelope::GrainWindow;
use crate::grain::{Grain, GrainStream};

/// Default grain size in frames (25 ms at 48 kHz).
pub const DEFAULT_GRAIN_SIZE: usize = 1200;

/// Largest overlap fraction: ramps meet in the middle of the grain.
pub const MAX_OVERLAP: f32 = 0.5;

/// Grain-based time-stretch engine over one source buffer.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use grainflow_core::StereoBuffer;
/// use grainflow_granular::GranularTimeStretch;
///
/// let source = Arc::new(StereoBuffer::from_mono(vec![0.5; 4800]));
/// let mut stretch = GranularTimeStretch::with_input(source, 48000.0);
/// stretch.set_grain_size(10.0);
/// stretch.set_overlap(0.25);
/// stretch.set_stretch(2.0);
/// stretch.set_loop(false);
///
/// let mut block = StereoBuffer::new(256);
/// while !stretch.has_finished() {
///     block.clear();
///     stretch.process(&mut block);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct GranularTimeStretch {
    grains: GrainStream,
    input: Option<Arc<StereoBuffer>>,

    grain_size: usize,
    overlap: f32,
    playback_pos: f64,

    stretch: f32,
    speed: f32,

    next_grain: usize,
    hop: usize,
    overlap_frames: usize,
    sustain_frames: usize,

    looping: bool,
    finishing: bool,

    sample_rate: f32,
}

impl Default for GranularTimeStretch {
    fn default() -> Self {
        Self::new(48000.0)
    }
}

impl GranularTimeStretch {
    /// Creates an engine with no input.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            grains: GrainStream::new(),
            input: None,
            grain_size: DEFAULT_GRAIN_SIZE,
            overlap: 0.0,
            playback_pos: 0.0,
            stretch: 1.0,
            speed: 1.0,
            next_grain: 0,
            hop: DEFAULT_GRAIN_SIZE,
            overlap_frames: 0,
            sustain_frames: DEFAULT_GRAIN_SIZE,
            looping: true,
            finishing: false,
            sample_rate,
        }
    }

    /// Creates an engine reading `input`.
    pub fn with_input(input: Arc<StereoBuffer>, sample_rate: f32) -> Self {
        let mut engine = Self::new(sample_rate);
        engine.set_input(input);
        engine
    }

    /// Replaces the source buffer. Grains already playing keep their source.
    pub fn set_input(&mut self, input: Arc<StereoBuffer>) {
        self.input = Some(input);
    }

    /// The source buffer.
    pub fn input(&self) -> Option<&Arc<StereoBuffer>> {
        self.input.as_ref()
    }

    /// Sets the overlap fraction, clamped to `[0, 0.5]`.
    pub fn set_overlap(&mut self, overlap: f32) {
        self.overlap = overlap.clamp(0.0, MAX_OVERLAP);
        self.update_coeffs();
    }

    /// Sets the grain size in milliseconds.
    pub fn set_grain_size(&mut self, ms: f32) {
        self.set_grain_size_frames(ms_to_samples(ms, self.sample_rate).max(0.0) as usize);
    }

    /// Sets the grain size in frames (at least one).
    pub fn set_grain_size_frames(&mut self, frames: usize) {
        self.grain_size = frames.max(1);
        self.update_coeffs();
    }

    /// Sets the pitch offset.
    ///
    /// Positive values raise playback speed to `1 + pitch`; negative values
    /// lower it to `1 / (1 + |pitch|)`.
    pub fn set_pitch(&mut self, pitch: f32) {
        self.speed = if pitch > 0.0 {
            1.0 + pitch
        } else {
            1.0 / (1.0 + pitch.abs())
        };
    }

    /// Sets the time-stretch factor.
    ///
    /// # Panics
    ///
    /// Panics if `stretch < 1`.
    pub fn set_stretch(&mut self, stretch: f32) {
        assert!(stretch >= 1.0, "stretch must be >= 1, got {stretch}");
        self.stretch = stretch;
    }

    /// Enables or disables looping at the end of the source.
    pub fn set_loop(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// Sets the sample rate used for millisecond conversions.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    /// Moves the playhead to source frame `position`. Grains already playing
    /// are left alone.
    pub fn seek(&mut self, position: f64) {
        self.playback_pos = position.max(0.0);
        self.finishing = false;
    }

    /// Restarts from the beginning of the source, dropping live grains.
    pub fn reset(&mut self) {
        self.grains.clear();
        self.playback_pos = 0.0;
        self.next_grain = 0;
        self.finishing = false;
    }

    /// Grain size in frames.
    pub fn grain_size(&self) -> usize {
        self.grain_size
    }

    /// Overlap fraction.
    pub fn overlap(&self) -> f32 {
        self.overlap
    }

    /// Frames between grain onsets.
    pub fn hop(&self) -> usize {
        self.hop
    }

    /// Ramp length of each grain's window, in frames.
    pub fn overlap_frames(&self) -> usize {
        self.overlap_frames
    }

    /// Flat section of each grain's window, in frames.
    pub fn sustain_frames(&self) -> usize {
        self.sustain_frames
    }

    /// Playback speed derived from pitch.
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Time-stretch factor.
    pub fn stretch(&self) -> f32 {
        self.stretch
    }

    /// Whether playback loops.
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Source position the next grain will start from.
    pub fn playback_position(&self) -> f64 {
        self.playback_pos
    }

    /// The underlying grain stream.
    pub fn grains(&self) -> &GrainStream {
        &self.grains
    }

    /// Returns true once the end of a non-looping source has been reached and
    /// every grain has finished playing.
    pub fn has_finished(&self) -> bool {
        self.finishing && self.grains.is_empty()
    }

    /// Advances one frame and returns it.
    #[inline]
    pub fn next_frame(&mut self) -> (f32, f32) {
        if self.next_grain == 0 && !self.finishing {
            self.spawn_grain();
        } else {
            self.next_grain = self.next_grain.saturating_sub(1);
        }
        self.grains.next_frame()
    }

    /// Adds the next `buffer.len()` frames into `buffer`.
    pub fn process(&mut self, buffer: &mut StereoBuffer) {
        self.mix_into(buffer, 1.0);
    }

    /// Adds the next `buffer.len()` frames, scaled by `gain`, into `buffer`.
    pub fn mix_into(&mut self, buffer: &mut StereoBuffer, gain: f32) {
        for i in 0..buffer.len() {
            let (l, r) = self.next_frame();
            buffer.left[i] += l * gain;
            buffer.right[i] += r * gain;
        }
    }

    fn update_coeffs(&mut self) {
        self.overlap_frames = (self.grain_size as f32 * self.overlap) as usize;
        self.sustain_frames = self.grain_size - self.overlap_frames * 2;
        self.hop = self.grain_size - self.overlap_frames;
    }

    fn spawn_grain(&mut self) {
        let Some(input) = self.input.as_ref() else {
            return;
        };
        let input_frames = input.len();
        if input_frames == 0 {
            self.finishing = true;
            return;
        }

        let mut grain_size = self.grain_size;
        let mut overlap = self.overlap_frames;
        let mut sustain = self.sustain_frames;
        let mut hop = self.hop;

        // Shrink the last grain to what is left of the source.
        let start = self.playback_pos as usize;
        if start + grain_size > input_frames {
            grain_size = input_frames.saturating_sub(start);
            overlap = (grain_size as f32 * self.overlap) as usize;
            sustain = grain_size - overlap * 2;
            hop = grain_size - overlap;
        }

        if grain_size > 0 {
            self.grains.add(
                Grain::new(Arc::clone(input), GrainWindow::linear(overlap, sustain, overlap))
                    .with_position(self.playback_pos)
                    .with_speed(self.speed),
            );
        }

        self.playback_pos += hop as f64 / f64::from(self.stretch);

        if self.looping {
            self.playback_pos %= input_frames as f64;
        } else if self.playback_pos >= input_frames as f64 || grain_size == 0 {
            self.finishing = true;
        }

        self.next_grain = hop.saturating_sub(1);
    }
}
