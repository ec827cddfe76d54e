//! Stereo audio buffers shared by the node graph and the granular engine.
//!
//! [`StereoBuffer`] holds a pair of `Vec<f32>` channels. It is the port type
//! that audio-rate nodes exchange, the source material grains read from, and
//! the block that voices mix into.
//!
//! `Clone::clone_from` is implemented to reuse the destination's allocation,
//! so copying an audio port into a connected input during processing does not
//! touch the heap once both sides have been sized.

/// A stereo audio buffer (separate left/right channels of equal length).
#[derive(Debug, Default, PartialEq)]
pub struct StereoBuffer {
    /// Left channel samples.
    pub left: Vec<f32>,
    /// Right channel samples.
    pub right: Vec<f32>,
}

impl Clone for StereoBuffer {
    fn clone(&self) -> Self {
        Self {
            left: self.left.clone(),
            right: self.right.clone(),
        }
    }

    fn clone_from(&mut self, source: &Self) {
        self.left.clone_from(&source.left);
        self.right.clone_from(&source.right);
    }
}

impl StereoBuffer {
    /// Creates a new zeroed stereo buffer with the given frame count.
    pub fn new(frames: usize) -> Self {
        Self {
            left: vec![0.0; frames],
            right: vec![0.0; frames],
        }
    }

    /// Creates a buffer from left and right channels.
    pub fn from_channels(left: Vec<f32>, right: Vec<f32>) -> Self {
        debug_assert_eq!(left.len(), right.len(), "Channels must have same length");
        Self { left, right }
    }

    /// Creates a buffer from mono by duplicating to both channels.
    pub fn from_mono(mono: Vec<f32>) -> Self {
        Self {
            left: mono.clone(),
            right: mono,
        }
    }

    /// Creates a buffer from interleaved format (L, R, L, R, ...).
    ///
    /// A trailing unpaired sample is dropped.
    pub fn from_interleaved(interleaved: &[f32]) -> Self {
        let len = interleaved.len() / 2;
        let mut left = Vec::with_capacity(len);
        let mut right = Vec::with_capacity(len);

        for chunk in interleaved.chunks_exact(2) {
            left.push(chunk[0]);
            right.push(chunk[1]);
        }

        Self { left, right }
    }

    /// Fills both channels with zeros.
    pub fn clear(&mut self) {
        self.left.fill(0.0);
        self.right.fill(0.0);
    }

    /// Resizes both channels to the given frame count, zeroing new samples.
    pub fn resize(&mut self, frames: usize) {
        self.left.resize(frames, 0.0);
        self.right.resize(frames, 0.0);
    }

    /// Returns the number of frames per channel.
    pub fn len(&self) -> usize {
        self.left.len()
    }

    /// Returns true if the buffer has zero length.
    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    /// Returns the sample at `frame` on `channel` (0 = left, 1 = right).
    ///
    /// Out-of-range frames and channels read as silence.
    #[inline]
    pub fn get_sample(&self, frame: usize, channel: usize) -> f32 {
        let samples = match channel {
            0 => &self.left,
            1 => &self.right,
            _ => return 0.0,
        };
        samples.get(frame).copied().unwrap_or(0.0)
    }

    /// Writes the sample at `frame` on `channel`. Out-of-range writes are ignored.
    #[inline]
    pub fn set_sample(&mut self, frame: usize, channel: usize, value: f32) {
        let samples = match channel {
            0 => &mut self.left,
            1 => &mut self.right,
            _ => return,
        };
        if let Some(slot) = samples.get_mut(frame) {
            *slot = value;
        }
    }

    /// Returns the `(left, right)` pair at `frame`, or silence past the end.
    #[inline]
    pub fn frame(&self, frame: usize) -> (f32, f32) {
        (self.get_sample(frame, 0), self.get_sample(frame, 1))
    }

    /// Copies contents from another buffer of the same length.
    pub fn copy_from(&mut self, other: &StereoBuffer) {
        self.left.copy_from_slice(&other.left);
        self.right.copy_from_slice(&other.right);
    }

    /// Adds another buffer's contents sample-by-sample (mix/accumulate).
    pub fn accumulate_from(&mut self, other: &StereoBuffer) {
        for (dst, src) in self.left.iter_mut().zip(other.left.iter()) {
            *dst += *src;
        }
        for (dst, src) in self.right.iter_mut().zip(other.right.iter()) {
            *dst += *src;
        }
    }

    /// Multiplies every sample by `gain`.
    pub fn apply_gain(&mut self, gain: f32) {
        for sample in self.left.iter_mut().chain(self.right.iter_mut()) {
            *sample *= gain;
        }
    }

    /// Writes the first `frames` frames into `out` as interleaved stereo.
    ///
    /// Frames beyond the buffer length are written as silence.
    pub fn write_interleaved(&self, out: &mut [f32], frames: usize) {
        for (i, pair) in out.chunks_exact_mut(2).take(frames).enumerate() {
            let (l, r) = self.frame(i);
            pair[0] = l;
            pair[1] = r;
        }
    }

    /// Convert to interleaved format (L, R, L, R, ...).
    pub fn to_interleaved(&self) -> Vec<f32> {
        let mut interleaved = Vec::with_capacity(self.left.len() * 2);
        for (l, r) in self.left.iter().zip(self.right.iter()) {
            interleaved.push(*l);
            interleaved.push(*r);
        }
        interleaved
    }

    /// Mix down to mono by averaging channels.
    pub fn to_mono(&self) -> Vec<f32> {
        self.left
            .iter()
            .zip(self.right.iter())
            .map(|(l, r)| (l + r) * 0.5)
            .collect()
    }

    /// Peak absolute sample value across both channels.
    pub fn peak(&self) -> f32 {
        self.left
            .iter()
            .chain(self.right.iter())
            .fold(0.0_f32, |acc, s| acc.max(s.abs()))
    }
}
