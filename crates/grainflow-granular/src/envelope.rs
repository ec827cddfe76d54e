//! Grain windows.
//!
//! Window functions map a normalized position `ratio ∈ [0, 1]` to a gain.
//! [`generate_window`] samples one into a table; [`linear_envelope`] builds the
//! trapezoid (attack ramp, flat sustain, release ramp) used by
//! [`GranularTimeStretch`](crate::GranularTimeStretch) grains.
//!
//! [`GrainWindow`] is what a grain actually carries: either a shared table or
//! a trapezoid evaluated on the fly, so spawning a grain never allocates.

use std::sync::Arc;

use core::f32::consts::TAU;
use libm::cosf;

/// A window function of normalized position.
pub type EnvelopeFn = fn(f32) -> f32;

/// Rectangular window: unity gain everywhere.
pub fn none(_ratio: f32) -> f32 {
    1.0
}

/// Hann window.
pub fn hann(ratio: f32) -> f32 {
    0.5 * (1.0 - cosf(TAU * ratio))
}

/// Hamming window.
pub fn hamming(ratio: f32) -> f32 {
    0.54 - 0.46 * cosf(TAU * ratio)
}

/// Named window shapes, for configuration and UIs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WindowShape {
    /// [`none`]
    #[default]
    Rectangular,
    /// [`hann`]
    Hann,
    /// [`hamming`]
    Hamming,
}

impl WindowShape {
    /// The window function for this shape.
    pub fn function(self) -> EnvelopeFn {
        match self {
            WindowShape::Rectangular => none,
            WindowShape::Hann => hann,
            WindowShape::Hamming => hamming,
        }
    }
}

/// Fills `target` with `func` sampled at `i / (len - 1)`.
///
/// A single-sample window takes the value at ratio 0.
pub fn fill_window(func: EnvelopeFn, target: &mut [f32]) {
    let last = target.len().saturating_sub(1).max(1) as f32;
    for (i, slot) in target.iter_mut().enumerate() {
        *slot = func(i as f32 / last);
    }
}

/// Samples `func` into a new table of `size` frames.
///
/// # Example
/// ```rust
/// use grainflow_granular::envelope::{generate_window, hann};
///
/// let w = generate_window(hann, 5);
/// assert_eq!(w[0], 0.0);
/// assert!((w[2] - 1.0).abs() < 1e-6);
/// ```
pub fn generate_window(func: EnvelopeFn, size: usize) -> Vec<f32> {
    let mut window = vec![0.0; size];
    fill_window(func, &mut window);
    window
}

/// Builds a trapezoid of `attack + sustain + release` frames.
///
/// The attack ramps `i / attack` from 0, the sustain holds 1, and the release
/// falls `1 - i / release` toward 0.
pub fn linear_envelope(attack: usize, sustain: usize, release: usize) -> Vec<f32> {
    let window = GrainWindow::linear(attack, sustain, release);
    (0..window.len()).map(|i| window.gain(i)).collect()
}

/// The gain curve a grain is multiplied by.
#[derive(Debug, Clone, PartialEq)]
pub enum GrainWindow {
    /// A precomputed table, shared between grains.
    Table(Arc<[f32]>),
    /// A trapezoid evaluated per frame.
    Linear {
        /// Ramp-up frames.
        attack: usize,
        /// Unity-gain frames.
        sustain: usize,
        /// Ramp-down frames.
        release: usize,
    },
}

impl GrainWindow {
    /// Samples `func` into a shared table of `size` frames.
    pub fn from_fn(func: EnvelopeFn, size: usize) -> Self {
        Self::Table(generate_window(func, size).into())
    }

    /// A trapezoid window.
    pub fn linear(attack: usize, sustain: usize, release: usize) -> Self {
        Self::Linear {
            attack,
            sustain,
            release,
        }
    }

    /// Window length in frames.
    pub fn len(&self) -> usize {
        match self {
            Self::Table(table) => table.len(),
            Self::Linear {
                attack,
                sustain,
                release,
            } => attack + sustain + release,
        }
    }

    /// Returns true if the window has no frames.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Gain at frame `i`; zero past the end.
    #[inline]
    pub fn gain(&self, i: usize) -> f32 {
        match self {
            Self::Table(table) => table.get(i).copied().unwrap_or(0.0),
            Self::Linear {
                attack,
                sustain,
                release,
            } => {
                let (attack, sustain, release) = (*attack, *sustain, *release);
                if i < attack {
                    i as f32 / attack as f32
                } else if i < attack + sustain {
                    1.0
                } else if i < attack + sustain + release {
                    1.0 - (i - attack - sustain) as f32 / release as f32
                } else {
                    0.0
                }
            }
        }
    }
}
