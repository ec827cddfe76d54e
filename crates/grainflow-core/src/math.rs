//! Mathematical utility functions for DSP.
//!
//! Allocation-free helpers used by the built-in nodes and the granular engine.
//!
//! - [`lerp`] - Linear interpolation
//! - [`interpolate_linear`] - Fractional read from a sample slice
//! - [`clamp`] - Value limiting
//! - [`hz_to_omega`] - Frequency to angular frequency
//! - [`ms_to_samples`] / [`samples_to_ms`] - Time conversions
//! - [`wrap_unit`] - Phase wrapping into `[0, 1)`

use libm::{floor, fmodf};

/// Linear interpolation between two values.
///
/// # Arguments
/// * `a` - Start value (at t=0)
/// * `b` - End value (at t=1)
/// * `t` - Interpolation factor (0.0 to 1.0)
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Reads `samples` at a fractional `position` with linear interpolation.
///
/// Positions outside the slice, and the missing right-hand neighbour of the
/// last sample, read as silence. Integral positions return the stored sample
/// exactly.
///
/// # Example
/// ```rust
/// use grainflow_core::math::interpolate_linear;
///
/// let ramp = [0.0, 1.0, 2.0, 3.0];
/// assert_eq!(interpolate_linear(&ramp, 1.5), 1.5);
/// assert_eq!(interpolate_linear(&ramp, 2.0), 2.0);
/// ```
#[inline]
pub fn interpolate_linear(samples: &[f32], position: f64) -> f32 {
    if position < 0.0 {
        return 0.0;
    }
    let base = floor(position);
    let index = base as usize;
    let t = (position - base) as f32;
    let a = samples.get(index).copied().unwrap_or(0.0);
    if t == 0.0 {
        return a;
    }
    let b = samples.get(index + 1).copied().unwrap_or(0.0);
    lerp(a, b, t)
}

/// Clamp a value to a range.
#[inline]
pub fn clamp(x: f32, min: f32, max: f32) -> f32 {
    x.clamp(min, max)
}

/// Convert frequency in Hz to angular frequency (radians/sample).
#[inline]
pub fn hz_to_omega(freq_hz: f32, sample_rate: f32) -> f32 {
    core::f32::consts::TAU * freq_hz / sample_rate
}

/// Convert milliseconds to samples.
///
/// # Example
/// ```rust
/// use grainflow_core::ms_to_samples;
///
/// assert_eq!(ms_to_samples(25.0, 48000.0), 1200.0);
/// ```
#[inline]
pub fn ms_to_samples(ms: f32, sample_rate: f32) -> f32 {
    ms * sample_rate / 1000.0
}

/// Convert samples to milliseconds.
#[inline]
pub fn samples_to_ms(samples: f32, sample_rate: f32) -> f32 {
    samples * 1000.0 / sample_rate
}

/// Wraps a normalized phase into `[0, 1)`.
#[inline]
pub fn wrap_unit(phase: f32) -> f32 {
    let wrapped = fmodf(phase, 1.0);
    if wrapped < 0.0 { wrapped + 1.0 } else { wrapped }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolate_linear_half_steps() {
        let ramp: Vec<f32> = (0..10).map(|i| i as f32).collect();
        for i in 0..18 {
            let pos = f64::from(i) * 0.5;
            assert_eq!(interpolate_linear(&ramp, pos), pos as f32);
        }
    }

    #[test]
    fn test_interpolate_linear_past_end_is_silent() {
        let ramp = [1.0, 1.0];
        assert_eq!(interpolate_linear(&ramp, 1.5), 0.5);
        assert_eq!(interpolate_linear(&ramp, 2.0), 0.0);
        assert_eq!(interpolate_linear(&ramp, -1.0), 0.0);
    }

    #[test]
    fn test_wrap_unit() {
        assert!((wrap_unit(1.25) - 0.25).abs() < 1e-6);
        assert!((wrap_unit(-0.25) - 0.75).abs() < 1e-6);
        assert_eq!(wrap_unit(0.0), 0.0);
    }

    #[test]
    fn test_time_conversions() {
        assert_eq!(ms_to_samples(1000.0, 48000.0), 48000.0);
        assert_eq!(samples_to_ms(480.0, 48000.0), 10.0);
    }
}
