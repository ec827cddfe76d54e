//! Built-in node kinds.
//!
//! | Kind | Category | Inputs | Outputs |
//! |------|----------|--------|---------|
//! | [`ConstantFloat`] | Utility | `value: f32` | `value: f32` |
//! | [`AddFloat`] | Math | `a: f32`, `b: f32` | `sum: f32` |
//! | [`SineLfo`] | Control | `frequency`, `amplitude`, `offset` | `value: f32` |
//! | [`SineOsc`] | Source | `frequency`, `amplitude` | `output: StereoBuffer` |
//!
//! Control-rate kinds produce one value per block. [`SineOsc`] renders a full
//! stereo block sized by [`NodeProcessor::prepare`](crate::NodeProcessor::prepare).

mod arithmetic;
mod constant;
mod lfo;
mod oscillator;

pub use arithmetic::{AddFloat, AddFloatInput, AddFloatOutput, process_add_float};
pub use constant::{ConstantFloat, FloatValue, process_constant_float};
pub use lfo::{SineLfo, SineLfoInput, process_sine_lfo};
pub use oscillator::{SineOsc, SineOscInput, SineOscOutput, process_sine_osc};

use crate::graph::NodeRegistry;

/// Registers every built-in node kind.
pub fn register_builtin_nodes(registry: &mut NodeRegistry) {
    registry.add_node::<ConstantFloat>(process_constant_float);
    registry.add_node::<AddFloat>(process_add_float);
    registry.add_node::<SineLfo>(process_sine_lfo);
    registry.add_node::<SineOsc>(process_sine_osc);
}
