//! Block-rate sine LFO.

use core::f32::consts::TAU;
use libm::sinf;

use crate::graph::{NodeCategory, NodeDefinition, NodeState};
use crate::math::wrap_unit;
use crate::node_ports;

use super::constant::FloatValue;

node_ports! {
    /// Controls of [`SineLfo`].
    pub struct SineLfoInput {
        /// Rate in Hz.
        pub frequency: f32 = 1.0,
        /// Peak deviation from `offset`.
        pub amplitude: f32 = 1.0,
        /// Center value.
        pub offset: f32 = 0.0,
    }
}

/// Sine LFO producing one value per block.
///
/// Outputs `offset + amplitude * sin(2π·phase)` for the phase at the start of
/// the block, then advances the phase by the block's duration. Pair with
/// [`SineOsc`](super::SineOsc)'s frequency input for vibrato.
#[derive(Debug, Default, Clone)]
pub struct SineLfo {
    /// Normalized phase in `[0, 1)`.
    pub phase: f32,
}

impl NodeDefinition for SineLfo {
    type Input = SineLfoInput;
    type Output = FloatValue;

    const NAME: &'static str = "SineLfo";
    const CATEGORY: NodeCategory = NodeCategory::Control;
    const DESCRIPTION: &'static str = "Block-rate sine modulator";
}

/// Processing function for [`SineLfo`].
pub fn process_sine_lfo(node: &mut NodeState<SineLfo>) {
    let input = &node.input;
    node.output.value = input.offset + input.amplitude * sinf(TAU * node.state.phase);

    let ctx = node.context;
    if ctx.sample_rate > 0.0 {
        let advance = input.frequency * ctx.frame_count as f32 / ctx.sample_rate;
        node.state.phase = wrap_unit(node.state.phase + advance);
    }
}
