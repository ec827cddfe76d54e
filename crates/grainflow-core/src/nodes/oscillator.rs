//! Audio-rate sine oscillator.

use core::f32::consts::TAU;
use libm::sinf;

use crate::buffer::StereoBuffer;
use crate::graph::{NodeCategory, NodeDefinition, NodeState};
use crate::math::wrap_unit;
use crate::node_ports;

node_ports! {
    /// Controls of [`SineOsc`].
    pub struct SineOscInput {
        /// Pitch in Hz.
        pub frequency: f32 = 240.0,
        /// Peak level.
        pub amplitude: f32 = 0.5,
    }
}

node_ports! {
    /// Rendered block of [`SineOsc`].
    pub struct SineOscOutput {
        /// Stereo block, sized to the prepared maximum.
        pub output: StereoBuffer = StereoBuffer::new(0),
    }
}

/// Sine oscillator rendering the same signal to both channels.
///
/// Writes `frame_count` frames per block; frames past that are left as they
/// were. The frequency is read once per block.
#[derive(Debug, Default, Clone)]
pub struct SineOsc {
    /// Normalized phase in `[0, 1)`.
    pub phase: f32,
}

impl NodeDefinition for SineOsc {
    type Input = SineOscInput;
    type Output = SineOscOutput;

    const NAME: &'static str = "SineOsc";
    const CATEGORY: NodeCategory = NodeCategory::Source;
    const DESCRIPTION: &'static str = "Stereo sine oscillator";

    fn prepare(node: &mut NodeState<Self>) {
        node.output.output.resize(node.context.max_frames);
    }
}

/// Processing function for [`SineOsc`].
pub fn process_sine_osc(node: &mut NodeState<SineOsc>) {
    let ctx = node.context;
    if ctx.sample_rate <= 0.0 {
        return;
    }
    let step = node.input.frequency / ctx.sample_rate;
    let amplitude = node.input.amplitude;
    let out = &mut node.output.output;
    let frames = ctx.frame_count.min(out.len());

    let mut phase = node.state.phase;
    for i in 0..frames {
        let sample = amplitude * sinf(TAU * phase);
        out.left[i] = sample;
        out.right[i] = sample;
        phase = wrap_unit(phase + step);
    }
    node.state.phase = phase;
}
