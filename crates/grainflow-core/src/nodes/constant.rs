//! Constant value source.

use crate::graph::{NodeCategory, NodeDefinition, NodeState};
use crate::node_ports;

node_ports! {
    /// A single float port, shared by [`ConstantFloat`]'s input and output.
    pub struct FloatValue {
        /// The value.
        pub value: f32 = 0.0,
    }
}

/// Publishes its input value unchanged.
///
/// Left unconnected, the input acts as an editable constant.
#[derive(Debug, Default, Clone)]
pub struct ConstantFloat;

impl NodeDefinition for ConstantFloat {
    type Input = FloatValue;
    type Output = FloatValue;

    const NAME: &'static str = "ConstantFloat";
    const CATEGORY: NodeCategory = NodeCategory::Utility;
    const DESCRIPTION: &'static str = "Outputs a constant float";
}

/// Processing function for [`ConstantFloat`].
pub fn process_constant_float(node: &mut NodeState<ConstantFloat>) {
    node.output.value = node.input.value;
}
