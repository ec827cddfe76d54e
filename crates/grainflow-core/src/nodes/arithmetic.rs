//! Arithmetic on float ports.

use crate::graph::{NodeCategory, NodeDefinition, NodeState};
use crate::node_ports;

node_ports! {
    /// Operands of [`AddFloat`].
    pub struct AddFloatInput {
        /// Left operand.
        pub a: f32 = 0.0,
        /// Right operand.
        pub b: f32 = 0.0,
    }
}

node_ports! {
    /// Result of [`AddFloat`].
    pub struct AddFloatOutput {
        /// `a + b`.
        pub sum: f32 = 0.0,
    }
}

/// Adds two floats.
#[derive(Debug, Default, Clone)]
pub struct AddFloat;

impl NodeDefinition for AddFloat {
    type Input = AddFloatInput;
    type Output = AddFloatOutput;

    const NAME: &'static str = "AddFloat";
    const CATEGORY: NodeCategory = NodeCategory::Math;
    const DESCRIPTION: &'static str = "Adds two floats";
}

/// Processing function for [`AddFloat`].
pub fn process_add_float(node: &mut NodeState<AddFloat>) {
    node.output.sum = node.input.a + node.input.b;
}
