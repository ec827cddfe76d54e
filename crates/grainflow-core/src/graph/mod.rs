//! Node-graph dataflow engine.
//!
//! The graph module separates editing from execution:
//!
//! - [`NodeRegistry`] - registered once at startup. Holds one [`NodeTypeInfo`]
//!   per node kind: typed port descriptors, state size, and an allocator that
//!   produces the kind's type-erased runtime state.
//! - [`NodeGraph`] - the authoring model. Owned by the editing thread, mutated
//!   freely (add/remove/connect/disconnect), keeps a cached topological
//!   [`process_order`](NodeGraph::process_order).
//! - [`NodeGraphCompiler`] - one-shot translation into a [`NodeProcessor`]:
//!   allocates each node's state against the processor's [`StateArena`] budget
//!   and installs one [`InputBinding`] per connection.
//! - [`NodeProcessor`] - the runtime. Executes compiled nodes in storage order,
//!   copying each bound output port into its connected input before the
//!   consuming node runs. No allocation, no locking, no logging.
//!
//! # Ordering
//!
//! The compiler places nodes in authoring insertion order by default
//! ([`CompileOrder::Insertion`]). A consumer placed before its producer reads
//! the producer's previous block. [`CompileOrder::Topological`] places nodes in
//! dependency order instead and omits nodes caught in cycles.
//!
//! # Cycles
//!
//! Cycles are not errors. Nodes whose in-degree never reaches zero during the
//! topological sort are left out of the process order.
//!
//! # Example
//!
//! ```rust
//! use grainflow_core::graph::{CompileOrder, NodeGraph, NodeGraphCompiler, NodeProcessor, NodeRegistry};
//! use grainflow_core::nodes::{register_builtin_nodes, AddFloat, ConstantFloat};
//!
//! let mut registry = NodeRegistry::new();
//! register_builtin_nodes(&mut registry);
//!
//! let mut graph = NodeGraph::new();
//! let sum = graph.add_node(registry.info_of::<AddFloat>());
//! let a = graph.add_node(registry.info_of::<ConstantFloat>());
//! graph.connect_nodes(a, 0, sum, 0)?;
//!
//! let mut processor = NodeProcessor::new(1024);
//! NodeGraphCompiler::new(&registry)
//!     .with_order(CompileOrder::Topological)
//!     .build(&graph, &mut processor);
//!
//! processor.get_node_mut::<ConstantFloat>(a).input.value = 2.0;
//! processor.process();
//! assert_eq!(processor.get_node::<AddFloat>(sum).output.sum, 2.0);
//! # Ok::<(), grainflow_core::GraphError>(())
//! ```

mod arena;
mod authoring;
mod compiler;
mod node;
mod port;
mod processor;
mod registry;

pub use arena::{ARENA_ALIGN, ArenaBlock, StateArena};
pub use authoring::{
    AuthoringNode, Connection, InputPort, NodeGraph, NodeIndex, OutputPort, Point, PortRef,
};
pub use compiler::{CompileOrder, CompileReport, NodeGraphCompiler};
pub use node::{
    ErasedState, NodeDefinition, NodeSnapshot, NodeState, NodeTypeId, ProcessContext, ProcessFn,
};
pub use port::{PortDescriptor, PortSet};
pub use processor::{CompiledNode, InputBinding, NodeProcessor};
pub use registry::{NodeCategory, NodeRegistry, NodeTypeInfo};

use thiserror::Error;

/// Which side of a node a port sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortDirection {
    /// A port the node reads from.
    Input,
    /// A port the node writes to.
    Output,
}

impl core::fmt::Display for PortDirection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Output => write!(f, "output"),
        }
    }
}

/// Errors from editing the authoring [`NodeGraph`].
///
/// Runtime wiring mistakes on [`NodeProcessor`] are programmer errors and
/// panic instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// The specified node was not found in the graph.
    #[error("node {0} not found")]
    NodeNotFound(NodeIndex),

    /// A port index is past the node's declared port count.
    #[error("{direction} port {port} out of range on node {node} ({count} ports)")]
    PortOutOfRange {
        /// Node the port was looked up on.
        node: NodeIndex,
        /// Input or output side.
        direction: PortDirection,
        /// Requested port index.
        port: usize,
        /// Number of ports the node declares on that side.
        count: usize,
    },

    /// The output and input ports carry different data types.
    #[error("cannot connect {output_type} output to {input_type} input")]
    TypeMismatch {
        /// Type carried by the output port.
        output_type: &'static str,
        /// Type expected by the input port.
        input_type: &'static str,
    },
}
