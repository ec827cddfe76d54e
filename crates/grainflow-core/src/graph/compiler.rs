//! Translation from the authoring graph to a runtime processor.

use super::authoring::{NodeGraph, NodeIndex};
use super::processor::NodeProcessor;
use super::registry::NodeRegistry;

/// Order in which the compiler places nodes, and therefore executes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompileOrder {
    /// Authoring insertion order. Every live node is compiled, including
    /// nodes caught in cycles.
    #[default]
    Insertion,
    /// The graph's topological process order. Nodes left out of that order
    /// by a cycle are not compiled, nor are their connections.
    Topological,
}

/// Summary of one [`NodeGraphCompiler::build`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileReport {
    /// Nodes compiled.
    pub node_count: usize,
    /// Connections wired.
    pub connection_count: usize,
    /// Live nodes not compiled (topological order only).
    pub skipped_nodes: Vec<NodeIndex>,
    /// Connections not wired because an endpoint was skipped.
    pub skipped_connections: usize,
    /// State budget used, in bytes.
    pub arena_used: usize,
    /// State budget reserved, in bytes.
    pub arena_capacity: usize,
}

/// One-shot compiler from [`NodeGraph`] to [`NodeProcessor`].
///
/// Node kinds are resolved against the registry it was created with.
///
/// # Example
///
/// ```rust
/// use grainflow_core::graph::{NodeGraph, NodeGraphCompiler, NodeProcessor, NodeRegistry};
/// use grainflow_core::nodes::{register_builtin_nodes, SineOsc};
///
/// let mut registry = NodeRegistry::new();
/// register_builtin_nodes(&mut registry);
/// let mut graph = NodeGraph::new();
/// graph.add_node(registry.info_of::<SineOsc>());
///
/// let mut processor = NodeProcessor::new(2048);
/// let report = NodeGraphCompiler::new(&registry).build(&graph, &mut processor);
/// assert_eq!(report.node_count, 1);
/// assert!(report.arena_used <= report.arena_capacity);
/// ```
pub struct NodeGraphCompiler<'a> {
    registry: &'a NodeRegistry,
    order: CompileOrder,
    capacity: Option<usize>,
}

impl<'a> NodeGraphCompiler<'a> {
    /// Creates a compiler resolving node kinds against `registry`.
    pub fn new(registry: &'a NodeRegistry) -> Self {
        Self {
            registry,
            order: CompileOrder::default(),
            capacity: None,
        }
    }

    /// Sets the node placement order.
    pub fn with_order(mut self, order: CompileOrder) -> Self {
        self.order = order;
        self
    }

    /// Sets the state budget the processor is reset to. Defaults to the
    /// processor's current capacity.
    pub fn with_capacity(mut self, bytes: usize) -> Self {
        self.capacity = Some(bytes);
        self
    }

    /// Compiles `graph` into `processor`, replacing whatever it held.
    ///
    /// The processor keeps its sample rate and block size; new nodes are
    /// prepared with them.
    ///
    /// # Panics
    ///
    /// Panics if a node kind is not registered, or if the nodes' combined
    /// state exceeds the budget.
    pub fn build(&self, graph: &NodeGraph, processor: &mut NodeProcessor) -> CompileReport {
        let capacity = self.capacity.unwrap_or_else(|| processor.capacity());
        processor.reset(capacity);

        let placement: Vec<NodeIndex> = match self.order {
            CompileOrder::Insertion => graph.nodes().map(|n| n.index).collect(),
            CompileOrder::Topological => graph.process_order().to_vec(),
        };

        let mut report = CompileReport {
            arena_capacity: capacity,
            ..CompileReport::default()
        };

        for &index in &placement {
            let Some(node) = graph.node(index) else {
                continue;
            };
            let info = self.registry.node_info(node.type_id);
            processor.add_node(index, info);

            #[cfg(feature = "tracing")]
            tracing::debug!(
                node = %index,
                kind = info.name,
                size = info.state_size,
                used = processor.used_bytes(),
                "placed node"
            );
        }
        report.node_count = processor.node_count();
        report.skipped_nodes = graph
            .nodes()
            .map(|n| n.index)
            .filter(|&i| !processor.contains(i))
            .collect();

        for c in graph.connections() {
            if processor.contains(c.output_node) && processor.contains(c.input_node) {
                processor.connect_nodes(c.output_node, c.output_port, c.input_node, c.input_port);
                report.connection_count += 1;
            } else {
                report.skipped_connections += 1;
            }
        }
        report.arena_used = processor.used_bytes();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            nodes = report.node_count,
            connections = report.connection_count,
            skipped_nodes = report.skipped_nodes.len(),
            bytes = report.arena_used,
            capacity = report.arena_capacity,
            "compiled graph"
        );

        report
    }
}
