//! The authoring graph: editable nodes and port-to-port connections.
//!
//! [`NodeGraph`] is the user-facing model edited from the UI thread. Nodes are
//! stored in index-addressed slots and refer to each other only through
//! [`NodeIndex`]. Every connectivity change recomputes the cached
//! [`process_order`](NodeGraph::process_order) with Kahn's algorithm.

use std::collections::VecDeque;

use super::port::PortDescriptor;
use super::registry::NodeTypeInfo;
use super::{GraphError, NodeTypeId, PortDirection};

/// Index of a node in the authoring graph.
///
/// Indices are assigned sequentially and never reused within a graph. They
/// survive removal of other nodes and are the key the processor uses to find
/// a node's compiled state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub(crate) u32);

impl NodeIndex {
    /// Creates an index from its raw value.
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw numeric index.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) fn slot(self) -> usize {
        self.0 as usize
    }
}

impl core::fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Editor position of a node.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    /// Horizontal position.
    pub x: f32,
    /// Vertical position.
    pub y: f32,
}

impl Point {
    /// Creates a point.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// One end of a connection: a node and a port index on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PortRef {
    /// Node the port belongs to.
    pub node: NodeIndex,
    /// Port index on that node.
    pub port: usize,
}

/// An input port on an authoring node.
#[derive(Clone, Debug)]
pub struct InputPort {
    /// Port metadata.
    pub descriptor: PortDescriptor,
    /// The output feeding this input, if connected.
    pub source: Option<PortRef>,
}

/// An output port on an authoring node.
#[derive(Clone, Debug)]
pub struct OutputPort {
    /// Port metadata.
    pub descriptor: PortDescriptor,
    /// Every input this output feeds.
    pub targets: Vec<PortRef>,
}

/// A node instance in the authoring graph. Owns no runtime state.
#[derive(Clone, Debug)]
pub struct AuthoringNode {
    /// Index in the owning graph.
    pub index: NodeIndex,
    /// Kind of node.
    pub type_id: NodeTypeId,
    /// User-visible name; defaults to the kind's display name.
    pub name: String,
    /// Editor position.
    pub position: Point,
    /// Hint for hosts that skip nodes with no downstream consumer.
    pub always_active: bool,
    /// Bytes of runtime state this node will need once compiled.
    pub state_size: usize,
    /// Input ports, in declaration order.
    pub inputs: Vec<InputPort>,
    /// Output ports, in declaration order.
    pub outputs: Vec<OutputPort>,
}

/// A directed edge from an output port to an input port.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Connection {
    /// Producing node.
    pub output_node: NodeIndex,
    /// Port on the producing node.
    pub output_port: usize,
    /// Consuming node.
    pub input_node: NodeIndex,
    /// Port on the consuming node.
    pub input_port: usize,
}

/// Editable graph of nodes and connections with a cached process order.
///
/// Fan-out is unrestricted. Each input has at most one source: connecting an
/// already-connected input replaces its previous connection.
#[derive(Clone, Debug, Default)]
pub struct NodeGraph {
    nodes: Vec<Option<AuthoringNode>>,
    connections: Vec<Connection>,
    process_order: Vec<NodeIndex>,
}

impl NodeGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    // --- Nodes ---

    /// Adds a node of the given kind and returns its index.
    pub fn add_node(&mut self, info: &NodeTypeInfo) -> NodeIndex {
        let index = NodeIndex(self.nodes.len() as u32);
        let node = AuthoringNode {
            index,
            type_id: info.type_id,
            name: info.name.to_string(),
            position: Point::default(),
            always_active: false,
            state_size: info.state_size,
            inputs: info
                .inputs
                .iter()
                .map(|&descriptor| InputPort {
                    descriptor,
                    source: None,
                })
                .collect(),
            outputs: info
                .outputs
                .iter()
                .map(|&descriptor| OutputPort {
                    descriptor,
                    targets: Vec::new(),
                })
                .collect(),
        };
        self.nodes.push(Some(node));
        // An unconnected node is immediately ready.
        self.recalculate_order();

        #[cfg(feature = "tracing")]
        tracing::debug!(node = %index, kind = info.name, "added node");

        index
    }

    /// Removes a node and every connection touching it.
    pub fn remove_node(&mut self, index: NodeIndex) -> Result<AuthoringNode, GraphError> {
        self.node(index).ok_or(GraphError::NodeNotFound(index))?;

        let touching: Vec<Connection> = self
            .connections
            .iter()
            .filter(|c| c.output_node == index || c.input_node == index)
            .copied()
            .collect();
        for connection in &touching {
            self.unlink(connection);
        }

        let node = self.nodes[index.slot()]
            .take()
            .ok_or(GraphError::NodeNotFound(index))?;
        self.recalculate_order();

        #[cfg(feature = "tracing")]
        tracing::debug!(node = %index, removed_connections = touching.len(), "removed node");

        Ok(node)
    }

    /// Returns the node at `index`.
    pub fn node(&self, index: NodeIndex) -> Option<&AuthoringNode> {
        self.nodes.get(index.slot()).and_then(Option::as_ref)
    }

    /// Returns the node at `index`, mutably.
    ///
    /// Ports and connectivity should be edited through the graph's methods so
    /// the cached order stays consistent.
    pub fn node_mut(&mut self, index: NodeIndex) -> Option<&mut AuthoringNode> {
        self.nodes.get_mut(index.slot()).and_then(Option::as_mut)
    }

    /// Renames a node.
    pub fn set_node_name(
        &mut self,
        index: NodeIndex,
        name: impl Into<String>,
    ) -> Result<(), GraphError> {
        let node = self.node_mut(index).ok_or(GraphError::NodeNotFound(index))?;
        node.name = name.into();
        Ok(())
    }

    /// Moves a node in the editor.
    pub fn set_node_position(
        &mut self,
        index: NodeIndex,
        position: Point,
    ) -> Result<(), GraphError> {
        let node = self.node_mut(index).ok_or(GraphError::NodeNotFound(index))?;
        node.position = position;
        Ok(())
    }

    /// Live nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &AuthoringNode> {
        self.nodes.iter().flatten()
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    /// Returns true if the graph has no live nodes.
    pub fn is_empty(&self) -> bool {
        self.node_count() == 0
    }

    /// Finds the first node with the given user-visible name.
    pub fn find_node(&self, name: &str) -> Option<NodeIndex> {
        self.nodes().find(|n| n.name == name).map(|n| n.index)
    }

    // --- Connections ---

    /// Connects `output_port` of `output_node` to `input_port` of `input_node`.
    ///
    /// Replaces any connection already feeding the input.
    pub fn connect_nodes(
        &mut self,
        output_node: NodeIndex,
        output_port: usize,
        input_node: NodeIndex,
        input_port: usize,
    ) -> Result<(), GraphError> {
        let output_descriptor =
            self.port_descriptor(output_node, PortDirection::Output, output_port)?;
        let input_descriptor = self.port_descriptor(input_node, PortDirection::Input, input_port)?;
        if !output_descriptor.is_compatible(&input_descriptor) {
            return Err(GraphError::TypeMismatch {
                output_type: output_descriptor.type_name,
                input_type: input_descriptor.type_name,
            });
        }

        if let Some(existing) = self.incoming(input_node, input_port) {
            self.unlink(&existing);
        }

        let connection = Connection {
            output_node,
            output_port,
            input_node,
            input_port,
        };
        if let Some(node) = self.node_mut(output_node) {
            node.outputs[output_port].targets.push(PortRef {
                node: input_node,
                port: input_port,
            });
        }
        if let Some(node) = self.node_mut(input_node) {
            node.inputs[input_port].source = Some(PortRef {
                node: output_node,
                port: output_port,
            });
        }
        self.connections.push(connection);
        self.recalculate_order();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            from = %output_node,
            output_port,
            to = %input_node,
            input_port,
            "connected"
        );

        Ok(())
    }

    /// Removes the connection feeding `input` on `node`.
    ///
    /// Returns whether a connection was removed.
    pub fn disconnect_input(&mut self, node: NodeIndex, input: usize) -> Result<bool, GraphError> {
        self.port_descriptor(node, PortDirection::Input, input)?;
        let Some(existing) = self.incoming(node, input) else {
            return Ok(false);
        };
        self.unlink(&existing);
        self.recalculate_order();
        Ok(true)
    }

    /// All connections, in the order they were made.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Number of connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// The connection feeding `input` on `node`, if any.
    pub fn incoming(&self, node: NodeIndex, input: usize) -> Option<Connection> {
        self.connections
            .iter()
            .find(|c| c.input_node == node && c.input_port == input)
            .copied()
    }

    // --- Order ---

    /// Cached topological order. Nodes caught in cycles are absent.
    pub fn process_order(&self) -> &[NodeIndex] {
        &self.process_order
    }

    /// Live nodes missing from the process order because of a cycle.
    pub fn cycle_excluded(&self) -> Vec<NodeIndex> {
        self.nodes()
            .map(|n| n.index)
            .filter(|i| !self.process_order.contains(i))
            .collect()
    }

    /// Recomputes the process order with Kahn's algorithm.
    ///
    /// The ready queue is FIFO and seeded in insertion order, so among nodes
    /// that become ready together, the earlier-inserted runs first. Nodes whose
    /// in-degree never reaches zero (cycles and everything downstream of them)
    /// are left out.
    pub fn recalculate_order(&mut self) {
        let n = self.nodes.len();
        let mut in_degree = vec![0u32; n];
        let mut downstream: Vec<Vec<usize>> = vec![Vec::new(); n];

        for c in &self.connections {
            in_degree[c.input_node.slot()] += 1;
            downstream[c.output_node.slot()].push(c.input_node.slot());
        }

        let mut queue: VecDeque<usize> = (0..n)
            .filter(|&i| self.nodes[i].is_some() && in_degree[i] == 0)
            .collect();

        self.process_order.clear();
        while let Some(i) = queue.pop_front() {
            self.process_order.push(NodeIndex(i as u32));
            for &to in &downstream[i] {
                in_degree[to] -= 1;
                if in_degree[to] == 0 {
                    queue.push_back(to);
                }
            }
        }

        #[cfg(feature = "tracing")]
        {
            let live = self.node_count();
            if self.process_order.len() < live {
                tracing::debug!(
                    excluded = live - self.process_order.len(),
                    "cycle detected; nodes left out of process order"
                );
            }
        }
    }

    /// Sum of the state sizes of every live node.
    pub fn calculate_graph_size(&self) -> usize {
        self.nodes().map(|n| n.state_size).sum()
    }

    // --- Internals ---

    fn port_descriptor(
        &self,
        node: NodeIndex,
        direction: PortDirection,
        port: usize,
    ) -> Result<PortDescriptor, GraphError> {
        let data = self.node(node).ok_or(GraphError::NodeNotFound(node))?;
        let descriptor = match direction {
            PortDirection::Input => data.inputs.get(port).map(|p| p.descriptor),
            PortDirection::Output => data.outputs.get(port).map(|p| p.descriptor),
        };
        descriptor.ok_or(GraphError::PortOutOfRange {
            node,
            direction,
            port,
            count: match direction {
                PortDirection::Input => data.inputs.len(),
                PortDirection::Output => data.outputs.len(),
            },
        })
    }

    /// Removes a connection from the list and from both endpoints' ports.
    fn unlink(&mut self, connection: &Connection) {
        self.connections.retain(|c| c != connection);
        let target = PortRef {
            node: connection.input_node,
            port: connection.input_port,
        };
        if let Some(node) = self.node_mut(connection.output_node) {
            if let Some(output) = node.outputs.get_mut(connection.output_port) {
                output.targets.retain(|t| *t != target);
            }
        }
        if let Some(node) = self.node_mut(connection.input_node) {
            if let Some(input) = node.inputs.get_mut(connection.input_port) {
                input.source = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeRegistry;
    use crate::nodes::{AddFloat, ConstantFloat, SineLfo, SineOsc, register_builtin_nodes};

    fn registry() -> NodeRegistry {
        let mut registry = NodeRegistry::new();
        register_builtin_nodes(&mut registry);
        registry
    }

    #[test]
    fn test_add_node_assigns_sequential_indices() {
        let reg = registry();
        let mut graph = NodeGraph::new();
        let a = graph.add_node(reg.info_of::<ConstantFloat>());
        let b = graph.add_node(reg.info_of::<AddFloat>());
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(graph.node(b).unwrap().name, "AddFloat");
        assert_eq!(graph.process_order(), &[a, b]);
    }

    #[test]
    fn test_connect_orders_producer_first() {
        let reg = registry();
        let mut graph = NodeGraph::new();
        let sum = graph.add_node(reg.info_of::<AddFloat>());
        let c = graph.add_node(reg.info_of::<ConstantFloat>());
        graph.connect_nodes(c, 0, sum, 1).unwrap();
        assert_eq!(graph.process_order(), &[c, sum]);
        assert_eq!(graph.node(c).unwrap().outputs[0].targets, vec![PortRef { node: sum, port: 1 }]);
        assert_eq!(graph.node(sum).unwrap().inputs[1].source, Some(PortRef { node: c, port: 0 }));
    }

    #[test]
    fn test_connect_validates_ports_and_types() {
        let reg = registry();
        let mut graph = NodeGraph::new();
        let lfo = graph.add_node(reg.info_of::<SineLfo>());
        let osc = graph.add_node(reg.info_of::<SineOsc>());
        let sum = graph.add_node(reg.info_of::<AddFloat>());

        assert_eq!(
            graph.connect_nodes(NodeIndex::new(9), 0, osc, 0),
            Err(GraphError::NodeNotFound(NodeIndex::new(9)))
        );
        assert!(matches!(
            graph.connect_nodes(lfo, 3, osc, 0),
            Err(GraphError::PortOutOfRange { direction: PortDirection::Output, port: 3, .. })
        ));
        assert!(matches!(
            graph.connect_nodes(osc, 0, sum, 0),
            Err(GraphError::TypeMismatch { .. })
        ));
        assert_eq!(graph.connection_count(), 0);
    }

    #[test]
    fn test_reconnecting_input_replaces_connection() {
        let reg = registry();
        let mut graph = NodeGraph::new();
        let a = graph.add_node(reg.info_of::<ConstantFloat>());
        let b = graph.add_node(reg.info_of::<ConstantFloat>());
        let sum = graph.add_node(reg.info_of::<AddFloat>());
        graph.connect_nodes(a, 0, sum, 0).unwrap();
        graph.connect_nodes(b, 0, sum, 0).unwrap();

        assert_eq!(graph.connection_count(), 1);
        assert_eq!(graph.incoming(sum, 0).map(|c| c.output_node), Some(b));
        assert!(graph.node(a).unwrap().outputs[0].targets.is_empty());
    }

    #[test]
    fn test_disconnect_input() {
        let reg = registry();
        let mut graph = NodeGraph::new();
        let a = graph.add_node(reg.info_of::<ConstantFloat>());
        let sum = graph.add_node(reg.info_of::<AddFloat>());
        graph.connect_nodes(a, 0, sum, 0).unwrap();

        assert_eq!(graph.disconnect_input(sum, 0), Ok(true));
        assert_eq!(graph.disconnect_input(sum, 0), Ok(false));
        assert!(graph.disconnect_input(sum, 5).is_err());
        assert_eq!(graph.connection_count(), 0);
        assert!(graph.node(sum).unwrap().inputs[0].source.is_none());
    }

    #[test]
    fn test_remove_node_drops_its_connections() {
        let reg = registry();
        let mut graph = NodeGraph::new();
        let a = graph.add_node(reg.info_of::<ConstantFloat>());
        let sum = graph.add_node(reg.info_of::<AddFloat>());
        let out = graph.add_node(reg.info_of::<ConstantFloat>());
        graph.connect_nodes(a, 0, sum, 0).unwrap();
        graph.connect_nodes(sum, 0, out, 0).unwrap();

        let removed = graph.remove_node(sum).unwrap();
        assert_eq!(removed.index, sum);
        assert_eq!(graph.connection_count(), 0);
        assert!(graph.node(a).unwrap().outputs[0].targets.is_empty());
        assert!(graph.node(out).unwrap().inputs[0].source.is_none());
        assert_eq!(graph.process_order(), &[a, out]);
        assert_eq!(graph.remove_node(sum).unwrap_err(), GraphError::NodeNotFound(sum));

        // Indices are not reused.
        let next = graph.add_node(reg.info_of::<ConstantFloat>());
        assert_eq!(next.index(), 3);
    }

    #[test]
    fn test_cycle_is_excluded_from_order() {
        let reg = registry();
        let mut graph = NodeGraph::new();
        let free = graph.add_node(reg.info_of::<ConstantFloat>());
        let x = graph.add_node(reg.info_of::<AddFloat>());
        let y = graph.add_node(reg.info_of::<AddFloat>());
        graph.connect_nodes(x, 0, y, 0).unwrap();
        graph.connect_nodes(y, 0, x, 0).unwrap();

        assert_eq!(graph.process_order(), &[free]);
        assert_eq!(graph.cycle_excluded(), vec![x, y]);
    }

    #[test]
    fn test_self_loop_is_excluded() {
        let reg = registry();
        let mut graph = NodeGraph::new();
        let x = graph.add_node(reg.info_of::<AddFloat>());
        graph.connect_nodes(x, 0, x, 1).unwrap();
        assert!(graph.process_order().is_empty());
    }

    #[test]
    fn test_graph_size_sums_state() {
        let reg = registry();
        let mut graph = NodeGraph::new();
        graph.add_node(reg.info_of::<SineOsc>());
        graph.add_node(reg.info_of::<AddFloat>());
        let expected = reg.info_of::<SineOsc>().state_size + reg.info_of::<AddFloat>().state_size;
        assert_eq!(graph.calculate_graph_size(), expected);
    }

    #[test]
    fn test_rename_and_move() {
        let reg = registry();
        let mut graph = NodeGraph::new();
        let osc = graph.add_node(reg.info_of::<SineOsc>());
        graph.set_node_name(osc, "carrier").unwrap();
        graph.set_node_position(osc, Point::new(100.0, 50.0)).unwrap();
        assert_eq!(graph.find_node("carrier"), Some(osc));
        assert_eq!(graph.node(osc).unwrap().position, Point::new(100.0, 50.0));
    }
}
