//! The compiled runtime graph.
//!
//! [`NodeProcessor`] owns a flat list of [`CompiledNode`]s, an index lookup
//! from authoring [`NodeIndex`] to storage position, and the [`StateArena`]
//! budget every node's state was charged against. [`process`](NodeProcessor::process)
//! walks the list in storage order: for each node it copies every bound output
//! into the node's input ports, then runs the node.
//!
//! All allocation happens while nodes are added, connected, or prepared.
//! Processing itself performs no allocation, locking, or logging.

use super::arena::{ArenaBlock, StateArena};
use super::authoring::NodeIndex;
use super::node::{ErasedState, NodeDefinition, NodeSnapshot, NodeState, NodeTypeId, ProcessContext};
use super::registry::NodeTypeInfo;

/// Copies one output port of another compiled node into an input port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputBinding {
    /// Storage position of the producing node.
    pub source: usize,
    /// Port on the producing node.
    pub output_port: usize,
    /// Port on the consuming node.
    pub input_port: usize,
}

/// One node in the compiled graph.
pub struct CompiledNode {
    index: NodeIndex,
    type_id: NodeTypeId,
    block: ArenaBlock,
    state: Box<dyn ErasedState>,
    inputs: Vec<InputBinding>,
}

impl CompiledNode {
    /// Authoring index this node was compiled from.
    pub fn index(&self) -> NodeIndex {
        self.index
    }

    /// Kind of node.
    pub fn type_id(&self) -> NodeTypeId {
        self.type_id
    }

    /// Arena block charged for this node's state.
    pub fn block(&self) -> ArenaBlock {
        self.block
    }

    /// Input bindings applied before each process call.
    pub fn bindings(&self) -> &[InputBinding] {
        &self.inputs
    }

    /// The node's type-erased state.
    pub fn state(&self) -> &dyn ErasedState {
        self.state.as_ref()
    }
}

impl core::fmt::Debug for CompiledNode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CompiledNode")
            .field("index", &self.index)
            .field("type", &self.state.type_name())
            .field("block", &self.block)
            .field("inputs", &self.inputs)
            .finish()
    }
}

/// Compiled, execution-ready node graph.
///
/// Built by [`NodeGraphCompiler`](super::NodeGraphCompiler), or by hand with
/// [`add_node`](Self::add_node) and [`connect_nodes`](Self::connect_nodes).
/// Nodes execute in the order they were added.
pub struct NodeProcessor {
    arena: StateArena,
    nodes: Vec<CompiledNode>,
    lookup: Vec<Option<usize>>,
    context: ProcessContext,
}

impl Default for NodeProcessor {
    fn default() -> Self {
        Self::new(0)
    }
}

impl core::fmt::Debug for NodeProcessor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NodeProcessor")
            .field("arena", &self.arena)
            .field("nodes", &self.nodes)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl NodeProcessor {
    /// Creates an empty processor with `capacity` bytes of state budget.
    pub fn new(capacity: usize) -> Self {
        Self {
            arena: StateArena::new(capacity),
            nodes: Vec::new(),
            lookup: Vec::new(),
            context: ProcessContext::default(),
        }
    }

    /// Destroys all compiled nodes and reserves `capacity` bytes.
    pub fn reset(&mut self, capacity: usize) {
        self.clear();
        self.arena.reset(capacity);
    }

    /// Destroys all compiled nodes and releases the arena. Safe to repeat.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.lookup.clear();
        self.arena.clear();
    }

    /// Charges `size` bytes against the state budget.
    ///
    /// # Panics
    ///
    /// Panics if the budget would be exceeded.
    pub fn alloc(&mut self, size: usize) -> ArenaBlock {
        self.arena.alloc(size)
    }

    /// Allocates and registers a node of kind `info` under authoring `index`.
    ///
    /// The node is prepared with the processor's current context. Returns the
    /// node's storage position.
    ///
    /// # Panics
    ///
    /// Panics if `index` is already registered or the state budget is exceeded.
    pub fn add_node(&mut self, index: NodeIndex, info: &NodeTypeInfo) -> usize {
        let slot = index.slot();
        if slot >= self.lookup.len() {
            self.lookup.resize(slot + 1, None);
        }
        assert!(
            self.lookup[slot].is_none(),
            "node {index} is already compiled"
        );

        let block = self.alloc(info.state_size);
        let mut state = info.alloc_state();
        state.prepare(self.context);

        let position = self.nodes.len();
        self.nodes.push(CompiledNode {
            index,
            type_id: info.type_id,
            block,
            state,
            inputs: Vec::new(),
        });
        self.lookup[slot] = Some(position);
        position
    }

    /// Binds input `input_port` of `input_node` to output `output_port` of `output_node`.
    ///
    /// Any earlier binding of the same input is replaced.
    ///
    /// # Panics
    ///
    /// Panics if either node is not compiled, either port is out of range, or
    /// the port types differ.
    pub fn connect_nodes(
        &mut self,
        output_node: NodeIndex,
        output_port: usize,
        input_node: NodeIndex,
        input_port: usize,
    ) {
        let source = self.position(output_node);
        let target = self.position(input_node);

        let output_type = self.nodes[source].state.output_type(output_port);
        let input_type = self.nodes[target].state.input_type(input_port);
        let (Some(output_type), Some(input_type)) = (output_type, input_type) else {
            panic!(
                "port out of range connecting {output_node}:{output_port} -> {input_node}:{input_port}"
            );
        };
        assert!(
            output_type == input_type,
            "port type mismatch connecting {output_node}:{output_port} -> {input_node}:{input_port}"
        );

        let inputs = &mut self.nodes[target].inputs;
        inputs.retain(|b| b.input_port != input_port);
        inputs.push(InputBinding {
            source,
            output_port,
            input_port,
        });
    }

    /// Sets the sample rate and maximum block size, and runs every node's
    /// prepare hook. Call off the audio thread.
    pub fn prepare(&mut self, sample_rate: f32, max_frames: usize) {
        self.context = ProcessContext {
            sample_rate,
            frame_count: max_frames,
            max_frames,
        };
        for node in &mut self.nodes {
            node.state.prepare(self.context);
        }
    }

    /// Current processing context.
    pub fn context(&self) -> ProcessContext {
        self.context
    }

    /// Runs every node once, in storage order.
    pub fn process(&mut self) {
        for i in 0..self.nodes.len() {
            for k in 0..self.nodes[i].inputs.len() {
                let binding = self.nodes[i].inputs[k];
                pull_input(&mut self.nodes, i, binding);
            }
            self.nodes[i].state.process();
        }
    }

    /// Sets the frame count for this block and runs [`process`](Self::process).
    ///
    /// `frame_count` is clamped to the prepared maximum when one is set.
    pub fn process_block(&mut self, frame_count: usize) {
        let frames = if self.context.max_frames > 0 {
            frame_count.min(self.context.max_frames)
        } else {
            frame_count
        };
        self.context.frame_count = frames;
        for node in &mut self.nodes {
            node.state.set_frame_count(frames);
        }
        self.process();
    }

    /// Typed access to the node compiled under `index`.
    ///
    /// # Panics
    ///
    /// Panics if no node is compiled under `index` or it is not of kind `T`.
    pub fn get_node<T: NodeDefinition>(&self, index: NodeIndex) -> &NodeState<T> {
        match self.try_get_node::<T>(index) {
            Some(node) => node,
            None => panic!(
                "node {index} is not a compiled {}",
                core::any::type_name::<T>()
            ),
        }
    }

    /// Typed mutable access to the node compiled under `index`.
    ///
    /// # Panics
    ///
    /// Panics if no node is compiled under `index` or it is not of kind `T`.
    pub fn get_node_mut<T: NodeDefinition>(&mut self, index: NodeIndex) -> &mut NodeState<T> {
        match self.try_get_node_mut::<T>(index) {
            Some(node) => node,
            None => panic!(
                "node {index} is not a compiled {}",
                core::any::type_name::<T>()
            ),
        }
    }

    /// Typed access, or `None` if absent or of another kind.
    pub fn try_get_node<T: NodeDefinition>(&self, index: NodeIndex) -> Option<&NodeState<T>> {
        let position = self.try_position(index)?;
        self.nodes[position]
            .state
            .as_any()
            .downcast_ref::<NodeState<T>>()
    }

    /// Typed mutable access, or `None` if absent or of another kind.
    pub fn try_get_node_mut<T: NodeDefinition>(
        &mut self,
        index: NodeIndex,
    ) -> Option<&mut NodeState<T>> {
        let position = self.try_position(index)?;
        self.nodes[position]
            .state
            .as_any_mut()
            .downcast_mut::<NodeState<T>>()
    }

    /// Copies the full state of the node under `index` for hand-off to another thread.
    pub fn get_node_state(&self, index: NodeIndex) -> Option<NodeSnapshot> {
        let position = self.try_position(index)?;
        Some(self.nodes[position].state.snapshot())
    }

    /// Writes `value` into input `port` of the node under `index`.
    ///
    /// Returns false if the node is absent, the port is out of range, or the
    /// type does not match. A connected input is overwritten again on the next
    /// process call.
    pub fn set_input(&mut self, index: NodeIndex, port: usize, value: &dyn core::any::Any) -> bool {
        match self.try_position(index) {
            Some(position) => self.nodes[position].state.set_input(port, value),
            None => false,
        }
    }

    /// Type-erased state of the node under `index`.
    pub fn node_state(&self, index: NodeIndex) -> Option<&dyn ErasedState> {
        let position = self.try_position(index)?;
        Some(self.nodes[position].state.as_ref())
    }

    /// Compiled nodes in execution order.
    pub fn nodes(&self) -> &[CompiledNode] {
        &self.nodes
    }

    /// Authoring indices in execution order.
    pub fn execution_order(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.nodes.iter().map(|n| n.index)
    }

    /// Returns true if a node is compiled under `index`.
    pub fn contains(&self, index: NodeIndex) -> bool {
        self.try_position(index).is_some()
    }

    /// Number of compiled nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if no nodes are compiled.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Total input bindings across all nodes.
    pub fn binding_count(&self) -> usize {
        self.nodes.iter().map(|n| n.inputs.len()).sum()
    }

    /// Reserved state budget in bytes.
    pub fn capacity(&self) -> usize {
        self.arena.capacity()
    }

    /// State budget used, including alignment padding.
    pub fn used_bytes(&self) -> usize {
        self.arena.used()
    }

    fn try_position(&self, index: NodeIndex) -> Option<usize> {
        self.lookup.get(index.slot()).copied().flatten()
    }

    fn position(&self, index: NodeIndex) -> usize {
        match self.try_position(index) {
            Some(position) => position,
            None => panic!("node {index} is not compiled"),
        }
    }
}

/// Copies a bound output into node `target`'s input.
#[inline]
fn pull_input(nodes: &mut [CompiledNode], target: usize, binding: InputBinding) {
    let InputBinding {
        source,
        output_port,
        input_port,
    } = binding;

    if source == target {
        nodes[target].state.loopback(output_port, input_port);
        return;
    }

    let (src, dst) = if source < target {
        let (head, tail) = nodes.split_at_mut(target);
        (&head[source], &mut tail[0])
    } else {
        let (head, tail) = nodes.split_at_mut(source);
        (&tail[0], &mut head[target])
    };
    if let Some(value) = src.state.output(output_port) {
        dst.state.set_input(input_port, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeRegistry;
    use crate::nodes::{AddFloat, ConstantFloat, SineOsc, register_builtin_nodes};

    fn registry() -> NodeRegistry {
        let mut registry = NodeRegistry::new();
        register_builtin_nodes(&mut registry);
        registry
    }

    #[test]
    fn test_bindings_copy_before_process() {
        let reg = registry();
        let mut proc = NodeProcessor::new(1024);
        let a = NodeIndex::new(0);
        let b = NodeIndex::new(1);
        let sum = NodeIndex::new(2);
        proc.add_node(a, reg.info_of::<ConstantFloat>());
        proc.add_node(b, reg.info_of::<ConstantFloat>());
        proc.add_node(sum, reg.info_of::<AddFloat>());
        proc.connect_nodes(a, 0, sum, 0);
        proc.connect_nodes(b, 0, sum, 1);

        proc.get_node_mut::<ConstantFloat>(a).input.value = 1.5;
        proc.get_node_mut::<ConstantFloat>(b).input.value = 2.0;
        proc.process();
        assert_eq!(proc.get_node::<AddFloat>(sum).output.sum, 3.5);
        assert_eq!(proc.binding_count(), 2);
    }

    #[test]
    fn test_consumer_before_producer_lags_one_block() {
        let reg = registry();
        let mut proc = NodeProcessor::new(1024);
        let sum = NodeIndex::new(0);
        let a = NodeIndex::new(1);
        proc.add_node(sum, reg.info_of::<AddFloat>());
        proc.add_node(a, reg.info_of::<ConstantFloat>());
        proc.connect_nodes(a, 0, sum, 0);
        proc.get_node_mut::<ConstantFloat>(a).input.value = 4.0;

        proc.process();
        assert_eq!(proc.get_node::<AddFloat>(sum).output.sum, 0.0);
        proc.process();
        assert_eq!(proc.get_node::<AddFloat>(sum).output.sum, 4.0);
    }

    #[test]
    fn test_inputs_bind_by_input_port() {
        let reg = registry();
        let mut proc = NodeProcessor::new(1024);
        let a = NodeIndex::new(0);
        let sum = NodeIndex::new(1);
        proc.add_node(a, reg.info_of::<ConstantFloat>());
        proc.add_node(sum, reg.info_of::<AddFloat>());
        proc.connect_nodes(a, 0, sum, 1);
        proc.get_node_mut::<ConstantFloat>(a).input.value = 7.0;
        proc.process();

        let node = proc.get_node::<AddFloat>(sum);
        assert_eq!(node.input.a, 0.0);
        assert_eq!(node.input.b, 7.0);
    }

    #[test]
    fn test_self_binding_feeds_back() {
        let reg = registry();
        let mut proc = NodeProcessor::new(1024);
        let acc = NodeIndex::new(0);
        proc.add_node(acc, reg.info_of::<AddFloat>());
        proc.connect_nodes(acc, 0, acc, 0);
        proc.get_node_mut::<AddFloat>(acc).input.b = 1.0;
        for _ in 0..3 {
            proc.process();
        }
        assert_eq!(proc.get_node::<AddFloat>(acc).output.sum, 3.0);
    }

    #[test]
    fn test_sparse_indices_and_lookup() {
        let reg = registry();
        let mut proc = NodeProcessor::new(1024);
        proc.add_node(NodeIndex::new(5), reg.info_of::<ConstantFloat>());
        assert!(proc.contains(NodeIndex::new(5)));
        assert!(!proc.contains(NodeIndex::new(2)));
        assert!(proc.try_get_node::<ConstantFloat>(NodeIndex::new(2)).is_none());
        assert!(proc.try_get_node::<AddFloat>(NodeIndex::new(5)).is_none());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let reg = registry();
        let mut proc = NodeProcessor::new(1024);
        proc.clear();
        proc.add_node(NodeIndex::new(0), reg.info_of::<ConstantFloat>());
        assert!(proc.used_bytes() > 0);
        proc.clear();
        proc.clear();
        assert!(proc.is_empty());
        assert_eq!(proc.used_bytes(), 0);
        assert_eq!(proc.capacity(), 1024);
        proc.process();
    }

    #[test]
    fn test_prepare_sizes_audio_ports() {
        let reg = registry();
        let mut proc = NodeProcessor::new(1024);
        let osc = NodeIndex::new(0);
        proc.add_node(osc, reg.info_of::<SineOsc>());
        proc.prepare(48000.0, 128);
        assert_eq!(proc.get_node::<SineOsc>(osc).output.output.len(), 128);

        proc.process_block(512);
        assert_eq!(proc.context().frame_count, 128);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let reg = registry();
        let mut proc = NodeProcessor::new(1024);
        let a = NodeIndex::new(0);
        proc.add_node(a, reg.info_of::<ConstantFloat>());
        proc.get_node_mut::<ConstantFloat>(a).input.value = 3.0;
        proc.process();

        let snapshot = proc.get_node_state(a).unwrap();
        proc.get_node_mut::<ConstantFloat>(a).input.value = 9.0;
        proc.process();
        let copy = snapshot.downcast_ref::<ConstantFloat>().unwrap();
        assert_eq!(copy.output.value, 3.0);
        assert!(proc.get_node_state(NodeIndex::new(4)).is_none());
    }

    #[test]
    fn test_set_input_checks_type() {
        let reg = registry();
        let mut proc = NodeProcessor::new(1024);
        let a = NodeIndex::new(0);
        proc.add_node(a, reg.info_of::<ConstantFloat>());
        assert!(proc.set_input(a, 0, &0.25_f32));
        assert!(!proc.set_input(a, 0, &1_u32));
        assert!(!proc.set_input(NodeIndex::new(3), 0, &0.25_f32));
        assert_eq!(proc.get_node::<ConstantFloat>(a).input.value, 0.25);
    }

    #[test]
    #[should_panic(expected = "state arena exhausted")]
    fn test_budget_overflow_panics() {
        let reg = registry();
        let mut proc = NodeProcessor::new(16);
        proc.add_node(NodeIndex::new(0), reg.info_of::<SineOsc>());
    }

    #[test]
    #[should_panic(expected = "port type mismatch")]
    fn test_connect_type_mismatch_panics() {
        let reg = registry();
        let mut proc = NodeProcessor::new(1024);
        proc.add_node(NodeIndex::new(0), reg.info_of::<SineOsc>());
        proc.add_node(NodeIndex::new(1), reg.info_of::<AddFloat>());
        proc.connect_nodes(NodeIndex::new(0), 0, NodeIndex::new(1), 0);
    }

    #[test]
    #[should_panic(expected = "not a compiled")]
    fn test_get_node_wrong_kind_panics() {
        let reg = registry();
        let mut proc = NodeProcessor::new(1024);
        proc.add_node(NodeIndex::new(0), reg.info_of::<ConstantFloat>());
        let _ = proc.get_node::<AddFloat>(NodeIndex::new(0));
    }
}
