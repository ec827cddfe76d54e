//! Render host for compiled node graphs.

use core::any::TypeId;

use grainflow_config::EngineConfig;
use grainflow_core::{NodeGraph, NodeIndex, NodeProcessor, StereoBuffer};

use crate::bridge::{AudioEndpoint, ReleaseQueue};
use crate::events::{GraphCommand, GraphNotification};

/// Most nodes that can be subscribed at once.
pub const MAX_SUBSCRIPTIONS: usize = 32;

/// Plays a [`NodeProcessor`] through an interleaved stereo render callback.
///
/// Commands from the UI are applied at the top of each [`render`](Self::render)
/// call. The output node's first [`StereoBuffer`] output port is copied to the
/// interleaved output; without an output node the host renders silence while
/// still running the graph.
///
/// Requests longer than the processor's prepared block size are rendered in
/// several passes.
///
/// Replaced processors and graphs are never dropped inside `render`. If the
/// notification channel is full they wait in a [`ReleaseQueue`] and are sent
/// at the top of a later call.
///
/// # Example
///
/// ```rust
/// use grainflow_core::nodes::{register_builtin_nodes, SineOsc};
/// use grainflow_core::{NodeGraph, NodeGraphCompiler, NodeProcessor, NodeRegistry};
/// use grainflow_io::GraphHost;
///
/// let mut registry = NodeRegistry::new();
/// register_builtin_nodes(&mut registry);
/// let mut graph = NodeGraph::new();
/// let osc = graph.add_node(registry.info_of::<SineOsc>());
///
/// let mut processor = NodeProcessor::new(2048);
/// processor.prepare(48000.0, 256);
/// NodeGraphCompiler::new(&registry).build(&graph, &mut processor);
///
/// let mut host = GraphHost::new(8);
/// host.set_processor(Box::new(processor), Some(osc));
///
/// let mut out = vec![0.0; 512];
/// host.render(&mut out, &[], 256);
/// assert!(out.iter().any(|&s| s != 0.0));
/// ```
pub struct GraphHost {
    processor: Box<NodeProcessor>,
    graph: Option<Box<NodeGraph>>,
    output: Option<(NodeIndex, usize)>,
    subscriptions: Vec<NodeIndex>,
    interval_blocks: u32,
    blocks_until_snapshot: u32,
    endpoint: Option<AudioEndpoint<GraphCommand, GraphNotification>>,
    released: ReleaseQueue<GraphNotification>,
}

impl GraphHost {
    /// Create a host with an empty processor that sends subscription
    /// snapshots every `interval_blocks` render calls.
    pub fn new(interval_blocks: u32) -> Self {
        let interval_blocks = interval_blocks.max(1);
        Self {
            processor: Box::default(),
            graph: None,
            output: None,
            subscriptions: Vec::with_capacity(MAX_SUBSCRIPTIONS),
            interval_blocks,
            blocks_until_snapshot: interval_blocks,
            endpoint: None,
            released: ReleaseQueue::default(),
        }
    }

    /// Create a host with the snapshot interval from `config`.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.subscription_interval_blocks)
    }

    /// Attach the audio side of a bridge.
    pub fn with_endpoint(
        mut self,
        endpoint: AudioEndpoint<GraphCommand, GraphNotification>,
    ) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Swap in a compiled processor and output node. Returns the previous
    /// processor.
    pub fn set_processor(
        &mut self,
        processor: Box<NodeProcessor>,
        output: Option<NodeIndex>,
    ) -> Box<NodeProcessor> {
        let previous = core::mem::replace(&mut self.processor, processor);
        self.output = output.and_then(|node| Some((node, stereo_port(&self.processor, node)?)));
        previous
    }

    /// Take ownership of an authoring graph. Returns the previous one.
    pub fn acquire_graph(&mut self, graph: Box<NodeGraph>) -> Option<Box<NodeGraph>> {
        self.graph.replace(graph)
    }

    /// Start sending snapshots of `node`. Returns false if already subscribed
    /// or [`MAX_SUBSCRIPTIONS`] is reached.
    pub fn subscribe(&mut self, node: NodeIndex) -> bool {
        if self.subscriptions.contains(&node) || self.subscriptions.len() >= MAX_SUBSCRIPTIONS {
            return false;
        }
        self.subscriptions.push(node);
        true
    }

    /// Stop sending snapshots of `node`. Returns false if it was not subscribed.
    pub fn unsubscribe(&mut self, node: NodeIndex) -> bool {
        match self.subscriptions.iter().position(|&n| n == node) {
            Some(i) => {
                self.subscriptions.swap_remove(i);
                true
            }
            None => false,
        }
    }

    /// Apply one command. Replaced processors and graphs are handed back
    /// through the endpoint when one is attached.
    pub fn handle_command(&mut self, command: GraphCommand) {
        match command {
            GraphCommand::AcquireGraph(graph) => {
                if let Some(previous) = self.acquire_graph(graph) {
                    self.send(GraphNotification::ReleasedGraph(previous));
                }
            }
            GraphCommand::SetGraphProcessor { processor, output } => {
                let previous = self.set_processor(processor, output);
                self.send(GraphNotification::ReleasedProcessor(previous));
            }
            GraphCommand::NodeSubscribe(node) => {
                self.subscribe(node);
            }
            GraphCommand::NodeUnsubscribe(node) => {
                self.unsubscribe(node);
            }
        }
    }

    /// Render `frame_count` interleaved stereo frames into `output`.
    ///
    /// `output` must hold at least `2 * frame_count` samples; extra frames
    /// requested beyond its length are skipped. The graph has no audio input,
    /// so `_input` is ignored.
    pub fn render(&mut self, output: &mut [f32], _input: &[f32], frame_count: usize) {
        if let Some(endpoint) = &self.endpoint {
            self.released.flush(endpoint);
        }
        while let Some(command) = self.endpoint.as_ref().and_then(AudioEndpoint::poll) {
            self.handle_command(command);
        }

        let frames = frame_count.min(output.len() / 2);
        let max = self.processor.context().max_frames;
        let chunk = if max == 0 { frames.max(1) } else { max };

        let mut done = 0;
        while done < frames {
            let n = (frames - done).min(chunk);
            self.processor.process_block(n);
            let out = &mut output[done * 2..(done + n) * 2];
            match self.output_buffer() {
                Some(buffer) => buffer.write_interleaved(out, n),
                None => out.fill(0.0),
            }
            done += n;
        }

        self.blocks_until_snapshot -= 1;
        if self.blocks_until_snapshot == 0 {
            self.blocks_until_snapshot = self.interval_blocks;
            self.send_snapshots();
        }
    }

    /// The current processor.
    pub fn processor(&self) -> &NodeProcessor {
        &self.processor
    }

    /// The current processor, mutably.
    pub fn processor_mut(&mut self) -> &mut NodeProcessor {
        &mut self.processor
    }

    /// The held authoring graph, if any.
    pub fn graph(&self) -> Option<&NodeGraph> {
        self.graph.as_deref()
    }

    /// The played node and its stereo output port.
    pub fn output(&self) -> Option<(NodeIndex, usize)> {
        self.output
    }

    /// Subscribed nodes.
    pub fn subscriptions(&self) -> &[NodeIndex] {
        &self.subscriptions
    }

    /// Notifications still waiting for room in the channel.
    pub fn pending_releases(&self) -> usize {
        self.released.len()
    }

    fn output_buffer(&self) -> Option<&StereoBuffer> {
        let (node, port) = self.output?;
        self.processor
            .node_state(node)?
            .output(port)?
            .downcast_ref::<StereoBuffer>()
    }

    fn send_snapshots(&mut self) {
        let Some(endpoint) = &self.endpoint else {
            return;
        };
        for &node in &self.subscriptions {
            // Skipped snapshots are never taken; the next interval sends fresh ones.
            if !self.released.is_empty() || endpoint.is_full() {
                return;
            }
            if let Some(snapshot) = self.processor.get_node_state(node) {
                self.released
                    .send(endpoint, GraphNotification::SubscriptionData { node, snapshot });
            }
        }
    }

    fn send(&mut self, notification: GraphNotification) {
        if let Some(endpoint) = &self.endpoint {
            self.released.send(endpoint, notification);
        }
    }
}

/// First output port of `node` carrying a [`StereoBuffer`].
fn stereo_port(processor: &NodeProcessor, node: NodeIndex) -> Option<usize> {
    let state = processor.node_state(node)?;
    (0..state.output_count())
        .find(|&port| state.output_type(port) == Some(TypeId::of::<StereoBuffer>()))
}
