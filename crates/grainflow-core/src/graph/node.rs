//! Node kinds, their runtime state, and the type-erased state interface.
//!
//! A node kind is a type implementing [`NodeDefinition`]: its own fields are the
//! node's private state, and its associated `Input`/`Output` port structs are
//! the values exchanged with other nodes. At runtime every node lives as a
//! [`NodeState<T>`] behind the object-safe [`ErasedState`] trait, so the
//! processor can drive heterogeneous nodes from one flat list.

use core::any::{Any, TypeId};

use super::port::PortSet;
use super::registry::NodeCategory;

/// Stable identifier for a registered node kind.
///
/// Derived from the kind's Rust type name (64-bit FNV-1a), so the same type
/// maps to the same id across runs of the same build.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeTypeId(pub(crate) u64);

impl NodeTypeId {
    /// Returns the id for node kind `T`.
    pub fn of<T: 'static>() -> Self {
        Self(fnv1a(core::any::type_name::<T>()))
    }

    /// Returns the raw numeric identifier.
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for NodeTypeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

fn fnv1a(s: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    s.bytes()
        .fold(OFFSET, |hash, b| (hash ^ u64::from(b)).wrapping_mul(PRIME))
}

/// Per-block information handed to every node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessContext {
    /// Sample rate in Hz.
    pub sample_rate: f32,
    /// Frames to produce this block.
    pub frame_count: usize,
    /// Largest block the host will request; audio-rate ports are sized to this.
    pub max_frames: usize,
}

impl Default for ProcessContext {
    fn default() -> Self {
        Self {
            sample_rate: 48000.0,
            frame_count: 0,
            max_frames: 0,
        }
    }
}

/// A node kind.
///
/// The implementing type holds the node's private state. The processing
/// function is supplied separately when the kind is registered with
/// [`NodeRegistry::add_node`](super::NodeRegistry::add_node).
///
/// # Example
///
/// ```rust
/// use grainflow_core::graph::{NodeCategory, NodeDefinition, NodeRegistry, NodeState};
/// use grainflow_core::node_ports;
///
/// node_ports! {
///     /// Gain inputs.
///     pub struct GainInput {
///         /// Signal.
///         pub value: f32 = 0.0,
///         /// Multiplier.
///         pub gain: f32 = 1.0,
///     }
/// }
///
/// node_ports! {
///     /// Gain output.
///     pub struct GainOutput {
///         /// Scaled signal.
///         pub value: f32 = 0.0,
///     }
/// }
///
/// #[derive(Default, Clone)]
/// struct Gain;
///
/// impl NodeDefinition for Gain {
///     type Input = GainInput;
///     type Output = GainOutput;
///     const NAME: &'static str = "Gain";
///     const CATEGORY: NodeCategory = NodeCategory::Math;
/// }
///
/// fn process_gain(node: &mut NodeState<Gain>) {
///     node.output.value = node.input.value * node.input.gain;
/// }
///
/// let mut registry = NodeRegistry::new();
/// registry.add_node::<Gain>(process_gain);
/// assert_eq!(registry.info_of::<Gain>().inputs.len(), 2);
/// ```
pub trait NodeDefinition: Default + Clone + Send + 'static {
    /// Values read from upstream nodes.
    type Input: PortSet;
    /// Values published to downstream nodes.
    type Output: PortSet;

    /// Display name, also used to look the kind up by name.
    const NAME: &'static str;
    /// Category for grouping in listings.
    const CATEGORY: NodeCategory = NodeCategory::Utility;
    /// One-line description.
    const DESCRIPTION: &'static str = "";

    /// Called off the audio thread whenever the sample rate or maximum block
    /// size changes. Size audio-rate ports here.
    fn prepare(_node: &mut NodeState<Self>) {}
}

/// Processing function for node kind `T`. Runs once per block.
pub type ProcessFn<T> = fn(&mut NodeState<T>);

/// Everything a node owns at runtime.
#[derive(Clone, Default)]
pub struct NodeState<T: NodeDefinition> {
    /// The node's private state.
    pub state: T,
    /// Input ports, filled from connected outputs before each process call.
    pub input: T::Input,
    /// Output ports, written by the process function.
    pub output: T::Output,
    /// Current block context.
    pub context: ProcessContext,
}

/// Object-safe interface to a [`NodeState<T>`] of any kind.
///
/// This is the type-erased capability set the processor needs: run, expose
/// ports by index, accept input values, snapshot. Dropping the box destroys
/// the state.
pub trait ErasedState: Send {
    /// Id of the node kind.
    fn node_type(&self) -> NodeTypeId;
    /// Rust type name of the node kind.
    fn type_name(&self) -> &'static str;

    /// Runs the kind's processing function.
    fn process(&mut self);
    /// Replaces the block context and runs the kind's prepare hook.
    fn prepare(&mut self, context: ProcessContext);
    /// Updates the frame count for the next block.
    fn set_frame_count(&mut self, frames: usize);
    /// Current block context.
    fn context(&self) -> ProcessContext;

    /// Number of input ports.
    fn input_count(&self) -> usize;
    /// Number of output ports.
    fn output_count(&self) -> usize;
    /// Data type carried by input `port`.
    fn input_type(&self, port: usize) -> Option<TypeId>;
    /// Data type carried by output `port`.
    fn output_type(&self, port: usize) -> Option<TypeId>;

    /// Type-erased reference to output `port`.
    fn output(&self, port: usize) -> Option<&dyn Any>;
    /// Type-erased reference to input `port`.
    fn input(&self, port: usize) -> Option<&dyn Any>;
    /// Copies `value` into input `port`; false on range or type mismatch.
    fn set_input(&mut self, port: usize, value: &dyn Any) -> bool;
    /// Copies this node's own output `output_port` into its input `input_port`.
    fn loopback(&mut self, output_port: usize, input_port: usize) -> bool;

    /// Clones the full `{state, input, output, context}` into a [`NodeSnapshot`].
    fn snapshot(&self) -> NodeSnapshot;

    /// The underlying `NodeState<T>`.
    fn as_any(&self) -> &dyn Any;
    /// The underlying `NodeState<T>`, mutably.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A [`NodeState<T>`] paired with its kind's processing function.
pub(crate) struct TypedState<T: NodeDefinition> {
    node: NodeState<T>,
    process: ProcessFn<T>,
}

impl<T: NodeDefinition> TypedState<T> {
    pub(crate) fn new(process: ProcessFn<T>) -> Self {
        Self {
            node: NodeState::default(),
            process,
        }
    }
}

impl<T: NodeDefinition> ErasedState for TypedState<T> {
    fn node_type(&self) -> NodeTypeId {
        NodeTypeId::of::<T>()
    }

    fn type_name(&self) -> &'static str {
        core::any::type_name::<T>()
    }

    #[inline]
    fn process(&mut self) {
        (self.process)(&mut self.node);
    }

    fn prepare(&mut self, context: ProcessContext) {
        self.node.context = context;
        T::prepare(&mut self.node);
    }

    #[inline]
    fn set_frame_count(&mut self, frames: usize) {
        self.node.context.frame_count = frames;
    }

    fn context(&self) -> ProcessContext {
        self.node.context
    }

    fn input_count(&self) -> usize {
        T::Input::PORT_COUNT
    }

    fn output_count(&self) -> usize {
        T::Output::PORT_COUNT
    }

    fn input_type(&self, port: usize) -> Option<TypeId> {
        self.node.input.port(port).map(Any::type_id)
    }

    fn output_type(&self, port: usize) -> Option<TypeId> {
        self.node.output.port(port).map(Any::type_id)
    }

    #[inline]
    fn output(&self, port: usize) -> Option<&dyn Any> {
        self.node.output.port(port)
    }

    fn input(&self, port: usize) -> Option<&dyn Any> {
        self.node.input.port(port)
    }

    #[inline]
    fn set_input(&mut self, port: usize, value: &dyn Any) -> bool {
        self.node.input.set_port(port, value)
    }

    fn loopback(&mut self, output_port: usize, input_port: usize) -> bool {
        let NodeState { input, output, .. } = &mut self.node;
        match output.port(output_port) {
            Some(value) => input.set_port(input_port, value),
            None => false,
        }
    }

    fn snapshot(&self) -> NodeSnapshot {
        NodeSnapshot {
            node_type: NodeTypeId::of::<T>(),
            type_name: core::any::type_name::<T>(),
            value: Box::new(self.node.clone()),
        }
    }

    fn as_any(&self) -> &dyn Any {
        &self.node
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        &mut self.node
    }
}

/// A copied `NodeState<T>` that can cross threads.
///
/// Produced by [`NodeProcessor::get_node_state`](super::NodeProcessor::get_node_state)
/// for UI inspection of a running node without sharing live memory.
pub struct NodeSnapshot {
    node_type: NodeTypeId,
    type_name: &'static str,
    value: Box<dyn Any + Send>,
}

impl NodeSnapshot {
    /// Id of the node kind the snapshot was taken from.
    pub fn node_type(&self) -> NodeTypeId {
        self.node_type
    }

    /// Rust type name of the node kind.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns true if the snapshot holds a `NodeState<T>`.
    pub fn is<T: NodeDefinition>(&self) -> bool {
        self.value.is::<NodeState<T>>()
    }

    /// Borrows the snapshot as `NodeState<T>`.
    pub fn downcast_ref<T: NodeDefinition>(&self) -> Option<&NodeState<T>> {
        self.value.downcast_ref::<NodeState<T>>()
    }

    /// Unwraps the snapshot into `NodeState<T>`, or returns it unchanged on mismatch.
    pub fn downcast<T: NodeDefinition>(self) -> Result<NodeState<T>, Self> {
        let Self {
            node_type,
            type_name,
            value,
        } = self;
        match value.downcast::<NodeState<T>>() {
            Ok(node) => Ok(*node),
            Err(value) => Err(Self {
                node_type,
                type_name,
                value,
            }),
        }
    }
}

impl core::fmt::Debug for NodeSnapshot {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NodeSnapshot")
            .field("node_type", &self.node_type)
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}
