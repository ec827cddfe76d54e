//! Grainflow Core - typed dataflow graphs compiled for real-time execution
//!
//! This crate provides the node-graph engine that the rest of grainflow hosts:
//! node kinds are registered once with their typed input/output ports, composed
//! into an editable authoring graph, and compiled into a flat [`NodeProcessor`]
//! that executes inside an audio callback with zero allocation.
//!
//! # Core Abstractions
//!
//! ## Node Kinds
//!
//! - [`NodeDefinition`] - Per-kind state plus its `Input`/`Output` port structs
//! - [`node_ports!`] - Declares a port struct with ordered, typed, defaulted fields
//! - [`NodeRegistry`] - Maps a [`NodeTypeId`] to its [`NodeTypeInfo`] (ports, state size, allocator)
//!
//! ## Authoring
//!
//! - [`NodeGraph`] - Editable graph of nodes and port-to-port connections
//! - [`NodeGraph::process_order`] - Kahn topological order, cycles silently excluded
//!
//! ## Runtime
//!
//! - [`NodeGraphCompiler`] - One-shot translation from [`NodeGraph`] to [`NodeProcessor`]
//! - [`NodeProcessor`] - Compiled nodes, input bindings, and the state arena budget
//! - [`NodeSnapshot`] - Copied `{state, input, output}` for cross-thread inspection
//!
//! ## Built-in Nodes
//!
//! - [`nodes::ConstantFloat`], [`nodes::AddFloat`], [`nodes::SineLfo`], [`nodes::SineOsc`]
//!
//! # Example
//!
//! ```rust
//! use grainflow_core::nodes::{register_builtin_nodes, SineLfo, SineOsc};
//! use grainflow_core::{NodeGraph, NodeGraphCompiler, NodeProcessor, NodeRegistry};
//!
//! let mut registry = NodeRegistry::new();
//! register_builtin_nodes(&mut registry);
//!
//! let mut graph = NodeGraph::new();
//! let lfo = graph.add_node(registry.info_of::<SineLfo>());
//! let osc = graph.add_node(registry.info_of::<SineOsc>());
//! graph.connect_nodes(lfo, 0, osc, 0).unwrap();
//!
//! let mut processor = NodeProcessor::new(2048);
//! processor.prepare(48000.0, 256);
//! NodeGraphCompiler::new(&registry).build(&graph, &mut processor);
//!
//! processor.process_block(256);
//! let osc_state = processor.get_node::<SineOsc>(osc);
//! assert_eq!(osc_state.output.output.len(), 256);
//! ```
//!
//! # Logging
//!
//! Enable the `tracing` feature to get `debug!` events from graph edits and
//! compilation. The processing path never logs.

pub mod buffer;
pub mod graph;
pub mod math;
pub mod nodes;

pub use buffer::StereoBuffer;
pub use graph::{
    ARENA_ALIGN, ArenaBlock, AuthoringNode, CompileOrder, CompileReport, CompiledNode,
    Connection, ErasedState, GraphError, InputBinding, InputPort, NodeCategory, NodeDefinition,
    NodeGraph, NodeGraphCompiler, NodeIndex, NodeProcessor, NodeRegistry, NodeSnapshot, NodeState,
    NodeTypeId, NodeTypeInfo, OutputPort, Point, PortDescriptor, PortDirection, PortRef, PortSet,
    ProcessContext, ProcessFn, StateArena,
};
pub use math::{clamp, hz_to_omega, lerp, ms_to_samples, samples_to_ms};
