//! Configuration and preset management for grainflow.
//!
//! # Features
//!
//! - **Engine Config**: Sample rate, block size, state budget, compile order
//! - **Graph Presets**: TOML descriptions of authoring graphs, resolved against a [`NodeRegistry`]
//! - **Note Presets**: Granular sampler note settings
//! - **Validation**: Range checks and node/port reference checks
//!
//! # Example
//!
//! ```rust
//! use grainflow_config::{ConnectionPreset, EngineConfig, GraphPreset, NodePreset};
//! use grainflow_core::nodes::register_builtin_nodes;
//! use grainflow_core::{NodeGraphCompiler, NodeProcessor, NodeRegistry};
//!
//! let mut registry = NodeRegistry::new();
//! register_builtin_nodes(&mut registry);
//!
//! let config = EngineConfig::default();
//! let preset = GraphPreset::new("Wobble")
//!     .with_node(NodePreset::new("lfo", "SineLfo").with_input("offset", 220.0))
//!     .with_node(NodePreset::new("osc", "SineOsc"))
//!     .with_connection(ConnectionPreset::new("lfo", "value", "osc", "frequency"))
//!     .with_output("osc");
//!
//! let resolved = preset.resolve(&registry).unwrap();
//! let mut processor = NodeProcessor::new(config.arena_capacity);
//! processor.prepare(config.sample_rate_hz(), config.block_size);
//! NodeGraphCompiler::new(&registry)
//!     .with_order(config.compile_order.into())
//!     .build(&resolved.graph, &mut processor);
//! resolved.apply(&mut processor);
//! processor.process_block(config.block_size);
//! ```

mod engine_config;
mod error;
mod file;
mod graph_preset;
mod note_preset;

/// Range and reference checks.
pub mod validation;

pub use engine_config::{CompileOrderConfig, EngineConfig};
pub use error::ConfigError;
pub use graph_preset::{ConnectionPreset, GraphPreset, InputOverride, NodePreset, ResolvedGraph};
pub use note_preset::NotePreset;
pub use validation::{
    ValidationError, ValidationResult, validate_engine_config, validate_graph_preset,
    validate_note_preset, validate_range,
};

/// Re-export commonly used types from grainflow-core
pub use grainflow_core::{NodeCategory, NodeRegistry, NodeTypeInfo};
