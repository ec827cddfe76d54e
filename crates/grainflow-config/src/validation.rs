//! Range and reference checks for configuration and presets.
//!
//! Every validator collects all problems it finds rather than stopping at the
//! first; a single problem is returned as-is, several as
//! [`ValidationError::Multiple`].
//!
//! # Example
//!
//! ```rust
//! use grainflow_config::{NotePreset, validate_note_preset};
//!
//! let mut preset = NotePreset::default();
//! assert!(validate_note_preset(&preset).is_ok());
//!
//! preset.stretch = 0.5;
//! assert!(validate_note_preset(&preset).is_err());
//! ```

use std::any::TypeId;
use std::collections::HashSet;

use grainflow_core::{NodeRegistry, PortDirection};
use grainflow_granular::MAX_OVERLAP;
use thiserror::Error;

use crate::engine_config::EngineConfig;
use crate::graph_preset::GraphPreset;
use crate::note_preset::NotePreset;

/// Lowest accepted sample rate, in Hz.
pub const MIN_SAMPLE_RATE: u32 = 8000;
/// Highest accepted sample rate, in Hz.
pub const MAX_SAMPLE_RATE: u32 = 384_000;
/// Largest accepted block size, in frames.
pub const MAX_BLOCK_SIZE: usize = 8192;
/// Smallest accepted grain size, in milliseconds.
pub const MIN_GRAIN_SIZE_MS: f32 = 0.1;
/// Largest accepted grain size, in milliseconds.
pub const MAX_GRAIN_SIZE_MS: f32 = 2000.0;
/// Largest accepted time-stretch factor.
pub const MAX_STRETCH: f32 = 64.0;
/// Largest accepted pitch offset magnitude.
pub const MAX_PITCH: f32 = 8.0;
/// Largest accepted linear gain.
pub const MAX_AMP: f32 = 16.0;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Unknown node type.
    #[error("unknown node type: {0}")]
    UnknownNodeType(String),

    /// A connection names a node the preset does not declare.
    #[error("unknown node: {0}")]
    UnknownNode(String),

    /// Two nodes share a name.
    #[error("duplicate node name: {0}")]
    DuplicateNodeName(String),

    /// A port name does not exist on the node's kind.
    #[error("unknown {direction} port '{port}' on node '{node}'")]
    UnknownPort {
        /// Name of the node.
        node: String,
        /// Name of the unrecognized port.
        port: String,
        /// Side of the node the port was looked up on.
        direction: PortDirection,
    },

    /// A preset input default targets a port that does not carry `f32`.
    #[error("input '{port}' on node '{node}' carries {type_name}, not a number")]
    NonScalarPort {
        /// Name of the node.
        node: String,
        /// Name of the port.
        port: String,
        /// Type the port actually carries.
        type_name: String,
    },

    /// The output and input ports of a connection carry different types.
    #[error("cannot connect {from} ({output_type}) to {to} ({input_type})")]
    PortTypeMismatch {
        /// `node.port` on the output side.
        from: String,
        /// Type carried by the output port.
        output_type: String,
        /// `node.port` on the input side.
        to: String,
        /// Type carried by the input port.
        input_type: String,
    },

    /// Parameter value out of range.
    #[error("parameter '{param}' value {value} out of range [{min}, {max}]")]
    OutOfRange {
        /// Name of the parameter.
        param: String,
        /// The value that was out of range.
        value: f32,
        /// Minimum allowed value.
        min: f32,
        /// Maximum allowed value.
        max: f32,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Checks that `value` lies in `[min, max]`. NaN is always out of range.
pub fn validate_range(param: &str, value: f32, min: f32, max: f32) -> ValidationResult<()> {
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            param: param.to_string(),
            value,
            min,
            max,
        })
    }
}

fn collect(errors: Vec<ValidationError>) -> ValidationResult<()> {
    let mut errors = errors;
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}

/// Validates engine settings.
pub fn validate_engine_config(config: &EngineConfig) -> ValidationResult<()> {
    let checks = [
        validate_range(
            "sample_rate",
            config.sample_rate as f32,
            MIN_SAMPLE_RATE as f32,
            MAX_SAMPLE_RATE as f32,
        ),
        validate_range("block_size", config.block_size as f32, 1.0, MAX_BLOCK_SIZE as f32),
        validate_range(
            "subscription_interval_blocks",
            config.subscription_interval_blocks as f32,
            1.0,
            u16::MAX as f32,
        ),
    ];
    collect(checks.into_iter().filter_map(Result::err).collect())
}

/// Validates granular note settings.
pub fn validate_note_preset(preset: &NotePreset) -> ValidationResult<()> {
    let checks = [
        validate_range("amp", preset.amp, 0.0, MAX_AMP),
        validate_range("pitch", preset.pitch, -MAX_PITCH, MAX_PITCH),
        validate_range("stretch", preset.stretch, 1.0, MAX_STRETCH),
        validate_range("overlap", preset.overlap, 0.0, MAX_OVERLAP),
        validate_range(
            "grain_size_ms",
            preset.grain_size_ms,
            MIN_GRAIN_SIZE_MS,
            MAX_GRAIN_SIZE_MS,
        ),
    ];
    collect(checks.into_iter().filter_map(Result::err).collect())
}

/// Validates a graph preset against the node kinds in `registry`.
///
/// Checks node types, name uniqueness, connection endpoints and port names,
/// port type compatibility, and that input defaults target `f32` ports.
pub fn validate_graph_preset(
    preset: &GraphPreset,
    registry: &NodeRegistry,
) -> ValidationResult<()> {
    let mut errors = Vec::new();
    let mut names = HashSet::new();

    for node in &preset.nodes {
        if !names.insert(node.name.as_str()) {
            errors.push(ValidationError::DuplicateNodeName(node.name.clone()));
        }
        let Some(info) = registry.find_by_name(&node.node_type) else {
            errors.push(ValidationError::UnknownNodeType(node.node_type.clone()));
            continue;
        };
        for port in node.inputs.keys() {
            match info.input_index(port) {
                None => errors.push(ValidationError::UnknownPort {
                    node: node.name.clone(),
                    port: port.clone(),
                    direction: PortDirection::Input,
                }),
                Some(i) if info.inputs[i].data_type != TypeId::of::<f32>() => {
                    errors.push(ValidationError::NonScalarPort {
                        node: node.name.clone(),
                        port: port.clone(),
                        type_name: info.inputs[i].type_name.to_string(),
                    });
                }
                Some(_) => {}
            }
        }
    }

    for conn in &preset.connections {
        let from = lookup_port(preset, registry, &conn.from, &conn.output, PortDirection::Output);
        let to = lookup_port(preset, registry, &conn.to, &conn.input, PortDirection::Input);
        match (from, to) {
            (Ok(Some(out)), Ok(Some(inp))) if !out.is_compatible(&inp) => {
                errors.push(ValidationError::PortTypeMismatch {
                    from: format!("{}.{}", conn.from, conn.output),
                    output_type: out.type_name.to_string(),
                    to: format!("{}.{}", conn.to, conn.input),
                    input_type: inp.type_name.to_string(),
                });
            }
            (from, to) => {
                errors.extend(from.err());
                errors.extend(to.err());
            }
        }
    }

    if let Some(output) = &preset.output
        && !names.contains(output.as_str())
    {
        errors.push(ValidationError::UnknownNode(output.clone()));
    }

    collect(errors)
}

/// Resolves `node.port` to its descriptor. `Ok(None)` means the node's type is
/// unknown, which was already reported.
fn lookup_port(
    preset: &GraphPreset,
    registry: &NodeRegistry,
    node: &str,
    port: &str,
    direction: PortDirection,
) -> ValidationResult<Option<grainflow_core::PortDescriptor>> {
    let Some(node_preset) = preset.node(node) else {
        return Err(ValidationError::UnknownNode(node.to_string()));
    };
    let Some(info) = registry.find_by_name(&node_preset.node_type) else {
        return Ok(None);
    };
    let ports = match direction {
        PortDirection::Input => &info.inputs,
        PortDirection::Output => &info.outputs,
    };
    match ports.iter().find(|p| p.name == port) {
        Some(descriptor) => Ok(Some(*descriptor)),
        None => Err(ValidationError::UnknownPort {
            node: node.to_string(),
            port: port.to_string(),
            direction,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph_preset::{ConnectionPreset, NodePreset};
    use grainflow_core::nodes::register_builtin_nodes;

    fn registry() -> NodeRegistry {
        let mut registry = NodeRegistry::new();
        register_builtin_nodes(&mut registry);
        registry
    }

    #[test]
    fn test_range_bounds_inclusive() {
        assert!(validate_range("x", 0.0, 0.0, 1.0).is_ok());
        assert!(validate_range("x", 1.0, 0.0, 1.0).is_ok());
        assert!(validate_range("x", 1.5, 0.0, 1.0).is_err());
        assert!(validate_range("x", f32::NAN, 0.0, 1.0).is_err());
    }

    #[test]
    fn test_engine_config_errors_are_collected() {
        let config = EngineConfig {
            sample_rate: 100,
            block_size: 0,
            ..EngineConfig::default()
        };
        match validate_engine_config(&config) {
            Err(ValidationError::Multiple(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected two errors, got {other:?}"),
        }
        assert!(validate_engine_config(&EngineConfig::default()).is_ok());
    }

    #[test]
    fn test_note_preset_single_error_is_not_wrapped() {
        let preset = NotePreset {
            overlap: 0.75,
            ..NotePreset::default()
        };
        assert!(matches!(
            validate_note_preset(&preset),
            Err(ValidationError::OutOfRange { ref param, .. }) if param == "overlap"
        ));
    }

    #[test]
    fn test_graph_preset_valid() {
        let preset = GraphPreset::new("ok")
            .with_node(NodePreset::new("lfo", "SineLfo").with_input("frequency", 2.0))
            .with_node(NodePreset::new("osc", "SineOsc"))
            .with_connection(ConnectionPreset::new("lfo", "value", "osc", "frequency"))
            .with_output("osc");
        assert_eq!(validate_graph_preset(&preset, &registry()), Ok(()));
    }

    #[test]
    fn test_graph_preset_reports_every_problem() {
        let preset = GraphPreset::new("bad")
            .with_node(NodePreset::new("a", "ConstantFloat").with_input("nope", 1.0))
            .with_node(NodePreset::new("a", "Reverb"))
            .with_node(NodePreset::new("osc", "SineOsc"))
            .with_connection(ConnectionPreset::new("ghost", "value", "osc", "frequency"))
            .with_connection(ConnectionPreset::new("osc", "output", "osc", "frequency"))
            .with_output("missing");
        let Err(ValidationError::Multiple(errors)) = validate_graph_preset(&preset, &registry())
        else {
            panic!("expected multiple errors");
        };
        assert!(errors.contains(&ValidationError::DuplicateNodeName("a".into())));
        assert!(errors.contains(&ValidationError::UnknownNodeType("Reverb".into())));
        assert!(errors.contains(&ValidationError::UnknownNode("ghost".into())));
        assert!(errors.contains(&ValidationError::UnknownNode("missing".into())));
        assert!(errors.iter().any(
            |e| matches!(e, ValidationError::UnknownPort { port, .. } if port == "nope")
        ));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::PortTypeMismatch { .. })));
    }

    #[test]
    fn test_non_scalar_input_default_rejected() {
        let mut registry = registry();
        // A kind with a stereo-buffer input.
        #[derive(Default, Clone)]
        struct Sink;
        grainflow_core::node_ports! {
            struct SinkInput {
                signal: grainflow_core::StereoBuffer = grainflow_core::StereoBuffer::new(0)
            }
        }
        impl grainflow_core::NodeDefinition for Sink {
            type Input = SinkInput;
            type Output = ();
            const NAME: &'static str = "Sink";
        }
        registry.add_node::<Sink>(|_| {});

        let preset = GraphPreset::new("sink")
            .with_node(NodePreset::new("s", "Sink").with_input("signal", 1.0));
        assert!(matches!(
            validate_graph_preset(&preset, &registry),
            Err(ValidationError::NonScalarPort { .. })
        ));
    }
}
