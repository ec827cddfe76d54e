//! TOML descriptions of authoring graphs.
//!
//! A [`GraphPreset`] names nodes by their kind's display name and wires them by
//! port name. [`GraphPreset::resolve`] validates it against a [`NodeRegistry`]
//! and builds the [`NodeGraph`], plus the numeric input defaults to apply once
//! the graph is compiled.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use grainflow_core::{NodeGraph, NodeIndex, NodeProcessor, NodeRegistry, Point};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::file::{load_toml, save_toml};
use crate::validation::{ValidationError, validate_graph_preset};

/// One node of a [`GraphPreset`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodePreset {
    /// Unique name within the preset; connections refer to it.
    pub name: String,

    /// Display name of the node kind (case-insensitive).
    #[serde(rename = "type")]
    pub node_type: String,

    /// Editor x position.
    #[serde(default)]
    pub x: f32,

    /// Editor y position.
    #[serde(default)]
    pub y: f32,

    /// Keep the node running even when nothing consumes its outputs.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub always_active: bool,

    /// Numeric input values applied after compilation, by port name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub inputs: BTreeMap<String, f32>,
}

impl NodePreset {
    /// Create a node of kind `node_type` named `name`.
    pub fn new(name: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            node_type: node_type.into(),
            x: 0.0,
            y: 0.0,
            always_active: false,
            inputs: BTreeMap::new(),
        }
    }

    /// Set an input's value.
    pub fn with_input(mut self, port: impl Into<String>, value: f32) -> Self {
        self.inputs.insert(port.into(), value);
        self
    }

    /// Set the editor position.
    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.x = x;
        self.y = y;
        self
    }
}

/// One connection of a [`GraphPreset`], from an output port to an input port.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectionPreset {
    /// Source node name.
    pub from: String,
    /// Output port name on the source node.
    pub output: String,
    /// Target node name.
    pub to: String,
    /// Input port name on the target node.
    pub input: String,
}

impl ConnectionPreset {
    /// Create a connection `from.output -> to.input`.
    pub fn new(
        from: impl Into<String>,
        output: impl Into<String>,
        to: impl Into<String>,
        input: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            output: output.into(),
            to: to.into(),
            input: input.into(),
        }
    }
}

/// A serializable authoring graph.
///
/// # TOML Format
///
/// ```toml
/// name = "Wobble"
/// output = "osc"
///
/// [[nodes]]
/// name = "lfo"
/// type = "SineLfo"
/// [nodes.inputs]
/// frequency = 2.0
/// amplitude = 40.0
/// offset = 220.0
///
/// [[nodes]]
/// name = "osc"
/// type = "SineOsc"
///
/// [[connections]]
/// from = "lfo"
/// output = "value"
/// to = "osc"
/// input = "frequency"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphPreset {
    /// Name of the preset.
    pub name: String,

    /// Optional description of the preset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Node whose stereo output a host plays.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Nodes, in insertion order.
    #[serde(default)]
    pub nodes: Vec<NodePreset>,

    /// Connections, applied in order after every node exists.
    #[serde(default)]
    pub connections: Vec<ConnectionPreset>,
}

impl Default for GraphPreset {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

impl GraphPreset {
    /// Create a new empty preset.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            output: None,
            nodes: Vec::new(),
            connections: Vec::new(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a node.
    pub fn with_node(mut self, node: NodePreset) -> Self {
        self.nodes.push(node);
        self
    }

    /// Add a connection.
    pub fn with_connection(mut self, connection: ConnectionPreset) -> Self {
        self.connections.push(connection);
        self
    }

    /// Name the node a host should play.
    pub fn with_output(mut self, node: impl Into<String>) -> Self {
        self.output = Some(node.into());
        self
    }

    /// Load a preset from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        load_toml(path.as_ref())
    }

    /// Load a preset from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the preset to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        save_toml(path.as_ref(), self)
    }

    /// Convert the preset to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// The first node named `name`.
    pub fn node(&self, name: &str) -> Option<&NodePreset> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// Check the preset against the kinds in `registry`.
    pub fn validate(&self, registry: &NodeRegistry) -> Result<(), ConfigError> {
        Ok(validate_graph_preset(self, registry)?)
    }

    /// Validate the preset and build its authoring graph.
    pub fn resolve(&self, registry: &NodeRegistry) -> Result<ResolvedGraph, ConfigError> {
        self.validate(registry)?;

        let mut graph = NodeGraph::new();
        let mut indices: HashMap<&str, NodeIndex> = HashMap::with_capacity(self.nodes.len());
        let mut overrides = Vec::new();

        for node in &self.nodes {
            let info = registry
                .find_by_name(&node.node_type)
                .ok_or_else(|| ValidationError::UnknownNodeType(node.node_type.clone()))?;
            let index = graph.add_node(info);
            graph.set_node_name(index, node.name.clone())?;
            graph.set_node_position(index, Point::new(node.x, node.y))?;
            if let Some(authoring) = graph.node_mut(index) {
                authoring.always_active = node.always_active;
            }

            for (port, &value) in &node.inputs {
                let port = info.input_index(port).ok_or_else(|| ValidationError::UnknownPort {
                    node: node.name.clone(),
                    port: port.clone(),
                    direction: grainflow_core::PortDirection::Input,
                })?;
                overrides.push(InputOverride {
                    node: index,
                    port,
                    value,
                });
            }
            indices.insert(node.name.as_str(), index);
        }

        for conn in &self.connections {
            let (from, output) =
                port_of(registry, &graph, &indices, &conn.from, &conn.output, false)?;
            let (to, input) = port_of(registry, &graph, &indices, &conn.to, &conn.input, true)?;
            graph.connect_nodes(from, output, to, input)?;
        }

        let output = self.output.as_deref().and_then(|name| indices.get(name).copied());

        tracing::debug!(
            preset = %self.name,
            nodes = graph.node_count(),
            connections = graph.connection_count(),
            overrides = overrides.len(),
            "resolved graph preset"
        );

        Ok(ResolvedGraph {
            graph,
            overrides,
            output,
        })
    }
}

fn port_of(
    registry: &NodeRegistry,
    graph: &NodeGraph,
    indices: &HashMap<&str, NodeIndex>,
    node: &str,
    port: &str,
    input: bool,
) -> Result<(NodeIndex, usize), ConfigError> {
    let index = *indices
        .get(node)
        .ok_or_else(|| ValidationError::UnknownNode(node.to_string()))?;
    let info = graph
        .node(index)
        .and_then(|n| registry.try_node_info(n.type_id))
        .ok_or_else(|| ValidationError::UnknownNode(node.to_string()))?;
    let (found, direction) = if input {
        (info.input_index(port), grainflow_core::PortDirection::Input)
    } else {
        (info.output_index(port), grainflow_core::PortDirection::Output)
    };
    let port_index = found.ok_or_else(|| ValidationError::UnknownPort {
        node: node.to_string(),
        port: port.to_string(),
        direction,
    })?;
    Ok((index, port_index))
}

/// A numeric input value to write after compilation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputOverride {
    /// Target node.
    pub node: NodeIndex,
    /// Input port index.
    pub port: usize,
    /// Value to write.
    pub value: f32,
}

/// Result of [`GraphPreset::resolve`].
#[derive(Debug, Clone)]
pub struct ResolvedGraph {
    /// The authoring graph.
    pub graph: NodeGraph,
    /// Input values to write into the compiled processor.
    pub overrides: Vec<InputOverride>,
    /// Node a host should play, if the preset named one.
    pub output: Option<NodeIndex>,
}

impl ResolvedGraph {
    /// Writes every input override into `processor`. Returns how many were
    /// applied; overrides for nodes that were not compiled are skipped.
    pub fn apply(&self, processor: &mut NodeProcessor) -> usize {
        self.overrides
            .iter()
            .filter(|o| processor.set_input(o.node, o.port, &o.value))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grainflow_core::NodeGraphCompiler;
    use grainflow_core::nodes::{AddFloat, ConstantFloat, SineLfo, register_builtin_nodes};

    fn registry() -> NodeRegistry {
        let mut registry = NodeRegistry::new();
        register_builtin_nodes(&mut registry);
        registry
    }

    const WOBBLE: &str = r#"
name = "Wobble"
output = "osc"

[[nodes]]
name = "lfo"
type = "SineLfo"
x = 10.0
[nodes.inputs]
frequency = 2.0
offset = 220.0

[[nodes]]
name = "osc"
type = "sineosc"

[[connections]]
from = "lfo"
output = "value"
to = "osc"
input = "frequency"
"#;

    #[test]
    fn test_parse_and_resolve() {
        let reg = registry();
        let preset = GraphPreset::from_toml(WOBBLE).unwrap();
        assert_eq!(preset.nodes.len(), 2);
        assert_eq!(preset.node("lfo").map(|n| n.x), Some(10.0));

        let resolved = preset.resolve(&reg).unwrap();
        assert_eq!(resolved.graph.node_count(), 2);
        assert_eq!(resolved.graph.connection_count(), 1);
        assert_eq!(resolved.overrides.len(), 2);

        let osc = resolved.graph.find_node("osc").unwrap();
        assert_eq!(resolved.output, Some(osc));
        let lfo = resolved.graph.find_node("lfo").unwrap();
        assert_eq!(resolved.graph.node(lfo).unwrap().position, Point::new(10.0, 0.0));
    }

    #[test]
    fn test_overrides_reach_compiled_nodes() {
        let reg = registry();
        let resolved = GraphPreset::from_toml(WOBBLE).unwrap().resolve(&reg).unwrap();
        let mut processor = NodeProcessor::new(2048);
        NodeGraphCompiler::new(&reg).build(&resolved.graph, &mut processor);
        assert_eq!(resolved.apply(&mut processor), 2);

        let lfo = resolved.graph.find_node("lfo").unwrap();
        let state = processor.get_node::<SineLfo>(lfo);
        assert_eq!(state.input.frequency, 2.0);
        assert_eq!(state.input.offset, 220.0);
        assert_eq!(state.input.amplitude, 1.0);
    }

    #[test]
    fn test_builder_round_trips_through_toml() {
        let preset = GraphPreset::new("Sum")
            .with_description("two constants")
            .with_node(NodePreset::new("a", "ConstantFloat").with_input("value", 1.5))
            .with_node(NodePreset::new("b", "ConstantFloat").at(5.0, 6.0))
            .with_node(NodePreset::new("sum", "AddFloat"))
            .with_connection(ConnectionPreset::new("a", "value", "sum", "a"))
            .with_connection(ConnectionPreset::new("b", "value", "sum", "b"));
        let toml_str = preset.to_toml().unwrap();
        assert_eq!(GraphPreset::from_toml(&toml_str).unwrap(), preset);

        let reg = registry();
        let resolved = preset.resolve(&reg).unwrap();
        let mut processor = NodeProcessor::new(2048);
        NodeGraphCompiler::new(&reg)
            .with_order(grainflow_core::CompileOrder::Topological)
            .build(&resolved.graph, &mut processor);
        resolved.apply(&mut processor);
        let b = resolved.graph.find_node("b").unwrap();
        processor.get_node_mut::<ConstantFloat>(b).input.value = 2.0;
        processor.process();

        let sum = resolved.graph.find_node("sum").unwrap();
        assert_eq!(processor.get_node::<AddFloat>(sum).output.sum, 3.5);
    }

    #[test]
    fn test_invalid_preset_is_rejected_before_building() {
        let preset = GraphPreset::new("bad").with_node(NodePreset::new("x", "Reverb"));
        assert!(matches!(
            preset.resolve(&registry()),
            Err(ConfigError::Validation(ValidationError::UnknownNodeType(_)))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wobble.toml");
        let preset = GraphPreset::from_toml(WOBBLE).unwrap();
        preset.save(&path).unwrap();
        assert_eq!(GraphPreset::load(&path).unwrap(), preset);
    }
}
