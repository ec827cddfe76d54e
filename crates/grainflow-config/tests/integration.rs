//! Integration tests for grainflow-config.
//!
//! Preset files on disk through resolution, compilation, and rendering.

use grainflow_config::{
    ConfigError, ConnectionPreset, EngineConfig, GraphPreset, NodePreset, NotePreset,
    ValidationError,
};
use grainflow_core::nodes::{SineOsc, register_builtin_nodes};
use grainflow_core::{NodeGraphCompiler, NodeProcessor, NodeRegistry};
use grainflow_granular::{GrainSamplerVoice, Voice};
use std::sync::Arc;
use tempfile::TempDir;

fn registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();
    register_builtin_nodes(&mut registry);
    registry
}

#[test]
fn test_graph_preset_file_renders_audio() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("presets").join("tone.toml");

    GraphPreset::new("Tone")
        .with_node(
            NodePreset::new("lfo", "SineLfo")
                .with_input("amplitude", 0.0)
                .with_input("offset", 440.0),
        )
        .with_node(NodePreset::new("osc", "SineOsc").with_input("amplitude", 0.25))
        .with_connection(ConnectionPreset::new("lfo", "value", "osc", "frequency"))
        .with_output("osc")
        .save(&path)
        .unwrap();

    let config = EngineConfig::default();
    let reg = registry();
    let resolved = GraphPreset::load(&path).unwrap().resolve(&reg).unwrap();

    let mut processor = NodeProcessor::new(config.arena_capacity);
    processor.prepare(config.sample_rate_hz(), config.block_size);
    NodeGraphCompiler::new(&reg)
        .with_order(config.compile_order.into())
        .build(&resolved.graph, &mut processor);
    assert_eq!(resolved.apply(&mut processor), 3);

    processor.process_block(config.block_size);
    let osc = resolved.output.unwrap();
    let out = &processor.get_node::<SineOsc>(osc).output.output;
    assert!(out.peak() > 0.2 && out.peak() <= 0.25 + 1e-6);
}

#[test]
fn test_engine_config_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("engine.toml");
    std::fs::write(&path, "sample_rate = 44100\ncompile_order = \"topological\"\n").unwrap();

    let config = EngineConfig::load(&path).unwrap();
    assert_eq!(config.sample_rate, 44100);
    assert_eq!(config.block_size, 256);

    let copy = dir.path().join("copy.toml");
    config.save(&copy).unwrap();
    assert_eq!(EngineConfig::load(&copy).unwrap(), config);
}

#[test]
fn test_missing_file_reports_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nope.toml");
    let err = GraphPreset::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ReadFile { .. }));
    assert!(err.to_string().contains("nope.toml"));
}

#[test]
fn test_bad_port_in_file_is_a_validation_error() {
    let toml_str = r#"
name = "Broken"

[[nodes]]
name = "osc"
type = "SineOsc"

[[connections]]
from = "osc"
output = "left"
to = "osc"
input = "frequency"
"#;
    let preset = GraphPreset::from_toml(toml_str).unwrap();
    match preset.resolve(&registry()) {
        Err(ConfigError::Validation(ValidationError::UnknownPort { port, .. })) => {
            assert_eq!(port, "left");
        }
        other => panic!("expected unknown port, got {other:?}"),
    }
}

#[test]
fn test_note_preset_drives_sampler_voice() {
    let preset =
        NotePreset::from_toml("amp = 0.5\ngrain_size_ms = 10.0\noverlap = 0.0\nloop = false")
            .unwrap();
    let source = Arc::new(grainflow_core::StereoBuffer::from_mono(vec![1.0; 40]));
    let mut voice = GrainSamplerVoice::new(source, &preset.to_note_parameters(), 1000.0);

    let mut block = grainflow_core::StereoBuffer::new(8);
    voice.process(&mut block);
    assert!(block.left.iter().all(|&s| (s - 0.5).abs() < 1e-6));
    assert!(!voice.time_stretch().is_looping());
}
