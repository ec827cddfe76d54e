//! Graph preset rendering command.

use super::{builtin_registry, frame_progress, load_engine_config};
use clap::Args;
use grainflow_config::GraphPreset;
use grainflow_core::{NodeGraphCompiler, NodeProcessor, StereoBuffer};
use grainflow_io::{GraphHost, WavSpec, write_wav_stereo};
use std::path::PathBuf;

#[derive(Args)]
pub struct GraphArgs {
    /// Graph preset file (TOML)
    #[arg(value_name = "PRESET")]
    preset: PathBuf,

    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Length to render, in seconds
    #[arg(short, long, default_value = "2.0")]
    seconds: f32,

    /// Engine config file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output bit depth (16, 24, or 32)
    #[arg(long, default_value = "32")]
    bit_depth: u16,
}

pub fn run(args: GraphArgs) -> anyhow::Result<()> {
    if !args.seconds.is_finite() || args.seconds <= 0.0 {
        anyhow::bail!("--seconds must be positive, got {}", args.seconds);
    }
    let config = load_engine_config(args.config.as_deref())?;
    let registry = builtin_registry();

    let preset = GraphPreset::load(&args.preset)?;
    println!("Loading preset: {}", preset.name);
    let resolved = preset.resolve(&registry)?;

    let mut processor = Box::new(NodeProcessor::new(config.arena_capacity));
    processor.prepare(config.sample_rate_hz(), config.block_size);
    let report = NodeGraphCompiler::new(&registry)
        .with_order(config.compile_order.into())
        .build(&resolved.graph, &mut processor);
    let applied = resolved.apply(&mut processor);
    tracing::info!(
        nodes = report.node_count,
        connections = report.connection_count,
        inputs = applied,
        bytes = report.arena_used,
        "compiled graph"
    );
    if !report.skipped_nodes.is_empty() {
        tracing::warn!(skipped = report.skipped_nodes.len(), "nodes in cycles were not compiled");
    }

    let mut host = GraphHost::from_config(&config);
    host.set_processor(processor, resolved.output);
    if host.output().is_none() {
        tracing::warn!("preset has no stereo output node; rendering silence");
    }

    let total = (args.seconds * config.sample_rate_hz()) as usize;
    println!(
        "Rendering {:.2}s at {} Hz ({} frames)...",
        args.seconds, config.sample_rate, total
    );

    let pb = frame_progress(total as u64)?;
    let mut interleaved = vec![0.0; total * 2];
    for (i, chunk) in interleaved.chunks_mut(config.block_size * 2).enumerate() {
        let frames = chunk.len() / 2;
        host.render(chunk, &[], frames);
        pb.set_position(((i + 1) * config.block_size).min(total) as u64);
    }
    pb.finish_with_message("done");

    let buffer = StereoBuffer::from_interleaved(&interleaved);
    let spec = WavSpec {
        channels: 2,
        sample_rate: config.sample_rate,
        bits_per_sample: args.bit_depth,
    };
    write_wav_stereo(&args.output, &buffer, spec)?;

    println!("Peak: {:.3}", buffer.peak());
    println!("Wrote {}", args.output.display());
    Ok(())
}
