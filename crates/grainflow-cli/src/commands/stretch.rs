//! Granular time-stretch command.

use super::frame_progress;
use clap::Args;
use grainflow_config::NotePreset;
use grainflow_core::StereoBuffer;
use grainflow_io::{GranularSampler, Note, WavSpec, read_wav_stereo, write_wav_stereo};
use std::path::PathBuf;
use std::sync::Arc;

/// Extra output allowed past the expected stretched length.
const TAIL_SECONDS: f32 = 1.0;

#[derive(Args)]
pub struct StretchArgs {
    /// Input WAV file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Note preset file (TOML); flags override its values
    #[arg(short, long)]
    preset: Option<PathBuf>,

    /// Pitch offset (positive raises, negative lowers)
    #[arg(long, allow_hyphen_values = true)]
    pitch: Option<f32>,

    /// Time-stretch factor, at least 1
    #[arg(long)]
    stretch: Option<f32>,

    /// Grain overlap fraction (0 to 0.5)
    #[arg(long)]
    overlap: Option<f32>,

    /// Grain size in milliseconds
    #[arg(long)]
    grain_ms: Option<f32>,

    /// Output gain
    #[arg(long)]
    amp: Option<f32>,

    /// Processing block size
    #[arg(long, default_value = "512")]
    block_size: usize,

    /// Output bit depth (16, 24, or 32)
    #[arg(long, default_value = "32")]
    bit_depth: u16,
}

impl StretchArgs {
    fn note_preset(&self) -> anyhow::Result<NotePreset> {
        let mut preset = match &self.preset {
            Some(path) => NotePreset::load(path)?,
            None => NotePreset::default(),
        };
        if let Some(pitch) = self.pitch {
            preset.pitch = pitch;
        }
        if let Some(stretch) = self.stretch {
            preset.stretch = stretch;
        }
        if let Some(overlap) = self.overlap {
            preset.overlap = overlap;
        }
        if let Some(ms) = self.grain_ms {
            preset.grain_size_ms = ms;
        }
        if let Some(amp) = self.amp {
            preset.amp = amp;
        }
        preset.looping = false;
        preset.validate()?;
        Ok(preset)
    }
}

pub fn run(args: StretchArgs) -> anyhow::Result<()> {
    if args.block_size == 0 {
        anyhow::bail!("--block-size must be at least 1");
    }
    let preset = args.note_preset()?;

    println!("Reading {}...", args.input.display());
    let (source, spec) = read_wav_stereo(&args.input)?;
    let sample_rate = spec.sample_rate as f32;
    println!(
        "  {} frames, {} Hz, {:.2}s",
        source.len(),
        spec.sample_rate,
        source.len() as f32 / sample_rate
    );
    if source.is_empty() {
        anyhow::bail!("{} has no audio", args.input.display());
    }

    let expected = (source.len() as f32 * preset.stretch) as usize;
    let limit = expected + (TAIL_SECONDS * sample_rate) as usize;

    let mut sampler = GranularSampler::new(sample_rate, args.block_size);
    sampler.set_note(0, Note::new(Arc::new(source), preset.to_note_parameters()));
    if !sampler.play_note(0) {
        anyhow::bail!("could not start playback");
    }
    tracing::debug!(?preset, expected, "stretching");

    println!("Stretching x{:.2}, pitch {:+.2}...", preset.stretch, preset.pitch);
    let pb = frame_progress(expected as u64)?;
    let mut interleaved = Vec::with_capacity(expected * 2);
    let mut block = vec![0.0; args.block_size * 2];
    let mut rendered = 0;
    while !sampler.voices().is_empty() {
        if rendered >= limit {
            tracing::warn!(rendered, "voice still sounding; truncating output");
            break;
        }
        sampler.render(&mut block, &[], args.block_size);
        interleaved.extend_from_slice(&block);
        rendered += args.block_size;
        pb.set_position(rendered.min(expected) as u64);
    }
    pb.finish_with_message("done");

    let buffer = StereoBuffer::from_interleaved(&interleaved);
    let out_spec = WavSpec {
        channels: 2,
        sample_rate: spec.sample_rate,
        bits_per_sample: args.bit_depth,
    };
    write_wav_stereo(&args.output, &buffer, out_spec)?;

    println!(
        "  {} frames, {:.2}s, peak {:.3}",
        buffer.len(),
        buffer.len() as f32 / sample_rate,
        buffer.peak()
    );
    println!("Wrote {}", args.output.display());
    Ok(())
}
