//! Audio I/O and render hosts for grainflow.
//!
//! This crate provides:
//!
//! - **WAV file I/O**: [`read_wav_stereo`] and [`write_wav_stereo`] via `hound`
//! - **Engine bridge**: [`EngineBridge`] carries commands to the audio thread
//!   and notifications back, handing payloads over by ownership
//! - **Graph host**: [`GraphHost`] plays a compiled node graph through an
//!   interleaved render callback
//! - **Granular sampler**: [`GranularSampler`] plays granular voices over
//!   128 note slots
//!
//! Both hosts expose the same callback shape,
//! `render(output, input, frame_count)`, filling `2 * frame_count`
//! interleaved stereo samples. Neither logs nor blocks inside `render`.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use grainflow_core::StereoBuffer;
//! use grainflow_granular::NoteParameters;
//! use grainflow_io::{EngineBridge, GranularSampler, Note, SamplerCommand, SamplerNotification};
//!
//! let bridge: EngineBridge<SamplerCommand, SamplerNotification> = EngineBridge::new();
//! let mut sampler = GranularSampler::new(48000.0, 256).with_endpoint(bridge.audio_endpoint());
//!
//! let source = Arc::new(StereoBuffer::from_mono(vec![0.25; 9600]));
//! bridge.send_command(SamplerCommand::SetNote {
//!     index: 0,
//!     note: Note::new(source, NoteParameters::default()),
//! });
//! bridge.send_command(SamplerCommand::PlayNote(0));
//!
//! // Normally called by the audio device.
//! let mut out = vec![0.0; 512];
//! sampler.render(&mut out, &[], 256);
//!
//! for notification in bridge.drain_notifications() {
//!     println!("{notification:?}");
//! }
//! ```

mod bridge;
mod events;
mod graph_host;
mod sampler;
mod wav;

pub use bridge::{AudioEndpoint, DEFAULT_NOTIFICATION_CAPACITY, EngineBridge, ReleaseQueue};
pub use events::{GraphCommand, GraphNotification, Note, SamplerCommand, SamplerNotification};
pub use graph_host::{GraphHost, MAX_SUBSCRIPTIONS};
pub use sampler::GranularSampler;
pub use wav::{WavFormat, WavInfo, WavSpec, read_wav_info, read_wav_stereo, write_wav_stereo};

/// Error types for audio I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// The requested sample format is not supported.
    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),
}

/// Convenience result type for audio I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
