//! Grainflow Granular - grain playback, time-stretching, and sampler voices
//!
//! Building blocks for granular re-synthesis of recorded audio:
//!
//! - [`envelope`] - Window functions and [`GrainWindow`] gain curves
//! - [`Grain`] / [`GrainStream`] - Windowed, delayed, variable-speed slices of a shared source
//! - [`GranularTimeStretch`] - Hop-scheduled grain train with independent stretch and pitch
//! - [`Voice`] / [`VoiceManager`] - Per-note voice lifecycle, one voice per note slot
//! - [`GrainSamplerVoice`] - A voice driving one [`GranularTimeStretch`] from [`NoteParameters`]
//!
//! Sources are shared as `Arc<StereoBuffer>`; a grain never copies audio.
//! Everything here runs on the audio thread, and nothing on the per-frame path
//! allocates once a stream has reached its steady-state grain count.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use grainflow_core::StereoBuffer;
//! use grainflow_granular::envelope::{generate_window, hann};
//! use grainflow_granular::{Grain, GrainStream, GrainWindow};
//!
//! let source = Arc::new(StereoBuffer::from_mono(vec![1.0; 64]));
//! let window = GrainWindow::Table(generate_window(hann, 32).into());
//!
//! let mut stream = GrainStream::new();
//! stream.add(Grain::new(Arc::clone(&source), window.clone()));
//! stream.add(Grain::new(source, window).with_delay(16));
//!
//! let mut out = StereoBuffer::new(48);
//! stream.process(&mut out);
//! assert!(stream.is_empty());
//! ```

pub mod envelope;
pub mod grain;
pub mod sampler_voice;
pub mod time_stretch;
pub mod voice;

pub use envelope::{EnvelopeFn, GrainWindow, WindowShape};
pub use grain::{Grain, GrainStream};
pub use sampler_voice::{GrainSamplerVoice, NoteParameters, ParameterType};
pub use time_stretch::{DEFAULT_GRAIN_SIZE, GranularTimeStretch, MAX_OVERLAP};
pub use voice::{NOTE_COUNT, NoteIndex, Voice, VoiceManager, VoiceState};
