//! Granular sampler voice and its per-note parameters.

use std::sync::Arc;

use grainflow_core::StereoBuffer;

use crate::time_stretch::{GranularTimeStretch, MAX_OVERLAP};
use crate::voice::{Voice, VoiceState};

/// A note parameter addressed by parameter-change events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterType {
    /// Linear output gain.
    Amp,
    /// Pitch offset (see [`GranularTimeStretch::set_pitch`]).
    Pitch,
    /// Time-stretch factor, at least 1.
    Stretch,
    /// Grain overlap fraction in `[0, 0.5]`.
    Overlap,
    /// Grain size in milliseconds.
    GrainSize,
    /// Loop flag; any non-zero value enables looping.
    Loop,
}

impl ParameterType {
    /// All parameter types, in declaration order.
    pub const ALL: [ParameterType; 6] = [
        ParameterType::Amp,
        ParameterType::Pitch,
        ParameterType::Stretch,
        ParameterType::Overlap,
        ParameterType::GrainSize,
        ParameterType::Loop,
    ];

    /// Returns a human-readable name for the parameter.
    pub const fn name(&self) -> &'static str {
        match self {
            ParameterType::Amp => "amp",
            ParameterType::Pitch => "pitch",
            ParameterType::Stretch => "stretch",
            ParameterType::Overlap => "overlap",
            ParameterType::GrainSize => "grain_size",
            ParameterType::Loop => "loop",
        }
    }

    /// Looks a parameter up by [`name`](Self::name), ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
    }
}

/// Playback settings for one note.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteParameters {
    /// Linear output gain.
    pub amp: f32,
    /// Pitch offset.
    pub pitch: f32,
    /// Time-stretch factor, at least 1.
    pub stretch: f32,
    /// Grain overlap fraction.
    pub overlap: f32,
    /// Grain size in milliseconds.
    pub grain_size_ms: f32,
    /// Loop the source instead of finishing at its end.
    pub looping: bool,
}

impl Default for NoteParameters {
    fn default() -> Self {
        Self {
            amp: 1.0,
            pitch: 0.0,
            stretch: 1.0,
            overlap: 0.25,
            grain_size_ms: 25.0,
            looping: true,
        }
    }
}

impl NoteParameters {
    /// Updates one parameter. Out-of-range values are clamped.
    pub fn set(&mut self, param: ParameterType, value: f32) {
        match param {
            ParameterType::Amp => self.amp = value,
            ParameterType::Pitch => self.pitch = value,
            ParameterType::Stretch => self.stretch = value.max(1.0),
            ParameterType::Overlap => self.overlap = value.clamp(0.0, MAX_OVERLAP),
            ParameterType::GrainSize => self.grain_size_ms = value.max(0.0),
            ParameterType::Loop => self.looping = value != 0.0,
        }
    }

    /// Reads one parameter. The loop flag reads as 0 or 1.
    pub fn get(&self, param: ParameterType) -> f32 {
        match param {
            ParameterType::Amp => self.amp,
            ParameterType::Pitch => self.pitch,
            ParameterType::Stretch => self.stretch,
            ParameterType::Overlap => self.overlap,
            ParameterType::GrainSize => self.grain_size_ms,
            ParameterType::Loop => f32::from(u8::from(self.looping)),
        }
    }
}

/// Voice playing one source buffer through a [`GranularTimeStretch`].
#[derive(Debug, Clone)]
pub struct GrainSamplerVoice {
    time_stretch: GranularTimeStretch,
    amp: f32,
    state: VoiceState,
}

impl GrainSamplerVoice {
    /// Creates a voice over `source` configured from `params`.
    pub fn new(source: Arc<StereoBuffer>, params: &NoteParameters, sample_rate: f32) -> Self {
        let mut voice = Self {
            time_stretch: GranularTimeStretch::with_input(source, sample_rate),
            amp: 1.0,
            state: VoiceState::Inactive,
        };
        voice.apply(params);
        voice
    }

    /// Applies every parameter in `params`.
    pub fn apply(&mut self, params: &NoteParameters) {
        for param in ParameterType::ALL {
            self.set_parameter(param, params.get(param));
        }
    }

    /// Updates one parameter while the voice plays.
    pub fn set_parameter(&mut self, param: ParameterType, value: f32) {
        match param {
            ParameterType::Amp => self.amp = value,
            ParameterType::Pitch => self.time_stretch.set_pitch(value),
            ParameterType::Stretch => self.time_stretch.set_stretch(value.max(1.0)),
            ParameterType::Overlap => self.time_stretch.set_overlap(value),
            ParameterType::GrainSize => self.time_stretch.set_grain_size(value),
            ParameterType::Loop => self.time_stretch.set_loop(value != 0.0),
        }
    }

    /// Sets the output gain.
    pub fn set_amp(&mut self, amp: f32) {
        self.amp = amp;
    }

    /// Output gain.
    pub fn amp(&self) -> f32 {
        self.amp
    }

    /// The underlying time-stretch engine.
    pub fn time_stretch(&self) -> &GranularTimeStretch {
        &self.time_stretch
    }

    /// The underlying time-stretch engine, mutably.
    pub fn time_stretch_mut(&mut self) -> &mut GranularTimeStretch {
        &mut self.time_stretch
    }
}

impl Voice for GrainSamplerVoice {
    fn process(&mut self, buffer: &mut StereoBuffer) {
        self.time_stretch.mix_into(buffer, self.amp);
        if self.time_stretch.has_finished() {
            self.state = VoiceState::Finished;
        }
    }

    fn state(&self) -> VoiceState {
        self.state
    }

    fn set_state(&mut self, state: VoiceState) {
        self.state = state;
    }
}
