//! Granular note settings as stored in files.

use std::path::Path;

use grainflow_granular::NoteParameters;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::file::{load_toml, save_toml};
use crate::validation::validate_note_preset;

/// Playback settings for one sampler note.
///
/// # TOML Format
///
/// ```toml
/// amp = 0.8
/// pitch = -0.5
/// stretch = 2.0
/// overlap = 0.25
/// grain_size_ms = 40.0
/// loop = false
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NotePreset {
    /// Linear output gain.
    pub amp: f32,
    /// Pitch offset; positive raises, negative lowers.
    pub pitch: f32,
    /// Time-stretch factor, at least 1.
    pub stretch: f32,
    /// Grain overlap fraction in `[0, 0.5]`.
    pub overlap: f32,
    /// Grain size in milliseconds.
    pub grain_size_ms: f32,
    /// Loop the sample instead of stopping at its end.
    #[serde(rename = "loop")]
    pub looping: bool,
}

impl Default for NotePreset {
    fn default() -> Self {
        NoteParameters::default().into()
    }
}

impl From<NoteParameters> for NotePreset {
    fn from(p: NoteParameters) -> Self {
        Self {
            amp: p.amp,
            pitch: p.pitch,
            stretch: p.stretch,
            overlap: p.overlap,
            grain_size_ms: p.grain_size_ms,
            looping: p.looping,
        }
    }
}

impl NotePreset {
    /// Load a preset from a TOML file and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let preset: Self = load_toml(path.as_ref())?;
        preset.validate()?;
        Ok(preset)
    }

    /// Parse a preset from a TOML string and validate it.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let preset: Self = toml::from_str(toml_str)?;
        preset.validate()?;
        Ok(preset)
    }

    /// Save the preset to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        save_toml(path.as_ref(), self)
    }

    /// Convert the preset to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every setting against its accepted range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Ok(validate_note_preset(self)?)
    }

    /// The runtime parameters for this preset.
    pub fn to_note_parameters(&self) -> NoteParameters {
        NoteParameters {
            amp: self.amp,
            pitch: self.pitch,
            stretch: self.stretch,
            overlap: self.overlap,
            grain_size_ms: self.grain_size_ms,
            looping: self.looping,
        }
    }
}
