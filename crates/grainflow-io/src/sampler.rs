//! Polyphonic granular sampler render processor.

use std::sync::Arc;

use grainflow_config::EngineConfig;
use grainflow_core::StereoBuffer;
use grainflow_granular::{GrainSamplerVoice, NOTE_COUNT, NoteIndex, ParameterType, VoiceManager};

use crate::bridge::{AudioEndpoint, ReleaseQueue};
use crate::events::{Note, SamplerCommand, SamplerNotification};

/// Plays granular voices over a bank of [`NOTE_COUNT`] note slots.
///
/// Each slot holds a [`Note`]: a shared source buffer and its playback
/// parameters. Playing a slot starts a [`GrainSamplerVoice`] on it; voices
/// that reach the end of a non-looping source are removed by the voice
/// manager. The rendered mix is scaled by a global gain.
///
/// With an endpoint attached, every note, note array and voice the sampler
/// lets go of is sent back as a notification so it is freed off the audio
/// thread. A full channel parks them in a [`ReleaseQueue`] until a later
/// render call.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use grainflow_core::StereoBuffer;
/// use grainflow_granular::NoteParameters;
/// use grainflow_io::{GranularSampler, Note};
///
/// let source = Arc::new(StereoBuffer::from_mono(vec![0.5; 4800]));
/// let mut sampler = GranularSampler::new(48000.0, 256);
/// sampler.set_note(0, Note::new(source, NoteParameters::default()));
/// assert!(sampler.play_note(0));
///
/// let mut out = vec![0.0; 512];
/// sampler.render(&mut out, &[], 256);
/// assert!(out.iter().any(|&s| s != 0.0));
/// ```
pub struct GranularSampler {
    notes: Vec<Note>,
    voices: VoiceManager<GrainSamplerVoice>,
    amp: f32,
    paused: bool,
    sample_rate: f32,
    mix: StereoBuffer,
    max_frames: usize,
    endpoint: Option<AudioEndpoint<SamplerCommand, SamplerNotification>>,
    released: ReleaseQueue<SamplerNotification>,
}

impl GranularSampler {
    /// Create a sampler rendering at `sample_rate` in passes of at most
    /// `max_frames` frames.
    pub fn new(sample_rate: f32, max_frames: usize) -> Self {
        let max_frames = max_frames.max(1);
        Self {
            notes: vec![Note::default(); NOTE_COUNT],
            voices: VoiceManager::with_capacity(NOTE_COUNT),
            amp: 1.0,
            paused: false,
            sample_rate,
            mix: StereoBuffer::new(max_frames),
            max_frames,
            endpoint: None,
            released: ReleaseQueue::default(),
        }
    }

    /// Create a sampler with the sample rate and block size from `config`.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.sample_rate_hz(), config.block_size)
    }

    /// Attach the audio side of a bridge.
    pub fn with_endpoint(
        mut self,
        endpoint: AudioEndpoint<SamplerCommand, SamplerNotification>,
    ) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Apply one command.
    pub fn handle_command(&mut self, command: SamplerCommand) {
        match command {
            SamplerCommand::ParameterChange { param, value } => self.parameter_change(param, value),
            SamplerCommand::NoteParameterChange { note, param, value } => {
                self.note_parameter_change(note, param, value);
            }
            SamplerCommand::SetNote { index, note } => {
                if let Some(previous) = self.set_note(index, note) {
                    self.send(SamplerNotification::ReleasedNote(previous));
                }
            }
            SamplerCommand::SetNoteArray(notes) => {
                let released = self.set_note_array(notes);
                self.send(SamplerNotification::ReleasedNotes(released));
            }
            SamplerCommand::PlayNote(note) => {
                self.play_note(note);
            }
            SamplerCommand::StopNote(note) => self.stop_note(note),
            SamplerCommand::StopAllNotes => self.stop_all_notes(),
            SamplerCommand::TogglePause => self.toggle_pause(),
        }
    }

    /// Start a voice on `note`. Empty or out-of-range slots are ignored and
    /// return false. A voice already on the slot is replaced.
    pub fn play_note(&mut self, note: NoteIndex) -> bool {
        let Some(slot) = self.notes.get(note as usize) else {
            return false;
        };
        let Some(source) = slot.buffer.as_ref().filter(|b| !b.is_empty()) else {
            return false;
        };
        let voice = GrainSamplerVoice::new(Arc::clone(source), &slot.parameters, self.sample_rate);
        if let Some(voice) = self.voices.add_voice(note, voice) {
            self.send(SamplerNotification::ReleasedVoice { note, voice });
        }
        self.send(SamplerNotification::NotePlayed(note));
        true
    }

    /// Stop the voice on `note`, if any. Always notifies.
    pub fn stop_note(&mut self, note: NoteIndex) {
        if let Some(voice) = self.voices.stop_voice(note) {
            self.send(SamplerNotification::ReleasedVoice { note, voice });
        }
        self.send(SamplerNotification::NoteStopped(note));
    }

    /// Stop every voice.
    pub fn stop_all_notes(&mut self) {
        let endpoint = self.endpoint.as_ref();
        let released = &mut self.released;
        self.voices.stop_all_with(|note, voice| {
            if let Some(endpoint) = endpoint {
                released.send(endpoint, SamplerNotification::ReleasedVoice { note, voice });
            }
        });
        self.send(SamplerNotification::AllNotesStopped);
    }

    /// Replace slot `index`. Returns the previous contents, or `None` if
    /// `index` is out of range.
    pub fn set_note(&mut self, index: NoteIndex, note: Note) -> Option<Note> {
        self.notes
            .get_mut(index as usize)
            .map(|slot| core::mem::replace(slot, note))
    }

    /// Replace slots `0..notes.len()` with `notes`. Entries past
    /// [`NOTE_COUNT`] are ignored. Returns the same vector holding the
    /// replaced contents.
    pub fn set_note_array(&mut self, mut notes: Vec<Note>) -> Vec<Note> {
        for (slot, note) in self.notes.iter_mut().zip(notes.iter_mut()) {
            core::mem::swap(slot, note);
        }
        notes
    }

    /// Update one parameter of a stored note and of its voice, if sounding.
    pub fn note_parameter_change(&mut self, note: NoteIndex, param: ParameterType, value: f32) {
        let Some(slot) = self.notes.get_mut(note as usize) else {
            return;
        };
        slot.parameters.set(param, value);
        if let Some(voice) = self.voices.get_voice_for_note_mut(note) {
            voice.set_parameter(param, slot.parameters.get(param));
        }
    }

    /// Global parameter change. Only [`ParameterType::Amp`] has a global
    /// meaning; other parameters are ignored.
    pub fn parameter_change(&mut self, param: ParameterType, value: f32) {
        if param == ParameterType::Amp {
            self.amp = value;
        }
    }

    /// Pause or resume. A paused sampler renders silence and keeps its
    /// voices where they are.
    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Render `frame_count` interleaved stereo frames into `output`.
    ///
    /// Pending commands are applied first. Frames beyond `output.len() / 2`
    /// are skipped. `_input` is ignored.
    pub fn render(&mut self, output: &mut [f32], _input: &[f32], frame_count: usize) {
        if let Some(endpoint) = &self.endpoint {
            self.released.flush(endpoint);
        }
        while let Some(command) = self.endpoint.as_ref().and_then(AudioEndpoint::poll) {
            self.handle_command(command);
        }

        let frames = frame_count.min(output.len() / 2);
        if self.paused {
            output[..frames * 2].fill(0.0);
            return;
        }

        let mut done = 0;
        while done < frames {
            let n = (frames - done).min(self.max_frames);
            self.mix.resize(n);
            self.mix.clear();
            let endpoint = self.endpoint.as_ref();
            let released = &mut self.released;
            self.voices.process_with(&mut self.mix, |note, voice| {
                if let Some(endpoint) = endpoint {
                    released.send(endpoint, SamplerNotification::ReleasedVoice { note, voice });
                }
            });
            self.mix.apply_gain(self.amp);
            self.mix.write_interleaved(&mut output[done * 2..(done + n) * 2], n);
            done += n;
        }
    }

    /// Note in slot `index`.
    pub fn note(&self, index: NoteIndex) -> Option<&Note> {
        self.notes.get(index as usize)
    }

    /// All note slots.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// The voice manager.
    pub fn voices(&self) -> &VoiceManager<GrainSamplerVoice> {
        &self.voices
    }

    /// Global gain.
    pub fn amp(&self) -> f32 {
        self.amp
    }

    /// Returns true while paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Notifications still waiting for room in the channel.
    pub fn pending_releases(&self) -> usize {
        self.released.len()
    }

    /// Sample rate voices are created with.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn send(&mut self, notification: SamplerNotification) {
        if let Some(endpoint) = &self.endpoint {
            self.released.send(endpoint, notification);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::EngineBridge;
    use grainflow_granular::NoteParameters;

    fn one_shot(frames: usize, level: f32) -> Note {
        let params = NoteParameters {
            looping: false,
            ..NoteParameters::default()
        };
        Note::new(Arc::new(StereoBuffer::from_mono(vec![level; frames])), params)
    }

    #[test]
    fn test_empty_slot_does_not_play() {
        let mut sampler = GranularSampler::new(48000.0, 64);
        assert!(!sampler.play_note(3));
        assert!(!sampler.play_note(NOTE_COUNT as NoteIndex));
        assert!(sampler.voices().is_empty());
    }

    #[test]
    fn test_render_silence_without_voices() {
        let mut sampler = GranularSampler::new(48000.0, 64);
        let mut out = vec![1.0; 256];
        sampler.render(&mut out, &[], 128);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_one_shot_voice_finishes() {
        let mut sampler = GranularSampler::new(48000.0, 256);
        sampler.set_note(0, one_shot(2400, 0.5));
        assert!(sampler.play_note(0));
        assert_eq!(sampler.voices().active_count(), 1);

        let mut out = vec![0.0; 512];
        for _ in 0..200 {
            sampler.render(&mut out, &[], 256);
            if sampler.voices().is_empty() {
                break;
            }
        }
        assert!(sampler.voices().is_empty());
    }

    #[test]
    fn test_global_amp_scales_output() {
        let mut loud = GranularSampler::new(48000.0, 64);
        let mut quiet = GranularSampler::new(48000.0, 64);
        for sampler in [&mut loud, &mut quiet] {
            let source = Arc::new(StereoBuffer::from_mono(vec![0.5; 4800]));
            sampler.set_note(1, Note::new(source, NoteParameters::default()));
            sampler.play_note(1);
        }
        quiet.parameter_change(ParameterType::Amp, 0.5);
        quiet.parameter_change(ParameterType::Pitch, 12.0);
        assert_eq!(quiet.amp(), 0.5);

        let mut a = vec![0.0; 400];
        let mut b = vec![0.0; 400];
        loud.render(&mut a, &[], 200);
        quiet.render(&mut b, &[], 200);
        for (x, y) in a.iter().zip(&b) {
            assert!((x * 0.5 - y).abs() < 1e-6);
        }
    }

    #[test]
    fn test_note_parameter_change_reaches_voice() {
        let mut sampler = GranularSampler::new(48000.0, 64);
        sampler.set_note(2, one_shot(4800, 0.5));
        sampler.play_note(2);
        sampler.note_parameter_change(2, ParameterType::Stretch, 2.0);
        sampler.note_parameter_change(2, ParameterType::Amp, 0.25);

        assert_eq!(sampler.note(2).unwrap().parameters.stretch, 2.0);
        let voice = sampler.voices().get_voice_for_note(2).unwrap();
        assert_eq!(voice.time_stretch().stretch(), 2.0);
        assert_eq!(voice.amp(), 0.25);
    }

    #[test]
    fn test_pause_keeps_voices() {
        let mut sampler = GranularSampler::new(48000.0, 64);
        sampler.set_note(0, one_shot(4800, 0.5));
        sampler.play_note(0);
        sampler.toggle_pause();

        let mut out = vec![1.0; 128];
        sampler.render(&mut out, &[], 64);
        assert!(out.iter().all(|&s| s == 0.0));
        assert_eq!(sampler.voices().active_count(), 1);

        sampler.toggle_pause();
        assert!(!sampler.is_paused());
    }

    #[test]
    fn test_set_note_array_returns_replaced() {
        let mut sampler = GranularSampler::new(48000.0, 64);
        sampler.set_note(0, one_shot(10, 0.1));
        let released = sampler.set_note_array(vec![one_shot(20, 0.2), one_shot(30, 0.3)]);

        assert_eq!(released.len(), 2);
        assert_eq!(released[0].len(), 10);
        assert!(released[1].is_empty());
        assert_eq!(sampler.note(0).unwrap().len(), 20);
        assert_eq!(sampler.note(1).unwrap().len(), 30);
    }

    #[test]
    fn test_commands_through_bridge() {
        let bridge: EngineBridge<SamplerCommand, SamplerNotification> = EngineBridge::new();
        let mut sampler = GranularSampler::new(48000.0, 64).with_endpoint(bridge.audio_endpoint());

        bridge.send_command(SamplerCommand::SetNote {
            index: 5,
            note: one_shot(4800, 0.5),
        });
        bridge.send_command(SamplerCommand::PlayNote(5));
        bridge.send_command(SamplerCommand::PlayNote(6));
        bridge.send_command(SamplerCommand::StopAllNotes);

        let mut out = vec![0.0; 128];
        sampler.render(&mut out, &[], 64);

        let notes = bridge.drain_notifications();
        assert!(matches!(notes[0], SamplerNotification::ReleasedNote(ref n) if n.is_empty()));
        assert!(matches!(notes[1], SamplerNotification::NotePlayed(5)));
        assert!(matches!(notes[2], SamplerNotification::ReleasedVoice { note: 5, .. }));
        assert!(matches!(notes[3], SamplerNotification::AllNotesStopped));
        assert_eq!(notes.len(), 4);
        assert!(sampler.voices().is_empty());
    }

    #[test]
    fn test_removed_voices_return_to_ui() {
        let bridge: EngineBridge<SamplerCommand, SamplerNotification> = EngineBridge::new();
        let mut sampler = GranularSampler::new(48000.0, 256).with_endpoint(bridge.audio_endpoint());
        sampler.set_note(0, one_shot(4800, 0.5));
        sampler.set_note(1, one_shot(2400, 0.5));

        sampler.play_note(0);
        sampler.play_note(0);
        sampler.stop_note(0);
        let notes = bridge.drain_notifications();
        let released: Vec<_> = notes
            .iter()
            .filter_map(|n| match n {
                SamplerNotification::ReleasedVoice { note, .. } => Some(*note),
                _ => None,
            })
            .collect();
        assert_eq!(released, vec![0, 0]);

        sampler.play_note(1);
        let mut out = vec![0.0; 512];
        for _ in 0..200 {
            sampler.render(&mut out, &[], 256);
            if sampler.voices().is_empty() {
                break;
            }
        }
        assert!(sampler.voices().is_empty());
        assert!(bridge.drain_notifications().iter().any(|n| matches!(
            n,
            SamplerNotification::ReleasedVoice { note: 1, .. }
        )));
    }

    #[test]
    fn test_full_channel_parks_released_voice() {
        let bridge: EngineBridge<SamplerCommand, SamplerNotification> =
            EngineBridge::with_capacity(1);
        let mut sampler = GranularSampler::new(48000.0, 64).with_endpoint(bridge.audio_endpoint());
        sampler.set_note(3, one_shot(4800, 0.5));

        sampler.play_note(3);
        sampler.stop_note(3);
        assert_eq!(sampler.pending_releases(), 2);
        assert!(matches!(bridge.try_receive(), Some(SamplerNotification::NotePlayed(3))));

        let mut out = vec![0.0; 128];
        sampler.render(&mut out, &[], 64);
        assert_eq!(sampler.pending_releases(), 1);
        assert!(matches!(
            bridge.try_receive(),
            Some(SamplerNotification::ReleasedVoice { note: 3, .. })
        ));

        sampler.render(&mut out, &[], 64);
        assert_eq!(sampler.pending_releases(), 0);
        assert!(matches!(bridge.try_receive(), Some(SamplerNotification::NoteStopped(3))));
    }
}
