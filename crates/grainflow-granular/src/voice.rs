//! Voice lifecycle and per-note voice management.
//!
//! A [`Voice`] renders one note into a shared block. [`VoiceManager`] owns at
//! most one voice per note slot, drives every live voice each block, and
//! removes voices the moment they report [`VoiceState::Finished`].

use grainflow_core::StereoBuffer;

/// Number of note slots in a default [`VoiceManager`].
pub const NOTE_COUNT: usize = 128;

/// Index of a note slot.
pub type NoteIndex = u32;

/// Lifecycle stage of a voice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VoiceState {
    /// Created but not yet handed to a manager.
    #[default]
    Inactive,
    /// Sounding.
    Active,
    /// Fading out after a stop request.
    Releasing,
    /// Done; the manager removes it after the current block.
    Finished,
}

/// One sounding note.
pub trait Voice: Send {
    /// Adds this voice's next block into `buffer`.
    fn process(&mut self, buffer: &mut StereoBuffer);

    /// Current lifecycle stage.
    fn state(&self) -> VoiceState;

    /// Moves to a new lifecycle stage.
    fn set_state(&mut self, state: VoiceState);

    /// Starts releasing the voice.
    ///
    /// Release envelopes are not implemented; the voice finishes at once.
    fn begin_release(&mut self) {
        self.set_state(VoiceState::Finished);
    }
}

impl<V: Voice + ?Sized> Voice for Box<V> {
    fn process(&mut self, buffer: &mut StereoBuffer) {
        (**self).process(buffer);
    }

    fn state(&self) -> VoiceState {
        (**self).state()
    }

    fn set_state(&mut self, state: VoiceState) {
        (**self).set_state(state);
    }

    fn begin_release(&mut self) {
        (**self).begin_release();
    }
}

/// Monophonic-per-note voice manager.
///
/// Note slots are preallocated, so adding, stopping, and sweeping voices never
/// touches the heap beyond what the voices themselves own.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use grainflow_core::StereoBuffer;
/// use grainflow_granular::{GrainSamplerVoice, NoteParameters, VoiceManager};
///
/// let source = Arc::new(StereoBuffer::from_mono(vec![0.25; 4800]));
/// let mut manager: VoiceManager<GrainSamplerVoice> = VoiceManager::new();
/// manager.add_voice(60, GrainSamplerVoice::new(source, &NoteParameters::default(), 48000.0));
///
/// let mut block = StereoBuffer::new(256);
/// manager.process(&mut block);
/// assert_eq!(manager.active_count(), 1);
/// ```
pub struct VoiceManager<V: Voice = Box<dyn Voice>> {
    slots: Vec<Option<V>>,
    active: usize,
}

impl<V: Voice> Default for VoiceManager<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Voice> VoiceManager<V> {
    /// Creates a manager with [`NOTE_COUNT`] note slots.
    pub fn new() -> Self {
        Self::with_capacity(NOTE_COUNT)
    }

    /// Creates a manager with `notes` note slots.
    pub fn with_capacity(notes: usize) -> Self {
        Self {
            slots: (0..notes).map(|_| None).collect(),
            active: 0,
        }
    }

    /// Number of note slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Starts `voice` on `note`, replacing any voice already there.
    ///
    /// The voice is marked [`VoiceState::Active`] if it was inactive. Returns
    /// the displaced voice, if any.
    ///
    /// # Panics
    ///
    /// Panics if `note` is not below [`capacity`](Self::capacity).
    pub fn add_voice(&mut self, note: NoteIndex, mut voice: V) -> Option<V> {
        let slot = note as usize;
        assert!(
            slot < self.slots.len(),
            "note {note} out of range ({} slots)",
            self.slots.len()
        );
        if voice.state() == VoiceState::Inactive {
            voice.set_state(VoiceState::Active);
        }
        let displaced = self.slots[slot].replace(voice);
        if displaced.is_none() {
            self.active += 1;
        }
        displaced
    }

    /// Removes the voice on `note` immediately.
    pub fn stop_voice(&mut self, note: NoteIndex) -> Option<V> {
        let removed = self.slots.get_mut(note as usize).and_then(Option::take);
        if removed.is_some() {
            self.active -= 1;
        }
        removed
    }

    /// Removes every voice immediately.
    pub fn stop_all(&mut self) {
        self.stop_all_with(|_, _| {});
    }

    /// Removes every voice, handing each one to `release` with its note.
    pub fn stop_all_with(&mut self, mut release: impl FnMut(NoteIndex, V)) {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if let Some(voice) = slot.take() {
                release(i as NoteIndex, voice);
            }
        }
        self.active = 0;
    }

    /// The voice on `note`, if any.
    pub fn get_voice_for_note(&self, note: NoteIndex) -> Option<&V> {
        self.slots.get(note as usize).and_then(Option::as_ref)
    }

    /// The voice on `note`, mutably.
    pub fn get_voice_for_note_mut(&mut self, note: NoteIndex) -> Option<&mut V> {
        self.slots.get_mut(note as usize).and_then(Option::as_mut)
    }

    /// Notes with a live voice, ascending.
    pub fn active_notes(&self) -> impl Iterator<Item = NoteIndex> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_some())
            .map(|(i, _)| i as NoteIndex)
    }

    /// Number of live voices.
    pub fn active_count(&self) -> usize {
        self.active
    }

    /// Returns true if no voices are live.
    pub fn is_empty(&self) -> bool {
        self.active == 0
    }

    /// Adds every live voice's next block into `buffer`, then removes the
    /// voices that finished.
    pub fn process(&mut self, buffer: &mut StereoBuffer) {
        self.process_with(buffer, |_, _| {});
    }

    /// Like [`process`](Self::process), but finished voices are handed to
    /// `release` instead of dropped.
    pub fn process_with(
        &mut self,
        buffer: &mut StereoBuffer,
        mut release: impl FnMut(NoteIndex, V),
    ) {
        if self.active == 0 {
            return;
        }
        for (i, slot) in self.slots.iter_mut().enumerate() {
            let finished = match slot {
                Some(voice) => {
                    voice.process(buffer);
                    voice.state() == VoiceState::Finished
                }
                None => false,
            };
            if !finished {
                continue;
            }
            if let Some(voice) = slot.take() {
                release(i as NoteIndex, voice);
                self.active -= 1;
            }
        }
    }
}
