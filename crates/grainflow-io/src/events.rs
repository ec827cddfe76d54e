//! Commands and notifications exchanged with the audio hosts.

use std::sync::Arc;

use grainflow_core::{NodeGraph, NodeIndex, NodeProcessor, NodeSnapshot, StereoBuffer};
use grainflow_granular::{GrainSamplerVoice, NoteIndex, NoteParameters, ParameterType};

// --- Graph host ---

/// UI → [`GraphHost`](crate::GraphHost) commands.
#[derive(Debug)]
pub enum GraphCommand {
    /// Hand the authoring graph to the audio side. The previously held graph
    /// comes back as [`GraphNotification::ReleasedGraph`].
    AcquireGraph(Box<NodeGraph>),
    /// Swap in a freshly compiled processor. The previous one comes back as
    /// [`GraphNotification::ReleasedProcessor`].
    SetGraphProcessor {
        /// Compiled, prepared processor.
        processor: Box<NodeProcessor>,
        /// Node whose stereo output is played; silence if `None`.
        output: Option<NodeIndex>,
    },
    /// Start sending periodic snapshots of a node.
    NodeSubscribe(NodeIndex),
    /// Stop sending snapshots of a node.
    NodeUnsubscribe(NodeIndex),
}

/// [`GraphHost`](crate::GraphHost) → UI notifications.
#[derive(Debug)]
pub enum GraphNotification {
    /// A replaced processor, to be dropped off the audio thread.
    ReleasedProcessor(Box<NodeProcessor>),
    /// A replaced authoring graph, to be dropped off the audio thread.
    ReleasedGraph(Box<NodeGraph>),
    /// Periodic copy of a subscribed node's state.
    SubscriptionData {
        /// Subscribed node.
        node: NodeIndex,
        /// Copied `{state, input, output}`.
        snapshot: NodeSnapshot,
    },
}

// --- Granular sampler ---

/// One sampler note slot: a slice of a sample plus its playback settings.
#[derive(Debug, Clone, Default)]
pub struct Note {
    /// Audio for this note, or `None` for an empty slot.
    pub buffer: Option<Arc<StereoBuffer>>,
    /// Frame offset of the slice within the sample it was cut from.
    pub offset: u64,
    /// Playback settings.
    pub parameters: NoteParameters,
}

impl Note {
    /// A note playing all of `buffer`.
    pub fn new(buffer: Arc<StereoBuffer>, parameters: NoteParameters) -> Self {
        Self {
            buffer: Some(buffer),
            offset: 0,
            parameters,
        }
    }

    /// Sets the offset within the parent sample.
    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    /// Frames in the note's slice.
    pub fn len(&self) -> u64 {
        self.buffer.as_ref().map_or(0, |b| b.len() as u64)
    }

    /// Returns true if the slot has no audio.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// End of the slice within the parent sample (exclusive).
    pub fn end(&self) -> u64 {
        self.offset + self.len()
    }

    /// Returns true if parent-sample frame `pos` falls inside the slice.
    pub fn contains(&self, pos: u64) -> bool {
        pos >= self.offset && pos < self.end()
    }
}

/// UI → [`GranularSampler`](crate::GranularSampler) commands.
#[derive(Debug)]
pub enum SamplerCommand {
    /// Global parameter change. Only [`ParameterType::Amp`] applies.
    ParameterChange {
        /// Parameter to change.
        param: ParameterType,
        /// New value.
        value: f32,
    },
    /// Change one parameter of a note, and of its voice if sounding.
    NoteParameterChange {
        /// Note slot.
        note: NoteIndex,
        /// Parameter to change.
        param: ParameterType,
        /// New value.
        value: f32,
    },
    /// Replace one note slot.
    SetNote {
        /// Note slot.
        index: NoteIndex,
        /// New contents.
        note: Note,
    },
    /// Replace note slots `0..notes.len()`.
    SetNoteArray(Vec<Note>),
    /// Start a note. Ignored for empty slots.
    PlayNote(NoteIndex),
    /// Stop a note.
    StopNote(NoteIndex),
    /// Stop every note.
    StopAllNotes,
    /// Pause or resume rendering.
    TogglePause,
}

/// [`GranularSampler`](crate::GranularSampler) → UI notifications.
#[derive(Debug)]
pub enum SamplerNotification {
    /// A note started.
    NotePlayed(NoteIndex),
    /// A note was stopped.
    NoteStopped(NoteIndex),
    /// Every note was stopped.
    AllNotesStopped,
    /// A replaced note, to be dropped off the audio thread.
    ReleasedNote(Note),
    /// Replaced notes, to be dropped off the audio thread.
    ReleasedNotes(Vec<Note>),
    /// A voice removed from its slot, to be dropped off the audio thread.
    ReleasedVoice {
        /// Note the voice was playing.
        note: NoteIndex,
        /// The removed voice.
        voice: GrainSamplerVoice,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_span() {
        let buffer = Arc::new(StereoBuffer::new(100));
        let note = Note::new(buffer, NoteParameters::default()).with_offset(50);
        assert_eq!(note.len(), 100);
        assert_eq!(note.end(), 150);
        assert!(note.contains(50));
        assert!(note.contains(149));
        assert!(!note.contains(150));
        assert!(!note.contains(49));
    }

    #[test]
    fn test_default_note_is_empty() {
        let note = Note::default();
        assert!(note.is_empty());
        assert!(!note.contains(0));
    }
}
