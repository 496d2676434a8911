//! Track/timeline/scheduler orchestration for rill.
//!
//! A [`Timeline`] owns a fixed set of [`Track`]s; each track owns a
//! [`rill_synth::Synth`], a recorded note sequence, and a
//! [`chain_slot::ChainSlot`]-backed effect chain that can be mutated from a
//! control thread while the audio thread keeps rendering. [`driver`] is the
//! per-block realtime routine that ties rings, snapshots, and the timeline
//! together into one audio callback.

pub mod chain_slot;
pub mod driver;
pub mod error;
pub mod note_scheduler;
pub mod ops;
pub mod plugin;
pub mod track;
pub mod timeline;

pub use driver::{AudioEngine, ControlHandle};
pub use error::EngineError;
pub use note_scheduler::{NoteEvent, NoteRecord, NoteScheduler};
pub use ops::Op;
pub use plugin::{Plugin, PluginChain, PluginId, MAX_PLUGINS};
pub use track::{Track, VOICES};
pub use timeline::{Timeline, MAX_TRACKS};

/// A note event enqueued from the control thread to the audio thread for
/// interactive input, distinct from [`NoteEvent`] (which the scheduler
/// produces internally during playback).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteMsg {
    /// Start sounding a note on the currently-active track.
    On(rill_core::NoteNumber),
    /// Stop sounding a note on the currently-active track.
    Off(rill_core::NoteNumber),
}

/// Capacity of the note and op rings (usable slots; the ring itself
/// allocates one extra internally).
pub const RING_CAPACITY: usize = 255;
