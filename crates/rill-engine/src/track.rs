//! A track: one synth, one recorded note sequence, one hot-swappable effect
//! chain.

use std::sync::Arc;

use rill_core::{Context, Frame, Node, NoteNumber, Sample};
use rill_synth::Synth;

use crate::chain_slot::ChainSlot;
use crate::note_scheduler::{NoteRecord, NoteScheduler};

/// Voices per track synth.
pub const VOICES: usize = 8;

/// Owns a synth, its recorded note sequence, and its effect chain.
///
/// Only the audio thread ever touches `synth`, `scheduler`, and
/// `pending_starts` directly; the chain is the one piece shared with the
/// control thread, reached through the cloneable [`ChainSlot`] handle.
pub struct Track {
    synth: Synth<VOICES>,
    scheduler: NoteScheduler,
    chains: Arc<ChainSlot>,
    recording: bool,
    pending_starts: Vec<(NoteNumber, Frame)>,
}

impl Track {
    /// Creates an empty track at `sample_rate`.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            synth: Synth::new(sample_rate),
            scheduler: NoteScheduler::new(),
            chains: Arc::new(ChainSlot::new()),
            recording: false,
            pending_starts: Vec::new(),
        }
    }

    /// A cloned handle to this track's chain-swap mechanism, for the
    /// control thread to mutate directly.
    pub fn chain_handle(&self) -> Arc<ChainSlot> {
        self.chains.clone()
    }

    /// A handle to this track's synth voice-parameter snapshot, for the
    /// control thread to publish into directly.
    pub fn params_handle(&self) -> Arc<rill_core::ParamSnapshot<rill_synth::VoiceParams>> {
        self.synth.params_handle()
    }

    /// Whether this track is currently recording played notes.
    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Enables or disables recording. Does not retroactively affect notes
    /// already held.
    pub fn set_recording(&mut self, recording: bool) {
        self.recording = recording;
    }

    /// Applies interactive note-on: sounds the note, and if recording,
    /// remembers `playhead` as this note's start.
    pub fn note_on(&mut self, note: NoteNumber, playhead: Frame) {
        self.synth.note_on(note);
        if self.recording {
            self.pending_starts.push((note, playhead));
        }
    }

    /// Applies interactive note-off: releases the note, and if recording
    /// and a matching start was remembered, commits a [`NoteRecord`].
    pub fn note_off(&mut self, note: NoteNumber, playhead: Frame) {
        self.synth.note_off(note);
        if self.recording {
            if let Some(pos) = self.pending_starts.iter().position(|&(n, _)| n == note) {
                let (_, start) = self.pending_starts.remove(pos);
                self.scheduler.insert(NoteRecord { start, end: playhead, note });
            }
        }
    }

    /// Releases every voice and clears any in-flight recording state.
    pub fn all_notes_off(&mut self) {
        self.synth.all_notes_off();
        self.pending_starts.clear();
    }

    /// Clears recorded notes (used by `Reset`).
    pub fn clear_recording(&mut self) {
        self.scheduler.clear();
        self.pending_starts.clear();
    }

    /// Quiesces notes, recorded history, and the installed effect chain —
    /// used when a track's slot is being freed for reuse by a later
    /// `add_track`, so the next occupant starts from a clean slate.
    pub fn clear(&mut self) {
        self.all_notes_off();
        self.clear_recording();
        self.chains.clear();
    }

    /// Folds scheduled On/Off events for `[start_frame, end_frame)` into
    /// this track's synth (playback, not interactive input). Applies events
    /// directly from the scheduler's callback rather than collecting them
    /// first, so this never allocates.
    pub fn advance_playback(&mut self, start_frame: Frame, end_frame: Frame) {
        let synth = &mut self.synth;
        self.scheduler.schedule(start_frame, end_frame, |event| match event {
            crate::note_scheduler::NoteEvent::On(n) => synth.note_on(n),
            crate::note_scheduler::NoteEvent::Off(n) => synth.note_off(n),
        });
    }
}

impl Node for Track {
    fn process(&mut self, ctx: &Context, out: &mut [Sample]) {
        self.synth.process(ctx, out);
        self.chains.process(ctx, out);
    }

    fn reset(&mut self) {
        self.synth.reset();
        self.scheduler.clear();
        self.pending_starts.clear();
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.synth.set_sample_rate(sample_rate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_track_produces_silence() {
        let ctx = Context::new(48000.0, 120.0).unwrap();
        let mut track = Track::new(48000.0);
        let mut out = [1.0f32; 64];
        track.process(&ctx, &mut out);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn recording_note_on_then_off_commits_a_record() {
        let mut track = Track::new(48000.0);
        track.set_recording(true);
        track.note_on(60, 1000);
        track.note_off(60, 2000);
        assert_eq!(track.scheduler.records(), &[NoteRecord { start: 1000, end: 2000, note: 60 }]);
    }

    #[test]
    fn non_recording_note_on_off_does_not_commit() {
        let mut track = Track::new(48000.0);
        track.note_on(60, 1000);
        track.note_off(60, 2000);
        assert!(track.scheduler.records().is_empty());
    }

    #[test]
    fn playback_advance_sounds_the_scheduled_note() {
        let mut track = Track::new(48000.0);
        track.set_recording(true);
        track.note_on(60, 0);
        track.note_off(60, 100);
        track.all_notes_off();

        track.advance_playback(0, 256);
        assert_eq!(track.synth.active_voice_count(), 1);
    }
}
