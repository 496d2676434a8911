//! A fixed bank of [`Voice`]s with free-voice-first, then round-robin,
//! allocation.

use rill_core::dsp::sum_into;
use rill_core::{Context, Node, NoteNumber, ParamSnapshot, Sample};

use crate::voice::{NoteState, Voice, VoiceParams};

#[cfg(feature = "std")]
use std::sync::Arc;

#[cfg(not(feature = "std"))]
use alloc::sync::Arc;

/// Polyphonic synth: `K` fixed voices, no heap allocation after construction.
///
/// The parameter snapshot is `Arc`-shared rather than owned by value so a
/// control thread holding [`Synth::params_handle`] can publish into it
/// directly, even though the `Synth` itself is moved onto the audio thread.
pub struct Synth<const K: usize> {
    voices: [Voice; K],
    steal_cursor: usize,
    params: Arc<ParamSnapshot<VoiceParams>>,
}

impl<const K: usize> Synth<K> {
    /// Creates a synth with `K` idle voices at `sample_rate` and default
    /// voice-shaping parameters.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            voices: core::array::from_fn(|_| Voice::new(sample_rate)),
            steal_cursor: 0,
            params: Arc::new(ParamSnapshot::new(VoiceParams::default())),
        }
    }

    /// Publishes a new voice-shaping parameter record, taking effect at the
    /// next block. Control-thread side of the cross-thread handoff.
    pub fn set_params(&self, params: VoiceParams) {
        self.params.publish(params);
    }

    /// Returns a cloned handle to this synth's parameter snapshot, so a
    /// control thread can publish into it without touching the `Synth`
    /// itself (which lives on the audio thread once rendering starts).
    pub fn params_handle(&self) -> Arc<ParamSnapshot<VoiceParams>> {
        self.params.clone()
    }

    /// Number of voices currently sounding a note (not idle).
    pub fn active_voice_count(&self) -> usize {
        self.voices.iter().filter(|v| !v.is_idle()).count()
    }

    /// Assigns `note` to a free voice if one exists, else steals the next
    /// voice in round-robin order.
    pub fn note_on(&mut self, note: NoteNumber) {
        if let Some(v) = self.voices.iter_mut().find(|v| v.is_idle()) {
            v.note_on(note);
            return;
        }
        let idx = self.steal_cursor % K.max(1);
        self.steal_cursor = (self.steal_cursor + 1) % K.max(1);
        self.voices[idx].note_on(note);
    }

    /// Releases every voice currently holding `note`.
    pub fn note_off(&mut self, note: NoteNumber) {
        for v in self.voices.iter_mut() {
            if v.note_state() == NoteState::On(note) {
                v.note_off(note);
            }
        }
    }

    /// Kills every voice immediately, discarding release tails.
    pub fn all_notes_off(&mut self) {
        for v in self.voices.iter_mut() {
            v.kill();
        }
    }
}

impl<const K: usize> Node for Synth<K> {
    fn process(&mut self, ctx: &Context, out: &mut [Sample]) {
        let params = self.params.read();
        for v in self.voices.iter_mut() {
            v.apply_params(&params);
        }
        sum_into(ctx, out, &mut self.voices);
    }

    fn reset(&mut self) {
        for v in self.voices.iter_mut() {
            v.reset();
        }
        self.steal_cursor = 0;
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        for v in self.voices.iter_mut() {
            v.set_sample_rate(sample_rate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_on_assigns_a_free_voice() {
        let mut synth: Synth<4> = Synth::new(48000.0);
        synth.note_on(60);
        assert_eq!(synth.active_voice_count(), 1);
    }

    #[test]
    fn note_off_gates_matching_voice_but_leaves_the_rest_untouched() {
        let ctx = Context::new(48000.0, 120.0).unwrap();
        let mut synth: Synth<4> = Synth::new(48000.0);
        synth.note_on(60);
        synth.note_on(64);
        synth.note_off(60);
        // still sounding until the release tail finishes
        assert_eq!(synth.active_voice_count(), 2);
        let mut out = [0.0f32; 20000];
        synth.process(&ctx, &mut out);
        // note 60's release has fully elapsed; note 64 is untouched
        assert_eq!(synth.active_voice_count(), 1);
        assert!(synth.voices.iter().any(|v| v.note_state() == NoteState::On(64)));
    }

    #[test]
    fn steals_round_robin_when_all_voices_busy() {
        let mut synth: Synth<2> = Synth::new(48000.0);
        synth.note_on(1);
        synth.note_on(2);
        assert_eq!(synth.active_voice_count(), 2);
        // no free voice left: this must steal voice 0 (first allocated)
        synth.note_on(3);
        assert_eq!(synth.active_voice_count(), 2);
        assert!(synth.voices.iter().any(|v| v.note_state() == NoteState::On(3)));
    }

    #[test]
    fn all_notes_off_silences_every_voice() {
        let mut synth: Synth<4> = Synth::new(48000.0);
        synth.note_on(60);
        synth.note_on(62);
        synth.all_notes_off();
        assert_eq!(synth.active_voice_count(), 0);
    }

    #[test]
    fn process_sums_active_voices_without_allocating_params() {
        let ctx = Context::new(48000.0, 120.0).unwrap();
        let mut synth: Synth<4> = Synth::new(48000.0);
        synth.note_on(69);
        let mut out = [0.0f32; 32];
        synth.process(&ctx, &mut out);
        assert!(out.iter().any(|&s| s != 0.0));
    }
}
