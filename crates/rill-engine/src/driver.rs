//! The realtime per-block routine and the control-thread handle that feeds it.
//!
//! [`split`] builds a [`Timeline`], harvests each track's [`crate::chain_slot::ChainSlot`]
//! and voice-parameter handles before the timeline ever moves anywhere, and
//! returns an [`AudioEngine`] (meant to be moved into the audio callback) and
//! a [`ControlHandle`] (meant to stay on the control thread). Nothing past
//! this split requires further coordination beyond the rings and the handles
//! already harvested.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rill_core::{Context, Frame, Node, NoteNumber, Sample};
use rill_synth::VoiceParams;
use tracing::{debug, trace};

use crate::chain_slot::ChainSlot;
use crate::error::EngineError;
use crate::ops::Op;
use crate::timeline::{Timeline, MAX_TRACKS};
use crate::{NoteMsg, RING_CAPACITY};

/// Owns the timeline and everything the audio thread needs to render one
/// block: the ring consumers, transport state, and which track interactive
/// note input currently targets.
///
/// Created only by [`split`]; moved wholesale into the audio callback.
pub struct AudioEngine {
    timeline: Timeline,
    ctx: Context,
    note_rx: rill_core::Consumer<NoteMsg, RING_CAPACITY>,
    op_rx: rill_core::Consumer<Op, RING_CAPACITY>,
    playhead: Frame,
    playing: bool,
    active_track: usize,
    shutdown: Arc<AtomicBool>,
}

impl AudioEngine {
    /// `true` once the control thread has requested shutdown.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    /// Current playhead, in frames since transport zero.
    pub fn playhead(&self) -> Frame {
        self.playhead
    }

    /// Runs the full per-block routine and fills `out` with one block's
    /// worth of mixed, rendered audio.
    ///
    /// 1. If shutdown was requested, silence the block and return.
    /// 2. Reset the scratch arena for this block.
    /// 3. Drain interactive note input onto the active track.
    /// 4. Drain and apply transport/record/parameter ops.
    /// 5. Pull the timeline into `out` (each track reads its own published
    ///    voice-parameter snapshot as part of this).
    /// 6. If playing, advance every track's scheduler over the block and
    ///    move the playhead forward.
    pub fn process_block(&mut self, out: &mut [Sample]) {
        if self.is_shutdown() {
            for s in out.iter_mut() {
                *s = 0.0;
            }
            return;
        }
        self.ctx.arena().begin_block();

        self.drain_notes();
        self.drain_ops();

        self.timeline.process(&self.ctx, out);

        if self.playing {
            let start = self.playhead;
            let end = start + out.len() as Frame;
            for index in 0..self.timeline.track_count() {
                if let Some(track) = self.timeline.track_mut(index) {
                    track.advance_playback(start, end);
                }
            }
            self.playhead = end;
        }
    }

    fn drain_notes(&mut self) {
        let active_track = self.active_track;
        let playhead = self.playhead;
        let timeline = &mut self.timeline;
        let note_rx = &self.note_rx;
        match timeline.track_mut(active_track) {
            Some(track) => note_rx.drain(|msg| match msg {
                NoteMsg::On(note) => track.note_on(note, playhead),
                NoteMsg::Off(note) => track.note_off(note, playhead),
            }),
            // No live track at `active_track`; drop the input rather than
            // let it build up in the ring.
            None => note_rx.drain(|_| {}),
        }
    }

    /// Releases every voice on every live track, used before any transport
    /// move (`TogglePlay`, `Reset`, `Seek`) so a held note never sounds
    /// across a discontinuous jump in the playhead.
    fn quiesce_tracks(&mut self) {
        for index in 0..self.timeline.track_count() {
            if let Some(track) = self.timeline.track_mut(index) {
                track.all_notes_off();
            }
        }
    }

    fn drain_ops(&mut self) {
        while let Some(op) = self.op_rx.try_pop() {
            match op {
                Op::TogglePlay => {
                    self.quiesce_tracks();
                    self.playing = !self.playing;
                    trace!(playing = self.playing, "toggled playback");
                }
                Op::Reset => {
                    self.quiesce_tracks();
                    self.playing = false;
                    self.playhead = 0;
                    debug!("transport reset");
                }
                Op::Seek(frame) => {
                    self.quiesce_tracks();
                    self.playhead = frame;
                }
                Op::ToggleRecord(track_index) => {
                    if let Some(track) = self.timeline.track_mut(track_index) {
                        let recording = !track.is_recording();
                        track.set_recording(recording);
                        trace!(track_index, recording, "toggled recording");
                    }
                }
                Op::Param { track, plugin, param, value } => {
                    if let Some(track) = self.timeline.track_mut(track) {
                        track.chain_handle().with_active_plugin_mut(plugin, |p| {
                            p.node_mut().set_param(param, value);
                        });
                    }
                }
            }
        }
    }
}

/// Active track selector plus the node-add/remove/transport surface reached
/// from the control thread.
///
/// Owns the producer halves of both rings and the per-track handles
/// harvested from the timeline at [`split`] time; everything here is safe to
/// call at any rate from a single control thread without touching the audio
/// thread's state directly.
pub struct ControlHandle {
    note_tx: rill_core::Producer<NoteMsg, RING_CAPACITY>,
    op_tx: rill_core::Producer<Op, RING_CAPACITY>,
    chains: Vec<Arc<ChainSlot>>,
    params: Vec<Arc<rill_core::ParamSnapshot<VoiceParams>>>,
    shutdown: Arc<AtomicBool>,
}

impl ControlHandle {
    /// Number of pre-harvested track slots (always [`MAX_TRACKS`]).
    pub fn track_slots(&self) -> usize {
        self.chains.len()
    }

    /// Enqueues interactive note-on for the currently-active track.
    ///
    /// Returns [`EngineError::Contention`] if the note ring is momentarily
    /// full; the caller may retry or drop the input.
    pub fn note_on(&self, note: NoteNumber) -> Result<(), EngineError> {
        if self.note_tx.try_push(NoteMsg::On(note)) {
            Ok(())
        } else {
            Err(EngineError::Contention("note ring full"))
        }
    }

    /// Enqueues interactive note-off for the currently-active track.
    pub fn note_off(&self, note: NoteNumber) -> Result<(), EngineError> {
        if self.note_tx.try_push(NoteMsg::Off(note)) {
            Ok(())
        } else {
            Err(EngineError::Contention("note ring full"))
        }
    }

    /// Enqueues a transport/record/parameter op for the driver to apply on
    /// its next block.
    pub fn push_op(&self, op: Op) -> Result<(), EngineError> {
        if self.op_tx.try_push(op) {
            Ok(())
        } else {
            Err(EngineError::Contention("op ring full"))
        }
    }

    /// Adds a plugin to `track`'s chain via the chain-swap protocol,
    /// bypassing the op ring entirely (see module docs on why this is a
    /// direct call rather than a queued message).
    pub fn add_plugin(
        &self,
        track: usize,
        node: rill_core::dsp::DspNode,
    ) -> Result<crate::plugin::PluginId, EngineError> {
        let chain = self
            .chains
            .get(track)
            .ok_or(EngineError::InvalidArgument("track index out of range"))?;
        chain.add_plugin(node)
    }

    /// Removes a plugin from `track`'s chain via the chain-swap protocol.
    pub fn remove_plugin(&self, track: usize, id: crate::plugin::PluginId) -> Result<(), EngineError> {
        let chain = self
            .chains
            .get(track)
            .ok_or(EngineError::InvalidArgument("track index out of range"))?;
        chain.remove_plugin(id)
    }

    /// Publishes a new voice-parameter record for `track`'s synth, read back
    /// on the audio thread the next time that track processes a block.
    pub fn publish_voice_params(&self, track: usize, params: VoiceParams) -> Result<(), EngineError> {
        let snapshot = self
            .params
            .get(track)
            .ok_or(EngineError::InvalidArgument("track index out of range"))?;
        snapshot.publish(params);
        Ok(())
    }

    /// Signals the audio thread to silence further blocks and stop.
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

/// Builds a fresh engine at `sample_rate`/`bpm` with `initial_tracks` live
/// tracks already activated, harvesting every track's chain and parameter
/// handles before the timeline moves anywhere.
///
/// Track add/remove is not part of the closed op set the audio-thread driver
/// drains (see module docs on [`Op`]), so the live track count is fixed for
/// the life of the engine once split; callers that want more tracks than
/// `initial_tracks` restart with a larger count.
///
/// Returns an error if `Context::new` rejects `sample_rate`/`bpm`, or if
/// `initial_tracks` exceeds [`MAX_TRACKS`].
pub fn split(
    sample_rate: f32,
    bpm: f32,
    initial_tracks: usize,
) -> Result<(AudioEngine, ControlHandle), EngineError> {
    let ctx = Context::new(sample_rate, bpm)
        .map_err(|_| EngineError::InvalidArgument("invalid sample rate or bpm"))?;
    let mut timeline = Timeline::new(sample_rate);
    for _ in 0..initial_tracks {
        timeline.add_track()?;
    }

    let mut chains = Vec::with_capacity(MAX_TRACKS);
    let mut params = Vec::with_capacity(MAX_TRACKS);
    for track in timeline.tracks().iter() {
        chains.push(track.chain_handle());
        params.push(track.params_handle());
    }

    let (note_tx, note_rx) = rill_core::SpscRing::<NoteMsg, RING_CAPACITY>::new();
    let (op_tx, op_rx) = rill_core::SpscRing::<Op, RING_CAPACITY>::new();
    let shutdown = Arc::new(AtomicBool::new(false));

    let engine = AudioEngine {
        timeline,
        ctx,
        note_rx,
        op_rx,
        playhead: 0,
        playing: false,
        active_track: 0,
        shutdown: shutdown.clone(),
    };
    let handle = ControlHandle {
        note_tx,
        op_tx,
        chains,
        params,
        shutdown,
    };
    Ok((engine, handle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_when_no_note_is_sounding() {
        let (mut engine, _handle) = split(48000.0, 120.0, 1).unwrap();
        let mut out = [1.0f32; 64];
        engine.process_block(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn note_on_through_the_ring_sounds_once_a_track_exists() {
        let (mut engine, handle) = split(48000.0, 120.0, 1).unwrap();
        handle.note_on(69).unwrap();

        let mut out = [0.0f32; 64];
        engine.process_block(&mut out);
        assert!(out.iter().any(|&s| s != 0.0));
    }

    #[test]
    fn toggle_play_and_seek_advance_the_playhead_during_playback() {
        let (mut engine, handle) = split(48000.0, 120.0, 1).unwrap();
        handle.push_op(Op::Seek(100)).unwrap();
        handle.push_op(Op::TogglePlay).unwrap();

        let mut out = [0.0f32; 64];
        engine.process_block(&mut out);
        assert!(engine.playing);
        assert_eq!(engine.playhead(), 164);
    }

    #[test]
    fn reset_stops_playback_and_zeroes_the_playhead() {
        let (mut engine, handle) = split(48000.0, 120.0, 1).unwrap();
        handle.push_op(Op::Seek(500)).unwrap();
        handle.push_op(Op::TogglePlay).unwrap();
        let mut out = [0.0f32; 64];
        engine.process_block(&mut out);

        handle.push_op(Op::Reset).unwrap();
        engine.process_block(&mut out);
        assert!(!engine.playing);
        assert_eq!(engine.playhead(), 0);
    }

    #[test]
    fn shutdown_silences_further_blocks() {
        let (mut engine, handle) = split(48000.0, 120.0, 1).unwrap();
        handle.note_on(69).unwrap();
        handle.request_shutdown();

        let mut out = [1.0f32; 64];
        engine.process_block(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn seek_quiesces_a_held_note() {
        let (mut engine, handle) = split(48000.0, 120.0, 1).unwrap();
        handle
            .publish_voice_params(0, VoiceParams { release_secs: 0.0001, ..Default::default() })
            .unwrap();
        handle.note_on(69).unwrap();

        let mut out = [0.0f32; 64];
        engine.process_block(&mut out);
        assert!(out.iter().any(|&s| s != 0.0));

        handle.push_op(Op::Seek(0)).unwrap();
        // a few blocks for the short release to finish ringing down
        let mut silent = [0.0f32; 64];
        for _ in 0..8 {
            engine.process_block(&mut silent);
        }
        assert!(silent.iter().all(|&s| s == 0.0), "held note should have been quiesced by the seek");
    }

    #[test]
    fn toggle_play_quiesces_a_held_note() {
        let (mut engine, handle) = split(48000.0, 120.0, 1).unwrap();
        handle
            .publish_voice_params(0, VoiceParams { release_secs: 0.0001, ..Default::default() })
            .unwrap();
        handle.note_on(69).unwrap();

        let mut out = [0.0f32; 64];
        engine.process_block(&mut out);
        assert!(out.iter().any(|&s| s != 0.0));

        handle.push_op(Op::TogglePlay).unwrap();
        let mut silent = [0.0f32; 64];
        for _ in 0..8 {
            engine.process_block(&mut silent);
        }
        assert!(silent.iter().all(|&s| s == 0.0), "held note should have been quiesced by the transport toggle");
    }

    #[test]
    fn add_plugin_through_the_handle_is_audible_next_block() {
        use rill_core::dsp::{DspNode, Gain};

        let (mut engine, handle) = split(48000.0, 120.0, 1).unwrap();
        handle.add_plugin(0, DspNode::Gain(Gain::new(0.0))).unwrap();
        handle.note_on(69).unwrap();

        let mut out = [1.0f32; 64];
        engine.process_block(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
    }
}
