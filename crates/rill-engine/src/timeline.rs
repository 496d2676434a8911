//! The master mixer over a fixed-capacity set of tracks.

use rill_core::dsp::sum_into;
use rill_core::{Context, Node, Sample};

use crate::error::EngineError;
use crate::track::Track;

/// Upper bound on live tracks.
pub const MAX_TRACKS: usize = 8;

/// A fixed array of pre-constructed track slots; `track_count` of them are
/// live. Adding a track never allocates — it activates the next
/// pre-constructed slot. Owned exclusively by the audio thread; the control
/// thread reaches individual tracks' chains/params only through the handles
/// harvested at construction (see [`crate::ControlHandle`]).
pub struct Timeline {
    tracks: [Track; MAX_TRACKS],
    track_count: usize,
}

impl Timeline {
    /// Creates a timeline with all `MAX_TRACKS` slots pre-constructed and
    /// silent, none of them live.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            tracks: core::array::from_fn(|_| Track::new(sample_rate)),
            track_count: 0,
        }
    }

    /// Number of currently-live tracks.
    pub fn track_count(&self) -> usize {
        self.track_count
    }

    /// All pre-constructed slots, live or not (used by the control thread
    /// to harvest per-track handles up front).
    pub fn tracks(&self) -> &[Track; MAX_TRACKS] {
        &self.tracks
    }

    /// Mutable access to a live track.
    pub fn track_mut(&mut self, index: usize) -> Option<&mut Track> {
        if index < self.track_count {
            self.tracks.get_mut(index)
        } else {
            None
        }
    }

    /// Activates the next pre-constructed slot. No allocation.
    pub fn add_track(&mut self) -> Result<usize, EngineError> {
        if self.track_count >= MAX_TRACKS {
            return Err(EngineError::CapacityExceeded("timeline already holds MAX_TRACKS"));
        }
        let index = self.track_count;
        self.tracks[index].clear();
        self.track_count += 1;
        Ok(index)
    }

    /// Clears track `index` and rotates the remaining live tracks left by
    /// one so live tracks stay contiguous, per the design's "trailing empty
    /// slots" invariant.
    pub fn remove_track(&mut self, index: usize) -> Result<(), EngineError> {
        if index >= self.track_count {
            return Err(EngineError::InvalidArgument("track index out of range"));
        }
        self.tracks[index].clear();
        for i in index..self.track_count - 1 {
            self.tracks.swap(i, i + 1);
        }
        self.track_count -= 1;
        Ok(())
    }
}

impl Node for Timeline {
    fn process(&mut self, ctx: &Context, out: &mut [Sample]) {
        let count = self.track_count;
        sum_into(ctx, out, &mut self.tracks[..count]);
    }

    fn reset(&mut self) {
        for track in self.tracks.iter_mut() {
            track.reset();
        }
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        for track in self.tracks.iter_mut() {
            track.set_sample_rate(sample_rate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_by_default() {
        let ctx = Context::new(48000.0, 120.0).unwrap();
        let mut timeline = Timeline::new(48000.0);
        timeline.add_track().unwrap();
        timeline.add_track().unwrap();
        let mut out = [1.0f32; 48000];
        timeline.process(&ctx, &mut out);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn add_track_activates_pre_constructed_slots_up_to_max() {
        let mut timeline = Timeline::new(48000.0);
        for _ in 0..MAX_TRACKS {
            timeline.add_track().unwrap();
        }
        assert_eq!(timeline.track_count(), MAX_TRACKS);
        assert!(matches!(timeline.add_track(), Err(EngineError::CapacityExceeded(_))));
    }

    #[test]
    fn remove_track_rotates_remaining_tracks_left() {
        let mut timeline = Timeline::new(48000.0);
        timeline.add_track().unwrap();
        timeline.add_track().unwrap();
        timeline.add_track().unwrap();
        timeline.track_mut(1).unwrap().note_on(60, 0);
        timeline.remove_track(0).unwrap();
        assert_eq!(timeline.track_count(), 2);
        // the track that was at index 1 is now at index 0
        assert!(timeline.track_mut(0).unwrap().chain_handle().chain_tags()[0].is_empty());
    }

    #[test]
    fn remove_track_out_of_range_is_invalid_argument() {
        let mut timeline = Timeline::new(48000.0);
        timeline.add_track().unwrap();
        assert!(matches!(timeline.remove_track(5), Err(EngineError::InvalidArgument(_))));
    }

    #[test]
    fn reused_slot_after_remove_has_no_stale_plugins() {
        use rill_core::dsp::{DspNode, Gain};

        let mut timeline = Timeline::new(48000.0);
        timeline.add_track().unwrap();
        timeline.add_track().unwrap();
        let chain = timeline.track_mut(0).unwrap().chain_handle();
        chain.add_plugin(DspNode::Gain(Gain::new(0.5))).unwrap();

        timeline.remove_track(0).unwrap();
        let reused_index = timeline.add_track().unwrap();
        let tags = timeline.track_mut(reused_index).unwrap().chain_handle().chain_tags();
        assert!(tags[0].is_empty() && tags[1].is_empty());
    }
}
