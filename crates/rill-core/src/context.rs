//! The per-process rendering context.

use crate::arena::{BlockArena, DEFAULT_ARENA_BLOCKS};
use crate::error::CoreError;

/// Everything a [`Node`](crate::Node) needs to process a block that is not
/// its own private state: the sample rate, the tempo, and the scratch arena.
///
/// Created once at stream-open time; the arena is reset every block, but the
/// `Context` value itself lives for the life of the audio stream.
pub struct Context {
    sample_rate: f32,
    bpm: f32,
    arena: BlockArena,
}

impl Context {
    /// Creates a context for a session at `sample_rate` Hz and `bpm` tempo.
    pub fn new(sample_rate: f32, bpm: f32) -> Result<Self, CoreError> {
        if !(sample_rate > 0.0) {
            return Err(CoreError::InvalidSampleRate(sample_rate));
        }
        if !(bpm > 0.0) {
            return Err(CoreError::InvalidBpm(bpm));
        }
        Ok(Self {
            sample_rate,
            bpm,
            arena: BlockArena::new(DEFAULT_ARENA_BLOCKS),
        })
    }

    /// Sample rate in Hz, fixed for the life of the context.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Tempo in beats per minute.
    pub fn bpm(&self) -> f32 {
        self.bpm
    }

    /// Sets the tempo. Control-thread only; takes effect for the next
    /// scheduler lookup that reads it.
    pub fn set_bpm(&mut self, bpm: f32) {
        self.bpm = bpm;
    }

    /// The per-block scratch arena.
    pub fn arena(&self) -> &BlockArena {
        &self.arena
    }

    /// Converts a beat position to a frame index at the context's current tempo.
    pub fn beats_to_frame(&self, beats: f64) -> u64 {
        (beats * 60.0 * f64::from(self.sample_rate) / f64::from(self.bpm)).round() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_sample_rate() {
        assert!(matches!(
            Context::new(0.0, 120.0),
            Err(CoreError::InvalidSampleRate(_))
        ));
        assert!(matches!(
            Context::new(-44100.0, 120.0),
            Err(CoreError::InvalidSampleRate(_))
        ));
    }

    #[test]
    fn rejects_non_positive_bpm() {
        assert!(matches!(Context::new(48000.0, 0.0), Err(CoreError::InvalidBpm(_))));
    }

    #[test]
    fn beats_to_frame_matches_formula() {
        let ctx = Context::new(48000.0, 120.0).unwrap();
        // 1 beat at 120bpm is 0.5s -> 24000 frames at 48kHz
        assert_eq!(ctx.beats_to_frame(1.0), 24000);
    }
}
