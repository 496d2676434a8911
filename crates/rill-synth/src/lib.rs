//! Rill Synth - polyphonic subtractive synthesizer.
//!
//! A [`Voice`] is the fixed sub-graph `{pwm, saw, sub} -> mixer -> lpf ->
//! adsr`; a [`Synth`] owns a fixed bank of voices and implements
//! free-voice-first, then round-robin, allocation.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod synth;
pub mod voice;

pub use synth::Synth;
pub use voice::{midi_to_freq, NoteState, Voice, VoiceParams};
