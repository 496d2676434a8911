//! Rill Core - realtime audio graph primitives
//!
//! This crate provides the foundations of a pull-based realtime audio graph:
//! the cross-thread primitives that move data between a control thread and an
//! audio thread without blocking or allocating on the audio path, the
//! per-callback scratch arena, the uniform node contract, and the concrete
//! DSP nodes that the rest of the workspace composes into voices, chains, and
//! tracks.
//!
//! # Cross-thread primitives
//!
//! - [`SpscRing`] - wait-free single-producer/single-consumer ring, split into
//!   a [`Producer`]/[`Consumer`] pair so the single-writer/single-reader
//!   contract is enforced by the type system.
//! - [`ParamSnapshot`] - lock-free double-buffered publication of a
//!   plain-old-data parameter record.
//!
//! # Per-callback scratch
//!
//! - [`BlockArena`] - fixed-capacity bump allocator reset once per audio
//!   callback; backs every temporary buffer a node needs during one block.
//!
//! # Node contract
//!
//! - [`Node`] - the uniform `process(ctx, out)` contract every DSP node and
//!   every composite (voice, chain, track, timeline) implements.
//!
//! # DSP primitives
//!
//! See the [`dsp`] module: oscillator, Moog-ladder low-pass filter, ADSR,
//! gain, mixer, distortion, gate, delay.
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible (the arena, ring, and DSP nodes never
//! touch the heap). Disable the default `std` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! rill-core = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod arena;
pub mod context;
pub mod dsp;
pub mod error;
pub mod node;
pub mod param_snapshot;
pub mod ring;

pub use arena::{BlockArena, TempBuf};
pub use context::Context;
pub use error::CoreError;
pub use node::Node;
pub use param_snapshot::ParamSnapshot;
pub use ring::{Consumer, Producer, SpscRing};

/// Fixed audio sample type used throughout the graph.
pub type Sample = f32;

/// Monotonic count of audio samples since time 0.
pub type Frame = u64;

/// MIDI-semantics note number, 0..127; 69 = A440.
pub type NoteNumber = u8;

/// Upper bound on the block length any node is asked to process in one call.
///
/// Drives [`BlockArena`]'s default capacity; the realtime driver must never
/// request a block longer than this.
pub const MAX_BLOCK_LEN: usize = 4096;
