//! Construction-time error taxonomy for `rill-core`.
//!
//! Nothing on the audio thread returns this type: the realtime path never
//! unwinds (see the crate-level docs and the concurrency model this crate
//! implements). `CoreError` only surfaces from fallible constructors called
//! on the control thread, such as [`crate::Context::new`].

#[cfg(not(feature = "std"))]
use core::fmt;

#[cfg(feature = "std")]
use thiserror::Error;

/// Errors raised while constructing core types on the control thread.
#[cfg_attr(feature = "std", derive(Error))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoreError {
    /// `sample_rate` must be strictly positive.
    #[cfg_attr(feature = "std", error("sample rate must be > 0, got {0}"))]
    InvalidSampleRate(f32),
    /// `bpm` must be strictly positive.
    #[cfg_attr(feature = "std", error("bpm must be > 0, got {0}"))]
    InvalidBpm(f32),
}

#[cfg(not(feature = "std"))]
impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::InvalidSampleRate(sr) => write!(f, "sample rate must be > 0, got {sr}"),
            CoreError::InvalidBpm(bpm) => write!(f, "bpm must be > 0, got {bpm}"),
        }
    }
}
