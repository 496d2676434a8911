//! Error taxonomy for the track/timeline/scheduler orchestration layer.

use thiserror::Error;

/// Errors surfaced to a control-thread caller. Never raised on the audio
/// thread: every audio-path failure mode short-circuits to silence or is a
/// debug assertion instead.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    /// A chain already holds `MAX_PLUGINS`, or the timeline already holds
    /// `MAX_TRACKS`.
    #[error("capacity exceeded: {0}")]
    CapacityExceeded(&'static str),
    /// An out-of-range index or an otherwise malformed argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    /// A ring was full when the caller tried to push.
    #[error("ring contention: {0}")]
    Contention(&'static str),
}
