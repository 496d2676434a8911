//! The closed set of control-thread-originated messages applied by the
//! realtime driver each block.

use rill_core::Frame;

/// Identifies a parameter within a specific plugin instance.
pub type ParamId = u32;

/// A control operation, carried across the op ring and applied by the
/// audio-thread driver. Track/plugin structural changes (add/remove) are
/// deliberately not represented here: those require heap allocation, which
/// must happen on the control thread, so they are methods called directly
/// on the shared handles instead of messages replayed on the audio thread.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Op {
    /// Start or stop playback.
    TogglePlay,
    /// Stop playback and return the playhead to frame 0.
    Reset,
    /// Move the playhead to an arbitrary frame.
    Seek(Frame),
    /// Start or stop recording played notes onto a track.
    ToggleRecord(usize),
    /// Mutate a scalar parameter on an installed plugin, equivalent to a
    /// [`rill_core::ParamSnapshot`] publication but routed through the op
    /// ring instead (used for one-off parameter nudges rather than a
    /// continuously-published control).
    Param {
        /// Track the plugin lives on.
        track: usize,
        /// Which plugin within that track's active chain.
        plugin: crate::plugin::PluginId,
        /// Which of that plugin's parameters.
        param: ParamId,
        /// The new value.
        value: f32,
    },
}
