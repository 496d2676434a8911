//! The uniform node contract the whole graph is built from.

use crate::arena::TempBuf;
use crate::context::Context;
use crate::Sample;

/// Every DSP node, and every composite built out of them (voice, chain,
/// track, timeline), implements `Node`.
///
/// Dispatch across node kinds in this workspace is a closed tagged variant
/// (see [`crate::dsp`]'s `DspNode`, and `rill-engine`'s `Plugin`) rather than
/// `dyn Node`: the kind set is fixed by the domain, so there is no value in
/// paying for a vtable. `process` is still called once per block per node —
/// never per sample — so the dispatch cost (match vs. vtable) is immaterial
/// either way.
pub trait Node {
    /// Writes exactly `out.len()` samples.
    ///
    /// Source nodes (oscillators, the voice/track/timeline mixers) overwrite
    /// `out` from scratch. Single-input transform nodes (filter, ADSR, gain,
    /// distortion, gate, delay) instead expect `out` to already hold their
    /// upstream's samples and mutate it in place — the caller that owns the
    /// pull (a `PluginChain`, a voice's sub-graph) is responsible for having
    /// rented the temporary from `ctx.arena()` and recursively pulled the
    /// upstream into it first, per [`Node::wants_upstream`].
    fn process(&mut self, ctx: &Context, out: &mut [Sample]);

    /// Whether the caller driving a pull should bother computing this node's
    /// upstream before calling `process`.
    ///
    /// Only a closed [`crate::dsp::Gate`] returns `false`: the block is going
    /// to be zeroed regardless of what the upstream would have produced, so
    /// the pull graph skips it rather than wastefully computing it.
    fn wants_upstream(&self) -> bool {
        true
    }

    /// Resets internal state to its post-construction value (e.g. zeroing
    /// filter state, returning an envelope to `Idle`).
    fn reset(&mut self) {}

    /// Notifies the node of a new sample rate. Only called at stream-open;
    /// the core does not support changing sample rate mid-session.
    fn set_sample_rate(&mut self, sample_rate: f32) {
        let _ = sample_rate;
    }

    /// Rents a `len`-sample temporary from `ctx`'s arena and pulls this node
    /// into it. The buffer is valid until the next `begin_block()`.
    fn pull<'ctx>(&mut self, ctx: &'ctx Context, len: usize) -> TempBuf<'ctx> {
        let mut buf = ctx.arena().tmp(len);
        self.process(ctx, &mut buf);
        buf
    }
}
