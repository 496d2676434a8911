//! Summing N upstream pulls.
//!
//! There is no `Mixer` struct: a mixer has no state of its own beyond "pull
//! every input, add them up," so it is a pair of free functions each caller
//! (a synth voice summing its three oscillators, the timeline summing its
//! tracks) applies to its own concretely-typed set of sources. Headroom is
//! the caller's responsibility: neither function normalizes by N.

use crate::context::Context;
use crate::node::Node;
use crate::Sample;

/// Sums `sources[i].process()` into `out` at equal gain.
pub fn sum_into<N: Node>(ctx: &Context, out: &mut [Sample], sources: &mut [N]) {
    for s in out.iter_mut() {
        *s = 0.0;
    }
    let len = out.len();
    for source in sources.iter_mut() {
        let temp = source.pull(ctx, len);
        for (o, t) in out.iter_mut().zip(temp.iter()) {
            *o += *t;
        }
    }
}

/// Sums `sources[i].process()` into `out`, scaling each source's
/// contribution by the matching entry of `gains`.
pub fn sum_weighted_into<N: Node>(ctx: &Context, out: &mut [Sample], sources: &mut [N], gains: &[f32]) {
    debug_assert_eq!(sources.len(), gains.len());
    for s in out.iter_mut() {
        *s = 0.0;
    }
    let len = out.len();
    for (source, &gain) in sources.iter_mut().zip(gains.iter()) {
        let temp = source.pull(ctx, len);
        for (o, t) in out.iter_mut().zip(temp.iter()) {
            *o += *t * gain;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::{Oscillator, Waveform};

    #[test]
    fn sums_equal_gain() {
        let ctx = Context::new(48000.0, 120.0).unwrap();
        let mut sources = [
            Oscillator::new(Waveform::Saw, 0.0, 48000.0),
            Oscillator::new(Waveform::Saw, 0.0, 48000.0),
        ];
        let mut out = [0.0f32; 4];
        sum_into(&ctx, &mut out, &mut sources);
        // saw at freq 0 is stuck at phase 0 -> sample = -1 each
        assert!(out.iter().all(|&s| (s - -2.0).abs() < 1e-6));
    }
}
