//! Boolean open/closed gate.
//!
//! Unlike the envelope-follower-driven gate found elsewhere in this lineage,
//! this is a trivial two-state gate with no attack/hold/release shaping: it
//! exists purely as a cheap way to mute a chain slot without removing it,
//! and to demonstrate the "skip the upstream pull while closed" shape of the
//! pull graph.

use crate::context::Context;
use crate::node::Node;
use crate::Sample;

/// Open/closed pass-through gate.
#[derive(Debug, Clone, Copy, Default)]
pub struct Gate {
    open: bool,
}

impl Gate {
    /// Creates a gate in the given initial state.
    pub fn new(open: bool) -> Self {
        Self { open }
    }

    /// Opens the gate.
    pub fn open(&mut self) {
        self.open = true;
    }

    /// Closes the gate.
    pub fn close(&mut self) {
        self.open = false;
    }

    /// Current state.
    pub fn is_open(&self) -> bool {
        self.open
    }
}

impl Node for Gate {
    fn process(&mut self, _ctx: &Context, out: &mut [Sample]) {
        if !self.open {
            for s in out.iter_mut() {
                *s = 0.0;
            }
        }
    }

    fn wants_upstream(&self) -> bool {
        self.open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_gate_zeroes_and_skips_upstream() {
        let ctx = Context::new(48000.0, 120.0).unwrap();
        let mut gate = Gate::new(false);
        assert!(!gate.wants_upstream());
        let mut buf = [1.0f32; 4];
        gate.process(&ctx, &mut buf);
        assert!(buf.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn open_gate_passes_through() {
        let ctx = Context::new(48000.0, 120.0).unwrap();
        let mut gate = Gate::new(true);
        assert!(gate.wants_upstream());
        let mut buf = [1.0f32, -0.5, 0.25];
        gate.process(&ctx, &mut buf);
        assert_eq!(buf, [1.0, -0.5, 0.25]);
    }
}
