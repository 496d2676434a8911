//! Scalar gain stage.

use crate::context::Context;
use crate::node::Node;
use crate::Sample;

/// Multiplies the signal by a fixed scalar.
#[derive(Debug, Clone, Copy)]
pub struct Gain {
    amount: f32,
}

impl Gain {
    /// Creates a gain stage with the given multiplier.
    pub fn new(amount: f32) -> Self {
        Self { amount }
    }

    /// Sets the multiplier.
    pub fn set_amount(&mut self, amount: f32) {
        self.amount = amount;
    }

    /// Current multiplier.
    pub fn amount(&self) -> f32 {
        self.amount
    }
}

impl Node for Gain {
    fn process(&mut self, _ctx: &Context, out: &mut [Sample]) {
        for s in out.iter_mut() {
            *s *= self.amount;
        }
    }
}
