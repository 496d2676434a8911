//! Concrete DSP nodes: oscillator, Moog-ladder low-pass filter, ADSR, gain,
//! mixer, distortion, gate, delay.
//!
//! Each type implements [`crate::Node`] directly. `DspNode` is the closed
//! tagged variant `rill-engine`'s `Plugin` wraps for the effect slots of a
//! track's chain; the synth voice sub-graph (`rill-synth`) holds its
//! oscillators/filter/envelope as plain fields instead, since that sub-graph
//! shape is fixed and never needs runtime dispatch.

pub mod adsr;
pub mod delay;
pub mod distortion;
pub mod gain;
pub mod gate;
pub mod mixer;
pub mod moog_lpf;
pub mod oscillator;

pub use adsr::{Adsr, EnvelopeStage};
pub use delay::Delay;
pub use distortion::{Distortion, DistortionMode};
pub use gain::Gain;
pub use gate::Gate;
pub use mixer::{sum_into, sum_weighted_into};
pub use moog_lpf::MoogLpf;
pub use oscillator::{Oscillator, Waveform};

use crate::context::Context;
use crate::node::Node;
use crate::Sample;

/// Closed tagged variant over the effect-chain-eligible DSP nodes.
///
/// Oscillators aren't included: they only ever appear inside a synth voice's
/// fixed sub-graph, never as a chain plugin.
#[derive(Debug, Clone)]
pub enum DspNode {
    /// See [`MoogLpf`].
    Lpf(MoogLpf),
    /// See [`Gain`].
    Gain(Gain),
    /// See [`Distortion`].
    Distortion(Distortion),
    /// See [`Gate`].
    Gate(Gate),
    /// See [`Delay`].
    Delay(Delay),
}

impl Node for DspNode {
    fn process(&mut self, ctx: &Context, out: &mut [Sample]) {
        match self {
            DspNode::Lpf(n) => n.process(ctx, out),
            DspNode::Gain(n) => n.process(ctx, out),
            DspNode::Distortion(n) => n.process(ctx, out),
            DspNode::Gate(n) => n.process(ctx, out),
            DspNode::Delay(n) => n.process(ctx, out),
        }
    }

    fn reset(&mut self) {
        match self {
            DspNode::Lpf(n) => n.reset(),
            DspNode::Gain(n) => n.reset(),
            DspNode::Distortion(n) => n.reset(),
            DspNode::Gate(n) => n.reset(),
            DspNode::Delay(n) => n.reset(),
        }
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        match self {
            DspNode::Lpf(n) => n.set_sample_rate(sample_rate),
            DspNode::Gain(n) => n.set_sample_rate(sample_rate),
            DspNode::Distortion(n) => n.set_sample_rate(sample_rate),
            DspNode::Gate(n) => n.set_sample_rate(sample_rate),
            DspNode::Delay(n) => n.set_sample_rate(sample_rate),
        }
    }

    fn wants_upstream(&self) -> bool {
        match self {
            DspNode::Gate(n) => n.wants_upstream(),
            DspNode::Lpf(_) | DspNode::Gain(_) | DspNode::Distortion(_) | DspNode::Delay(_) => true,
        }
    }
}

impl DspNode {
    /// Sets a single numbered scalar parameter, for `rill-engine`'s `Param`
    /// op. Each variant exposes its fields in declaration order; out-of-range
    /// indices are silently ignored rather than erroring, since this runs on
    /// the audio thread and has no channel back to the caller.
    pub fn set_param(&mut self, param: u32, value: f32) {
        match (self, param) {
            (DspNode::Lpf(n), 0) => n.set_cutoff(value),
            (DspNode::Lpf(n), 1) => n.set_resonance(value),
            (DspNode::Gain(n), 0) => n.set_amount(value),
            (DspNode::Distortion(n), 0) => n.set_drive(value),
            (DspNode::Distortion(n), 1) => n.set_mix(value),
            (DspNode::Gate(n), 0) => {
                if value != 0.0 {
                    n.open();
                } else {
                    n.close();
                }
            }
            (DspNode::Delay(n), 0) => n.set_delay_samples(value.max(0.0) as usize),
            (DspNode::Delay(n), 1) => n.set_feedback(value),
            (DspNode::Delay(n), 2) => n.set_mix(value),
            _ => {}
        }
    }
}
