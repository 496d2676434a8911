//! Moog-ladder low-pass filter (D'Angelo-Valimaki formulation).

use crate::context::Context;
use crate::node::Node;
use crate::Sample;

#[cfg(not(feature = "std"))]
use libm::tanhf;
#[cfg(feature = "std")]
fn tanhf(x: f32) -> f32 {
    x.tanh()
}

const THERMAL_VOLTAGE: f32 = 0.312;

/// Four-stage cascaded transistor-ladder low-pass, modeled after the
/// D'Angelo-Valimaki zero-delay-feedback formulation.
///
/// `cutoff` and `resonance` are block-boundary parameters only; the
/// four-stage running state (`v`, `dv`, `tv`) persists across parameter
/// changes and across a `PluginChain` topology swap, since the swap shares
/// state pointers slot-for-slot.
#[derive(Debug, Clone, Copy)]
pub struct MoogLpf {
    sample_rate: f32,
    cutoff: f32,
    resonance: f32,
    v: [f32; 4],
    dv: [f32; 4],
    tv: [f32; 4],
}

impl MoogLpf {
    /// Creates a filter with all state zeroed.
    pub fn new(sample_rate: f32, cutoff: f32, resonance: f32) -> Self {
        Self {
            sample_rate,
            cutoff,
            resonance,
            v: [0.0; 4],
            dv: [0.0; 4],
            tv: [0.0; 4],
        }
    }

    /// Sets the cutoff frequency in Hz. Takes effect at the next block.
    pub fn set_cutoff(&mut self, cutoff: f32) {
        self.cutoff = cutoff;
    }

    /// Sets the resonance/feedback amount, typically `[0, 4]`.
    pub fn set_resonance(&mut self, resonance: f32) {
        self.resonance = resonance;
    }

    #[inline]
    fn process_sample(&mut self, input: Sample) -> Sample {
        let x = core::f32::consts::PI * self.cutoff / self.sample_rate;
        let g = 4.0 * core::f32::consts::PI * THERMAL_VOLTAGE * self.cutoff * (1.0 - x) / (1.0 + x);

        let input = input - self.resonance * self.v[3];

        self.tv[0] = tanhf(input / (2.0 * THERMAL_VOLTAGE));
        self.dv[0] = g * (self.tv[0] - self.tv[1]);
        self.v[0] += self.dv[0];
        self.tv[1] = tanhf(self.v[0] / (2.0 * THERMAL_VOLTAGE));

        self.dv[1] = g * (self.tv[1] - self.tv[2]);
        self.v[1] += self.dv[1];
        self.tv[2] = tanhf(self.v[1] / (2.0 * THERMAL_VOLTAGE));

        self.dv[2] = g * (self.tv[2] - self.tv[3]);
        self.v[2] += self.dv[2];
        self.tv[3] = tanhf(self.v[2] / (2.0 * THERMAL_VOLTAGE));

        self.dv[3] = g * (self.tv[3] - tanhf(self.v[3] / (2.0 * THERMAL_VOLTAGE)));
        self.v[3] += self.dv[3];

        self.v[3]
    }
}

impl Node for MoogLpf {
    fn process(&mut self, _ctx: &Context, out: &mut [Sample]) {
        for s in out.iter_mut() {
            *s = self.process_sample(*s);
        }
    }

    fn reset(&mut self) {
        self.v = [0.0; 4];
        self.dv = [0.0; 4];
        self.tv = [0.0; 4];
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dc_input_settles_to_finite_value() {
        let mut lpf = MoogLpf::new(48000.0, 1000.0, 0.1);
        let mut out = [1.0f32; 2048];
        lpf.process(&test_ctx(), &mut out);
        assert!(out.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn reset_clears_state() {
        let mut lpf = MoogLpf::new(48000.0, 1000.0, 0.5);
        let mut out = [1.0f32; 512];
        lpf.process(&test_ctx(), &mut out);
        lpf.reset();
        assert_eq!(lpf.v, [0.0; 4]);
    }

    fn test_ctx() -> Context {
        Context::new(48000.0, 120.0).unwrap()
    }
}
