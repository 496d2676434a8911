//! Simple waveshaping distortion with dry/wet mix.

use crate::context::Context;
use crate::node::Node;
use crate::Sample;

#[cfg(not(feature = "std"))]
use libm::tanhf;
#[cfg(feature = "std")]
fn tanhf(x: f32) -> f32 {
    x.tanh()
}

/// Waveshaping curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DistortionMode {
    /// `clamp(drive * x, -1, 1)`.
    Hard,
    /// Cubic soft clip: `drive*x - (drive*x)^3/3`.
    Soft,
    /// `tanh(drive * x)`.
    Tanh,
}

/// Drive-and-shape distortion with makeup gain and dry/wet mix.
#[derive(Debug, Clone, Copy)]
pub struct Distortion {
    mode: DistortionMode,
    drive: f32,
    mix: f32,
}

impl Distortion {
    /// Creates a distortion stage. `drive >= 1.0`, `mix` in `[0, 1]`.
    pub fn new(mode: DistortionMode, drive: f32, mix: f32) -> Self {
        Self {
            mode,
            drive: drive.max(0.0),
            mix: mix.clamp(0.0, 1.0),
        }
    }

    /// Sets the shaping mode.
    pub fn set_mode(&mut self, mode: DistortionMode) {
        self.mode = mode;
    }

    /// Sets the drive amount.
    pub fn set_drive(&mut self, drive: f32) {
        self.drive = drive.max(0.0);
    }

    /// Sets the dry/wet mix, clamped to `[0, 1]`.
    pub fn set_mix(&mut self, mix: f32) {
        self.mix = mix.clamp(0.0, 1.0);
    }

    #[inline]
    fn shape(&self, x: Sample) -> Sample {
        let driven = self.drive * x;
        let shaped = match self.mode {
            DistortionMode::Hard => driven.clamp(-1.0, 1.0),
            DistortionMode::Soft => driven - (driven * driven * driven) / 3.0,
            DistortionMode::Tanh => tanhf(driven),
        };
        if self.drive > 1.0 {
            shaped / self.drive
        } else {
            shaped
        }
    }
}

impl Node for Distortion {
    fn process(&mut self, _ctx: &Context, out: &mut [Sample]) {
        for s in out.iter_mut() {
            let dry = *s;
            let wet = self.shape(dry);
            *s = dry + (wet - dry) * self.mix;
        }
    }
}
