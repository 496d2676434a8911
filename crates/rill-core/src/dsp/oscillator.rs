//! Phase-accumulator oscillator with raw (non-anti-aliased) waveforms.

use crate::context::Context;
use crate::node::Node;
use crate::Sample;

#[cfg(not(feature = "std"))]
use libm::sinf;
#[cfg(feature = "std")]
fn sinf(x: f32) -> f32 {
    x.sin()
}

/// Oscillator waveform. `sub` is `pwm`-shaped at an offset in semitones from
/// the oscillator's base frequency, used as the sub-oscillator voice in
/// `rill-synth`'s voice sub-graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Waveform {
    /// `sin(2*pi*phase)`.
    Sine,
    /// `2*phase - 1`.
    Saw,
    /// `+1` while `phase < duty`, else `-1`.
    Pwm {
        /// Duty cycle, `(0, 1)`.
        duty: f32,
    },
    /// `pwm`-shaped, advancing at `inc * 2^(offset_semitones/12)`.
    Sub {
        /// Duty cycle, `(0, 1)`.
        duty: f32,
        /// Offset from the oscillator's set frequency, in semitones.
        offset_semitones: f32,
    },
}

/// A single phase-accumulator oscillator.
///
/// Deliberately not band-limited: `saw`/`pwm`/`sub` alias at the discontinuity
/// the way a naive implementation does, by design (raw, not PolyBLEP-corrected
/// waveforms).
#[derive(Debug, Clone, Copy)]
pub struct Oscillator {
    phase: f32,
    frequency: f32,
    sample_rate: f32,
    waveform: Waveform,
}

impl Oscillator {
    /// Creates an oscillator at `frequency` Hz, `sample_rate` Hz, phase 0.
    pub fn new(waveform: Waveform, frequency: f32, sample_rate: f32) -> Self {
        Self {
            phase: 0.0,
            frequency,
            sample_rate,
            waveform,
        }
    }

    /// Sets the oscillator's base frequency in Hz.
    pub fn set_frequency(&mut self, frequency: f32) {
        self.frequency = frequency;
    }

    /// Current base frequency in Hz.
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Changes the waveform without touching phase.
    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
    }

    /// Current phase, always in `[0, 1)`.
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Resets phase to 0 (called on voice note-on for phase coherence).
    pub fn reset_phase(&mut self) {
        self.phase = 0.0;
    }

    fn effective_increment(&self) -> f32 {
        let inc = self.frequency / self.sample_rate;
        match self.waveform {
            Waveform::Sub { offset_semitones, .. } => inc * libm_pow2(offset_semitones / 12.0),
            _ => inc,
        }
    }

    fn sample_at_phase(&self, phase: f32) -> Sample {
        match self.waveform {
            Waveform::Sine => sinf(2.0 * core::f32::consts::PI * phase),
            Waveform::Saw => 2.0 * phase - 1.0,
            Waveform::Pwm { duty } | Waveform::Sub { duty, .. } => {
                if phase < duty {
                    1.0
                } else {
                    -1.0
                }
            }
        }
    }

    /// Advances the oscillator by one sample, returning its output, wrapping
    /// phase into `[0, 1)` by subtraction.
    #[inline]
    pub fn advance(&mut self) -> Sample {
        let out = self.sample_at_phase(self.phase);
        self.phase += self.effective_increment();
        while self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        while self.phase < 0.0 {
            self.phase += 1.0;
        }
        out
    }
}

#[cfg(not(feature = "std"))]
fn libm_pow2(x: f32) -> f32 {
    libm::exp2f(x)
}
#[cfg(feature = "std")]
fn libm_pow2(x: f32) -> f32 {
    x.exp2()
}

impl Node for Oscillator {
    fn process(&mut self, _ctx: &Context, out: &mut [Sample]) {
        for s in out.iter_mut() {
            *s = self.advance();
        }
    }

    fn reset(&mut self) {
        self.phase = 0.0;
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saw_matches_closed_form() {
        let mut osc = Oscillator::new(Waveform::Saw, 440.0, 48000.0);
        let mut phase = 0.0f32;
        for _ in 0..1000 {
            let expected = 2.0 * phase - 1.0;
            let actual = osc.advance();
            assert!((actual - expected).abs() < 1e-5);
            phase += 440.0 / 48000.0;
            while phase >= 1.0 {
                phase -= 1.0;
            }
        }
    }

    #[test]
    fn phase_stays_in_unit_interval() {
        let mut osc = Oscillator::new(Waveform::Saw, 19999.0, 48000.0);
        for _ in 0..200_000 {
            osc.advance();
            assert!(osc.phase() >= 0.0 && osc.phase() < 1.0);
        }
    }

    #[test]
    fn reset_phase_returns_to_zero() {
        let mut osc = Oscillator::new(Waveform::Sine, 440.0, 48000.0);
        for _ in 0..100 {
            osc.advance();
        }
        osc.reset_phase();
        assert_eq!(osc.phase(), 0.0);
    }

    #[test]
    fn pwm_duty_cycle_sign() {
        let mut osc = Oscillator::new(Waveform::Pwm { duty: 0.25 }, 1.0, 4.0);
        // 4 samples/cycle at freq=1, sr=4: phase steps 0, 0.25, 0.5, 0.75
        assert_eq!(osc.advance(), 1.0); // phase 0.0 < 0.25
        assert_eq!(osc.advance(), -1.0); // phase 0.25, not < duty
    }
}
