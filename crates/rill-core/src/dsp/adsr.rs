//! Linear-rate ADSR envelope.
//!
//! This envelope is deliberately linear-rate rather than the
//! exponential-with-overshoot shape used for envelopes elsewhere in this
//! lineage: the per-stage rate is a constant per-sample increment, and a
//! stage transition fires the instant its threshold is crossed, clamped to
//! the exact target value (no overshoot to correct for).

use crate::context::Context;
use crate::node::Node;
use crate::Sample;

/// Which segment of the envelope a voice is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    /// Output is 0; upstream is not pulled.
    Idle,
    /// Ramping 0 -> 1.
    Attack,
    /// Ramping 1 -> sustain.
    Decay,
    /// Holding at the sustain level.
    Sustain,
    /// Ramping current value -> 0.
    Release,
}

/// Linear ADSR envelope generator / in-place gain.
#[derive(Debug, Clone, Copy)]
pub struct Adsr {
    sample_rate: f32,
    attack_secs: f32,
    decay_secs: f32,
    sustain: f32,
    release_secs: f32,
    stage: EnvelopeStage,
    value: f32,
}

impl Adsr {
    /// Creates an envelope in `Idle` with value 0.
    pub fn new(sample_rate: f32, attack_secs: f32, decay_secs: f32, sustain: f32, release_secs: f32) -> Self {
        Self {
            sample_rate,
            attack_secs,
            decay_secs,
            sustain: sustain.clamp(0.0, 1.0),
            release_secs,
            stage: EnvelopeStage::Idle,
            value: 0.0,
        }
    }

    /// Current stage.
    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    /// Current envelope value, in `[0, 1]`.
    pub fn value(&self) -> f32 {
        self.value
    }

    /// `true` once the envelope has fully released to `Idle`.
    pub fn is_idle(&self) -> bool {
        self.stage == EnvelopeStage::Idle
    }

    /// Sets the attack time in seconds.
    pub fn set_attack_secs(&mut self, secs: f32) {
        self.attack_secs = secs.max(0.0);
    }

    /// Sets the decay time in seconds.
    pub fn set_decay_secs(&mut self, secs: f32) {
        self.decay_secs = secs.max(0.0);
    }

    /// Sets the sustain level, clamped to `[0, 1]`.
    pub fn set_sustain(&mut self, sustain: f32) {
        self.sustain = sustain.clamp(0.0, 1.0);
    }

    /// Sets the release time in seconds.
    pub fn set_release_secs(&mut self, secs: f32) {
        self.release_secs = secs.max(0.0);
    }

    /// Note-on (re-)trigger: moves to `Attack` from any stage.
    pub fn gate_on(&mut self) {
        self.stage = EnvelopeStage::Attack;
    }

    /// Note-off: moves to `Release` from any non-`Idle` stage.
    pub fn gate_off(&mut self) {
        if self.stage != EnvelopeStage::Idle {
            self.stage = EnvelopeStage::Release;
        }
    }

    fn attack_rate(&self) -> f32 {
        1.0 / (self.attack_secs * self.sample_rate).max(1.0)
    }

    fn decay_rate(&self) -> f32 {
        (1.0 - self.sustain) / (self.decay_secs * self.sample_rate).max(1.0)
    }

    fn release_rate(&self) -> f32 {
        self.sustain.max(self.value) / (self.release_secs * self.sample_rate).max(1.0)
    }

    /// Returns the value as it stands before this call's update (so sample 0
    /// after `gate_on()` is exactly 0, and sample `k` during attack is
    /// `k / (attack_secs * sample_rate)`), then advances the envelope for
    /// the next call.
    #[inline]
    fn advance(&mut self) -> f32 {
        let current = self.value;
        match self.stage {
            EnvelopeStage::Idle => {
                self.value = 0.0;
            }
            EnvelopeStage::Attack => {
                self.value += self.attack_rate();
                if self.value >= 1.0 {
                    self.value = 1.0;
                    self.stage = EnvelopeStage::Decay;
                }
            }
            EnvelopeStage::Decay => {
                self.value -= self.decay_rate();
                if self.value <= self.sustain {
                    self.value = self.sustain;
                    self.stage = EnvelopeStage::Sustain;
                }
            }
            EnvelopeStage::Sustain => {
                self.value = self.sustain;
            }
            EnvelopeStage::Release => {
                self.value -= self.release_rate();
                if self.value <= 0.0 {
                    self.value = 0.0;
                    self.stage = EnvelopeStage::Idle;
                }
            }
        }
        current
    }
}

impl Node for Adsr {
    /// Idle short-circuits the whole block to zero. Otherwise multiplies
    /// `out` (expected to already hold the upstream signal) by the envelope.
    fn process(&mut self, _ctx: &Context, out: &mut [Sample]) {
        if self.stage == EnvelopeStage::Idle {
            for s in out.iter_mut() {
                *s = 0.0;
            }
            return;
        }
        for s in out.iter_mut() {
            *s *= self.advance();
        }
    }

    fn reset(&mut self) {
        self.stage = EnvelopeStage::Idle;
        self.value = 0.0;
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    fn wants_upstream(&self) -> bool {
        self.stage != EnvelopeStage::Idle
    }
}
