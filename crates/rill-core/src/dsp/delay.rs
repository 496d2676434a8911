//! Feedback delay over a circular buffer sized exactly to the installed
//! maximum delay time.

#[cfg(not(feature = "std"))]
use alloc::vec;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::context::Context;
use crate::node::Node;
use crate::Sample;

/// Circular-buffer feedback delay.
///
/// `delay_time`/`feedback` may change at block boundaries only; the
/// backing buffer is allocated once at construction ("install," in the
/// language of `rill-engine`'s `PluginChain`) and lives until the delay is
/// dropped, which only happens after it has been removed from both chain
/// copies.
#[derive(Debug, Clone)]
pub struct Delay {
    buffer: Vec<Sample>,
    write_pos: usize,
    delay_samples: usize,
    feedback: f32,
    mix: f32,
}

impl Delay {
    /// Allocates a delay line able to hold up to `max_delay_samples` of
    /// delay, starting at `delay_samples` delay (must be `< max_delay_samples`).
    pub fn new(max_delay_samples: usize, delay_samples: usize, feedback: f32, mix: f32) -> Self {
        debug_assert!(delay_samples < max_delay_samples, "delay_samples must be < buffer_len");
        Self {
            buffer: vec![0.0; max_delay_samples.max(1)],
            write_pos: 0,
            delay_samples: delay_samples.min(max_delay_samples.saturating_sub(1)),
            feedback: feedback.clamp(0.0, 1.0),
            mix: mix.clamp(0.0, 1.0),
        }
    }

    /// Sets the delay time in samples; clamped to remain `< buffer_len`.
    pub fn set_delay_samples(&mut self, delay_samples: usize) {
        self.delay_samples = delay_samples.min(self.buffer.len().saturating_sub(1));
    }

    /// Sets the feedback amount, clamped to `[0, 1]`.
    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(0.0, 1.0);
    }

    /// Sets the dry/wet mix, clamped to `[0, 1]`.
    pub fn set_mix(&mut self, mix: f32) {
        self.mix = mix.clamp(0.0, 1.0);
    }

    /// Backing buffer length in samples.
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    fn process_sample(&mut self, dry: Sample) -> Sample {
        let len = self.buffer.len();
        let read_pos = (self.write_pos + len - self.delay_samples) % len;
        let delayed = self.buffer[read_pos];
        self.buffer[self.write_pos] = dry + self.feedback * delayed;
        self.write_pos = (self.write_pos + 1) % len;
        dry * (1.0 - self.mix) + delayed * self.mix
    }
}

impl Node for Delay {
    fn process(&mut self, _ctx: &Context, out: &mut [Sample]) {
        for s in out.iter_mut() {
            *s = self.process_sample(*s);
        }
    }

    fn reset(&mut self) {
        for s in self.buffer.iter_mut() {
            *s = 0.0;
        }
        self.write_pos = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> Context {
        Context::new(48000.0, 120.0).unwrap()
    }

    #[test]
    fn impulse_reappears_after_delay_samples() {
        let mut delay = Delay::new(1000, 100, 0.0, 1.0);
        let mut buf = vec![0.0f32; 200];
        buf[0] = 1.0;
        delay.process(&ctx(), &mut buf);
        assert_eq!(buf[100], 1.0);
        assert!(buf.iter().enumerate().all(|(i, &s)| i == 100 || s == 0.0));
    }

    #[test]
    fn zero_mix_is_pure_dry() {
        let mut delay = Delay::new(1000, 100, 0.5, 0.0);
        let mut buf = vec![0.3f32; 50];
        delay.process(&ctx(), &mut buf);
        assert!(buf.iter().all(|&s| (s - 0.3).abs() < 1e-6));
    }

    #[test]
    fn feedback_repeats_decay() {
        let mut delay = Delay::new(10, 5, 0.5, 1.0);
        let mut buf = vec![0.0f32; 21];
        buf[0] = 1.0;
        delay.process(&ctx(), &mut buf);
        assert!((buf[5] - 1.0).abs() < 1e-6);
        assert!((buf[10] - 0.5).abs() < 1e-6);
        assert!((buf[15] - 0.25).abs() < 1e-6);
    }
}
