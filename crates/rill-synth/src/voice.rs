//! A single polyphonic voice: `{pwm, saw, sub} -> mixer -> lpf -> adsr`.

use rill_core::dsp::{sum_into, Adsr, MoogLpf, Oscillator, Waveform};
use rill_core::{Context, Node, NoteNumber, Sample};

/// Converts a MIDI note number to frequency in Hz, `440 * 2^((n-69)/12)`.
pub fn midi_to_freq(note: NoteNumber) -> f32 {
    #[cfg(not(feature = "std"))]
    let exp2 = libm::exp2f;
    #[cfg(feature = "std")]
    fn exp2(x: f32) -> f32 {
        x.exp2()
    }
    440.0 * exp2((f32::from(note) - 69.0) / 12.0)
}

/// Whether a voice is idle or sounding a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteState {
    /// Not currently assigned to any note.
    Off,
    /// Currently assigned to `NoteNumber`.
    On(NoteNumber),
}

/// Plain-old-data voice-shaping parameters, published via a
/// [`rill_core::ParamSnapshot`] from the control thread to every voice in a
/// [`crate::Synth`].
#[derive(Debug, Clone, Copy)]
pub struct VoiceParams {
    /// Duty cycle of the `pwm` oscillator, `(0, 1)`.
    pub pwm_duty: f32,
    /// Duty cycle of the `sub` oscillator, `(0, 1)`.
    pub sub_duty: f32,
    /// Offset of the `sub` oscillator from the voice's note, in semitones.
    pub sub_offset_semitones: f32,
    /// Moog-ladder cutoff, Hz.
    pub lpf_cutoff: f32,
    /// Moog-ladder resonance, typically `[0, 4]`.
    pub lpf_resonance: f32,
    /// ADSR attack time, seconds.
    pub attack_secs: f32,
    /// ADSR decay time, seconds.
    pub decay_secs: f32,
    /// ADSR sustain level, `[0, 1]`.
    pub sustain: f32,
    /// ADSR release time, seconds.
    pub release_secs: f32,
}

impl Default for VoiceParams {
    fn default() -> Self {
        Self {
            pwm_duty: 0.5,
            sub_duty: 0.5,
            sub_offset_semitones: -12.0,
            lpf_cutoff: 4000.0,
            lpf_resonance: 0.2,
            attack_secs: 0.01,
            decay_secs: 0.1,
            sustain: 0.7,
            release_secs: 0.2,
        }
    }
}

/// A single voice: three fixed oscillators summed, filtered, and enveloped.
pub struct Voice {
    note_state: NoteState,
    pwm: Oscillator,
    saw: Oscillator,
    sub: Oscillator,
    lpf: MoogLpf,
    adsr: Adsr,
}

impl Voice {
    /// Creates an idle voice at the given sample rate with default shaping.
    pub fn new(sample_rate: f32) -> Self {
        let params = VoiceParams::default();
        Self {
            note_state: NoteState::Off,
            pwm: Oscillator::new(Waveform::Pwm { duty: params.pwm_duty }, 0.0, sample_rate),
            saw: Oscillator::new(Waveform::Saw, 0.0, sample_rate),
            sub: Oscillator::new(
                Waveform::Sub {
                    duty: params.sub_duty,
                    offset_semitones: params.sub_offset_semitones,
                },
                0.0,
                sample_rate,
            ),
            lpf: MoogLpf::new(sample_rate, params.lpf_cutoff, params.lpf_resonance),
            adsr: Adsr::new(
                sample_rate,
                params.attack_secs,
                params.decay_secs,
                params.sustain,
                params.release_secs,
            ),
        }
    }

    /// Current note assignment.
    pub fn note_state(&self) -> NoteState {
        self.note_state
    }

    /// `true` if the voice's envelope has fully released.
    pub fn is_idle(&self) -> bool {
        self.adsr.is_idle()
    }

    /// Assigns `note`, resets oscillator phases for coherence, and gates the
    /// envelope into `Attack`.
    pub fn note_on(&mut self, note: NoteNumber) {
        self.note_state = NoteState::On(note);
        let freq = midi_to_freq(note);
        self.pwm.set_frequency(freq);
        self.saw.set_frequency(freq);
        self.sub.set_frequency(freq);
        self.pwm.reset_phase();
        self.saw.reset_phase();
        self.sub.reset_phase();
        self.adsr.gate_on();
    }

    /// Gates the envelope into `Release` only if this voice is still holding
    /// exactly `note`.
    pub fn note_off(&mut self, note: NoteNumber) {
        if self.note_state == NoteState::On(note) {
            self.adsr.gate_off();
        }
    }

    /// Immediately silences the voice, discarding any release tail.
    pub fn kill(&mut self) {
        self.note_state = NoteState::Off;
        self.adsr.reset();
    }

    /// Applies a freshly-read parameter snapshot to this voice's nodes.
    pub fn apply_params(&mut self, params: &VoiceParams) {
        self.pwm.set_waveform(Waveform::Pwm { duty: params.pwm_duty });
        self.sub.set_waveform(Waveform::Sub {
            duty: params.sub_duty,
            offset_semitones: params.sub_offset_semitones,
        });
        self.lpf.set_cutoff(params.lpf_cutoff);
        self.lpf.set_resonance(params.lpf_resonance);
        self.adsr.set_attack_secs(params.attack_secs);
        self.adsr.set_decay_secs(params.decay_secs);
        self.adsr.set_sustain(params.sustain);
        self.adsr.set_release_secs(params.release_secs);
    }
}

impl Node for Voice {
    fn process(&mut self, ctx: &Context, out: &mut [Sample]) {
        if self.adsr.is_idle() {
            for s in out.iter_mut() {
                *s = 0.0;
            }
            if self.note_state == NoteState::Off {
                // already silent, nothing to clear
            } else {
                self.note_state = NoteState::Off;
            }
            return;
        }
        let mut oscillators = [self.pwm, self.saw, self.sub];
        sum_into(ctx, out, &mut oscillators);
        self.pwm = oscillators[0];
        self.saw = oscillators[1];
        self.sub = oscillators[2];

        self.lpf.process(ctx, out);
        self.adsr.process(ctx, out);
    }

    fn reset(&mut self) {
        self.note_state = NoteState::Off;
        self.pwm.reset();
        self.saw.reset();
        self.sub.reset();
        self.lpf.reset();
        self.adsr.reset();
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.pwm.set_sample_rate(sample_rate);
        self.saw.set_sample_rate(sample_rate);
        self.sub.set_sample_rate(sample_rate);
        self.lpf.set_sample_rate(sample_rate);
        self.adsr.set_sample_rate(sample_rate);
    }
}
