use std::f32::consts::TAU;

use super::effect::AudioEffect;

/// One-pole low-pass, independent state per channel.
///
/// `y += a * (x - y)` with `a = 1 - e^(-2π·fc/fs)`. Before `prepare` the
/// frequency is unknown and the filter passes audio through.
pub struct LowPass {
    cutoff_hz: f32,
    frequency: u32,
    coeff: f32,
    state: Vec<f32>,
}

impl LowPass {
    pub fn new(cutoff_hz: f32) -> Self {
        let mut f = Self { cutoff_hz, frequency: 0, coeff: 1.0, state: Vec::new() };
        f.recompute();
        f
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff_hz
    }

    fn recompute(&mut self) {
        self.coeff = if self.frequency == 0 || self.cutoff_hz <= 0.0 {
            1.0
        } else {
            1.0 - (-TAU * self.cutoff_hz / self.frequency as f32).exp()
        };
    }
}

impl AudioEffect for LowPass {
    fn prepare(&mut self, frequency: u32, channels: u16) {
        self.frequency = frequency;
        self.state = vec![0.0; channels as usize];
        self.recompute();
    }

    fn set_param(&mut self, key: &str, value: f32) {
        if key == "cutoff" {
            self.cutoff_hz = value;
            self.recompute();
        }
    }

    fn apply(&mut self, src: &[i16], dst: &mut [i16]) {
        if self.state.len() < src.len() {
            // not prepared for this width; pass through
            dst.copy_from_slice(src);
            return;
        }
        let a = self.coeff;
        for ((d, &s), y) in dst.iter_mut().zip(src).zip(self.state.iter_mut()) {
            *y += a * (s as f32 - *y);
            *d = y.round() as i16;
        }
    }
}
