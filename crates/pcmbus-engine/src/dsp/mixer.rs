//! Sums several streams into one, with per-input gain.

use crate::error::StreamError;
use crate::stream::{Lifecycle, SampleIterator};

/// Fixed-point unity gain: 1.0 in Q16.16.
const UNITY: i32 = 65536;

fn saturate16(v: i64) -> i16 {
    v.clamp(i16::MIN as i64, i16::MAX as i64) as i16
}

struct Input {
    source: Box<dyn SampleIterator>,
    multiplier: i32,
}

/// Mixes its inputs frame by frame. Inputs are opened and closed with the mixer.
#[derive(Default)]
pub struct Mixer {
    inputs: Vec<Input>,
    scratch: Vec<i16>,
    acc: Vec<i64>,
    state: Lifecycle,
}

impl Mixer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an input at `level` (0.0 = silent, 1.0 = unity). Only while closed.
    /// Returns the input's index.
    pub fn add_input(&mut self, source: Box<dyn SampleIterator>, level: f32) -> Result<usize, StreamError> {
        self.state.ensure_closed()?;
        self.inputs.push(Input { source, multiplier: to_multiplier(level) });
        Ok(self.inputs.len() - 1)
    }

    /// Change an input's level; allowed while open. Unknown indices are ignored.
    pub fn set_gain(&mut self, index: usize, level: f32) {
        if let Some(input) = self.inputs.get_mut(index) {
            input.multiplier = to_multiplier(level);
        }
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }
}

/// Clamped to ±32767.0.
fn to_multiplier(level: f32) -> i32 {
    (level.clamp(-32767.0, 32767.0) * UNITY as f32) as i32
}

impl SampleIterator for Mixer {
    fn open(&mut self, frequency: u32, channels: u16) -> Result<(), StreamError> {
        let format = self.state.check_open(frequency, channels)?;
        for i in 0..self.inputs.len() {
            if let Err(e) = self.inputs[i].source.open(frequency, channels) {
                for opened in &mut self.inputs[..i] {
                    opened.source.close();
                }
                return Err(e);
            }
        }
        self.scratch = vec![0; format.frame_len()];
        self.acc = vec![0; format.frame_len()];
        self.state.mark_open(format);
        Ok(())
    }

    fn next_frame(&mut self, frame: &mut [i16]) -> Result<(), StreamError> {
        let out = self.state.frame(frame)?;
        self.acc.fill(0);
        for input in &mut self.inputs {
            input.source.next_frame(&mut self.scratch)?;
            let mult = input.multiplier as i64;
            for (a, &s) in self.acc.iter_mut().zip(&self.scratch) {
                *a += if mult == UNITY as i64 { s as i64 } else { (s as i64 * mult) >> 16 };
            }
        }
        for (o, &a) in out.iter_mut().zip(&self.acc) {
            *o = saturate16(a);
        }
        Ok(())
    }

    fn close(&mut self) {
        if !self.state.mark_closed() {
            return;
        }
        for input in &mut self.inputs {
            input.source.close();
        }
    }

    fn is_open(&self) -> bool {
        self.state.is_open()
    }
}
