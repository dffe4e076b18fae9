use super::effect::AudioEffect;

/// Linear gain with dB control. Saturates at the i16 range.
pub struct Gain {
    pub db: f32,
    lin: f32,
}

impl Gain {
    pub fn new(db: f32) -> Self {
        let mut g = Self { db, lin: 1.0 };
        g.recompute();
        g
    }
    pub fn linear(&self) -> f32 {
        self.lin
    }
    fn recompute(&mut self) {
        self.lin = 10f32.powf(self.db / 20.0);
    }
}

impl AudioEffect for Gain {
    fn set_param(&mut self, key: &str, value: f32) {
        if key == "db" {
            self.db = value;
            self.recompute();
        }
    }
    fn apply(&mut self, src: &[i16], dst: &mut [i16]) {
        let g = self.lin;
        for (d, &s) in dst.iter_mut().zip(src) {
            let x = s as f32 * g;
            *d = if x > i16::MAX as f32 {
                i16::MAX
            } else if x < i16::MIN as f32 {
                i16::MIN
            } else {
                x as i16
            };
        }
    }
}
