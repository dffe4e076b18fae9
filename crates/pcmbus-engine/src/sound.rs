use std::sync::Arc;
use std::time::Duration;

use crate::error::SoundError;
use crate::layout::ChannelLayout;

/// Immutable 16-bit signed PCM held in memory.
///
/// Samples are interleaved: frame 0 channel 0..N-1, then frame 1, and so on.
/// Clones share the sample storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sound {
    frequency: u32,
    channels: u16,
    samples: Arc<[i16]>,
}

impl Sound {
    pub fn new(frequency: u32, channels: u16, samples: Vec<i16>) -> Result<Self, SoundError> {
        if channels == 0 {
            return Err(SoundError::ZeroChannels);
        }
        if frequency == 0 {
            return Err(SoundError::ZeroFrequency);
        }
        if samples.len() % channels as usize != 0 {
            return Err(SoundError::RaggedSamples { len: samples.len(), channels });
        }
        Ok(Self { frequency, channels, samples: samples.into() })
    }

    pub fn frequency(&self) -> u32 { self.frequency }
    pub fn channels(&self) -> u16 { self.channels }
    pub fn samples(&self) -> &[i16] { &self.samples }

    /// Shared handle to the samples, for consumers that outlive `self`.
    pub fn samples_arc(&self) -> Arc<[i16]> {
        self.samples.clone()
    }

    pub fn layout(&self) -> Option<ChannelLayout> {
        ChannelLayout::from_channels(self.channels)
    }

    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn frame(&self, index: usize) -> Option<&[i16]> {
        let ch = self.channels as usize;
        let start = index.checked_mul(ch)?;
        self.samples.get(start..start.checked_add(ch)?)
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frame_count() as f64 / self.frequency as f64)
    }

    /// Size of the sample data as 16-bit PCM bytes.
    pub fn byte_len(&self) -> usize {
        self.samples.len() * 2
    }

    /// Average every frame down to one channel.
    ///
    /// No gain compensation is applied, so the result is quieter than the
    /// loudest input channel but never clips. A mono sound is returned as is.
    pub fn to_mono(&self) -> Sound {
        if self.channels == 1 {
            return self.clone();
        }
        let ch = self.channels as usize;
        let mono: Vec<i16> = self
            .samples
            .chunks_exact(ch)
            .map(|frame| {
                let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                (sum / ch as i32) as i16
            })
            .collect();
        Sound { frequency: self.frequency, channels: 1, samples: mono.into() }
    }
}
