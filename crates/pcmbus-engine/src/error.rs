use pcmbus_riff::RiffError;
use thiserror::Error;

/// Failure to turn a container into a [`Sound`](crate::sound::Sound).
#[derive(Debug, Error)]
pub enum WavError {
    #[error("file is a valid RIFF but does not contain WAV data")]
    NotWave,
    #[error("no formatting data present in this file")]
    MissingFormat,
    #[error("no waveform data present in this file")]
    MissingData,
    #[error("unsupported sample format 0x{0:x}")]
    UnsupportedFormat(u16),
    #[error("unusual data encoding: {bits} bits per sample")]
    UnusualEncoding { bits: u16 },
    #[error("empty sample frame ({channels} channel(s), {bits} bits per sample)")]
    EmptyFrame { channels: u16, bits: u16 },
    #[error("invalid sample rate {0}")]
    InvalidSampleRate(i32),
    #[error(transparent)]
    Riff(#[from] RiffError),
    #[error(transparent)]
    Sound(#[from] SoundError),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SoundError {
    #[error("a sound needs at least one channel")]
    ZeroChannels,
    #[error("a sound needs a non-zero frequency")]
    ZeroFrequency,
    #[error("{len} samples do not divide into {channels} channel(s)")]
    RaggedSamples { len: usize, channels: u16 },
}

/// Misuse of a sample stream: lifecycle order, frame shape or chain position.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StreamError {
    #[error("stream must be closed for this operation")]
    AlreadyOpen,
    #[error("stream must be open for this operation")]
    NotOpen,
    #[error("stream cannot be opened with zero channels")]
    ZeroChannels,
    #[error("frame buffer holds {got} sample(s), {needed} required")]
    FrameTooShort { needed: usize, got: usize },
    #[error("position {position} is out of range for a chain of {len}")]
    PositionOutOfRange { position: usize, len: usize },
    #[error("{frames} frame(s) of {channels} channel(s) do not fit in memory")]
    TooManyFrames { frames: usize, channels: u16 },
    #[error(transparent)]
    Sound(#[from] SoundError),
}
