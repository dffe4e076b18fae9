//! WAV decoding and a pull-based effect graph for short sound assets.
//!
//! `bytes -> wav::decode -> Sound` is a one-shot decode. Independently, any
//! [`SampleIterator`] (sources, effect nodes, mixers, buses) is pulled frame by
//! frame by a consumer until closed. Everything here is single-threaded.

pub mod devices;
pub mod dsp;
pub mod error;
pub mod graph;
pub mod layout;
pub mod playback;
pub mod sound;
pub mod stream;
pub mod wav;

pub use dsp::{AudioEffect, EffectNode, Gain, LowPass, Mixer};
pub use error::{SoundError, StreamError, WavError};
pub use graph::AudioBus;
pub use layout::{ChannelLayout, Speaker};
pub use playback::{CpalBackend, PlaybackBackend, PlaybackConfig, PlaybackState, StopEvent};
pub use sound::Sound;
pub use stream::{render, ConstantSampleIterator, SampleIterator, SoundSource};
