//! Pull-based sample streams.
//!
//! A [`SampleIterator`] produces one frame (one sample per channel) per call to
//! [`next_frame`](SampleIterator::next_frame). Streams must be opened with the
//! desired frequency and channel count before use and closed afterwards.
//! They can be reopened, but are not seekable: a reopened stream does not
//! necessarily resume where it left off.
//!
//! Channel counts other than 1 and 2 follow the WAV default ordering (see
//! [`ChannelLayout`](crate::layout::ChannelLayout)). A stream that cannot
//! produce a requested channel emits zero for it. A stereo source asked for
//! mono emits its left channel; it never averages.

use tracing::warn;

use crate::error::StreamError;
use crate::sound::Sound;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Format {
    pub frequency: u32,
    pub channels: u16,
}

impl Format {
    pub fn frame_len(&self) -> usize {
        self.channels as usize
    }
}

pub trait SampleIterator {
    /// Fix the frame shape for this session and open any upstream streams.
    /// Fails if already open.
    fn open(&mut self, frequency: u32, channels: u16) -> Result<(), StreamError>;

    /// Write exactly one frame into `frame[..channels]`, zero-filling whatever
    /// this stream has no data for. Fails if closed or if `frame` is too short.
    fn next_frame(&mut self, frame: &mut [i16]) -> Result<(), StreamError>;

    /// Release per-session state and close upstream streams. Closing a closed
    /// stream does nothing.
    fn close(&mut self);

    fn is_open(&self) -> bool;
}

impl<T: SampleIterator + ?Sized> SampleIterator for Box<T> {
    fn open(&mut self, frequency: u32, channels: u16) -> Result<(), StreamError> {
        (**self).open(frequency, channels)
    }
    fn next_frame(&mut self, frame: &mut [i16]) -> Result<(), StreamError> {
        (**self).next_frame(frame)
    }
    fn close(&mut self) {
        (**self).close()
    }
    fn is_open(&self) -> bool {
        (**self).is_open()
    }
}

/// Open/closed bookkeeping shared by every stream implementation.
#[derive(Debug, Default)]
pub struct Lifecycle {
    format: Option<Format>,
}

impl Lifecycle {
    pub fn is_open(&self) -> bool {
        self.format.is_some()
    }

    pub fn ensure_closed(&self) -> Result<(), StreamError> {
        match self.format {
            Some(_) => Err(StreamError::AlreadyOpen),
            None => Ok(()),
        }
    }

    /// Validate an `open` request without changing state.
    pub fn check_open(&self, frequency: u32, channels: u16) -> Result<Format, StreamError> {
        self.ensure_closed()?;
        if channels == 0 {
            return Err(StreamError::ZeroChannels);
        }
        Ok(Format { frequency, channels })
    }

    pub fn mark_open(&mut self, format: Format) {
        self.format = Some(format);
    }

    /// Returns whether the stream was open.
    pub fn mark_closed(&mut self) -> bool {
        self.format.take().is_some()
    }

    pub fn format(&self) -> Result<Format, StreamError> {
        self.format.ok_or(StreamError::NotOpen)
    }

    /// The part of `buf` a single frame occupies.
    pub fn frame<'a>(&self, buf: &'a mut [i16]) -> Result<&'a mut [i16], StreamError> {
        let needed = self.format()?.frame_len();
        let got = buf.len();
        buf.get_mut(..needed).ok_or(StreamError::FrameTooShort { needed, got })
    }
}

/// Copy `src` into `dst` following the channel policy: equal widths copy,
/// mono output takes the first (left) channel, mono input is duplicated into
/// the first two outputs, and anything missing is zero.
pub fn remap_frame(src: &[i16], dst: &mut [i16]) {
    match (src.len(), dst.len()) {
        (_, 0) => {}
        (0, _) => dst.fill(0),
        (s, d) if s == d => dst.copy_from_slice(src),
        (_, 1) => dst[0] = src[0],
        (1, _) => {
            dst.fill(0);
            dst[0] = src[0];
            dst[1] = src[0];
        }
        (s, d) => {
            let n = s.min(d);
            dst[..n].copy_from_slice(&src[..n]);
            dst[n..].fill(0);
        }
    }
}

/* ---------- sources ---------- */

/// Emits the same frame forever. The frame is zero on open and can be changed
/// through [`frame_mut`](Self::frame_mut) while open.
#[derive(Debug, Default)]
pub struct ConstantSampleIterator {
    state: Lifecycle,
    frame: Vec<i16>,
}

impl ConstantSampleIterator {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` while closed: there is no frame shape yet.
    pub fn frame(&self) -> Option<&[i16]> {
        self.state.is_open().then_some(self.frame.as_slice())
    }

    pub fn frame_mut(&mut self) -> Option<&mut [i16]> {
        if self.state.is_open() {
            Some(self.frame.as_mut_slice())
        } else {
            None
        }
    }
}

impl SampleIterator for ConstantSampleIterator {
    fn open(&mut self, frequency: u32, channels: u16) -> Result<(), StreamError> {
        let format = self.state.check_open(frequency, channels)?;
        self.frame = vec![0; format.frame_len()];
        self.state.mark_open(format);
        Ok(())
    }

    fn next_frame(&mut self, frame: &mut [i16]) -> Result<(), StreamError> {
        self.state.frame(frame)?.copy_from_slice(&self.frame);
        Ok(())
    }

    fn close(&mut self) {
        if self.state.mark_closed() {
            self.frame.clear();
        }
    }

    fn is_open(&self) -> bool {
        self.state.is_open()
    }
}

/// Streams a [`Sound`] once, then silence.
///
/// Reopening continues from the current frame; use [`rewind`](Self::rewind)
/// to start over. No resampling is done: a frequency mismatch plays the
/// samples at the requested rate.
#[derive(Debug)]
pub struct SoundSource {
    sound: Sound,
    position: usize,
    state: Lifecycle,
}

impl SoundSource {
    pub fn new(sound: Sound) -> Self {
        Self { sound, position: 0, state: Lifecycle::default() }
    }

    pub fn sound(&self) -> &Sound {
        &self.sound
    }

    /// Frames already emitted.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_finished(&self) -> bool {
        self.position >= self.sound.frame_count()
    }

    pub fn rewind(&mut self) -> Result<(), StreamError> {
        self.state.ensure_closed()?;
        self.position = 0;
        Ok(())
    }
}

impl SampleIterator for SoundSource {
    fn open(&mut self, frequency: u32, channels: u16) -> Result<(), StreamError> {
        let format = self.state.check_open(frequency, channels)?;
        if frequency != self.sound.frequency() {
            warn!(
                "sound is {} Hz but opened at {} Hz; playing without resampling",
                self.sound.frequency(),
                frequency
            );
        }
        self.state.mark_open(format);
        Ok(())
    }

    fn next_frame(&mut self, frame: &mut [i16]) -> Result<(), StreamError> {
        let out = self.state.frame(frame)?;
        match self.sound.frame(self.position) {
            Some(src) => {
                remap_frame(src, out);
                self.position += 1;
            }
            None => out.fill(0),
        }
        Ok(())
    }

    fn close(&mut self) {
        self.state.mark_closed();
    }

    fn is_open(&self) -> bool {
        self.state.is_open()
    }
}

/* ---------- rendering ---------- */

/// Open `source`, pull `frames` frames into a new [`Sound`], and close it again.
/// The source is closed even when pulling fails.
pub fn render(
    source: &mut dyn SampleIterator,
    frequency: u32,
    channels: u16,
    frames: usize,
) -> Result<Sound, StreamError> {
    let len = frames
        .checked_mul(channels as usize)
        .ok_or(StreamError::TooManyFrames { frames, channels })?;
    source.open(frequency, channels)?;
    let mut samples = Vec::with_capacity(len);
    let pulled = pull_into(source, channels as usize, frames, &mut samples);
    source.close();
    pulled?;
    Ok(Sound::new(frequency, channels, samples)?)
}

fn pull_into(
    source: &mut dyn SampleIterator,
    channels: usize,
    frames: usize,
    out: &mut Vec<i16>,
) -> Result<(), StreamError> {
    let mut frame = vec![0i16; channels];
    for _ in 0..frames {
        source.next_frame(&mut frame)?;
        out.extend_from_slice(&frame);
    }
    Ok(())
}
