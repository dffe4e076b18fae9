//! Playback boundary: hand a [`Sound`] to an output backend and watch it play.
//!
//! Backends hold native handles and must only be used from the thread that
//! created them. State changes are observed by calling
//! [`poll`](PlaybackBackend::poll); stop subscribers run synchronously inside
//! that call, never from a background thread.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use cpal::traits::{DeviceTrait, StreamTrait};
use parking_lot::Mutex;
use tracing::{debug, error, info};

use crate::devices::pick_output_device;
use crate::sound::Sound;

#[derive(Debug, Clone, Default)]
pub struct PlaybackConfig {
    pub output_name: Option<String>,  // match by substring (case-insensitive)
    pub output_index: Option<usize>,  // explicit index from device list
    pub buffer_frames: Option<u32>,   // frames per buffer (if backend supports)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Initial,
    Playing,
    Paused,
    Stopped,
}

pub trait PlaybackBackend {
    /// Replace whatever is playing with `sound`, from its first frame.
    fn play(&mut self, sound: &Sound) -> Result<()>;
    fn stop(&mut self);
    /// Refresh the state and fire stop subscribers on a Playing -> Stopped edge.
    fn poll(&mut self) -> PlaybackState;
    /// Last state seen by `poll`.
    fn state(&self) -> PlaybackState;
    fn on_stop(&mut self) -> &mut StopEvent;
}

/// Explicit subscriber list for the "playback stopped" edge.
#[derive(Default)]
pub struct StopEvent {
    subscribers: Vec<Box<dyn FnMut()>>,
}

impl StopEvent {
    pub fn register(&mut self, callback: impl FnMut() + 'static) {
        self.subscribers.push(Box::new(callback));
    }

    pub fn clear(&mut self) {
        self.subscribers.clear();
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    pub fn fire(&mut self) {
        for cb in self.subscribers.iter_mut() {
            cb();
        }
    }
}

/// Remembers the last observed state and fires `on_stop` on the Playing -> Stopped edge.
pub struct StateTracker {
    last: PlaybackState,
    on_stop: StopEvent,
}

impl Default for StateTracker {
    fn default() -> Self {
        Self { last: PlaybackState::Initial, on_stop: StopEvent::default() }
    }
}

impl StateTracker {
    pub fn last(&self) -> PlaybackState {
        self.last
    }

    pub fn on_stop(&mut self) -> &mut StopEvent {
        &mut self.on_stop
    }

    pub fn observe(&mut self, current: PlaybackState) -> PlaybackState {
        if self.last == PlaybackState::Playing && current == PlaybackState::Stopped {
            self.on_stop.fire();
        }
        self.last = current;
        current
    }
}

/* ---------- cpal backend ---------- */

/// Read position shared with the audio callback.
struct PlayCursor {
    samples: Arc<[i16]>,
    pos: usize,
    done: bool,
}

impl PlayCursor {
    fn empty() -> Self {
        Self { samples: Arc::from(Vec::<i16>::new()), pos: 0, done: true }
    }

    fn fill<T: Copy>(&mut self, out: &mut [T], convert: fn(i16) -> T, silence: T) {
        for o in out.iter_mut() {
            *o = match self.samples.get(self.pos) {
                Some(&s) => {
                    self.pos += 1;
                    convert(s)
                }
                None => {
                    self.done = true;
                    silence
                }
            };
        }
    }
}

/// Plays whole sounds on a `cpal` output device.
///
/// The stream is opened at the sound's own rate and channel count; there is
/// no resampling, so the device has to accept that format.
pub struct CpalBackend {
    cfg: PlaybackConfig,
    device: cpal::Device,
    stream: Option<cpal::Stream>,
    paused: bool,
    cursor: Arc<Mutex<PlayCursor>>,
    tracker: StateTracker,
}

impl CpalBackend {
    pub fn new(cfg: PlaybackConfig) -> Result<Self> {
        let host = cpal::default_host();
        let device = pick_output_device(&host, cfg.output_name.as_deref(), cfg.output_index)?
            .context("No output device matched (and no default available)")?;
        info!("output device: {}", device.name().unwrap_or_default());
        Ok(Self {
            cfg,
            device,
            stream: None,
            paused: false,
            cursor: Arc::new(Mutex::new(PlayCursor::empty())),
            tracker: StateTracker::default(),
        })
    }

    pub fn device_name(&self) -> String {
        self.device.name().unwrap_or_default()
    }

    pub fn set_paused(&mut self, pause: bool) -> Result<()> {
        let Some(stream) = self.stream.as_ref() else { return Ok(()) };
        if pause {
            stream.pause().context("Failed to pause output stream")?;
        } else {
            stream.play().context("Failed to resume output stream")?;
        }
        self.paused = pause;
        Ok(())
    }

    fn build_stream(&self, sound: &Sound) -> Result<cpal::Stream> {
        let supported = self.device.default_output_config().context("No default output config")?;
        let mut config = supported.config();
        config.channels = sound.channels();
        config.sample_rate = cpal::SampleRate(sound.frequency());
        if let Some(bs) = self.cfg.buffer_frames {
            config.buffer_size = cpal::BufferSize::Fixed(bs);
        }
        debug!(?config, format = ?supported.sample_format(), "building output stream");

        match supported.sample_format() {
            cpal::SampleFormat::F32 => {
                build_output::<f32>(&self.device, &config, self.cursor.clone(), |s| s as f32 / 32768.0, 0.0)
            }
            cpal::SampleFormat::I16 => {
                build_output::<i16>(&self.device, &config, self.cursor.clone(), |s| s, 0)
            }
            cpal::SampleFormat::U16 => build_output::<u16>(
                &self.device,
                &config,
                self.cursor.clone(),
                |s| (s as i32 + 32768) as u16,
                32768,
            ),
            other => Err(anyhow!("Unsupported output format: {other:?}")),
        }
    }
}

fn build_output<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    cursor: Arc<Mutex<PlayCursor>>,
    convert: fn(i16) -> T,
    silence: T,
) -> Result<cpal::Stream>
where
    T: cpal::SizedSample + Send + 'static,
{
    let stream = device.build_output_stream::<T, _, _>(
        config,
        move |out: &mut [T], _| cursor.lock().fill(out, convert, silence),
        move |err| error!("output stream error: {err}"),
        None,
    )?;
    Ok(stream)
}

impl PlaybackBackend for CpalBackend {
    fn play(&mut self, sound: &Sound) -> Result<()> {
        self.stream = None;
        *self.cursor.lock() = PlayCursor { samples: sound.samples_arc(), pos: 0, done: false };

        let stream = self.build_stream(sound)?;
        stream.play().context("Failed to play output stream")?;
        info!(
            frequency = sound.frequency(),
            channels = sound.channels(),
            frames = sound.frame_count(),
            "playing"
        );
        self.stream = Some(stream);
        self.paused = false;
        self.tracker.observe(PlaybackState::Playing);
        Ok(())
    }

    fn stop(&mut self) {
        self.stream = None;
        self.cursor.lock().done = true;
        self.poll();
    }

    fn poll(&mut self) -> PlaybackState {
        let current = if self.stream.is_none() {
            match self.tracker.last() {
                PlaybackState::Initial => PlaybackState::Initial,
                _ => PlaybackState::Stopped,
            }
        } else if self.paused {
            PlaybackState::Paused
        } else if self.cursor.lock().done {
            self.stream = None;
            PlaybackState::Stopped
        } else {
            PlaybackState::Playing
        };
        self.tracker.observe(current)
    }

    fn state(&self) -> PlaybackState {
        self.tracker.last()
    }

    fn on_stop(&mut self) -> &mut StopEvent {
        self.tracker.on_stop()
    }
}
