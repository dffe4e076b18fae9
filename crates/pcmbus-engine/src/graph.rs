use tracing::debug;

use crate::dsp::effect::{pull_then_apply, AudioEffect, Feed};
use crate::error::StreamError;
use crate::stream::{Lifecycle, SampleIterator};

/// Where a chain link reads its input frame from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    /// The bus source, or silence when the bus has none.
    Source,
    /// Output of the link at this index.
    Link(usize),
}

/// A serial chain of effects fed by one source. Owns the effects and the source.
///
/// The chain and source can only change while the bus is closed. Each link is
/// evaluated from the upstream recorded for it in the wiring table: link 0
/// reads the source, link `i` reads the frame link `i - 1` produced. The bus
/// emits the last link's output.
/// With no links the source is passed straight through, and with neither a
/// source nor links the bus emits silence.
#[derive(Default)]
pub struct AudioBus {
    source: Option<Box<dyn SampleIterator>>,
    effects: Vec<Box<dyn AudioEffect>>,
    wiring: Vec<Upstream>,
    scratch: Vec<i16>,
    /// One output frame per link, indexed like `effects`.
    outputs: Vec<Vec<i16>>,
    state: Lifecycle,
}

impl AudioBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(source: Box<dyn SampleIterator>) -> Self {
        Self { source: Some(source), ..Self::default() }
    }

    pub fn set_source(&mut self, source: Option<Box<dyn SampleIterator>>) -> Result<(), StreamError> {
        self.state.ensure_closed()?;
        self.source = source;
        self.stitch();
        Ok(())
    }

    pub fn take_source(&mut self) -> Result<Option<Box<dyn SampleIterator>>, StreamError> {
        self.state.ensure_closed()?;
        let source = self.source.take();
        self.stitch();
        Ok(source)
    }

    /// Append an effect to the end of the chain.
    pub fn add(&mut self, effect: Box<dyn AudioEffect>) -> Result<(), StreamError> {
        self.state.ensure_closed()?;
        self.effects.push(effect);
        self.stitch();
        Ok(())
    }

    /// Insert an effect at `position`, shifting later links right.
    pub fn insert(&mut self, position: usize, effect: Box<dyn AudioEffect>) -> Result<(), StreamError> {
        self.state.ensure_closed()?;
        let len = self.effects.len();
        if position > len {
            return Err(StreamError::PositionOutOfRange { position, len });
        }
        self.effects.insert(position, effect);
        self.stitch();
        Ok(())
    }

    pub fn remove(&mut self, position: usize) -> Result<Box<dyn AudioEffect>, StreamError> {
        self.state.ensure_closed()?;
        let len = self.effects.len();
        if position >= len {
            return Err(StreamError::PositionOutOfRange { position, len });
        }
        let effect = self.effects.remove(position);
        self.stitch();
        Ok(effect)
    }

    /// Parameter access; allowed while open.
    pub fn effect_mut(&mut self, position: usize) -> Option<&mut dyn AudioEffect> {
        self.effects.get_mut(position).map(|e| &mut **e as &mut dyn AudioEffect)
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn wiring(&self) -> &[Upstream] {
        &self.wiring
    }

    /// Rebuild the upstream of every link from its position.
    fn stitch(&mut self) {
        self.wiring = (0..self.effects.len())
            .map(|i| match i.checked_sub(1) {
                Some(prev) => Upstream::Link(prev),
                None => Upstream::Source,
            })
            .collect();
        debug!(links = self.wiring.len(), has_source = self.source.is_some(), "bus restitched");
    }
}

impl SampleIterator for AudioBus {
    fn open(&mut self, frequency: u32, channels: u16) -> Result<(), StreamError> {
        let format = self.state.check_open(frequency, channels)?;
        if let Some(src) = self.source.as_mut() {
            src.open(frequency, channels)?;
        }
        for fx in &mut self.effects {
            fx.prepare(frequency, channels);
        }
        self.scratch = vec![0; format.frame_len()];
        self.outputs = vec![vec![0; format.frame_len()]; self.effects.len()];
        self.state.mark_open(format);
        Ok(())
    }

    fn next_frame(&mut self, frame: &mut [i16]) -> Result<(), StreamError> {
        let out = self.state.frame(frame)?;
        let Self { source, effects, wiring, scratch, outputs, .. } = self;

        let len = outputs.len();
        for (i, (fx, up)) in effects.iter_mut().zip(wiring.iter()).enumerate() {
            // Links only read frames produced earlier in this pass.
            let (done, rest) = outputs.split_at_mut(i.min(len));
            let (dst, _) = rest
                .split_first_mut()
                .ok_or(StreamError::PositionOutOfRange { position: i, len })?;
            let feed = match *up {
                Upstream::Source => match source.as_deref_mut() {
                    Some(src) => Feed::Stream(src),
                    None => Feed::Silence,
                },
                Upstream::Link(prev) => Feed::Frame(
                    done.get(prev)
                        .ok_or(StreamError::PositionOutOfRange { position: prev, len: i })?,
                ),
            };
            pull_then_apply(&mut **fx, feed, scratch, dst)?;
        }

        match (outputs.last(), source.as_deref_mut()) {
            (Some(last), _) => out.copy_from_slice(last),
            (None, Some(src)) => src.next_frame(out)?,
            (None, None) => out.fill(0),
        }
        Ok(())
    }

    fn close(&mut self) {
        if !self.state.mark_closed() {
            return;
        }
        if let Some(src) = self.source.as_mut() {
            src.close();
        }
    }

    fn is_open(&self) -> bool {
        self.state.is_open()
    }
}
