use crate::error::StreamError;
use crate::stream::{Lifecycle, SampleIterator};

/// Per-frame audio transform.
/// - apply() must not allocate or lock on the hot path.
/// - `src` and `dst` are exactly one frame (one i16 per channel); don't resize them.
pub trait AudioEffect: Send {
    fn prepare(&mut self, _frequency: u32, _channels: u16) {}
    fn set_param(&mut self, _key: &str, _value: f32) {}
    fn apply(&mut self, src: &[i16], dst: &mut [i16]);
}

impl<E: AudioEffect + ?Sized> AudioEffect for Box<E> {
    fn prepare(&mut self, frequency: u32, channels: u16) {
        (**self).prepare(frequency, channels)
    }
    fn set_param(&mut self, key: &str, value: f32) {
        (**self).set_param(key, value)
    }
    fn apply(&mut self, src: &[i16], dst: &mut [i16]) {
        (**self).apply(src, dst)
    }
}

/// Resolved input of one effect link.
pub(crate) enum Feed<'a> {
    /// Pull a fresh frame from this stream.
    Stream(&'a mut dyn SampleIterator),
    /// Reuse a frame another link already produced.
    Frame(&'a [i16]),
    Silence,
}

/// Evaluate one link: fill `scratch` from `feed` when it must be pulled or
/// zeroed, then apply `effect` into `out`.
pub(crate) fn pull_then_apply<E: AudioEffect + ?Sized>(
    effect: &mut E,
    feed: Feed<'_>,
    scratch: &mut [i16],
    out: &mut [i16],
) -> Result<(), StreamError> {
    let input: &[i16] = match feed {
        Feed::Stream(src) => {
            src.next_frame(scratch)?;
            scratch
        }
        Feed::Frame(frame) => frame,
        Feed::Silence => {
            scratch.fill(0);
            scratch
        }
    };
    effect.apply(input, out);
    Ok(())
}

/// Runs an [`AudioEffect`] as a stream: pulls a frame from its upstream into a
/// scratch frame, then applies the effect into the caller's buffer.
///
/// The node owns its upstream and opens/closes it along with itself. With no
/// upstream it behaves as if fed silence.
pub struct EffectNode<E> {
    effect: E,
    source: Option<Box<dyn SampleIterator>>,
    scratch: Vec<i16>,
    state: Lifecycle,
}

impl<E: AudioEffect> EffectNode<E> {
    pub fn new(effect: E) -> Self {
        Self { effect, source: None, scratch: Vec::new(), state: Lifecycle::default() }
    }

    pub fn with_source(effect: E, source: Box<dyn SampleIterator>) -> Self {
        let mut node = Self::new(effect);
        node.source = Some(source);
        node
    }

    /// Replace the upstream. Only while closed.
    pub fn set_source(&mut self, source: Option<Box<dyn SampleIterator>>) -> Result<(), StreamError> {
        self.state.ensure_closed()?;
        self.source = source;
        Ok(())
    }

    pub fn take_source(&mut self) -> Result<Option<Box<dyn SampleIterator>>, StreamError> {
        self.state.ensure_closed()?;
        Ok(self.source.take())
    }

    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    pub fn effect(&self) -> &E {
        &self.effect
    }

    pub fn effect_mut(&mut self) -> &mut E {
        &mut self.effect
    }

    pub fn into_effect(self) -> E {
        self.effect
    }
}

impl<E: AudioEffect> SampleIterator for EffectNode<E> {
    fn open(&mut self, frequency: u32, channels: u16) -> Result<(), StreamError> {
        let format = self.state.check_open(frequency, channels)?;
        if let Some(src) = self.source.as_mut() {
            src.open(frequency, channels)?;
        }
        self.scratch = vec![0; format.frame_len()];
        self.effect.prepare(frequency, channels);
        self.state.mark_open(format);
        Ok(())
    }

    fn next_frame(&mut self, frame: &mut [i16]) -> Result<(), StreamError> {
        let out = self.state.frame(frame)?;
        let feed = match self.source.as_deref_mut() {
            Some(src) => Feed::Stream(src),
            None => Feed::Silence,
        };
        pull_then_apply(&mut self.effect, feed, &mut self.scratch, out)
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::ConstantSampleIterator;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Adds one to every sample.
    struct Bump;

    impl AudioEffect for Bump {
        fn apply(&mut self, src: &[i16], dst: &mut [i16]) {
            for (d, &s) in dst.iter_mut().zip(src) {
                *d = s + 1;
            }
        }
    }

    /// Records open/close calls made on it.
    struct Counted {
        opens: Rc<Cell<u32>>,
        closes: Rc<Cell<u32>>,
        inner: ConstantSampleIterator,
    }

    impl SampleIterator for Counted {
        fn open(&mut self, frequency: u32, channels: u16) -> Result<(), StreamError> {
            self.opens.set(self.opens.get() + 1);
            self.inner.open(frequency, channels)
        }
        fn next_frame(&mut self, frame: &mut [i16]) -> Result<(), StreamError> {
            self.inner.next_frame(frame)
        }
        fn close(&mut self) {
            self.closes.set(self.closes.get() + 1);
            self.inner.close()
        }
        fn is_open(&self) -> bool {
            self.inner.is_open()
        }
    }

    #[test]
    fn no_source_means_silence_in() {
        let mut node = EffectNode::new(Bump);
        node.open(8000, 2).unwrap();
        let mut buf = [7i16; 2];
        node.next_frame(&mut buf).unwrap();
        assert_eq!(buf, [1, 1]);
    }

    #[test]
    fn opens_and_closes_upstream_once() {
        let opens = Rc::new(Cell::new(0));
        let closes = Rc::new(Cell::new(0));
        let counted = Counted {
            opens: opens.clone(),
            closes: closes.clone(),
            inner: ConstantSampleIterator::new(),
        };
        let mut node = EffectNode::with_source(Bump, Box::new(counted));
        node.open(8000, 1).unwrap();
        assert_eq!(opens.get(), 1);

        let mut buf = [0i16; 1];
        node.next_frame(&mut buf).unwrap();
        assert_eq!(buf, [1]);

        node.close();
        node.close();
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn lifecycle_misuse() {
        let mut node = EffectNode::new(Bump);
        let mut buf = [0i16; 1];
        assert_eq!(node.next_frame(&mut buf), Err(StreamError::NotOpen));
        node.open(8000, 1).unwrap();
        assert_eq!(node.open(8000, 1), Err(StreamError::AlreadyOpen));
        assert_eq!(
            node.set_source(Some(Box::new(ConstantSampleIterator::new()))),
            Err(StreamError::AlreadyOpen)
        );
        node.close();
        node.set_source(None).unwrap();
    }

    #[test]
    fn failed_upstream_open_leaves_node_closed() {
        let mut upstream = ConstantSampleIterator::new();
        upstream.open(8000, 1).unwrap();
        let mut node = EffectNode::with_source(Bump, Box::new(upstream));
        assert_eq!(node.open(8000, 1), Err(StreamError::AlreadyOpen));
        assert!(!node.is_open());
    }

    #[test]
    fn ready_frame_skips_the_pull() {
        let mut scratch = [5i16; 2];
        let mut out = [0i16; 2];
        pull_then_apply(&mut Bump, Feed::Frame(&[10, 20]), &mut scratch, &mut out).unwrap();
        assert_eq!(out, [11, 21]);
        assert_eq!(scratch, [5, 5]);

        pull_then_apply(&mut Bump, Feed::Silence, &mut scratch, &mut out).unwrap();
        assert_eq!(out, [1, 1]);
        assert_eq!(scratch, [0, 0]);
    }

    #[test]
    fn only_the_frame_is_written() {
        let mut node = EffectNode::new(Bump);
        node.open(8000, 2).unwrap();
        let mut buf = [9i16; 4];
        node.next_frame(&mut buf).unwrap();
        assert_eq!(buf, [1, 1, 9, 9]);
    }
}
