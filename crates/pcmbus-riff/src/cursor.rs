use std::sync::Arc;

use crate::{Result, RiffError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Little,
    Big,
}

/// Seekable window over shared bytes with typed, endian-aware reads.
///
/// Cloning is cheap: the bytes are shared, only the position is copied.
#[derive(Debug, Clone)]
pub struct ByteCursor {
    bytes: Arc<[u8]>,
    start: usize,
    len: usize,
    pos: usize,
    order: ByteOrder,
}

impl ByteCursor {
    pub fn new(bytes: Vec<u8>, order: ByteOrder) -> Self {
        let len = bytes.len();
        Self { bytes: bytes.into(), start: 0, len, pos: 0, order }
    }

    /// Window `[start, start + len)` of `bytes`. Caller guarantees the range is in bounds.
    pub(crate) fn window(bytes: Arc<[u8]>, start: usize, len: usize, order: ByteOrder) -> Self {
        debug_assert!(start + len <= bytes.len());
        Self { bytes, start, len, pos: 0, order }
    }

    pub fn len(&self) -> usize { self.len }
    pub fn is_empty(&self) -> bool { self.len == 0 }
    pub fn position(&self) -> u64 { self.pos as u64 }
    pub fn remaining(&self) -> usize { self.len - self.pos }
    pub fn byte_order(&self) -> ByteOrder { self.order }

    pub fn set_byte_order(&mut self, order: ByteOrder) {
        self.order = order;
    }

    /// The whole window, independent of the current position.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[self.start..self.start + self.len]
    }

    /// Seeking to exactly `len()` is allowed (end of window).
    pub fn seek(&mut self, pos: u64) -> Result<()> {
        match usize::try_from(pos) {
            Ok(p) if p <= self.len => {
                self.pos = p;
                Ok(())
            }
            _ => Err(RiffError::SeekOutOfRange { pos, len: self.len }),
        }
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.take(n).map(|_| ())
    }

    fn take(&mut self, n: usize) -> Result<&[u8]> {
        let remaining = self.remaining();
        if n > remaining {
            return Err(RiffError::UnexpectedEof { wanted: n, remaining });
        }
        let from = self.start + self.pos;
        self.pos += n;
        Ok(&self.bytes[from..from + n])
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let b = self.read_array::<2>()?;
        Ok(match self.order {
            ByteOrder::Little => u16::from_le_bytes(b),
            ByteOrder::Big => u16::from_be_bytes(b),
        })
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        let b = self.read_array::<2>()?;
        Ok(match self.order {
            ByteOrder::Little => i16::from_le_bytes(b),
            ByteOrder::Big => i16::from_be_bytes(b),
        })
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let b = self.read_array::<4>()?;
        Ok(match self.order {
            ByteOrder::Little => u32::from_le_bytes(b),
            ByteOrder::Big => u32::from_be_bytes(b),
        })
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let b = self.read_array::<4>()?;
        Ok(match self.order {
            ByteOrder::Little => i32::from_le_bytes(b),
            ByteOrder::Big => i32::from_be_bytes(b),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_reads_follow_byte_order() {
        let bytes = vec![0x01, 0x02, 0x03, 0x04];
        let mut le = ByteCursor::new(bytes.clone(), ByteOrder::Little);
        let mut be = ByteCursor::new(bytes, ByteOrder::Big);
        assert_eq!(le.read_u16().unwrap(), 0x0201);
        assert_eq!(be.read_u16().unwrap(), 0x0102);
        le.seek(0).unwrap();
        be.seek(0).unwrap();
        assert_eq!(le.read_u32().unwrap(), 0x0403_0201);
        assert_eq!(be.read_u32().unwrap(), 0x0102_0304);
    }

    #[test]
    fn signed_reads() {
        let mut c = ByteCursor::new(vec![0xFF, 0xFF, 0x00, 0x00, 0x00, 0x80], ByteOrder::Little);
        assert_eq!(c.read_i16().unwrap(), -1);
        assert_eq!(c.read_i32().unwrap(), i32::MIN);
        assert_eq!(c.remaining(), 0);
    }

    #[test]
    fn read_past_end_fails_without_moving() {
        let mut c = ByteCursor::new(vec![1, 2, 3], ByteOrder::Little);
        c.skip(2).unwrap();
        let err = c.read_u16().unwrap_err();
        assert!(matches!(err, RiffError::UnexpectedEof { wanted: 2, remaining: 1 }));
        assert_eq!(c.position(), 2);
        assert_eq!(c.read_u8().unwrap(), 3);
    }

    #[test]
    fn seek_bounds() {
        let mut c = ByteCursor::new(vec![0; 4], ByteOrder::Big);
        c.seek(4).unwrap();
        assert!(c.seek(5).is_err());
        assert_eq!(c.position(), 4);
    }

    #[test]
    fn window_is_isolated() {
        let bytes: Arc<[u8]> = Arc::from(vec![9, 1, 2, 9]);
        let mut w = ByteCursor::window(bytes, 1, 2, ByteOrder::Little);
        assert_eq!(w.len(), 2);
        assert_eq!(w.as_slice(), &[1, 2]);
        assert_eq!(w.read_u8().unwrap(), 1);
        assert_eq!(w.read_u8().unwrap(), 2);
        assert!(w.read_u8().is_err());
    }
}
