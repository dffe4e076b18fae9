//! Minimal RIFF/RIFX chunk walker.
//!
//! Reads a whole container into memory and exposes its chunk tree. Leaf chunks
//! hand out a [`ByteCursor`] over their body, configured with the container's
//! byte order (`RIFF` = little-endian, `RIFX` = big-endian).

pub mod chunk;
pub mod cursor;

pub use chunk::{Chunk, DataChunk, FourCc, ListChunk};
pub use cursor::{ByteCursor, ByteOrder};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RiffError {
    #[error("not a RIFF container (magic {0:?})")]
    NotRiff([u8; 4]),
    #[error("unexpected end of data: wanted {wanted} byte(s), {remaining} left")]
    UnexpectedEof { wanted: usize, remaining: usize },
    #[error("seek to {pos} is past the end ({len} bytes)")]
    SeekOutOfRange { pos: u64, len: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RiffError>;
