use std::fmt;
use std::io::Read;
use std::sync::Arc;

use crate::cursor::{ByteCursor, ByteOrder};
use crate::{Result, RiffError};

/// Four-character chunk tag.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCc(pub [u8; 4]);

impl FourCc {
    /// Tag with trailing padding spaces removed (`"fmt "` -> `"fmt"`).
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or("????").trim_end_matches(' ')
    }

    pub fn matches(&self, name: &str) -> bool {
        self.as_str() == name.trim_end_matches(' ')
    }
}

impl fmt::Debug for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub enum Chunk {
    Data(DataChunk),
    List(ListChunk),
}

#[derive(Debug, Clone)]
pub struct DataChunk {
    tag: FourCc,
    body: ByteCursor,
}

/// `RIFF`, `RIFX` or `LIST` chunk: a list type followed by child chunks.
#[derive(Debug, Clone)]
pub struct ListChunk {
    tag: FourCc,
    list_type: FourCc,
    children: Vec<Chunk>,
    body: ByteCursor,
}

const HEADER_LEN: usize = 8;

impl Chunk {
    /// Read the whole input and parse the top-level container.
    pub fn read<R: Read>(reader: &mut R) -> Result<Chunk> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::parse(bytes)
    }

    pub fn parse(bytes: impl Into<Arc<[u8]>>) -> Result<Chunk> {
        let bytes: Arc<[u8]> = bytes.into();
        if bytes.len() < HEADER_LEN + 4 {
            let mut magic = [0u8; 4];
            let n = bytes.len().min(4);
            magic[..n].copy_from_slice(&bytes[..n]);
            if &magic != b"RIFF" && &magic != b"RIFX" {
                return Err(RiffError::NotRiff(magic));
            }
            return Err(RiffError::UnexpectedEof {
                wanted: HEADER_LEN + 4,
                remaining: bytes.len(),
            });
        }
        let order = match &bytes[..4] {
            b"RIFF" => ByteOrder::Little,
            b"RIFX" => ByteOrder::Big,
            other => return Err(RiffError::NotRiff([other[0], other[1], other[2], other[3]])),
        };
        let (chunk, _) = parse_chunk(&bytes, 0, bytes.len(), order)?;
        Ok(chunk)
    }

    pub fn tag(&self) -> FourCc {
        match self {
            Chunk::Data(d) => d.tag,
            Chunk::List(l) => l.tag,
        }
    }

    pub fn as_list(&self) -> Option<&ListChunk> {
        match self {
            Chunk::List(l) => Some(l),
            Chunk::Data(_) => None,
        }
    }

    /// Fresh cursor at offset 0 over the chunk body.
    pub fn data(&self) -> ByteCursor {
        match self {
            Chunk::Data(d) => d.body.clone(),
            Chunk::List(l) => l.body.clone(),
        }
    }
}

impl DataChunk {
    pub fn tag(&self) -> FourCc { self.tag }
    pub fn data(&self) -> ByteCursor { self.body.clone() }
}

impl ListChunk {
    pub fn tag(&self) -> FourCc { self.tag }
    pub fn list_type(&self) -> FourCc { self.list_type }
    pub fn children(&self) -> &[Chunk] { &self.children }
    pub fn byte_order(&self) -> ByteOrder { self.body.byte_order() }

    /// First direct child with the given tag.
    pub fn find(&self, tag: &str) -> Option<&Chunk> {
        self.children.iter().find(|c| c.tag().matches(tag))
    }
}

fn is_list(tag: &[u8; 4]) -> bool {
    matches!(tag, b"RIFF" | b"RIFX" | b"LIST")
}

/// Parse one chunk at `offset`; returns it with the offset just past it (padding included).
/// `end` bounds the enclosing list.
fn parse_chunk(bytes: &Arc<[u8]>, offset: usize, end: usize, order: ByteOrder) -> Result<(Chunk, usize)> {
    let mut header = ByteCursor::window(bytes.clone(), offset, HEADER_LEN, order);
    let tag = FourCc(header.read_array::<4>()?);
    let declared = header.read_u32()? as usize;

    let body_start = offset + HEADER_LEN;
    // Writers that stream often leave a bogus size; clamp to what is there.
    let body_len = declared.min(end - body_start);
    let body = ByteCursor::window(bytes.clone(), body_start, body_len, order);
    let next = (body_start + body_len + (body_len & 1)).min(end);

    if !is_list(&tag.0) {
        return Ok((Chunk::Data(DataChunk { tag, body }), next));
    }

    let mut cur = body.clone();
    let list_type = FourCc(cur.read_array::<4>()?);
    let list_end = body_start + body_len;
    let mut children = Vec::new();
    let mut at = body_start + 4;
    while list_end - at >= HEADER_LEN {
        let (child, after) = parse_chunk(bytes, at, list_end, order)?;
        children.push(child);
        at = after;
    }

    Ok((Chunk::List(ListChunk { tag, list_type, children, body }), next))
}
